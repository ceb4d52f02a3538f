//! The references tree: session lifecycle around a single host tree view.

use crate::config::{FailurePolicy, TreeConfig};
use crate::context;
use crate::delegate::ProviderDelegate;
use crate::error::Result;
use crate::highlights::EditorHighlights;
use crate::history::{HistoryItem, TreeInputHistory};
use crate::navigation::TreeNavigation;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use symtree_api::{
    ApiError, ApiResult, CommandHandler, CommandInvocation, Disposable, DisposableStore, Event,
    EventEmitter, HostServices, RevealOptions, SymbolTreeInput, SymbolTreeModel,
    TreeDataProvider, TreeElement, TreeView,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const CMD_CLEAR: &str = "references-view.clear";
pub const CMD_CLEAR_HISTORY: &str = "references-view.clearHistory";
pub const CMD_REFIND: &str = "references-view.refind";
pub const CMD_NEXT: &str = "references-view.next";
pub const CMD_PREV: &str = "references-view.prev";

type ModelResult = ApiResult<Option<Arc<SymbolTreeModel>>>;

/// Identifies one `set_input` call. Continuations compare it against the
/// current session before touching the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId(u64);

enum SessionState {
    Empty,
    Resolving {
        id: SessionId,
        input: Arc<dyn SymbolTreeInput>,
    },
    Active {
        id: SessionId,
        input: Arc<dyn SymbolTreeInput>,
        model: Arc<SymbolTreeModel>,
        disposables: DisposableStore,
    },
    Failed {
        id: SessionId,
        input: Arc<dyn SymbolTreeInput>,
        error: ApiError,
    },
}

impl SessionState {
    fn id(&self) -> Option<SessionId> {
        match self {
            SessionState::Empty => None,
            SessionState::Resolving { id, .. }
            | SessionState::Active { id, .. }
            | SessionState::Failed { id, .. } => Some(*id),
        }
    }

    fn input(&self) -> Option<&Arc<dyn SymbolTreeInput>> {
        match self {
            SessionState::Empty => None,
            SessionState::Resolving { input, .. }
            | SessionState::Active { input, .. }
            | SessionState::Failed { input, .. } => Some(input),
        }
    }

    fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Empty => SessionPhase::Empty,
            SessionState::Resolving { .. } => SessionPhase::Resolving,
            SessionState::Active { .. } => SessionPhase::Active,
            SessionState::Failed { .. } => SessionPhase::Failed,
        }
    }

    /// Release the session's subscriptions and provider cleanup.
    fn dispose(self) {
        if let SessionState::Active { disposables, .. } = self {
            disposables.dispose();
        }
    }
}

/// Where the tree is in its session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No search; the history is shown.
    Empty,
    /// A search is set and still resolving.
    Resolving,
    /// The search resolved and its provider is shown.
    Active,
    /// The search failed to resolve.
    Failed,
}

/// Owns the tree view and swaps its content as searches come and go.
pub struct SymbolTree {
    config: TreeConfig,
    host: HostServices,
    view: Arc<dyn TreeView>,
    delegate: Arc<ProviderDelegate>,
    history: Arc<TreeInputHistory>,
    navigation: TreeNavigation,
    /// Held for a whole transition, host calls included. Readers only take `state`.
    transition: Mutex<()>,
    state: Mutex<SessionState>,
    next_session: AtomicU64,
    input_changed: EventEmitter<Option<Arc<dyn SymbolTreeInput>>>,
    commands: DisposableStore,
    cancel: CancellationToken,
}

impl SymbolTree {
    /// Create the view and show the (empty) history.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: TreeConfig, host: HostServices) -> Result<Arc<Self>> {
        config.validate()?;

        let delegate = Arc::new(ProviderDelegate::new());
        let history = Arc::new(TreeInputHistory::new(
            host.documents.clone(),
            host.context.clone(),
            config.history_capacity,
            config.open_command.clone(),
        ));
        let view = host
            .views
            .create_tree_view(&config.view_id, delegate.clone());
        let navigation = TreeNavigation::new(
            view.clone(),
            host.editor.clone(),
            host.commands.clone(),
            host.context.clone(),
            config.open_command.clone(),
        );

        let tree = Arc::new(Self {
            config,
            host,
            view,
            delegate,
            history,
            navigation,
            transition: Mutex::new(()),
            state: Mutex::new(SessionState::Empty),
            next_session: AtomicU64::new(0),
            input_changed: EventEmitter::new(),
            commands: DisposableStore::new(),
            cancel: CancellationToken::new(),
        });
        tree.clear_input();
        Ok(tree)
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn transition(&self) -> MutexGuard<'_, ()> {
        self.transition
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_current(&self, id: SessionId) -> bool {
        self.lock().id() == Some(id)
    }

    fn replace_state(&self, next: SessionState) -> SessionState {
        std::mem::replace(&mut *self.lock(), next)
    }

    pub fn view(&self) -> &Arc<dyn TreeView> {
        &self.view
    }

    pub fn history(&self) -> &Arc<TreeInputHistory> {
        &self.history
    }

    pub fn navigation(&self) -> &TreeNavigation {
        &self.navigation
    }

    /// The provider the view is bound to.
    pub fn provider(&self) -> Arc<dyn TreeDataProvider> {
        self.delegate.clone()
    }

    pub fn input(&self) -> Option<Arc<dyn SymbolTreeInput>> {
        self.lock().input().cloned()
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().phase()
    }

    /// Model of the active session.
    pub fn model(&self) -> Option<Arc<SymbolTreeModel>> {
        match &*self.lock() {
            SessionState::Active { model, .. } => Some(model.clone()),
            _ => None,
        }
    }

    /// Why the current input failed to resolve, if it did.
    pub fn last_error(&self) -> Option<ApiError> {
        match &*self.lock() {
            SessionState::Failed { error, .. } => Some(error.clone()),
            _ => None,
        }
    }

    /// Fires with the new input on `set_input` and with `None` on `clear_input`.
    pub fn on_did_change_input(&self) -> Event<Option<Arc<dyn SymbolTreeInput>>> {
        self.input_changed.event()
    }

    /// Show `input`, superseding whatever is shown now.
    ///
    /// Chrome, history and context keys are updated before this returns. The
    /// returned handle completes once the resolution has been applied, or
    /// dropped because a newer input was set in the meantime.
    pub fn set_input(self: &Arc<Self>, input: Arc<dyn SymbolTreeInput>) -> JoinHandle<()> {
        let id = SessionId(self.next_session.fetch_add(1, Ordering::Relaxed) + 1);
        tracing::debug!("set_input {:?} '{}'", id, input.title());

        let _entry = self.history.add(input.clone());

        let ctx = &self.host.context;
        ctx.set_bool(context::IS_ACTIVE, true);
        ctx.set_bool(context::HAS_RESULT, true);
        ctx.set_string(context::INPUT_SOURCE, input.context_value());
        self.host.commands.execute(CommandInvocation {
            command: format!("{}.focus", self.config.view_id),
            title: "Focus".to_string(),
            arguments: Vec::new(),
        });

        let resolving: Shared<BoxFuture<'static, ModelResult>> = {
            let input = input.clone();
            async move { input.resolve().await.map(|model| model.map(Arc::new)) }
                .boxed()
                .shared()
        };

        let fallback: Arc<dyn TreeDataProvider> = self.history.clone();
        let provider = resolving.clone().map(move |result| {
            result.map(|model| match model {
                Some(model) => model.provider.clone(),
                None => fallback,
            })
        });
        {
            let _transition = self.transition();
            let previous = self.replace_state(SessionState::Resolving {
                id,
                input: input.clone(),
            });
            previous.dispose();
            self.view.set_title(Some(input.title().to_string()));
            self.view.set_message(None);
            self.navigation.update(None);
            self.delegate.update(provider);
        }
        self.input_changed.fire(&Some(input.clone()));

        let this = Arc::clone(self);
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = this.cancel.cancelled() => return,
                result = resolving => result,
            };
            this.apply_resolution(id, input, result).await;
        })
    }

    async fn apply_resolution(
        self: &Arc<Self>,
        id: SessionId,
        input: Arc<dyn SymbolTreeInput>,
        result: ModelResult,
    ) {
        if !self.is_current(id) {
            tracing::debug!("resolution of {:?} superseded, dropping it", id);
            return;
        }
        match result {
            Ok(Some(model)) => self.activate(id, input, model).await,
            Ok(None) => {
                tracing::debug!("{:?} resolved without results", id);
                let cleared = {
                    let _transition = self.transition();
                    let current = self.is_current(id);
                    if current {
                        self.clear_session();
                    }
                    current
                };
                if cleared {
                    self.input_changed.fire(&None);
                }
            }
            Err(error) => self.fail(id, input, error),
        }
    }

    async fn activate(
        self: &Arc<Self>,
        id: SessionId,
        input: Arc<dyn SymbolTreeInput>,
        model: Arc<SymbolTreeModel>,
    ) {
        let disposables = self.session_disposables(id, &input, &model);
        {
            let _transition = self.transition();
            if !self.is_current(id) {
                disposables.dispose();
                return;
            }
            self.replace_state(SessionState::Active {
                id,
                input: input.clone(),
                model: model.clone(),
                disposables,
            });
            self.view.set_title(Some(input.title().to_string()));
            self.view.set_message(model.message());
            self.navigation.update(model.navigation.clone());
        }
        tracing::debug!("{:?} active", id);

        let location = input.location();
        let nearest = model
            .navigation
            .as_ref()
            .and_then(|nav| nav.nearest(&location.uri, location.range.start));
        if let Some(selection) = nearest {
            if self.is_current(id) && self.view.is_visible() {
                let options = RevealOptions {
                    select: true,
                    focus: true,
                    expand: true,
                };
                if let Err(err) = self.view.reveal(&selection, options).await {
                    tracing::warn!("failed to reveal nearest item: {}", err);
                }
            }
        }
    }

    /// Listeners and cleanup that live as long as the session.
    fn session_disposables(
        self: &Arc<Self>,
        id: SessionId,
        input: &Arc<dyn SymbolTreeInput>,
        model: &Arc<SymbolTreeModel>,
    ) -> DisposableStore {
        let disposables = DisposableStore::new();

        let highlights = model.highlights.clone().map(|delegate| {
            Arc::new(EditorHighlights::new(
                self.view.clone(),
                self.host.editor.clone(),
                delegate,
            ))
        });
        if let Some(highlights) = &highlights {
            disposables.add(highlights.clone());
        }

        if let Some(changes) = model.provider.on_did_change() {
            let tree: Weak<Self> = Arc::downgrade(self);
            let title = input.title().to_string();
            let model: Weak<SymbolTreeModel> = Arc::downgrade(model);
            let highlights = highlights.as_ref().map(Arc::downgrade);
            disposables.add(changes.subscribe(move |_| {
                if let (Some(tree), Some(model)) = (tree.upgrade(), model.upgrade()) {
                    if !tree.is_current(id) {
                        return;
                    }
                    tree.view.set_title(Some(title.clone()));
                    tree.view.set_message(model.message());
                }
                if let Some(highlights) = highlights.as_ref().and_then(Weak::upgrade) {
                    highlights.update();
                }
            }));
        }

        if let Some(disposal) = model.disposal.clone() {
            disposables.add(disposal);
        }
        disposables
    }

    fn fail(&self, id: SessionId, input: Arc<dyn SymbolTreeInput>, error: ApiError) {
        tracing::warn!("'{}' failed to resolve: {}", input.title(), error);
        let cleared = {
            let _transition = self.transition();
            if !self.is_current(id) {
                return;
            }
            match self.config.failure_policy {
                FailurePolicy::KeepStale => {
                    self.replace_state(SessionState::Failed { id, input, error });
                    false
                }
                FailurePolicy::ShowError => {
                    let message = error.to_string();
                    self.replace_state(SessionState::Failed { id, input, error });
                    self.view.set_message(Some(message));
                    false
                }
                FailurePolicy::ClearInput => {
                    self.clear_session();
                    true
                }
            }
        };
        if cleared {
            self.input_changed.fire(&None);
        }
    }

    /// Drop the current search and show the history.
    pub fn clear_input(&self) {
        {
            let _transition = self.transition();
            self.clear_session();
        }
        self.input_changed.fire(&None);
    }

    /// Callers hold the transition lock.
    fn clear_session(&self) {
        let previous = self.replace_state(SessionState::Empty);
        previous.dispose();
        self.navigation.update(None);

        self.host.context.set_bool(context::HAS_RESULT, false);
        self.host.context.reset(context::INPUT_SOURCE);
        self.view.set_title(Some(self.config.default_title.clone()));
        self.view.set_message(if self.history.is_empty() {
            Some(self.config.empty_message.clone())
        } else {
            None
        });

        let history: Arc<dyn TreeDataProvider> = self.history.clone();
        self.delegate.update(async move { Ok(history) });
    }

    /// Forget all past searches.
    pub fn clear_history(&self) {
        self.history.clear();
        if self.input().is_none() {
            self.clear_input();
        }
    }

    /// Run a remembered search again where its word is now.
    pub fn rerun(self: &Arc<Self>, item: &HistoryItem) -> JoinHandle<()> {
        let input = item.input.with_location(item.guessed_location());
        self.set_input(input)
    }

    /// Bind the tree's commands in the host command registry.
    pub fn register_commands(self: &Arc<Self>) {
        let registry = self.host.commands.clone();
        let weak = Arc::downgrade(self);

        let bind = |name: &str, handler: CommandHandler| {
            self.commands.add_boxed(registry.register(name, handler));
        };

        let tree = weak.clone();
        bind(
            CMD_CLEAR,
            Arc::new(move |_: Option<TreeElement>| {
                if let Some(tree) = tree.upgrade() {
                    tree.clear_input();
                }
            }),
        );

        let tree = weak.clone();
        bind(
            CMD_CLEAR_HISTORY,
            Arc::new(move |_: Option<TreeElement>| {
                if let Some(tree) = tree.upgrade() {
                    tree.clear_history();
                }
            }),
        );

        let tree = weak.clone();
        bind(
            CMD_REFIND,
            Arc::new(move |element: Option<TreeElement>| {
                let Some(tree) = tree.upgrade() else {
                    return;
                };
                match element.as_ref().and_then(TreeElement::downcast::<HistoryItem>) {
                    Some(item) => {
                        tree.rerun(&item);
                    }
                    None => tracing::warn!("{} invoked without a history item", CMD_REFIND),
                }
            }),
        );

        for (name, forward) in [(CMD_NEXT, true), (CMD_PREV, false)] {
            let tree = weak.clone();
            bind(
                name,
                Arc::new(move |_: Option<TreeElement>| {
                    let Some(tree) = tree.upgrade() else {
                        return;
                    };
                    tokio::spawn(async move {
                        let moved = if forward {
                            tree.navigation.next(false).await
                        } else {
                            tree.navigation.previous(false).await
                        };
                        if let Err(err) = moved {
                            tracing::warn!("navigation failed: {}", err);
                        }
                    });
                }),
            );
        }
    }

    pub fn dispose(&self) {
        self.cancel.cancel();
        let _transition = self.transition();
        let previous = self.replace_state(SessionState::Empty);
        previous.dispose();
        self.commands.dispose();
        self.delegate.dispose();
        self.input_changed.dispose();
        self.view.dispose();
    }
}
