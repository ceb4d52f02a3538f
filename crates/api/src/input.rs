use crate::error::ApiResult;
use crate::event::Disposable;
use crate::models::{Location, Position, Range, TreeElement};
use crate::provider::TreeDataProvider;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// One search the tree can display: find-references, call hierarchy, and so on.
///
/// Inputs are immutable. The view resolves an input into a [`SymbolTreeModel`]
/// and remembers it in its history, keyed by [`SymbolTreeInput::hash_key`].
#[async_trait]
pub trait SymbolTreeInput: Send + Sync {
    /// Display title, e.g. "References".
    fn title(&self) -> &str;

    /// Where the search was started.
    fn location(&self) -> &Location;

    /// Value published to the `reference-list.source` context key.
    fn context_value(&self) -> &str;

    /// Stable deduplication key. Two inputs with the same key are the same search.
    fn hash_key(&self) -> String;

    /// Run the search. `Ok(None)` means there is nothing to show.
    async fn resolve(&self) -> ApiResult<Option<SymbolTreeModel>>;

    /// The same search started at another location.
    fn with_location(&self, location: Location) -> Arc<dyn SymbolTreeInput>;
}

/// Keyboard-style navigation over the items of a model.
pub trait SymbolItemNavigation: Send + Sync {
    /// Item closest to `position` in `uri`, if any.
    fn nearest(&self, uri: &Url, position: Position) -> Option<TreeElement>;
    fn next(&self, from: &TreeElement) -> TreeElement;
    fn previous(&self, from: &TreeElement) -> TreeElement;
    /// Source location of an item, used to open it in an editor.
    fn location(&self, item: &TreeElement) -> Option<Location>;
}

/// Ranges to highlight in an editor while an item is selected.
pub trait SymbolItemEditorHighlights: Send + Sync {
    fn editor_highlights(&self, item: &TreeElement, uri: &Url) -> Option<Vec<Range>>;
}

/// Produces the current view message of a model, e.g. a result count.
pub type MessageSource = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Result of resolving an input.
pub struct SymbolTreeModel {
    /// Read again whenever the provider reports a change.
    pub message: Option<MessageSource>,
    pub provider: Arc<dyn TreeDataProvider>,
    pub navigation: Option<Arc<dyn SymbolItemNavigation>>,
    pub highlights: Option<Arc<dyn SymbolItemEditorHighlights>>,
    /// Cleanup to run when the session showing this model ends.
    pub disposal: Option<Arc<dyn Disposable>>,
}

impl SymbolTreeModel {
    pub fn new(provider: Arc<dyn TreeDataProvider>) -> Self {
        Self {
            message: None,
            provider,
            navigation: None,
            highlights: None,
            disposal: None,
        }
    }

    /// A message that never changes.
    pub fn with_message(self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.with_live_message(move || Some(message.clone()))
    }

    pub fn with_live_message(
        mut self,
        message: impl Fn() -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.message = Some(Arc::new(message));
        self
    }

    pub fn message(&self) -> Option<String> {
        self.message.as_ref().and_then(|source| source())
    }

    pub fn with_navigation(mut self, navigation: Arc<dyn SymbolItemNavigation>) -> Self {
        self.navigation = Some(navigation);
        self
    }

    pub fn with_highlights(mut self, highlights: Arc<dyn SymbolItemEditorHighlights>) -> Self {
        self.highlights = Some(highlights);
        self
    }

    pub fn with_disposal(mut self, disposal: Arc<dyn Disposable>) -> Self {
        self.disposal = Some(disposal);
        self
    }
}

impl fmt::Debug for SymbolTreeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolTreeModel")
            .field("message", &self.message())
            .field("navigation", &self.navigation.is_some())
            .field("highlights", &self.highlights.is_some())
            .field("disposal", &self.disposal.is_some())
            .finish()
    }
}
