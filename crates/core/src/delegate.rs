//! Stable tree data provider in front of a swappable backing provider.
//!
//! The host view binds to one [`ProviderDelegate`] for its whole lifetime. The
//! controller repoints the delegate with [`ProviderDelegate::update`] whenever
//! the displayed content changes; the delegate's change event stays the same
//! object, so the view never re-subscribes.

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use symtree_api::{
    ApiError, ApiResult, Disposable, Event, EventEmitter, Subscription, TreeChange,
    TreeDataProvider, TreeElement, TreeItem,
};
use tokio::task::JoinHandle;

pub type ProviderResult = ApiResult<Arc<dyn TreeDataProvider>>;
pub type PendingProvider = Shared<BoxFuture<'static, ProviderResult>>;

#[derive(Default)]
struct Slot {
    /// Bumped on every update; a resolution only wires itself up if its
    /// generation is still current.
    generation: u64,
    pending: Option<PendingProvider>,
    subscription: Option<Subscription>,
}

pub struct ProviderDelegate {
    emitter: Arc<EventEmitter<TreeChange>>,
    slot: Arc<Mutex<Slot>>,
}

impl ProviderDelegate {
    pub fn new() -> Self {
        Self {
            emitter: Arc::new(EventEmitter::new()),
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
        slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The change event shown to the host. Same identity for the delegate's lifetime.
    pub fn event(&self) -> Event<TreeChange> {
        self.emitter.event()
    }

    /// Swap in a provider that may still be resolving.
    ///
    /// Drops the subscription to the previous provider and tells the view to
    /// reload from the root right away. Once `pending` resolves, and only if no
    /// newer update happened in the meantime, the new provider's change events
    /// are forwarded through the delegate. A failed resolution leaves the
    /// delegate without a provider.
    ///
    /// Must be called from within a tokio runtime.
    pub fn update<F>(&self, pending: F) -> JoinHandle<()>
    where
        F: Future<Output = ProviderResult> + Send + 'static,
    {
        let pending: PendingProvider = pending
            .map(|result| {
                result.map_err(|err| {
                    tracing::warn!("tree data provider failed to resolve: {}", err);
                    ApiError::NoProvider
                })
            })
            .boxed()
            .shared();

        let (generation, previous) = {
            let mut slot = Self::lock(&self.slot);
            slot.generation += 1;
            slot.pending = Some(pending.clone());
            (slot.generation, slot.subscription.take())
        };
        if let Some(previous) = previous {
            previous.dispose();
        }

        self.emitter.fire(&TreeChange::Root);

        let slot = Arc::downgrade(&self.slot);
        let emitter = Arc::downgrade(&self.emitter);
        tokio::spawn(async move {
            let Ok(provider) = pending.await else {
                return;
            };
            Self::forward_changes(slot, emitter, generation, provider);
        })
    }

    fn forward_changes(
        slot: Weak<Mutex<Slot>>,
        emitter: Weak<EventEmitter<TreeChange>>,
        generation: u64,
        provider: Arc<dyn TreeDataProvider>,
    ) {
        let Some(slot) = slot.upgrade() else {
            return;
        };
        let mut slot = Self::lock(slot.as_ref());
        if slot.generation != generation {
            tracing::debug!(
                "provider resolution {} superseded by {}",
                generation,
                slot.generation
            );
            return;
        }
        let Some(changes) = provider.on_did_change() else {
            return;
        };
        slot.subscription = Some(changes.subscribe(move |change| {
            if let Some(emitter) = emitter.upgrade() {
                emitter.fire(change);
            }
        }));
    }

    async fn current(&self) -> ProviderResult {
        let pending = Self::lock(&self.slot)
            .pending
            .clone()
            .ok_or(ApiError::NoProvider)?;
        pending.await
    }

    pub fn dispose(&self) {
        let subscription = Self::lock(&self.slot).subscription.take();
        if let Some(subscription) = subscription {
            subscription.dispose();
        }
        self.emitter.dispose();
    }
}

impl Default for ProviderDelegate {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TreeDataProvider for ProviderDelegate {
    async fn tree_item(&self, element: &TreeElement) -> ApiResult<TreeItem> {
        self.current().await?.tree_item(element).await
    }

    async fn children(&self, parent: Option<&TreeElement>) -> ApiResult<Vec<TreeElement>> {
        self.current().await?.children(parent).await
    }

    async fn parent(&self, element: &TreeElement) -> ApiResult<Option<TreeElement>> {
        self.current().await?.parent(element).await
    }

    fn on_did_change(&self) -> Option<Event<TreeChange>> {
        Some(self.event())
    }
}
