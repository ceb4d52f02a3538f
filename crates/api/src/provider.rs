use crate::error::ApiResult;
use crate::event::Event;
use crate::models::{TreeChange, TreeElement, TreeItem};
use async_trait::async_trait;

/// Data source behind a tree view.
///
/// The host asks for the root with `children(None)`, renders each element via
/// `tree_item`, and re-queries whenever the change event fires.
#[async_trait]
pub trait TreeDataProvider: Send + Sync {
    /// Render one element as a row.
    async fn tree_item(&self, element: &TreeElement) -> ApiResult<TreeItem>;

    /// Children of `parent`, or the top-level elements when `parent` is `None`.
    async fn children(&self, parent: Option<&TreeElement>) -> ApiResult<Vec<TreeElement>>;

    /// Parent of `element`; `None` for top-level elements.
    async fn parent(&self, element: &TreeElement) -> ApiResult<Option<TreeElement>>;

    /// Change notifications, if this provider ever changes after creation.
    fn on_did_change(&self) -> Option<Event<TreeChange>> {
        None
    }
}
