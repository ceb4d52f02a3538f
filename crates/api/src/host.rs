//! Capabilities the embedding editor provides.

use crate::error::ApiResult;
use crate::event::{Disposable, Event};
use crate::models::{CommandInvocation, Location, Range, RevealOptions, TreeElement};
use crate::provider::TreeDataProvider;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

/// A tree view widget bound to one data provider.
#[async_trait]
pub trait TreeView: Send + Sync {
    fn title(&self) -> Option<String>;
    fn set_title(&self, title: Option<String>);
    fn message(&self) -> Option<String>;
    fn set_message(&self, message: Option<String>);
    fn is_visible(&self) -> bool;
    fn selection(&self) -> Vec<TreeElement>;
    async fn reveal(&self, element: &TreeElement, options: RevealOptions) -> ApiResult<()>;
    fn on_did_change_selection(&self) -> Event<Vec<TreeElement>>;
    fn on_did_change_visibility(&self) -> Event<bool>;
    fn dispose(&self);
}

pub trait TreeViewHost: Send + Sync {
    fn create_tree_view(
        &self,
        view_id: &str,
        provider: Arc<dyn TreeDataProvider>,
    ) -> Arc<dyn TreeView>;
}

/// Read access to an open text document.
pub trait TextDocument: Send + Sync {
    fn uri(&self) -> &Url;
    /// Bumped on every edit.
    fn version(&self) -> i32;
    fn line_count(&self) -> u32;
    fn line_text(&self, line: u32) -> Option<String>;
}

#[async_trait]
pub trait DocumentService: Send + Sync {
    async fn open(&self, uri: &Url) -> ApiResult<Arc<dyn TextDocument>>;
    /// Workspace-relative rendering of `uri`.
    fn relative_path(&self, uri: &Url) -> String;
}

pub type CommandHandler = Arc<dyn Fn(Option<TreeElement>) + Send + Sync>;

pub trait CommandRegistry: Send + Sync {
    fn register(&self, name: &str, handler: CommandHandler) -> Box<dyn Disposable>;
    fn execute(&self, invocation: CommandInvocation);
}

/// Named values other parts of the host UI observe.
pub trait ContextKeys: Send + Sync {
    fn set_bool(&self, key: &str, value: bool);
    fn set_string(&self, key: &str, value: &str);
    fn reset(&self, key: &str);
}

/// The text editors around the tree view.
pub trait EditorHost: Send + Sync {
    /// Document and cursor of the focused editor.
    fn active_location(&self) -> Option<Location>;
    fn set_highlights(&self, uri: &Url, ranges: &[Range]);
    fn clear_highlights(&self);
    fn on_did_change_active_editor(&self) -> Event<()>;
    /// Fires with the uri of every edited document.
    fn on_did_change_document(&self) -> Event<Url>;
}

#[derive(Clone)]
pub struct HostServices {
    pub views: Arc<dyn TreeViewHost>,
    pub documents: Arc<dyn DocumentService>,
    pub commands: Arc<dyn CommandRegistry>,
    pub context: Arc<dyn ContextKeys>,
    pub editor: Arc<dyn EditorHost>,
}
