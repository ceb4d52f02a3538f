use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Opaque handle to a node shown in a tree view.
///
/// Providers decide what a node is; the view and the delegate only pass
/// handles around. Two handles are the same node when they share an allocation.
#[derive(Clone)]
pub struct TreeElement(Arc<dyn Any + Send + Sync>);

impl TreeElement {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self(value)
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.0.clone().downcast::<T>().ok()
    }

    pub fn ptr_eq(&self, other: &TreeElement) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for TreeElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TreeElement({:p})", Arc::as_ptr(&self.0))
    }
}

/// What changed in a tree: everything below the root, or one subtree.
#[derive(Debug, Clone)]
pub enum TreeChange {
    Root,
    Element(TreeElement),
}

impl TreeChange {
    pub fn is_root(&self) -> bool {
        matches!(self, TreeChange::Root)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollapsibleState {
    #[default]
    None,
    Collapsed,
    Expanded,
}

/// A command the host runs by name, e.g. when a row is clicked.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CommandInvocation {
    pub command: String,
    pub title: String,
    pub arguments: Vec<serde_json::Value>,
}

/// Row rendering produced by a provider for one element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeItem {
    pub label: String,
    pub description: Option<String>,
    pub tooltip: Option<String>,
    pub resource_uri: Option<Url>,
    pub collapsible_state: CollapsibleState,
    /// Tag the host matches against to enable row-specific commands.
    pub context_value: Option<String>,
    pub command: Option<CommandInvocation>,
}

impl TreeItem {
    pub fn new(label: impl Into<String>, collapsible_state: CollapsibleState) -> Self {
        Self {
            label: label.into(),
            collapsible_state,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RevealOptions {
    pub select: bool,
    pub focus: bool,
    pub expand: bool,
}
