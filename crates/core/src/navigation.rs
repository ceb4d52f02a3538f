use crate::context;
use serde_json::json;
use std::sync::{Arc, Mutex};
use symtree_api::{
    ApiResult, CommandInvocation, CommandRegistry, ContextKeys, EditorHost, Location,
    RevealOptions, SymbolItemNavigation, TreeElement, TreeView,
};

/// Moves the tree selection to the next/previous item of the active model and
/// opens it in an editor.
pub struct TreeNavigation {
    view: Arc<dyn TreeView>,
    editor: Arc<dyn EditorHost>,
    commands: Arc<dyn CommandRegistry>,
    context: Arc<dyn ContextKeys>,
    open_command: String,
    delegate: Mutex<Option<Arc<dyn SymbolItemNavigation>>>,
}

impl TreeNavigation {
    pub fn new(
        view: Arc<dyn TreeView>,
        editor: Arc<dyn EditorHost>,
        commands: Arc<dyn CommandRegistry>,
        context: Arc<dyn ContextKeys>,
        open_command: impl Into<String>,
    ) -> Self {
        Self {
            view,
            editor,
            commands,
            context,
            open_command: open_command.into(),
            delegate: Mutex::new(None),
        }
    }

    pub fn update(&self, delegate: Option<Arc<dyn SymbolItemNavigation>>) {
        self.context
            .set_bool(context::CAN_NAVIGATE, delegate.is_some());
        *self
            .delegate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = delegate;
    }

    fn delegate(&self) -> Option<Arc<dyn SymbolItemNavigation>> {
        self.delegate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn can_navigate(&self) -> bool {
        self.delegate().is_some()
    }

    /// Selected item, else the item nearest to the editor cursor.
    fn anchor(&self, delegate: &dyn SymbolItemNavigation) -> Option<TreeElement> {
        if let Some(selected) = self.view.selection().into_iter().next() {
            return Some(selected);
        }
        let active = self.editor.active_location()?;
        delegate.nearest(&active.uri, active.range.start)
    }

    pub async fn next(&self, preserve_focus: bool) -> ApiResult<Option<TreeElement>> {
        self.step(true, preserve_focus).await
    }

    pub async fn previous(&self, preserve_focus: bool) -> ApiResult<Option<TreeElement>> {
        self.step(false, preserve_focus).await
    }

    async fn step(&self, forward: bool, preserve_focus: bool) -> ApiResult<Option<TreeElement>> {
        let Some(delegate) = self.delegate() else {
            return Ok(None);
        };
        let Some(from) = self.anchor(delegate.as_ref()) else {
            return Ok(None);
        };
        let target = if forward {
            delegate.next(&from)
        } else {
            delegate.previous(&from)
        };
        let Some(location) = delegate.location(&target) else {
            return Ok(None);
        };
        self.view
            .reveal(
                &target,
                RevealOptions {
                    select: true,
                    focus: true,
                    expand: false,
                },
            )
            .await?;
        self.open(&location, preserve_focus);
        Ok(Some(target))
    }

    fn open(&self, location: &Location, preserve_focus: bool) {
        let start = location.range.start;
        self.commands.execute(CommandInvocation {
            command: self.open_command.clone(),
            title: "Open Location".to_string(),
            arguments: vec![
                json!(location.uri.as_str()),
                json!({
                    "selection": { "start": start, "end": start },
                    "preserveFocus": preserve_focus,
                }),
            ],
        });
    }
}
