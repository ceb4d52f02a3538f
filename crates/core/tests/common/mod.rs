#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use symtree_api::{
    ApiError, ApiResult, CollapsibleState, CommandHandler, CommandInvocation, CommandRegistry,
    Disposable, DocumentService, EditorHost, Event, EventEmitter, HostServices, Location, Position,
    Range, RevealOptions, SymbolItemEditorHighlights, SymbolItemNavigation, SymbolTreeInput,
    SymbolTreeModel, TextDocument, TreeChange, TreeDataProvider, TreeElement, TreeItem, TreeView,
    TreeViewHost,
};
use symtree_core::context::MemoryContextKeys;
use tokio::sync::oneshot;
use url::Url;

pub const MAIN_URI: &str = "file:///work/src/Main.java";

pub const MAIN_TEXT: &str = "class Main {\n  void run() { helper(); }\n   \n  a ->> b\n}";

pub fn uri(raw: &str) -> Url {
    Url::parse(raw).expect("valid test uri")
}

pub fn location(raw: &str, line: u32, character: u32) -> Location {
    Location::new(uri(raw), Range::at(Position::new(line, character)))
}

// ---------------------------------------------------------------------------
// documents

pub struct LinesDocument {
    uri: Url,
    version: AtomicI32,
    lines: Mutex<Vec<String>>,
}

impl LinesDocument {
    pub fn new(uri: Url, text: &str) -> Arc<Self> {
        Arc::new(Self {
            uri,
            version: AtomicI32::new(1),
            lines: Mutex::new(text.lines().map(str::to_string).collect()),
        })
    }

    pub fn edit(&self, text: &str) {
        *self.lines.lock().unwrap() = text.lines().map(str::to_string).collect();
        self.version.fetch_add(1, Ordering::SeqCst);
    }
}

impl TextDocument for LinesDocument {
    fn uri(&self) -> &Url {
        &self.uri
    }
    fn version(&self) -> i32 {
        self.version.load(Ordering::SeqCst)
    }
    fn line_count(&self) -> u32 {
        self.lines.lock().unwrap().len() as u32
    }
    fn line_text(&self, line: u32) -> Option<String> {
        self.lines.lock().unwrap().get(line as usize).cloned()
    }
}

#[derive(Default)]
pub struct FakeDocuments {
    docs: Mutex<HashMap<String, Arc<LinesDocument>>>,
}

impl FakeDocuments {
    pub fn insert(&self, raw_uri: &str, text: &str) -> Arc<LinesDocument> {
        let doc = LinesDocument::new(uri(raw_uri), text);
        self.docs
            .lock()
            .unwrap()
            .insert(raw_uri.to_string(), doc.clone());
        doc
    }
}

#[async_trait]
impl DocumentService for FakeDocuments {
    async fn open(&self, uri: &Url) -> ApiResult<Arc<dyn TextDocument>> {
        let doc = self.docs.lock().unwrap().get(uri.as_str()).cloned();
        match doc {
            Some(doc) => Ok(doc),
            None => Err(ApiError::NotFound(uri.to_string())),
        }
    }

    fn relative_path(&self, uri: &Url) -> String {
        uri.as_str()
            .strip_prefix("file:///work/")
            .unwrap_or(uri.as_str())
            .to_string()
    }
}

// ---------------------------------------------------------------------------
// tree view

pub struct FakeView {
    pub provider: Arc<dyn TreeDataProvider>,
    title: Mutex<Option<String>>,
    message: Mutex<Option<String>>,
    visible: AtomicBool,
    selection: Mutex<Vec<TreeElement>>,
    pub reveals: Mutex<Vec<(TreeElement, RevealOptions)>>,
    pub disposed: AtomicBool,
    selection_changed: EventEmitter<Vec<TreeElement>>,
    visibility_changed: EventEmitter<bool>,
}

impl FakeView {
    fn new(provider: Arc<dyn TreeDataProvider>) -> Self {
        Self {
            provider,
            title: Mutex::new(None),
            message: Mutex::new(None),
            visible: AtomicBool::new(true),
            selection: Mutex::new(Vec::new()),
            reveals: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
            selection_changed: EventEmitter::new(),
            visibility_changed: EventEmitter::new(),
        }
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
        self.visibility_changed.fire(&visible);
    }

    pub fn select(&self, elements: Vec<TreeElement>) {
        *self.selection.lock().unwrap() = elements.clone();
        self.selection_changed.fire(&elements);
    }

    pub fn reveal_count(&self) -> usize {
        self.reveals.lock().unwrap().len()
    }
}

#[async_trait]
impl TreeView for FakeView {
    fn title(&self) -> Option<String> {
        self.title.lock().unwrap().clone()
    }
    fn set_title(&self, title: Option<String>) {
        *self.title.lock().unwrap() = title;
    }
    fn message(&self) -> Option<String> {
        self.message.lock().unwrap().clone()
    }
    fn set_message(&self, message: Option<String>) {
        *self.message.lock().unwrap() = message;
    }
    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
    fn selection(&self) -> Vec<TreeElement> {
        self.selection.lock().unwrap().clone()
    }
    async fn reveal(&self, element: &TreeElement, options: RevealOptions) -> ApiResult<()> {
        self.reveals
            .lock()
            .unwrap()
            .push((element.clone(), options));
        if options.select {
            self.select(vec![element.clone()]);
        }
        Ok(())
    }
    fn on_did_change_selection(&self) -> Event<Vec<TreeElement>> {
        self.selection_changed.event()
    }
    fn on_did_change_visibility(&self) -> Event<bool> {
        self.visibility_changed.event()
    }
    fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeViewHost {
    pub created: Mutex<Vec<(String, Arc<FakeView>)>>,
}

impl FakeViewHost {
    pub fn view(&self) -> Arc<FakeView> {
        self.created
            .lock()
            .unwrap()
            .last()
            .map(|(_, view)| view.clone())
            .expect("a view was created")
    }
}

impl TreeViewHost for FakeViewHost {
    fn create_tree_view(
        &self,
        view_id: &str,
        provider: Arc<dyn TreeDataProvider>,
    ) -> Arc<dyn TreeView> {
        let view = Arc::new(FakeView::new(provider));
        self.created
            .lock()
            .unwrap()
            .push((view_id.to_string(), view.clone()));
        view
    }
}

// ---------------------------------------------------------------------------
// commands

#[derive(Default)]
pub struct FakeCommands {
    handlers: Arc<Mutex<HashMap<String, CommandHandler>>>,
    pub executed: Mutex<Vec<CommandInvocation>>,
}

struct Unregister {
    handlers: Arc<Mutex<HashMap<String, CommandHandler>>>,
    name: String,
}

impl Disposable for Unregister {
    fn dispose(&self) {
        self.handlers.lock().unwrap().remove(&self.name);
    }
}

impl FakeCommands {
    pub fn invoke(&self, name: &str, element: Option<TreeElement>) -> bool {
        let handler = self.handlers.lock().unwrap().get(name).cloned();
        match handler {
            Some(handler) => {
                handler(element);
                true
            }
            None => false,
        }
    }

    pub fn executed_names(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.command.clone())
            .collect()
    }

    pub fn registered(&self, name: &str) -> bool {
        self.handlers.lock().unwrap().contains_key(name)
    }
}

impl CommandRegistry for FakeCommands {
    fn register(&self, name: &str, handler: CommandHandler) -> Box<dyn Disposable> {
        self.handlers
            .lock()
            .unwrap()
            .insert(name.to_string(), handler);
        Box::new(Unregister {
            handlers: self.handlers.clone(),
            name: name.to_string(),
        })
    }

    fn execute(&self, invocation: CommandInvocation) {
        self.executed.lock().unwrap().push(invocation);
    }
}

// ---------------------------------------------------------------------------
// editor

#[derive(Default)]
pub struct FakeEditor {
    pub active: Mutex<Option<Location>>,
    pub highlights: Mutex<Option<(Url, Vec<Range>)>>,
    active_changed: EventEmitter<()>,
    document_changed: EventEmitter<Url>,
}

impl FakeEditor {
    pub fn activate(&self, location: Location) {
        *self.active.lock().unwrap() = Some(location);
        self.active_changed.fire(&());
    }

    pub fn edit(&self, uri: &Url) {
        self.document_changed.fire(uri);
    }

    pub fn current_highlights(&self) -> Option<(Url, Vec<Range>)> {
        self.highlights.lock().unwrap().clone()
    }
}

impl EditorHost for FakeEditor {
    fn active_location(&self) -> Option<Location> {
        self.active.lock().unwrap().clone()
    }
    fn set_highlights(&self, uri: &Url, ranges: &[Range]) {
        *self.highlights.lock().unwrap() = Some((uri.clone(), ranges.to_vec()));
    }
    fn clear_highlights(&self) {
        *self.highlights.lock().unwrap() = None;
    }
    fn on_did_change_active_editor(&self) -> Event<()> {
        self.active_changed.event()
    }
    fn on_did_change_document(&self) -> Event<Url> {
        self.document_changed.event()
    }
}

// ---------------------------------------------------------------------------
// host bundle

pub struct TestHost {
    pub views: Arc<FakeViewHost>,
    pub documents: Arc<FakeDocuments>,
    pub commands: Arc<FakeCommands>,
    pub context: Arc<MemoryContextKeys>,
    pub editor: Arc<FakeEditor>,
}

impl TestHost {
    pub fn new() -> Self {
        let documents = Arc::new(FakeDocuments::default());
        documents.insert(MAIN_URI, MAIN_TEXT);
        Self {
            views: Arc::new(FakeViewHost::default()),
            documents,
            commands: Arc::new(FakeCommands::default()),
            context: Arc::new(MemoryContextKeys::new()),
            editor: Arc::new(FakeEditor::default()),
        }
    }

    pub fn services(&self) -> HostServices {
        HostServices {
            views: self.views.clone(),
            documents: self.documents.clone(),
            commands: self.commands.clone(),
            context: self.context.clone(),
            editor: self.editor.clone(),
        }
    }

    pub fn view(&self) -> Arc<FakeView> {
        self.views.view()
    }
}

// ---------------------------------------------------------------------------
// providers and inputs

/// Flat list of string rows with navigation over them.
pub struct ListProvider {
    pub uri: Url,
    pub elements: Vec<TreeElement>,
    changed: EventEmitter<TreeChange>,
}

impl ListProvider {
    pub fn new(uri: Url, labels: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            uri,
            elements: labels
                .iter()
                .map(|label| TreeElement::new(label.to_string()))
                .collect(),
            changed: EventEmitter::new(),
        })
    }

    pub fn fire_change(&self) {
        self.changed.fire(&TreeChange::Root);
    }

    pub fn listener_count(&self) -> usize {
        self.changed.listener_count()
    }

    fn index_of(&self, element: &TreeElement) -> Option<usize> {
        self.elements.iter().position(|e| e.ptr_eq(element))
    }
}

#[async_trait]
impl TreeDataProvider for ListProvider {
    async fn tree_item(&self, element: &TreeElement) -> ApiResult<TreeItem> {
        let label = element
            .downcast_ref::<String>()
            .ok_or_else(|| ApiError::InvalidArgument("not a row".to_string()))?;
        Ok(TreeItem::new(label.clone(), CollapsibleState::None))
    }

    async fn children(&self, parent: Option<&TreeElement>) -> ApiResult<Vec<TreeElement>> {
        Ok(match parent {
            None => self.elements.clone(),
            Some(_) => Vec::new(),
        })
    }

    async fn parent(&self, _element: &TreeElement) -> ApiResult<Option<TreeElement>> {
        Ok(None)
    }

    fn on_did_change(&self) -> Option<Event<TreeChange>> {
        Some(self.changed.event())
    }
}

impl SymbolItemNavigation for ListProvider {
    fn nearest(&self, _uri: &Url, position: Position) -> Option<TreeElement> {
        let index = (position.line as usize).min(self.elements.len().checked_sub(1)?);
        self.elements.get(index).cloned()
    }

    fn next(&self, from: &TreeElement) -> TreeElement {
        let index = self.index_of(from).map(|i| i + 1).unwrap_or(0);
        self.elements[index % self.elements.len()].clone()
    }

    fn previous(&self, from: &TreeElement) -> TreeElement {
        let len = self.elements.len();
        let index = self.index_of(from).unwrap_or(0);
        self.elements[(index + len - 1) % len].clone()
    }

    fn location(&self, item: &TreeElement) -> Option<Location> {
        let index = self.index_of(item)?;
        Some(Location::new(
            self.uri.clone(),
            Range::at(Position::new(index as u32, 0)),
        ))
    }
}

impl SymbolItemEditorHighlights for ListProvider {
    fn editor_highlights(&self, item: &TreeElement, uri: &Url) -> Option<Vec<Range>> {
        if uri != &self.uri {
            return None;
        }
        let index = self.index_of(item)? as u32;
        Some(vec![Range::new(
            Position::new(index, 0),
            Position::new(index, 4),
        )])
    }
}

#[derive(Default)]
pub struct CountingDisposal {
    pub count: AtomicUsize,
}

impl Disposable for CountingDisposal {
    fn dispose(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Model,
    Empty,
    Fail,
}

pub struct TestInput {
    pub title: String,
    pub key: String,
    pub location: Location,
    pub message: Arc<Mutex<Option<String>>>,
    pub provider: Arc<ListProvider>,
    pub disposal: Arc<CountingDisposal>,
    pub outcome: Outcome,
    pub navigable: bool,
    pub highlighted: bool,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl TestInput {
    pub fn new(title: &str, key: &str, location: Location) -> Self {
        let provider = ListProvider::new(location.uri.clone(), &["first", "second", "third"]);
        Self {
            title: title.to_string(),
            key: key.to_string(),
            location,
            message: Arc::new(Mutex::new(None)),
            provider,
            disposal: Arc::new(CountingDisposal::default()),
            outcome: Outcome::Model,
            navigable: false,
            highlighted: false,
            gate: Mutex::new(None),
        }
    }

    pub fn at_main(title: &str, key: &str) -> Self {
        Self::new(title, key, location(MAIN_URI, 1, 8))
    }

    pub fn with_message(self, message: &str) -> Self {
        self.set_message(message);
        self
    }

    /// Changes what resolved models report from now on.
    pub fn set_message(&self, message: &str) {
        *self.message.lock().unwrap() = Some(message.to_string());
    }

    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn navigable(mut self) -> Self {
        self.navigable = true;
        self
    }

    pub fn highlighted(mut self) -> Self {
        self.highlighted = true;
        self
    }

    /// Resolution waits until the returned sender fires (or is dropped).
    pub fn gated(self) -> (Arc<Self>, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock().unwrap() = Some(rx);
        (Arc::new(self), tx)
    }

    pub fn ready(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl SymbolTreeInput for TestInput {
    fn title(&self) -> &str {
        &self.title
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn context_value(&self) -> &str {
        "test-references"
    }

    fn hash_key(&self) -> String {
        self.key.clone()
    }

    async fn resolve(&self) -> ApiResult<Option<SymbolTreeModel>> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        match self.outcome {
            Outcome::Fail => Err(ApiError::Resolution(format!("{} exploded", self.title))),
            Outcome::Empty => Ok(None),
            Outcome::Model => {
                let message = self.message.clone();
                let mut model = SymbolTreeModel::new(self.provider.clone())
                    .with_disposal(self.disposal.clone())
                    .with_live_message(move || message.lock().unwrap().clone());
                if self.navigable {
                    model = model.with_navigation(self.provider.clone());
                }
                if self.highlighted {
                    model = model.with_highlights(self.provider.clone());
                }
                Ok(Some(model))
            }
        }
    }

    fn with_location(&self, location: Location) -> Arc<dyn SymbolTreeInput> {
        let mut input = TestInput::new(&self.title, &self.key, location);
        input.message = self.message.clone();
        input.navigable = self.navigable;
        Arc::new(input)
    }
}
