use std::collections::HashSet;
use std::sync::{Arc, Mutex, Weak};
use symtree_api::{Disposable, DisposableStore, EditorHost, SymbolItemEditorHighlights, TreeView};

struct Inner {
    view: Arc<dyn TreeView>,
    editor: Arc<dyn EditorHost>,
    delegate: Arc<dyn SymbolItemEditorHighlights>,
    /// Documents edited since the session started; their ranges are stale.
    ignore: Mutex<HashSet<String>>,
}

impl Inner {
    fn show(&self) {
        let Some(active) = self.editor.active_location() else {
            return;
        };
        let ignored = self
            .ignore
            .lock()
            .map(|ignore| ignore.contains(active.uri.as_str()))
            .unwrap_or(false);
        if ignored {
            return;
        }
        let Some(anchor) = self.view.selection().into_iter().next() else {
            return;
        };
        if let Some(ranges) = self.delegate.editor_highlights(&anchor, &active.uri) {
            self.editor.set_highlights(&active.uri, &ranges);
        }
    }

    fn hide(&self) {
        self.editor.clear_highlights();
    }

    fn update(&self) {
        self.hide();
        self.show();
    }
}

/// Mirrors the highlight ranges of the selected tree item into the active editor.
pub struct EditorHighlights {
    inner: Arc<Inner>,
    disposables: DisposableStore,
}

impl EditorHighlights {
    pub fn new(
        view: Arc<dyn TreeView>,
        editor: Arc<dyn EditorHost>,
        delegate: Arc<dyn SymbolItemEditorHighlights>,
    ) -> Self {
        let inner = Arc::new(Inner {
            view: view.clone(),
            editor: editor.clone(),
            delegate,
            ignore: Mutex::new(HashSet::new()),
        });
        let disposables = DisposableStore::new();

        let weak = Arc::downgrade(&inner);
        disposables.add(editor.on_did_change_document().subscribe(move |uri| {
            if let Some(inner) = weak.upgrade() {
                if let Ok(mut ignore) = inner.ignore.lock() {
                    ignore.insert(uri.to_string());
                }
            }
        }));

        let weak = Arc::downgrade(&inner);
        disposables.add(editor.on_did_change_active_editor().subscribe(move |_| {
            with_visible(&weak, Inner::update);
        }));

        let weak: Weak<Inner> = Arc::downgrade(&inner);
        disposables.add(view.on_did_change_visibility().subscribe(move |visible| {
            if let Some(inner) = weak.upgrade() {
                if *visible {
                    inner.show();
                } else {
                    inner.hide();
                }
            }
        }));

        let weak = Arc::downgrade(&inner);
        disposables.add(view.on_did_change_selection().subscribe(move |_| {
            with_visible(&weak, Inner::update);
        }));

        inner.show();
        Self { inner, disposables }
    }

    /// Recompute after the model changed.
    pub fn update(&self) {
        self.inner.update();
    }
}

fn with_visible(inner: &Weak<Inner>, f: impl FnOnce(&Inner)) {
    if let Some(inner) = inner.upgrade() {
        if inner.view.is_visible() {
            f(&inner);
        }
    }
}

impl Disposable for EditorHighlights {
    fn dispose(&self) {
        self.disposables.dispose();
        self.inner.hide();
    }
}
