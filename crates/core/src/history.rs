//! Most-recently-used list of past searches, shown when no search is active.

use crate::anchor::WordAnchor;
use crate::context;
use crate::error::{Result, TreeError};
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared, join_all};
use indexmap::IndexMap;
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard};
use symtree_api::{
    ApiError, ApiResult, CollapsibleState, CommandInvocation, ContextKeys, DocumentService, Event,
    EventEmitter, Location, Range, SymbolTreeInput, TreeChange, TreeDataProvider, TreeElement,
    TreeItem,
};

/// Label used when there is no word at the search location.
pub const WORD_PLACEHOLDER: &str = "???";

/// Context value of history rows.
pub const HISTORY_ITEM_CONTEXT: &str = "history-item";

/// A remembered search.
pub struct HistoryItem {
    pub key: String,
    /// Word at the search location when the search ran.
    pub word: String,
    pub anchor: WordAnchor,
    pub input: Arc<dyn SymbolTreeInput>,
}

impl HistoryItem {
    /// Search location, following edits made since the search ran.
    pub fn guessed_location(&self) -> Location {
        let position = self.anchor.guessed_position();
        Location::new(self.input.location().uri.clone(), Range::at(position))
    }
}

pub type HistoryEntry = Shared<BoxFuture<'static, Result<Arc<HistoryItem>>>>;

pub struct TreeInputHistory {
    documents: Arc<dyn DocumentService>,
    context: Arc<dyn ContextKeys>,
    capacity: Option<usize>,
    open_command: String,
    entries: Mutex<IndexMap<String, HistoryEntry>>,
    emitter: EventEmitter<TreeChange>,
}

impl TreeInputHistory {
    pub fn new(
        documents: Arc<dyn DocumentService>,
        context: Arc<dyn ContextKeys>,
        capacity: Option<usize>,
        open_command: impl Into<String>,
    ) -> Self {
        Self {
            documents,
            context,
            capacity,
            open_command: open_command.into(),
            entries: Mutex::new(IndexMap::new()),
            emitter: EventEmitter::new(),
        }
    }

    fn entries(&self) -> MutexGuard<'_, IndexMap<String, HistoryEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Remember `input` as the most recent search.
    ///
    /// The returned entry settles once the search document was opened and the
    /// anchor word captured; the list is updated immediately. An earlier entry
    /// with the same hash key is replaced.
    ///
    /// Must be called from within a tokio runtime.
    pub fn add(&self, input: Arc<dyn SymbolTreeInput>) -> HistoryEntry {
        let key = input.hash_key();
        let task = tokio::spawn(Self::resolve_item(
            self.documents.clone(),
            input,
            key.clone(),
        ));
        let entry: HistoryEntry = async move {
            task.await
                .map_err(|e| TreeError::Api(ApiError::Internal(e.to_string())))?
        }
        .boxed()
        .shared();

        let evicted = {
            let mut entries = self.entries();
            entries.shift_remove(&key);
            entries.insert(key.clone(), entry.clone());
            let mut evicted = Vec::new();
            if let Some(capacity) = self.capacity {
                while entries.len() > capacity {
                    if let Some((old, _)) = entries.shift_remove_index(0) {
                        evicted.push(old);
                    }
                }
            }
            evicted
        };
        if !evicted.is_empty() {
            tracing::debug!("history full, evicted {:?}", evicted);
        }
        tracing::debug!("history add {}", key);

        self.context.set_bool(context::HAS_HISTORY, true);
        entry
    }

    async fn resolve_item(
        documents: Arc<dyn DocumentService>,
        input: Arc<dyn SymbolTreeInput>,
        key: String,
    ) -> Result<Arc<HistoryItem>> {
        let location = input.location().clone();
        let doc = documents
            .open(&location.uri)
            .await
            .map_err(|source| TreeError::HistoryAnchor {
                uri: location.uri.to_string(),
                source,
            })?;
        let anchor = WordAnchor::new(doc, location.range.start);
        let word = anchor.word().unwrap_or(WORD_PLACEHOLDER).to_string();
        Ok(Arc::new(HistoryItem {
            key,
            word,
            anchor,
            input,
        }))
    }

    pub fn clear(&self) {
        self.entries().clear();
        self.context.set_bool(context::HAS_HISTORY, false);
        self.emitter.fire(&TreeChange::Root);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Settled items, most recent first. Entries whose anchor failed are skipped.
    pub async fn items(&self) -> Vec<Arc<HistoryItem>> {
        let pending: Vec<HistoryEntry> = self.entries().values().rev().cloned().collect();
        join_all(pending)
            .await
            .into_iter()
            .filter_map(|result| match result {
                Ok(item) => Some(item),
                Err(err) => {
                    tracing::warn!("skipping history entry: {}", err);
                    None
                }
            })
            .collect()
    }

    fn open_command(&self, item: &HistoryItem) -> CommandInvocation {
        let location = item.guessed_location();
        CommandInvocation {
            command: self.open_command.clone(),
            title: "Open Location".to_string(),
            arguments: vec![
                json!(location.uri.as_str()),
                json!({ "selection": location.range }),
            ],
        }
    }
}

#[async_trait]
impl TreeDataProvider for TreeInputHistory {
    async fn tree_item(&self, element: &TreeElement) -> ApiResult<TreeItem> {
        let item = element
            .downcast_ref::<HistoryItem>()
            .ok_or_else(|| ApiError::InvalidArgument("not a history item".to_string()))?;
        let input = &item.input;
        let mut row = TreeItem::new(item.word.clone(), CollapsibleState::None);
        row.description = Some(format!(
            "{} • {}",
            self.documents.relative_path(&input.location().uri),
            input.title().to_lowercase()
        ));
        row.resource_uri = Some(input.location().uri.clone());
        row.context_value = Some(HISTORY_ITEM_CONTEXT.to_string());
        row.command = Some(self.open_command(item));
        Ok(row)
    }

    async fn children(&self, parent: Option<&TreeElement>) -> ApiResult<Vec<TreeElement>> {
        if parent.is_some() {
            return Ok(Vec::new());
        }
        Ok(self
            .items()
            .await
            .into_iter()
            .map(TreeElement::from_arc)
            .collect())
    }

    async fn parent(&self, _element: &TreeElement) -> ApiResult<Option<TreeElement>> {
        Ok(None)
    }

    fn on_did_change(&self) -> Option<Event<TreeChange>> {
        Some(self.emitter.event())
    }
}
