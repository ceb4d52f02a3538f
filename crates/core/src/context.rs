use dashmap::DashMap;
use symtree_api::ContextKeys;

pub const IS_ACTIVE: &str = "reference-list.isActive";
pub const HAS_RESULT: &str = "reference-list.hasResult";
pub const HAS_HISTORY: &str = "reference-list.hasHistory";
pub const INPUT_SOURCE: &str = "reference-list.source";
pub const CAN_NAVIGATE: &str = "references-view.canNavigate";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextValue {
    Bool(bool),
    String(String),
}

/// In-process context key store for hosts without one of their own.
#[derive(Debug, Default)]
pub struct MemoryContextKeys {
    values: DashMap<String, ContextValue>,
}

impl MemoryContextKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<ContextValue> {
        self.values.get(key).map(|v| v.value().clone())
    }

    /// Unset keys read as `false`.
    pub fn get_bool(&self, key: &str) -> bool {
        matches!(self.get(key), Some(ContextValue::Bool(true)))
    }
}

impl ContextKeys for MemoryContextKeys {
    fn set_bool(&self, key: &str, value: bool) {
        tracing::trace!("context {} = {}", key, value);
        self.values.insert(key.to_string(), ContextValue::Bool(value));
    }

    fn set_string(&self, key: &str, value: &str) {
        tracing::trace!("context {} = {:?}", key, value);
        self.values
            .insert(key.to_string(), ContextValue::String(value.to_string()));
    }

    fn reset(&self, key: &str) {
        self.values.remove(key);
    }
}
