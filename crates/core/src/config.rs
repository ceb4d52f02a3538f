use crate::error::{Result, TreeError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// What the view shows after an input failed to resolve.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Leave title and message as they were when resolution started.
    #[default]
    KeepStale,
    /// Drop the input and show the history.
    ClearInput,
    /// Keep the input and put the error text into the view message.
    ShowError,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TreeConfig {
    pub view_id: String,
    /// Title shown while no search is active.
    pub default_title: String,
    /// Message shown while there is neither a search nor any history.
    pub empty_message: String,
    /// Maximum number of remembered searches; unbounded when unset.
    pub history_capacity: Option<usize>,
    pub failure_policy: FailurePolicy,
    /// Host command used to open a location in an editor.
    pub open_command: String,
    /// `tracing` filter directives used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            view_id: "references-view.tree".to_string(),
            default_title: "References".to_string(),
            empty_message: "No results.".to_string(),
            history_capacity: None,
            failure_policy: FailurePolicy::KeepStale,
            open_command: "vscode.open".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl TreeConfig {
    /// Parse host settings. Missing fields take their defaults.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: TreeConfig =
            serde_json::from_str(raw).map_err(|e| TreeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.view_id.trim().is_empty() {
            return Err(TreeError::Config("view_id must not be empty".to_string()));
        }
        if self.history_capacity == Some(0) {
            return Err(TreeError::Config(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        EnvFilter::try_new(&self.log_filter)
            .map_err(|e| TreeError::Config(format!("log_filter: {}", e)))?;
        Ok(())
    }

    /// JSON schema for host settings editors.
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(TreeConfig)).unwrap_or_default()
    }
}
