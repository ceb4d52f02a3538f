pub mod anchor;
pub mod config;
pub mod context;
pub mod delegate;
pub mod error;
pub mod highlights;
pub mod history;
pub mod logging;
pub mod navigation;
pub mod text;
pub mod tree;

pub use config::{FailurePolicy, TreeConfig};
pub use delegate::ProviderDelegate;
pub use error::{Result, TreeError};
pub use history::{HistoryItem, TreeInputHistory};
pub use tree::{SessionPhase, SymbolTree};
