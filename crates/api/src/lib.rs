pub mod error;
pub mod event;
pub mod host;
pub mod input;
pub mod models;
pub mod provider;

// Re-export commonly used types
pub use error::{ApiError, ApiResult};
pub use event::{Disposable, DisposableStore, Event, EventEmitter, Subscription};
pub use host::{
    CommandHandler, CommandRegistry, ContextKeys, DocumentService, EditorHost, HostServices,
    TextDocument, TreeView, TreeViewHost,
};
pub use input::{
    MessageSource, SymbolItemEditorHighlights, SymbolItemNavigation, SymbolTreeInput,
    SymbolTreeModel,
};
pub use models::*;
pub use provider::TreeDataProvider;
