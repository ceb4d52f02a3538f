use symtree_api::ApiError;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum TreeError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("History anchor for {uri} could not be resolved: {source}")]
    HistoryAnchor { uri: String, source: ApiError },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl From<TreeError> for ApiError {
    fn from(err: TreeError) -> Self {
        match err {
            TreeError::Api(inner) => inner,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, TreeError>;
