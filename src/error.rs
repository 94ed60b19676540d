//! Layered error handling: storage failures wrap into `CoreError`, which
//! carries every error kind spec.md §7 enumerates and knows how to render
//! itself as an HTTP status for the `api_http` transport.

use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Required environment value absent; fatal at startup.
    #[error("configuration missing: {0}")]
    ConfigMissing(String),

    /// Graph or vector store unreachable.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Expected label/relationship absent; the ranker should adapt rather
    /// than treat this as fatal wherever spec.md allows degradation.
    #[error("schema missing: {0}")]
    SchemaMissing(String),

    /// Missing `Person` id.
    #[error("not found: {0}")]
    NotFound(String),

    /// Vector store or embedder failure during rank.
    #[error("embedding failed: {0}")]
    EmbedFailure(String),

    /// Empty query, bad `me_id`, unknown flag values.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Timeouts / bounded-retry exhaustion.
    #[error("transient error: {0}")]
    Transient(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl CoreError {
    /// HTTP status the `api_http` layer should respond with. The
    /// `/rank-connections/graph` handler special-cases `EmbedFailure` itself
    /// (degrade to `fallback:true`, 200) rather than using this mapping —
    /// see `api_http::routes::rank_connections_graph`.
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::ConfigMissing(_) => 500,
            CoreError::StoreUnavailable(_) => 503,
            CoreError::SchemaMissing(_) => 200,
            CoreError::NotFound(_) => 404,
            CoreError::EmbedFailure(_) => 500,
            CoreError::ValidationError(_) => 400,
            CoreError::Transient(_) => 503,
            CoreError::Storage(_) => 500,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
