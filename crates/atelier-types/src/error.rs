use thiserror::Error;

/// Errors from repository operations (used by the port traits in
/// atelier-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("entity not found")]
    NotFound,

    #[error("stale write: {0}")]
    StaleWrite(String),

    #[error("storage error: {0}")]
    Storage(String),
}
