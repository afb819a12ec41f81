use thiserror::Error;

/// Errors from the routing stores and builder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RoutingError {
    /// No result with the given id exists.
    #[error("result not found: {0}")]
    ResultNotFound(String),

    /// A result for this source message already exists. The source message
    /// id doubles as an idempotency key so a retried delivery that slipped
    /// past the replay cache cannot create a second result.
    #[error("result already exists for source message {0}")]
    DuplicateSourceMessage(String),

    /// Backing store unavailable. Safe for the upstream gateway to retry;
    /// replay-key dedup makes redelivery idempotent.
    #[error("repository unavailable: {0}")]
    RepositoryUnavailable(String),
}
