use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// A statement, lease or decode failure. The driver error is passed through
    /// untouched so callers can still match on `sqlx::Error` variants.
    #[error(transparent)]
    QueryError(#[from] sqlx::Error),

    #[error("An error occurred during JSON serialization/deserialization: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("The connection pool has not been created yet; run the connect hook first.")]
    NotConnected,
}
