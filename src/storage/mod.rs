//! Persistence Gateway.
//!
//! A [`VisitorGateway`] hands out one [`VisitorSession`] per request. A session wraps a single
//! database transaction on a pooled connection:
//! - writes become visible only after [`VisitorSession::commit`];
//! - [`VisitorSession::rollback`] discards pending writes;
//! - dropping a session without committing rolls back and releases the connection, so every
//!   exit path (including a panic unwinding through a handler) releases it.

use crate::domain::model::Visitor;
use async_trait::async_trait;

pub mod memory;
pub mod postgres;

pub use memory::{Fault, MemoryVisitorGateway};
pub use postgres::PgVisitorGateway;

/// Failures surfaced by the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The store could not complete a read or write (connectivity, constraint, query failure).
    #[error("storage error: {0}")]
    Storage(#[source] sqlx::Error),
    /// Anything not attributable to the store itself.
    #[error("unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        // Row mapping failures mean the code and the schema disagree.
        match err {
            sqlx::Error::TypeNotFound { .. }
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_) => GatewayError::Unexpected(anyhow::Error::new(err)),
            other => GatewayError::Storage(other),
        }
    }
}

impl GatewayError {
    pub fn is_storage(&self) -> bool {
        matches!(self, GatewayError::Storage(_))
    }
}

/// Produces request-scoped sessions.
#[async_trait]
pub trait VisitorGateway: Send + Sync {
    /// Opens a session with an open transaction. Nothing is flushed or committed implicitly.
    async fn open_session(&self) -> Result<Box<dyn VisitorSession>, GatewayError>;
}

/// A request-scoped handle through which queries and writes occur.
#[async_trait]
pub trait VisitorSession: Send {
    /// All visitors ordered by ascending id. Empty when none exist.
    async fn list_all(&mut self) -> Result<Vec<Visitor>, GatewayError>;

    /// Inserts a visitor and returns it with its assigned id. Pending until `commit`.
    async fn insert(&mut self, name: &str) -> Result<Visitor, GatewayError>;

    /// Commits pending writes. No-op once the session is finished.
    async fn commit(&mut self) -> Result<(), GatewayError>;

    /// Discards pending writes. No-op once the session is finished.
    async fn rollback(&mut self) -> Result<(), GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_failures_are_storage_errors() {
        let err: GatewayError = sqlx::Error::PoolTimedOut.into();
        assert!(err.is_storage());

        let err: GatewayError = sqlx::Error::RowNotFound.into();
        assert!(err.is_storage());
    }

    #[test]
    fn row_mapping_failures_are_unexpected() {
        let err: GatewayError = sqlx::Error::ColumnNotFound("name".to_string()).into();
        assert!(!err.is_storage());
        assert!(err.to_string().starts_with("unexpected error:"));
    }
}
