//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::QuizError;
use quiz_core::model::{AttemptSummaryError, ContentRef};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz not available for {content}")]
    Unavailable { content: ContentRef },
    #[error("session is not finished")]
    NotFinished,
    #[error("session driver has stopped")]
    DriverClosed,
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Summary(#[from] AttemptSummaryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
