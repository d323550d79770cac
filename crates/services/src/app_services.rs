use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::driver::SessionDriver;
use crate::error::AppServicesError;
use crate::sessions::{AttemptHistoryService, QuizLoopService};

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    quiz_loop: Arc<QuizLoopService>,
    history: Arc<AttemptHistoryService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// `limit_override` forces a per-question limit for every quiz.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        limit_override: Option<i64>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, limit_override))
    }

    /// Services over empty in-memory repositories.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, None)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, limit_override: Option<i64>) -> Self {
        let quiz_loop = QuizLoopService::new(
            clock,
            Arc::clone(&storage.catalog),
            Arc::clone(&storage.attempts),
        )
        .with_limit_override(limit_override);
        let history = AttemptHistoryService::new(Arc::clone(&storage.attempts));

        Self {
            quiz_loop: Arc::new(quiz_loop),
            history: Arc::new(history),
        }
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    #[must_use]
    pub fn history(&self) -> Arc<AttemptHistoryService> {
        Arc::clone(&self.history)
    }

    /// A driver that persists finished attempts through this service set.
    #[must_use]
    pub fn driver(&self) -> SessionDriver {
        SessionDriver::new(self.quiz_loop.as_ref().clone())
    }
}
