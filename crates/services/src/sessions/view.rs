use chrono::{DateTime, Utc};
use std::sync::Arc;

use quiz_core::model::{AttemptSummary, ContentRef};
use storage::repository::{AttemptId, AttemptRepository};

use super::queries::QuizQueries;
use crate::error::SessionError;

/// Presentation-agnostic list item for a finished attempt.
///
/// No pre-formatted strings; the caller formats timestamps as it likes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptListItem {
    pub id: AttemptId,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub score: u32,
    pub total: u32,
    pub skipped: usize,
}

impl AttemptListItem {
    #[must_use]
    pub fn from_summary(id: AttemptId, summary: &AttemptSummary) -> Self {
        Self {
            id,
            started_at: summary.started_at(),
            completed_at: summary.completed_at(),
            score: summary.score(),
            total: summary.total(),
            skipped: summary
                .answers()
                .iter()
                .filter(|a| a.selection().is_skipped())
                .count(),
        }
    }
}

/// Read-only access to past attempts, hiding repositories from the caller.
#[derive(Clone)]
pub struct AttemptHistoryService {
    attempts: Arc<dyn AttemptRepository>,
}

impl AttemptHistoryService {
    #[must_use]
    pub fn new(attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { attempts }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(storage::repository::InMemoryRepository::new()))
    }

    /// Load recent attempts for a content item, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn list_recent_attempts(
        &self,
        content: ContentRef,
        limit: u32,
    ) -> Result<Vec<AttemptListItem>, SessionError> {
        let rows =
            QuizQueries::list_recent_attempt_rows(content, self.attempts.as_ref(), limit).await?;
        Ok(rows
            .iter()
            .map(|row| AttemptListItem::from_summary(row.id, &row.summary))
            .collect())
    }

    /// Load one attempt with its per-question breakdown.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` (including not-found) on repository failures.
    pub async fn get_attempt(&self, id: AttemptId) -> Result<AttemptSummary, SessionError> {
        Ok(self.attempts.get_attempt(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_history_lists_nothing() {
        let history = AttemptHistoryService::in_memory();
        let items = history
            .list_recent_attempts(ContentRef::conference(1), 5)
            .await
            .unwrap();
        assert!(items.is_empty());
        assert!(matches!(
            history.get_attempt(1).await,
            Err(SessionError::Storage(_))
        ));
    }
}
