use chrono::{DateTime, Utc};

use quiz_core::model::{ContentRef, QuizConfig};
use storage::repository::{AttemptRepository, AttemptRow, QuestionCatalog, QuestionSet};

use super::service::QuizSessionService;
use crate::error::SessionError;

/// Storage-backed session queries and builders.
pub(crate) struct QuizQueries;

impl QuizQueries {
    /// Load the stored set for `content`; a missing set is reported as unavailable.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Unavailable` when nothing is stored and
    /// `SessionError::Storage` when repository access fails.
    pub async fn load_set(
        content: ContentRef,
        catalog: &dyn QuestionCatalog,
    ) -> Result<QuestionSet, SessionError> {
        catalog
            .question_set(content)
            .await?
            .ok_or(SessionError::Unavailable { content })
    }

    /// Create a session directly from storage-backed data.
    ///
    /// `limit_override` replaces whatever limit the catalog configured.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Unavailable` when the set is missing or empty.
    pub async fn start_from_storage(
        content: ContentRef,
        catalog: &dyn QuestionCatalog,
        now: DateTime<Utc>,
        limit_override: Option<i64>,
    ) -> Result<QuizSessionService, SessionError> {
        let set = Self::load_set(content, catalog).await?;
        let config = limit_override
            .map_or_else(|| QuizConfig::resolve(content.kind, &set.meta), QuizConfig::new);
        QuizSessionService::new(content, set.questions, config, now)
    }

    /// Load the most recent attempts for a content item.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn list_recent_attempt_rows(
        content: ContentRef,
        attempts: &dyn AttemptRepository,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, SessionError> {
        Ok(attempts.list_attempt_rows(content, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Question, QuizMeta};
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    async fn seeded_catalog(meta: QuizMeta) -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        let question = Question::new("q1", "Prompt", vec!["A".into(), "B".into()], 1).unwrap();
        repo.upsert_question_set(&QuestionSet::new(
            ContentRef::conference(1),
            meta,
            vec![question],
        ))
        .await
        .unwrap();
        repo
    }

    #[tokio::test]
    async fn missing_set_is_unavailable() {
        let repo = InMemoryRepository::new();
        let err = QuizQueries::start_from_storage(ContentRef::webinar(9), &repo, fixed_now(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn conference_without_limit_uses_conference_fallback() {
        let repo = seeded_catalog(QuizMeta::default()).await;
        let session =
            QuizQueries::start_from_storage(ContentRef::conference(1), &repo, fixed_now(), None)
                .await
                .unwrap();
        assert_eq!(session.quiz().config().per_question_secs(), 150);
    }

    #[tokio::test]
    async fn override_replaces_catalog_limit() {
        let repo = seeded_catalog(QuizMeta::with_per_question_secs(30)).await;
        let session =
            QuizQueries::start_from_storage(ContentRef::conference(1), &repo, fixed_now(), Some(5))
                .await
                .unwrap();
        assert_eq!(session.progress().remaining_secs, 5);
    }
}
