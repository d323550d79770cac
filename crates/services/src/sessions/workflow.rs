use std::sync::Arc;

use quiz_core::QuizResult;
use quiz_core::model::{AttemptSummary, ContentRef};
use storage::repository::{AttemptId, AttemptRepository, QuestionCatalog};

use super::queries::QuizQueries;
use super::service::QuizSessionService;
use crate::Clock;
use crate::error::SessionError;
use crate::quiz_view::QuizOverview;

/// Orchestrates session start and attempt persistence.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    catalog: Arc<dyn QuestionCatalog>,
    attempts: Arc<dyn AttemptRepository>,
    limit_override: Option<i64>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<dyn QuestionCatalog>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            clock,
            catalog,
            attempts,
            limit_override: None,
        }
    }

    /// Force a per-question limit regardless of what the catalog says.
    #[must_use]
    pub fn with_limit_override(mut self, secs: Option<i64>) -> Self {
        self.limit_override = secs;
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Start a new session for the given content item.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Unavailable` when no questions exist for
    /// `content`, or `SessionError::Storage` on repository failures.
    pub async fn start_session(
        &self,
        content: ContentRef,
    ) -> Result<QuizSessionService, SessionError> {
        let now = self.clock.now();
        match QuizQueries::start_from_storage(
            content,
            self.catalog.as_ref(),
            now,
            self.limit_override,
        )
        .await
        {
            Ok(session) => {
                tracing::info!(
                    session = %session.id(),
                    %content,
                    questions = session.quiz().total(),
                    per_question_secs = session.quiz().config().per_question_secs(),
                    "quiz session started"
                );
                Ok(session)
            }
            Err(SessionError::Unavailable { content }) => {
                tracing::warn!(%content, "quiz not available");
                Err(SessionError::Unavailable { content })
            }
            Err(err) => Err(err),
        }
    }

    /// Describe the quiz for `content` before it is started.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Unavailable` when no questions exist for `content`.
    pub async fn overview(&self, content: ContentRef) -> Result<QuizOverview, SessionError> {
        let set = QuizQueries::load_set(content, self.catalog.as_ref()).await?;
        if set.questions.is_empty() {
            return Err(SessionError::Unavailable { content });
        }
        let mut overview = QuizOverview::from_set(&set);
        if let Some(secs) = self.limit_override {
            overview.per_question_secs = secs;
        }
        Ok(overview)
    }

    /// Persist the attempt of a finished session and return its id.
    ///
    /// Idempotent: a session that already has an attempt id is not stored
    /// again. Useful as a retry after a transient storage error.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` if the session is still running,
    /// or `SessionError::Storage` if persistence fails.
    pub async fn finalize_attempt(
        &self,
        session: &mut QuizSessionService,
    ) -> Result<(AttemptId, QuizResult), SessionError> {
        let result = session.result()?;
        if let Some(id) = session.attempt_id() {
            return Ok((id, result));
        }

        let completed_at = session.completed_at().ok_or(SessionError::NotFinished)?;
        let summary = AttemptSummary::from_result(
            session.content(),
            session.started_at(),
            completed_at,
            &result,
        )?;
        let id = self.attempts.append_attempt(&summary).await?;
        session.set_attempt_id(id);

        tracing::info!(
            session = %session.id(),
            attempt_id = id,
            score = result.score(),
            total = result.total(),
            "quiz attempt stored"
        );
        Ok((id, result))
    }
}
