use chrono::{DateTime, Utc};
use std::fmt;

use quiz_core::model::{ContentRef, Question, QuizConfig, QuizSessionId};
use quiz_core::{QuizPhase, QuizResult, QuizSession, Submitted, TickOutcome};
use storage::repository::AttemptId;

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// A quiz session bound to the content item it was started for.
///
/// Wraps the core state machine with the wall-clock bookkeeping needed for
/// history: when the attempt started, when the last record landed, and the
/// id it was stored under.
pub struct QuizSessionService {
    content: ContentRef,
    session: QuizSession,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    attempt_id: Option<AttemptId>,
}

impl QuizSessionService {
    /// Start a session for `content`.
    ///
    /// `started_at` should come from the services layer clock to keep time deterministic.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Unavailable` if `questions` is empty.
    pub fn new(
        content: ContentRef,
        questions: Vec<Question>,
        config: QuizConfig,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let session = QuizSession::new(questions, config).map_err(|err| match err {
            quiz_core::QuizError::Unavailable => SessionError::Unavailable { content },
            other => SessionError::Quiz(other),
        })?;

        Ok(Self {
            content,
            session,
            started_at,
            completed_at: None,
            attempt_id: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuizSessionId {
        self.session.id()
    }

    #[must_use]
    pub fn content(&self) -> ContentRef {
        self.content
    }

    #[must_use]
    pub fn quiz(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn attempt_id(&self) -> Option<AttemptId> {
        self.attempt_id
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.session.phase()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.session.is_finished()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.session.current_question()
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.session.total();
        let answered = self.session.records().len();
        SessionProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            is_complete: self.is_complete(),
            remaining_secs: self.session.remaining_secs(),
        }
    }

    /// Stage an option for the current question.
    ///
    /// # Errors
    ///
    /// Propagates `QuizError` for finished sessions or out-of-range options.
    pub fn select(&mut self, option: usize) -> Result<(), SessionError> {
        Ok(self.session.select(option)?)
    }

    /// Submit the staged selection (a skip when nothing is staged).
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Finished` (wrapped) once the session is over.
    pub fn submit(&mut self, at: DateTime<Utc>) -> Result<Submitted, SessionError> {
        let submitted = self.session.submit()?;
        self.stamp_completion(at);
        Ok(submitted)
    }

    /// Skip the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Finished` (wrapped) once the session is over.
    pub fn skip(&mut self, at: DateTime<Utc>) -> Result<Submitted, SessionError> {
        let submitted = self.session.skip()?;
        self.stamp_completion(at);
        Ok(submitted)
    }

    /// Feed one elapsed second into the question countdown.
    pub fn tick(&mut self, at: DateTime<Utc>) -> TickOutcome {
        let outcome = self.session.tick();
        self.stamp_completion(at);
        outcome
    }

    pub fn stop_timer(&mut self) {
        self.session.stop_timer();
    }

    /// Score the finished session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` while questions remain.
    pub fn result(&self) -> Result<QuizResult, SessionError> {
        match self.session.result() {
            Ok(result) => Ok(result),
            Err(quiz_core::QuizError::NotFinished) => Err(SessionError::NotFinished),
            Err(other) => Err(SessionError::Quiz(other)),
        }
    }

    pub(crate) fn set_attempt_id(&mut self, id: AttemptId) {
        self.attempt_id = Some(id);
    }

    fn stamp_completion(&mut self, at: DateTime<Utc>) {
        if self.completed_at.is_none() && self.session.is_finished() {
            // A clock that went backwards must not produce an invalid time range.
            self.completed_at = Some(at.max(self.started_at));
        }
    }
}

impl fmt::Debug for QuizSessionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSessionService")
            .field("id", &self.session.id())
            .field("content", &self.content)
            .field("total", &self.session.total())
            .field("current", &self.session.current_index())
            .field("records_len", &self.session.records().len())
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .field("attempt_id", &self.attempt_id)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::time::fixed_now;

    fn build_question(id: u64, correct: usize) -> Question {
        Question::new(id, "Q", vec!["A".into(), "B".into(), "C".into()], correct).unwrap()
    }

    #[test]
    fn empty_session_is_unavailable() {
        let err = QuizSessionService::new(
            ContentRef::conference(2),
            Vec::new(),
            QuizConfig::default(),
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::Unavailable { content } if content == ContentRef::conference(2)));
    }

    #[test]
    fn completion_is_stamped_once_at_the_last_record() {
        let start = fixed_now();
        let mut session = QuizSessionService::new(
            ContentRef::webinar(1),
            vec![build_question(1, 0), build_question(2, 1)],
            QuizConfig::new(30),
            start,
        )
        .unwrap();

        session.select(0).unwrap();
        session.submit(start + Duration::seconds(5)).unwrap();
        assert_eq!(session.completed_at(), None);
        assert_eq!(session.progress().answered, 1);

        session.skip(start + Duration::seconds(9)).unwrap();
        assert!(session.is_complete());
        assert_eq!(session.completed_at(), Some(start + Duration::seconds(9)));

        session.tick(start + Duration::seconds(60));
        assert_eq!(session.completed_at(), Some(start + Duration::seconds(9)));
        assert_eq!(session.result().unwrap().as_pair(), (1, 2));
    }

    #[test]
    fn result_before_finish_reports_not_finished() {
        let session = QuizSessionService::new(
            ContentRef::program(1),
            vec![build_question(1, 0)],
            QuizConfig::new(30),
            fixed_now(),
        )
        .unwrap();
        assert!(matches!(session.result(), Err(SessionError::NotFinished)));
        assert_eq!(
            session.progress(),
            SessionProgress {
                total: 1,
                answered: 0,
                remaining: 1,
                is_complete: false,
                remaining_secs: 30,
            }
        );
    }
}
