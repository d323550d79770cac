//! Runs one quiz session on its own tokio task.
//!
//! The task is the single owner of the session: one-second ticks and user
//! commands are multiplexed in a `select!` loop, so a timeout and a manual
//! submit for the same question can never both be recorded. Commands carry
//! the question index they were issued for; anything aimed at a question
//! that already has a record is rejected without touching state.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use quiz_core::model::{QuizSessionId, Selection};
use quiz_core::{Advance, QuizError, QuizResult, Submitted, TickOutcome};
use storage::repository::AttemptId;

use crate::error::SessionError;
use crate::sessions::{QuizLoopService, QuizSessionService};

const TICK_PERIOD: Duration = Duration::from_secs(1);
const CHANNEL_CAPACITY: usize = 32;

/// Called once with the final result, after the attempt store was attempted.
pub type FinishHook = Box<dyn FnOnce(&QuizResult) + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Select { question: usize, option: usize },
    Submit { question: usize },
    Skip { question: usize },
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The command targeted a question other than the active one.
    Stale { current: usize },
    InvalidOption { index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    QuestionStarted {
        index: usize,
        total: usize,
        limit_secs: i64,
    },
    Tick {
        index: usize,
        remaining: i64,
    },
    Selected {
        index: usize,
        option: usize,
    },
    Recorded {
        index: usize,
        selection: Selection,
        correct: bool,
        timed_out: bool,
    },
    Rejected {
        command: SessionCommand,
        reason: Rejection,
    },
    Finished {
        result: QuizResult,
        attempt_id: Option<AttemptId>,
    },
    Cancelled {
        answered: usize,
    },
}

/// How the driver task ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverOutcome {
    Finished {
        result: QuizResult,
        attempt_id: Option<AttemptId>,
    },
    Cancelled {
        answered: usize,
    },
}

/// Builder for a session task.
pub struct SessionDriver {
    quiz_loop: QuizLoopService,
    on_finish: Option<FinishHook>,
}

impl SessionDriver {
    #[must_use]
    pub fn new(quiz_loop: QuizLoopService) -> Self {
        Self {
            quiz_loop,
            on_finish: None,
        }
    }

    #[must_use]
    pub fn on_finish(mut self, hook: impl FnOnce(&QuizResult) + Send + 'static) -> Self {
        self.on_finish = Some(Box::new(hook));
        self
    }

    /// Spawn the task that owns `session` and start the first countdown.
    ///
    /// Must be called from within a tokio runtime. Dropping the returned
    /// handle, or the event receiver, cancels the session.
    #[must_use]
    pub fn spawn(self, session: QuizSessionService) -> (SessionHandle, mpsc::Receiver<SessionEvent>) {
        let (command_tx, command_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let session_id = session.id();

        let task = DriverTask {
            session,
            quiz_loop: self.quiz_loop,
            on_finish: self.on_finish,
            commands: command_rx,
            events: event_tx,
        };
        let join = tokio::spawn(task.run());

        (
            SessionHandle {
                session_id,
                commands: command_tx,
                join,
            },
            event_rx,
        )
    }
}

/// Caller side of a running session.
#[derive(Debug)]
pub struct SessionHandle {
    session_id: QuizSessionId,
    commands: mpsc::Sender<SessionCommand>,
    join: JoinHandle<DriverOutcome>,
}

impl SessionHandle {
    #[must_use]
    pub fn session_id(&self) -> QuizSessionId {
        self.session_id
    }

    /// # Errors
    ///
    /// Returns `SessionError::DriverClosed` once the session task has ended.
    pub async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::DriverClosed)
    }

    /// # Errors
    ///
    /// Returns `SessionError::DriverClosed` once the session task has ended.
    pub async fn select(&self, question: usize, option: usize) -> Result<(), SessionError> {
        self.send(SessionCommand::Select { question, option }).await
    }

    /// # Errors
    ///
    /// Returns `SessionError::DriverClosed` once the session task has ended.
    pub async fn submit(&self, question: usize) -> Result<(), SessionError> {
        self.send(SessionCommand::Submit { question }).await
    }

    /// # Errors
    ///
    /// Returns `SessionError::DriverClosed` once the session task has ended.
    pub async fn skip(&self, question: usize) -> Result<(), SessionError> {
        self.send(SessionCommand::Skip { question }).await
    }

    /// Stop the timer and discard the session. Nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::DriverClosed` once the session task has ended.
    pub async fn cancel(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Cancel).await
    }

    /// Wait for the session task to end.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::DriverClosed` if the task panicked or was aborted.
    pub async fn join(self) -> Result<DriverOutcome, SessionError> {
        drop(self.commands);
        self.join.await.map_err(|_| SessionError::DriverClosed)
    }
}

//
// ─── TASK ──────────────────────────────────────────────────────────────────────
//

struct DriverTask {
    session: QuizSessionService,
    quiz_loop: QuizLoopService,
    on_finish: Option<FinishHook>,
    commands: mpsc::Receiver<SessionCommand>,
    events: mpsc::Sender<SessionEvent>,
}

enum Step {
    Continue,
    Cancel,
}

impl DriverTask {
    async fn run(mut self) -> DriverOutcome {
        let mut ticker = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut step = self.question_started().await;

        while matches!(step, Step::Continue) && !self.session.is_complete() {
            step = tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    None | Some(SessionCommand::Cancel) => Step::Cancel,
                    Some(command) => match self.apply(command) {
                        Ok(Some(submitted)) => {
                            ticker.reset();
                            self.recorded(submitted, false).await
                        }
                        Ok(None) => {
                            if let SessionCommand::Select { question, option } = command {
                                self.emit(SessionEvent::Selected { index: question, option }).await
                            } else {
                                Step::Continue
                            }
                        }
                        Err(reason) => self.emit(SessionEvent::Rejected { command, reason }).await,
                    },
                },

                _ = ticker.tick() => {
                    let index = self.session.quiz().current_index();
                    match self.session.tick(self.quiz_loop.clock().now()) {
                        TickOutcome::Ignored => Step::Continue,
                        TickOutcome::Counting { remaining } => {
                            self.emit(SessionEvent::Tick { index, remaining }).await
                        }
                        TickOutcome::Expired(submitted) => {
                            ticker.reset();
                            self.recorded(submitted, true).await
                        }
                    }
                }
            };
        }

        if self.session.is_complete() && matches!(step, Step::Continue) {
            return self.finish().await;
        }
        self.cancel().await
    }

    fn apply(&mut self, command: SessionCommand) -> Result<Option<Submitted>, Rejection> {
        let current = self.session.quiz().current_index();
        let question = match command {
            SessionCommand::Select { question, .. }
            | SessionCommand::Submit { question }
            | SessionCommand::Skip { question } => question,
            SessionCommand::Cancel => return Ok(None),
        };
        if question != current {
            tracing::debug!(
                session = %self.session.id(),
                question,
                current,
                "stale command dropped"
            );
            return Err(Rejection::Stale { current });
        }

        let now = self.quiz_loop.clock().now();
        let outcome = match command {
            SessionCommand::Select { option, .. } => self.session.select(option).map(|()| None),
            SessionCommand::Submit { .. } => self.session.submit(now).map(Some),
            SessionCommand::Skip { .. } => self.session.skip(now).map(Some),
            SessionCommand::Cancel => Ok(None),
        };
        outcome.map_err(|err| match err {
            SessionError::Quiz(QuizError::InvalidOption { index, len }) => {
                Rejection::InvalidOption { index, len }
            }
            _ => Rejection::Stale { current },
        })
    }

    async fn question_started(&mut self) -> Step {
        let quiz = self.session.quiz();
        let event = SessionEvent::QuestionStarted {
            index: quiz.current_index(),
            total: quiz.total(),
            limit_secs: quiz.config().per_question_secs(),
        };
        self.emit(event).await
    }

    async fn recorded(&mut self, submitted: Submitted, timed_out: bool) -> Step {
        tracing::debug!(
            session = %self.session.id(),
            question = submitted.question_index,
            skipped = submitted.record.selection().is_skipped(),
            timed_out,
            "answer recorded"
        );
        let event = SessionEvent::Recorded {
            index: submitted.question_index,
            selection: submitted.record.selection(),
            correct: submitted.record.is_correct(),
            timed_out,
        };
        if matches!(self.emit(event).await, Step::Cancel) {
            return Step::Cancel;
        }
        match submitted.advance {
            Advance::Next { .. } => self.question_started().await,
            Advance::Finished => Step::Continue,
        }
    }

    async fn finish(mut self) -> DriverOutcome {
        let (result, attempt_id) = match self.quiz_loop.finalize_attempt(&mut self.session).await {
            Ok((id, result)) => (result, Some(id)),
            Err(err) => {
                tracing::warn!(session = %self.session.id(), error = %err, "attempt not stored");
                match self.session.result() {
                    Ok(result) => (result, None),
                    Err(_) => return self.cancel().await,
                }
            }
        };

        if let Some(hook) = self.on_finish.take() {
            hook(&result);
        }

        tracing::info!(
            session = %self.session.id(),
            score = result.score(),
            total = result.total(),
            "quiz session finished"
        );
        // The caller may already be gone; the outcome is still returned.
        let _ = self
            .events
            .send(SessionEvent::Finished {
                result: result.clone(),
                attempt_id,
            })
            .await;
        DriverOutcome::Finished { result, attempt_id }
    }

    async fn cancel(mut self) -> DriverOutcome {
        self.session.stop_timer();
        let answered = self.session.progress().answered;
        tracing::info!(session = %self.session.id(), answered, "quiz session cancelled");
        let _ = self.events.send(SessionEvent::Cancelled { answered }).await;
        DriverOutcome::Cancelled { answered }
    }

    async fn emit(&mut self, event: SessionEvent) -> Step {
        if self.events.send(event).await.is_ok() {
            Step::Continue
        } else {
            Step::Cancel
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use quiz_core::model::{ContentRef, Question, QuizConfig};
    use quiz_core::time::fixed_clock;
    use storage::repository::{AttemptRepository, AttemptRow, InMemoryRepository, StorageError};

    fn question(id: u64, correct: usize) -> Question {
        Question::new(
            id,
            format!("Q{id}"),
            vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct,
        )
        .unwrap()
    }

    fn driver(repo: &Arc<InMemoryRepository>) -> SessionDriver {
        SessionDriver::new(QuizLoopService::new(
            fixed_clock(),
            repo.clone(),
            repo.clone(),
        ))
    }

    fn session(questions: Vec<Question>, limit: i64) -> QuizSessionService {
        QuizSessionService::new(
            ContentRef::conference(1),
            questions,
            QuizConfig::new(limit),
            quiz_core::time::fixed_now(),
        )
        .unwrap()
    }

    async fn drain(events: &mut mpsc::Receiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut seen = Vec::new();
        while let Some(event) = events.recv().await {
            seen.push(event);
        }
        seen
    }

    #[tokio::test(start_paused = true)]
    async fn untouched_quiz_times_out_into_skips() {
        let repo = Arc::new(InMemoryRepository::new());
        let (handle, mut events) =
            driver(&repo).spawn(session(vec![question(1, 0), question(2, 1)], 3));

        let seen = drain(&mut events).await;
        let outcome = handle.join().await.unwrap();

        let ticks = seen
            .iter()
            .filter(|e| matches!(e, SessionEvent::Tick { index: 0, .. }))
            .count();
        assert_eq!(ticks, 2);
        let timed_out = seen
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    SessionEvent::Recorded {
                        selection: Selection::Skipped,
                        timed_out: true,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(timed_out, 2);

        let DriverOutcome::Finished { result, attempt_id } = outcome else {
            panic!("expected a finished outcome");
        };
        assert_eq!(result.as_pair(), (0, 2));
        let stored = repo.get_attempt(attempt_id.unwrap()).await.unwrap();
        assert_eq!(stored.score(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn staged_selection_is_submitted_on_timeout() {
        let repo = Arc::new(InMemoryRepository::new());
        let finished = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&finished);
        let (handle, mut events) = driver(&repo)
            .on_finish(move |result| *sink.lock().unwrap() = Some(result.as_pair()))
            .spawn(session(vec![question(1, 2)], 30));

        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::QuestionStarted { index: 0, total: 1, limit_secs: 30 })
        ));
        handle.select(0, 2).await.unwrap();

        let seen = drain(&mut events).await;
        assert!(seen.contains(&SessionEvent::Selected { index: 0, option: 2 }));
        assert!(seen.contains(&SessionEvent::Recorded {
            index: 0,
            selection: Selection::Selected(2),
            correct: true,
            timed_out: true,
        }));
        assert!(handle.join().await.is_ok());
        assert_eq!(*finished.lock().unwrap(), Some((1, 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_and_invalid_commands_are_rejected() {
        let repo = Arc::new(InMemoryRepository::new());
        let (handle, mut events) =
            driver(&repo).spawn(session(vec![question(1, 0), question(2, 0)], 30));
        events.recv().await;

        handle.select(0, 0).await.unwrap();
        handle.submit(0).await.unwrap();
        // Arrives after question 0 already has a record.
        handle.submit(0).await.unwrap();
        handle.select(1, 9).await.unwrap();
        handle.skip(1).await.unwrap();

        let seen = drain(&mut events).await;
        assert!(seen.contains(&SessionEvent::Rejected {
            command: SessionCommand::Submit { question: 0 },
            reason: Rejection::Stale { current: 1 },
        }));
        assert!(seen.contains(&SessionEvent::Rejected {
            command: SessionCommand::Select { question: 1, option: 9 },
            reason: Rejection::InvalidOption { index: 9, len: 4 },
        }));

        let DriverOutcome::Finished { result, .. } = handle.join().await.unwrap() else {
            panic!("expected a finished outcome");
        };
        assert_eq!(result.records().len(), 2);
        assert_eq!(result.as_pair(), (1, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_the_session() {
        let repo = Arc::new(InMemoryRepository::new());
        let (handle, mut events) =
            driver(&repo).spawn(session(vec![question(1, 0), question(2, 0)], 30));
        events.recv().await;
        handle.skip(0).await.unwrap();
        handle.cancel().await.unwrap();

        let seen = drain(&mut events).await;
        assert_eq!(seen.last(), Some(&SessionEvent::Cancelled { answered: 1 }));
        assert_eq!(
            handle.join().await.unwrap(),
            DriverOutcome::Cancelled { answered: 1 }
        );
        let stored = repo
            .list_attempt_rows(ContentRef::conference(1), 10)
            .await
            .unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels() {
        let repo = Arc::new(InMemoryRepository::new());
        let (handle, mut events) = driver(&repo).spawn(session(vec![question(1, 0)], 30));
        events.recv().await;
        drop(handle);

        let seen = drain(&mut events).await;
        assert_eq!(seen, vec![SessionEvent::Cancelled { answered: 0 }]);
    }

    /// Attempt store that is always down.
    struct UnreachableAttempts;

    #[async_trait::async_trait]
    impl AttemptRepository for UnreachableAttempts {
        async fn append_attempt(
            &self,
            _summary: &quiz_core::model::AttemptSummary,
        ) -> Result<AttemptId, StorageError> {
            Err(StorageError::Connection("database is locked".into()))
        }

        async fn get_attempt(
            &self,
            _id: AttemptId,
        ) -> Result<quiz_core::model::AttemptSummary, StorageError> {
            Err(StorageError::NotFound)
        }

        async fn list_attempt_rows(
            &self,
            _content: ContentRef,
            _limit: u32,
        ) -> Result<Vec<AttemptRow>, StorageError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn storage_failure_still_finishes_without_attempt_id() {
        let catalog = Arc::new(InMemoryRepository::new());
        let quiz_loop = QuizLoopService::new(fixed_clock(), catalog, Arc::new(UnreachableAttempts));
        let finished = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&finished);
        let (handle, mut events) = SessionDriver::new(quiz_loop)
            .on_finish(move |result| *sink.lock().unwrap() = Some(result.as_pair()))
            .spawn(session(vec![question(1, 1)], 30));
        events.recv().await;
        handle.select(0, 1).await.unwrap();
        handle.submit(0).await.unwrap();

        let seen = drain(&mut events).await;
        let expected = DriverOutcome::Finished {
            result: seen
                .iter()
                .find_map(|e| match e {
                    SessionEvent::Finished { result, attempt_id: None } => Some(result.clone()),
                    _ => None,
                })
                .unwrap(),
            attempt_id: None,
        };
        assert_eq!(handle.join().await.unwrap(), expected);
        assert_eq!(*finished.lock().unwrap(), Some((1, 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn finish_hook_need_not_be_sync() {
        let repo = Arc::new(InMemoryRepository::new());
        let finished = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&finished);
        // `Cell` is `Send` but not `Sync`.
        let last_score = std::cell::Cell::new(0);
        let (handle, mut events) = driver(&repo)
            .on_finish(move |result| {
                last_score.set(result.score());
                *sink.lock().unwrap() = Some(last_score.get());
            })
            .spawn(session(vec![question(1, 0)], 30));
        events.recv().await;
        handle.skip(0).await.unwrap();

        drain(&mut events).await;
        assert!(matches!(
            handle.join().await.unwrap(),
            DriverOutcome::Finished { attempt_id: Some(_), .. }
        ));
        assert_eq!(*finished.lock().unwrap(), Some(0));
    }
}
