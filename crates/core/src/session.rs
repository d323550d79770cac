use thiserror::Error;

use crate::model::{AnswerRecord, Question, QuizConfig, QuizSessionId, Selection};
use crate::scoring::{QuizResult, ScoringError};
use crate::timer::{Countdown, Tick, remaining_ratio};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz not available: no questions")]
    Unavailable,

    #[error("quiz already finished")]
    Finished,

    #[error("quiz still in progress")]
    NotFinished,

    #[error("option {index} out of range for {len} options")]
    InvalidOption { index: usize, len: usize },

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

//
// ─── PHASES & OUTCOMES ─────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Active { index: usize },
    Finished,
}

/// Where the session went after a record was appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next { index: usize },
    Finished,
}

/// A record that was just appended, plus the resulting transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub question_index: usize,
    pub record: AnswerRecord,
    pub advance: Advance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Finished or stopped session; the tick had no effect.
    Ignored,
    Counting { remaining: i64 },
    /// Time ran out and the staged selection (or a skip) was recorded.
    Expired(Submitted),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// State machine for one timed multiple-choice quiz.
///
/// Progression is strictly forward: every question gets exactly one
/// `AnswerRecord`, appended in order, from whichever of submit, skip or
/// timer expiry happens first. Once the last record is appended the session
/// is finished and ignores further input.
#[derive(Debug, Clone)]
pub struct QuizSession {
    id: QuizSessionId,
    questions: Vec<Question>,
    config: QuizConfig,
    current: usize,
    staged: Option<usize>,
    countdown: Countdown,
    records: Vec<AnswerRecord>,
}

impl QuizSession {
    /// Start a session at the first question with a fresh countdown.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Unavailable` for an empty question list; no
    /// countdown is started in that case.
    pub fn new(questions: Vec<Question>, config: QuizConfig) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::Unavailable);
        }

        let mut countdown = Countdown::stopped();
        countdown.start(config.per_question_secs());

        Ok(Self {
            id: QuizSessionId::generate(),
            records: Vec::with_capacity(questions.len()),
            questions,
            config,
            current: 0,
            staged: None,
            countdown,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuizSessionId {
        self.id
    }

    #[must_use]
    pub fn config(&self) -> QuizConfig {
        self.config
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        if self.is_finished() {
            QuizPhase::Finished
        } else {
            QuizPhase::Active {
                index: self.current,
            }
        }
    }

    /// Index of the question on screen; equals `total()` once finished.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.records.len() == self.questions.len()
    }

    #[must_use]
    pub fn records(&self) -> &[AnswerRecord] {
        &self.records
    }

    #[must_use]
    pub fn staged_selection(&self) -> Option<usize> {
        self.staged
    }

    #[must_use]
    pub fn remaining_secs(&self) -> i64 {
        self.countdown.remaining()
    }

    #[must_use]
    pub fn is_timer_running(&self) -> bool {
        self.countdown.is_running()
    }

    /// Remaining-time fraction for progress indicators; 0 for a bad limit.
    #[must_use]
    pub fn time_ratio(&self) -> f64 {
        remaining_ratio(self.countdown.remaining(), self.config.per_question_secs())
    }

    /// Stage an option for the current question. Overwrites any earlier pick.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Finished` after the last question, or
    /// `QuizError::InvalidOption` if `index` is not an option of the current
    /// question. Nothing changes on error.
    pub fn select(&mut self, index: usize) -> Result<(), QuizError> {
        let question = self.current_question().ok_or(QuizError::Finished)?;
        check_option(question, index)?;
        self.staged = Some(index);
        Ok(())
    }

    /// Submit whatever is staged; nothing staged records a skip.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Finished` if the session is over.
    pub fn submit(&mut self) -> Result<Submitted, QuizError> {
        let selection = Selection::from(self.staged);
        self.submit_answer(selection)
    }

    /// Record `selection` for the current question and advance.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Finished` if the session is over and
    /// `QuizError::InvalidOption` for an out-of-range index. Nothing changes
    /// on error.
    pub fn submit_answer(&mut self, selection: Selection) -> Result<Submitted, QuizError> {
        let question = self.current_question().ok_or(QuizError::Finished)?;
        if let Selection::Selected(index) = selection {
            check_option(question, index)?;
        }
        Ok(self.record(selection))
    }

    /// Same as `submit_answer(Selection::Skipped)`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Finished` if the session is over.
    pub fn skip(&mut self) -> Result<Submitted, QuizError> {
        self.submit_answer(Selection::Skipped)
    }

    /// Feed one elapsed second. Expiry auto-submits the staged selection.
    pub fn tick(&mut self) -> TickOutcome {
        if self.is_finished() {
            return TickOutcome::Ignored;
        }
        match self.countdown.tick() {
            Tick::Idle => TickOutcome::Ignored,
            Tick::Running { remaining } => TickOutcome::Counting { remaining },
            Tick::Expired => TickOutcome::Expired(self.record(Selection::from(self.staged))),
        }
    }

    /// Deliver an expiry signal raised for `question_index`.
    ///
    /// Signals for a question that already has a record (or for a finished
    /// session) are dropped and return `None`.
    pub fn expire(&mut self, question_index: usize) -> Option<Submitted> {
        if self.is_finished() || question_index != self.current {
            return None;
        }
        Some(self.record(Selection::from(self.staged)))
    }

    /// Halt the countdown without recording anything, e.g. before teardown.
    pub fn stop_timer(&mut self) {
        self.countdown.stop();
    }

    /// Score the finished session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotFinished` while questions remain.
    pub fn result(&self) -> Result<QuizResult, QuizError> {
        if !self.is_finished() {
            return Err(QuizError::NotFinished);
        }
        Ok(QuizResult::from_records(&self.records, self.questions.len())?)
    }

    fn record(&mut self, selection: Selection) -> Submitted {
        let question_index = self.current;
        let record = AnswerRecord::for_question(&self.questions[question_index], selection);
        self.records.push(record.clone());
        self.countdown.stop();
        self.current += 1;

        // Clear the staged pick before the next countdown starts so an
        // expiry can never submit the previous question's choice.
        self.staged = None;

        let advance = if self.current < self.questions.len() {
            self.countdown.start(self.config.per_question_secs());
            Advance::Next {
                index: self.current,
            }
        } else {
            Advance::Finished
        };

        Submitted {
            question_index,
            record,
            advance,
        }
    }
}

fn check_option(question: &Question, index: usize) -> Result<(), QuizError> {
    if index >= question.option_count() {
        return Err(QuizError::InvalidOption {
            index,
            len: question.option_count(),
        });
    }
    Ok(())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
