//! Display-ready snapshots of a quiz, independent of any UI toolkit.

use serde::Serialize;

use quiz_core::QuizResult;
use quiz_core::model::{ContentRef, option_label};
use quiz_core::time::format_mmss;
use storage::repository::QuestionSet;

use crate::sessions::QuizSessionService;

/// Colour band of the countdown ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimerTone {
    Calm,
    Warning,
    Critical,
}

impl TimerTone {
    /// Above half the time left is calm, above a quarter a warning, else critical.
    #[must_use]
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 0.5 {
            TimerTone::Calm
        } else if ratio > 0.25 {
            TimerTone::Warning
        } else {
            TimerTone::Critical
        }
    }
}

/// Pre-start description of a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizOverview {
    pub content: ContentRef,
    pub question_count: usize,
    pub per_question_secs: i64,
    pub duration_minutes: Option<u32>,
}

impl QuizOverview {
    #[must_use]
    pub fn from_set(set: &QuestionSet) -> Self {
        Self {
            content: set.content,
            question_count: set.questions.len(),
            per_question_secs: quiz_core::model::QuizConfig::resolve(set.content.kind, &set.meta)
                .per_question_secs(),
            duration_minutes: set.meta.duration_minutes,
        }
    }

    /// "05 Minutes" when a duration is configured, otherwise the worst case
    /// derived from the question count and limit, rounded up.
    #[must_use]
    pub fn duration_label(&self) -> String {
        let minutes = self.duration_minutes.map_or_else(
            || {
                let count = i64::try_from(self.question_count).unwrap_or(i64::MAX);
                let secs = count.saturating_mul(self.per_question_secs.max(0));
                secs.saturating_add(59) / 60
            },
            i64::from,
        );
        format!("{minutes:02} Minutes")
    }

    #[must_use]
    pub fn rules(&self) -> Vec<String> {
        vec![
            self.duration_label(),
            format!("{} Questions", self.question_count),
            format!("{} Sec Each Question", self.per_question_secs),
            "Skip the Question - Can't Go Back".to_string(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub label: String,
    pub text: String,
    pub selected: bool,
}

/// The question currently on screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionView {
    /// 1-based position, as shown to users.
    pub number: usize,
    pub total: usize,
    pub prompt: String,
    pub options: Vec<OptionView>,
    pub timer: String,
    pub time_ratio: f64,
    pub tone: TimerTone,
    pub can_submit: bool,
}

impl QuestionView {
    /// Snapshot of the active question, or `None` once the session is finished.
    #[must_use]
    pub fn from_session(session: &QuizSessionService) -> Option<Self> {
        let quiz = session.quiz();
        let question = quiz.current_question()?;
        let staged = quiz.staged_selection();
        let ratio = quiz.time_ratio();

        Some(Self {
            number: quiz.current_index() + 1,
            total: quiz.total(),
            prompt: question.prompt().to_string(),
            options: question
                .options()
                .iter()
                .enumerate()
                .map(|(i, text)| OptionView {
                    label: option_label(i),
                    text: text.clone(),
                    selected: staged == Some(i),
                })
                .collect(),
            timer: format_mmss(quiz.remaining_secs()),
            time_ratio: ratio,
            tone: TimerTone::from_ratio(ratio),
            can_submit: staged.is_some(),
        })
    }

    #[must_use]
    pub fn counter_label(&self) -> String {
        format!("QUESTIONS : {} / {}", self.number, self.total)
    }
}

/// Final score card handed to the result display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultView {
    pub score: u32,
    pub total: u32,
    pub skipped: usize,
}

impl ResultView {
    #[must_use]
    pub fn from_result(result: &QuizResult) -> Self {
        Self {
            score: result.score(),
            total: result.total(),
            skipped: result.skipped(),
        }
    }

    #[must_use]
    pub fn score_label(&self) -> String {
        format!("{}/{}", self.score, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Question, QuizConfig, QuizMeta};
    use quiz_core::time::fixed_now;

    fn questions(n: u64) -> Vec<Question> {
        (1..=n)
            .map(|i| Question::new(i, format!("Q{i}"), vec!["x".into(), "y".into()], 0).unwrap())
            .collect()
    }

    #[test]
    fn tone_thresholds() {
        assert_eq!(TimerTone::from_ratio(1.0), TimerTone::Calm);
        assert_eq!(TimerTone::from_ratio(0.5), TimerTone::Warning);
        assert_eq!(TimerTone::from_ratio(0.26), TimerTone::Warning);
        assert_eq!(TimerTone::from_ratio(0.25), TimerTone::Critical);
        assert_eq!(TimerTone::from_ratio(0.0), TimerTone::Critical);
    }

    #[test]
    fn overview_prefers_configured_duration() {
        let set = QuestionSet::new(
            ContentRef::workshop(1),
            QuizMeta {
                per_question_secs: Some(30),
                duration_minutes: Some(5),
            },
            questions(10),
        );
        let overview = QuizOverview::from_set(&set);
        assert_eq!(overview.duration_label(), "05 Minutes");
        assert_eq!(overview.rules()[1], "10 Questions");
        assert_eq!(overview.rules()[2], "30 Sec Each Question");
    }

    #[test]
    fn overview_derives_duration_from_limit() {
        let set = QuestionSet::new(ContentRef::conference(1), QuizMeta::default(), questions(3));
        let overview = QuizOverview::from_set(&set);
        assert_eq!(overview.per_question_secs, 150);
        assert_eq!(overview.duration_label(), "08 Minutes");
    }

    #[test]
    fn huge_limit_does_not_overflow_duration() {
        let set = QuestionSet::new(
            ContentRef::conference(1),
            QuizMeta::with_per_question_secs(i64::MAX),
            questions(3),
        );
        let overview = QuizOverview::from_set(&set);
        assert_eq!(overview.per_question_secs, i64::MAX);
        assert_eq!(overview.duration_label(), format!("{:02} Minutes", i64::MAX / 60));
    }

    #[test]
    fn question_view_reflects_staged_selection_and_timer() {
        let mut session = QuizSessionService::new(
            ContentRef::conference(1),
            questions(2),
            QuizConfig::new(150),
            fixed_now(),
        )
        .unwrap();

        let view = QuestionView::from_session(&session).unwrap();
        assert_eq!(view.counter_label(), "QUESTIONS : 1 / 2");
        assert_eq!(view.timer, "02:30");
        assert_eq!(view.tone, TimerTone::Calm);
        assert!(!view.can_submit);

        session.select(1).unwrap();
        let view = QuestionView::from_session(&session).unwrap();
        assert!(view.can_submit);
        assert_eq!(view.options[1].label, "B");
        assert!(view.options[1].selected);
        assert!(!view.options[0].selected);
    }

    #[test]
    fn finished_session_has_no_question_view() {
        let mut session = QuizSessionService::new(
            ContentRef::conference(1),
            questions(1),
            QuizConfig::new(30),
            fixed_now(),
        )
        .unwrap();
        session.skip(fixed_now()).unwrap();
        assert!(QuestionView::from_session(&session).is_none());

        let result = ResultView::from_result(&session.result().unwrap());
        assert_eq!(result.score_label(), "0/1");
        assert_eq!(result.skipped, 1);
    }
}
