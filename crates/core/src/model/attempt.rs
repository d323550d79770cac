use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{AnswerRecord, ContentRef};
use crate::scoring::{QuizResult, score};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("score ({score}) exceeds total ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },

    #[error("total ({total}) does not match answer count ({answers})")]
    CountMismatch { total: u32, answers: usize },

    #[error("score ({stored}) does not match recorded answers ({computed})")]
    ScoreMismatch { stored: u32, computed: u32 },
}

/// A finished quiz attempt, as kept in history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptSummary {
    content: ContentRef,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    score: u32,
    total: u32,
    answers: Vec<AnswerRecord>,
}

impl AttemptSummary {
    /// Build a summary from a scored result.
    ///
    /// # Errors
    ///
    /// Returns `AttemptSummaryError::InvalidTimeRange` if `completed_at` is before `started_at`.
    pub fn from_result(
        content: ContentRef,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        result: &QuizResult,
    ) -> Result<Self, AttemptSummaryError> {
        Self::from_persisted(
            content,
            started_at,
            completed_at,
            result.score(),
            result.total(),
            result.records().to_vec(),
        )
    }

    /// Rehydrate a summary from persisted storage.
    ///
    /// An empty `answers` list is accepted for rows stored without a
    /// breakdown; otherwise it must agree with `score` and `total`.
    ///
    /// # Errors
    ///
    /// Returns `AttemptSummaryError` if timestamps, counts or score disagree.
    pub fn from_persisted(
        content: ContentRef,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        score_value: u32,
        total: u32,
        answers: Vec<AnswerRecord>,
    ) -> Result<Self, AttemptSummaryError> {
        if completed_at < started_at {
            return Err(AttemptSummaryError::InvalidTimeRange);
        }
        if score_value > total {
            return Err(AttemptSummaryError::ScoreExceedsTotal {
                score: score_value,
                total,
            });
        }
        if !answers.is_empty() {
            let matches_total = usize::try_from(total).is_ok_and(|t| t == answers.len());
            if !matches_total {
                return Err(AttemptSummaryError::CountMismatch {
                    total,
                    answers: answers.len(),
                });
            }
            let computed = score(&answers);
            if computed != score_value {
                return Err(AttemptSummaryError::ScoreMismatch {
                    stored: score_value,
                    computed,
                });
            }
        }

        Ok(Self {
            content,
            started_at,
            completed_at,
            score: score_value,
            total,
            answers,
        })
    }

    #[must_use]
    pub fn content(&self) -> ContentRef {
        self.content
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionId, Selection};
    use crate::time::fixed_now;

    fn answers() -> Vec<AnswerRecord> {
        vec![
            AnswerRecord::from_persisted(QuestionId::from("q1"), Selection::Selected(2), 2),
            AnswerRecord::from_persisted(QuestionId::from("q2"), Selection::Skipped, 1),
        ]
    }

    #[test]
    fn summary_from_result_copies_score() {
        let result = QuizResult::from_records(&answers(), 2).unwrap();
        let now = fixed_now();
        let summary =
            AttemptSummary::from_result(ContentRef::conference(1), now, now, &result).unwrap();
        assert_eq!(summary.score(), 1);
        assert_eq!(summary.total(), 2);
        assert_eq!(summary.answers().len(), 2);
    }

    #[test]
    fn persisted_summary_is_validated() {
        let now = fixed_now();
        let earlier = now - chrono::Duration::minutes(1);
        let content = ContentRef::webinar(4);

        assert_eq!(
            AttemptSummary::from_persisted(content, now, earlier, 0, 1, Vec::new()).unwrap_err(),
            AttemptSummaryError::InvalidTimeRange
        );
        assert!(matches!(
            AttemptSummary::from_persisted(content, now, now, 3, 2, Vec::new()),
            Err(AttemptSummaryError::ScoreExceedsTotal { .. })
        ));
        assert!(matches!(
            AttemptSummary::from_persisted(content, now, now, 1, 3, answers()),
            Err(AttemptSummaryError::CountMismatch { .. })
        ));
        assert!(matches!(
            AttemptSummary::from_persisted(content, now, now, 2, 2, answers()),
            Err(AttemptSummaryError::ScoreMismatch { .. })
        ));
    }
}
