use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::AnswerRecord;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoringError {
    #[error("recorded {recorded} answers for {expected} questions")]
    CountMismatch { recorded: usize, expected: usize },

    #[error("too many answers to score: {len}")]
    TooManyAnswers { len: usize },
}

/// Final outcome of a quiz: score, total and the per-question breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    score: u32,
    total: u32,
    records: Vec<AnswerRecord>,
}

impl QuizResult {
    /// Score a finished set of records.
    ///
    /// Pure: the records are cloned, never modified, and scoring the same
    /// records twice yields the same result.
    ///
    /// # Errors
    ///
    /// Returns `ScoringError::CountMismatch` if the number of records differs
    /// from `expected_total`, and `ScoringError::TooManyAnswers` if the count
    /// does not fit in `u32`.
    pub fn from_records(
        records: &[AnswerRecord],
        expected_total: usize,
    ) -> Result<Self, ScoringError> {
        if records.len() != expected_total {
            return Err(ScoringError::CountMismatch {
                recorded: records.len(),
                expected: expected_total,
            });
        }
        let total = u32::try_from(records.len())
            .map_err(|_| ScoringError::TooManyAnswers { len: records.len() })?;

        Ok(Self {
            score: score(records),
            total,
            records: records.to_vec(),
        })
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// `(score, total)` as handed to the result display.
    #[must_use]
    pub fn as_pair(&self) -> (u32, u32) {
        (self.score, self.total)
    }

    #[must_use]
    pub fn records(&self) -> &[AnswerRecord] {
        &self.records
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.selection().is_skipped())
            .count()
    }
}

/// Number of records whose selection matches the copied correct index.
#[must_use]
pub fn score(records: &[AnswerRecord]) -> u32 {
    let correct = records.iter().filter(|r| r.is_correct()).count();
    u32::try_from(correct).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionId, Selection};

    fn record(id: u64, selection: Selection, correct: usize) -> AnswerRecord {
        AnswerRecord::from_persisted(QuestionId::from(id), selection, correct)
    }

    #[test]
    fn counts_only_matching_selections() {
        let records = vec![
            record(1, Selection::Selected(1), 1),
            record(2, Selection::Selected(0), 0),
            record(3, Selection::Selected(1), 2),
            record(4, Selection::Skipped, 0),
        ];
        let result = QuizResult::from_records(&records, 4).unwrap();
        assert_eq!(result.as_pair(), (2, 4));
        assert_eq!(result.skipped(), 1);
    }

    #[test]
    fn scoring_is_idempotent() {
        let records = vec![
            record(1, Selection::Selected(2), 2),
            record(2, Selection::Skipped, 1),
        ];
        let first = QuizResult::from_records(&records, 2).unwrap();
        let second = QuizResult::from_records(&records, 2).unwrap();
        assert_eq!(first, second);
        assert_eq!(score(&records), score(&records));
    }

    #[test]
    fn mismatched_total_is_rejected() {
        let records = vec![record(1, Selection::Skipped, 0)];
        assert_eq!(
            QuizResult::from_records(&records, 3).unwrap_err(),
            ScoringError::CountMismatch {
                recorded: 1,
                expected: 3
            }
        );
    }
}
