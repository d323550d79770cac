use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::question::Question;

/// What the user ended up answering for one question.
///
/// `Skipped` covers both an explicit skip and a timeout with nothing staged,
/// so "option 0 chosen" and "nothing chosen" can never be confused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selection {
    Selected(usize),
    Skipped,
}

impl Selection {
    #[must_use]
    pub fn index(self) -> Option<usize> {
        match self {
            Selection::Selected(index) => Some(index),
            Selection::Skipped => None,
        }
    }

    #[must_use]
    pub fn is_skipped(self) -> bool {
        matches!(self, Selection::Skipped)
    }
}

impl From<Option<usize>> for Selection {
    fn from(value: Option<usize>) -> Self {
        value.map_or(Selection::Skipped, Selection::Selected)
    }
}

/// One recorded answer. Created once per question and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    question_id: QuestionId,
    selection: Selection,
    correct_index: usize,
}

impl AnswerRecord {
    /// Record `selection` against `question`, copying its correct index.
    #[must_use]
    pub fn for_question(question: &Question, selection: Selection) -> Self {
        Self {
            question_id: question.id().clone(),
            selection,
            correct_index: question.correct_index(),
        }
    }

    /// Rehydrate a record from persisted storage.
    #[must_use]
    pub fn from_persisted(
        question_id: QuestionId,
        selection: Selection,
        correct_index: usize,
    ) -> Self {
        Self {
            question_id,
            selection,
            correct_index,
        }
    }

    #[must_use]
    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }

    #[must_use]
    pub fn selection(&self) -> Selection {
        self.selection
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    /// Only an actual selection equal to the copied correct index counts.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.selection == Selection::Selected(self.correct_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_is_never_correct() {
        let record = AnswerRecord::from_persisted(QuestionId::from(1u64), Selection::Skipped, 0);
        assert!(!record.is_correct());
    }

    #[test]
    fn option_conversion_distinguishes_zero_from_none() {
        assert_eq!(Selection::from(Some(0)), Selection::Selected(0));
        assert_eq!(Selection::from(None), Selection::Skipped);
        assert_eq!(Selection::Selected(0).index(), Some(0));
    }
}
