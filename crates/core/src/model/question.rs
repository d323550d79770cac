use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question needs at least one option")]
    NoOptions,

    #[error("correct option {index} is out of range for {len} options")]
    CorrectIndexOutOfRange { index: usize, len: usize },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuestion")]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct_index: usize,
}

/// Unvalidated wire shape; deserialization goes through `Question::new`.
#[derive(Deserialize)]
struct RawQuestion {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct_index: usize,
}

impl TryFrom<RawQuestion> for Question {
    type Error = QuestionError;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        Question::new(raw.id, raw.prompt, raw.options, raw.correct_index)
    }
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt is blank, there are no options,
    /// or `correct_index` does not point at an option.
    pub fn new(
        id: impl Into<QuestionId>,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if options.is_empty() {
            return Err(QuestionError::NoOptions);
        }
        if correct_index >= options.len() {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: correct_index,
                len: options.len(),
            });
        }

        Ok(Self {
            id: id.into(),
            prompt,
            options,
            correct_index,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    /// Options paired with their display labels (A, B, C, ...).
    pub fn labelled_options(&self) -> impl Iterator<Item = (String, &str)> {
        self.options
            .iter()
            .enumerate()
            .map(|(i, opt)| (option_label(i), opt.as_str()))
    }
}

/// Letter label for an option index: 0 -> "A", 25 -> "Z", 26 -> "AA".
#[must_use]
pub fn option_label(index: usize) -> String {
    let mut n = index;
    let mut label = Vec::new();
    loop {
        let digit = u8::try_from(n % 26).unwrap_or(0);
        label.push(b'A' + digit);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

/// Parses a label typed by a user ("b", "C") back into an option index.
#[must_use]
pub fn parse_option_label(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut value: usize = 0;
    for c in raw.to_ascii_uppercase().bytes() {
        value = value.checked_mul(26)?.checked_add(usize::from(c - b'A') + 1)?;
    }
    Some(value - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Option {i}")).collect()
    }

    #[test]
    fn rejects_invalid_questions() {
        assert_eq!(
            Question::new("q1", " ", opts(2), 0).unwrap_err(),
            QuestionError::EmptyPrompt
        );
        assert_eq!(
            Question::new("q1", "Prompt", Vec::new(), 0).unwrap_err(),
            QuestionError::NoOptions
        );
        assert_eq!(
            Question::new("q1", "Prompt", opts(4), 4).unwrap_err(),
            QuestionError::CorrectIndexOutOfRange { index: 4, len: 4 }
        );
    }

    #[test]
    fn labels_options_alphabetically() {
        let q = Question::new(1u64, "Which organ?", opts(3), 2).unwrap();
        let labels: Vec<_> = q.labelled_options().map(|(label, _)| label).collect();
        assert_eq!(labels, vec!["A", "B", "C"]);
    }

    #[test]
    fn label_parsing_is_inverse_of_labelling() {
        for i in [0, 1, 25, 26, 27, 701, 702] {
            assert_eq!(parse_option_label(&option_label(i)), Some(i));
        }
        assert_eq!(option_label(26), "AA");
        assert_eq!(parse_option_label("c"), Some(2));
        assert_eq!(parse_option_label("1"), None);
        assert_eq!(parse_option_label(""), None);
    }

    #[test]
    fn deserializing_runs_the_same_checks() {
        let json = r#"{"id":"q1","prompt":"Which organ?","options":["Kidney","Liver"],"correct_index":1}"#;
        let question: Question = serde_json::from_str(json).unwrap();
        assert_eq!(question.correct_index(), 1);

        let out_of_range = r#"{"id":"q1","prompt":"Which organ?","options":["Kidney"],"correct_index":3}"#;
        let err = serde_json::from_str::<Question>(out_of_range).unwrap_err();
        assert!(err.to_string().contains("out of range"));

        let blank = r#"{"id":"q2","prompt":"  ","options":["Kidney"],"correct_index":0}"#;
        assert!(serde_json::from_str::<Question>(blank).is_err());
    }
}
