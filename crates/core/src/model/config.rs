use serde::{Deserialize, Serialize};

use crate::model::item::ContentKind;

/// Per-question limit used when nothing else is configured.
pub const DEFAULT_PER_QUESTION_SECS: i64 = 30;

/// Per-question fallback for conference quizzes.
pub const CONFERENCE_PER_QUESTION_SECS: i64 = 150;

/// Optional quiz settings a catalog stores next to a question set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizMeta {
    pub per_question_secs: Option<i64>,
    pub duration_minutes: Option<u32>,
}

impl QuizMeta {
    #[must_use]
    pub fn with_per_question_secs(secs: i64) -> Self {
        Self {
            per_question_secs: Some(secs),
            duration_minutes: None,
        }
    }
}

/// Immutable timing configuration for one quiz session.
///
/// The limit is stored as configured, including zero or negative values;
/// the countdown treats those as "already expired" instead of rejecting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizConfig {
    per_question_secs: i64,
}

impl QuizConfig {
    #[must_use]
    pub fn new(per_question_secs: i64) -> Self {
        Self { per_question_secs }
    }

    /// Picks the catalog's limit when present, otherwise the fallback for `kind`.
    #[must_use]
    pub fn resolve(kind: ContentKind, meta: &QuizMeta) -> Self {
        Self::new(
            meta.per_question_secs
                .unwrap_or_else(|| kind.fallback_question_secs()),
        )
    }

    #[must_use]
    pub fn per_question_secs(&self) -> i64 {
        self.per_question_secs
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PER_QUESTION_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_limit_wins_over_kind_fallback() {
        let meta = QuizMeta::with_per_question_secs(20);
        assert_eq!(
            QuizConfig::resolve(ContentKind::Conference, &meta).per_question_secs(),
            20
        );
    }

    #[test]
    fn missing_limit_falls_back_per_kind() {
        let meta = QuizMeta::default();
        assert_eq!(
            QuizConfig::resolve(ContentKind::Conference, &meta).per_question_secs(),
            CONFERENCE_PER_QUESTION_SECS
        );
        assert_eq!(
            QuizConfig::resolve(ContentKind::Webinar, &meta).per_question_secs(),
            DEFAULT_PER_QUESTION_SECS
        );
    }
}
