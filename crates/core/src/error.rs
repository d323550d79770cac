use thiserror::Error;

use crate::model::{AttemptSummaryError, ContentRefError, QuestionError};
use crate::scoring::ScoringError;
use crate::session::QuizError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    ContentRef(#[from] ContentRefError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    AttemptSummary(#[from] AttemptSummaryError),
}
