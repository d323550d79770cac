mod answer;
mod attempt;
mod config;
mod ids;
mod item;
mod question;

pub use ids::{ContentId, ParseIdError, QuestionId, QuizSessionId};
pub use item::{ContentKind, ContentRef, ContentRefError};

pub use answer::{AnswerRecord, Selection};
pub use attempt::{AttemptSummary, AttemptSummaryError};
pub use config::{CONFERENCE_PER_QUESTION_SECS, DEFAULT_PER_QUESTION_SECS, QuizConfig, QuizMeta};
pub use question::{Question, QuestionError, option_label, parse_option_label};
