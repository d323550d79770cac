#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod scoring;
pub mod session;
pub mod time;
pub mod timer;

pub use error::Error;
pub use scoring::{QuizResult, ScoringError};
pub use session::{Advance, QuizError, QuizPhase, QuizSession, Submitted, TickOutcome};
pub use time::Clock;
