#![forbid(unsafe_code)]

pub mod adapters;
pub mod app_services;
pub mod driver;
pub mod error;
pub mod quiz_view;
pub mod sessions;

pub use quiz_core::Clock;

pub use adapters::{ContentAdapter, ReturnHook};
pub use app_services::AppServices;
pub use driver::{
    DriverOutcome, FinishHook, Rejection, SessionCommand, SessionDriver, SessionEvent,
    SessionHandle,
};
pub use error::{AppServicesError, SessionError};
pub use quiz_view::{OptionView, QuestionView, QuizOverview, ResultView, TimerTone};
pub use sessions::{
    AttemptHistoryService, AttemptListItem, QuizLoopService, QuizSessionService, SessionProgress,
};
