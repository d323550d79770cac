mod progress;
mod queries;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::SessionProgress;
pub use service::QuizSessionService;
pub use view::{AttemptHistoryService, AttemptListItem};
pub use workflow::QuizLoopService;
