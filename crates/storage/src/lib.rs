#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    AttemptId, AttemptRepository, AttemptRow, InMemoryRepository, QuestionCatalog, QuestionSet,
    Storage, StorageError,
};
pub use sqlite::{SqliteInitError, SqliteRepository};
