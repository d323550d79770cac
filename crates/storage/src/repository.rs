use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use quiz_core::model::{AttemptSummary, ContentRef, Question, QuizMeta};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Storage identifier for a persisted attempt (matches `SQLite` row ids).
pub type AttemptId = i64;

/// Questions and quiz settings attached to one content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub content: ContentRef,
    pub meta: QuizMeta,
    pub questions: Vec<Question>,
}

impl QuestionSet {
    #[must_use]
    pub fn new(content: ContentRef, meta: QuizMeta, questions: Vec<Question>) -> Self {
        Self {
            content,
            meta,
            questions,
        }
    }
}

/// A persisted attempt together with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRow {
    pub id: AttemptId,
    pub summary: AttemptSummary,
}

impl AttemptRow {
    #[must_use]
    pub fn new(id: AttemptId, summary: AttemptSummary) -> Self {
        Self { id, summary }
    }
}

/// Read/write access to quiz question sets.
#[async_trait]
pub trait QuestionCatalog: Send + Sync {
    /// Fetch the question set for a content item.
    ///
    /// Returns `Ok(None)` when nothing was ever stored for `content`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the set cannot be read or decoded.
    async fn question_set(&self, content: ContentRef) -> Result<Option<QuestionSet>, StorageError>;

    /// Replace the stored set for `set.content`, questions in the given order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the set cannot be stored.
    async fn upsert_question_set(&self, set: &QuestionSet) -> Result<(), StorageError>;

    /// All content items that have a stored set, ordered by kind then id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_contents(&self) -> Result<Vec<ContentRef>, StorageError>;
}

/// Append-only history of finished quiz attempts.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Persist a finished attempt, answers included.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn append_attempt(&self, summary: &AttemptSummary) -> Result<AttemptId, StorageError>;

    /// Fetch an attempt by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_attempt(&self, id: AttemptId) -> Result<AttemptSummary, StorageError>;

    /// Most recent attempts for a content item, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_attempt_rows(
        &self,
        content: ContentRef,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    sets: Arc<Mutex<BTreeMap<ContentRef, QuestionSet>>>,
    attempts: Arc<Mutex<HashMap<AttemptId, AttemptSummary>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionCatalog for InMemoryRepository {
    async fn question_set(&self, content: ContentRef) -> Result<Option<QuestionSet>, StorageError> {
        let guard = self
            .sets
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&content).cloned())
    }

    async fn upsert_question_set(&self, set: &QuestionSet) -> Result<(), StorageError> {
        let mut guard = self
            .sets
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(set.content, set.clone());
        Ok(())
    }

    async fn list_contents(&self) -> Result<Vec<ContentRef>, StorageError> {
        let guard = self
            .sets
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.keys().copied().collect())
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, summary: &AttemptSummary) -> Result<AttemptId, StorageError> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = AttemptId::try_from(guard.len())
            .map_err(|e| StorageError::Serialization(e.to_string()))?
            + 1;
        guard.insert(id, summary.clone());
        Ok(id)
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<AttemptSummary, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_attempt_rows(
        &self,
        content: ContentRef,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<AttemptRow> = guard
            .iter()
            .filter(|(_, summary)| summary.content() == content)
            .map(|(id, summary)| AttemptRow::new(*id, summary.clone()))
            .collect();
        rows.sort_by(|a, b| {
            b.summary
                .completed_at()
                .cmp(&a.summary.completed_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Aggregates catalog and attempt repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub catalog: Arc<dyn QuestionCatalog>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let catalog: Arc<dyn QuestionCatalog> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo);
        Self { catalog, attempts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{AnswerRecord, QuestionId, Selection};
    use quiz_core::time::fixed_now;

    fn build_question(id: &str, correct: usize) -> Question {
        Question::new(
            id,
            format!("Prompt {id}"),
            vec!["Yes".into(), "No".into()],
            correct,
        )
        .unwrap()
    }

    fn build_attempt(content: ContentRef, minutes: i64, score: u32) -> AttemptSummary {
        let started = fixed_now() + Duration::minutes(minutes);
        let answers = vec![AnswerRecord::from_persisted(
            QuestionId::from("q1"),
            if score == 1 {
                Selection::Selected(0)
            } else {
                Selection::Skipped
            },
            0,
        )];
        AttemptSummary::from_persisted(content, started, started, score, 1, answers).unwrap()
    }

    #[tokio::test]
    async fn question_set_round_trips_and_missing_is_none() {
        let repo = InMemoryRepository::new();
        let content = ContentRef::conference(1);
        assert!(repo.question_set(content).await.unwrap().is_none());

        let set = QuestionSet::new(
            content,
            QuizMeta::with_per_question_secs(30),
            vec![build_question("q1", 0), build_question("q2", 1)],
        );
        repo.upsert_question_set(&set).await.unwrap();

        let fetched = repo.question_set(content).await.unwrap().unwrap();
        assert_eq!(fetched, set);
        assert_eq!(repo.list_contents().await.unwrap(), vec![content]);
    }

    #[tokio::test]
    async fn attempts_list_newest_first_per_content() {
        let repo = InMemoryRepository::new();
        let conference = ContentRef::conference(1);
        let webinar = ContentRef::webinar(1);

        let first = repo.append_attempt(&build_attempt(conference, 0, 0)).await.unwrap();
        let second = repo.append_attempt(&build_attempt(conference, 5, 1)).await.unwrap();
        repo.append_attempt(&build_attempt(webinar, 10, 1)).await.unwrap();

        let rows = repo.list_attempt_rows(conference, 10).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second, first]);

        let limited = repo.list_attempt_rows(conference, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert!(matches!(
            repo.get_attempt(99).await,
            Err(StorageError::NotFound)
        ));
    }
}
