use quiz_core::model::{AttemptSummary, ContentRef};
use sqlx::{Row, SqlitePool};

use super::SqliteRepository;
use super::mapping::{
    content_columns, map_answer_row, map_content, selection_to_column, ser, u32_from_i64,
    usize_to_i64,
};
use crate::repository::{AttemptId, AttemptRepository, AttemptRow, StorageError};

async fn load_answers(
    pool: &SqlitePool,
    attempt_id: AttemptId,
) -> Result<Vec<quiz_core::model::AnswerRecord>, StorageError> {
    let rows = sqlx::query(
        r"
            SELECT question_id, selected_index, correct_index
            FROM quiz_attempt_answers
            WHERE attempt_id = ?1
            ORDER BY position ASC
        ",
    )
    .bind(attempt_id)
    .fetch_all(pool)
    .await
    .map_err(|e| StorageError::Connection(e.to_string()))?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(map_answer_row(&row)?);
    }
    Ok(out)
}

async fn map_attempt_row(
    pool: &SqlitePool,
    row: &sqlx::sqlite::SqliteRow,
) -> Result<AttemptRow, StorageError> {
    let id: AttemptId = row.try_get("id").map_err(ser)?;
    let content = map_content(row)?;
    let started_at = row.try_get("started_at").map_err(ser)?;
    let completed_at = row.try_get("completed_at").map_err(ser)?;
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;
    let total = u32_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?;
    let answers = load_answers(pool, id).await?;

    let summary =
        AttemptSummary::from_persisted(content, started_at, completed_at, score, total, answers)
            .map_err(ser)?;
    Ok(AttemptRow::new(id, summary))
}

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(&self, summary: &AttemptSummary) -> Result<AttemptId, StorageError> {
        let (kind, content_id) = content_columns(summary.content())?;
        let conn_err = |e: sqlx::Error| StorageError::Connection(e.to_string());

        let mut tx = self.pool.begin().await.map_err(conn_err)?;

        let res = sqlx::query(
            r"
                INSERT INTO quiz_attempts (
                    content_kind, content_id, started_at, completed_at, score, total
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(kind)
        .bind(content_id)
        .bind(summary.started_at())
        .bind(summary.completed_at())
        .bind(i64::from(summary.score()))
        .bind(i64::from(summary.total()))
        .execute(&mut *tx)
        .await
        .map_err(conn_err)?;
        let attempt_id = res.last_insert_rowid();

        for (position, answer) in summary.answers().iter().enumerate() {
            sqlx::query(
                r"
                    INSERT INTO quiz_attempt_answers (
                        attempt_id, position, question_id, selected_index, correct_index
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(attempt_id)
            .bind(usize_to_i64("position", position)?)
            .bind(answer.question_id().as_str())
            .bind(selection_to_column(answer.selection())?)
            .bind(usize_to_i64("correct_index", answer.correct_index())?)
            .execute(&mut *tx)
            .await
            .map_err(conn_err)?;
        }

        tx.commit().await.map_err(conn_err)?;
        tracing::debug!(attempt_id, content = %summary.content(), "stored quiz attempt");
        Ok(attempt_id)
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<AttemptSummary, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, content_kind, content_id, started_at, completed_at, score, total
                FROM quiz_attempts
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        Ok(map_attempt_row(&self.pool, &row).await?.summary)
    }

    async fn list_attempt_rows(
        &self,
        content: ContentRef,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError> {
        let (kind, content_id) = content_columns(content)?;

        let rows = sqlx::query(
            r"
                SELECT id, content_kind, content_id, started_at, completed_at, score, total
                FROM quiz_attempts
                WHERE content_kind = ?1 AND content_id = ?2
                ORDER BY completed_at DESC, id DESC
                LIMIT ?3
            ",
        )
        .bind(kind)
        .bind(content_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_attempt_row(&self.pool, &row).await?);
        }
        Ok(out)
    }
}
