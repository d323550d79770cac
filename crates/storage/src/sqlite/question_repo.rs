use quiz_core::model::{ContentRef, QuizMeta};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    content_columns, encode_options, map_content, map_question_row, ser, u32_from_i64,
    usize_to_i64,
};
use crate::repository::{QuestionCatalog, QuestionSet, StorageError};

#[async_trait::async_trait]
impl QuestionCatalog for SqliteRepository {
    async fn question_set(&self, content: ContentRef) -> Result<Option<QuestionSet>, StorageError> {
        let (kind, id) = content_columns(content)?;

        let Some(meta_row) = sqlx::query(
            r"
                SELECT per_question_secs, duration_minutes
                FROM quiz_sets
                WHERE content_kind = ?1 AND content_id = ?2
            ",
        )
        .bind(kind)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        else {
            return Ok(None);
        };

        let per_question_secs: Option<i64> = meta_row.try_get("per_question_secs").map_err(ser)?;
        let duration_minutes = meta_row
            .try_get::<Option<i64>, _>("duration_minutes")
            .map_err(ser)?
            .map(|v| u32_from_i64("duration_minutes", v))
            .transpose()?;

        let rows = sqlx::query(
            r"
                SELECT question_id, prompt, options, correct_index
                FROM quiz_questions
                WHERE content_kind = ?1 AND content_id = ?2
                ORDER BY position ASC
            ",
        )
        .bind(kind)
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut questions = Vec::with_capacity(rows.len());
        for row in rows {
            questions.push(map_question_row(&row)?);
        }

        Ok(Some(QuestionSet::new(
            content,
            QuizMeta {
                per_question_secs,
                duration_minutes,
            },
            questions,
        )))
    }

    async fn upsert_question_set(&self, set: &QuestionSet) -> Result<(), StorageError> {
        let (kind, id) = content_columns(set.content)?;
        let conn_err = |e: sqlx::Error| StorageError::Connection(e.to_string());

        let mut tx = self.pool.begin().await.map_err(conn_err)?;

        sqlx::query(
            r"
                INSERT INTO quiz_sets (content_kind, content_id, per_question_secs, duration_minutes)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(content_kind, content_id) DO UPDATE SET
                    per_question_secs = excluded.per_question_secs,
                    duration_minutes = excluded.duration_minutes
            ",
        )
        .bind(kind)
        .bind(id)
        .bind(set.meta.per_question_secs)
        .bind(set.meta.duration_minutes.map(i64::from))
        .execute(&mut *tx)
        .await
        .map_err(conn_err)?;

        sqlx::query("DELETE FROM quiz_questions WHERE content_kind = ?1 AND content_id = ?2")
            .bind(kind)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(conn_err)?;

        for (position, question) in set.questions.iter().enumerate() {
            sqlx::query(
                r"
                    INSERT INTO quiz_questions (
                        content_kind, content_id, position, question_id,
                        prompt, options, correct_index
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ",
            )
            .bind(kind)
            .bind(id)
            .bind(usize_to_i64("position", position)?)
            .bind(question.id().as_str())
            .bind(question.prompt())
            .bind(encode_options(question.options())?)
            .bind(usize_to_i64("correct_index", question.correct_index())?)
            .execute(&mut *tx)
            .await
            .map_err(conn_err)?;
        }

        tx.commit().await.map_err(conn_err)?;
        tracing::debug!(content = %set.content, questions = set.questions.len(), "stored question set");
        Ok(())
    }

    async fn list_contents(&self) -> Result<Vec<ContentRef>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT content_kind, content_id
                FROM quiz_sets
                ORDER BY content_kind ASC, content_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_content(&row)?);
        }
        // Kind order follows the enum, not the stored string.
        out.sort();
        Ok(out)
    }
}
