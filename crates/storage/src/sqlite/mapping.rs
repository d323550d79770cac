use quiz_core::model::{
    AnswerRecord, ContentId, ContentKind, ContentRef, Question, QuestionId, Selection,
};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn usize_to_i64(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn i64_to_usize(field: &'static str, v: i64) -> Result<usize, StorageError> {
    usize::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

/// Splits a content ref into its `(content_kind, content_id)` column values.
pub(crate) fn content_columns(content: ContentRef) -> Result<(&'static str, i64), StorageError> {
    Ok((
        content.kind.as_str(),
        u64_to_i64("content_id", content.id.value())?,
    ))
}

pub(crate) fn map_content(row: &sqlx::sqlite::SqliteRow) -> Result<ContentRef, StorageError> {
    let kind: String = row.try_get("content_kind").map_err(ser)?;
    let kind: ContentKind = kind.parse().map_err(ser)?;
    let id: i64 = row.try_get("content_id").map_err(ser)?;
    let id = u64::try_from(id)
        .map_err(|_| StorageError::Serialization(format!("content_id sign overflow: {id}")))?;
    Ok(ContentRef::new(kind, ContentId::new(id)))
}

/// Options are stored as a JSON array of strings.
pub(crate) fn encode_options(options: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let question_id: String = row.try_get("question_id").map_err(ser)?;
    let prompt: String = row.try_get("prompt").map_err(ser)?;
    let options_json: String = row.try_get("options").map_err(ser)?;
    let options: Vec<String> = serde_json::from_str(&options_json).map_err(ser)?;
    let correct_index = i64_to_usize(
        "correct_index",
        row.try_get::<i64, _>("correct_index").map_err(ser)?,
    )?;

    Question::new(QuestionId::new(question_id), prompt, options, correct_index).map_err(ser)
}

/// `NULL` in `selected_index` means the question was skipped or timed out.
pub(crate) fn selection_to_column(selection: Selection) -> Result<Option<i64>, StorageError> {
    selection
        .index()
        .map(|i| usize_to_i64("selected_index", i))
        .transpose()
}

pub(crate) fn map_answer_row(row: &sqlx::sqlite::SqliteRow) -> Result<AnswerRecord, StorageError> {
    let question_id: String = row.try_get("question_id").map_err(ser)?;
    let selected = row
        .try_get::<Option<i64>, _>("selected_index")
        .map_err(ser)?
        .map(|v| i64_to_usize("selected_index", v))
        .transpose()?;
    let correct_index = i64_to_usize(
        "correct_index",
        row.try_get::<i64, _>("correct_index").map_err(ser)?,
    )?;

    Ok(AnswerRecord::from_persisted(
        QuestionId::new(question_id),
        Selection::from(selected),
        correct_index,
    ))
}
