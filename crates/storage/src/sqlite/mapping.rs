use quiz_core::model::{LeaderboardEntry, Question, ResultRecord, Subject, SubmissionId};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn i64_from_usize(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn encode_options(options: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let prompt: String = row.try_get("prompt").map_err(ser)?;
    let options_json: String = row.try_get("options").map_err(ser)?;
    let options: Vec<String> = serde_json::from_str(&options_json).map_err(ser)?;
    let correct = row.try_get::<i64, _>("correct_option").map_err(ser)?;
    let correct = usize::try_from(correct)
        .map_err(|_| StorageError::Serialization(format!("invalid correct_option: {correct}")))?;

    Question::new(prompt, options, correct).map_err(ser)
}

pub(crate) fn map_entry_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<LeaderboardEntry, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let subject = Subject::new(row.try_get::<String, _>("subject").map_err(ser)?).map_err(ser)?;
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;
    let total = u32_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?;
    let secs = u32_from_i64(
        "time_taken_seconds",
        row.try_get::<i64, _>("time_taken_seconds").map_err(ser)?,
    )?;

    Ok(LeaderboardEntry {
        id: SubmissionId::new(id),
        record: ResultRecord::new(subject, score, total, secs),
    })
}
