use quiz_core::model::{Question, Subject};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{encode_options, i64_from_usize, map_question_row, ser};
use crate::repository::{QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn fetch_questions(&self, subject: &Subject) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT prompt, options, correct_option
                FROM questions
                WHERE subject = ?1
                ORDER BY position ASC
            ",
        )
        .bind(subject.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_question_row(&row)?);
        }
        Ok(out)
    }

    async fn replace_questions(
        &self,
        subject: &Subject,
        questions: &[Question],
    ) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query("DELETE FROM questions WHERE subject = ?1")
            .bind(subject.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for (position, question) in questions.iter().enumerate() {
            sqlx::query(
                r"
                    INSERT INTO questions (subject, position, prompt, options, correct_option)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(subject.as_str())
            .bind(i64_from_usize("position", position)?)
            .bind(question.prompt())
            .bind(encode_options(question.options())?)
            .bind(i64_from_usize("correct_option", question.correct_option())?)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    async fn list_subjects(&self) -> Result<Vec<Subject>, StorageError> {
        let rows = sqlx::query("SELECT DISTINCT subject FROM questions ORDER BY subject ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let name: String = row.try_get("subject").map_err(ser)?;
                Subject::new(name).map_err(ser)
            })
            .collect()
    }
}
