use chrono::Utc;
use quiz_core::model::{LeaderboardEntry, ResultRecord, Subject, SubmissionId};

use super::SqliteRepository;
use super::mapping::map_entry_row;
use crate::repository::{LeaderboardRepository, StorageError};

fn write_error(e: sqlx::Error) -> StorageError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        other => StorageError::Connection(other.to_string()),
    }
}

#[async_trait::async_trait]
impl LeaderboardRepository for SqliteRepository {
    async fn submit(&self, id: &SubmissionId, record: &ResultRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO leaderboard (id, subject, score, total, time_taken_seconds, submitted_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(id.as_str())
        .bind(record.subject().as_str())
        .bind(i64::from(record.score()))
        .bind(i64::from(record.total()))
        .bind(i64::from(record.time_taken_seconds()))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        Ok(())
    }

    async fn get_entry(&self, id: &SubmissionId) -> Result<LeaderboardEntry, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, subject, score, total, time_taken_seconds
                FROM leaderboard
                WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        map_entry_row(&row)
    }

    async fn list_entries(
        &self,
        subject: Option<&Subject>,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, StorageError> {
        let mut sql = String::from(
            r"
                SELECT id, subject, score, total, time_taken_seconds
                FROM leaderboard
            ",
        );
        let mut bind_index = 1;
        if subject.is_some() {
            sql.push_str(" WHERE subject = ?1");
            bind_index += 1;
        }
        sql.push_str(" ORDER BY score DESC, time_taken_seconds ASC, id ASC");
        sql.push_str(" LIMIT ?");
        sql.push_str(&bind_index.to_string());

        let mut query = sqlx::query(&sql);
        if let Some(subject) = subject {
            query = query.bind(subject.as_str());
        }
        query = query.bind(i64::from(limit));

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_entry_row(&row)?);
        }
        Ok(out)
    }
}
