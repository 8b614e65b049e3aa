use async_trait::async_trait;
use quiz_core::model::{LeaderboardEntry, Question, ResultRecord, Subject, SubmissionId};
use std::cmp::Ordering;
use std::collections::HashMap;
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

/// Source of question sets, keyed by subject.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Fetch the ordered question set for a subject.
    ///
    /// An unknown subject yields an empty list, not `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store is unavailable or a row fails validation.
    async fn fetch_questions(&self, subject: &Subject) -> Result<Vec<Question>, StorageError>;

    /// Replace every question stored for a subject.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the questions cannot be stored.
    async fn replace_questions(
        &self,
        subject: &Subject,
        questions: &[Question],
    ) -> Result<(), StorageError>;

    /// Subjects that currently have at least one question, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_subjects(&self) -> Result<Vec<Subject>, StorageError>;
}

/// Append-only leaderboard collection.
#[async_trait]
pub trait LeaderboardRepository: Send + Sync {
    /// Write a result under `id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if `id` is already taken, or other storage errors.
    async fn submit(&self, id: &SubmissionId, record: &ResultRecord) -> Result<(), StorageError>;

    /// Fetch a single entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn get_entry(&self, id: &SubmissionId) -> Result<LeaderboardEntry, StorageError>;

    /// List entries ranked by score (desc), then time taken (asc), then id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_entries(
        &self,
        subject: Option<&Subject>,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, StorageError>;
}

/// Leaderboard ordering shared by every backend.
#[must_use]
pub fn rank_order(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.record
        .score()
        .cmp(&a.record.score())
        .then_with(|| {
            a.record
                .time_taken_seconds()
                .cmp(&b.record.time_taken_seconds())
        })
        .then_with(|| a.id.cmp(&b.id))
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<HashMap<Subject, Vec<Question>>>>,
    leaderboard: Arc<Mutex<HashMap<SubmissionId, ResultRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn fetch_questions(&self, subject: &Subject) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(subject).cloned().unwrap_or_default())
    }

    async fn replace_questions(
        &self,
        subject: &Subject,
        questions: &[Question],
    ) -> Result<(), StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(subject.clone(), questions.to_vec());
        Ok(())
    }

    async fn list_subjects(&self) -> Result<Vec<Subject>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut subjects: Vec<_> = guard
            .iter()
            .filter(|(_, qs)| !qs.is_empty())
            .map(|(s, _)| s.clone())
            .collect();
        subjects.sort();
        Ok(subjects)
    }
}

#[async_trait]
impl LeaderboardRepository for InMemoryRepository {
    async fn submit(&self, id: &SubmissionId, record: &ResultRecord) -> Result<(), StorageError> {
        let mut guard = self
            .leaderboard
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.contains_key(id) {
            return Err(StorageError::Conflict);
        }
        guard.insert(id.clone(), record.clone());
        Ok(())
    }

    async fn get_entry(&self, id: &SubmissionId) -> Result<LeaderboardEntry, StorageError> {
        let guard = self
            .leaderboard
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .get(id)
            .map(|record| LeaderboardEntry {
                id: id.clone(),
                record: record.clone(),
            })
            .ok_or(StorageError::NotFound)
    }

    async fn list_entries(
        &self,
        subject: Option<&Subject>,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, StorageError> {
        let guard = self
            .leaderboard
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut entries: Vec<_> = guard
            .iter()
            .filter(|(_, record)| subject.is_none_or(|s| record.subject() == s))
            .map(|(id, record)| LeaderboardEntry {
                id: id.clone(),
                record: record.clone(),
            })
            .collect();
        entries.sort_by(rank_order);
        entries.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(entries)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub leaderboard: Arc<dyn LeaderboardRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let leaderboard: Arc<dyn LeaderboardRepository> = Arc::new(repo);
        Self {
            questions,
            leaderboard,
        }
    }
}
