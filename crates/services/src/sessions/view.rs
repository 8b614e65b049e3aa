use std::sync::Arc;

use quiz_core::model::{LeaderboardEntry, Subject, SubmissionId};
use storage::repository::LeaderboardRepository;

use crate::error::LeaderboardError;

/// Upper bound on entries scanned for profile statistics.
const PROFILE_SCAN_LIMIT: u32 = 10_000;

/// Presentation-agnostic leaderboard row.
///
/// No pre-formatted strings; the host decides how to render percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub id: SubmissionId,
    pub subject: Subject,
    pub score: u32,
    pub total: u32,
    pub percentage: f64,
    pub time_taken_seconds: u32,
    pub passed: bool,
}

impl LeaderboardRow {
    #[must_use]
    pub fn from_entry(rank: usize, entry: &LeaderboardEntry) -> Self {
        let record = &entry.record;
        Self {
            rank,
            id: entry.id.clone(),
            subject: record.subject().clone(),
            score: record.score(),
            total: record.total(),
            percentage: record.percentage(),
            time_taken_seconds: record.time_taken_seconds(),
            passed: record.passed(),
        }
    }
}

/// Totals shown on the profile screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileStats {
    pub quizzes_taken: usize,
    pub highest_score: u32,
    pub best_percentage: f64,
    pub average_percentage: f64,
}

impl ProfileStats {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_entries(entries: &[LeaderboardEntry]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }
        let highest_score = entries.iter().map(|e| e.record.score()).max().unwrap_or(0);
        let best_percentage = entries
            .iter()
            .map(|e| e.record.percentage())
            .fold(0.0, f64::max);
        let sum: f64 = entries.iter().map(|e| e.record.percentage()).sum();
        Self {
            quizzes_taken: entries.len(),
            highest_score,
            best_percentage,
            average_percentage: sum / entries.len() as f64,
        }
    }
}

/// Read-only leaderboard facade for hosts.
#[derive(Clone)]
pub struct LeaderboardService {
    store: Arc<dyn LeaderboardRepository>,
}

impl LeaderboardService {
    #[must_use]
    pub fn new(store: Arc<dyn LeaderboardRepository>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(storage::repository::Storage::in_memory().leaderboard)
    }

    /// Top `limit` entries, optionally for one subject, ranked from 1.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Storage` on repository failures.
    pub async fn top(
        &self,
        subject: Option<&Subject>,
        limit: u32,
    ) -> Result<Vec<LeaderboardRow>, LeaderboardError> {
        let entries = self.store.list_entries(subject, limit).await?;
        Ok(entries
            .iter()
            .enumerate()
            .map(|(i, entry)| LeaderboardRow::from_entry(i + 1, entry))
            .collect())
    }

    /// # Errors
    ///
    /// Returns `LeaderboardError::Storage` on repository failures.
    pub async fn profile_stats(
        &self,
        subject: Option<&Subject>,
    ) -> Result<ProfileStats, LeaderboardError> {
        let entries = self.store.list_entries(subject, PROFILE_SCAN_LIMIT).await?;
        Ok(ProfileStats::from_entries(&entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::ResultRecord;
    use storage::repository::InMemoryRepository;

    async fn seeded() -> LeaderboardService {
        let repo = InMemoryRepository::new();
        let math = Subject::new("Math").unwrap();
        let art = Subject::new("Art").unwrap();
        let rows = [
            ("m1", &math, 1, 4, 30),
            ("m2", &math, 4, 4, 50),
            ("a1", &art, 2, 2, 10),
        ];
        for (id, subject, score, total, secs) in rows {
            repo.submit(
                &SubmissionId::new(id),
                &ResultRecord::new(subject.clone(), score, total, secs),
            )
            .await
            .unwrap();
        }
        LeaderboardService::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn top_assigns_ranks_from_one() {
        let service = seeded().await;
        let math = Subject::new("Math").unwrap();
        let rows = service.top(Some(&math), 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].id.as_str(), "m2");
        assert!((rows[0].percentage - 100.0).abs() < f64::EPSILON);
        assert!(rows[0].passed);
        assert_eq!(rows[1].rank, 2);
        assert!(!rows[1].passed);
    }

    #[tokio::test]
    async fn profile_stats_summarize_entries() {
        let service = seeded().await;
        let stats = service.profile_stats(None).await.unwrap();
        assert_eq!(stats.quizzes_taken, 3);
        assert_eq!(stats.highest_score, 4);
        assert!((stats.best_percentage - 100.0).abs() < f64::EPSILON);
        assert!((stats.average_percentage - 75.0).abs() < 1e-9);

        let empty = LeaderboardService::in_memory().profile_stats(None).await.unwrap();
        assert_eq!(empty, ProfileStats::default());
    }
}
