use serde::{Deserialize, Serialize};

use super::{Subject, SubmissionId};

/// Score percentage at or above which an attempt counts as passed.
pub const PASS_THRESHOLD_PERCENT: f64 = 50.0;

/// `score / total` as a percentage. Defined as 0 for an empty quiz.
#[must_use]
pub fn percentage(score: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(score) / f64::from(total) * 100.0
}

/// Whether `score` out of `total` reaches the pass mark. An empty quiz never passes.
#[must_use]
pub fn passes(score: u32, total: u32) -> bool {
    total > 0 && percentage(score, total) >= PASS_THRESHOLD_PERCENT
}

/// Frozen outcome of a completed session, handed to the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    subject: Subject,
    score: u32,
    total: u32,
    time_taken_seconds: u32,
}

impl ResultRecord {
    /// Build a record. `score` is clamped to `total`.
    #[must_use]
    pub fn new(subject: Subject, score: u32, total: u32, time_taken_seconds: u32) -> Self {
        Self {
            subject,
            score: score.min(total),
            total,
            time_taken_seconds,
        }
    }

    #[must_use]
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn time_taken_seconds(&self) -> u32 {
        self.time_taken_seconds
    }

    #[must_use]
    pub fn percentage(&self) -> f64 {
        percentage(self.score, self.total)
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        passes(self.score, self.total)
    }
}

/// A stored leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: SubmissionId,
    pub record: ResultRecord,
}
