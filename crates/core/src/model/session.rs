use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Question, Subject, passes, percentage};

/// Seconds allowed per question unless configured otherwise.
pub const DEFAULT_PER_QUESTION_SECONDS: u32 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionConfigError {
    #[error("per-question time must be greater than zero")]
    ZeroSeconds,
}

/// Inputs for one quiz attempt. Reused unchanged by every retake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    subject: Subject,
    per_question_seconds: u32,
}

impl SessionConfig {
    #[must_use]
    pub fn new(subject: Subject) -> Self {
        Self {
            subject,
            per_question_seconds: DEFAULT_PER_QUESTION_SECONDS,
        }
    }

    /// # Errors
    ///
    /// Returns `SessionConfigError::ZeroSeconds` if `seconds` is 0.
    pub fn with_per_question_seconds(mut self, seconds: u32) -> Result<Self, SessionConfigError> {
        if seconds == 0 {
            return Err(SessionConfigError::ZeroSeconds);
        }
        self.per_question_seconds = seconds;
        Ok(self)
    }

    #[must_use]
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    #[must_use]
    pub fn per_question_seconds(&self) -> u32 {
        self.per_question_seconds
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(Subject::default())
    }
}

/// Top-level lifecycle of a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Loading,
    Active,
    Completed,
}

/// Render-ready snapshot of a session, emitted after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub current_index: usize,
    pub total: usize,
    pub selected_option: Option<usize>,
    pub remaining_seconds: u32,
    pub score: u32,
    pub elapsed_seconds: u32,
    pub submitted: bool,
    /// 1 for the first attempt, incremented by every restart.
    pub attempt: u32,
    pub current_question: Option<Question>,
}

impl SessionState {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Completed
    }

    #[must_use]
    pub fn percentage(&self) -> f64 {
        percentage(self.score, self.total_u32())
    }

    /// Pass verdict of a finished attempt; `false` while still playing.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.is_complete() && passes(self.score, self.total_u32())
    }

    fn total_u32(&self) -> u32 {
        u32::try_from(self.total).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_seconds_is_rejected() {
        let err = SessionConfig::default()
            .with_per_question_seconds(0)
            .unwrap_err();
        assert_eq!(err, SessionConfigError::ZeroSeconds);
        assert_eq!(
            SessionConfig::default().per_question_seconds(),
            DEFAULT_PER_QUESTION_SECONDS
        );
    }

    fn state(phase: SessionPhase, score: u32, total: usize) -> SessionState {
        SessionState {
            phase,
            current_index: total,
            total,
            selected_option: None,
            remaining_seconds: 0,
            score,
            elapsed_seconds: 0,
            submitted: false,
            attempt: 1,
            current_question: None,
        }
    }

    #[test]
    fn passed_only_for_completed_attempts_at_the_mark() {
        assert!(state(SessionPhase::Completed, 2, 4).passed());
        assert!(!state(SessionPhase::Completed, 1, 4).passed());
        assert!(!state(SessionPhase::Active, 4, 4).passed());
        assert!(!state(SessionPhase::Completed, 0, 0).passed());
    }
}
