use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::Subject;

/// Leaderboard document key for one submitted attempt.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(String);

impl SubmissionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubmissionId({})", self.0)
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How leaderboard keys are generated for a finished attempt.
///
/// `SubjectTime` keys are `"<subject>-<unix millis>"`. Two retakes finished
/// within the same millisecond collide; stores reject the second write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmissionKey {
    #[default]
    SubjectTime,
    Random,
}

impl SubmissionKey {
    #[must_use]
    pub fn generate(self, subject: &Subject, now: DateTime<Utc>) -> SubmissionId {
        match self {
            SubmissionKey::SubjectTime => {
                SubmissionId(format!("{subject}-{}", now.timestamp_millis()))
            }
            SubmissionKey::Random => SubmissionId(format!("{subject}-{}", Uuid::new_v4())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseKeyError {
    raw: String,
}

impl fmt::Display for ParseKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown submission key strategy `{}` (expected subject-time or random)",
            self.raw
        )
    }
}

impl std::error::Error for ParseKeyError {}

impl FromStr for SubmissionKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "subject-time" => Ok(Self::SubjectTime),
            "random" => Ok(Self::Random),
            other => Err(ParseKeyError {
                raw: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn subject_time_key_uses_millis() {
        let subject = Subject::new("Math").unwrap();
        let id = SubmissionKey::SubjectTime.generate(&subject, fixed_now());
        assert_eq!(id.as_str(), "Math-1700000000000");
    }

    #[test]
    fn random_keys_differ_at_same_instant() {
        let subject = Subject::new("Math").unwrap();
        let a = SubmissionKey::Random.generate(&subject, fixed_now());
        let b = SubmissionKey::Random.generate(&subject, fixed_now());
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("Math-"));
    }

    #[test]
    fn parses_strategy_names() {
        assert_eq!("random".parse::<SubmissionKey>(), Ok(SubmissionKey::Random));
        assert_eq!(
            "subject-time".parse::<SubmissionKey>(),
            Ok(SubmissionKey::SubjectTime)
        );
        assert!("uuid".parse::<SubmissionKey>().is_err());
    }
}
