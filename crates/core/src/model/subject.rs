use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Subject used when the host does not name one.
pub const DEFAULT_SUBJECT: &str = "General";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubjectError {
    #[error("subject name is empty")]
    Empty,
}

/// Name of a question set, e.g. `"Science"`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Subject(String);

impl Subject {
    /// # Errors
    ///
    /// Returns `SubjectError::Empty` if the trimmed name is empty.
    pub fn new(name: impl AsRef<str>) -> Result<Self, SubjectError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(SubjectError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Subject {
    fn default() -> Self {
        Self(DEFAULT_SUBJECT.to_owned())
    }
}

impl TryFrom<String> for Subject {
    type Error = SubjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Subject> for String {
    fn from(subject: Subject) -> Self {
        subject.0
    }
}

impl fmt::Debug for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subject({})", self.0)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
