use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fewest answer options a question may carry.
pub const MIN_OPTIONS: usize = 2;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt is empty")]
    EmptyPrompt,

    #[error("question needs at least {MIN_OPTIONS} options, got {len}")]
    TooFewOptions { len: usize },

    #[error("correct option {index} is out of range for {len} options")]
    CorrectOutOfRange { index: usize, len: usize },
}

/// A single multiple-choice question. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRaw", into = "QuestionRaw")]
pub struct Question {
    prompt: String,
    options: Vec<String>,
    correct_option: usize,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, there are fewer than
    /// [`MIN_OPTIONS`] options, or `correct_option` does not index into `options`.
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_option: usize,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if options.len() < MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions { len: options.len() });
        }
        if correct_option >= options.len() {
            return Err(QuestionError::CorrectOutOfRange {
                index: correct_option,
                len: options.len(),
            });
        }
        Ok(Self {
            prompt,
            options,
            correct_option,
        })
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_option(&self) -> usize {
        self.correct_option
    }

    #[must_use]
    pub fn has_option(&self, index: usize) -> bool {
        index < self.options.len()
    }

    #[must_use]
    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_option
    }
}

/// Wire shape used by document stores: `{ question, options, correctAnswer }`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionRaw {
    question: String,
    options: Vec<String>,
    correct_answer: usize,
}

impl TryFrom<QuestionRaw> for Question {
    type Error = QuestionError;

    fn try_from(raw: QuestionRaw) -> Result<Self, Self::Error> {
        Question::new(raw.question, raw.options, raw.correct_answer)
    }
}

impl From<Question> for QuestionRaw {
    fn from(q: Question) -> Self {
        Self {
            question: q.prompt,
            options: q.options,
            correct_answer: q.correct_option,
        }
    }
}
