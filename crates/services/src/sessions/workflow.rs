use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{Question, SessionConfig, Subject, SubmissionKey};
use storage::repository::{LeaderboardRepository, QuestionRepository};

use super::queries::QuestionQueries;
use super::runner::QuizRunner;
use super::submitter::ResultSubmitter;
use crate::error::{LoadFailure, SessionError};

/// Orchestrates question loading and builds live quiz runners.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
    leaderboard: Arc<dyn LeaderboardRepository>,
    shuffle: bool,
    key: SubmissionKey,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        leaderboard: Arc<dyn LeaderboardRepository>,
    ) -> Self {
        Self {
            clock,
            questions,
            leaderboard,
            shuffle: true,
            key: SubmissionKey::default(),
        }
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    #[must_use]
    pub fn with_submission_key(mut self, key: SubmissionKey) -> Self {
        self.key = key;
        self
    }

    #[must_use]
    pub fn submitter(&self) -> ResultSubmitter {
        ResultSubmitter::new(self.clock, Arc::clone(&self.leaderboard)).with_key(self.key)
    }

    /// Resolve the question set for a subject without starting a session.
    ///
    /// # Errors
    ///
    /// Returns `LoadFailure` when the provider fails or has no questions.
    pub async fn fetch_questions(&self, subject: &Subject) -> Result<Vec<Question>, LoadFailure> {
        QuestionQueries::load(self.questions.as_ref(), subject, self.shuffle).await
    }

    /// Load questions for `config.subject()` and start the first countdown.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Load` when no questions could be resolved; the
    /// host decides whether to retry.
    pub async fn start_session(&self, config: SessionConfig) -> Result<QuizRunner, SessionError> {
        let questions = self.fetch_questions(config.subject()).await?;
        let runner = QuizRunner::new(config, self.submitter())?;
        runner.load(questions)?;
        Ok(runner)
    }
}

impl std::fmt::Debug for QuizLoopService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizLoopService")
            .field("shuffle", &self.shuffle)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
