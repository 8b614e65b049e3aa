use rand::rng;
use rand::seq::SliceRandom;

use quiz_core::model::{Question, Subject};
use storage::repository::QuestionRepository;
use tracing::{debug, warn};

use crate::error::LoadFailure;

/// Storage-backed question set resolution.
pub(crate) struct QuestionQueries;

impl QuestionQueries {
    /// Fetch the question set for `subject`, shuffled when requested.
    ///
    /// # Errors
    ///
    /// Returns `LoadFailure::Source` when the provider fails and
    /// `LoadFailure::Empty` when it has nothing for the subject.
    pub async fn load(
        questions: &dyn QuestionRepository,
        subject: &Subject,
        shuffle: bool,
    ) -> Result<Vec<Question>, LoadFailure> {
        let mut set = questions.fetch_questions(subject).await.map_err(|e| {
            warn!(%subject, error = %e, "question source unavailable");
            LoadFailure::Source(e)
        })?;

        if set.is_empty() {
            return Err(LoadFailure::Empty {
                subject: subject.clone(),
            });
        }

        if shuffle {
            set.shuffle(&mut rng());
        }
        debug!(%subject, count = set.len(), shuffle, "question set resolved");
        Ok(set)
    }
}
