use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{ResultRecord, SubmissionId, SubmissionKey};
use storage::repository::LeaderboardRepository;
use tracing::{info, warn};

use crate::error::SubmitFailure;

/// Proof that a result reached the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub id: SubmissionId,
    pub record: ResultRecord,
}

/// Writes completed results to the leaderboard store.
///
/// One call is one write attempt: no retries here. The at-most-once guard
/// lives in the session (`QuizSession::claim_submission`).
#[derive(Clone)]
pub struct ResultSubmitter {
    clock: Clock,
    store: Arc<dyn LeaderboardRepository>,
    key: SubmissionKey,
}

impl ResultSubmitter {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn LeaderboardRepository>) -> Self {
        Self {
            clock,
            store,
            key: SubmissionKey::default(),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: SubmissionKey) -> Self {
        self.key = key;
        self
    }

    /// Key the next submission of `record` would be written under.
    #[must_use]
    pub fn next_id(&self, record: &ResultRecord) -> SubmissionId {
        self.key.generate(record.subject(), self.clock.now())
    }

    /// Persist `record` under a freshly generated key.
    ///
    /// # Errors
    ///
    /// Returns `SubmitFailure::Rejected` if the store refuses the write or is unreachable.
    pub async fn submit(&self, record: &ResultRecord) -> Result<SubmissionReceipt, SubmitFailure> {
        let id = self.next_id(record);
        match self.store.submit(&id, record).await {
            Ok(()) => {
                info!(%id, score = record.score(), total = record.total(), "result saved to leaderboard");
                Ok(SubmissionReceipt {
                    id,
                    record: record.clone(),
                })
            }
            Err(source) => {
                warn!(%id, error = %source, "failed to save result to leaderboard");
                Err(SubmitFailure::Rejected { id, source })
            }
        }
    }
}

impl std::fmt::Debug for ResultSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSubmitter")
            .field("clock", &self.clock)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
