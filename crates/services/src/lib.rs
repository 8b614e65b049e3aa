#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;

pub use quiz_core::Clock;

pub use error::{LeaderboardError, LoadFailure, SessionError, SubmitFailure};
pub use sessions::{
    Advance, LeaderboardRow, LeaderboardService, ProfileStats, QuestionKey, QuizLoopService,
    QuizRunner, QuizSession, ResultSubmitter, SessionProgress, SubmissionReceipt, SubmitNotice,
};
