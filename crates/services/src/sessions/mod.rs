mod countdown;
mod progress;
mod queries;
mod runner;
mod service;
mod submitter;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::{LoadFailure, SessionError, SubmitFailure};
pub use countdown::{Countdown, TICK_PERIOD};
pub use progress::SessionProgress;
pub use runner::{QuizRunner, SubmitNotice};
pub use service::{Advance, QuestionKey, QuestionTicket, QuizSession, Tick};
pub use submitter::{ResultSubmitter, SubmissionReceipt};
pub use view::{LeaderboardRow, LeaderboardService, ProfileStats};
pub use workflow::QuizLoopService;
