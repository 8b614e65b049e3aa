mod ids;
mod question;
mod result;
mod session;
mod subject;

pub use ids::{ParseKeyError, SubmissionId, SubmissionKey};
pub use question::{Question, QuestionError, MIN_OPTIONS};
pub use result::{LeaderboardEntry, PASS_THRESHOLD_PERCENT, ResultRecord, passes, percentage};
pub use session::{
    DEFAULT_PER_QUESTION_SECONDS, SessionConfig, SessionConfigError, SessionPhase, SessionState,
};
pub use subject::{DEFAULT_SUBJECT, Subject, SubjectError};
