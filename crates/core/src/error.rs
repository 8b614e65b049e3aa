use thiserror::Error;

use crate::model::{QuestionError, SessionConfigError, SubjectError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    SessionConfig(#[from] SessionConfigError),
    #[error(transparent)]
    Subject(#[from] SubjectError),
}
