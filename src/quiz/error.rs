use thiserror::Error;

/// Outcomes of an answer submission that leave the session untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no answer option was selected")]
    InvalidSelection,
    #[error("there is no question waiting for an answer")]
    NoActiveQuestion,
    #[error("the quiz is already complete")]
    SessionComplete,
}

/// Reasons the trivia provider could not hand out a question.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TriviaError {
    #[error("trivia request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("trivia provider answered with response code {0}")]
    ResponseCode(u8),
    #[error("trivia provider returned no questions")]
    Empty,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
