use thiserror::Error;

use crate::model::{
    DifficultyError, EvaluationError, InterviewError, QuestionError, ScoreError,
    SubscriptionError, UserError,
};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Interview(#[from] InterviewError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Difficulty(#[from] DifficultyError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Subscription(#[from] SubscriptionError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}
