mod evaluation;
mod ids;
mod interview;
mod level;
mod question;
mod response;
pub mod score;
mod subscription;
mod user;

pub use ids::{
    EvaluationId, InterviewId, ParseIdError, QuestionId, ResponseId, SubscriptionId, UserId,
};
pub use level::{DifficultyError, InterviewLevel, Language, QuestionDifficulty};
pub use score::{Score, ScoreError};

pub use evaluation::{AccessLevel, Evaluation, EvaluationError};
pub use interview::{
    Interview, InterviewDraft, InterviewError, InterviewKind, InterviewStatus, PersistedInterview,
};
pub use question::{
    DEFAULT_CATEGORY, DEFAULT_TIME_LIMIT_SECS, Question, QuestionDraft, QuestionError,
    build_questions,
};
pub use response::{
    Assessment, Response, ResponseAnalysis, ResponseDraft, ResponseUpdate,
    SCORING_UNAVAILABLE_FEEDBACK,
};
pub use subscription::{
    FeatureSet, PaymentReceipt, Plan, Subscription, SubscriptionError, SubscriptionStatus,
};
pub use user::{User, UserDraft, UserError};
