//! Wire shapes (camelCase JSON) for requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use interview_core::AccessTier;
use interview_core::model::{
    AccessLevel, EvaluationId, FeatureSet, Interview, InterviewId, InterviewKind, InterviewLevel,
    InterviewStatus, Language, Plan, Question, QuestionDifficulty, QuestionDraft, QuestionId,
    Response, ResponseAnalysis, ResponseId, Subscription, SubscriptionId, SubscriptionStatus,
    User, UserId,
};
use interview_core::stats::InterviewStatistics;
use services::EvaluationView;
use services::payment::PaymentAuthorization;

//
// ─── REQUESTS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub profession: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    #[serde(alias = "question", alias = "questionText")]
    pub text: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    #[serde(alias = "timeLimit")]
    pub time_limit_secs: Option<u32>,
    pub audio_url: Option<String>,
}

impl From<QuestionInput> for QuestionDraft {
    fn from(input: QuestionInput) -> Self {
        QuestionDraft {
            text: input.text,
            category: input.category,
            difficulty: input.difficulty,
            time_limit_secs: input.time_limit_secs,
            audio_url: input.audio_url,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInterviewRequest {
    pub title: String,
    pub profession: String,
    #[serde(rename = "type", default)]
    pub kind: InterviewKind,
    pub difficulty: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionInput>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionsRequest {
    pub profession: String,
    pub difficulty: Option<String>,
    pub language: Option<String>,
    pub count: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponseRequest {
    pub question_id: QuestionId,
    pub interview_id: InterviewId,
    pub response_text: Option<String>,
    pub response_audio: Option<String>,
    pub duration: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponseRequest {
    pub response_text: Option<String>,
    pub response_audio: Option<String>,
    pub duration: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub payment_id: String,
    pub payer_id: String,
}

impl From<PaymentRequest> for PaymentAuthorization {
    fn from(req: PaymentRequest) -> Self {
        PaymentAuthorization {
            payment_id: req.payment_id,
            payer_id: req.payer_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvaluationRequest {
    pub interview_id: InterviewId,
}

//
// ─── RESPONSES ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBody {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub profession: String,
    pub language: Language,
    pub subscription_status: AccessTier,
    pub free_trial_end_date: DateTime<Utc>,
    pub subscription_id: Option<SubscriptionId>,
    pub interviews: Vec<InterviewId>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserBody {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            profession: user.profession.clone(),
            language: user.language,
            subscription_status: user.subscription_status,
            free_trial_end_date: user.free_trial_end_date,
            subscription_id: user.subscription_id,
            interviews: user.interviews.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionBody {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub renewal_date: Option<DateTime<Utc>>,
    pub price: f64,
    pub currency: String,
    pub features: FeatureSet,
}

impl From<&Subscription> for SubscriptionBody {
    fn from(sub: &Subscription) -> Self {
        Self {
            id: sub.id,
            user_id: sub.user_id,
            plan: sub.plan,
            status: sub.status,
            start_date: sub.start_date,
            end_date: sub.end_date,
            renewal_date: sub.renewal_date,
            price: sub.price,
            currency: sub.currency.clone(),
            features: sub.features,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewBody {
    pub id: InterviewId,
    pub user_id: UserId,
    pub title: String,
    pub profession: String,
    #[serde(rename = "type")]
    pub kind: InterviewKind,
    pub difficulty: InterviewLevel,
    pub language: Language,
    pub status: InterviewStatus,
    pub duration: u32,
    pub questions: Vec<QuestionId>,
    pub current_question_index: u32,
    pub total_score: u8,
    pub feedback: String,
    pub statistics: InterviewStatistics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Interview> for InterviewBody {
    fn from(i: &Interview) -> Self {
        Self {
            id: i.id(),
            user_id: i.user_id(),
            title: i.title().to_string(),
            profession: i.profession().to_string(),
            kind: i.kind(),
            difficulty: i.level(),
            language: i.language(),
            status: i.status(),
            duration: i.duration_secs(),
            questions: i.questions().to_vec(),
            current_question_index: i.current_question_index(),
            total_score: i.total_score().value(),
            feedback: i.feedback().to_string(),
            statistics: i.statistics(),
            created_at: i.created_at(),
            updated_at: i.updated_at(),
            completed_at: i.completed_at(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBody {
    pub id: QuestionId,
    pub interview_id: InterviewId,
    pub question_text: String,
    pub audio_url: Option<String>,
    pub order: u32,
    pub category: String,
    pub difficulty: QuestionDifficulty,
    pub time_limit: u32,
    pub responses: Vec<ResponseId>,
}

impl From<&Question> for QuestionBody {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            interview_id: q.interview_id,
            question_text: q.text.clone(),
            audio_url: q.audio_url.clone(),
            order: q.order,
            category: q.category.clone(),
            difficulty: q.difficulty,
            time_limit: q.time_limit_secs,
            responses: q.responses.clone(),
        }
    }
}

/// Question proposal returned by generation; not yet attached to an interview.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedQuestionBody {
    pub question: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
}

impl From<QuestionDraft> for ProposedQuestionBody {
    fn from(d: QuestionDraft) -> Self {
        Self {
            question: d.text,
            category: d.category,
            difficulty: d.difficulty,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    pub id: ResponseId,
    pub question_id: QuestionId,
    pub interview_id: InterviewId,
    pub response_text: String,
    pub response_audio: Option<String>,
    pub duration: u32,
    pub score: u8,
    pub feedback: String,
    pub confidence: u8,
    pub analysis: ResponseAnalysis,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Response> for ResponseBody {
    fn from(r: &Response) -> Self {
        Self {
            id: r.id,
            question_id: r.question_id,
            interview_id: r.interview_id,
            response_text: r.text.clone(),
            response_audio: r.audio_url.clone(),
            duration: r.duration_secs,
            score: r.score.value(),
            feedback: r.feedback.clone(),
            confidence: r.confidence.value(),
            analysis: r.analysis.clone(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationBody {
    pub id: EvaluationId,
    pub interview_id: InterviewId,
    pub user_id: UserId,
    pub overall_score: u8,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub detailed_feedback: String,
    pub is_paid: bool,
    pub access_level: AccessLevel,
    pub detail_visible: bool,
    pub requires_payment: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&EvaluationView> for EvaluationBody {
    fn from(view: &EvaluationView) -> Self {
        let e = &view.evaluation;
        Self {
            id: e.id,
            interview_id: e.interview_id,
            user_id: e.user_id,
            overall_score: e.overall_score.value(),
            strengths: e.strengths.clone(),
            weaknesses: e.weaknesses.clone(),
            recommendations: e.recommendations.clone(),
            detailed_feedback: e.detailed_feedback.clone(),
            is_paid: e.is_paid,
            access_level: e.access_level,
            detail_visible: view.detail_visible,
            requires_payment: !view.detail_visible && e.requires_payment(),
            created_at: e.created_at,
        }
    }
}
