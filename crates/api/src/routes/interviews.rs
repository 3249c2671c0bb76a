use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};

use interview_core::model::{
    InterviewDraft, InterviewId, InterviewLevel, InterviewStatus, Language, QuestionDraft,
};
use services::ServiceError;
use services::ai::GenerationRequest;

use crate::caller::path_id;
use crate::dto::{
    CreateInterviewRequest, GenerateQuestionsRequest, InterviewBody, ProposedQuestionBody,
    QuestionBody, ResponseBody, StatusRequest,
};
use crate::{ApiError, AppState, Caller};

const DEFAULT_GENERATED_COUNT: u32 = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewDetailBody {
    pub interview: InterviewBody,
    pub questions: Vec<QuestionBody>,
    pub responses: Vec<ResponseBody>,
}

fn parse_level(raw: Option<&str>) -> Result<Option<InterviewLevel>, ServiceError> {
    Ok(raw.map(str::parse::<InterviewLevel>).transpose()?)
}

fn parse_language(raw: Option<&str>) -> Result<Option<Language>, ServiceError> {
    Ok(raw.map(str::parse::<Language>).transpose()?)
}

/// POST /interviews
pub async fn create(
    State(state): State<AppState>,
    Caller(caller): Caller,
    payload: Result<Json<CreateInterviewRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<InterviewDetailBody>), ApiError> {
    let Json(req) = payload?;
    let draft = InterviewDraft {
        title: req.title,
        profession: req.profession,
        kind: req.kind,
        level: parse_level(req.difficulty.as_deref())?,
        language: parse_language(req.language.as_deref())?,
    };
    let questions: Vec<QuestionDraft> = req.questions.into_iter().map(Into::into).collect();

    let (interview, questions) = state
        .services
        .interviews()
        .create(caller, draft, questions)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(InterviewDetailBody {
            interview: InterviewBody::from(&interview),
            questions: questions.iter().map(QuestionBody::from).collect(),
            responses: Vec::new(),
        }),
    ))
}

/// GET /interviews
pub async fn list(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<Vec<InterviewBody>>, ApiError> {
    let interviews = state.services.interviews().list(caller).await?;
    Ok(Json(interviews.iter().map(InterviewBody::from).collect()))
}

/// GET /interviews/:id
pub async fn get_one(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(raw_id): Path<String>,
) -> Result<Json<InterviewDetailBody>, ApiError> {
    let id: InterviewId = path_id(&raw_id, "interview")?;
    let detail = state.services.interviews().get(caller, id).await?;
    Ok(Json(InterviewDetailBody {
        interview: InterviewBody::from(&detail.interview),
        questions: detail.questions.iter().map(QuestionBody::from).collect(),
        responses: detail.responses.iter().map(ResponseBody::from).collect(),
    }))
}

/// PUT /interviews/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(raw_id): Path<String>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<InterviewBody>, ApiError> {
    let id: InterviewId = path_id(&raw_id, "interview")?;
    let Json(req) = payload?;
    let status = req
        .status
        .trim()
        .parse::<InterviewStatus>()
        .map_err(ServiceError::from)?;
    let interview = state
        .services
        .interviews()
        .update_status(caller, id, status)
        .await?;
    Ok(Json(InterviewBody::from(&interview)))
}

/// DELETE /interviews/:id
pub async fn delete(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id: InterviewId = path_id(&raw_id, "interview")?;
    state.services.interviews().delete(caller, id).await?;
    Ok(Json(json!({ "message": "interview deleted", "id": id })))
}

/// POST /interviews/generate-questions
pub async fn generate_questions(
    State(state): State<AppState>,
    Caller(caller): Caller,
    payload: Result<Json<GenerateQuestionsRequest>, JsonRejection>,
) -> Result<Json<Vec<ProposedQuestionBody>>, ApiError> {
    let Json(req) = payload?;
    let request = GenerationRequest {
        profession: req.profession,
        level: parse_level(req.difficulty.as_deref())?.unwrap_or_default(),
        language: parse_language(req.language.as_deref())?.unwrap_or_default(),
        count: req.count.unwrap_or(DEFAULT_GENERATED_COUNT),
    };
    let drafts = state
        .services
        .interviews()
        .generate_questions(caller, request)
        .await?;
    Ok(Json(drafts.into_iter().map(ProposedQuestionBody::from).collect()))
}

pub fn interview_routes() -> Router<AppState> {
    Router::new()
        .route("/interviews", post(create).get(list))
        .route("/interviews/generate-questions", post(generate_questions))
        .route("/interviews/:id", get(get_one).delete(delete))
        .route("/interviews/:id/status", put(update_status))
}
