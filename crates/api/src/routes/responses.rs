use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use interview_core::model::{InterviewId, ResponseDraft, ResponseId, ResponseUpdate};

use crate::caller::path_id;
use crate::dto::{InterviewBody, ResponseBody, SubmitResponseRequest, UpdateResponseRequest};
use crate::{ApiError, AppState, Caller};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedBody {
    pub response: ResponseBody,
    pub interview: InterviewBody,
}

/// POST /responses
pub async fn submit(
    State(state): State<AppState>,
    Caller(caller): Caller,
    payload: Result<Json<SubmitResponseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmittedBody>), ApiError> {
    let Json(req) = payload?;
    let draft = ResponseDraft {
        question_id: req.question_id,
        interview_id: req.interview_id,
        text: req.response_text,
        audio_url: req.response_audio,
        duration_secs: req.duration,
    };
    let (response, interview) = state.services.responses().submit(caller, draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(SubmittedBody {
            response: ResponseBody::from(&response),
            interview: InterviewBody::from(&interview),
        }),
    ))
}

/// GET /responses/interview/:id
pub async fn list_for_interview(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(raw_id): Path<String>,
) -> Result<Json<Vec<ResponseBody>>, ApiError> {
    let id: InterviewId = path_id(&raw_id, "interview")?;
    let responses = state
        .services
        .responses()
        .list_for_interview(caller, id)
        .await?;
    Ok(Json(responses.iter().map(ResponseBody::from).collect()))
}

/// GET /responses/:id
pub async fn get_one(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(raw_id): Path<String>,
) -> Result<Json<ResponseBody>, ApiError> {
    let id: ResponseId = path_id(&raw_id, "response")?;
    let response = state.services.responses().get(caller, id).await?;
    Ok(Json(ResponseBody::from(&response)))
}

/// PUT /responses/:id
pub async fn update(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateResponseRequest>, JsonRejection>,
) -> Result<Json<ResponseBody>, ApiError> {
    let id: ResponseId = path_id(&raw_id, "response")?;
    let Json(req) = payload?;
    let update = ResponseUpdate {
        text: req.response_text,
        audio_url: req.response_audio,
        duration_secs: req.duration,
    };
    let response = state.services.responses().update(caller, id, update).await?;
    Ok(Json(ResponseBody::from(&response)))
}

pub fn response_routes() -> Router<AppState> {
    Router::new()
        .route("/responses", post(submit))
        .route("/responses/interview/:id", get(list_for_interview))
        .route("/responses/:id", get(get_one).put(update))
}
