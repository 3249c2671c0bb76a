use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use interview_core::model::EvaluationId;

use crate::caller::path_id;
use crate::dto::{CreateEvaluationRequest, EvaluationBody, PaymentRequest};
use crate::{ApiError, AppState, Caller};

/// POST /evaluations
pub async fn create(
    State(state): State<AppState>,
    Caller(caller): Caller,
    payload: Result<Json<CreateEvaluationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EvaluationBody>), ApiError> {
    let Json(req) = payload?;
    let view = state
        .services
        .evaluations()
        .create(caller, req.interview_id)
        .await?;
    Ok((StatusCode::CREATED, Json(EvaluationBody::from(&view))))
}

/// GET /evaluations
pub async fn list(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<Vec<EvaluationBody>>, ApiError> {
    let views = state.services.evaluations().list(caller).await?;
    Ok(Json(views.iter().map(EvaluationBody::from).collect()))
}

/// GET /evaluations/:id
pub async fn get_one(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(raw_id): Path<String>,
) -> Result<Json<EvaluationBody>, ApiError> {
    let id: EvaluationId = path_id(&raw_id, "evaluation")?;
    let view = state.services.evaluations().get(caller, id).await?;
    Ok(Json(EvaluationBody::from(&view)))
}

/// POST /evaluations/:id/unlock
///
/// Premium callers may send an empty body; everyone else must include the
/// approved payment identifiers.
pub async fn unlock(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(raw_id): Path<String>,
    payload: Option<Json<PaymentRequest>>,
) -> Result<Json<EvaluationBody>, ApiError> {
    let id: EvaluationId = path_id(&raw_id, "evaluation")?;
    let authorization = payload.map(|Json(req)| req.into());
    let view = state
        .services
        .evaluations()
        .unlock(caller, id, authorization)
        .await?;
    Ok(Json(EvaluationBody::from(&view)))
}

pub fn evaluation_routes() -> Router<AppState> {
    Router::new()
        .route("/evaluations", post(create).get(list))
        .route("/evaluations/:id", get(get_one))
        .route("/evaluations/:id/unlock", post(unlock))
}
