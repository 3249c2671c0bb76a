use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use interview_core::model::{InterviewId, QuestionDifficulty};
use interview_core::stats::{DifficultyBucket, QuestionStats, TrendPoint, UserStats};
use services::InterviewReport;

use crate::caller::path_id;
use crate::dto::InterviewBody;
use crate::{ApiError, AppState, Caller};

/// Per-interview report. Breakdown fields are omitted for callers without
/// detailed-statistics access.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewReportBody {
    pub interview: InterviewBody,
    pub detailed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_breakdown: Option<BTreeMap<QuestionDifficulty, DifficultyBucket>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_breakdown: Option<Vec<QuestionStats>>,
}

impl From<InterviewReport> for InterviewReportBody {
    fn from(report: InterviewReport) -> Self {
        let (difficulty_breakdown, question_breakdown) = match report.breakdown {
            Some(b) => (Some(b.by_difficulty), Some(b.questions)),
            None => (None, None),
        };
        Self {
            interview: InterviewBody::from(&report.interview),
            detailed: difficulty_breakdown.is_some(),
            difficulty_breakdown,
            question_breakdown,
        }
    }
}

/// GET /stats
pub async fn overview(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<UserStats>, ApiError> {
    Ok(Json(state.services.stats().user_stats(caller).await?))
}

/// GET /stats/interview/:id
pub async fn interview_report(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(raw_id): Path<String>,
) -> Result<Json<InterviewReportBody>, ApiError> {
    let id: InterviewId = path_id(&raw_id, "interview")?;
    let report = state.services.stats().interview_report(caller, id).await?;
    Ok(Json(InterviewReportBody::from(report)))
}

/// GET /stats/interview/:id/report
///
/// Downloadable report; refused with 403 unless the caller is premium.
pub async fn download_report(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(raw_id): Path<String>,
) -> Result<Json<InterviewReportBody>, ApiError> {
    let id: InterviewId = path_id(&raw_id, "interview")?;
    let report = state.services.stats().download_report(caller, id).await?;
    Ok(Json(InterviewReportBody::from(report)))
}

/// GET /stats/trends
pub async fn trends(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<Vec<TrendPoint>>, ApiError> {
    Ok(Json(state.services.stats().trends(caller).await?))
}

pub fn stats_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(overview))
        .route("/stats/interview/:id", get(interview_report))
        .route("/stats/interview/:id/report", get(download_report))
        .route("/stats/trends", get(trends))
}
