use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use interview_core::AccessTier;
use interview_core::model::{Language, UserDraft};
use services::ServiceError;

use crate::dto::{RegisterRequest, SubscriptionBody, UserBody};
use crate::{ApiError, AppState, Caller};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredBody {
    pub user: UserBody,
    pub subscription: SubscriptionBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileBody {
    pub user: UserBody,
    pub tier: AccessTier,
    pub subscription: Option<SubscriptionBody>,
}

/// POST /users
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisteredBody>), ApiError> {
    let Json(req) = payload?;
    let language = req
        .language
        .as_deref()
        .map(str::parse::<Language>)
        .transpose()
        .map_err(ServiceError::from)?;
    let draft = UserDraft {
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
        profession: req.profession,
        language,
    };
    let (user, subscription) = state.services.accounts().register(draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisteredBody {
            user: UserBody::from(&user),
            subscription: SubscriptionBody::from(&subscription),
        }),
    ))
}

/// GET /users/me
pub async fn me(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<ProfileBody>, ApiError> {
    let access = state.services.accounts().profile(caller).await?;
    Ok(Json(ProfileBody {
        user: UserBody::from(&access.user),
        tier: access.tier,
        subscription: access.subscription.as_ref().map(SubscriptionBody::from),
    }))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/me", get(me))
}
