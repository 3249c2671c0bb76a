use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use interview_core::AccessTier;
use interview_core::model::FeatureSet;

use crate::dto::{PaymentRequest, SubscriptionBody};
use crate::{ApiError, AppState, Caller};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumAccessBody {
    pub has_premium_access: bool,
    pub subscription_status: AccessTier,
    pub features: FeatureSet,
}

/// GET /subscriptions
pub async fn current(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<SubscriptionBody>, ApiError> {
    let subscription = state.services.subscriptions().current(caller).await?;
    Ok(Json(SubscriptionBody::from(&subscription)))
}

/// DELETE /subscriptions
pub async fn cancel(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<SubscriptionBody>, ApiError> {
    let subscription = state.services.subscriptions().cancel(caller).await?;
    Ok(Json(SubscriptionBody::from(&subscription)))
}

/// POST /subscriptions/premium
pub async fn purchase_premium(
    State(state): State<AppState>,
    Caller(caller): Caller,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<Json<SubscriptionBody>, ApiError> {
    let Json(req) = payload?;
    let subscription = state
        .services
        .subscriptions()
        .purchase_premium(caller, req.into())
        .await?;
    Ok(Json(SubscriptionBody::from(&subscription)))
}

/// GET /subscriptions/premium-access
pub async fn premium_access(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<PremiumAccessBody>, ApiError> {
    let access = state.services.subscriptions().premium_access(caller).await?;
    Ok(Json(PremiumAccessBody {
        has_premium_access: access.has_premium_access,
        subscription_status: access.tier,
        features: access.features,
    }))
}

pub fn subscription_routes() -> Router<AppState> {
    Router::new()
        .route("/subscriptions", get(current).delete(cancel))
        .route("/subscriptions/premium", post(purchase_premium))
        .route("/subscriptions/premium-access", get(premium_access))
}
