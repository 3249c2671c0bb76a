use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use interview_core::model::UserId;

use crate::error::ApiError;

pub const CALLER_HEADER: &str = "x-user-id";

/// Authenticated caller, taken from the `x-user-id` header set by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthenticated)?;
        raw.trim()
            .parse::<UserId>()
            .map(Caller)
            .map_err(|_| ApiError::Unauthenticated)
    }
}

/// Parse an id taken from the request path.
pub(crate) fn path_id<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, ApiError> {
    raw.parse::<T>()
        .map_err(|_| ApiError::bad_request(format!("invalid {what} id: {raw}")))
}
