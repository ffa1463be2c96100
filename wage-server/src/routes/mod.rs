//! HTTP Routes for the WageRail server
//!
//! Route handlers validate, delegate to services, and map errors to the
//! conventional JSON error body. Caller identity arrives as an `x-user-id`
//! header injected by the authenticating proxy in front of the server; the
//! only check here is that the user exists.

pub mod artifacts;
pub mod deposits;
pub mod faucet;
pub mod health;
pub mod register;
pub mod users;
pub mod wage_groups;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::{Json, Router};
use uuid::Uuid;

use crate::state::AppState;
use crate::store::User;
use crate::types::{ErrorCode, ErrorResponse};

/// Create all routes
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .nest("/api/v1", api_routes())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(register::routes())
        .merge(users::routes())
        .merge(wage_groups::routes())
        .merge(deposits::routes())
        .merge(faucet::routes())
        .merge(artifacts::routes())
}

/// Standard error reply.
pub(crate) fn error(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (status, Json(ErrorResponse::new(code, message)))
}

fn unauthorized() -> (StatusCode, Json<ErrorResponse>) {
    error(
        StatusCode::UNAUTHORIZED,
        ErrorCode::Unauthorized,
        "Unauthorized",
    )
}

/// The authenticated caller, resolved from the `x-user-id` header.
pub struct Identity(pub User);

#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(unauthorized)?;
        let id = Uuid::parse_str(raw).map_err(|_| unauthorized())?;
        let user = state.store().get_user(id).await.ok_or_else(unauthorized)?;
        Ok(Identity(user))
    }
}
