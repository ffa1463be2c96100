//! Wage group CRUD
//!
//! Validation mirrors what the product promises employers: future start
//! dates, a real day-of-month, positive amounts, and a yield source that is
//! actually configured.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use chrono::{Datelike, NaiveDate, Utc};
use uuid::Uuid;

use super::{error, Identity};
use crate::config::Config;
use crate::state::AppState;
use crate::store::WageGroupDraft;
use crate::types::{ErrorCode, WageGroupRequest};

/// Create wage group routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wage-groups", get(list_wage_groups).post(create_wage_group))
        .route(
            "/wage-groups/:id",
            put(update_wage_group).delete(delete_wage_group),
        )
}

/// Plain structural email check; delivery problems surface later anyway.
pub(crate) fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@')
}

/// Validate a request into a persistable draft, or explain what is wrong.
pub(crate) fn validate_draft(
    request: &WageGroupRequest,
    config: &Config,
    today: NaiveDate,
) -> Result<WageGroupDraft, String> {
    if request.name.trim().is_empty() {
        return Err("Missing required fields".to_string());
    }
    if request.payees.is_empty() {
        return Err("Missing required fields".to_string());
    }
    if request.start_date <= today {
        return Err("Start date must be in the future".to_string());
    }
    if !(1..=31).contains(&request.payment_day) {
        return Err("Payment day must be between 1 and 31".to_string());
    }

    // The first payment falls on the payment day of the start month, or the
    // next month when that day has already passed (or does not exist).
    let first_payment = payment_date_in_month(
        request.start_date.year(),
        request.start_date.month(),
        request.payment_day,
    );
    let first_in_future = first_payment.map_or(false, |d| d > today);
    if !first_in_future {
        let (next_year, next_month) = if request.start_date.month() == 12 {
            (request.start_date.year() + 1, 1)
        } else {
            (request.start_date.year(), request.start_date.month() + 1)
        };
        let next = payment_date_in_month(next_year, next_month, request.payment_day);
        if !next.map_or(false, |d| d > today) {
            return Err("First payment date must be in the future".to_string());
        }
    }

    for payee in &request.payees {
        if payee.email.is_empty() {
            return Err("Each payee must have email and monthly amount".to_string());
        }
        if !is_valid_email(&payee.email) {
            return Err("Invalid email format".to_string());
        }
        if payee.monthly_amount <= 0.0 {
            return Err("Monthly amount must be greater than 0".to_string());
        }
    }

    if let Some(source) = &request.yield_source {
        if config.vault_address(source).is_none() {
            return Err("Invalid yield source".to_string());
        }
    }

    Ok(WageGroupDraft {
        name: request.name.clone(),
        start_date: request.start_date,
        payment_day: request.payment_day,
        yield_source: request.yield_source.clone(),
        payees: request
            .payees
            .iter()
            .map(|p| (p.email.clone(), p.monthly_amount))
            .collect(),
    })
}

fn payment_date_in_month(year: i32, month: u32, day: u8) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day as u32)
}

/// Create a wage group
/// POST /api/v1/wage-groups
async fn create_wage_group(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<WageGroupRequest>,
) -> Response {
    let today = Utc::now().date_naive();
    let draft = match validate_draft(&request, state.config(), today) {
        Ok(draft) => draft,
        Err(message) => {
            return error(StatusCode::BAD_REQUEST, ErrorCode::ValidationFailed, message)
                .into_response()
        }
    };

    let group = state.store().create_wage_group(identity.0.id, draft).await;
    (StatusCode::CREATED, Json(group)).into_response()
}

/// List the caller's wage groups
/// GET /api/v1/wage-groups
async fn list_wage_groups(State(state): State<AppState>, identity: Identity) -> impl IntoResponse {
    let groups = state.store().list_wage_groups(identity.0.id).await;
    (StatusCode::OK, Json(groups))
}

/// Replace a wage group
/// PUT /api/v1/wage-groups/{id}
async fn update_wage_group(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(request): Json<WageGroupRequest>,
) -> Response {
    let today = Utc::now().date_naive();
    let draft = match validate_draft(&request, state.config(), today) {
        Ok(draft) => draft,
        Err(message) => {
            return error(StatusCode::BAD_REQUEST, ErrorCode::ValidationFailed, message)
                .into_response()
        }
    };

    match state
        .store()
        .update_wage_group(identity.0.id, id, draft)
        .await
    {
        Ok(group) => (StatusCode::OK, Json(group)).into_response(),
        Err(_) => error(
            StatusCode::NOT_FOUND,
            ErrorCode::NotFound,
            "Wage group not found",
        )
        .into_response(),
    }
}

/// Delete a wage group
/// DELETE /api/v1/wage-groups/{id}
async fn delete_wage_group(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Response {
    match state.store().delete_wage_group(identity.0.id, id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "Wage group deleted" })),
        )
            .into_response(),
        Err(_) => error(
            StatusCode::NOT_FOUND,
            ErrorCode::NotFound,
            "Wage group not found",
        )
        .into_response(),
    }
}
