//! Route-level request validation and ownership checks, driven through the
//! router with `tower::ServiceExt` so the full extractor/handler path runs.
//!
//! Everything here stays off the chain: validation failures reject before
//! any RPC call is made.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

use wage_server::config::Config;
use wage_server::routes::create_routes;
use wage_server::services::ProverService;
use wage_server::state::AppState;

fn test_state() -> AppState {
    let mut config = Config::default();
    config.dev_mode = true;
    config
        .vaults
        .insert("vault-a".to_string(), "0x39de0f00189306062d79edec6dca5bb6bfd108f9".to_string());
    let prover = ProverService::mock(2, Duration::from_secs(5));
    AppState::with_prover(config, prover)
}

fn app(state: &AppState) -> Router {
    create_routes(state.clone())
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    user_id: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = user_id {
        builder = builder.header("x-user-id", id);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_user(state: &AppState, email: &str) -> String {
    let (status, body) = send(
        app(state),
        Method::POST,
        "/api/v1/users",
        None,
        Some(json!({ "email": email })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

fn wage_group_body() -> Value {
    json!({
        "name": "engineering",
        "start_date": "2031-06-01",
        "payment_day": 15,
        "yield_source": "vault-a",
        "payees": [{ "email": "alice@example.com", "monthly_amount": 1200.0 }],
    })
}

#[tokio::test]
async fn health_is_open() {
    let state = test_state();
    let (status, body) = send(app(&state), Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["dev_mode"], true);
}

#[tokio::test]
async fn wage_group_requires_identity() {
    let state = test_state();
    let (status, body) = send(
        app(&state),
        Method::POST,
        "/api/v1/wage-groups",
        None,
        Some(wage_group_body()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn unknown_identity_is_unauthorized() {
    let state = test_state();
    let (status, _) = send(
        app(&state),
        Method::GET,
        "/api/v1/wage-groups",
        Some("5bb50b5e-0000-0000-0000-000000000000"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wage_group_roundtrip() {
    let state = test_state();
    let user = create_user(&state, "boss@example.com").await;

    let (status, created) = send(
        app(&state),
        Method::POST,
        "/api/v1/wage-groups",
        Some(&user),
        Some(wage_group_body()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "engineering");
    assert_eq!(created["payees"][0]["email"], "alice@example.com");

    let (status, listed) = send(
        app(&state),
        Method::GET,
        "/api/v1/wage-groups",
        Some(&user),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], created["id"]);
}

#[tokio::test]
async fn wage_group_validation_rejections() {
    let state = test_state();
    let user = create_user(&state, "boss@example.com").await;

    let cases = vec![
        // past start date
        (
            json!({ "name": "g", "start_date": "2020-01-01", "payment_day": 15,
                    "payees": [{ "email": "a@b.com", "monthly_amount": 1.0 }] }),
            "Start date must be in the future",
        ),
        // payment day out of range
        (
            json!({ "name": "g", "start_date": "2031-06-01", "payment_day": 32,
                    "payees": [{ "email": "a@b.com", "monthly_amount": 1.0 }] }),
            "Payment day must be between 1 and 31",
        ),
        // invalid email
        (
            json!({ "name": "g", "start_date": "2031-06-01", "payment_day": 15,
                    "payees": [{ "email": "nope", "monthly_amount": 1.0 }] }),
            "Invalid email format",
        ),
        // non-positive amount
        (
            json!({ "name": "g", "start_date": "2031-06-01", "payment_day": 15,
                    "payees": [{ "email": "a@b.com", "monthly_amount": 0.0 }] }),
            "Monthly amount must be greater than 0",
        ),
        // unknown yield source
        (
            json!({ "name": "g", "start_date": "2031-06-01", "payment_day": 15,
                    "yield_source": "mystery",
                    "payees": [{ "email": "a@b.com", "monthly_amount": 1.0 }] }),
            "Invalid yield source",
        ),
        // no payees
        (
            json!({ "name": "g", "start_date": "2031-06-01", "payment_day": 15, "payees": [] }),
            "Missing required fields",
        ),
    ];

    for (body, expected) in cases {
        let (status, response) = send(
            app(&state),
            Method::POST,
            "/api/v1/wage-groups",
            Some(&user),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{expected}");
        assert_eq!(response["code"], "VALIDATION_FAILED");
        assert_eq!(response["message"], expected);
    }
}

#[tokio::test]
async fn foreign_wage_group_is_not_found() {
    let state = test_state();
    let owner = create_user(&state, "owner@example.com").await;
    let intruder = create_user(&state, "intruder@example.com").await;

    let (_, created) = send(
        app(&state),
        Method::POST,
        "/api/v1/wage-groups",
        Some(&owner),
        Some(wage_group_body()),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(
        app(&state),
        Method::DELETE,
        &format!("/api/v1/wage-groups/{id}"),
        Some(&intruder),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn deposit_validation_rejections() {
    let state = test_state();
    let user = create_user(&state, "boss@example.com").await;

    // Unknown wage group -> 404, before any chain work.
    let (status, _) = send(
        app(&state),
        Method::POST,
        "/api/v1/deposits",
        Some(&user),
        Some(json!({
            "wage_group_id": "5bb50b5e-0000-0000-0000-000000000001",
            "address": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
            "amount": 100.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Bad amount -> 400.
    let (status, body) = send(
        app(&state),
        Method::POST,
        "/api/v1/deposits",
        Some(&user),
        Some(json!({
            "wage_group_id": "5bb50b5e-0000-0000-0000-000000000001",
            "address": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
            "amount": -5.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Amount must be greater than 0");

    // Bad address -> 400.
    let (status, _) = send(
        app(&state),
        Method::POST,
        "/api/v1/deposits",
        Some(&user),
        Some(json!({
            "wage_group_id": "5bb50b5e-0000-0000-0000-000000000001",
            "address": "not-an-address",
            "amount": 5.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn faucet_enforces_the_cap() {
    let state = test_state();
    let (status, body) = send(
        app(&state),
        Method::POST,
        "/api/v1/faucet",
        None,
        Some(json!({
            "address": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
            "amount": 5000,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn registration_status_for_unknown_wallet_is_unregistered() {
    let state = test_state();
    let (status, body) = send(
        app(&state),
        Method::GET,
        "/api/v1/users/registration-status?address=0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["registered"], false);

    let (status, _) = send(
        app(&state),
        Method::GET,
        "/api/v1/users/registration-status",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dev_mode_register_mocks_the_proof_and_skips_the_chain() {
    let state = test_state();
    let user = create_user(&state, "boss@example.com").await;

    let (status, body) = send(
        app(&state),
        Method::POST,
        "/api/v1/register",
        Some(&user),
        Some(json!({
            "address": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
            "signature": format!("0x{}", "ab".repeat(65)),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["registered"], false);
    assert_eq!(body["strategy"], "dev-mode");
    assert!(body["tx_hash"].is_null());
    // Public key and hash are real decimal field elements even in dev mode.
    let pk_x = body["public_key"][0].as_str().unwrap();
    assert!(num_bigint::BigUint::parse_bytes(pk_x.as_bytes(), 10).is_some());

    // The record landed in the store.
    let (status, status_body) = send(
        app(&state),
        Method::GET,
        "/api/v1/register",
        Some(&user),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(status_body["registered"], true);
}

#[tokio::test]
async fn register_rejects_bad_inputs() {
    let state = test_state();
    let user = create_user(&state, "boss@example.com").await;

    // Bad address.
    let (status, _) = send(
        app(&state),
        Method::POST,
        "/api/v1/register",
        Some(&user),
        Some(json!({ "address": "bogus", "signature": format!("0x{}", "ab".repeat(65)) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Short signature.
    let (status, body) = send(
        app(&state),
        Method::POST,
        "/api/v1/register",
        Some(&user),
        Some(json!({
            "address": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
            "signature": "0x1234",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn proof_endpoint_returns_signals_in_verifier_order() {
    let state = test_state();
    let (status, body) = send(
        app(&state),
        Method::POST,
        "/api/v1/proofs",
        None,
        Some(json!({
            "address": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
            "signature": format!("0x{}", "cd".repeat(65)),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let signals = body["public_signals"].as_array().unwrap();
    assert_eq!(signals.len(), 5);
    // signals[4] is the registration hash.
    assert_eq!(signals[4], body["registration_hash"]);
}

#[tokio::test]
async fn duplicate_user_email_conflicts() {
    let state = test_state();
    create_user(&state, "dup@example.com").await;
    let (status, body) = send(
        app(&state),
        Method::POST,
        "/api/v1/users",
        None,
        Some(json!({ "email": "dup@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn artifact_traversal_is_rejected() {
    let state = test_state();
    let (status, _) = send(
        app(&state),
        Method::GET,
        "/api/v1/artifacts/..%2F..%2Fetc%2Fpasswd",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
