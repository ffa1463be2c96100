//! Circuit artifact serving
//!
//! Provers fetch the compiled circuit artifacts over HTTP. Artifacts never
//! change for a deployed circuit, hence the year-long cache.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::path::Component;

use super::error;
use crate::state::AppState;
use crate::types::ErrorCode;

/// Create artifact routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/artifacts/*path", get(serve_artifact))
}

fn content_type_for(name: &str) -> &'static str {
    if name.ends_with(".json") {
        "application/json"
    } else if name.ends_with(".wasm") {
        "application/wasm"
    } else {
        "application/octet-stream"
    }
}

/// Serve a file from the artifacts directory
/// GET /api/v1/artifacts/{*path}
async fn serve_artifact(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    // Only plain relative components; anything else walks out of the dir.
    let relative = std::path::Path::new(&path);
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return error(StatusCode::NOT_FOUND, ErrorCode::NotFound, "File not found")
            .into_response();
    }

    let full_path = state.config().artifacts_dir.join(relative);
    match tokio::fs::read(&full_path).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type_for(&path)),
                (header::CACHE_CONTROL, "public, max-age=31536000"),
            ],
            bytes,
        )
            .into_response(),
        Err(_) => {
            error(StatusCode::NOT_FOUND, ErrorCode::NotFound, "File not found").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type_for("registration.vk"), "application/octet-stream");
        assert_eq!(content_type_for("circuit.wasm"), "application/wasm");
        assert_eq!(content_type_for("vkey.json"), "application/json");
    }
}
