use std::sync::Arc;

use axum::{
    Extension, Router,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use serde::Serialize;
use shared::config::server::Config;
use tracing::warn;

use crate::http::error::{ApiError, AppResult};

#[derive(Serialize)]
struct HealthResponse<'a> {
    status: &'a str,
}

fn record_check(endpoint: &'static str, status: &'static str) {
    metrics::counter!(
        "health_checks_total",
        "endpoint" => endpoint,
        "status" => status
    )
    .increment(1);
}

async fn healthz() -> impl IntoResponse {
    record_check("healthz", "ok");
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// Ready once the SPA bundle the server falls back to is on disk.
async fn readyz(Extension(config): Extension<Arc<Config>>) -> AppResult<impl IntoResponse> {
    let index = &config.web.spa_index;
    let present = tokio::fs::metadata(index)
        .await
        .is_ok_and(|meta| meta.is_file());
    if !present {
        warn!(index = %index.display(), "spa index is not available");
        record_check("readyz", "error");
        return Err(ApiError::BundleUnavailable {
            index: index.clone(),
        });
    }

    record_check("readyz", "ok");
    Ok((StatusCode::OK, Json(HealthResponse { status: "ready" })))
}

pub fn create_health_router() -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
}
