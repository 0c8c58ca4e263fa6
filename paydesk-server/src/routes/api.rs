//! The `/api` prefix belongs to the backend. Requests that reach the edge
//! server anyway get a problem document instead of the SPA shell.

use axum::{Router, extract::OriginalUri, response::IntoResponse, routing::any};

use crate::http::error::ApiError;

async fn api_not_hosted(OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    ApiError::NotHosted {
        path: uri.path().to_string(),
    }
}

pub fn create_api_fallback_router() -> Router {
    Router::new()
        .route("/api", any(api_not_hosted))
        .route("/api/{*rest}", any(api_not_hosted))
}
