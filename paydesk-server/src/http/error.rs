use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::problem::ProblemDetails;

pub type AppResult<T> = Result<T, ApiError>;

/// Failures the edge server answers itself, as problem documents.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An `/api` request reached the edge instead of the backend.
    #[error("{path} is not served by the edge server")]
    NotHosted { path: String },
    #[error("dashboard bundle is missing at {}", index.display())]
    BundleUnavailable { index: PathBuf },
    #[error("request id could not be encoded as a header")]
    InvalidRequestId,
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotHosted { .. } => StatusCode::NOT_FOUND,
            Self::BundleUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidRequestId => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub const fn slug(&self) -> &'static str {
        match self {
            Self::NotHosted { .. } => "not-hosted",
            Self::BundleUnavailable { .. } => "bundle-unavailable",
            Self::InvalidRequestId => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let problem = ProblemDetails::new(self.status(), self.slug(), self.to_string());
        match self {
            Self::NotHosted { path } => problem.at(path).into_response(),
            _ => problem.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CONTENT_TYPE;
    use serde_json::Value;

    #[tokio::test]
    async fn not_hosted_names_the_path() {
        let response = ApiError::NotHosted {
            path: "/api/wallets".into(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "application/problem+json"
        );

        let bytes = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["type"], "https://paydesk.dev/problems/not-hosted");
        assert_eq!(json["instance"], "/api/wallets");
        assert_eq!(json["detail"], "/api/wallets is not served by the edge server");
    }

    #[test]
    fn each_variant_has_its_status() {
        let missing = ApiError::BundleUnavailable {
            index: PathBuf::from("dist/index.html"),
        };
        assert_eq!(missing.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(missing.to_string(), "dashboard bundle is missing at dist/index.html");

        assert_eq!(
            ApiError::InvalidRequestId.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
