//! Remote session endpoints.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shared::{
    auth::Credential,
    models::{LoginRequest, LoginResponse, ValidateSessionResponse},
};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionApiError {
    #[error("session endpoint answered with status {0}")]
    Status(u16),
    #[error("session endpoint unreachable: {0}")]
    Transport(String),
    #[error("unexpected session endpoint response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SessionApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// The authoritative server-side view of a session.
#[cfg_attr(test, mockall::automock)]
#[async_trait(?Send)]
pub trait SessionApi {
    /// Asks whether `credential` is still honoured.
    ///
    /// A `401` or `403` is a definitive "invalid" answer, not an error.
    async fn validate(
        &self,
        credential: &Credential,
    ) -> Result<ValidateSessionResponse, SessionApiError>;

    /// Invalidates `credential` server-side.
    async fn logout(&self, credential: &Credential) -> Result<(), SessionApiError>;

    /// Exchanges an email and password for a credential.
    async fn authenticate(&self, request: &LoginRequest) -> Result<LoginResponse, SessionApiError>;
}

/// [`SessionApi`] over HTTP with a bearer credential.
#[derive(Clone, Debug)]
pub struct HttpSessionApi {
    base_url: String,
    client: Client,
}

impl HttpSessionApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Maps the validation endpoint's status to either a definitive answer, a
/// body still to read (`None`), or an error.
fn validation_status(
    status: StatusCode,
) -> Result<Option<ValidateSessionResponse>, SessionApiError> {
    if status.is_success() {
        Ok(None)
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Ok(Some(ValidateSessionResponse {
            valid: false,
            user: None,
        }))
    } else {
        Err(SessionApiError::Status(status.as_u16()))
    }
}

#[async_trait(?Send)]
impl SessionApi for HttpSessionApi {
    async fn validate(
        &self,
        credential: &Credential,
    ) -> Result<ValidateSessionResponse, SessionApiError> {
        let response = self
            .client
            .get(self.api_url("auth/validate"))
            .bearer_auth(credential.as_str())
            .send()
            .await?;

        match validation_status(response.status())? {
            Some(definitive) => Ok(definitive),
            None => Ok(response.json().await?),
        }
    }

    async fn logout(&self, credential: &Credential) -> Result<(), SessionApiError> {
        let response = self
            .client
            .post(self.api_url("auth/logout"))
            .bearer_auth(credential.as_str())
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(SessionApiError::Status(response.status().as_u16()))
        }
    }

    async fn authenticate(&self, request: &LoginRequest) -> Result<LoginResponse, SessionApiError> {
        let response = self
            .client
            .post(self.api_url("auth/login"))
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_joins_without_double_slashes() {
        let api = HttpSessionApi::new("https://api.paydesk.test/v1/");
        assert_eq!(
            api.api_url("/auth/validate"),
            "https://api.paydesk.test/v1/auth/validate"
        );

        let relative = HttpSessionApi::new("/api");
        assert_eq!(relative.api_url("auth/logout"), "/api/auth/logout");
    }

    #[test]
    fn unauthorized_and_forbidden_are_definitive_invalid() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let answer = validation_status(status).unwrap().unwrap();
            assert!(!answer.valid);
            assert!(answer.user.is_none());
        }
    }

    #[test]
    fn success_means_read_the_body() {
        assert_eq!(validation_status(StatusCode::OK), Ok(None));
    }

    #[test]
    fn server_failures_are_errors_not_answers() {
        assert_eq!(
            validation_status(StatusCode::BAD_GATEWAY),
            Err(SessionApiError::Status(502))
        );
        assert_eq!(
            validation_status(StatusCode::TOO_MANY_REQUESTS),
            Err(SessionApiError::Status(429))
        );
    }
}
