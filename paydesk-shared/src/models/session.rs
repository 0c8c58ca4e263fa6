use serde::{Deserialize, Serialize};

use super::User;
use crate::auth::Credential;

/// Response of the remote session validation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidateSessionResponse {
    /// Whether the server still honours the credential.
    pub valid: bool,

    /// Fresh copy of the account, when the server sends one.
    #[serde(default)]
    pub user: Option<User>,
}

/// Credentials submitted from the login surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful sign-in: the credential and the account it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub token: Credential,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserType;
    use serde_json::json;

    #[test]
    fn validation_without_user_defaults_to_none() {
        let response: ValidateSessionResponse =
            serde_json::from_value(json!({ "valid": false })).unwrap();
        assert!(!response.valid);
        assert!(response.user.is_none());
    }

    #[test]
    fn validation_with_user_parses_user() {
        let response: ValidateSessionResponse = serde_json::from_value(json!({
            "valid": true,
            "user": { "id": "usr_1", "email": "a@paydesk.test", "user_type": "admin" }
        }))
        .unwrap();
        assert!(response.valid);
        assert_eq!(response.user.unwrap().user_type, UserType::Admin);
    }

    #[test]
    fn login_response_carries_raw_token() {
        let response: LoginResponse = serde_json::from_value(json!({
            "token": "h.p.s",
            "user": { "id": "usr_1", "email": "a@paydesk.test", "user_type": "admin" }
        }))
        .unwrap();
        assert_eq!(response.token.as_str(), "h.p.s");
    }
}
