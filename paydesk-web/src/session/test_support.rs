use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use shared::{
    auth::Credential,
    models::{User, UserType},
};

/// A three-segment credential whose payload carries `user_type`.
pub fn credential_for(user_type: &str) -> Credential {
    credential_with_subject(user_type, "usr_1")
}

pub fn credential_with_subject(user_type: &str, subject: &str) -> Credential {
    let payload = format!(r#"{{"user_type":"{user_type}","sub":"{subject}"}}"#);
    Credential::new(format!(
        "{}.{}.sig",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload)
    ))
    .unwrap()
}

pub fn admin_user() -> User {
    User {
        id: "usr_1".to_string(),
        email: "ops@paydesk.test".to_string(),
        name: Some("Ops Admin".to_string()),
        user_type: UserType::Admin,
        avatar_url: None,
    }
}

pub fn merchant_user() -> User {
    User {
        id: "usr_2".to_string(),
        email: "merchant@paydesk.test".to_string(),
        name: None,
        user_type: UserType::Merchant,
        avatar_url: None,
    }
}
