//! Bearer credential codec.
//!
//! A credential is a three-segment signed token (`header.payload.signature`).
//! Only the payload is ever inspected, and only for the `user_type` claim.
//! Signatures are not verified here: this is a shape and claim check, the
//! authoritative check lives behind the remote validation endpoint.

use std::fmt;

use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Claim value that marks a credential as admin-capable.
pub const ADMIN_USER_TYPE: &str = "admin";

const SEGMENT_COUNT: usize = 3;

// Payloads arrive URL-safe and usually unpadded; they are translated to the
// standard alphabet first, so padding must be optional.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Reasons a credential could not be decoded.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential must have {SEGMENT_COUNT} segments, found {0}")]
    SegmentCount(usize),
    #[error("credential payload is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("credential payload is not a JSON object: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Decoded payload of a credential.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CredentialClaims {
    fields: Map<String, Value>,
}

impl CredentialClaims {
    /// Decodes the payload segment of `token`.
    ///
    /// # Errors
    /// Returns a [`CredentialError`] when the token does not have exactly three
    /// segments, the payload is not base64, or it is not a JSON object.
    pub fn decode(token: &str) -> Result<Self, CredentialError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != SEGMENT_COUNT {
            return Err(CredentialError::SegmentCount(segments.len()));
        }

        let normalized: String = segments[1]
            .chars()
            .map(|c| match c {
                '-' => '+',
                '_' => '/',
                other => other,
            })
            .collect();
        let bytes = PAYLOAD_ENGINE.decode(normalized.as_bytes())?;
        let fields: Map<String, Value> = serde_json::from_slice(&bytes)?;

        Ok(Self { fields })
    }

    /// The `user_type` claim, when present and a string.
    #[must_use]
    pub fn user_type(&self) -> Option<&str> {
        self.fields.get("user_type").and_then(Value::as_str)
    }

    /// Looks up an arbitrary claim.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user_type() == Some(ADMIN_USER_TYPE)
    }
}

/// An opaque bearer credential.
///
/// `Debug` output is redacted so credentials never end up in logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw token, rejecting blank input.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decodes the payload claims.
    ///
    /// # Errors
    /// See [`CredentialClaims::decode`].
    pub fn claims(&self) -> Result<CredentialClaims, CredentialError> {
        CredentialClaims::decode(&self.0)
    }

    /// True when the payload decodes and carries `user_type: "admin"`.
    #[must_use]
    pub fn is_admin_shaped(&self) -> bool {
        is_admin_credential(&self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"<redacted>").finish()
    }
}

/// Binary admin decision for a raw token. Every decoding failure is a denial.
#[must_use]
pub fn is_admin_credential(token: &str) -> bool {
    CredentialClaims::decode(token).is_ok_and(|claims| claims.is_admin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};

    fn token_with_payload(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn admin_payload_is_admin() {
        let token = token_with_payload(r#"{"user_type":"admin","sub":"42"}"#);
        let claims = CredentialClaims::decode(&token).unwrap();
        assert_eq!(claims.user_type(), Some("admin"));
        assert_eq!(claims.get("sub"), Some(&Value::from("42")));
        assert!(claims.is_admin());
        assert!(is_admin_credential(&token));
    }

    #[test]
    fn non_admin_user_type_is_rejected() {
        assert!(!is_admin_credential(&token_with_payload(
            r#"{"user_type":"user"}"#
        )));
        assert!(!is_admin_credential(&token_with_payload(
            r#"{"user_type":"Admin"}"#
        )));
        assert!(!is_admin_credential(&token_with_payload(r#"{"user_type":1}"#)));
        assert!(!is_admin_credential(&token_with_payload(r#"{"sub":"42"}"#)));
    }

    #[test]
    fn wrong_segment_counts_fail() {
        for token in ["abc", "a.b", "a.b.c.d", ""] {
            let err = CredentialClaims::decode(token).unwrap_err();
            assert!(matches!(err, CredentialError::SegmentCount(n) if n != 3));
        }
    }

    #[test]
    fn undecodable_payload_fails() {
        let err = CredentialClaims::decode("header.!!!not-base64!!!.sig").unwrap_err();
        assert!(matches!(err, CredentialError::Encoding(_)));
    }

    #[test]
    fn non_json_payload_fails() {
        let token = token_with_payload("definitely not json");
        let err = CredentialClaims::decode(&token).unwrap_err();
        assert!(matches!(err, CredentialError::Payload(_)));

        let array = token_with_payload(r#"["user_type","admin"]"#);
        assert!(matches!(
            CredentialClaims::decode(&array).unwrap_err(),
            CredentialError::Payload(_)
        ));
    }

    #[test]
    fn url_safe_characters_are_translated() {
        let payload = r#"{"user_type":"admin","note":"??>>"}"#;
        let url_safe = URL_SAFE_NO_PAD.encode(payload);
        assert!(url_safe.contains('_') || url_safe.contains('-'));
        let token = format!("h.{url_safe}.s");
        assert!(is_admin_credential(&token));
    }

    #[test]
    fn padded_standard_payload_is_accepted() {
        let token = format!("h.{}.s", STANDARD.encode(r#"{"user_type":"admin"}"#));
        assert!(is_admin_credential(&token));
    }

    #[test]
    fn credential_rejects_blank_and_redacts_debug() {
        assert!(Credential::new("").is_none());
        assert!(Credential::new("   ").is_none());

        let credential = Credential::new("secret.token.value").unwrap();
        assert_eq!(credential.as_str(), "secret.token.value");
        let debug = format!("{credential:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn credential_serializes_as_plain_string() {
        let credential = Credential::new("a.b.c").unwrap();
        assert_eq!(serde_json::to_string(&credential).unwrap(), r#""a.b.c""#);
        assert!(!credential.is_admin_shaped());
    }
}
