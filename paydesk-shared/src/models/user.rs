use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

use crate::auth::ADMIN_USER_TYPE;

/// Account type carried by both the user record and the credential's
/// `user_type` claim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserType {
    Admin,
    Merchant,
    User,
    /// Any value this build does not know about. Never admin.
    Other(String),
}

impl UserType {
    /// Return the canonical string representation used on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => ADMIN_USER_TYPE,
            Self::Merchant => "merchant",
            Self::User => "user",
            Self::Other(value) => value,
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value {
            ADMIN_USER_TYPE => Self::Admin,
            "merchant" => Self::Merchant,
            "user" => Self::User,
            other => Self::Other(other.to_string()),
        })
    }
}

impl Serialize for UserType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UserType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let Ok(parsed) = raw.parse::<Self>();
        Ok(parsed)
    }
}

/// Dashboard account cached alongside the credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Unique identifier for the account.
    pub id: String,

    /// The account's email address.
    pub email: String,

    /// Display name, when the account has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Role used for the admin decision.
    pub user_type: UserType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl User {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.user_type.is_admin()
    }

    /// Name to show in the dashboard chrome, falling back to the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}
