//! # Auth
//!
//! Credential handling shared by the edge route guard and the browser session
//! store. Both layers redirect to the same login surface.

pub mod credential;

pub use credential::{ADMIN_USER_TYPE, Credential, CredentialClaims, CredentialError};

/// Path of the login surface every failed check redirects to.
pub const LOGIN_PATH: &str = "/login";

/// Name of the cookie carrying the bearer credential.
pub const DEFAULT_CREDENTIAL_COOKIE: &str = "auth_token";

/// Whether `path` is `prefix` itself or sits below it on a segment boundary.
/// `/assets` covers `/assets/app.css` but not `/assetsx`.
#[must_use]
pub fn path_is_under(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::path_is_under;

    #[test]
    fn prefixes_stop_at_segment_boundaries() {
        assert!(path_is_under("/login", "/login"));
        assert!(path_is_under("/login/reset", "/login"));
        assert!(path_is_under("/pkg/app.js", "/pkg/"));
        assert!(path_is_under("/favicon.ico", "/favicon.ico"));
        assert!(!path_is_under("/loginx", "/login"));
        assert!(!path_is_under("/apiary", "/api"));
        assert!(!path_is_under("/dashboard", "/login"));
    }
}
