//! Edge route guard.
//!
//! Runs before any page is served and redirects every request that lacks an
//! admin-shaped credential cookie to the login surface. The check is purely
//! structural: the payload is decoded and its `user_type` claim trusted at
//! face value. Signature verification is the remote validation endpoint's
//! job, not this layer's.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use cookie::Cookie;
use shared::{
    auth::{CredentialClaims, path_is_under},
    config::server::Config,
};
use tracing::{debug, instrument};

use crate::middleware::request_context::RequestContext;

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    MissingCookie,
    Malformed,
    NotAdmin,
}

impl DenyReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingCookie => "missing_cookie",
            Self::Malformed => "malformed_credential",
            Self::NotAdmin => "not_admin",
        }
    }
}

/// Outcome of evaluating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The path is never gated.
    Exempt,
    /// The credential carries `user_type: "admin"`.
    Allow { subject: Option<String> },
    Deny(DenyReason),
}

impl GuardDecision {
    const fn outcome(&self) -> &'static str {
        match self {
            Self::Exempt => "exempt",
            Self::Allow { .. } => "allow",
            Self::Deny(reason) => reason.as_str(),
        }
    }
}

/// Immutable guard settings shared by every request.
#[derive(Clone, Debug)]
pub struct EdgeGuardState {
    cookie_name: Arc<str>,
    login_path: Arc<str>,
    exempt_prefixes: Arc<[String]>,
}

impl EdgeGuardState {
    /// Builds the guard. The login path is always exempt, whether or not it is
    /// listed, so a denial can never redirect into another denial.
    pub fn new(
        cookie_name: impl Into<String>,
        login_path: impl Into<String>,
        exempt_prefixes: impl IntoIterator<Item = String>,
    ) -> Self {
        let login_path = login_path.into();
        let mut prefixes: Vec<String> = exempt_prefixes.into_iter().collect();
        if !prefixes.iter().any(|prefix| path_is_under(&login_path, prefix)) {
            prefixes.push(login_path.clone());
        }

        Self {
            cookie_name: cookie_name.into().into(),
            login_path: login_path.into(),
            exempt_prefixes: prefixes.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.guard.cookie_name.clone(),
            config.guard.login_path.clone(),
            config.guard.exempt_prefixes.iter().cloned(),
        )
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Prefixes match whole segments only. A path with a `.` or `..` segment
    /// is never exempt, since it may resolve outside the prefix it starts with.
    #[must_use]
    pub fn is_exempt(&self, path: &str) -> bool {
        !has_dot_segment(path)
            && self
                .exempt_prefixes
                .iter()
                .any(|prefix| path_is_under(path, prefix))
    }

    /// Decides a request from its path and the raw credential cookie value.
    #[must_use]
    pub fn evaluate(&self, path: &str, credential: Option<&str>) -> GuardDecision {
        if self.is_exempt(path) {
            return GuardDecision::Exempt;
        }

        let Some(token) = credential else {
            return GuardDecision::Deny(DenyReason::MissingCookie);
        };

        match CredentialClaims::decode(token) {
            Ok(claims) if claims.is_admin() => GuardDecision::Allow {
                subject: claims
                    .get("sub")
                    .and_then(|value| value.as_str())
                    .map(str::to_string),
            },
            Ok(_) => GuardDecision::Deny(DenyReason::NotAdmin),
            Err(err) => {
                debug!(error = %err, "credential cookie could not be decoded");
                GuardDecision::Deny(DenyReason::Malformed)
            }
        }
    }
}

/// Middleware that redirects non-admin traffic to the login surface.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn enforce_admin_credential(
    State(state): State<EdgeGuardState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let credential = extract_cookie(request.headers(), &state.cookie_name);
    let decision = state.evaluate(request.uri().path(), credential.as_deref());

    metrics::counter!("edge_guard_decisions_total", "outcome" => decision.outcome())
        .increment(1);

    match decision {
        GuardDecision::Exempt => next.run(request).await,
        GuardDecision::Allow { subject } => {
            if let Some(context) = request.extensions_mut().get_mut::<RequestContext>() {
                context.subject = subject;
            }
            next.run(request).await
        }
        GuardDecision::Deny(reason) => {
            debug!(reason = reason.as_str(), "redirecting to login");
            Redirect::temporary(&state.login_path).into_response()
        }
    }
}

fn has_dot_segment(path: &str) -> bool {
    path.split('/').any(|segment| {
        let segment = segment.to_ascii_lowercase().replace("%2e", ".");
        segment == "." || segment == ".."
    })
}

fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value))
        .flatten()
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}
