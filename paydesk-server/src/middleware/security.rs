use std::fs;

use crate::http::error::AppResult;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, header},
    middleware::Next,
    response::Response,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256};
use shared::config::server::{Config, DEFAULT_CONTENT_SECURITY_POLICY};
use tracing::{debug, warn};

#[derive(Clone)]
pub struct SecurityHeadersState {
    hsts: Option<HeaderValue>,
    content_security_policy: HeaderValue,
}

impl SecurityHeadersState {
    /// Builds the header set. When inline script hashing is on, the SPA index
    /// is read once here; a bundle rebuilt later needs a restart.
    pub fn from_config(config: &Config) -> Self {
        let hsts_config = &config.security.hsts;
        let hsts = hsts_config.enabled.then(|| {
            let mut directives = vec![format!("max-age={}", hsts_config.max_age_seconds)];
            if hsts_config.include_subdomains {
                directives.push("includeSubDomains".into());
            }
            if hsts_config.preload {
                directives.push("preload".into());
            }
            HeaderValue::from_str(&directives.join("; "))
                .unwrap_or_else(|_| HeaderValue::from_static("max-age=63072000"))
        });

        let hashes = if config.security.hash_inline_scripts {
            match fs::read_to_string(&config.web.spa_index) {
                Ok(html) => inline_script_hashes(&html),
                Err(err) => {
                    debug!(error = %err, "spa index unreadable; no inline script hashes");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let policy = with_script_sources(&config.security.content_security_policy, &hashes);
        let content_security_policy = HeaderValue::from_str(&policy).unwrap_or_else(|err| {
            warn!(error = %err, "configured content security policy is not a valid header");
            HeaderValue::from_static(DEFAULT_CONTENT_SECURITY_POLICY)
        });

        Self {
            hsts,
            content_security_policy,
        }
    }
}

/// `'sha256-...'` sources for every inline `<script>` body in `html`.
/// Scripts loaded through `src` are covered by `'self'` and skipped.
pub fn inline_script_hashes(html: &str) -> Vec<String> {
    const OPEN: &str = "<script";
    const CLOSE: &str = "</script>";

    let mut hashes = Vec::new();
    let mut rest = html;
    while let Some(start) = rest.find(OPEN) {
        let tag = &rest[start + OPEN.len()..];
        let Some(tag_end) = tag.find('>') else { break };
        let attributes = &tag[..tag_end];
        let body = &tag[tag_end + 1..];
        let Some(body_end) = body.find(CLOSE) else { break };

        let is_external = attributes
            .split_whitespace()
            .any(|attribute| attribute.starts_with("src="));
        let script = &body[..body_end];
        if !is_external && !script.trim().is_empty() {
            let digest = Sha256::digest(script.as_bytes());
            hashes.push(format!("'sha256-{}'", STANDARD.encode(digest)));
        }

        rest = &body[body_end + CLOSE.len()..];
    }
    hashes
}

/// Appends `sources` to the `script-src` directive, adding one when the
/// policy has none.
fn with_script_sources(policy: &str, sources: &[String]) -> String {
    if sources.is_empty() {
        return policy.trim().to_string();
    }

    let extra = sources.join(" ");
    let mut directives: Vec<String> = policy
        .split(';')
        .map(str::trim)
        .filter(|directive| !directive.is_empty())
        .map(str::to_string)
        .collect();

    match directives
        .iter_mut()
        .find(|directive| directive.split_whitespace().next() == Some("script-src"))
    {
        Some(directive) => {
            directive.push(' ');
            directive.push_str(&extra);
        }
        None => directives.push(format!("script-src 'self' {extra}")),
    }

    directives.join("; ")
}

/// Adds the baseline hardening headers to every response, redirects included.
pub async fn apply_security_headers(
    State(state): State<SecurityHeadersState>,
    request: Request<Body>,
    next: Next,
) -> AppResult<Response> {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    if let Some(hsts) = state.hsts {
        headers.insert(header::STRICT_TRANSPORT_SECURITY, hsts);
    }

    headers
        .entry(header::X_CONTENT_TYPE_OPTIONS)
        .or_insert_with(|| HeaderValue::from_static("nosniff"));
    headers
        .entry(header::X_FRAME_OPTIONS)
        .or_insert_with(|| HeaderValue::from_static("DENY"));
    headers
        .entry(header::REFERRER_POLICY)
        .or_insert_with(|| HeaderValue::from_static("same-origin"));
    headers
        .entry(header::CONTENT_SECURITY_POLICY)
        .or_insert_with(|| state.content_security_policy.clone());

    Ok(response)
}
