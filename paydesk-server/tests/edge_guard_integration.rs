//! End-to-end checks of the edge server router built from a configuration file.

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use paydesk_server::{server::create_app_router, telemetry::metrics_handle};
use serial_test::serial;
use shared::config::server::Config;
use std::{io::Write, sync::Arc};
use tempfile::TempDir;
use tower::ServiceExt;

fn credential(payload: &str) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload)
    )
}

/// Writes a dashboard bundle and a YAML file that renames the cookie and the
/// login surface.
fn configured() -> (TempDir, Arc<Config>) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>shell</html>").unwrap();

    let config_path = dir.path().join("paydesk.yaml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    write!(
        file,
        "profile: test\n\
         guard:\n  cookie_name: pd_session\n  login_path: /signin\n  exempt_prefixes: [\"/pkg\"]\n\
         web:\n  static_dir: {dir}\n  spa_index: {dir}/index.html\n",
        dir = dir.path().display()
    )
    .unwrap();

    let config = Config::load_config(Some(config_path), Some(8088)).unwrap();
    (dir, Arc::new(config))
}

async fn send(
    config: &Arc<Config>,
    path: &str,
    cookie: Option<String>,
) -> axum::response::Response {
    let mut builder = Request::builder().uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    create_app_router(config.clone(), metrics_handle())
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
#[serial]
async fn configured_cookie_and_login_path_are_honoured() {
    let (_dir, config) = configured();
    assert_eq!(config.server.port, 8088);

    let admin = credential(r#"{"user_type":"admin"}"#);

    // The default cookie name is no longer read.
    let response = send(&config, "/dashboard", Some(format!("auth_token={admin}"))).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/signin");

    let response = send(&config, "/dashboard", Some(format!("pd_session={admin}"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"<html>shell</html>");
}

#[tokio::test]
#[serial]
async fn custom_login_path_is_exempt_even_when_not_listed() {
    let (_dir, config) = configured();
    let response = send(&config, "/signin", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[serial]
async fn replaced_exempt_list_gates_previous_defaults() {
    let (_dir, config) = configured();

    let response = send(&config, "/assets/app.css", None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let response = send(&config, "/pkg/paydesk_web.js", None).await;
    assert_ne!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
#[serial]
async fn non_admin_claims_are_redirected() {
    let (_dir, config) = configured();
    for payload in [
        r#"{"user_type":"merchant"}"#,
        r#"{"user_type":"Admin"}"#,
        r#"{"user_type":true}"#,
        r#"["admin"]"#,
    ] {
        let cookie = format!("pd_session={}", credential(payload));
        let response = send(&config, "/settings", Some(cookie)).await;
        assert_eq!(
            response.status(),
            StatusCode::TEMPORARY_REDIRECT,
            "{payload} should be denied"
        );
    }
}
