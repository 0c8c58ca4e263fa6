use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use axum::{Extension, Router, routing::get, serve};
use metrics_exporter_prometheus::PrometheusHandle;
use shared::config::server::Config;
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{error, info, warn};

use crate::{
    middleware::{
        edge_guard::{self, EdgeGuardState},
        request_context::{self, RequestIdState},
        security::{self, SecurityHeadersState},
    },
    routes,
    telemetry::{self, metrics_endpoint},
    tracer,
};

/// Creates the static file service for the dashboard bundle.
///
/// Unknown paths fall back to the SPA index so client-side routes resolve.
pub fn create_static_service(static_dir: PathBuf, spa_index: PathBuf) -> Router {
    Router::new().fallback_service(
        ServeDir::new(static_dir)
            .append_index_html_on_directories(true)
            .fallback(ServeFile::new(spa_index)),
    )
}

/// Creates the main application router.
///
/// Page traffic goes through the edge guard. Health, readiness and metrics
/// endpoints are merged outside it so probes never need a credential.
pub fn create_app_router(config: Arc<Config>, metrics_handle: PrometheusHandle) -> Router {
    let guard_state = EdgeGuardState::from_config(&config);
    let request_id_state = RequestIdState::from_config(&config);
    let security_state = SecurityHeadersState::from_config(&config);

    let static_files =
        create_static_service(config.web.static_dir.clone(), config.web.spa_index.clone());
    let pages = static_files
        .merge(routes::api::create_api_fallback_router())
        .layer(axum::middleware::from_fn_with_state(
            guard_state,
            edge_guard::enforce_admin_credential,
        ));

    Router::new()
        .merge(routes::health::create_health_router())
        .route("/metrics", get(metrics_endpoint))
        .merge(pages)
        .layer(Extension(config))
        .layer(Extension(metrics_handle))
        .layer(axum::middleware::from_fn_with_state(
            security_state,
            security::apply_security_headers,
        ))
        .layer(tracer::create_trace_layer())
        .layer(axum::middleware::from_fn_with_state(
            request_id_state,
            request_context::assign_request_id,
        ))
}

/// Creates the graceful shutdown signal handler.
///
/// Resolves when CTRL+C is received. If the handler cannot be installed the
/// error is logged and the server keeps running until killed.
pub async fn create_shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => {
            error!(error = %err, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    }
}

/// Starts the edge server and binds it to the configured host and port.
///
/// # Errors
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn run(config: Config) -> anyhow::Result<()> {
    telemetry::init_tracing(&config.logging);
    info!(profile = ?config.profile, "starting edge server");

    let metrics_handle = telemetry::metrics_handle();
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let config = Arc::new(config);

    if !config.web.spa_index.is_file() {
        warn!(
            index = %config.web.spa_index.display(),
            "spa index not found; pages will 404 until the bundle is built"
        );
    }

    let app = create_app_router(config, metrics_handle);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    serve(listener, app)
        .with_graceful_shutdown(create_shutdown_signal())
        .await?;

    Ok(())
}
