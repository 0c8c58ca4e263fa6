//! Process-wide logging and metrics setup.

use std::sync::OnceLock;

use axum::{
    Extension,
    http::{HeaderValue, header},
    response::IntoResponse,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use shared::config::server::{LogFormat, LoggingConfig};
use tracing::{Subscriber, level_filters::LevelFilter, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::MakeWriter,
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

static PROMETHEUS: OnceLock<PrometheusHandle> = OnceLock::new();

/// `RUST_LOG` when set, otherwise the configured level (falling back to
/// `info` when that does not parse).
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);
        EnvFilter::new(level.to_string())
    })
}

fn fmt_layer<S, W>(format: LogFormat, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(writer);

    match format {
        LogFormat::Json => layer.json().with_ansi(false).boxed(),
        LogFormat::Text => layer.with_ansi(ansi).boxed(),
    }
}

/// Installs the global subscriber. Returns `false` when one was already set;
/// the existing subscriber is kept.
pub fn init_tracing(logging: &LoggingConfig) -> bool {
    let installed = tracing_subscriber::registry()
        .with(env_filter(&logging.level))
        .with(fmt_layer(logging.format, std::io::stdout, true))
        .try_init()
        .is_ok();

    if !installed {
        warn!("tracing subscriber already installed; keeping the existing one");
    }
    installed
}

/// The process-wide Prometheus handle. The recorder is installed on first
/// use; if another recorder already owns the global slot, a detached one is
/// used so `/metrics` still renders.
pub fn metrics_handle() -> PrometheusHandle {
    PROMETHEUS
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => handle,
            Err(err) => {
                warn!(error = %err, "failed to install Prometheus recorder");
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}

pub async fn metrics_endpoint(Extension(handle): Extension<PrometheusHandle>) -> impl IntoResponse {
    (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; version=0.0.4"),
        )],
        handle.render(),
    )
}
