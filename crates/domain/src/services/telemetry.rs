//! Process-wide logging and metrics. Per-request access lines and all other
//! diagnostics land on separate standard streams; nothing is written to files.

use std::{env, io, net::SocketAddr};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::{warn, Subscriber};
use tracing_subscriber::{
    filter::filter_fn, fmt::writer::BoxMakeWriter, layer::SubscriberExt, registry::LookupSpan,
    util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::config::hydrate_env_file;

static TRACING: OnceCell<()> = OnceCell::new();
static RECORDER: OnceCell<PrometheusHandle> = OnceCell::new();

/// Target of the per-request lines written by actix-web's `Logger`.
pub const ACCESS_LOG_TARGET: &str = "actix_web::middleware::logger";

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Standard stream an event is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    /// Access log.
    Stdout,
    /// Errors, warnings and everything else.
    Stderr,
}

impl LogStream {
    pub fn for_target(target: &str) -> Self {
        if target.starts_with(ACCESS_LOG_TARGET) {
            LogStream::Stdout
        } else {
            LogStream::Stderr
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    log_filter: String,
    metrics_listener: Option<String>,
}

impl TelemetryConfig {
    /// Reads `<PREFIX>_LOG_FILTER` and `<PREFIX>_METRICS_ADDRESS`. Blank values
    /// count as unset.
    pub fn from_env(prefix: &str) -> Self {
        let _ = hydrate_env_file();
        let prefix = prefix.trim().to_ascii_uppercase();

        Self {
            log_filter: knob(&prefix, "LOG_FILTER")
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            metrics_listener: knob(&prefix, "METRICS_ADDRESS"),
        }
    }

    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Address of a standalone Prometheus listener, if one was requested.
    pub fn metrics_address(&self) -> Option<&str> {
        self.metrics_listener.as_deref()
    }
}

fn knob(prefix: &str, name: &str) -> Option<String> {
    env::var(format!("{prefix}_{name}"))
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Keeps the metrics handle the `/metrics` route renders from.
#[derive(Clone)]
pub struct TelemetryGuard {
    handle: PrometheusHandle,
}

impl TelemetryGuard {
    pub fn render_metrics(&self) -> String {
        self.handle.render()
    }
}

/// Installs the tracing subscriber and the Prometheus recorder. Only the first
/// call per process installs anything; later calls share the same recorder.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    install_tracing(config.log_filter())?;
    let handle = RECORDER
        .get_or_try_init(|| install_recorder(config.metrics_address()))?
        .clone();
    Ok(TelemetryGuard { handle })
}

fn install_tracing(log_filter: &str) -> Result<(), TelemetryError> {
    if TRACING.get().is_some() {
        return Ok(());
    }
    let filter = EnvFilter::try_new(log_filter)
        .map_err(|err| TelemetryError::InvalidLogFilter(err.to_string()))?;

    if TRACING.set(()).is_ok() {
        tracing_subscriber::registry()
            .with(filter)
            .with(stream_layer(LogStream::Stdout))
            .with(stream_layer(LogStream::Stderr))
            .try_init()
            .map_err(|err| TelemetryError::Tracing(err.to_string()))?;
    }
    Ok(())
}

fn stream_layer<S>(stream: LogStream) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let writer = match stream {
        LogStream::Stdout => BoxMakeWriter::new(io::stdout),
        LogStream::Stderr => BoxMakeWriter::new(io::stderr),
    };
    tracing_subscriber::fmt::layer()
        .with_target(stream == LogStream::Stderr)
        .with_writer(writer)
        .with_filter(filter_fn(move |metadata| {
            LogStream::for_target(metadata.target()) == stream
        }))
}

fn install_recorder(listener: Option<&str>) -> Result<PrometheusHandle, TelemetryError> {
    let Some(raw) = listener else {
        return PrometheusBuilder::new()
            .install_recorder()
            .map_err(|err| TelemetryError::Metrics(err.to_string()));
    };

    let address = parse_listener(raw)?;
    let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
        TelemetryError::Metrics("a metrics listener needs a running async runtime".to_string())
    })?;
    let (recorder, exporter) = PrometheusBuilder::new()
        .with_http_listener(address)
        .build()
        .map_err(|err| TelemetryError::Metrics(err.to_string()))?;
    let handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|err| TelemetryError::Metrics(err.to_string()))?;
    runtime.spawn(async move {
        if let Err(err) = exporter.await {
            warn!(?err, "metrics listener stopped");
        }
    });
    Ok(handle)
}

fn parse_listener(raw: &str) -> Result<SocketAddr, TelemetryError> {
    raw.parse()
        .map_err(|err: std::net::AddrParseError| {
            TelemetryError::InvalidMetricsAddress(raw.to_string(), err.to_string())
        })
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    InvalidLogFilter(String),
    #[error("failed to install tracing subscriber: {0}")]
    Tracing(String),
    #[error("invalid metrics address `{0}`: {1}")]
    InvalidMetricsAddress(String, String),
    #[error("failed to install metrics recorder: {0}")]
    Metrics(String),
}
