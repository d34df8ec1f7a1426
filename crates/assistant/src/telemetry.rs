//! Tracing and metrics setup for binaries

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use studyforge_common::config::ObservabilityConfig;
use studyforge_common::metrics::{self, INGESTION_BUCKETS, METRICS_PREFIX, MODEL_LATENCY_BUCKETS};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber; `RUST_LOG` overrides the configured level
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Serve Prometheus metrics when `metrics_port` is non-zero
pub fn init_metrics(config: &ObservabilityConfig) -> anyhow::Result<()> {
    if config.metrics_port == 0 {
        return Ok(());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("model_duration_seconds".to_string()),
            MODEL_LATENCY_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Prefix(format!("{}_ingestion", METRICS_PREFIX)),
            INGESTION_BUCKETS,
        )?
        .install()?;

    metrics::register_metrics();
    info!(%addr, "Prometheus exporter listening");
    Ok(())
}
