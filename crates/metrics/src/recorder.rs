//! Metrics recorder initialization and configuration.

use {anyhow::Result, tracing::info};

/// Handle to the metrics system, providing access to exported metrics.
#[derive(Clone)]
pub struct MetricsHandle {
    #[cfg(feature = "prometheus")]
    prometheus_handle: metrics_exporter_prometheus::PrometheusHandle,
}

impl MetricsHandle {
    /// Render metrics in Prometheus text format for the `/metrics` endpoint.
    #[must_use]
    pub fn render(&self) -> String {
        #[cfg(feature = "prometheus")]
        {
            self.prometheus_handle.render()
        }
        #[cfg(not(feature = "prometheus"))]
        {
            String::new()
        }
    }
}

/// Configuration for the metrics system.
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorderConfig {
    /// Whether metrics collection is enabled
    pub enabled: bool,
}

/// Initialize the metrics system.
///
/// Call once at startup. Returns `None` when collection is disabled in config
/// or the `prometheus` feature is not compiled in, in which case the metric
/// macros are no-ops and `/metrics` answers 503.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed (for
/// example when another global recorder is already set).
pub fn init_metrics(config: MetricsRecorderConfig) -> Result<Option<MetricsHandle>> {
    if !config.enabled {
        info!("metrics collection is disabled");
        return Ok(None);
    }

    #[cfg(feature = "prometheus")]
    {
        let handle = init_prometheus()?;
        info!("prometheus metrics exporter initialized");
        Ok(Some(MetricsHandle {
            prometheus_handle: handle,
        }))
    }

    #[cfg(not(feature = "prometheus"))]
    {
        info!("metrics feature not enabled at compile time");
        Ok(None)
    }
}

#[cfg(feature = "prometheus")]
fn init_prometheus() -> Result<metrics_exporter_prometheus::PrometheusHandle> {
    use {
        crate::{buckets, nlu},
        metrics_exporter_prometheus::{Matcher, PrometheusBuilder},
    };

    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(nlu::QUERY_DURATION_SECONDS.to_string()),
            &buckets::NLU_DURATION,
        )?
        .set_buckets_for_metric(
            Matcher::Suffix("_duration_seconds".to_string()),
            &buckets::HTTP_DURATION,
        )?;

    // install_recorder() sets the global recorder and hands back a render
    // handle without spawning the exporter's own HTTP listener.
    let handle = builder.install_recorder()?;
    Ok(handle)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_config_yields_no_handle() {
        let config = MetricsRecorderConfig { enabled: false };
        assert!(init_metrics(config).unwrap().is_none());
    }
}
