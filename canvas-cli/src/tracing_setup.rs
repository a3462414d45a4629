//! Log and trace output for canvasctl
//!
//!   canvasctl --debug serve                      # debug level, targets shown
//!   RUST_LOG=canvas_server=trace canvasctl serve # explicit filter wins
//!   canvasctl --otel serve                       # also export spans over OTLP
//!
//! OTLP export needs the `telemetry` cargo feature and honours
//! `OTEL_EXPORTER_OTLP_ENDPOINT` (default http://localhost:4317) and
//! `OTEL_SERVICE_NAME` (default canvasctl).

use anyhow::{anyhow, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Flags from the command line that shape logging
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingConfig {
    pub debug: bool,
    pub otel: bool,
}

impl TracingConfig {
    /// Level used when `RUST_LOG` is unset or unparsable
    fn default_directive(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }
}

/// Keeps the OTLP pipeline alive; dropping it flushes buffered spans.
#[derive(Default)]
#[must_use = "dropping the guard immediately stops trace export"]
pub struct TracingGuard {
    #[cfg(feature = "telemetry")]
    provider: Option<opentelemetry_sdk::trace::TracerProvider>,
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        #[cfg(feature = "telemetry")]
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("failed to flush traces: {e}");
            }
        }
    }
}

/// Install the global subscriber: env filter, compact console output and,
/// when requested and compiled in, an OpenTelemetry layer.
pub fn init(config: TracingConfig) -> Result<TracingGuard> {
    let console = tracing_subscriber::fmt::layer()
        .with_target(config.debug)
        .compact();
    let registry = tracing_subscriber::registry()
        .with(config.filter())
        .with(console);

    #[cfg(feature = "telemetry")]
    if config.otel {
        use opentelemetry::trace::TracerProvider as _;

        let provider = otlp_provider()?;
        let layer = tracing_opentelemetry::layer().with_tracer(provider.tracer("canvasctl"));
        registry.with(layer).try_init().map_err(|e| anyhow!(e))?;
        tracing::info!("OTLP trace export enabled");
        return Ok(TracingGuard {
            provider: Some(provider),
        });
    }

    registry.try_init().map_err(|e| anyhow!(e))?;

    if config.otel {
        tracing::warn!("--otel ignored: built without the telemetry feature");
    }

    Ok(TracingGuard::default())
}

#[cfg(feature = "telemetry")]
fn otlp_provider() -> Result<opentelemetry_sdk::trace::TracerProvider> {
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;

    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:4317".to_string());
    let service = std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "canvasctl".to_string());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&endpoint)
        .build()
        .map_err(|e| anyhow!("OTLP exporter for {endpoint}: {e}"))?;

    Ok(opentelemetry_sdk::trace::TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_resource(opentelemetry_sdk::Resource::new(vec![KeyValue::new(
            "service.name",
            service,
        )]))
        .build())
}
