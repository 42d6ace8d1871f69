use color_eyre::Result;
use color_eyre::eyre::Context;
use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::TelemetryConfig;

const SERVICE_NAME: &str = "studio-manager";

/// Keeps the span exporter alive; flushes pending spans when dropped.
pub struct TracingGuard {
    tracer_provider: Option<SdkTracerProvider>,
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(err) = provider.shutdown() {
                eprintln!("Failed to shut down tracer provider: {err}");
            }
        }
    }
}

/// Installs the global subscriber: an `EnvFilter` built from `log_level`, a
/// fmt layer on stderr and, when an endpoint is configured, OTLP span export.
pub fn init_tracing(telemetry: &TelemetryConfig) -> Result<TracingGuard> {
    let filter_layer = EnvFilter::try_new(&telemetry.log_level)
        .wrap_err_with(|| format!("Invalid log level: {}", telemetry.log_level))?;
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let Some(endpoint) = telemetry.otlp_endpoint.as_deref() else {
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .init();
        return Ok(TracingGuard {
            tracer_provider: None,
        });
    };

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .wrap_err("Failed to create OTLP span exporter")?;

    let resource = Resource::builder()
        .with_attributes(vec![KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_NAME,
            SERVICE_NAME,
        )])
        .build();

    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build();
    opentelemetry::global::set_tracer_provider(tracer_provider.clone());

    let telemetry_layer =
        tracing_opentelemetry::layer().with_tracer(tracer_provider.tracer(SERVICE_NAME));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(telemetry_layer)
        .init();

    tracing::info!(endpoint, "Exporting spans over OTLP");

    Ok(TracingGuard {
        tracer_provider: Some(tracer_provider),
    })
}
