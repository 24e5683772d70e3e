//! Log output and optional OTLP trace export.
//!
//! Traces are exported over gRPC only when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use opentelemetry::{global, trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::{Compression, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace::SdkTracerProvider, Resource};
use std::{env::var, time::Duration};
use tonic::{
    metadata::{Ascii, MetadataKey, MetadataMap, MetadataValue},
    transport::ClientTlsConfig,
};
use tracing::{debug, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

static TRACER_PROVIDER: OnceCell<SdkTracerProvider> = OnceCell::new();

const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4317";

/// Exporter settings read from the `OTEL_EXPORTER_OTLP_*` variables.
#[derive(Debug)]
struct OtlpSettings {
    endpoint: String,
    metadata: MetadataMap,
}

impl OtlpSettings {
    fn from_env() -> Result<Option<Self>> {
        let Ok(endpoint) = var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
            return Ok(None);
        };
        let headers = var("OTEL_EXPORTER_OTLP_HEADERS").unwrap_or_default();
        Self::new(&endpoint, &headers).map(Some)
    }

    /// `headers` is a comma separated list of `name=value` pairs.
    fn new(endpoint: &str, headers: &str) -> Result<Self> {
        let endpoint = endpoint.trim().trim_end_matches('/');
        let endpoint = if endpoint.is_empty() {
            DEFAULT_OTLP_ENDPOINT.to_string()
        } else if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            // gRPC without a scheme means TLS
            format!("https://{endpoint}")
        };

        let mut metadata = MetadataMap::new();
        for pair in headers.split(',').filter(|pair| !pair.trim().is_empty()) {
            let Some((name, value)) = pair.split_once('=') else {
                debug!("ignoring OTLP header without a value");
                continue;
            };
            let name = name.trim().to_ascii_lowercase();
            let key = MetadataKey::<Ascii>::from_bytes(name.as_bytes())
                .with_context(|| format!("invalid OTLP header name {name:?}"))?;
            let value: MetadataValue<Ascii> = value
                .trim()
                .parse()
                .with_context(|| format!("invalid OTLP header value for {name:?}"))?;
            metadata.insert(key, value);
        }

        Ok(Self { endpoint, metadata })
    }

    /// Host name checked against the collector certificate, if the endpoint uses TLS.
    fn tls_domain(&self) -> Option<&str> {
        self.endpoint.strip_prefix("https://")?.split(['/', ':']).next()
    }
}

fn install_tracer_provider(settings: &OtlpSettings) -> Result<SdkTracerProvider> {
    let mut builder = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(settings.endpoint.clone())
        .with_compression(Compression::Gzip)
        .with_timeout(Duration::from_secs(3))
        .with_metadata(settings.metadata.clone());

    if let Some(domain) = settings.tls_domain() {
        builder = builder.with_tls_config(
            ClientTlsConfig::new()
                .domain_name(domain)
                .with_native_roots(),
        );
    }

    let exporter = builder
        .build()
        .context("failed to build the OTLP span exporter")?;

    // OTEL_RESOURCE_ATTRIBUTES and OTEL_SERVICE_NAME still apply on top of these
    let resource = Resource::builder()
        .with_service_name(env!("CARGO_PKG_NAME"))
        .with_attribute(KeyValue::new("service.version", env!("CARGO_PKG_VERSION")))
        .build();

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build();

    let _ = TRACER_PROVIDER.set(provider.clone());
    global::set_tracer_provider(provider.clone());
    global::set_text_map_propagator(TraceContextPropagator::new());

    Ok(provider)
}

/// Initialize logging, plus the OTLP exporter when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
///
/// # Errors
///
/// Returns an error if the OTLP settings are invalid or a global subscriber is already set
pub fn init(verbosity_level: Option<Level>) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity_level.unwrap_or(Level::ERROR).into())
        .from_env_lossy()
        .add_directive("hyper=error".parse()?)
        .add_directive("h2=error".parse()?)
        .add_directive("opentelemetry_sdk=warn".parse()?);

    let otel_layer = match OtlpSettings::from_env()? {
        Some(settings) => {
            let tracer = install_tracer_provider(&settings)?.tracer(env!("CARGO_PKG_NAME"));
            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    let subscriber = Registry::default()
        .with(
            fmt::layer()
                .with_file(false)
                .with_line_number(false)
                .with_target(false)
                .pretty(),
        )
        .with(otel_layer)
        .with(filter);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

/// Flush pending spans; a no-op when export is off.
pub fn shutdown_tracer() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(err) = provider.shutdown() {
            warn!("tracer provider shutdown failed: {err}");
        }
    }
}
