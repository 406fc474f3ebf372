use opentelemetry::{KeyValue, trace::TracerProvider as _};
use opentelemetry_otlp::{Protocol, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::{
    Resource,
    trace::{RandomIdGenerator, Sampler, SdkTracerProvider},
};
use opentelemetry_semantic_conventions::{
    SCHEMA_URL,
    attribute::{SERVICE_NAME, SERVICE_VERSION},
    resource::DEPLOYMENT_ENVIRONMENT_NAME,
};
use rocket::{
    Data, Request, Response,
    fairing::{Fairing, Info, Kind},
};
use std::time::Instant;
use tonic::metadata::{MetadataMap, MetadataValue};
use tracing::{Span, field::Empty, info_span};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::TELEMETRY_GUARD;
use crate::env::AppConfig;
use crate::error::AppError;

const HONEYCOMB_ENDPOINT: &str = "https://api.honeycomb.io:443";

pub struct TelemetryFairing;

#[rocket::async_trait]
impl Fairing for TelemetryFairing {
    fn info(&self) -> Info {
        Info {
            name: "OpenTelemetry",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        let method = request.method().to_string();
        let uri = request.uri().path().to_string();

        let start_time = Instant::now();

        let span = info_span!(
            "http_request",
            otel.name = format!("{} {}", method, uri),
            http.method = method,
            http.uri = uri,
            http.status_code = Empty,
            http.duration_ms = Empty,
        );

        request.local_cache(|| (span, start_time));
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let (span, start_time): &(Span, Instant) = request.local_cache(|| {
            let span = info_span!("http_request");
            (span, Instant::now())
        });

        let duration = start_time.elapsed();

        span.record("http.status_code", response.status().code);
        span.record("http.duration_ms", duration.as_millis() as i64);

        span.in_scope(|| {
            tracing::info!(
                "Completed request in {}ms with status {}",
                duration.as_millis(),
                response.status().code
            );
        });
    }
}

fn resource() -> Resource {
    let environment = dotenvy::var("ROCKET_PROFILE").unwrap_or("development".to_string());

    Resource::builder()
        .with_schema_url(
            [
                KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
                KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
                KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, environment),
            ],
            SCHEMA_URL,
        )
        .build()
}

fn init_tracer_provider(config: &AppConfig) -> Result<SdkTracerProvider, AppError> {
    let mut metadata = MetadataMap::new();
    if let Some(key) = &config.honeycomb_api_key {
        let value = MetadataValue::try_from(key.as_str())
            .map_err(|e| AppError::ExternalService(format!("Invalid Honeycomb key: {}", e)))?;
        metadata.insert("x-honeycomb-team", value);
    }

    let endpoint = config
        .otel_endpoint
        .clone()
        .unwrap_or_else(|| HONEYCOMB_ENDPOINT.to_string());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .with_tls_config(tonic::transport::ClientTlsConfig::new().with_native_roots())
        .with_protocol(Protocol::Grpc)
        .with_metadata(metadata)
        .build()
        .map_err(|e| AppError::ExternalService(format!("OTLP exporter: {}", e)))?;

    Ok(SdkTracerProvider::builder()
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource())
        .with_batch_exporter(exporter)
        .build())
}

pub struct OtelGuard {
    tracer_provider: SdkTracerProvider,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Err(err) = self.tracer_provider.shutdown() {
            eprintln!("Failed to shut down tracer provider: {:?}", err);
        }
    }
}

/// Installs the global subscriber. Spans are exported over OTLP only when an
/// endpoint or Honeycomb key is configured; otherwise logs go to stdout alone.
pub fn init_tracing(config: &AppConfig) -> Option<OtelGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());

    if !config.telemetry_enabled() {
        registry.init();
        tracing::info!("OTLP export disabled, logging to stdout only");
        return None;
    }

    match init_tracer_provider(config) {
        Ok(tracer_provider) => {
            let tracer = tracer_provider.tracer("recruiting-hub");
            registry.with(OpenTelemetryLayer::new(tracer)).init();
            Some(OtelGuard { tracer_provider })
        }
        Err(err) => {
            registry.init();
            tracing::error!(error = %err, "Telemetry exporter unavailable, continuing without it");
            None
        }
    }
}

pub fn shutdown_telemetry() {
    println!("Shutting down telemetry...");

    let guard = TELEMETRY_GUARD.lock().ok().and_then(|mut guard| guard.take());
    drop(guard);
}
