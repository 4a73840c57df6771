use crate::app_env;
use crate::app_env::OtelSettings;
use anyhow::Context;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use opentelemetry::trace::TracerProvider;
use opentelemetry::{KeyValue, global};
use opentelemetry_http::HeaderExtractor;
use opentelemetry_otlp::{MetricExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::Tracer;
use opentelemetry_sdk::{Resource, runtime};
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing::{Span, Subscriber, debug, field, info_span};
use tracing_opentelemetry::{MetricsLayer, OpenTelemetryLayer, OpenTelemetrySpanExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, prelude::*, registry};

/// The name of the service as it should appear in OpenTelemetry collectors
const SERVICE_NAME: &str = "todo-service";

/// OpenTelemetry primitives which export spans and metrics to a collector
pub struct OtelExporters {
    pub tracer: Tracer,
    pub meter: SdkMeterProvider,
}

/// Wraps every request on [router] in a "request" span recording the method, path, and
/// response status. The span continues any W3C trace context the caller sent along.
pub fn attach_tracing_http<T>(router: Router<T>) -> Router<T>
where
    T: Clone + Send + Sync + 'static,
{
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<Body>| {
                let req_span = info_span!(
                    "request",
                    method = request.method().as_str(),
                    path = request.uri().path(),
                    response_status = field::Empty,
                );

                req_span.set_parent(global::get_text_map_propagator(|propagator| {
                    propagator.extract(&HeaderExtractor(request.headers()))
                }));

                req_span
            })
            .on_response(|response: &Response<Body>, latency: Duration, span: &Span| {
                span.record("response_status", field::display(response.status()));
                debug!(latency_ms = latency.as_millis() as u64, "request processing complete");
            }),
    )
}

/// Builds exporters which ship spans and metrics to the gRPC collector endpoints in [settings]
/// from a background task. Requires a running tokio runtime.
pub fn init_exporters(settings: &OtelSettings) -> Result<OtelExporters, anyhow::Error> {
    let span_export = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&settings.span_export_url)
        .build()
        .context("building the span exporter")?;
    let meter_export = MetricExporter::builder()
        .with_tonic()
        .with_endpoint(&settings.metric_export_url)
        .build()
        .context("building the metric exporter")?;

    let metrics_reader = PeriodicReader::builder(meter_export, runtime::Tokio).build();
    let service_resource = || Resource::new([KeyValue::new("service.name", SERVICE_NAME)]);

    let tracer = opentelemetry_sdk::trace::TracerProvider::builder()
        .with_batch_exporter(span_export, runtime::Tokio)
        .with_resource(service_resource())
        .build()
        .tracer(SERVICE_NAME);
    let meter = SdkMeterProvider::builder()
        .with_reader(metrics_reader)
        .with_resource(service_resource())
        .build();

    Ok(OtelExporters { tracer, meter })
}

/// Reads per-module log directives from [app_env::LOG_LEVEL], logging at "info" when
/// nothing is configured
pub fn init_env_filter() -> Result<EnvFilter, anyhow::Error> {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(app_env::LOG_LEVEL)
        .from_env()
        .with_context(|| format!("{} contains invalid log directives", app_env::LOG_LEVEL))
}

/// Installs the global subscriber. Logs go to stdout as JSON lines filtered by [env_filter];
/// when [otel_exporters] is present, everything at "debug" and above is also exported.
pub fn setup_logging_and_tracing(env_filter: EnvFilter, otel_exporters: Option<OtelExporters>) {
    global::set_text_map_propagator(TraceContextPropagator::new());

    match otel_exporters {
        Some(exporters) => registry()
            .with(LevelFilter::DEBUG)
            .with(OpenTelemetryLayer::new(exporters.tracer))
            .with(MetricsLayer::new(exporters.meter))
            .with(stdout_json(env_filter))
            .init(),
        None => registry()
            .with(LevelFilter::DEBUG)
            .with(stdout_json(env_filter))
            .init(),
    }
}

fn stdout_json<S>(env_filter: EnvFilter) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_filter(env_filter)
}

/// Sets up logging and, if [otel] is configured, OpenTelemetry export
pub fn init(otel: Option<&OtelSettings>) -> Result<(), anyhow::Error> {
    let env_filter = init_env_filter()?;
    let exporters = otel.map(init_exporters).transpose()?;

    setup_logging_and_tracing(env_filter, exporters);
    Ok(())
}
