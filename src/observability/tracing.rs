//! Distributed tracing support.
//!
//! # Responsibilities
//! - Build the OpenTelemetry tracer provider (always-on sampling, optional
//!   OTLP export to a collector)
//! - Extract trace context from incoming requests
//! - Start server and client spans under an explicit parent [`Context`]
//! - Propagate trace context to downstream requests
//!
//! # Design Decisions
//! - No ambient tracer: [`Tracing`] is injected and every operation takes
//!   its parent `Context` as an argument
//! - B3 headers on the wire (see [`crate::observability::propagation`])
//! - [`ActiveSpan`] ends its span on drop, so early returns and `?` still
//!   close it exactly once

use std::borrow::Cow;

use axum::http::HeaderMap;
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::trace::{SpanKind, Status, TraceContextExt, Tracer as _, TracerProvider as _};
use opentelemetry::{Context, KeyValue};
use opentelemetry_http::{HeaderExtractor, HeaderInjector};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{self as sdktrace, BatchSpanProcessor, RandomIdGenerator, Sampler};
use opentelemetry_sdk::{runtime, Resource};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use thiserror::Error;

use crate::config::TracingConfig;
use crate::observability::propagation::B3Propagator;

/// Span name for the inbound request.
pub const SERVER_SPAN: &str = "/ GET";
/// Span name for the playlist store lookup.
pub const STORE_SPAN: &str = "redis-get";
/// Span name for one video service call.
pub const VIDEO_SPAN: &str = "videos-api GET";

#[derive(Debug, Error)]
pub enum TracingInitError {
    #[error("failed to build span exporter for {endpoint}: {message}")]
    Exporter { endpoint: String, message: String },
}

/// Build the tracer provider. Spans are exported only when a collector
/// endpoint is configured.
pub fn init_tracer_provider(
    config: &TracingConfig,
    environment: &str,
) -> Result<sdktrace::TracerProvider, TracingInitError> {
    let resource = Resource::new(vec![
        KeyValue::new(SERVICE_NAME, config.service_name.clone()),
        KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        KeyValue::new("service.instance.id", uuid::Uuid::new_v4().to_string()),
        KeyValue::new("deployment.environment", environment.to_string()),
    ]);

    let mut builder = sdktrace::TracerProvider::builder()
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource);

    match config.collector_url() {
        Some(endpoint) => {
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint.clone())
                .build()
                .map_err(|e| TracingInitError::Exporter {
                    endpoint: endpoint.clone(),
                    message: e.to_string(),
                })?;
            let processor = BatchSpanProcessor::builder(exporter, runtime::Tokio).build();
            builder = builder.with_span_processor(processor);
            tracing::info!(endpoint = %endpoint, "Span export enabled");
        }
        None => {
            tracing::info!("No collector configured, spans are propagated but not exported");
        }
    }

    Ok(builder.build())
}

/// Flush pending spans and stop the exporter.
pub fn shutdown_tracer_provider(provider: &sdktrace::TracerProvider) {
    if let Err(e) = provider.shutdown() {
        tracing::warn!(error = %e, "Tracer provider shutdown failed");
    }
}

/// Tracer handle shared by every component that opens spans.
#[derive(Clone)]
pub struct Tracing {
    tracer: sdktrace::Tracer,
    propagator: B3Propagator,
}

impl Tracing {
    pub fn new(tracer: sdktrace::Tracer) -> Self {
        Self {
            tracer,
            propagator: B3Propagator::new(),
        }
    }

    /// Tracer named after the service, taken from `provider`.
    pub fn from_provider(provider: &sdktrace::TracerProvider, service_name: &str) -> Self {
        Self::new(provider.tracer(service_name.to_string()))
    }

    /// Start the root span of an inbound request, continuing the caller's
    /// trace when the headers carry one.
    pub fn start_server_span(&self, name: &'static str, headers: &HeaderMap) -> ActiveSpan {
        let parent = self
            .propagator
            .extract_with_context(&Context::new(), &HeaderExtractor(headers));
        self.start(&parent, name, SpanKind::Server)
    }

    /// Start a span for an outbound call under `parent`.
    pub fn start_client_span(&self, parent: &Context, name: &'static str) -> ActiveSpan {
        self.start(parent, name, SpanKind::Client)
    }

    /// Write the span carried by `cx` into outbound headers.
    pub fn inject(&self, cx: &Context, headers: &mut HeaderMap) {
        self.propagator.inject_context(cx, &mut HeaderInjector(headers));
    }

    fn start(&self, parent: &Context, name: &'static str, kind: SpanKind) -> ActiveSpan {
        let span = self
            .tracer
            .span_builder(name)
            .with_kind(kind)
            .start_with_context(&self.tracer, parent);
        ActiveSpan {
            cx: parent.with_span(span),
        }
    }
}

/// A started span together with the context that carries it.
///
/// The span ends when this value is dropped.
pub struct ActiveSpan {
    cx: Context,
}

impl ActiveSpan {
    /// Context to hand to child operations.
    pub fn context(&self) -> &Context {
        &self.cx
    }

    /// Tag the span as errored.
    pub fn record_error(&self, message: impl Into<Cow<'static, str>>) {
        let span = self.cx.span();
        span.set_attribute(KeyValue::new("error", true));
        span.set_status(Status::error(message));
    }

    pub fn set_attribute(&self, attribute: KeyValue) {
        self.cx.span().set_attribute(attribute);
    }
}

impl Drop for ActiveSpan {
    fn drop(&mut self) {
        self.cx.span().end();
    }
}
