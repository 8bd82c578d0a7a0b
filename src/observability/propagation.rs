//! B3 (Zipkin) trace context propagation.
//!
//! Extraction understands both the multi-header form
//! (`X-B3-TraceId`, `X-B3-SpanId`, `X-B3-Sampled`, `X-B3-Flags`) and the
//! single `b3` header. Injection always writes the multi-header form, which
//! every Zipkin/Jaeger-compatible peer accepts.
//!
//! Malformed headers are ignored: the caller's context comes back unchanged
//! and the next span starts a fresh trace.

use std::sync::LazyLock;

use opentelemetry::propagation::{text_map_propagator::FieldIter, Extractor, Injector, TextMapPropagator};
use opentelemetry::trace::{SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState};
use opentelemetry::Context;

pub const B3_SINGLE_HEADER: &str = "b3";
pub const B3_TRACE_ID_HEADER: &str = "x-b3-traceid";
pub const B3_SPAN_ID_HEADER: &str = "x-b3-spanid";
pub const B3_PARENT_SPAN_ID_HEADER: &str = "x-b3-parentspanid";
pub const B3_SAMPLED_HEADER: &str = "x-b3-sampled";
pub const B3_DEBUG_FLAG_HEADER: &str = "x-b3-flags";

static B3_FIELDS: LazyLock<[String; 6]> = LazyLock::new(|| {
    [
        B3_SINGLE_HEADER.to_string(),
        B3_TRACE_ID_HEADER.to_string(),
        B3_SPAN_ID_HEADER.to_string(),
        B3_PARENT_SPAN_ID_HEADER.to_string(),
        B3_SAMPLED_HEADER.to_string(),
        B3_DEBUG_FLAG_HEADER.to_string(),
    ]
});

/// Sampling decision carried by B3 headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SamplingState {
    Deny,
    Accept,
    Debug,
}

impl SamplingState {
    fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "0" | "false" => Some(Self::Deny),
            "1" | "true" => Some(Self::Accept),
            "d" => Some(Self::Debug),
            _ => None,
        }
    }

    fn trace_flags(self) -> TraceFlags {
        match self {
            Self::Deny => TraceFlags::default(),
            Self::Accept | Self::Debug => TraceFlags::SAMPLED,
        }
    }
}

/// `TextMapPropagator` speaking the B3 header format.
#[derive(Debug, Clone, Copy, Default)]
pub struct B3Propagator;

impl B3Propagator {
    pub fn new() -> Self {
        Self
    }

    fn extract_single_header(&self, extractor: &dyn Extractor) -> Option<SpanContext> {
        let header = extractor.get(B3_SINGLE_HEADER)?.trim();
        // `b3: 0` / `b3: 1` alone carries a sampling decision but no identity.
        let mut parts = header.split('-');
        let trace_id = parse_trace_id(parts.next()?)?;
        let span_id = parse_span_id(parts.next()?)?;
        let flags = match parts.next() {
            Some(state) => SamplingState::parse(state)?.trace_flags(),
            None => TraceFlags::default(),
        };
        if let Some(parent) = parts.next() {
            parse_span_id(parent)?;
        }
        if parts.next().is_some() {
            return None;
        }

        Some(SpanContext::new(trace_id, span_id, flags, true, TraceState::default()))
    }

    fn extract_multi_header(&self, extractor: &dyn Extractor) -> Option<SpanContext> {
        let trace_id = parse_trace_id(extractor.get(B3_TRACE_ID_HEADER)?)?;
        let span_id = parse_span_id(extractor.get(B3_SPAN_ID_HEADER)?)?;

        let debug = extractor
            .get(B3_DEBUG_FLAG_HEADER)
            .map(|v| v.trim() == "1")
            .unwrap_or(false);
        let flags = if debug {
            SamplingState::Debug.trace_flags()
        } else {
            match extractor.get(B3_SAMPLED_HEADER) {
                Some(v) => SamplingState::parse(v)?.trace_flags(),
                None => TraceFlags::default(),
            }
        };

        Some(SpanContext::new(trace_id, span_id, flags, true, TraceState::default()))
    }
}

impl TextMapPropagator for B3Propagator {
    fn inject_context(&self, cx: &Context, injector: &mut dyn Injector) {
        let span = cx.span();
        let span_context = span.span_context();
        if !span_context.is_valid() {
            return;
        }

        injector.set(B3_TRACE_ID_HEADER, span_context.trace_id().to_string());
        injector.set(B3_SPAN_ID_HEADER, span_context.span_id().to_string());
        let sampled = if span_context.is_sampled() { "1" } else { "0" };
        injector.set(B3_SAMPLED_HEADER, sampled.to_string());
    }

    fn extract_with_context(&self, cx: &Context, extractor: &dyn Extractor) -> Context {
        let span_context = self
            .extract_single_header(extractor)
            .or_else(|| self.extract_multi_header(extractor));

        match span_context {
            Some(sc) if sc.is_valid() => cx.with_remote_span_context(sc),
            _ => cx.clone(),
        }
    }

    fn fields(&self) -> FieldIter<'_> {
        FieldIter::new(&B3_FIELDS[..])
    }
}

fn is_lower_hex(value: &str) -> bool {
    value.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// 64-bit trace ids are widened to 128 bits by left-padding with zeros.
fn parse_trace_id(value: &str) -> Option<TraceId> {
    let value = value.trim();
    if !matches!(value.len(), 16 | 32) || !is_lower_hex(value) {
        return None;
    }
    TraceId::from_hex(value).ok().filter(|id| *id != TraceId::INVALID)
}

fn parse_span_id(value: &str) -> Option<SpanId> {
    let value = value.trim();
    if value.len() != 16 || !is_lower_hex(value) {
        return None;
    }
    SpanId::from_hex(value).ok().filter(|id| *id != SpanId::INVALID)
}
