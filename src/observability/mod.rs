//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!     → tracing.rs (OpenTelemetry spans, parent passed explicitly)
//!
//! On the wire:
//!     → propagation.rs (B3 headers in and out)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape (optional)
//!     → OTLP collector, e.g. Jaeger (optional)
//! ```

pub mod logging;
pub mod metrics;
pub mod propagation;
pub mod tracing;

pub use self::propagation::B3Propagator;
pub use self::tracing::{ActiveSpan, Tracing};
