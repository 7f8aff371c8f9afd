//! Observability setup for Slotwise: structured logging and optional
//! OpenTelemetry trace export.

pub mod tracing_setup;
