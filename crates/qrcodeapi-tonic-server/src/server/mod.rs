//! Server internals for the QR code gRPC service.
//!
//! - [`config`] - CLI and environment configuration.
//! - [`pool`] - worker tasks that encode and render off the async runtime.
//! - [`service`] - the `QRCode` gRPC service.
//! - [`telemetry`] - logging, and optional OpenTelemetry export.

pub mod config;
pub mod pool;
pub mod service;
pub mod telemetry;
