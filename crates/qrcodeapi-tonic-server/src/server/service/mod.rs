//! gRPC service implementation.
//!
//! This module contains the client-facing request handling: validation,
//! admission control, dispatch to the worker pool, and mapping results back
//! to gRPC responses and status codes.
//!
//! ## Structure
//!
//! - [`handler`] - gRPC service entry point (`QrService`).

pub mod handler;
