//! Worker tasks and the pool that feeds them.
//!
//! - [`manager`] - round-robin dispatch, in-flight tracking, shutdown.
//! - [`request`] - messages exchanged with workers.
//! - [`worker`] - the per-worker event loop.

pub mod manager;
pub mod request;
pub mod worker;
