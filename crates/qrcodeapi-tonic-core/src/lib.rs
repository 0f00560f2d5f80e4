#![doc = include_str!("../README.md")]

mod common;
pub use common::*;
// Re-exported so downstream crates can reach the core library through
// `qrcodeapi_tonic_core::qrcodeapi`.
pub use qrcodeapi;

/// Generated `api.v1alpha1` messages, client and server.
pub mod proto {
    tonic::include_proto!("api.v1alpha1");

    /// Encoded descriptor set for gRPC server reflection.
    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("qrcodeapi_descriptor");
}
