//! Generates the `QRCode` service bindings from `proto/v1alpha1.proto`.
//!
//! The `image` field of `Response` is emitted as `bytes::Bytes` so rendered
//! images move from the worker into the response without another copy. The
//! file descriptor set is written next to the generated code and embedded by
//! the crate for server reflection.
use std::env;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("qrcodeapi_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();

    config
        .bytes([".api.v1alpha1.Response.image"])
        .file_descriptor_set_path(&descriptor_path);

    tonic_prost_build::configure()
        .compile_with_config(config, &["proto/v1alpha1.proto"], &["proto"])
        .unwrap();
}
