//! # qrcodeapi
//!
//! Deterministic QR code generation: a request goes through validation, the
//! validated content is encoded into a QR Model 2 symbol, and the symbol is
//! rasterized (or drawn as SVG) at the requested size.
//!
//! ```
//! use qrcodeapi::{GenerationRequest, Limits, generate};
//!
//! let request = GenerationRequest {
//!     content: "https://example.com".into(),
//!     width: 200,
//!     height: 200,
//!     accept: "image/png".into(),
//!     ..Default::default()
//! };
//! let response = generate(&request, &Limits::default()).unwrap();
//! assert_eq!(response.content_type, "image/png");
//! assert_eq!((response.width, response.height), (200, 200));
//! ```
//!
//! ## Pipeline
//!
//! - [`validate`] - normalizes dimensions, picks the payload and the output
//!   format.
//! - [`encode`] - builds an immutable [`QrMatrix`]. Medium error correction is
//!   preferred, with a fallback to Low for content that only fits there. The
//!   mask with the lowest penalty score wins, ties go to the lowest index.
//! - [`render`] - scales the matrix uniformly into the target box with a
//!   4-module quiet zone and encodes the result.
//!
//! Every stage is a pure function of its inputs, so identical requests always
//! produce identical bytes.

mod encoder;
mod error;
mod format;
mod generate;
mod payload;
mod render;
mod request;

pub use crate::encoder::*;
pub use crate::error::*;
pub use crate::format::*;
pub use crate::generate::*;
pub use crate::payload::*;
pub use crate::render::*;
pub use crate::request::*;
