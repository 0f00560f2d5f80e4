//! Error taxonomy for QR generation.
//!
//! - [`ValidationError`]: the request itself is unusable. Client-caused and
//!   not retryable without changing the input.
//! - [`Error::ContentTooLarge`]: the payload does not fit the largest symbol.
//! - [`Error::UnsupportedFormat`]: no encoder for the requested MIME type.
//! - [`Error::InternalEncoding`]: a fault while building or encoding the
//!   image. Treated as a defect.
//! - [`Error::Cancelled`]: the caller stopped waiting and the pipeline bailed
//!   out at a stage boundary.

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Reasons a [`GenerationRequest`](crate::GenerationRequest) is rejected
/// before any encoding work starts.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Neither `content` nor `url` carries anything to encode.
    #[error("content and url are both empty")]
    EmptyContent,

    /// A dimension is negative or larger than the configured maximum.
    #[error("invalid dimensions {width}x{height}: each side must be between 0 and {max}")]
    InvalidDimensions { width: i32, height: i32, max: u32 },
}

/// All errors the generation pipeline can produce.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The content needs more data bits than a version 40 symbol offers at
    /// the lowest error-correction level tried.
    #[error("content of {length} bytes exceeds the QR capacity of {capacity_bits} data bits")]
    ContentTooLarge { length: usize, capacity_bits: usize },

    /// The MIME type has no encoder.
    #[error("unsupported output format: {mime}")]
    UnsupportedFormat { mime: String },

    /// Unexpected failure inside matrix construction or rasterization.
    #[error("internal encoding error: {context}")]
    InternalEncoding { context: String },

    /// Generation stopped early because the caller gave up.
    #[error("generation cancelled")]
    Cancelled,
}

impl Error {
    /// Returns `true` when the error was caused by the request contents.
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::InternalEncoding { .. })
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Self::InternalEncoding {
            context: err.to_string(),
        }
    }
}
