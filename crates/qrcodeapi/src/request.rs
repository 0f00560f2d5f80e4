//! Request validation.
//!
//! [`validate`] is the only gate between untrusted input and the encoder. It
//! never allocates image buffers, so oversized requests are rejected before
//! they cost anything.

use crate::{OutputFormat, Payload, ValidationError};

/// Side length used when a request leaves a dimension at zero.
pub const DEFAULT_DIMENSION: u32 = 200;

/// Largest side length accepted by default.
pub const MAX_DIMENSION: u32 = 4096;

/// A generation request as it arrives from a client.
///
/// `width`/`height` are signed to mirror the wire format, where a negative
/// value is representable and must be rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    pub content: String,
    pub url: String,
    pub width: i32,
    pub height: i32,
    pub accept: String,
}

/// Bounds applied during validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    pub max_dimension: u32,
    pub default_dimension: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
            default_dimension: DEFAULT_DIMENSION,
        }
    }
}

/// A request that passed validation. Dimensions are positive and the format
/// is one the renderer supports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedRequest {
    pub payload: Payload,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

impl NormalizedRequest {
    /// The string handed to the encoder.
    pub fn content(&self) -> String {
        self.payload.encoded()
    }
}

/// Validates and normalizes a request.
///
/// # Errors
///
/// - [`ValidationError::EmptyContent`] if `content` and `url` are both empty.
/// - [`ValidationError::InvalidDimensions`] if a side is negative or larger
///   than `limits.max_dimension`.
pub fn validate(
    req: &GenerationRequest,
    limits: &Limits,
) -> Result<NormalizedRequest, ValidationError> {
    let payload = Payload::select(&req.content, &req.url).ok_or(ValidationError::EmptyContent)?;

    let invalid = || ValidationError::InvalidDimensions {
        width: req.width,
        height: req.height,
        max: limits.max_dimension,
    };
    let width = dimension(req.width, limits).ok_or_else(invalid)?;
    let height = dimension(req.height, limits).ok_or_else(invalid)?;

    Ok(NormalizedRequest {
        payload,
        width,
        height,
        format: OutputFormat::negotiate(&req.accept),
    })
}

fn dimension(requested: i32, limits: &Limits) -> Option<u32> {
    match u32::try_from(requested).ok()? {
        0 => Some(limits.default_dimension),
        side if side <= limits.max_dimension => Some(side),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(content: &str, width: i32, height: i32) -> GenerationRequest {
        GenerationRequest {
            content: content.into(),
            width,
            height,
            ..Default::default()
        }
    }

    #[test]
    fn empty_content_and_url_is_rejected() {
        let err = validate(&request("", 100, 100), &Limits::default()).unwrap_err();
        assert_eq!(err, ValidationError::EmptyContent);
    }

    #[test]
    fn url_alone_is_enough() {
        let req = GenerationRequest {
            url: "https://example.com".into(),
            ..Default::default()
        };
        let normalized = validate(&req, &Limits::default()).unwrap();
        assert_eq!(normalized.payload, Payload::Url("https://example.com".into()));
    }

    #[test]
    fn negative_width_is_rejected() {
        let err = validate(&request("x", -1, 100), &Limits::default()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidDimensions { width: -1, .. }
        ));
    }

    #[test]
    fn negative_height_is_rejected() {
        let err = validate(&request("x", 100, -5), &Limits::default()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidDimensions { height: -5, .. }
        ));
    }

    #[test]
    fn oversized_dimension_is_rejected() {
        let limits = Limits::default();
        assert!(validate(&request("x", 4096, 4096), &limits).is_ok());
        let err = validate(&request("x", 4097, 10), &limits).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidDimensions {
                width: 4097,
                height: 10,
                max: 4096
            }
        );
    }

    #[test]
    fn zero_dimensions_default() {
        let normalized = validate(&request("x", 0, 0), &Limits::default()).unwrap();
        assert_eq!((normalized.width, normalized.height), (200, 200));

        let limits = Limits {
            max_dimension: 1000,
            default_dimension: 320,
        };
        let normalized = validate(&request("x", 0, 50), &limits).unwrap();
        assert_eq!((normalized.width, normalized.height), (320, 50));
    }

    #[test]
    fn accept_is_negotiated() {
        let mut req = request("x", 10, 10);
        assert_eq!(
            validate(&req, &Limits::default()).unwrap().format,
            OutputFormat::Png
        );
        req.accept = "image/tiff,image/jpeg".into();
        assert_eq!(
            validate(&req, &Limits::default()).unwrap().format,
            OutputFormat::Jpeg
        );
    }
}
