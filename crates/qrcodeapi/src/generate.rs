use crate::{
    Error, GenerationRequest, Limits, NormalizedRequest, Result, encode, render_until, validate,
};

/// The result of a successful generation: the bytes of a complete image and
/// the dimensions it was actually rendered at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationResponse {
    pub content_type: String,
    pub width: u32,
    pub height: u32,
    pub image: Vec<u8>,
}

/// Runs the full pipeline: validate, encode, render.
///
/// Validation and capacity failures are reported before any pixel buffer is
/// allocated.
///
/// # Errors
///
/// Any [`Error`](crate::Error) variant; see the crate-level taxonomy.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all, fields(width = req.width, height = req.height, accept = %req.accept)))]
pub fn generate(req: &GenerationRequest, limits: &Limits) -> Result<GenerationResponse> {
    let normalized = validate(req, limits)?;
    generate_normalized(&normalized)
}

/// Encodes and renders a request that already passed [`validate`].
pub fn generate_normalized(req: &NormalizedRequest) -> Result<GenerationResponse> {
    generate_until(req, || false)
}

/// Like [`generate_normalized`], but polls `is_cancelled` after encoding and
/// again before the container encoder runs. Once it returns `true` the
/// partial work is dropped and [`Error::Cancelled`] is returned.
pub fn generate_until(
    req: &NormalizedRequest,
    is_cancelled: impl Fn() -> bool,
) -> Result<GenerationResponse> {
    let matrix = encode(&req.content())?;
    if is_cancelled() {
        return Err(Error::Cancelled);
    }
    let rendered = render_until(&matrix, req.width, req.height, req.format, &is_cancelled)?;

    Ok(GenerationResponse {
        content_type: rendered.content_type().to_owned(),
        width: rendered.width,
        height: rendered.height,
        image: rendered.bytes,
    })
}
