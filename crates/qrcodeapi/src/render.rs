//! Rasterization and container encoding.
//!
//! The symbol is drawn at a uniform integer scale inside the requested box,
//! surrounded by a [`QUIET_ZONE`] and centred. Any remainder becomes light
//! padding. A box too small for one pixel per module is grown to the smallest
//! size that fits, and the reported dimensions say so.

use core::fmt::Write as _;

use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, GrayImage, ImageEncoder, Luma};

use crate::{Error, OutputFormat, QrMatrix, Result};

/// Light border around the symbol, in modules.
pub const QUIET_ZONE: usize = 4;

const JPEG_QUALITY: u8 = 90;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// An encoded image and its actual pixel dimensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedImage {
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl RenderedImage {
    pub const fn content_type(&self) -> &'static str {
        self.format.mime()
    }
}

/// Pixel geometry of a rendered symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    /// Pixels per module.
    pub scale: u32,
    pub width: u32,
    pub height: u32,
    /// Top-left pixel of the first module, quiet zone excluded.
    pub origin_x: u32,
    pub origin_y: u32,
}

impl Layout {
    pub fn new(matrix: &QrMatrix, target_width: u32, target_height: u32) -> Self {
        let span = (matrix.size() + 2 * QUIET_ZONE) as u32;
        let scale = (target_width.min(target_height) / span).max(1);
        let extent = span * scale;
        let width = target_width.max(extent);
        let height = target_height.max(extent);
        let quiet = QUIET_ZONE as u32 * scale;
        Self {
            scale,
            width,
            height,
            origin_x: (width - extent) / 2 + quiet,
            origin_y: (height - extent) / 2 + quiet,
        }
    }

    /// The module covering pixel `(x, y)`, if the pixel is inside the symbol.
    fn module_at(&self, x: u32, y: u32) -> Option<(usize, usize)> {
        let mx = x.checked_sub(self.origin_x)? / self.scale;
        let my = y.checked_sub(self.origin_y)? / self.scale;
        Some((mx as usize, my as usize))
    }
}

/// Renders `matrix` into the container named by `mime`.
///
/// # Errors
///
/// - [`Error::UnsupportedFormat`] when `mime` has no encoder.
/// - [`Error::InternalEncoding`] when the container encoder fails.
pub fn render(
    matrix: &QrMatrix,
    target_width: u32,
    target_height: u32,
    mime: &str,
) -> Result<RenderedImage> {
    let format = OutputFormat::from_mime(mime).ok_or_else(|| Error::UnsupportedFormat {
        mime: mime.to_owned(),
    })?;
    render_as(matrix, target_width, target_height, format)
}

/// Renders `matrix` as `format`.
pub fn render_as(
    matrix: &QrMatrix,
    target_width: u32,
    target_height: u32,
    format: OutputFormat,
) -> Result<RenderedImage> {
    render_until(matrix, target_width, target_height, format, || false)
}

/// Renders `matrix` as `format`, giving up with [`Error::Cancelled`] when
/// `is_cancelled` returns `true` between rasterizing and container encoding.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(matrix, is_cancelled), fields(version = matrix.version().value())))]
pub fn render_until(
    matrix: &QrMatrix,
    target_width: u32,
    target_height: u32,
    format: OutputFormat,
    is_cancelled: impl Fn() -> bool,
) -> Result<RenderedImage> {
    let layout = Layout::new(matrix, target_width, target_height);
    let bytes = match format {
        OutputFormat::Svg => svg(matrix, &layout).into_bytes(),
        raster => {
            let img = rasterize(matrix, &layout);
            if is_cancelled() {
                return Err(Error::Cancelled);
            }
            encode_raster(&img, raster)?
        }
    };
    Ok(RenderedImage {
        format,
        width: layout.width,
        height: layout.height,
        bytes,
    })
}

/// Greyscale bitmap of the symbol: 0 for dark, 255 for light.
pub fn rasterize(matrix: &QrMatrix, layout: &Layout) -> GrayImage {
    GrayImage::from_fn(layout.width, layout.height, |x, y| {
        match layout.module_at(x, y) {
            Some((mx, my)) if matrix.get(mx, my) => DARK,
            _ => LIGHT,
        }
    })
}

fn encode_raster(img: &GrayImage, format: OutputFormat) -> Result<Vec<u8>> {
    let (width, height) = img.dimensions();
    let mut out = Vec::new();
    match format {
        OutputFormat::Png => {
            PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::NoFilter)
                .write_image(img.as_raw(), width, height, ExtendedColorType::L8)?;
        }
        OutputFormat::Jpeg => {
            JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).write_image(
                img.as_raw(),
                width,
                height,
                ExtendedColorType::L8,
            )?;
        }
        OutputFormat::Gif => {
            let rgba = DynamicImage::ImageLuma8(img.clone()).into_rgba8();
            // The trailer is written when the encoder drops.
            let mut encoder = GifEncoder::new(&mut out);
            encoder.encode(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)?;
        }
        OutputFormat::WebP => {
            WebPEncoder::new_lossless(&mut out).write_image(
                img.as_raw(),
                width,
                height,
                ExtendedColorType::L8,
            )?;
        }
        OutputFormat::Svg => {
            return Err(Error::InternalEncoding {
                context: "svg is not a raster format".into(),
            });
        }
    }
    Ok(out)
}

fn svg(matrix: &QrMatrix, layout: &Layout) -> String {
    let Layout {
        scale,
        width,
        height,
        origin_x,
        origin_y,
    } = *layout;

    let mut out = String::new();
    let _ = write!(
        out,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" \
         width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\" \
         shape-rendering=\"crispEdges\">\n\
         \t<rect width=\"100%\" height=\"100%\" fill=\"#FFFFFF\"/>\n\
         \t<path d=\""
    );
    let mut first = true;
    for y in 0..matrix.size() {
        for x in 0..matrix.size() {
            if !matrix.get(x, y) {
                continue;
            }
            if !first {
                out.push(' ');
            }
            first = false;
            let px = origin_x + x as u32 * scale;
            let py = origin_y + y as u32 * scale;
            let _ = write!(out, "M{px},{py}h{scale}v{scale}h-{scale}z");
        }
    }
    out.push_str("\" fill=\"#000000\"/>\n</svg>\n");
    out
}
