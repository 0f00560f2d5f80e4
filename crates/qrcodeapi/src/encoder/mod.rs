//! QR Code Model 2 encoder.
//!
//! Content is placed in a single segment using the most compact mode that
//! covers every character (numeric, then alphanumeric, then byte). The
//! smallest version that holds it at the preferred error-correction level is
//! chosen, the codewords are protected with Reed-Solomon blocks, and the mask
//! with the lowest penalty score is applied.

mod builder;
mod reed_solomon;
mod segment;
mod tables;


use crate::{Error, Result};
use builder::MatrixBuilder;
use reed_solomon::ReedSolomon;
use segment::{BitBuffer, Segment};

pub use segment::Mode;

/// Error-correction levels tried by [`encode`], in order.
pub const EC_POLICY: [EcLevel; 2] = [EcLevel::Medium, EcLevel::Low];

/// Error-correction level of a symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EcLevel {
    /// Recovers about 7% of codewords.
    Low,
    /// Recovers about 15% of codewords.
    Medium,
    /// Recovers about 25% of codewords.
    Quartile,
    /// Recovers about 30% of codewords.
    High,
}

impl EcLevel {
    const fn ordinal(self) -> usize {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::Quartile => 2,
            Self::High => 3,
        }
    }

    /// The two-bit value stored in the format information.
    const fn format_bits(self) -> u32 {
        match self {
            Self::Low => 1,
            Self::Medium => 0,
            Self::Quartile => 3,
            Self::High => 2,
        }
    }
}

/// A symbol version, 1 through 40.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(u8);

impl Version {
    pub const MIN: Self = Self(1);
    pub const MAX: Self = Self(40);

    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::MIN.0 && value <= Self::MAX.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /// Side length in modules.
    pub const fn size(self) -> usize {
        self.0 as usize * 4 + 17
    }

    fn all() -> impl Iterator<Item = Self> {
        (Self::MIN.0..=Self::MAX.0).map(Self)
    }
}

/// One of the eight data mask patterns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mask(u8);

impl Mask {
    pub const fn new(value: u8) -> Option<Self> {
        if value < 8 { Some(Self(value)) } else { None }
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    fn all() -> impl Iterator<Item = Self> {
        (0..8).map(Self)
    }

    /// Whether the module at `(x, y)` is flipped by this mask.
    const fn inverts(self, x: usize, y: usize) -> bool {
        match self.0 {
            0 => (x + y) % 2 == 0,
            1 => y % 2 == 0,
            2 => x % 3 == 0,
            3 => (x + y) % 3 == 0,
            4 => (x / 3 + y / 2) % 2 == 0,
            5 => x * y % 2 + x * y % 3 == 0,
            6 => (x * y % 2 + x * y % 3) % 2 == 0,
            _ => ((x + y) % 2 + x * y % 3) % 2 == 0,
        }
    }
}

/// An encoded symbol: a square grid of dark (`true`) and light modules.
///
/// Immutable once built. The grid excludes the quiet zone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrMatrix {
    version: Version,
    ec_level: EcLevel,
    mask: Mask,
    size: usize,
    modules: Vec<bool>,
}

impl QrMatrix {
    pub const fn version(&self) -> Version {
        self.version
    }

    pub const fn ec_level(&self) -> EcLevel {
        self.ec_level
    }

    pub const fn mask(&self) -> Mask {
        self.mask
    }

    /// Side length in modules, `4 * version + 17`.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` for a dark module. Coordinates outside the grid are
    /// light.
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size && self.modules[y * self.size + x]
    }

    /// Number of dark modules.
    pub fn dark_count(&self) -> usize {
        self.modules.iter().filter(|&&dark| dark).count()
    }
}

/// Encodes `content` with the default policy ([`EC_POLICY`]).
///
/// # Errors
///
/// [`Error::ContentTooLarge`] when the content does not fit a version 40
/// symbol at Low error correction.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all, fields(len = content.len())))]
pub fn encode(content: &str) -> Result<QrMatrix> {
    encode_with_levels(content, &EC_POLICY)
}

/// Encodes `content` at the first level in `levels` where it fits.
///
/// For a given level the smallest fitting version is used.
pub fn encode_with_levels(content: &str, levels: &[EcLevel]) -> Result<QrMatrix> {
    let segment = Segment::from_text(content);

    for &ec_level in levels {
        if let Some(version) = smallest_version(&segment, ec_level) {
            return Ok(build(&segment, version, ec_level));
        }
    }

    let weakest = levels.iter().min().copied().unwrap_or(EcLevel::Low);
    Err(Error::ContentTooLarge {
        length: content.len(),
        capacity_bits: tables::data_codewords(Version::MAX, weakest) * 8,
    })
}

fn smallest_version(segment: &Segment, ec_level: EcLevel) -> Option<Version> {
    Version::all().find(|&version| {
        segment
            .total_bits(version)
            .is_some_and(|bits| bits <= tables::data_codewords(version, ec_level) * 8)
    })
}

fn build(segment: &Segment, version: Version, ec_level: EcLevel) -> QrMatrix {
    let data = data_codewords(segment, version, ec_level);
    let codewords = add_ecc_and_interleave(&data, version, ec_level);

    let mut builder = MatrixBuilder::new(version);
    builder.draw_function_patterns();
    builder.draw_codewords(&codewords);
    let mask = builder.choose_mask(ec_level);
    builder.finish(ec_level, mask)
}

/// Header, payload, terminator and pad bytes, exactly filling the data
/// capacity of `version` at `ec_level`.
fn data_codewords(segment: &Segment, version: Version, ec_level: EcLevel) -> Vec<u8> {
    let capacity_bits = tables::data_codewords(version, ec_level) * 8;

    let mut bits = BitBuffer::default();
    bits.append(segment.mode().indicator(), 4);
    bits.append(
        segment.num_chars() as u32,
        segment.mode().char_count_bits(version),
    );
    bits.extend(segment.data());
    debug_assert!(bits.len() <= capacity_bits);

    let terminator = (capacity_bits - bits.len()).min(4);
    bits.append(0, terminator as u8);
    let align = bits.len().wrapping_neg() & 7;
    bits.append(0, align as u8);

    for pad in [0xEC, 0x11].into_iter().cycle() {
        if bits.len() >= capacity_bits {
            break;
        }
        bits.append(pad, 8);
    }
    bits.into_bytes()
}

/// Splits data into blocks, appends each block's ECC and interleaves the
/// result column-wise.
fn add_ecc_and_interleave(data: &[u8], version: Version, ec_level: EcLevel) -> Vec<u8> {
    let num_blocks = tables::num_blocks(version, ec_level);
    let ecc_len = tables::ecc_codewords_per_block(version, ec_level);
    let raw_codewords = tables::raw_data_modules(version) / 8;
    let num_short_blocks = num_blocks - raw_codewords % num_blocks;
    let short_block_len = raw_codewords / num_blocks;
    let short_data_len = short_block_len - ecc_len;

    let rs = ReedSolomon::new(ecc_len);
    let mut blocks = Vec::with_capacity(num_blocks);
    let mut rest = data;
    for i in 0..num_blocks {
        let data_len = short_data_len + usize::from(i >= num_short_blocks);
        let (chunk, tail) = rest.split_at(data_len);
        rest = tail;

        let mut block = Vec::with_capacity(short_block_len + 1);
        block.extend_from_slice(chunk);
        let ecc = rs.remainder(chunk);
        // Short blocks get a placeholder so every block has the same layout.
        if i < num_short_blocks {
            block.push(0);
        }
        block.extend_from_slice(&ecc);
        blocks.push(block);
    }
    debug_assert!(rest.is_empty());

    let mut result = Vec::with_capacity(raw_codewords);
    for i in 0..=short_block_len {
        for (j, block) in blocks.iter().enumerate() {
            if i != short_data_len || j >= num_short_blocks {
                result.push(block[i]);
            }
        }
    }
    debug_assert_eq!(result.len(), raw_codewords);
    result
}
