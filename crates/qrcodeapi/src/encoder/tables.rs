//! Capacity tables from ISO/IEC 18004, indexed by `[ec_level][version]`.
//! Column 0 is unused.

use super::{EcLevel, Version};

#[rustfmt::skip]
const ECC_CODEWORDS_PER_BLOCK: [[u8; 41]; 4] = [
    // Low
    [0,  7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28, 30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30],
    // Medium
    [0, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28],
    // Quartile
    [0, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30, 30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30],
    // High
    [0, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30],
];

#[rustfmt::skip]
const NUM_ERROR_CORRECTION_BLOCKS: [[u8; 41]; 4] = [
    // Low
    [0, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4,  4,  4,  4,  4,  6,  6,  6,  6,  7,  8,  8,  9,  9, 10, 12, 12, 12, 13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25],
    // Medium
    [0, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5,  5,  8,  9,  9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21, 23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49],
    // Quartile
    [0, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8,  8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27, 29, 34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68],
    // High
    [0, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32, 35, 37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81],
];

pub(super) fn ecc_codewords_per_block(version: Version, ec_level: EcLevel) -> usize {
    ECC_CODEWORDS_PER_BLOCK[ec_level.ordinal()][usize::from(version.value())].into()
}

pub(super) fn num_blocks(version: Version, ec_level: EcLevel) -> usize {
    NUM_ERROR_CORRECTION_BLOCKS[ec_level.ordinal()][usize::from(version.value())].into()
}

/// Modules available for data and ECC once every function pattern is placed,
/// including remainder bits.
pub(super) fn raw_data_modules(version: Version) -> usize {
    let v = usize::from(version.value());
    let mut result = (16 * v + 128) * v + 64;
    if v >= 2 {
        let num_align = v / 7 + 2;
        result -= (25 * num_align - 10) * num_align - 55;
        if v >= 7 {
            result -= 36;
        }
    }
    result
}

/// Data codewords (excluding ECC) in a symbol.
pub(super) fn data_codewords(version: Version, ec_level: EcLevel) -> usize {
    raw_data_modules(version) / 8
        - ecc_codewords_per_block(version, ec_level) * num_blocks(version, ec_level)
}
