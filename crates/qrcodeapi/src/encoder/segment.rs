use super::Version;

const ALPHANUMERIC_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// Data encoding mode of a segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Decimal digits, 10 bits per 3 digits.
    Numeric,
    /// Upper-case letters, digits and ` $%*+-./:`, 11 bits per 2 characters.
    Alphanumeric,
    /// Raw bytes (UTF-8 for text), 8 bits each.
    Byte,
}

impl Mode {
    /// Most compact mode able to represent every character of `text`.
    pub fn for_text(text: &str) -> Self {
        if text.bytes().all(|b| b.is_ascii_digit()) {
            Self::Numeric
        } else if text.chars().all(|c| ALPHANUMERIC_CHARSET.contains(c)) {
            Self::Alphanumeric
        } else {
            Self::Byte
        }
    }

    pub(super) const fn indicator(self) -> u32 {
        match self {
            Self::Numeric => 0x1,
            Self::Alphanumeric => 0x2,
            Self::Byte => 0x4,
        }
    }

    /// Width of the character count field, which grows at versions 10 and 27.
    pub(super) const fn char_count_bits(self, version: Version) -> u8 {
        let widths = match self {
            Self::Numeric => [10, 12, 14],
            Self::Alphanumeric => [9, 11, 13],
            Self::Byte => [8, 16, 16],
        };
        widths[(version.value() as usize + 7) / 17]
    }
}

/// Append-only bit sequence, most significant bit first.
#[derive(Clone, Debug, Default)]
pub(super) struct BitBuffer {
    bytes: Vec<u8>,
    len: usize,
}

impl BitBuffer {
    pub(super) const fn len(&self) -> usize {
        self.len
    }

    /// Appends the low `count` bits of `value`.
    pub(super) fn append(&mut self, value: u32, count: u8) {
        debug_assert!(count <= 31 && value >> count == 0);
        for i in (0..count).rev() {
            self.push((value >> i) & 1 != 0);
        }
    }

    pub(super) fn extend(&mut self, other: &Self) {
        for i in 0..other.len {
            self.push(other.bit(i));
        }
    }

    pub(super) fn into_bytes(self) -> Vec<u8> {
        debug_assert_eq!(self.len % 8, 0);
        self.bytes
    }

    fn push(&mut self, bit: bool) {
        if self.len % 8 == 0 {
            self.bytes.push(0);
        }
        if bit {
            let last = self.bytes.len() - 1;
            self.bytes[last] |= 0x80 >> (self.len % 8);
        }
        self.len += 1;
    }

    fn bit(&self, i: usize) -> bool {
        self.bytes[i / 8] & (0x80 >> (i % 8)) != 0
    }
}

/// A run of characters encoded in one mode, without its header.
#[derive(Clone, Debug)]
pub(super) struct Segment {
    mode: Mode,
    num_chars: usize,
    data: BitBuffer,
}

impl Segment {
    pub(super) fn from_text(text: &str) -> Self {
        match Mode::for_text(text) {
            Mode::Numeric => Self::numeric(text),
            Mode::Alphanumeric => Self::alphanumeric(text),
            Mode::Byte => Self::bytes(text.as_bytes()),
        }
    }

    fn numeric(text: &str) -> Self {
        let mut data = BitBuffer::default();
        for group in text.as_bytes().chunks(3) {
            let value = group
                .iter()
                .fold(0, |acc, &digit| acc * 10 + u32::from(digit - b'0'));
            data.append(value, group.len() as u8 * 3 + 1);
        }
        Self {
            mode: Mode::Numeric,
            num_chars: text.len(),
            data,
        }
    }

    fn alphanumeric(text: &str) -> Self {
        let values: Vec<u32> = text
            .chars()
            .filter_map(|c| ALPHANUMERIC_CHARSET.find(c))
            .map(|i| i as u32)
            .collect();
        let mut data = BitBuffer::default();
        for pair in values.chunks(2) {
            match *pair {
                [first, second] => data.append(first * 45 + second, 11),
                [single] => data.append(single, 6),
                _ => unreachable!("chunks(2) yields one or two values"),
            }
        }
        Self {
            mode: Mode::Alphanumeric,
            num_chars: values.len(),
            data,
        }
    }

    fn bytes(bytes: &[u8]) -> Self {
        let mut data = BitBuffer::default();
        for &b in bytes {
            data.append(u32::from(b), 8);
        }
        Self {
            mode: Mode::Byte,
            num_chars: bytes.len(),
            data,
        }
    }

    pub(super) const fn mode(&self) -> Mode {
        self.mode
    }

    pub(super) const fn num_chars(&self) -> usize {
        self.num_chars
    }

    pub(super) const fn data(&self) -> &BitBuffer {
        &self.data
    }

    /// Bits needed for header plus data at `version`, or `None` when the
    /// character count overflows its field.
    pub(super) fn total_bits(&self, version: Version) -> Option<usize> {
        let count_bits = self.mode.char_count_bits(version);
        if self.num_chars >= 1 << count_bits {
            return None;
        }
        Some(4 + usize::from(count_bits) + self.data.len())
    }
}
