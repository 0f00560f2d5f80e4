use super::{EcLevel, Mask, QrMatrix, Version};

const PENALTY_N1: u32 = 3;
const PENALTY_N2: u32 = 3;
const PENALTY_N3: u32 = 40;
const PENALTY_N4: u32 = 10;

/// Mutable grid used while a symbol is being drawn.
///
/// `is_function` marks modules owned by function patterns; masking and data
/// placement leave them alone.
pub(super) struct MatrixBuilder {
    version: Version,
    size: usize,
    modules: Vec<bool>,
    is_function: Vec<bool>,
}

impl MatrixBuilder {
    pub(super) fn new(version: Version) -> Self {
        let size = version.size();
        Self {
            version,
            size,
            modules: vec![false; size * size],
            is_function: vec![false; size * size],
        }
    }

    pub(super) fn draw_function_patterns(&mut self) {
        for i in 0..self.size {
            self.set_function(6, i, i % 2 == 0);
            self.set_function(i, 6, i % 2 == 0);
        }

        let far = self.size - 4;
        self.draw_finder(3, 3);
        self.draw_finder(far, 3);
        self.draw_finder(3, far);

        let positions = alignment_positions(self.version);
        let last = positions.len().saturating_sub(1);
        for (i, &y) in positions.iter().enumerate() {
            for (j, &x) in positions.iter().enumerate() {
                // These three overlap the finder patterns.
                let corner = (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0);
                if !corner {
                    self.draw_alignment(x, y);
                }
            }
        }

        // Reserve the format areas; the real bits are written once a mask is
        // chosen.
        self.draw_format_bits(EcLevel::Low, Mask(0));
        self.draw_version();
    }

    /// Places the codeword bits in the two-column zigzag, skipping function
    /// modules. Modules left over at the end stay light.
    pub(super) fn draw_codewords(&mut self, codewords: &[u8]) {
        let total_bits = codewords.len() * 8;
        let mut i = 0;
        let mut right = self.size - 1;
        loop {
            if right == 6 {
                right = 5;
            }
            let upward = (right + 1) & 2 == 0;
            for vert in 0..self.size {
                let y = if upward { self.size - 1 - vert } else { vert };
                for x in [right, right - 1] {
                    let idx = y * self.size + x;
                    if !self.is_function[idx] && i < total_bits {
                        self.modules[idx] = (codewords[i / 8] >> (7 - i % 8)) & 1 != 0;
                        i += 1;
                    }
                }
            }
            if right < 2 {
                break;
            }
            right -= 2;
        }
        debug_assert_eq!(i, total_bits);
    }

    /// Evaluates all eight masks and returns the one with the lowest penalty.
    /// Ties go to the lower mask number.
    pub(super) fn choose_mask(&mut self, ec_level: EcLevel) -> Mask {
        let mut best = Mask(0);
        let mut best_score = u32::MAX;
        for mask in Mask::all() {
            self.apply_mask(mask);
            self.draw_format_bits(ec_level, mask);
            let score = self.penalty_score();
            if score < best_score {
                best = mask;
                best_score = score;
            }
            // XOR is its own inverse.
            self.apply_mask(mask);
        }
        best
    }

    pub(super) fn finish(mut self, ec_level: EcLevel, mask: Mask) -> QrMatrix {
        self.apply_mask(mask);
        self.draw_format_bits(ec_level, mask);
        QrMatrix {
            version: self.version,
            ec_level,
            mask,
            size: self.size,
            modules: self.modules,
        }
    }

    fn get(&self, x: usize, y: usize) -> bool {
        self.modules[y * self.size + x]
    }

    fn set_function(&mut self, x: usize, y: usize, dark: bool) {
        let idx = y * self.size + x;
        self.modules[idx] = dark;
        self.is_function[idx] = true;
    }

    /// 7x7 finder centred on `(cx, cy)` plus its one-module separator.
    fn draw_finder(&mut self, cx: usize, cy: usize) {
        for dy in -4_isize..=4 {
            for dx in -4_isize..=4 {
                let (Some(x), Some(y)) = (cx.checked_add_signed(dx), cy.checked_add_signed(dy))
                else {
                    continue;
                };
                if x < self.size && y < self.size {
                    let dist = dx.abs().max(dy.abs());
                    self.set_function(x, y, dist != 2 && dist != 4);
                }
            }
        }
    }

    fn draw_alignment(&mut self, cx: usize, cy: usize) {
        for dy in 0..5_usize {
            for dx in 0..5_usize {
                let dist = dx.abs_diff(2).max(dy.abs_diff(2));
                self.set_function(cx + dx - 2, cy + dy - 2, dist != 1);
            }
        }
    }

    fn draw_format_bits(&mut self, ec_level: EcLevel, mask: Mask) {
        let data = ec_level.format_bits() << 3 | u32::from(mask.value());
        let mut rem = data;
        for _ in 0..10 {
            rem = (rem << 1) ^ ((rem >> 9) * 0x537);
        }
        let bits = (data << 10 | rem) ^ 0x5412;
        let bit = |i: usize| (bits >> i) & 1 != 0;

        // Around the top-left finder.
        for i in 0..=5 {
            self.set_function(8, i, bit(i));
        }
        self.set_function(8, 7, bit(6));
        self.set_function(8, 8, bit(7));
        self.set_function(7, 8, bit(8));
        for i in 9..15 {
            self.set_function(14 - i, 8, bit(i));
        }

        // Split between the other two finders.
        let size = self.size;
        for i in 0..8 {
            self.set_function(size - 1 - i, 8, bit(i));
        }
        for i in 8..15 {
            self.set_function(8, size - 15 + i, bit(i));
        }
        self.set_function(8, size - 8, true);
    }

    fn draw_version(&mut self) {
        let version = u32::from(self.version.value());
        if version < 7 {
            return;
        }
        let mut rem = version;
        for _ in 0..12 {
            rem = (rem << 1) ^ ((rem >> 11) * 0x1F25);
        }
        let bits = version << 12 | rem;

        for i in 0..18 {
            let dark = (bits >> i) & 1 != 0;
            let a = self.size - 11 + i % 3;
            let b = i / 3;
            self.set_function(a, b, dark);
            self.set_function(b, a, dark);
        }
    }

    fn apply_mask(&mut self, mask: Mask) {
        for y in 0..self.size {
            for x in 0..self.size {
                let idx = y * self.size + x;
                if !self.is_function[idx] && mask.inverts(x, y) {
                    self.modules[idx] ^= true;
                }
            }
        }
    }

    fn penalty_score(&self) -> u32 {
        let size = self.size;
        let mut result = 0;

        for y in 0..size {
            result += self.line_penalty((0..size).map(|x| self.get(x, y)));
        }
        for x in 0..size {
            result += self.line_penalty((0..size).map(|y| self.get(x, y)));
        }

        for y in 0..size - 1 {
            for x in 0..size - 1 {
                let color = self.get(x, y);
                if color == self.get(x + 1, y)
                    && color == self.get(x, y + 1)
                    && color == self.get(x + 1, y + 1)
                {
                    result += PENALTY_N2;
                }
            }
        }

        let dark = self.modules.iter().filter(|&&m| m).count();
        let total = size * size;
        // Each 5% step away from an even split costs N4.
        let k = ((dark * 20).abs_diff(total * 10) + total - 1) / total - 1;
        result + k as u32 * PENALTY_N4
    }

    /// Run-length (N1) and finder-like (N3) penalties for one row or column.
    fn line_penalty(&self, line: impl Iterator<Item = bool>) -> u32 {
        let mut result = 0;
        let mut history = RunHistory::new(self.size);
        let mut run_color = false;
        let mut run_len = 0;

        for color in line {
            if color == run_color {
                run_len += 1;
                if run_len == 5 {
                    result += PENALTY_N1;
                } else if run_len > 5 {
                    result += 1;
                }
            } else {
                history.push(run_len);
                if !run_color {
                    result += history.count_patterns() * PENALTY_N3;
                }
                run_color = color;
                run_len = 1;
            }
        }
        result + history.terminate(run_color, run_len) * PENALTY_N3
    }
}

/// The last seven run lengths of a line, newest first. The light border
/// outside the symbol counts as part of the first and last light runs.
struct RunHistory {
    size: usize,
    runs: [usize; 7],
}

impl RunHistory {
    const fn new(size: usize) -> Self {
        Self { size, runs: [0; 7] }
    }

    fn push(&mut self, mut run_len: usize) {
        if self.runs[0] == 0 {
            run_len += self.size;
        }
        self.runs.copy_within(0..6, 1);
        self.runs[0] = run_len;
    }

    /// Counts 1:1:3:1:1 dark-light patterns with a 4-module light run on
    /// either side.
    fn count_patterns(&self) -> u32 {
        let r = &self.runs;
        let n = r[1];
        let core = n > 0 && r[2] == n && r[3] == n * 3 && r[4] == n && r[5] == n;
        u32::from(core && r[0] >= n * 4 && r[6] >= n) + u32::from(core && r[6] >= n * 4 && r[0] >= n)
    }

    fn terminate(&mut self, run_color: bool, mut run_len: usize) -> u32 {
        if run_color {
            self.push(run_len);
            run_len = 0;
        }
        run_len += self.size;
        self.push(run_len);
        self.count_patterns()
    }
}

/// Centre coordinates of alignment patterns, ascending. Empty for version 1.
pub(super) fn alignment_positions(version: Version) -> Vec<usize> {
    let v = usize::from(version.value());
    if v == 1 {
        return Vec::new();
    }
    let count = v / 7 + 2;
    let step = if v == 32 {
        26
    } else {
        (v * 4 + count * 2 + 1) / (count * 2 - 2) * 2
    };

    let last = version.size() - 7;
    let mut positions = vec![6; count];
    for (k, slot) in positions.iter_mut().skip(1).rev().enumerate() {
        *slot = last - k * step;
    }
    positions
}
