/// Reed-Solomon ECC generator over GF(2^8) with the QR reducing polynomial
/// `x^8 + x^4 + x^3 + x^2 + 1`.
pub(super) struct ReedSolomon {
    /// Generator polynomial coefficients, highest degree first, leading 1
    /// omitted.
    divisor: Vec<u8>,
}

impl ReedSolomon {
    pub(super) fn new(degree: usize) -> Self {
        debug_assert!((1..=255).contains(&degree));
        let mut divisor = vec![0_u8; degree];
        divisor[degree - 1] = 1;

        // Multiply by (x - 2^i) for i in 0..degree.
        let mut root = 1_u8;
        for _ in 0..degree {
            for j in 0..degree {
                divisor[j] = multiply(divisor[j], root);
                if j + 1 < degree {
                    divisor[j] ^= divisor[j + 1];
                }
            }
            root = multiply(root, 0x02);
        }
        Self { divisor }
    }

    /// Remainder of `data * x^degree` divided by the generator.
    pub(super) fn remainder(&self, data: &[u8]) -> Vec<u8> {
        let mut result = vec![0_u8; self.divisor.len()];
        for &b in data {
            let factor = b ^ result[0];
            result.rotate_left(1);
            if let Some(last) = result.last_mut() {
                *last = 0;
            }
            for (r, &d) in result.iter_mut().zip(&self.divisor) {
                *r ^= multiply(d, factor);
            }
        }
        result
    }
}

fn multiply(x: u8, y: u8) -> u8 {
    let mut z = 0_u8;
    for i in (0..8).rev() {
        z = (z << 1) ^ ((z >> 7) * 0x1D);
        z ^= ((y >> i) & 1) * x;
    }
    z
}
