//! Binary images consumed by the scanning decoder and produced by the
//! renderer.

/// Packed bit matrix, `true` for a dark pixel. Reads outside of the matrix
/// return `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl BitMatrix {
    /// Creates a light matrix of the given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, data: vec![0; (width * height).div_ceil(8)] }
    }

    /// Builds a matrix from row major pixels.
    pub fn from_bits(width: usize, height: usize, bits: impl IntoIterator<Item = bool>) -> Self {
        let mut matrix = Self::new(width, height);
        for (i, bit) in bits.into_iter().take(width * height).enumerate() {
            if bit {
                matrix.data[i / 8] |= 1 << (i % 8);
            }
        }
        matrix
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> Option<(usize, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y * self.width + x;
        Some((index / 8, 1 << (index % 8)))
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.index(x, y).is_some_and(|(byte, mask)| self.data[byte] & mask != 0)
    }

    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if let Some((byte, mask)) = self.index(x, y) {
            if value {
                self.data[byte] |= mask;
            } else {
                self.data[byte] &= !mask;
            }
        }
    }

    pub fn toggle(&mut self, x: usize, y: usize) {
        if let Some((byte, mask)) = self.index(x, y) {
            self.data[byte] ^= mask;
        }
    }

    /// Sets every pixel of the `width` x `height` rectangle at `(left, top)`.
    pub fn fill_rect(&mut self, left: usize, top: usize, width: usize, height: usize) {
        for y in top..(top + height).min(self.height) {
            for x in left..(left + width).min(self.width) {
                self.set(x, y, true);
            }
        }
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }
}

/// Image coordinates with sub-pixel precision.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_matrix() {
        let mut matrix = BitMatrix::new(9, 5);
        assert_eq!(matrix.width(), 9);
        assert_eq!(matrix.height(), 5);

        matrix.set(8, 4, true);
        assert!(matrix.get(8, 4));
        assert!(!matrix.get(7, 4));

        matrix.toggle(8, 4);
        assert!(!matrix.get(8, 4));

        matrix.fill_rect(1, 1, 2, 10);
        assert!(matrix.get(2, 4));
        assert!(!matrix.get(3, 4));

        matrix.clear();
        assert!(!matrix.get(2, 4));
    }

    #[test]
    fn test_out_of_bounds() {
        let mut matrix = BitMatrix::new(8, 8);
        matrix.set(10, 10, true); // Should not panic
        matrix.toggle(8, 0);
        assert!(!matrix.get(10, 10));
        assert!(!matrix.get(8, 0));
    }

    #[test]
    fn test_from_bits() {
        let matrix = BitMatrix::from_bits(3, 2, [true, false, false, false, false, true]);
        assert!(matrix.get(0, 0));
        assert!(matrix.get(2, 1));
        assert!(!matrix.get(1, 0));
    }
}
