use core::iter;

/// Up to 24 modules of a row, most significant bit first. A set bit is a
/// dark module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bitfield {
    bits: u32,
    len: u8,
}

impl Bitfield {
    pub const fn new(bits: u32, len: u8) -> Self {
        debug_assert!(len <= 24, "len is too big");
        Self { bits, len }
    }

    /// Number of modules.
    #[inline]
    pub const fn len(&self) -> u8 {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn bits(&self) -> u32 {
        self.bits
    }
}

impl iter::IntoIterator for Bitfield {
    type Item = bool;
    type IntoIter = Modules;

    fn into_iter(self) -> Self::IntoIter {
        Modules { bits: self.bits, remaining: self.len as u32 }
    }
}

/// Iterator over the modules of a [Bitfield], left to right.
#[derive(Debug, Clone)]
pub struct Modules {
    bits: u32,
    remaining: u32,
}

impl iter::Iterator for Modules {
    type Item = bool;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some((self.bits >> self.remaining) & 1 != 0)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let count = self.remaining as usize;
        (count, Some(count))
    }
}

impl iter::ExactSizeIterator for Modules {}
impl iter::FusedIterator for Modules {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modules_msb_first() {
        let modules: Vec<bool> = Bitfield::new(0b1101, 4).into_iter().collect();
        assert_eq!(modules, [true, true, false, true]);

        let modules: Vec<bool> = Bitfield::new(0b0001, 4).into_iter().collect();
        assert_eq!(modules, [false, false, false, true]);
        assert_eq!(Bitfield::new(1, 1).into_iter().len(), 1);
    }
}
