//! Reed-Solomon error correction over GF(929).

mod correction;
mod field;
mod poly;

use std::sync::OnceLock;

pub use correction::{decode, MAX_EC_CODEWORDS, MAX_ERRORS};

/// Highest error correction level.
pub const MAX_LEVEL: u8 = 8;

/// Number of error correction codewords for a given level (0-8).
pub const fn ecc_count(level: u8) -> usize {
    assert!(level <= MAX_LEVEL, "ECC level must be between 0 and 8 inclusive");
    1 << (level as usize + 1)
}

/// Minimum error correction level recommended for a number of data
/// codewords.
pub const fn recommended_level(data_codewords: usize) -> u8 {
    match data_codewords {
        0..=40 => 2,
        41..=160 => 3,
        161..=320 => 4,
        321..=863 => 5,
        _ => 6,
    }
}

/// Low to high coefficients (without the leading one) of the generator
/// polynomial `(x - 3)(x - 3^2)...(x - 3^k)` for `k = ecc_count(level)`.
fn generator(level: u8) -> &'static [u16] {
    static GENERATORS: [OnceLock<Vec<u16>>; MAX_LEVEL as usize + 1] = [const { OnceLock::new() }; MAX_LEVEL as usize + 1];
    GENERATORS[level as usize].get_or_init(|| {
        let k = ecc_count(level);
        let mut g = vec![1u16];
        for j in 1..=k {
            let root = field::exp(j);
            let mut next = vec![0u16; g.len() + 1];
            for (i, &c) in g.iter().enumerate() {
                next[i + 1] = field::add(next[i + 1], c);
                next[i] = field::sub(next[i], field::mul(root, c));
            }
            g = next;
        }
        g.truncate(k);
        g
    })
}

/// Fills the trailing `ecc_count(level)` codewords of `codewords` with the
/// error correction codewords of the leading data codewords.
pub fn generate_ecc(codewords: &mut [u16], level: u8) {
    assert!(level <= MAX_LEVEL, "ECC level must be between 0 and 8 inclusive");
    let factors = generator(level);

    assert!(codewords.len() >= factors.len());
    let (data, ecc) = codewords.split_at_mut(codewords.len() - factors.len());
    ecc.fill(0);

    let k = factors.len();
    for &cw in data.iter() {
        let t = field::add(cw, ecc[0]);

        for i in (0..k).rev() {
            let d = if i > 0 { ecc[k - i] } else { 0 };
            ecc[k - 1 - i] = field::sub(d, field::mul(t, factors[i]));
        }
    }

    for e in ecc {
        *e = field::neg(*e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT_DATA: [u16; 16] = [16, 902, 1, 278, 827, 900, 295, 902, 2, 326, 823, 544, 900, 149, 900, 900];

    #[test]
    fn test_ecc_l0() {
        let expected: [u16; 2] = [156, 765];
        let mut data = [0u16; INPUT_DATA.len() + 2];
        data[..INPUT_DATA.len()].copy_from_slice(&INPUT_DATA);
        generate_ecc(&mut data, 0);
        assert_eq!(data[INPUT_DATA.len()..], expected);
    }

    #[test]
    fn test_ecc_l1() {
        let expected: [u16; 4] = [168, 875, 63, 355];
        let mut data = [0u16; INPUT_DATA.len() + 4];
        data[..INPUT_DATA.len()].copy_from_slice(&INPUT_DATA);
        generate_ecc(&mut data, 1);
        assert_eq!(data[INPUT_DATA.len()..], expected);
    }

    #[test]
    fn test_ecc_l2() {
        let expected: [u16; 8] = [628, 715, 393, 299, 863, 601, 169, 708];
        let mut data = [0u16; INPUT_DATA.len() + 8];
        data[..INPUT_DATA.len()].copy_from_slice(&INPUT_DATA);
        generate_ecc(&mut data, 2);
        assert_eq!(data[INPUT_DATA.len()..], expected);
    }

    #[test]
    fn test_ecc_l3() {
        let expected: [u16; 16] = [232, 176, 793, 616, 476, 406, 855, 445, 84, 518, 522, 721, 607, 2, 42, 578];
        let mut data = [0u16; INPUT_DATA.len() + 16];
        data[..INPUT_DATA.len()].copy_from_slice(&INPUT_DATA);
        generate_ecc(&mut data, 3);
        assert_eq!(data[INPUT_DATA.len()..], expected);
    }

    #[test]
    fn test_ecc_l4() {
        let expected: [u16; 32] = [281, 156, 276, 668, 44, 252, 877, 30, 549, 856, 773, 639, 420, 330, 693, 329, 283, 723, 480, 482, 102, 925, 535, 892, 374, 472, 837, 331, 343, 608, 390, 364];
        let mut data = [0u16; INPUT_DATA.len() + 32];
        data[..INPUT_DATA.len()].copy_from_slice(&INPUT_DATA);
        generate_ecc(&mut data, 4);
        assert_eq!(data[INPUT_DATA.len()..], expected);
    }

    #[test]
    fn test_generator() {
        assert_eq!(generator(0), [27, 917]);
        assert_eq!(generator(8).len(), 512);
    }

    #[test]
    fn test_recommended_level() {
        assert_eq!(recommended_level(1), 2);
        assert_eq!(recommended_level(40), 2);
        assert_eq!(recommended_level(41), 3);
        assert_eq!(recommended_level(320), 4);
        assert_eq!(recommended_level(863), 5);
        assert_eq!(recommended_level(864), 6);
    }

    #[test]
    fn test_counts() {
        assert_eq!(ecc_count(0), 2);
        assert_eq!(ecc_count(8), 512);
    }
}
