//! Arithmetic in GF(929), generated by 3.

use crate::tables::NUMBER_OF_CODEWORDS;

const P: u32 = NUMBER_OF_CODEWORDS as u32;

const fn build_exp() -> [u16; 929] {
    let mut table = [0u16; 929];
    let mut x = 1u32;
    let mut i = 0;
    while i < 929 {
        table[i] = x as u16;
        x = x * 3 % P;
        i += 1;
    }
    table
}

const fn build_log(exp: &[u16; 929]) -> [u16; 929] {
    let mut table = [0u16; 929];
    let mut i = 0;
    while i < 928 {
        table[exp[i] as usize] = i as u16;
        i += 1;
    }
    table
}

const EXP_TABLE: [u16; 929] = build_exp();
static EXP: [u16; 929] = EXP_TABLE;
static LOG: [u16; 929] = build_log(&EXP_TABLE);

#[inline]
pub(crate) fn add(a: u16, b: u16) -> u16 {
    ((a as u32 + b as u32) % P) as u16
}

#[inline]
pub(crate) fn sub(a: u16, b: u16) -> u16 {
    ((P + a as u32 - b as u32) % P) as u16
}

#[inline]
pub(crate) fn neg(a: u16) -> u16 {
    sub(0, a)
}

#[inline]
pub(crate) fn mul(a: u16, b: u16) -> u16 {
    if a == 0 || b == 0 {
        return 0;
    }
    EXP[(LOG[a as usize] as usize + LOG[b as usize] as usize) % (P as usize - 1)]
}

/// `3^i`, `i` taken modulo 928.
#[inline]
pub(crate) fn exp(i: usize) -> u16 {
    EXP[i % (P as usize - 1)]
}

/// Discrete logarithm of a non-zero element.
#[inline]
pub(crate) fn log(a: u16) -> usize {
    debug_assert!(a != 0);
    LOG[a as usize] as usize
}

/// Multiplicative inverse of a non-zero element.
#[inline]
pub(crate) fn inverse(a: u16) -> u16 {
    debug_assert!(a != 0);
    EXP[P as usize - 1 - LOG[a as usize] as usize]
}
