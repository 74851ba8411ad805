//! Base 900 conversion of decimal digit strings, used by numeric compaction.
//!
//! A group of up to 44 digits is prefixed with an implicit `1` (so leading
//! zeros survive) and the resulting integer is written in base 900, most
//! significant codeword first. 45 decimal digits always fit in 160 bits.

use awint_core::{Bits, InlAwi};

use crate::error::{EncodeError, FormatError};

type U160 = InlAwi<160, { Bits::unstable_raw_digits(160) }>;

/// Maximum number of digits stored in one base 900 group.
pub const MAX_NUMERIC_DIGITS: usize = 44;
/// Maximum number of codewords produced by one base 900 group.
pub const MAX_NUMERIC_CODEWORDS: usize = 15;

/// Appends the base 900 codewords of `digits` to `out`, failing on any byte
/// that is not an ASCII digit.
pub fn encode_numeric(digits: &[u8], out: &mut Vec<u16>) -> Result<(), EncodeError> {
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(EncodeError::UnencodableCharacter);
    }
    encode_digits(digits, out);
    Ok(())
}

/// Appends the base 900 codewords of `digits`, which the caller has already
/// checked to be ASCII digits.
pub fn encode_digits(digits: &[u8], out: &mut Vec<u16>) {
    debug_assert!(digits.iter().all(u8::is_ascii_digit));
    for group in digits.chunks(MAX_NUMERIC_DIGITS) {
        encode_group(group, out);
    }
}

fn encode_group(group: &[u8], out: &mut Vec<u16>) {
    // implicit leading 1, then at most 44 digits: below 10^45 < 2^160
    let mut value = U160::uone();
    for &digit in group {
        let carry = value.digit_cin_mul_((digit - b'0').into(), 10);
        debug_assert_eq!(carry, 0);
    }

    let mut reversed = [0u16; MAX_NUMERIC_CODEWORDS + 1];
    let mut count = 0;
    while !value.is_zero() {
        let Some(rem) = value.digit_udivide_inplace_(900) else { break };
        reversed[count] = rem as u16;
        count += 1;
    }

    out.extend(reversed[..count].iter().rev());
}

/// Converts up to [MAX_NUMERIC_CODEWORDS] base 900 codewords back to their
/// decimal digits, dropping the implicit leading `1`.
pub fn decode_base900(codewords: &[u16], out: &mut Vec<u8>) -> Result<(), FormatError> {
    if codewords.len() > MAX_NUMERIC_CODEWORDS {
        return Err(FormatError::InvalidNumeric);
    }

    let mut value = U160::zero();
    for &cw in codewords {
        if value.digit_cin_mul_(cw.into(), 900) != 0 {
            return Err(FormatError::InvalidNumeric);
        }
    }

    // 2^160 has 49 decimal digits
    let mut buf = [0u8; 49];
    let mut pad = U160::zero();
    value
        .to_bytes_radix(false, &mut buf, 10, false, &mut pad)
        .map_err(|_| FormatError::InvalidNumeric)?;

    let start = buf
        .iter()
        .position(|&b| b != b'0')
        .ok_or(FormatError::InvalidNumeric)?;
    match &buf[start..] {
        [b'1', digits @ ..] => {
            out.extend_from_slice(digits);
            Ok(())
        }
        _ => Err(FormatError::InvalidNumeric),
    }
}
