//! Errors-and-erasures decoding of PDF417 codewords.
//!
//! Erased positions are folded into the errata locator up front (Forney
//! syndromes), which lets the decoder recover any combination of `t` errors
//! and `k` erasures with `2t + k` not above the number of error correction
//! codewords.

use super::{field, poly::ModulusPoly};
use crate::error::ChecksumError;
use crate::tables::NUMBER_OF_CODEWORDS;

/// Extra erasures tolerated on top of half the error correction codewords.
pub const MAX_ERRORS: usize = 3;
/// Upper bound on error correction codewords in a symbol.
pub const MAX_EC_CODEWORDS: usize = 512;

/// Corrects `received` in place. `num_ec_codewords` is the number of trailing
/// error correction codewords and `erasures` lists positions known to be
/// unreliable. Returns the number of corrected positions.
pub fn decode(
    received: &mut [u16],
    num_ec_codewords: usize,
    erasures: &[usize],
) -> Result<usize, ChecksumError> {
    if erasures.len() > num_ec_codewords / 2 + MAX_ERRORS {
        return Err(ChecksumError::TooManyErasures);
    }
    if num_ec_codewords > MAX_EC_CODEWORDS {
        return Err(ChecksumError::TooManyEcCodewords);
    }

    let mut erasures = erasures.to_vec();
    erasures.sort_unstable();
    erasures.dedup();
    // Each erasure costs one syndrome.
    if erasures.len() > num_ec_codewords {
        return Err(ChecksumError::TooManyErasures);
    }

    let n = received.len();
    let received_poly = ModulusPoly::new(received.to_vec());
    let syndromes = ModulusPoly::new(
        (1..=num_ec_codewords)
            .rev()
            .map(|i| received_poly.evaluate_at(field::exp(i)))
            .collect(),
    );
    if syndromes.is_zero() {
        return Ok(0);
    }

    let mut erasure_locator = ModulusPoly::one();
    for &position in &erasures {
        if position >= n {
            return Err(ChecksumError::PositionOutOfRange);
        }
        let location = field::exp(n - 1 - position);
        erasure_locator = erasure_locator.multiply(&ModulusPoly::new(vec![field::neg(location), 1]));
    }

    let forney = syndromes.multiply(&erasure_locator).truncate(num_ec_codewords);
    let sigma = run_euclidean_algorithm(forney, num_ec_codewords, erasures.len())?;
    if 2 * sigma.degree() + erasures.len() > num_ec_codewords {
        return Err(ChecksumError::Uncorrectable);
    }
    let errata_locator = sigma.multiply(&erasure_locator);
    let evaluator = syndromes.multiply(&errata_locator).truncate(num_ec_codewords);

    let locations = find_errata_locations(&errata_locator)?;
    let derivative = errata_locator.formal_derivative();
    for &location in &locations {
        let x_inverse = field::inverse(location);
        let numerator = field::neg(evaluator.evaluate_at(x_inverse));
        let denominator = derivative.evaluate_at(x_inverse);
        if denominator == 0 {
            return Err(ChecksumError::DegenerateLocator);
        }
        let magnitude = field::mul(numerator, field::inverse(denominator));

        let position = (n - 1)
            .checked_sub(field::log(location))
            .ok_or(ChecksumError::PositionOutOfRange)?;
        received[position] = field::sub(received[position], magnitude);
    }

    let corrected = ModulusPoly::new(received.to_vec());
    if (1..=num_ec_codewords).any(|i| corrected.evaluate_at(field::exp(i)) != 0) {
        return Err(ChecksumError::Uncorrectable);
    }

    ltrace!("corrected {} errata ({} erasures)", locations.len(), erasures.len());
    Ok(locations.len())
}

/// Returns the error locator normalised so that its constant term is one.
fn run_euclidean_algorithm(
    forney: ModulusPoly,
    num_ec_codewords: usize,
    num_erasures: usize,
) -> Result<ModulusPoly, ChecksumError> {
    let mut r_last = ModulusPoly::monomial(num_ec_codewords, 1);
    let mut r = forney;
    let mut t_last = ModulusPoly::zero();
    let mut t = ModulusPoly::one();

    while 2 * r.degree() >= num_ec_codewords + num_erasures && !r.is_zero() {
        let r_last_last = core::mem::replace(&mut r_last, r);
        let t_last_last = core::mem::replace(&mut t_last, t);
        if r_last.is_zero() {
            return Err(ChecksumError::DegenerateLocator);
        }

        let (quotient, remainder) = r_last_last.divide(&r_last);
        r = remainder;
        t = t_last_last.subtract(&quotient.multiply(&t_last));

        if r.degree() >= r_last.degree() {
            return Err(ChecksumError::DegenerateLocator);
        }
    }

    let sigma_tilde_at_zero = t.coefficient(0);
    if sigma_tilde_at_zero == 0 {
        return Err(ChecksumError::DegenerateLocator);
    }
    Ok(t.multiply_scalar(field::inverse(sigma_tilde_at_zero)))
}

/// Chien search: the locations are the inverses of the locator's roots.
fn find_errata_locations(locator: &ModulusPoly) -> Result<Vec<u16>, ChecksumError> {
    let degree = locator.degree();
    let mut locations = Vec::with_capacity(degree);
    for i in 1..NUMBER_OF_CODEWORDS {
        if locations.len() == degree {
            break;
        }
        if locator.evaluate_at(i) == 0 {
            locations.push(field::inverse(i));
        }
    }
    if locations.len() != degree {
        return Err(ChecksumError::LocatorRootMismatch);
    }
    Ok(locations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecc::{ecc_count, generate_ecc};

    const DATA: [u16; 16] = [16, 902, 1, 278, 827, 900, 295, 902, 2, 326, 823, 544, 900, 149, 900, 900];

    fn encoded(level: u8) -> Vec<u16> {
        let mut cws = DATA.to_vec();
        cws.resize(DATA.len() + ecc_count(level), 0);
        generate_ecc(&mut cws, level);
        cws
    }

    #[test]
    fn test_no_errors() {
        let mut cws = encoded(2);
        assert_eq!(decode(&mut cws, 8, &[]), Ok(0));
        assert_eq!(cws, encoded(2));
    }

    #[test]
    fn test_errors_only() {
        let expected = encoded(3);
        let mut cws = expected.clone();
        for (i, p) in [0usize, 5, 9, 17, 20, 25, 30, 31].into_iter().enumerate() {
            cws[p] = (cws[p] + 1 + i as u16 * 97) % 929;
        }
        assert_eq!(decode(&mut cws, 16, &[]), Ok(8));
        assert_eq!(cws, expected);
    }

    #[test]
    fn test_errors_and_erasures() {
        let expected = encoded(3);
        let mut cws = expected.clone();
        let erasures = [1usize, 2, 3, 4, 10, 11];
        for &p in &erasures {
            cws[p] = 0;
        }
        for p in [7usize, 14, 22, 28, 29] {
            cws[p] = (cws[p] + 500) % 929;
        }
        // 2 * 5 + 6 = 16
        let corrected = decode(&mut cws, 16, &erasures).unwrap();
        assert_eq!(cws, expected);
        assert_eq!(corrected, 11);
    }

    #[test]
    fn test_erasures_at_correct_values() {
        let expected = encoded(1);
        let mut cws = expected.clone();
        cws[3] = 0;
        assert_eq!(decode(&mut cws, 4, &[3, 3, 12]).map(|_| ()), Ok(()));
        assert_eq!(cws, expected);
    }

    #[test]
    fn test_preconditions() {
        let mut cws = encoded(0);
        cws[0] = 1;
        assert_eq!(decode(&mut cws, 2, &[0, 1, 2, 3, 4]), Err(ChecksumError::TooManyErasures));
        assert_eq!(decode(&mut cws, 513, &[]), Err(ChecksumError::TooManyEcCodewords));
        assert_eq!(decode(&mut cws, 2, &[40]), Err(ChecksumError::PositionOutOfRange));
    }

    #[test]
    fn test_more_erasures_than_ec_codewords() {
        let expected = encoded(0);
        let mut cws = expected.clone();
        for p in [2usize, 3, 4] {
            cws[p] = (cws[p] + 7) % 929;
        }
        assert_eq!(decode(&mut cws, 2, &[2, 3, 4]), Err(ChecksumError::TooManyErasures));
        assert_eq!(decode(&mut cws, 2, &[4, 2, 3, 2]), Err(ChecksumError::TooManyErasures));

        // Duplicates count once, so two distinct erasures still fit.
        let mut cws = expected.clone();
        cws[2] = 0;
        cws[3] = 0;
        assert_eq!(decode(&mut cws, 2, &[3, 2, 3]), Ok(2));
        assert_eq!(cws, expected);
    }

    #[test]
    fn test_too_many_errors_is_detected() {
        let mut cws = encoded(1);
        for p in [0usize, 4, 8] {
            cws[p] = (cws[p] + 1) % 929;
        }
        assert!(decode(&mut cws, 4, &[]).is_err());
    }
}
