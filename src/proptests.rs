//! Property-based tests for the encoders and decoders
//!
//! Messages are encoded, optionally sealed and rendered, then decoded back
//! and compared with the input.

use proptest::prelude::*;
use proptest::sample::{subsequence, Index};
use proptest::test_runner::TestCaseError;

use crate::builder::{EncodeOptions, Symbol};
use crate::decoder::{decode, decode_codewords, parse, DecoderResult};
use crate::ecc::{self, ecc_count, generate_ecc};
use crate::high_level::{encode_high_level, seal, PDF417Encoder};
use crate::matrix::Point;

/// Prefixes data codewords with their length descriptor.
fn with_length(data: &[u16]) -> Vec<u16> {
    let mut codewords = Vec::with_capacity(data.len() + 1);
    codewords.push(data.len() as u16 + 1);
    codewords.extend_from_slice(data);
    codewords
}

fn parse_data(data: &[u16]) -> Result<DecoderResult, TestCaseError> {
    parse(&with_length(data), 0).map_err(|e| TestCaseError::fail(format!("parse failed: {e}")))
}

/// Renders `symbol` two pixels per module and six per row with a 10 pixel
/// margin, then scans it from its row indicator corners.
fn scan_rendered(symbol: &Symbol) -> Result<DecoderResult, TestCaseError> {
    const MARGIN: u32 = 10;
    let render = symbol.pdf417().render().set_scale((2, 6));
    let image = render.to_bit_matrix(MARGIN);

    let codeword_width = 34;
    let left = (MARGIN + codeword_width) as f32;
    let right = (MARGIN + codeword_width * (u32::from(symbol.cols()) + 3)) as f32;
    let (top, bottom) = (MARGIN as f32, (MARGIN + render.height() - 1) as f32);
    decode(
        &image,
        Some(Point::new(left, top)),
        Some(Point::new(left, bottom)),
        Some(Point::new(right, top)),
        Some(Point::new(right, bottom)),
        codeword_width,
        codeword_width,
    )
    .map_err(|e| TestCaseError::fail(format!("scan failed: {e}")))
}

/// A codeword sequence protected at some level, with distinct positions to
/// damage: `split` of them become errors, the others erasures.
fn damaged_codewords() -> impl Strategy<Value = (u8, Vec<u16>, Vec<usize>, Index, Vec<u16>)> {
    (0u8..=4, prop::collection::vec(0u16..929, 1..60)).prop_flat_map(|(level, data)| {
        let ec = ecc_count(level);
        let mut codewords = data;
        codewords.resize(codewords.len() + ec, 0);
        generate_ecc(&mut codewords, level);

        let positions = subsequence((0..codewords.len()).collect::<Vec<_>>(), 0..=ec / 2);
        (Just(level), Just(codewords), positions, any::<Index>(), prop::collection::vec(1u16..929, ec / 2))
    })
}

proptest! {
    /// Digit strings of any length survive numeric compaction
    #[test]
    fn prop_numeric_roundtrip(digits in "[0-9]{1,150}") {
        let encoder = PDF417Encoder::new()
            .append_numeric(&digits)
            .map_err(|e| TestCaseError::fail(format!("encode failed: {e}")))?;
        prop_assert_eq!(encoder.codewords()[0], 902);

        let result = parse_data(encoder.codewords())?;
        prop_assert_eq!(result.text, digits);
    }

    /// Printable ASCII with tabs and line breaks
    #[test]
    fn prop_text_roundtrip(message in "[ -~\t\r\n]{1,120}") {
        let result = parse_data(&encode_high_level(&message))?;
        prop_assert_eq!(result.text, message);
    }

    #[test]
    fn prop_bytes_roundtrip(bytes in prop::collection::vec(any::<u8>(), 1..100)) {
        let encoder = PDF417Encoder::new().append_bytes(&bytes);
        let result = parse_data(encoder.codewords())?;
        prop_assert_eq!(result.bytes, bytes);
    }

    /// Any message, Latin-1 or not, with the automatic segmentation
    #[test]
    fn prop_high_level_roundtrip(message in "(?s).{1,60}") {
        let data = encode_high_level(&message);
        let result = parse_data(&data)?;
        prop_assert_eq!(&result.text, &message);

        let level = ecc::recommended_level(data.len());
        let capacity = data.len() + 1 + ecc_count(level);
        let sealed = seal(&data, capacity, level)
            .map_err(|e| TestCaseError::fail(format!("seal failed: {e}")))?;
        let result = decode_codewords(&sealed, level, &[])
            .map_err(|e| TestCaseError::fail(format!("decode failed: {e}")))?;
        prop_assert_eq!(result.text, message);
        prop_assert_eq!(result.errors_corrected, 0);
    }

    /// Up to `2t + k <= E` damaged codewords are repaired
    #[test]
    fn prop_ecc_corrects_within_bound((level, original, positions, split, deltas) in damaged_codewords()) {
        let split = split.index(positions.len() + 1);
        let (errors, erasures) = positions.split_at(split);

        let mut received = original.clone();
        for (&position, &delta) in errors.iter().zip(&deltas) {
            received[position] = (received[position] + delta) % 929;
        }
        for &position in erasures {
            received[position] = 0;
        }

        let corrected = ecc::decode(&mut received, ecc_count(level), erasures)
            .map_err(|e| TestCaseError::fail(format!("correction failed: {e}")))?;
        prop_assert_eq!(received, original);
        prop_assert!(corrected <= positions.len());
        prop_assert!(corrected >= errors.len());
    }

    /// More erasures than error correction codewords never decode
    #[test]
    fn prop_excess_erasures_rejected(level in 0u8..=1, data in prop::collection::vec(0u16..929, 8..40), seed in any::<Index>()) {
        let ec = ecc_count(level);
        let mut received = data;
        received.resize(received.len() + ec, 0);
        generate_ecc(&mut received, level);

        let start = seed.index(received.len() - ec);
        let erasures: Vec<usize> = (start..=start + ec).collect();
        for &position in &erasures {
            received[position] = (received[position] + 1) % 929;
        }
        prop_assert!(ecc::decode(&mut received, ec, &erasures).is_err());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Rendered symbols are found and read back by the scanning decoder
    #[test]
    fn prop_rendered_roundtrip(message in "[a-zA-Z0-9 .,:/-]{1,60}", level in 0u8..=3) {
        let options = EncodeOptions::default().set_level(level);
        let symbol = Symbol::encode(&message, &options)
            .map_err(|e| TestCaseError::fail(format!("encode failed: {e}")))?;

        let result = scan_rendered(&symbol)?;
        prop_assert_eq!(result.text, message);
        prop_assert_eq!(result.ec_level, level);
        prop_assert_eq!(result.errors_corrected, 0);
    }
}
