//! PDF417 encoder, renderer and scanning decoder.
//!
//! Messages are turned into codewords by the high level encoder
//! ([encode_high_level], [PDF417Encoder]), laid out with error correction in a
//! [Symbol] and rendered row by row. The decoder goes the other way: from the
//! corners of a symbol in a [BitMatrix] ([decode]) or straight from its
//! codewords ([decode_codewords]).
//!
//! ```
//! use pdf417_codec::{decode_codewords, EncodeOptions, Symbol};
//!
//! let symbol = Symbol::encode("Hello, PDF417!", &EncodeOptions::default()).unwrap();
//! let result = decode_codewords(symbol.codewords(), symbol.level(), &[]).unwrap();
//! assert_eq!(result.text, "Hello, PDF417!");
//! ```

#[macro_use]
mod log;

mod builder;
mod error;
mod high_level;
mod macro_block;
mod matrix;
mod numeric;

pub mod decoder;
pub mod ecc;
pub mod generators;
pub mod tables;

#[cfg(feature = "embedded-graphics")]
mod graphics;

#[cfg(test)]
mod proptests;

pub use builder::{EncodeOptions, PDF417Render, Symbol, MAX_COLS, MAX_ROWS, MIN_COLS, MIN_ROWS, PDF417};
pub use decoder::{decode, decode_codewords, DecoderResult, MacroMetadata};
pub use error::{ChecksumError, DecodeError, EncodeError, FormatError, Result};
pub use high_level::{
    determine_consecutive_binary_count, determine_consecutive_digit_count, determine_consecutive_text_count,
    encode, encode_high_level, Charset, Compaction, PDF417Encoder, CW_PADDING, ECI_CODE_PAGE, ECI_CUSTOM_ID,
    ECI_GENERAL_ID, ECI_UTF8, MACRO_CONTROL_BLOCK, MACRO_OPTIONAL_FIELD, MACRO_TERMINATOR, M_LATCH_BYTE,
    M_LATCH_BYTE_M6, M_LATCH_NUMERIC, M_LATCH_TEXT, M_SHIFT_BYTE,
};
pub use macro_block::{MacroBlock, MAX_SEGMENT_INDEX};
pub use matrix::{BitMatrix, Point};
pub use numeric::{MAX_NUMERIC_CODEWORDS, MAX_NUMERIC_DIGITS};

#[cfg(feature = "embedded-graphics")]
pub use graphics::Pdf417Drawable;
