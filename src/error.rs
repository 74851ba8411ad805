//! Error types for PDF417 encoding and decoding.

use core::fmt;

/// Errors raised while turning a message into a laid out symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// Error correction level outside of 0..=8.
    InvalidErrorCorrectionLevel,
    /// Row or column constraints outside of 3..=90 rows and 1..=30 columns.
    InvalidDimensions,
    /// The message needs more codewords than a single symbol can hold.
    DataTooLong,
    /// No rows/columns combination in the allowed ranges fits the data.
    NoFittingDimensions,
    /// A character cannot be represented with the forced compaction or
    /// charset.
    UnencodableCharacter,
    /// Macro PDF417 segment index or file id out of range.
    InvalidMacroBlock,
    /// A data codeword is not below 929.
    InvalidCodeword,
}

/// The main error type for PDF417 decoding operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The row indicators did not yield usable barcode metadata.
    NotFound,
    /// Error correction failed.
    Checksum(ChecksumError),
    /// The corrected codewords do not form a valid bitstream.
    Format(FormatError),
}

/// Errors related to GF(929) error correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumError {
    /// More erasures than the error correction codewords can recover.
    TooManyErasures,
    /// More than 512 error correction codewords.
    TooManyEcCodewords,
    /// The Euclidean algorithm produced an unusable error locator.
    DegenerateLocator,
    /// The error locator root count does not match its degree.
    LocatorRootMismatch,
    /// A correction points before the start of the received codewords.
    PositionOutOfRange,
    /// The corrected codewords still have a non-zero syndrome.
    Uncorrectable,
    /// Every ambiguous codeword combination was tried without success.
    AmbiguityExhausted,
}

/// Errors related to the high-level bitstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    /// Less than four codewords in the symbol.
    TooFewCodewords,
    /// The symbol length descriptor does not match the symbol.
    InvalidLengthDescriptor,
    /// A numeric group does not start with the implicit leading one.
    InvalidNumeric,
    /// A Macro PDF417 field appears outside of a control block.
    UnexpectedMacroField,
    /// The Macro PDF417 control block is malformed.
    InvalidMacroBlock,
    /// ECI designator with no supported character set.
    UnsupportedCharset(u16),
    /// A mode codeword is missing its parameter.
    Truncated,
    /// Nothing was encoded in the symbol.
    Empty,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidErrorCorrectionLevel => write!(f, "error correction level must be between 0 and 8"),
            Self::InvalidDimensions => write!(f, "rows must be within 3..=90 and columns within 1..=30"),
            Self::DataTooLong => write!(f, "message does not fit in a single symbol"),
            Self::NoFittingDimensions => write!(f, "no symbol dimensions fit the data"),
            Self::UnencodableCharacter => write!(f, "character cannot be encoded with the selected mode"),
            Self::InvalidMacroBlock => write!(f, "invalid macro PDF417 segment"),
            Self::InvalidCodeword => write!(f, "codeword values must be below 929"),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "barcode metadata not found"),
            Self::Checksum(e) => write!(f, "{e}"),
            Self::Format(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Display for ChecksumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyErasures => write!(f, "too many erasures"),
            Self::TooManyEcCodewords => write!(f, "too many error correction codewords"),
            Self::DegenerateLocator => write!(f, "degenerate error locator"),
            Self::LocatorRootMismatch => write!(f, "error locator degree does not match number of roots"),
            Self::PositionOutOfRange => write!(f, "error position outside of the codewords"),
            Self::Uncorrectable => write!(f, "codewords are not correctable"),
            Self::AmbiguityExhausted => write!(f, "no ambiguous codeword combination decodes"),
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewCodewords => write!(f, "too few codewords"),
            Self::InvalidLengthDescriptor => write!(f, "invalid symbol length descriptor"),
            Self::InvalidNumeric => write!(f, "invalid numeric compaction group"),
            Self::UnexpectedMacroField => write!(f, "macro field outside of a control block"),
            Self::InvalidMacroBlock => write!(f, "invalid macro control block"),
            Self::UnsupportedCharset(eci) => write!(f, "unsupported ECI charset {eci}"),
            Self::Truncated => write!(f, "unexpected end of codewords"),
            Self::Empty => write!(f, "no data in symbol"),
        }
    }
}

impl core::error::Error for EncodeError {}
impl core::error::Error for DecodeError {}
impl core::error::Error for ChecksumError {}
impl core::error::Error for FormatError {}

impl From<ChecksumError> for DecodeError {
    fn from(e: ChecksumError) -> Self {
        Self::Checksum(e)
    }
}

impl From<FormatError> for DecodeError {
    fn from(e: FormatError) -> Self {
        Self::Format(e)
    }
}

/// Result type for PDF417 decoding operations.
pub type Result<T, E = DecodeError> = core::result::Result<T, E>;

macro_rules! bail {
    ($err:expr) => {
        return Err($err.into())
    };
}

pub(crate) use bail;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_conversion() {
        let e: DecodeError = ChecksumError::TooManyErasures.into();
        assert_eq!(e, DecodeError::Checksum(ChecksumError::TooManyErasures));
        assert_eq!(e.to_string(), "too many erasures");

        let e: DecodeError = FormatError::UnsupportedCharset(20).into();
        assert_eq!(e.to_string(), "unsupported ECI charset 20");
    }
}
