//! Macro PDF417: structured append of a file over several symbols.

use crate::error::EncodeError;
use crate::high_level::{MACRO_CONTROL_BLOCK, MACRO_OPTIONAL_FIELD, MACRO_TERMINATOR};
use crate::numeric::encode_numeric;

/// Optional field designators following [MACRO_OPTIONAL_FIELD].
pub(crate) mod field {
    pub const FILE_NAME: u16 = 0;
    pub const SEGMENT_COUNT: u16 = 1;
    pub const TIMESTAMP: u16 = 2;
    pub const SENDER: u16 = 3;
    pub const ADDRESSEE: u16 = 4;
    pub const FILE_SIZE: u16 = 5;
    pub const CHECKSUM: u16 = 6;
}

/// Largest segment index.
pub const MAX_SEGMENT_INDEX: u32 = 99_998;

/// Macro PDF417 control block appended at the end of the data codewords of
/// each symbol of a sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroBlock {
    /// Position of this symbol in the sequence, starting at 0.
    pub segment_index: u32,
    /// File identifier shared by every symbol of the sequence, as raw
    /// codewords (each below 900).
    pub file_id: Vec<u16>,
    pub file_name: Option<String>,
    pub segment_count: Option<u32>,
    /// Seconds since the Unix epoch.
    pub timestamp: Option<u64>,
    pub sender: Option<String>,
    pub addressee: Option<String>,
    pub file_size: Option<u64>,
    /// CRC-16 of the whole file.
    pub checksum: Option<u16>,
    /// Marks the last symbol of the sequence.
    pub last_segment: bool,
}

impl MacroBlock {
    pub fn new(segment_index: u32, file_id: &[u16]) -> Self {
        Self { segment_index, file_id: file_id.to_vec(), ..Default::default() }
    }

    pub fn set_file_name(mut self, name: &str) -> Self {
        self.file_name = Some(name.to_owned());
        self
    }

    pub const fn set_segment_count(mut self, count: u32) -> Self {
        self.segment_count = Some(count);
        self
    }

    pub const fn set_last_segment(mut self, last: bool) -> Self {
        self.last_segment = last;
        self
    }

    /// Appends the control block codewords to `out`.
    pub fn encode(&self, out: &mut Vec<u16>) -> Result<(), EncodeError> {
        if self.segment_index > MAX_SEGMENT_INDEX || self.file_id.iter().any(|&cw| cw >= 900) {
            return Err(EncodeError::InvalidMacroBlock);
        }

        out.push(MACRO_CONTROL_BLOCK);
        // five digits, always two codewords
        encode_numeric(format!("{:05}", self.segment_index).as_bytes(), out)?;
        out.extend_from_slice(&self.file_id);

        let text_fields = [
            (field::FILE_NAME, &self.file_name),
            (field::SENDER, &self.sender),
            (field::ADDRESSEE, &self.addressee),
        ];
        for (designator, value) in text_fields {
            if let Some(value) = value {
                out.extend([MACRO_OPTIONAL_FIELD, designator]);
                encode_field_text(value, out)?;
            }
        }

        let numeric_fields = [
            (field::SEGMENT_COUNT, self.segment_count.map(u64::from)),
            (field::TIMESTAMP, self.timestamp),
            (field::FILE_SIZE, self.file_size),
            (field::CHECKSUM, self.checksum.map(u64::from)),
        ];
        for (designator, value) in numeric_fields {
            if let Some(value) = value {
                out.extend([MACRO_OPTIONAL_FIELD, designator]);
                encode_numeric(value.to_string().as_bytes(), out)?;
            }
        }

        if self.last_segment {
            out.push(MACRO_TERMINATOR);
        }
        Ok(())
    }
}

/// Text fields are text compacted starting in the alpha sub-mode, with no
/// latch in front of them.
fn encode_field_text(value: &str, out: &mut Vec<u16>) -> Result<(), EncodeError> {
    let encoded = crate::high_level::encode(
        value,
        crate::high_level::Compaction::Text,
        crate::high_level::Charset::Latin1,
    )?;
    // skip the text latch
    out.extend_from_slice(encoded.get(1..).unwrap_or_default());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_minimal() {
        let mut out = Vec::new();
        MacroBlock::new(0, &[17, 53]).encode(&mut out).unwrap();
        // "100000" in base 900 is 111 * 900 + 100
        assert_eq!(out, [928, 111, 100, 17, 53]);
    }

    #[test]
    fn test_encode_fields() {
        let mut out = Vec::new();
        MacroBlock::new(2, &[1])
            .set_file_name("AB")
            .set_segment_count(3)
            .set_last_segment(true)
            .encode(&mut out)
            .unwrap();
        assert_eq!(out, [928, 111, 102, 1, 923, 0, 1, 923, 1, 13, 922]);
    }

    #[test]
    fn test_encode_invalid() {
        let mut out = Vec::new();
        assert_eq!(MacroBlock::new(99_999, &[]).encode(&mut out), Err(EncodeError::InvalidMacroBlock));
        assert_eq!(MacroBlock::new(0, &[900]).encode(&mut out), Err(EncodeError::InvalidMacroBlock));
    }
}
