//! Decoding of error corrected codewords back to the encoded message: the
//! inverse of the high level encoder.

use core::str::FromStr;

use crate::error::{bail, FormatError, Result};
use crate::high_level::{
    ECI_CODE_PAGE, ECI_CUSTOM_ID, ECI_GENERAL_ID, MACRO_CONTROL_BLOCK, MACRO_OPTIONAL_FIELD, MACRO_TERMINATOR,
    M_LATCH_BYTE, M_LATCH_BYTE_M6, M_LATCH_NUMERIC, M_LATCH_TEXT, M_SHIFT_BYTE,
};
use crate::macro_block::field;
use crate::numeric::{decode_base900, MAX_NUMERIC_CODEWORDS};
use crate::tables::{MIXED_CHARS, PUNCT_CHARS};

const LL: u8 = 27;
const AS: u8 = 27;
const ML: u8 = 28;
const AL: u8 = 28;
const PL: u8 = 25;
const PS: u8 = 29;
const PAL: u8 = 29;
const SPACE: u8 = 26;

/// Codewords of the Macro PDF417 segment index.
const SEGMENT_INDEX_CODEWORDS: usize = 2;

/// Decoded content of a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderResult {
    /// The message, each ECI segment converted with its character set.
    pub text: String,
    /// The raw bytes carried by text, byte and numeric compaction.
    pub bytes: Vec<u8>,
    pub ec_level: u8,
    /// Number of codewords fixed by error correction, erasures included.
    pub errors_corrected: usize,
    pub erasures: usize,
    pub macro_block: Option<MacroMetadata>,
}

/// Macro PDF417 control block of a decoded symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroMetadata {
    pub segment_index: u32,
    /// File id codewords as zero-padded groups of three digits.
    pub file_id: String,
    pub file_name: Option<String>,
    pub segment_count: Option<u32>,
    pub timestamp: Option<u64>,
    pub sender: Option<String>,
    pub addressee: Option<String>,
    pub file_size: Option<u64>,
    pub checksum: Option<u16>,
    pub last_segment: bool,
    /// The optional field codewords following the first optional field
    /// marker, terminator excluded.
    pub optional_data: Vec<u16>,
}

/// Character sets selectable with ECI 927.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum CharacterSet {
    #[default]
    Latin1,
    Ascii,
    Utf8,
    Utf16Be,
}

impl CharacterSet {
    fn from_eci(eci: u16) -> Result<Self, FormatError> {
        match eci {
            1 | 3 => Ok(Self::Latin1),
            25 => Ok(Self::Utf16Be),
            26 => Ok(Self::Utf8),
            27 | 170 => Ok(Self::Ascii),
            _ => Err(FormatError::UnsupportedCharset(eci)),
        }
    }

    fn decode_into(self, bytes: &[u8], out: &mut String) {
        match self {
            Self::Latin1 => out.extend(bytes.iter().map(|&b| b as char)),
            Self::Ascii => out.extend(
                bytes
                    .iter()
                    .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER }),
            ),
            Self::Utf8 => out.push_str(&String::from_utf8_lossy(bytes)),
            Self::Utf16Be => {
                let units = bytes.chunks_exact(2).map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
                out.extend(char::decode_utf16(units).map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER)));
                if bytes.len() % 2 != 0 {
                    out.push(char::REPLACEMENT_CHARACTER);
                }
            }
        }
    }
}

/// Decoded bytes, split in segments by ECI designators.
#[derive(Debug, Default)]
struct Output {
    text: String,
    bytes: Vec<u8>,
    segment_start: usize,
    charset: CharacterSet,
}

impl Output {
    #[inline]
    fn push(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    fn set_eci(&mut self, eci: u16) -> Result<(), FormatError> {
        let charset = CharacterSet::from_eci(eci)?;
        self.flush();
        self.charset = charset;
        Ok(())
    }

    fn flush(&mut self) {
        self.charset.decode_into(&self.bytes[self.segment_start..], &mut self.text);
        self.segment_start = self.bytes.len();
    }

    fn finish(mut self) -> (String, Vec<u8>) {
        self.flush();
        (self.text, self.bytes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubMode {
    Alpha,
    Lower,
    Mixed,
    Punctuation,
}

/// Text compaction state: the latched sub-mode and a pending one character
/// shift.
#[derive(Debug, Clone, Copy)]
struct TextState {
    latched: SubMode,
    shift: Option<SubMode>,
}

impl Default for TextState {
    fn default() -> Self {
        Self { latched: SubMode::Alpha, shift: None }
    }
}

impl TextState {
    fn push(&mut self, value: u8, out: &mut Output) {
        if let Some(mode) = self.shift.take() {
            if mode == SubMode::Punctuation && value == PAL {
                self.latched = SubMode::Alpha;
            } else if let Some(c) = character(mode, value) {
                out.push(c);
            }
            return;
        }

        if let Some(c) = character(self.latched, value) {
            out.push(c);
            return;
        }
        match (self.latched, value) {
            (SubMode::Alpha | SubMode::Mixed, LL) => self.latched = SubMode::Lower,
            (SubMode::Alpha | SubMode::Lower, ML) => self.latched = SubMode::Mixed,
            (SubMode::Mixed, AL) => self.latched = SubMode::Alpha,
            (SubMode::Mixed, PL) => self.latched = SubMode::Punctuation,
            (SubMode::Lower, AS) => self.shift = Some(SubMode::Alpha),
            (SubMode::Alpha | SubMode::Lower | SubMode::Mixed, PS) => self.shift = Some(SubMode::Punctuation),
            (SubMode::Punctuation, PAL) => self.latched = SubMode::Alpha,
            _ => {}
        }
    }
}

fn character(mode: SubMode, value: u8) -> Option<u8> {
    match (mode, value) {
        (SubMode::Alpha, 0..=25) => Some(b'A' + value),
        (SubMode::Lower, 0..=25) => Some(b'a' + value),
        (SubMode::Mixed, 0..=24) => Some(MIXED_CHARS[value as usize]),
        (SubMode::Alpha | SubMode::Lower | SubMode::Mixed, SPACE) => Some(b' '),
        (SubMode::Punctuation, 0..=28) => Some(PUNCT_CHARS[value as usize]),
        _ => None,
    }
}

#[inline]
fn is_data(cw: u16) -> bool {
    cw < M_LATCH_TEXT
}

/// Parses the codewords of a symbol. `codewords[0]` is the symbol length
/// descriptor, anything after the declared length (error correction) is
/// ignored.
pub fn parse(codewords: &[u16], ec_level: u8) -> Result<DecoderResult> {
    let len = match codewords.first() {
        Some(&len) if len > 0 && len as usize <= codewords.len() => len as usize,
        _ => bail!(FormatError::InvalidLengthDescriptor),
    };

    let mut parser = Parser { codewords: &codewords[..len], pos: 1 };
    let mut out = Output::default();
    let mut macro_block = None;

    // symbols start in text compaction
    parser.text_compaction(&mut out)?;
    while let Some(cw) = parser.next() {
        match cw {
            M_LATCH_TEXT => parser.text_compaction(&mut out)?,
            M_LATCH_BYTE | M_LATCH_BYTE_M6 => parser.byte_compaction(cw, &mut out)?,
            M_SHIFT_BYTE => out.push(parser.expect_next()? as u8),
            M_LATCH_NUMERIC => parser.numeric_compaction(&mut out)?,
            ECI_CODE_PAGE => out.set_eci(parser.expect_next()?)?,
            ECI_GENERAL_ID => parser.skip(2)?,
            ECI_CUSTOM_ID => parser.skip(1)?,
            MACRO_CONTROL_BLOCK => {
                if macro_block.is_some() {
                    bail!(FormatError::InvalidMacroBlock);
                }
                macro_block = Some(parser.macro_block()?);
            }
            MACRO_OPTIONAL_FIELD | MACRO_TERMINATOR => bail!(FormatError::UnexpectedMacroField),
            _ => {
                // data or reserved codeword without a mode latch
                parser.pos -= 1;
                parser.text_compaction(&mut out)?;
            }
        }
    }

    let (text, bytes) = out.finish();
    if bytes.is_empty() && macro_block.is_none() {
        bail!(FormatError::Empty);
    }
    ltrace!("parsed {} bytes from {} codewords", bytes.len(), len);

    Ok(DecoderResult { text, bytes, ec_level, errors_corrected: 0, erasures: 0, macro_block })
}

struct Parser<'a> {
    codewords: &'a [u16],
    pos: usize,
}

impl Parser<'_> {
    #[inline]
    fn peek(&self) -> Option<u16> {
        self.codewords.get(self.pos).copied()
    }

    #[inline]
    fn next(&mut self) -> Option<u16> {
        let cw = self.peek()?;
        self.pos += 1;
        Some(cw)
    }

    fn expect_next(&mut self) -> Result<u16, FormatError> {
        self.next().ok_or(FormatError::Truncated)
    }

    fn skip(&mut self, n: usize) -> Result<(), FormatError> {
        if self.pos + n > self.codewords.len() {
            return Err(FormatError::Truncated);
        }
        self.pos += n;
        Ok(())
    }

    fn text_compaction(&mut self, out: &mut Output) -> Result<(), FormatError> {
        let mut state = TextState::default();
        while let Some(cw) = self.peek() {
            match cw {
                _ if is_data(cw) => {
                    state.push((cw / 30) as u8, out);
                    state.push((cw % 30) as u8, out);
                }
                M_LATCH_TEXT => state = TextState::default(),
                M_SHIFT_BYTE => {
                    self.pos += 1;
                    state.shift = None;
                    let byte = self.peek().ok_or(FormatError::Truncated)?;
                    out.push(byte as u8);
                }
                ECI_CODE_PAGE => {
                    self.pos += 1;
                    let eci = self.peek().ok_or(FormatError::Truncated)?;
                    out.set_eci(eci)?;
                }
                M_LATCH_BYTE | M_LATCH_BYTE_M6 | M_LATCH_NUMERIC | ECI_GENERAL_ID | ECI_CUSTOM_ID
                | MACRO_CONTROL_BLOCK | MACRO_OPTIONAL_FIELD | MACRO_TERMINATOR => break,
                // reserved
                _ => {}
            }
            self.pos += 1;
        }
        Ok(())
    }

    /// Groups of five codewords are six bytes when followed by another data
    /// codeword (or always after 924), trailing codewords are one byte each.
    fn byte_compaction(&mut self, latch: u16, out: &mut Output) -> Result<(), FormatError> {
        loop {
            while self.peek() == Some(ECI_CODE_PAGE) {
                self.pos += 1;
                out.set_eci(self.expect_next()?)?;
            }

            let rest = &self.codewords[self.pos..];
            let count = rest.iter().take(5).take_while(|&&cw| is_data(cw)).count();
            if count == 0 {
                return Ok(());
            }

            let followed = rest.get(5).is_some_and(|&cw| is_data(cw));
            if count == 5 && (latch == M_LATCH_BYTE_M6 || followed) {
                let value = rest[..5].iter().fold(0u64, |acc, &cw| acc * 900 + cw as u64);
                for shift in (0..6).rev() {
                    out.push((value >> (8 * shift)) as u8);
                }
                self.pos += 5;
                continue;
            }

            while let Some(cw) = self.peek() {
                if is_data(cw) {
                    out.push(cw as u8);
                    self.pos += 1;
                } else if cw == ECI_CODE_PAGE {
                    self.pos += 1;
                    out.set_eci(self.expect_next()?)?;
                } else {
                    break;
                }
            }
            return Ok(());
        }
    }

    fn numeric_compaction(&mut self, out: &mut Output) -> Result<(), FormatError> {
        let mut group = Vec::with_capacity(MAX_NUMERIC_CODEWORDS);
        let mut digits = Vec::new();
        while let Some(cw) = self.peek() {
            if is_data(cw) {
                group.push(cw);
                self.pos += 1;
                if group.len() < MAX_NUMERIC_CODEWORDS {
                    continue;
                }
            } else if cw == M_LATCH_NUMERIC {
                // ends the current group
                self.pos += 1;
            } else {
                break;
            }

            if !group.is_empty() {
                decode_base900(&group, &mut digits)?;
                group.clear();
            }
        }
        if !group.is_empty() {
            decode_base900(&group, &mut digits)?;
        }
        digits.iter().for_each(|&d| out.push(d));
        Ok(())
    }

    fn text_field(&mut self) -> Result<String, FormatError> {
        let mut out = Output::default();
        self.text_compaction(&mut out)?;
        Ok(out.finish().0)
    }

    fn numeric_field<T: FromStr>(&mut self) -> Result<T, FormatError> {
        let mut out = Output::default();
        self.numeric_compaction(&mut out)?;
        let (digits, _) = out.finish();
        digits.parse().map_err(|_| FormatError::InvalidMacroBlock)
    }

    /// Parses a Macro PDF417 control block, the 928 codeword already read.
    fn macro_block(&mut self) -> Result<MacroMetadata, FormatError> {
        let index = self
            .codewords
            .get(self.pos..self.pos + SEGMENT_INDEX_CODEWORDS)
            .ok_or(FormatError::InvalidMacroBlock)?;
        let mut digits = Vec::new();
        decode_base900(index, &mut digits).map_err(|_| FormatError::InvalidMacroBlock)?;
        self.pos += SEGMENT_INDEX_CODEWORDS;

        let mut metadata = MacroMetadata {
            segment_index: digits.iter().try_fold(0u32, |acc, &d| {
                acc.checked_mul(10)?.checked_add((d - b'0') as u32)
            }).ok_or(FormatError::InvalidMacroBlock)?,
            ..Default::default()
        };

        while let Some(cw) = self.peek().filter(|&cw| is_data(cw)) {
            metadata.file_id.push_str(&format!("{cw:03}"));
            self.pos += 1;
        }
        if metadata.file_id.is_empty() {
            return Err(FormatError::InvalidMacroBlock);
        }

        let fields_start = self.pos + 1;
        let mut fields_end = None;
        loop {
            match self.peek() {
                Some(MACRO_OPTIONAL_FIELD) => {
                    self.pos += 1;
                    match self.expect_next()? {
                        field::FILE_NAME => metadata.file_name = Some(self.text_field()?),
                        field::SENDER => metadata.sender = Some(self.text_field()?),
                        field::ADDRESSEE => metadata.addressee = Some(self.text_field()?),
                        field::SEGMENT_COUNT => metadata.segment_count = Some(self.numeric_field()?),
                        field::TIMESTAMP => metadata.timestamp = Some(self.numeric_field()?),
                        field::FILE_SIZE => metadata.file_size = Some(self.numeric_field()?),
                        field::CHECKSUM => metadata.checksum = Some(self.numeric_field()?),
                        _ => return Err(FormatError::InvalidMacroBlock),
                    }
                    fields_end = Some(self.pos);
                }
                Some(MACRO_TERMINATOR) => {
                    self.pos += 1;
                    metadata.last_segment = true;
                    break;
                }
                _ => break,
            }
        }

        if let Some(end) = fields_end {
            metadata.optional_data = self.codewords[fields_start..end].to_vec();
        }
        ldebug!("macro segment {} of file {}", metadata.segment_index, metadata.file_id);
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::high_level::{encode_high_level, seal, PDF417Encoder};
    use crate::macro_block::MacroBlock;

    fn symbol(data: &[u16]) -> Vec<u16> {
        let mut codewords = vec![data.len() as u16 + 1];
        codewords.extend_from_slice(data);
        codewords
    }

    fn decode_text(message: &str) -> String {
        parse(&symbol(&encode_high_level(message)), 0).unwrap().text
    }

    #[test]
    fn test_text_compaction() {
        assert_eq!(parse(&symbol(&[900, 597, 138, 599]), 0).unwrap().text, "Test");
        assert_eq!(decode_text("abc1D234"), "abc1D234");
        assert_eq!(decode_text("A!B"), "A!B");
        assert_eq!(decode_text("A!!B"), "A!!B");
        assert_eq!(decode_text("Hello, World! {42}"), "Hello, World! {42}");
    }

    #[test]
    fn test_implicit_text_mode() {
        // no latch in front of the first codeword
        let result = parse(&[3, 597, 138], 0).unwrap();
        assert_eq!(result.text, "Tes");
    }

    #[test]
    fn test_shift_byte() {
        assert_eq!(decode_text("Testing\x01Testing"), "Testing\x01Testing");
    }

    #[test]
    fn test_byte_compaction() {
        assert_eq!(parse(&symbol(&[924, 163, 238, 432, 766, 244]), 0).unwrap().bytes, b"alcool");
        assert_eq!(
            parse(&symbol(&[901, 169, 883, 224, 680, 517, 32, 98, 105, 110]), 0).unwrap().bytes,
            b"encode bin"
        );
        // five trailing codewords after 901 are single bytes
        assert_eq!(parse(&symbol(&[901, 104, 101, 108, 108, 111]), 0).unwrap().bytes, b"hello");
    }

    #[test]
    fn test_numeric_compaction() {
        assert_eq!(decode_text("0000000000000"), "0000000000000");
        assert_eq!(parse(&symbol(&[902, 1, 223]), 0).unwrap().text, "123");
        let digits = "123456789876543211234567898765432112345678987654321";
        let cws = PDF417Encoder::new().append_numeric(digits).unwrap();
        assert_eq!(parse(&symbol(cws.codewords()), 0).unwrap().text, digits);
        assert_eq!(
            parse(&symbol(&[902, 3, 0]), 0),
            Err(FormatError::InvalidNumeric.into())
        );
    }

    #[test]
    fn test_mixed_segments() {
        let message = "Order 12345678901234 shipped\u{E9}\u{E8} to \"Paris\"";
        assert_eq!(decode_text(message), message);
    }

    #[test]
    fn test_utf8_eci() {
        assert_eq!(decode_text("\u{20AC}100"), "\u{20AC}100");
        let result = parse(&symbol(&[927, 26, 901, 0xE2, 0x82, 0xAC]), 0).unwrap();
        assert_eq!(result.text, "\u{20AC}");
        assert_eq!(result.bytes, [0xE2, 0x82, 0xAC]);
    }

    #[test]
    fn test_charset_switch() {
        // Latin-1 0xE9, then UTF-16BE "A"
        let result = parse(&symbol(&[913, 0xE9, 927, 25, 901, 0, 65]), 0).unwrap();
        assert_eq!(result.text, "\u{E9}A");
        assert_eq!(
            parse(&symbol(&[927, 20, 901, 65]), 0),
            Err(FormatError::UnsupportedCharset(20).into())
        );
        assert_eq!(parse(&symbol(&[927]), 0), Err(FormatError::Truncated.into()));
    }

    #[test]
    fn test_other_ecis_skipped() {
        let result = parse(&symbol(&[926, 0, 100, 925, 100, 900, 597, 138, 599]), 0).unwrap();
        assert_eq!(result.text, "Test");
    }

    #[test]
    fn test_padding_and_ecc_ignored() {
        let data = encode_high_level("Test");
        let codewords = seal(&data, 16, 1).unwrap();
        let result = parse(&codewords, 1).unwrap();
        assert_eq!(result.text, "Test");
        assert_eq!(result.ec_level, 1);
    }

    #[test]
    fn test_invalid_stream() {
        assert_eq!(parse(&[], 0), Err(FormatError::InvalidLengthDescriptor.into()));
        assert_eq!(parse(&[5, 900], 0), Err(FormatError::InvalidLengthDescriptor.into()));
        assert_eq!(parse(&[2, 900], 0), Err(FormatError::Empty.into()));
        assert_eq!(parse(&symbol(&[900, 923]), 0), Err(FormatError::UnexpectedMacroField.into()));
    }

    #[test]
    fn test_macro_block() {
        let block = MacroBlock::new(2, &[17, 53])
            .set_file_name("AB")
            .set_segment_count(3)
            .set_last_segment(true);
        let enc = PDF417Encoder::new().append_text("Part").append_macro(&block).unwrap();
        let codewords = seal(enc.codewords(), 32, 2).unwrap();

        let result = parse(&codewords, 2).unwrap();
        assert_eq!(result.text, "Part");
        let metadata = result.macro_block.unwrap();
        assert_eq!(metadata.segment_index, 2);
        assert_eq!(metadata.file_id, "017053");
        assert_eq!(metadata.file_name.as_deref(), Some("AB"));
        assert_eq!(metadata.segment_count, Some(3));
        assert!(metadata.last_segment);
        assert_eq!(metadata.optional_data, [0, 1, 923, 1, 13]);
    }

    #[test]
    fn test_macro_only() {
        let codewords = symbol(&[928, 111, 100, 1]);
        let metadata = parse(&codewords, 0).unwrap().macro_block.unwrap();
        assert_eq!(metadata.segment_index, 0);
        assert_eq!(metadata.file_id, "001");
        assert!(!metadata.last_segment);
        assert!(metadata.optional_data.is_empty());

        assert_eq!(parse(&symbol(&[928, 111, 100]), 0), Err(FormatError::InvalidMacroBlock.into()));
        assert_eq!(parse(&symbol(&[928, 111]), 0), Err(FormatError::InvalidMacroBlock.into()));
    }
}
