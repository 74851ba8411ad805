//! User data to high level encoding conversion functions

use crate::ecc;
use crate::error::EncodeError;
use crate::macro_block::MacroBlock;
use crate::numeric::{encode_digits, encode_numeric};
use crate::tables::{mixed_value, punctuation_value, NUMBER_OF_CODEWORDS};

/// Codeword used to latch to text mode
pub const M_LATCH_TEXT: u16 = 900;
/// Codeword used to latch to byte mode (if length is multiple of 6 use
/// M_LATCH_BYTE_M6).
pub const M_LATCH_BYTE: u16 = 901;
/// Codeword used to latch to numeric mode
pub const M_LATCH_NUMERIC: u16 = 902;

// 903 to 912: reserved for future use

/// Codeword used to switch to byte mode for next codedword (usable only if
/// the current mode is text).
pub const M_SHIFT_BYTE: u16 = 913;

// 914 to 920: reserved for future use
// 921: used for reader initialization or programming (barcode used to
// enable/disable specific features of the reader).

/// Codeword terminating the last segment of a Macro PDF417 sequence.
pub const MACRO_TERMINATOR: u16 = 922;
/// Codeword introducing a Macro PDF417 optional field.
pub const MACRO_OPTIONAL_FIELD: u16 = 923;
/// Codeword used to latch to byte mode when the length is a multiple of 6.
pub const M_LATCH_BYTE_M6: u16 = 924;
/// Codeword used to specifiy a ECI (user) custom ID
pub const ECI_CUSTOM_ID: u16 = 925;
/// Codeword used to specifiy a ECI code
pub const ECI_GENERAL_ID: u16 = 926;
/// Codeword used to specifiy a ECI code page
pub const ECI_CODE_PAGE: u16 = 927;
/// Codeword opening a Macro PDF417 control block.
pub const MACRO_CONTROL_BLOCK: u16 = 928;

/// Codeword used as padding at the end of the data section
pub const CW_PADDING: u16 = M_LATCH_TEXT;

/// ECI designator of UTF-8.
pub const ECI_UTF8: u32 = 26;

// Text sub-mode switch values
const LL: u8 = 27;
const ML: u8 = 28;
const AL: u8 = 28;
const AS: u8 = 27;
const PL: u8 = 25;
const PS: u8 = 29;
const PAL: u8 = 29;
const SPACE: u8 = 26;

/// Minimum run of digits switching to numeric compaction.
const NUMERIC_RUN: usize = 13;
/// Minimum run of text characters interrupting a byte segment.
const TEXT_RUN: usize = 5;

/// Segmentation applied by the high level encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compaction {
    /// Split the message into text, byte and numeric segments.
    #[default]
    Auto,
    /// Encode the whole message with text compaction.
    Text,
    /// Encode the whole message with byte compaction.
    Byte,
    /// Encode the whole message with numeric compaction.
    Numeric,
}

/// Conversion of the message to bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Charset {
    /// Latin-1 when every character fits, UTF-8 with an ECI otherwise.
    #[default]
    Auto,
    /// ISO-8859-1, the default PDF417 character set.
    Latin1,
    /// UTF-8 bytes preceded by ECI 26.
    Utf8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Unknown,
    Text,
    Byte,
    Numeric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubMode {
    Alpha,
    Lower,
    Mixed,
    Punctuation,
}

#[inline]
fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

#[inline]
fn is_alpha_upper(c: u8) -> bool {
    c == b' ' || c.is_ascii_uppercase()
}

#[inline]
fn is_alpha_lower(c: u8) -> bool {
    c == b' ' || c.is_ascii_lowercase()
}

#[inline]
fn mixed(c: u8) -> Option<u8> {
    if c == b' ' {
        Some(SPACE)
    } else {
        mixed_value(c)
    }
}

#[inline]
fn is_text(c: u8) -> bool {
    c == b'\t' || c == b'\n' || c == b'\r' || (32..=126).contains(&c)
}

/// Number of consecutive ASCII digits in `msg` starting at `start`.
pub fn determine_consecutive_digit_count(msg: &[u8], start: usize) -> usize {
    msg.get(start..)
        .map_or(0, |rest| rest.iter().take_while(|&&c| is_digit(c)).count())
}

/// Number of consecutive text compactable characters in `msg` starting at
/// `start`. The count stops in front of a run of 13 or more digits.
pub fn determine_consecutive_text_count(msg: &[u8], start: usize) -> usize {
    let len = msg.len();
    let mut idx = start;
    while idx < len {
        let mut numeric_count = 0;
        while numeric_count < NUMERIC_RUN && idx < len && is_digit(msg[idx]) {
            numeric_count += 1;
            idx += 1;
        }
        if numeric_count >= NUMERIC_RUN {
            return idx - start - numeric_count;
        }
        if numeric_count > 0 {
            continue;
        }
        if !is_text(msg[idx]) {
            break;
        }
        idx += 1;
    }
    idx.saturating_sub(start)
}

/// Number of consecutive bytes starting at `start` that are better encoded
/// with byte compaction, i.e. up to the next run of 13 digits or 5 text
/// characters.
pub fn determine_consecutive_binary_count(msg: &[u8], start: usize) -> usize {
    let len = msg.len();
    let mut idx = start;
    while idx < len {
        let numeric_count = determine_consecutive_digit_count(&msg[..len.min(idx + NUMERIC_RUN)], idx);
        if numeric_count >= NUMERIC_RUN {
            return idx - start;
        }

        let text_count = msg[idx..].iter().take(TEXT_RUN).take_while(|&&c| is_text(c)).count();
        if text_count >= TEXT_RUN {
            return idx - start;
        }
        idx += 1;
    }
    idx.saturating_sub(start)
}

/// Encodes `message` with automatic segmentation and charset selection.
/// The result holds the data codewords only (no length descriptor, padding
/// or error correction). An empty message yields no codewords.
pub fn encode_high_level(message: &str) -> Vec<u16> {
    let mut encoder = PDF417Encoder::new();
    encoder.push_text(message);
    encoder.codewords
}

/// Encodes `message` using the given compaction and charset.
pub fn encode(message: &str, compaction: Compaction, charset: Charset) -> Result<Vec<u16>, EncodeError> {
    if message.is_empty() {
        return Ok(Vec::new());
    }

    let mut encoder = PDF417Encoder::new();
    let latin1 = to_latin1(message);
    let bytes = match (charset, latin1) {
        (Charset::Auto | Charset::Latin1, Some(bytes)) => bytes,
        (Charset::Latin1, None) => return Err(EncodeError::UnencodableCharacter),
        (Charset::Auto | Charset::Utf8, _) => {
            encoder.push_eci(ECI_UTF8)?;
            message.as_bytes().to_vec()
        }
    };

    match compaction {
        Compaction::Auto => encoder.push_auto(&bytes),
        Compaction::Text => {
            if !bytes.iter().all(|&c| is_text(c)) {
                return Err(EncodeError::UnencodableCharacter);
            }
            encoder.latch_text();
            encoder.push_text_run(&bytes)?;
        }
        Compaction::Byte => encoder.push_binary_run(&bytes),
        Compaction::Numeric => {
            encoder.codewords.push(M_LATCH_NUMERIC);
            encode_numeric(&bytes, &mut encoder.codewords)?;
            encoder.mode = Mode::Numeric;
        }
    }
    Ok(encoder.codewords)
}

fn to_latin1(s: &str) -> Option<Vec<u8>> {
    s.chars().map(|c| u8::try_from(c).ok()).collect()
}

/// Use a PDF417Encoder to encode your data segements to a list of codewords
/// ready to be sealed and rendered.
#[derive(Debug, Clone)]
pub struct PDF417Encoder {
    codewords: Vec<u16>,
    mode: Mode,
    submode: SubMode,
}

impl Default for PDF417Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PDF417Encoder {
    /// Creates an empty encoder. The first segment always starts with a mode
    /// latch.
    pub fn new() -> Self {
        Self { codewords: Vec::new(), mode: Mode::Unknown, submode: SubMode::Alpha }
    }

    /// Returns the number of codewords already used, including the symbol
    /// length descriptor.
    pub fn count(&self) -> usize {
        self.codewords.len() + 1
    }

    /// Returns the data codewords appended so far.
    pub fn codewords(&self) -> &[u16] {
        &self.codewords
    }

    /// Appends a text segment. Latin-1 strings are split into text, byte and
    /// numeric segments, other strings are encoded as UTF-8 behind an ECI.
    pub fn append_text(mut self, s: &str) -> Self {
        self.push_text(s);
        self
    }

    /// Appends a bytes segment.
    pub fn append_bytes(mut self, bytes: &[u8]) -> Self {
        self.push_binary_run(bytes);
        self
    }

    /// Appends a numeric segment from a string of ASCII digits of any
    /// length.
    pub fn append_numeric(mut self, digits: &str) -> Result<Self, EncodeError> {
        if self.mode != Mode::Numeric {
            self.codewords.push(M_LATCH_NUMERIC);
            self.mode = Mode::Numeric;
            self.submode = SubMode::Alpha;
        }
        encode_numeric(digits.as_bytes(), &mut self.codewords)?;
        Ok(self)
    }

    /// Appends a numeric segment containing a 64-bit unsigned integer `n`.
    pub fn append_num(self, n: u64) -> Self {
        let digits = n.to_string();
        let mut this = self;
        if this.mode != Mode::Numeric {
            this.codewords.push(M_LATCH_NUMERIC);
            this.mode = Mode::Numeric;
            this.submode = SubMode::Alpha;
        }
        encode_digits(digits.as_bytes(), &mut this.codewords);
        this
    }

    /// Appends a special segement crafted to store an __UTF-8__ string `s`.
    /// Internally, we use a ECI identifier (\\000026) to switch to the UTF-8
    /// code page then append a byte segment to store the string's bytes.
    pub fn append_utf8(mut self, s: &str) -> Self {
        self.codewords.extend([ECI_CODE_PAGE, ECI_UTF8 as u16]);
        self.mode = Mode::Unknown;
        self.push_binary_run(s.as_bytes());
        self
    }

    /// Appends an Extended Channel Interpretation designator.
    pub fn append_eci(mut self, eci: u32) -> Result<Self, EncodeError> {
        self.push_eci(eci)?;
        Ok(self)
    }

    /// Append a single codeword.
    pub fn append_codeword(mut self, codeword: u16) -> Self {
        self.codewords.push(codeword);
        self.mode = Mode::Unknown;
        self
    }

    /// Append a slice of codewords.
    pub fn append_raw(mut self, codewords: &[u16]) -> Self {
        self.codewords.extend_from_slice(codewords);
        self.mode = Mode::Unknown;
        self
    }

    /// Appends a Macro PDF417 control block. It must be the last segment.
    pub fn append_macro(mut self, block: &MacroBlock) -> Result<Self, EncodeError> {
        block.encode(&mut self.codewords)?;
        self.mode = Mode::Unknown;
        Ok(self)
    }

    /// Returns the highest error correction level whose codewords fit in the
    /// remaining slots of a `capacity` codewords symbol, or None if not even
    /// level 0 fits.
    pub fn fit_ecc(&self, capacity: usize) -> Option<u8> {
        let remaining = capacity.checked_sub(self.count())?;
        (0..=ecc::MAX_LEVEL).rev().find(|&level| ecc::ecc_count(level) <= remaining)
    }

    /// Seals the data segments into `capacity` codewords ready to be
    /// rendered: length descriptor, data, padding then error correction.
    pub fn seal(self, capacity: usize, level: u8) -> Result<Vec<u16>, EncodeError> {
        seal(&self.codewords, capacity, level)
    }

    /// Seals with the highest error correction level that fits, see
    /// [PDF417Encoder::fit_ecc].
    pub fn fit_seal(self, capacity: usize) -> Option<(u8, Vec<u16>)> {
        let level = self.fit_ecc(capacity)?;
        self.seal(capacity, level).ok().map(|codewords| (level, codewords))
    }

    fn push_text(&mut self, s: &str) {
        match to_latin1(s) {
            Some(bytes) => self.push_auto(&bytes),
            None => {
                self.codewords.extend([ECI_CODE_PAGE, ECI_UTF8 as u16]);
                self.mode = Mode::Unknown;
                self.push_auto(s.as_bytes());
            }
        }
    }

    fn push_eci(&mut self, eci: u32) -> Result<(), EncodeError> {
        match eci {
            0..=899 => self.codewords.extend([ECI_CODE_PAGE, eci as u16]),
            900..=810_899 => self
                .codewords
                .extend([ECI_GENERAL_ID, (eci / 900 - 1) as u16, (eci % 900) as u16]),
            810_900..=811_799 => self.codewords.extend([ECI_CUSTOM_ID, (eci - 810_900) as u16]),
            _ => return Err(EncodeError::UnencodableCharacter),
        }
        self.mode = Mode::Unknown;
        Ok(())
    }

    fn latch_text(&mut self) {
        if self.mode != Mode::Text {
            self.codewords.push(M_LATCH_TEXT);
            self.mode = Mode::Text;
            self.submode = SubMode::Alpha;
        }
    }

    fn push_auto(&mut self, msg: &[u8]) {
        let len = msg.len();
        let mut p = 0;
        while p < len {
            let n = determine_consecutive_digit_count(msg, p);
            if n >= NUMERIC_RUN {
                self.codewords.push(M_LATCH_NUMERIC);
                self.mode = Mode::Numeric;
                self.submode = SubMode::Alpha;
                encode_digits(&msg[p..p + n], &mut self.codewords);
                p += n;
                continue;
            }

            let t = determine_consecutive_text_count(msg, p);
            let b = if t >= TEXT_RUN || n == len {
                0
            } else {
                determine_consecutive_binary_count(msg, p).max(1)
            };

            if t > 0 && t >= b {
                self.latch_text();
                self.push_text_run(&msg[p..p + t])
                    .unwrap_or_else(|_| unreachable!("text runs only hold text characters"));
                p += t;
            } else if b == 1 && self.mode == Mode::Text {
                self.codewords.extend([M_SHIFT_BYTE, msg[p] as u16]);
                p += 1;
            } else {
                self.push_binary_run(&msg[p..p + b]);
                p += b;
            }
        }
    }

    fn push_text_run(&mut self, msg: &[u8]) -> Result<(), EncodeError> {
        self.submode = encode_text(msg, self.submode, &mut self.codewords)?;
        Ok(())
    }

    fn push_binary_run(&mut self, bytes: &[u8]) {
        encode_binary(bytes, &mut self.codewords);
        self.mode = Mode::Byte;
        self.submode = SubMode::Alpha;
    }
}

/// Lays out data codewords in a `capacity` codewords symbol at the given
/// error correction level.
pub(crate) fn seal(data: &[u16], capacity: usize, level: u8) -> Result<Vec<u16>, EncodeError> {
    if level > ecc::MAX_LEVEL {
        return Err(EncodeError::InvalidErrorCorrectionLevel);
    }
    if data.iter().any(|&codeword| codeword >= NUMBER_OF_CODEWORDS) {
        return Err(EncodeError::InvalidCodeword);
    }
    let total = capacity
        .checked_sub(ecc::ecc_count(level))
        .filter(|&total| total > data.len())
        .ok_or(EncodeError::DataTooLong)?;

    let mut codewords = Vec::with_capacity(capacity);
    codewords.push(total as u16);
    codewords.extend_from_slice(data);
    codewords.resize(total, CW_PADDING);
    codewords.resize(capacity, 0);
    ecc::generate_ecc(&mut codewords, level);
    Ok(codewords)
}

/// Text compaction of `msg` starting in `submode`. Returns the sub-mode in
/// effect after the last codeword.
fn encode_text(msg: &[u8], submode: SubMode, out: &mut Vec<u16>) -> Result<SubMode, EncodeError> {
    let count = msg.len();
    let mut values: Vec<u8> = Vec::with_capacity(count * 2);
    let mut submode = submode;
    let mut idx = 0;

    let is_punct_next = |idx: usize| idx + 1 < count && punctuation_value(msg[idx + 1]).is_some();

    while idx < count {
        let c = msg[idx];
        match submode {
            SubMode::Alpha => {
                if is_alpha_upper(c) {
                    values.push(if c == b' ' { SPACE } else { c - b'A' });
                } else if is_alpha_lower(c) {
                    values.push(LL);
                    submode = SubMode::Lower;
                    continue;
                } else if mixed(c).is_some() || is_punct_next(idx) {
                    values.push(ML);
                    submode = SubMode::Mixed;
                    continue;
                } else {
                    let p = punctuation_value(c).ok_or(EncodeError::UnencodableCharacter)?;
                    values.extend([PS, p]);
                }
            }
            SubMode::Lower => {
                if is_alpha_lower(c) {
                    values.push(if c == b' ' { SPACE } else { c - b'a' });
                } else if is_alpha_upper(c) {
                    values.extend([AS, c - b'A']);
                } else if mixed(c).is_some() || is_punct_next(idx) {
                    values.push(ML);
                    submode = SubMode::Mixed;
                    continue;
                } else {
                    let p = punctuation_value(c).ok_or(EncodeError::UnencodableCharacter)?;
                    values.extend([PS, p]);
                }
            }
            SubMode::Mixed => {
                if let Some(m) = mixed(c) {
                    values.push(m);
                } else if is_alpha_upper(c) {
                    values.push(AL);
                    submode = SubMode::Alpha;
                    continue;
                } else if is_alpha_lower(c) {
                    values.push(LL);
                    submode = SubMode::Lower;
                    continue;
                } else if is_punct_next(idx) {
                    values.push(PL);
                    submode = SubMode::Punctuation;
                    continue;
                } else {
                    let p = punctuation_value(c).ok_or(EncodeError::UnencodableCharacter)?;
                    values.extend([PS, p]);
                }
            }
            SubMode::Punctuation => {
                if let Some(p) = punctuation_value(c) {
                    values.push(p);
                } else {
                    values.push(PAL);
                    submode = SubMode::Alpha;
                    continue;
                }
            }
        }
        idx += 1;
    }

    if values.len() % 2 != 0 {
        // PS in the letter and mixed sub-modes, PAL in punctuation
        values.push(PS);
        if submode == SubMode::Punctuation {
            submode = SubMode::Alpha;
        }
    }
    out.extend(values.chunks_exact(2).map(|pair| pair[0] as u16 * 30 + pair[1] as u16));
    Ok(submode)
}

/// Byte compaction: groups of 6 bytes become 5 base 900 codewords, the
/// remaining bytes are written one per codeword.
fn encode_binary(bytes: &[u8], out: &mut Vec<u16>) {
    // even if we are in byte mode, it is safer to always emit a LATCH_BYTE
    out.push(if bytes.len() % 6 == 0 { M_LATCH_BYTE_M6 } else { M_LATCH_BYTE });

    let mut chunks = bytes.chunks_exact(6);
    for chunk in &mut chunks {
        // pack six bytes
        let mut s = chunk.iter().fold(0u64, |s, &b| (s << 8) | b as u64);
        // append five codewords
        let mut group = [0u16; 5];
        for cw in group.iter_mut().rev() {
            *cw = (s % 900) as u16;
            s /= 900;
        }
        out.extend(group);
    }

    out.extend(chunks.remainder().iter().map(|&b| b as u16));
}
