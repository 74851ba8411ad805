use core::marker::PhantomData;

use crate::ecc;
use crate::error::EncodeError;
use crate::generators::{row::Row, PDF417Row, TruncatedPDF417Row};
use crate::high_level::{self, Charset, Compaction, PDF417Encoder};
use crate::macro_block::MacroBlock;
use crate::matrix::BitMatrix;
use crate::tables::MAX_CODEWORDS_IN_BARCODE;

/// Minimum number of rows in a PDF417 barcode.
pub const MIN_ROWS: u8 = 3;
/// Maximum number of rows in a PDF417 barcode.
pub const MAX_ROWS: u8 = 90;
/// Minimum number of data columns in a PDF417 barcode.
pub const MIN_COLS: u8 = 1;
/// Maximum number of data columns in a PDF417 barcode.
pub const MAX_COLS: u8 = 30;

/// Preferred width over height ratio when choosing the symbol dimensions.
const PREFERRED_RATIO: f32 = 3.0;
/// Width of a module relative to the row height used for that ratio.
const MODULE_ASPECT: f32 = 0.357 / 2.0;

/// Options of [Symbol::encode].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    pub compaction: Compaction,
    pub charset: Charset,
    /// Error correction level, recommended from the data size when unset.
    pub level: Option<u8>,
    /// Inclusive range of data columns.
    pub columns: (u8, u8),
    /// Inclusive range of rows.
    pub rows: (u8, u8),
    pub macro_block: Option<MacroBlock>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            compaction: Compaction::Auto,
            charset: Charset::Auto,
            level: None,
            columns: (MIN_COLS, MAX_COLS),
            rows: (MIN_ROWS, MAX_ROWS),
            macro_block: None,
        }
    }
}

impl EncodeOptions {
    pub const fn set_compaction(mut self, compaction: Compaction) -> Self {
        self.compaction = compaction;
        self
    }

    pub const fn set_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    pub const fn set_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    pub const fn set_columns(mut self, min: u8, max: u8) -> Self {
        self.columns = (min, max);
        self
    }

    pub const fn set_rows(mut self, min: u8, max: u8) -> Self {
        self.rows = (min, max);
        self
    }

    pub fn set_macro_block(mut self, block: MacroBlock) -> Self {
        self.macro_block = Some(block);
        self
    }
}

/// A sealed symbol: length descriptor, data, padding and error correction
/// codewords laid out in `rows * cols` slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    codewords: Vec<u16>,
    rows: u8,
    cols: u8,
    level: u8,
}

impl Symbol {
    /// Encodes `message` and lays it out in a symbol.
    pub fn encode(message: &str, options: &EncodeOptions) -> Result<Self, EncodeError> {
        let mut data = high_level::encode(message, options.compaction, options.charset)?;
        if let Some(block) = &options.macro_block {
            block.encode(&mut data)?;
        }
        Self::new(&data, options)
    }

    /// Lays out already encoded data codewords (without the length
    /// descriptor), choosing the error correction level and the dimensions
    /// allowed by `options`.
    pub fn new(data: &[u16], options: &EncodeOptions) -> Result<Self, EncodeError> {
        let level = options.level.unwrap_or_else(|| ecc::recommended_level(data.len()));
        if level > ecc::MAX_LEVEL {
            return Err(EncodeError::InvalidErrorCorrectionLevel);
        }
        let (min_cols, max_cols) = options.columns;
        let (min_rows, max_rows) = options.rows;
        if min_cols < MIN_COLS || max_cols > MAX_COLS || min_cols > max_cols
            || min_rows < MIN_ROWS || max_rows > MAX_ROWS || min_rows > max_rows
        {
            return Err(EncodeError::InvalidDimensions);
        }

        let ecc_count = ecc::ecc_count(level);
        let needed = data.len() + 1 + ecc_count;
        if needed > MAX_CODEWORDS_IN_BARCODE as usize {
            return Err(EncodeError::DataTooLong);
        }

        let (rows, cols) = determine_dimensions(needed, ecc_count, options.rows, options.columns)
            .ok_or(EncodeError::NoFittingDimensions)?;
        ldebug!("symbol: {} data codewords, level {}, {}x{}", data.len(), level, rows, cols);

        let codewords = high_level::seal(data, rows as usize * cols as usize, level)?;
        Ok(Self { codewords, rows, cols, level })
    }

    /// Seals the segments of an encoder with the given options.
    pub fn from_encoder(encoder: &PDF417Encoder, options: &EncodeOptions) -> Result<Self, EncodeError> {
        Self::new(encoder.codewords(), options)
    }

    pub const fn rows(&self) -> u8 {
        self.rows
    }

    pub const fn cols(&self) -> u8 {
        self.cols
    }

    pub const fn level(&self) -> u8 {
        self.level
    }

    pub fn codewords(&self) -> &[u16] {
        &self.codewords
    }

    /// Standard PDF417 view of the symbol.
    pub fn pdf417(&self) -> PDF417<'_, PDF417Row<'_>> {
        PDF417::new(&self.codewords, self.rows, self.cols, self.level)
    }

    /// Compact PDF417 view of the symbol (no right row indicator, one module
    /// stop pattern).
    pub fn compact(&self) -> PDF417<'_, TruncatedPDF417Row<'_>> {
        PDF417::new(&self.codewords, self.rows, self.cols, self.level)
    }
}

/// Picks `(rows, cols)` holding `needed` codewords closest to the preferred
/// aspect ratio. The length descriptor may not exceed 928.
fn determine_dimensions(
    needed: usize,
    ecc_count: usize,
    (min_rows, max_rows): (u8, u8),
    (min_cols, max_cols): (u8, u8),
) -> Option<(u8, u8)> {
    let fits = |rows: usize, cols: usize| {
        rows * cols >= needed && rows * cols - ecc_count <= MAX_CODEWORDS_IN_BARCODE as usize
    };

    let mut best: Option<((u8, u8), f32)> = None;
    for cols in min_cols..=max_cols {
        let rows = needed.div_ceil(cols as usize).max(min_rows as usize);
        if rows > max_rows as usize || !fits(rows, cols as usize) {
            continue;
        }

        let width = PDF417Row::width(cols) as f32 * MODULE_ASPECT;
        let ratio = width / rows as f32;
        let distance = (ratio - PREFERRED_RATIO).abs();
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some(((rows as u8, cols), distance));
        }
    }
    best.map(|(dimensions, _)| dimensions)
}

#[derive(Debug, Clone)]
pub struct PDF417<'a, R: Row<'a> + 'a> {
    storage: &'a [u16],
    dimensions: (u8, u8),
    level: u8,
    _phantom: PhantomData<R>,
}

impl<'a, R: Row<'a> + 'a> PDF417<'a, R> {
    /// Creates a new PDF417 with the user's data section (codewords slice),
    /// the level of error correction and the layout configuration
    /// (rows and cols). The total codewords capacity is calculated with
    /// rows \* cols and must be equal to the number of codewords
    /// in the `codewords` slice. Please make sure your codewords
    /// slice is valid, you can use [PDF417Encoder] to fill it accordingly.
    pub const fn new(storage: &'a [u16], rows: u8, cols: u8, level: u8) -> Self {
        assert!(rows >= MIN_ROWS && rows <= MAX_ROWS, "The number of rows must be between 3 and 90");
        assert!(cols >= MIN_COLS && cols <= MAX_COLS, "The number of columns must be between 1 and 30");
        assert!(storage.len() == (rows as usize * cols as usize),
            "The data will not fit in the provided configuration");
        assert!(level <= ecc::MAX_LEVEL, "ECC level must be between 0 and 8");

        Self { storage, dimensions: (rows, cols), level, _phantom: PhantomData }
    }

    /// Get the number of rows of the PDF417.
    #[inline]
    pub const fn rows(&self) -> u8 {
        self.dimensions.0
    }

    /// Get the number of columns of the PDF417. This is used to lay down the
    /// start, left, right and end indicators in the render function.
    #[inline]
    pub const fn cols(&self) -> u8 {
        self.dimensions.1
    }

    #[inline]
    pub const fn level(&self) -> u8 {
        self.level
    }

    pub fn iter(&self) -> impl Iterator<Item = R> + 'a {
        let infos = R::prepare(self.dimensions, self.level);
        self.storage.chunks_exact(self.cols() as usize)
            .enumerate()
            .map(move |(row, codewords)| R::init(codewords, row as u8, infos))
    }

    /// Modules of the symbol, row by row, one module per row and column.
    pub fn bits(&self) -> impl Iterator<Item = bool> + 'a {
        self.iter()
            .flatten() // rows -> bitfields
            .flatten() // bitfield -> bits
    }

    pub fn render(self) -> PDF417Render<'a, R> {
         PDF417Render {
             inner: self,
             scale: R::DEFAULT_SCALE,
             inverted: false
         }
    }
}

#[derive(Debug, Clone)]
pub struct PDF417Render<'a, R: Row<'a> + 'a> {
    inner: PDF417<'a, R>,
    scale: (u16, u16),
    inverted: bool
}

impl<'a, R: Row<'a> + 'a> From<PDF417<'a, R>> for PDF417Render<'a, R> {
    fn from(inner: PDF417<'a, R>) -> Self {
        inner.render()
    }
}

impl<'a, R: Row<'a> + 'a> PDF417Render<'a, R> {
    pub fn width(&self) -> u32 {
        R::width(self.inner.cols()) * self.scale.0 as u32
    }

    pub const fn height(&self) -> u32 {
        self.inner.rows() as u32 * self.scale.1 as u32
    }

    /// Returns the scale of the PDF417 as (Scale X axis, Scale Y axis).
    pub const fn scale(&self) -> (u16, u16) {
        self.scale
    }

    /// Sets the scale of the PDF417 on both axis.
    pub const fn set_scale(mut self, scale: (u16, u16)) -> Self {
        self.scale = scale;
        self
    }

    /// Returns if the PDF417 is set to be rendered with inverted colors.
    pub const fn inverted(&self) -> bool {
        self.inverted
    }

    /// Marks whether this PDF417 should be rendered with pixel values inverted.
    pub const fn set_inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    /// Pixels of the scaled symbol, row major, `true` for dark (or light
    /// when inverted).
    pub fn bits(&self) -> impl Iterator<Item = bool> + 'a {
        let (sx, sy) = self.scale;
        let invert = self.inverted;
        self.inner.iter()
            .flat_map(move |row| core::iter::repeat(row).take(sy as usize))
            .flatten() // rows -> bitfields
            .flatten() // bitfield -> bits
            .flat_map(move |bit| core::iter::repeat(bit ^ invert).take(sx as usize))
    }

    pub fn fill<P: Clone>(&self, target: &mut [P], on: &P, off: &P) {
        for (pixel, bit) in target.iter_mut().zip(self.bits()) {
            *pixel = if bit { on.clone() } else { off.clone() };
        }
    }

    pub fn fill_bits(&self, target: &mut [bool]) {
        self.fill(target, &true, &false);
    }

    /// Packs the pixels into `target`, 8 per byte, most significant bit
    /// first.
    pub fn fill_bitmap(&self, target: &mut [u8]) {
        for (i, bit) in self.bits().enumerate() {
            let Some(byte) = target.get_mut(i / 8) else { break };
            if bit {
                *byte |= 0x80 >> (i % 8);
            }
        }
    }

    /// Renders into a [BitMatrix] surrounded by `margin` light pixels on
    /// every side.
    pub fn to_bit_matrix(&self, margin: u32) -> BitMatrix {
        let (width, height) = (self.width(), self.height());
        let mut matrix = BitMatrix::new(
            (width + 2 * margin) as usize,
            (height + 2 * margin) as usize,
        );
        if self.inverted {
            matrix.fill_rect(0, 0, matrix.width(), matrix.height());
        }
        for (i, bit) in self.bits().enumerate() {
            let x = margin as usize + i % width as usize;
            let y = margin as usize + i / width as usize;
            matrix.set(x, y, bit);
        }
        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_dimensions() {
        let data = high_level::encode_high_level("Hello, PDF417!");
        let symbol = Symbol::new(&data, &EncodeOptions::default()).unwrap();
        assert_eq!(symbol.level(), 2);
        let capacity = symbol.rows() as usize * symbol.cols() as usize;
        assert_eq!(symbol.codewords().len(), capacity);
        assert!(capacity >= data.len() + 1 + 8);
        assert_eq!(symbol.codewords()[0] as usize, capacity - 8);
        assert_eq!(symbol.codewords()[1..=data.len()], data[..]);
    }

    #[test]
    fn test_symbol_constraints() {
        let data = [1u16; 20];
        let options = EncodeOptions::default().set_columns(2, 2).set_level(1);
        let symbol = Symbol::new(&data, &options).unwrap();
        assert_eq!((symbol.rows(), symbol.cols()), (13, 2));

        let options = EncodeOptions::default().set_level(9);
        assert_eq!(Symbol::new(&data, &options), Err(EncodeError::InvalidErrorCorrectionLevel));

        let options = EncodeOptions::default().set_columns(0, 4);
        assert_eq!(Symbol::new(&data, &options), Err(EncodeError::InvalidDimensions));

        let options = EncodeOptions::default().set_columns(1, 1).set_rows(3, 5);
        assert_eq!(Symbol::new(&data, &options), Err(EncodeError::NoFittingDimensions));

        let big = [1u16; 900];
        assert_eq!(Symbol::new(&big, &EncodeOptions::default()), Err(EncodeError::DataTooLong));

        assert_eq!(Symbol::new(&[1, 929, 2], &EncodeOptions::default()), Err(EncodeError::InvalidCodeword));
        assert_eq!(Symbol::new(&[u16::MAX], &EncodeOptions::default()), Err(EncodeError::InvalidCodeword));
        assert!(Symbol::new(&[928, 0], &EncodeOptions::default()).is_ok());
    }

    #[test]
    fn test_minimum_rows() {
        let options = EncodeOptions::default().set_level(0).set_columns(2, 2);
        let symbol = Symbol::new(&[1], &options).unwrap();
        assert_eq!((symbol.rows(), symbol.cols()), (3, 2));
        assert_eq!(symbol.codewords()[..4], [4, 1, 900, 900]);
    }

    #[test]
    fn test_render_size() {
        let symbol = Symbol::encode("PDF417", &EncodeOptions::default()).unwrap();
        let render = symbol.pdf417().render().set_scale((2, 4));
        assert_eq!(render.width(), (17 * symbol.cols() as u32 + 69) * 2);
        assert_eq!(render.height(), symbol.rows() as u32 * 4);
        assert_eq!(render.bits().count() as u32, render.width() * render.height());

        let compact = symbol.compact().render();
        assert_eq!(compact.width(), 17 * symbol.cols() as u32 + 35);
        assert_eq!(compact.bits().count() as u32, compact.width() * compact.height());
    }

    #[test]
    fn test_fill_bitmap() {
        let symbol = Symbol::encode("A", &EncodeOptions::default()).unwrap();
        let render = symbol.pdf417().render().set_scale((1, 1));
        let mut bitmap = vec![0u8; (render.width() * render.height()).div_ceil(8) as usize];
        render.fill_bitmap(&mut bitmap);
        // start pattern: 8 bars
        assert_eq!(bitmap[0], 0xFF);
        assert_eq!(bitmap[1] & 0x80, 0);
    }

    #[test]
    fn test_to_bit_matrix() {
        let symbol = Symbol::encode("A", &EncodeOptions::default()).unwrap();
        let render = symbol.pdf417().render().set_scale((1, 2));
        let matrix = render.to_bit_matrix(3);
        assert_eq!(matrix.width() as u32, render.width() + 6);
        assert_eq!(matrix.height() as u32, render.height() + 6);
        assert!(!matrix.get(2, 3));
        assert!(matrix.get(3, 3));
        assert!(matrix.get(10, 4));
        assert!(!matrix.get(11, 4));

        let inverted = render.set_inverted(true).to_bit_matrix(1);
        assert!(inverted.get(0, 0));
        assert!(!inverted.get(1, 1));
    }
}
