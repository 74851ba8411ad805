//! Scanning decoder: reads the codeword grid of a PDF417 symbol out of a
//! binary image, reconciles row numbers across columns, corrects errors and
//! parses the bitstream.
//!
//! The symbol is located by its four outer corners, the top and bottom of
//! the left edge of the left row indicator and of the right edge of the right
//! row indicator. Either side may be missing, not both.

mod bit_stream;
mod bounding_box;
mod codeword;
mod codeword_decoder;
mod column;
mod detection_result;

pub use bit_stream::{DecoderResult, MacroMetadata};
pub(crate) use bit_stream::parse;

use crate::ecc;
use crate::error::{bail, ChecksumError, DecodeError, FormatError, Result};
use crate::matrix::{BitMatrix, Point};
use crate::tables::{bucket, codeword_for_symbol, module_bit_counts, BARS_IN_MODULE, MAX_CODEWORDS_IN_BARCODE};

use bounding_box::BoundingBox;
use codeword::{BarcodeMetadata, BarcodeValue, Codeword};
use column::DetectionResultColumn;
use detection_result::DetectionResult;

/// Pixels a codeword start may drift from its expected column, and slack on
/// the codeword width bounds.
const CODEWORD_SKEW_SIZE: i64 = 2;
/// Combinations of ambiguous codeword values tried before giving up.
const MAX_AMBIGUOUS_TRIES: usize = 100;

/// Decodes the symbol whose corners are given. `min_codeword_width` and
/// `max_codeword_width` bound the width in pixels of a codeword, as measured
/// on the start and stop patterns.
pub fn decode(
    image: &BitMatrix,
    top_left: Option<Point>,
    bottom_left: Option<Point>,
    top_right: Option<Point>,
    bottom_right: Option<Point>,
    min_codeword_width: u32,
    max_codeword_width: u32,
) -> Result<DecoderResult> {
    let mut bounding_box = BoundingBox::new(image, top_left, bottom_left, top_right, bottom_right)?;
    let mut left_indicator = None;
    let mut right_indicator = None;
    let mut first_pass = true;

    let mut detection_result = loop {
        if let Some(start) = top_left {
            left_indicator = Some(row_indicator_column(image, bounding_box, start, true, min_codeword_width, max_codeword_width));
        }
        if let Some(start) = top_right {
            right_indicator = Some(row_indicator_column(image, bounding_box, start, false, min_codeword_width, max_codeword_width));
        }
        let result = merge(left_indicator.as_mut(), right_indicator.as_mut(), bounding_box)
            .ok_or(DecodeError::NotFound)?;

        // the row indicators may reach past the given corners
        let found = result.bounding_box();
        if first_pass && (found.min_y() < bounding_box.min_y() || found.max_y() > bounding_box.max_y()) {
            ldebug!("bounding box grown to rows {}..={}", found.min_y(), found.max_y());
            bounding_box = *found;
            first_pass = false;
        } else {
            break result;
        }
    };
    detection_result.set_bounding_box(bounding_box);

    let max_column = detection_result.column_count() + 1;
    let left_to_right = left_indicator.is_some();
    if let Some(column) = left_indicator {
        detection_result.set_column(0, column);
    }
    if let Some(column) = right_indicator {
        detection_result.set_column(max_column, column);
    }

    let mut min_codeword_width = min_codeword_width;
    let mut max_codeword_width = max_codeword_width;
    for count in 1..=max_column {
        let column = if left_to_right { count } else { max_column - count };
        if detection_result.column(column).is_some() {
            continue;
        }

        let mut detected = if column == 0 || column == max_column {
            DetectionResultColumn::row_indicator(bounding_box, column == 0)
        } else {
            DetectionResultColumn::new(bounding_box)
        };

        let mut previous_start_column = None;
        for image_row in bounding_box.min_y()..=bounding_box.max_y() {
            let start_column = start_column(&detection_result, &detected, column, image_row, left_to_right)
                .filter(|&start| start <= bounding_box.max_x())
                .or(previous_start_column);
            let Some(start_column) = start_column else { continue };

            let codeword = detect_codeword(
                image,
                bounding_box.min_x(),
                bounding_box.max_x(),
                left_to_right,
                start_column,
                image_row,
                min_codeword_width,
                max_codeword_width,
            );
            if let Some(codeword) = codeword {
                detected.set_codeword(image_row, codeword);
                previous_start_column = Some(start_column);
                min_codeword_width = min_codeword_width.min(codeword.width());
                max_codeword_width = max_codeword_width.max(codeword.width());
            }
        }
        detection_result.set_column(column, detected);
    }

    create_decoder_result(&mut detection_result)
}

/// Builds the layout shared by the row indicators and the bounding box they
/// span, `bounding_box` if neither can tell. `None` when neither indicator
/// yields usable metadata.
fn merge(
    mut left: Option<&mut DetectionResultColumn>,
    mut right: Option<&mut DetectionResultColumn>,
    bounding_box: BoundingBox,
) -> Option<DetectionResult> {
    let metadata = barcode_metadata(left.as_deref_mut(), right.as_deref_mut())?;
    let bounding_box = BoundingBox::merge(
        left.and_then(adjust_bounding_box),
        right.and_then(adjust_bounding_box),
    )
    .unwrap_or(bounding_box);
    ldebug!(
        "{} rows, {} columns, level {}",
        metadata.row_count(),
        metadata.column_count,
        metadata.ec_level
    );
    Some(DetectionResult::new(metadata, bounding_box))
}

/// Extends the box of a row indicator by the rows it is missing at the top
/// and bottom, estimated from the tallest row seen.
fn adjust_bounding_box(column: &mut DetectionResultColumn) -> Option<BoundingBox> {
    let row_heights = column.row_heights()?;
    let max_row_height = row_heights.iter().copied().max().unwrap_or(0);

    let mut missing_start_rows = missing_rows(row_heights.iter(), max_row_height);
    let mut missing_end_rows = missing_rows(row_heights.iter().rev(), max_row_height);

    let codewords = column.codewords();
    for codeword in codewords {
        if missing_start_rows == 0 || codeword.is_some() {
            break;
        }
        missing_start_rows -= 1;
    }
    for codeword in codewords.iter().rev() {
        if missing_end_rows == 0 || codeword.is_some() {
            break;
        }
        missing_end_rows -= 1;
    }

    let is_left = column.is_left_indicator();
    Some(column.bounding_box().add_missing_rows(missing_start_rows, missing_end_rows, is_left))
}

/// Rows short of `max_row_height` up to the first row that was seen.
fn missing_rows<'a>(heights: impl Iterator<Item = &'a u32>, max_row_height: u32) -> u32 {
    let mut missing = 0;
    for &height in heights {
        missing += max_row_height - height;
        if height > 0 {
            break;
        }
    }
    missing
}

/// Metadata of the left indicator unless missing, the right one otherwise.
/// The two are rejected when they disagree on every field.
fn barcode_metadata(
    left: Option<&mut DetectionResultColumn>,
    right: Option<&mut DetectionResultColumn>,
) -> Option<BarcodeMetadata> {
    let left = left.and_then(DetectionResultColumn::barcode_metadata);
    let right = right.and_then(DetectionResultColumn::barcode_metadata);
    match (left, right) {
        (Some(left), Some(right)) => {
            if left.column_count != right.column_count
                && left.ec_level != right.ec_level
                && left.row_count() != right.row_count()
            {
                lwarn!("row indicators disagree: {:?} / {:?}", left, right);
                return None;
            }
            Some(left)
        }
        (left, right) => left.or(right),
    }
}

fn row_indicator_column(
    image: &BitMatrix,
    bounding_box: BoundingBox,
    start: Point,
    left_to_right: bool,
    min_codeword_width: u32,
    max_codeword_width: u32,
) -> DetectionResultColumn {
    let mut column = DetectionResultColumn::row_indicator(bounding_box, left_to_right);
    let rows = i64::from(bounding_box.min_y())..=i64::from(bounding_box.max_y());
    let width = image.width() as u32;

    // down from the start point, then up
    for increment in [1, -1] {
        let mut start_column = start.x as u32;
        let mut image_row = i64::from(start.y as u32);
        while rows.contains(&image_row) {
            if let Some(codeword) = detect_codeword(
                image,
                0,
                width,
                left_to_right,
                start_column,
                image_row as u32,
                min_codeword_width,
                max_codeword_width,
            ) {
                column.set_codeword(image_row as u32, codeword);
                start_column = if left_to_right { codeword.start_x } else { codeword.end_x };
            }
            image_row += increment;
        }
    }
    column
}

/// Expected pixel column where the codeword of `column` starts on
/// `image_row`, from the codewords already read. `detected` is the column
/// being read.
fn start_column(
    detection_result: &DetectionResult,
    detected: &DetectionResultColumn,
    column: usize,
    image_row: u32,
    left_to_right: bool,
) -> Option<u32> {
    let edge = |codeword: Codeword| if left_to_right { codeword.end_x } else { codeword.start_x };
    let previous_index = |column: usize| if left_to_right { column.checked_sub(1) } else { Some(column + 1) };
    let previous = previous_index(column).and_then(|index| detection_result.column(index));

    if let Some(codeword) = previous.and_then(|c| c.codeword(image_row)) {
        return Some(edge(codeword));
    }
    if let Some(codeword) = detected.codeword_nearby(image_row) {
        return Some(if left_to_right { codeword.start_x } else { codeword.end_x });
    }
    if let Some(codeword) = previous.and_then(|c| c.codeword_nearby(image_row)) {
        return Some(edge(codeword));
    }

    // any codeword further back, shifted by the columns skipped over
    let mut skipped_columns = 0i64;
    let mut index = column;
    while let Some(previous) = previous_index(index).and_then(|i| detection_result.column(i).map(|c| (i, c))) {
        index = previous.0;
        if let Some(codeword) = previous.1.codewords().iter().flatten().next() {
            let offset = skipped_columns * i64::from(codeword.width());
            let start = if left_to_right { i64::from(codeword.end_x) + offset } else { i64::from(codeword.start_x) - offset };
            return u32::try_from(start).ok();
        }
        skipped_columns += 1;
    }

    let bounding_box = detection_result.bounding_box();
    Some(if left_to_right { bounding_box.min_x() } else { bounding_box.max_x() })
}

#[inline]
fn pixel(image: &BitMatrix, x: i64, y: u32) -> bool {
    x >= 0 && image.get(x as usize, y as usize)
}

#[allow(clippy::too_many_arguments)]
fn detect_codeword(
    image: &BitMatrix,
    min_column: u32,
    max_column: u32,
    left_to_right: bool,
    start_column: u32,
    image_row: u32,
    min_codeword_width: u32,
    max_codeword_width: u32,
) -> Option<Codeword> {
    let (min_column, max_column) = (i64::from(min_column), i64::from(max_column));
    let start_column =
        adjust_codeword_start_column(image, min_column, max_column, left_to_right, i64::from(start_column), image_row);
    let mut module_bit_count =
        module_bit_count(image, min_column, max_column, left_to_right, start_column, image_row)?;

    let width: u32 = module_bit_count.iter().sum();
    let (start_x, end_x) = if left_to_right {
        (start_column, start_column + i64::from(width))
    } else {
        module_bit_count.reverse();
        (start_column - i64::from(width), start_column)
    };

    let size = i64::from(width);
    if size < i64::from(min_codeword_width) - CODEWORD_SKEW_SIZE
        || size > i64::from(max_codeword_width) + CODEWORD_SKEW_SIZE
    {
        return None;
    }

    let symbol = codeword_decoder::decoded_value(&module_bit_count);
    let value = codeword_for_symbol(symbol)?;
    Some(Codeword::new(
        u32::try_from(start_x).ok()?,
        u32::try_from(end_x).ok()?,
        bucket(&module_bit_counts(symbol)),
        value,
    ))
}

/// Counts the widths of the eight bars and spaces from `start_column`. The
/// last space may run into the edge of the scanned range.
fn module_bit_count(
    image: &BitMatrix,
    min_column: i64,
    max_column: i64,
    left_to_right: bool,
    start_column: i64,
    image_row: u32,
) -> Option<[u32; BARS_IN_MODULE]> {
    let mut counts = [0; BARS_IN_MODULE];
    let mut column = start_column;
    let mut module = 0;
    let increment = if left_to_right { 1 } else { -1 };
    let mut previous = left_to_right;
    let in_range = |column: i64| if left_to_right { column < max_column } else { column >= min_column };

    while in_range(column) && module < BARS_IN_MODULE {
        if pixel(image, column, image_row) == previous {
            counts[module] += 1;
            column += increment;
        } else {
            module += 1;
            previous = !previous;
        }
    }

    let edge = if left_to_right { max_column } else { min_column };
    (module == BARS_IN_MODULE || (column == edge && module == BARS_IN_MODULE - 1)).then_some(counts)
}

/// Moves the start column onto the first bar: back over bar pixels, then
/// forward over space pixels. Gives up past the skew tolerance.
fn adjust_codeword_start_column(
    image: &BitMatrix,
    min_column: i64,
    max_column: i64,
    left_to_right: bool,
    codeword_start_column: i64,
    image_row: u32,
) -> i64 {
    let mut corrected = codeword_start_column;
    let mut increment = if left_to_right { -1 } else { 1 };
    let mut left_to_right = left_to_right;

    for _ in 0..2 {
        while (if left_to_right { corrected >= min_column } else { corrected < max_column })
            && left_to_right == pixel(image, corrected, image_row)
        {
            if (codeword_start_column - corrected).abs() > CODEWORD_SKEW_SIZE {
                return codeword_start_column;
            }
            corrected += increment;
        }
        increment = -increment;
        left_to_right = !left_to_right;
    }
    corrected
}

fn create_decoder_result(detection_result: &mut DetectionResult) -> Result<DecoderResult> {
    detection_result.adjust_columns();

    let rows = detection_result.row_count() as usize;
    let columns = detection_result.column_count();
    let mut matrix = vec![vec![BarcodeValue::default(); columns + 2]; rows];
    for (index, column) in detection_result.columns().iter().enumerate() {
        let Some(column) = column else { continue };
        for codeword in column.codewords().iter().flatten() {
            let Some(row) = codeword.row_number else { continue };
            if let Some(cells) = matrix.get_mut(row as usize) {
                cells[index].set_value(u32::from(codeword.value));
            }
        }
    }
    adjust_codeword_count(detection_result, &mut matrix)?;

    let mut codewords = vec![0u16; rows * columns];
    let mut erasures = Vec::new();
    let mut ambiguous = Vec::new();
    for (row, cells) in matrix.iter().enumerate() {
        for (column, cell) in cells[1..=columns].iter().enumerate() {
            let index = row * columns + column;
            match cell.values().as_slice() {
                [] => erasures.push(index),
                [value] => codewords[index] = *value as u16,
                values => ambiguous.push((index, values.iter().map(|&v| v as u16).collect::<Vec<_>>())),
            }
        }
    }
    ldebug!("{} erasures, {} ambiguous codewords", erasures.len(), ambiguous.len());

    decode_ambiguous(detection_result.ec_level(), codewords, &erasures, &ambiguous)
}

/// Fills in the symbol length descriptor from the layout when it was not
/// read, or when the read value disagrees with a plausible layout.
fn adjust_codeword_count(detection_result: &DetectionResult, matrix: &mut [Vec<BarcodeValue>]) -> Result<()> {
    let Some(cell) = matrix.first_mut().and_then(|cells| cells.get_mut(1)) else {
        bail!(DecodeError::NotFound);
    };
    let capacity = detection_result.column_count() * detection_result.row_count() as usize;
    let calculated = capacity
        .checked_sub(2usize << detection_result.ec_level())
        .filter(|count| (1..=usize::from(MAX_CODEWORDS_IN_BARCODE)).contains(count));

    match (cell.values().first(), calculated) {
        (None, None) => bail!(DecodeError::NotFound),
        (None, Some(count)) => cell.set_value(count as u32),
        (Some(&read), Some(count)) if read as usize != count => cell.set_value(count as u32),
        _ => {}
    }
    Ok(())
}

/// Tries the combinations of ambiguous values until one passes error
/// correction.
fn decode_ambiguous(
    ec_level: u8,
    codewords: Vec<u16>,
    erasures: &[usize],
    ambiguous: &[(usize, Vec<u16>)],
) -> Result<DecoderResult> {
    try_combinations(codewords, ambiguous, |codewords| decode_codewords(codewords, ec_level, erasures))
}

/// Fills in each combination of `ambiguous` values, first index fastest, and
/// hands it to `attempt`. Checksum failures move on to the next combination,
/// at most [MAX_AMBIGUOUS_TRIES] of them.
fn try_combinations<F>(mut codewords: Vec<u16>, ambiguous: &[(usize, Vec<u16>)], mut attempt: F) -> Result<DecoderResult>
where
    F: FnMut(&[u16]) -> Result<DecoderResult>,
{
    let mut choice = vec![0; ambiguous.len()];
    for _ in 0..MAX_AMBIGUOUS_TRIES {
        for ((index, values), &chosen) in ambiguous.iter().zip(&choice) {
            codewords[*index] = values[chosen];
        }
        match attempt(&codewords) {
            Err(DecodeError::Checksum(e)) if !ambiguous.is_empty() => {
                ltrace!("ambiguous combination {:?} rejected: {}", choice, e);
            }
            result => return result,
        }

        let mut advanced = false;
        for (chosen, (_, values)) in choice.iter_mut().zip(ambiguous) {
            if *chosen + 1 < values.len() {
                *chosen += 1;
                advanced = true;
                break;
            }
            *chosen = 0;
        }
        if !advanced {
            break;
        }
    }
    Err(ChecksumError::AmbiguityExhausted.into())
}

/// Error corrects the codewords of a symbol (length descriptor, data and
/// `2 << ec_level` error correction codewords, in reading order) and parses
/// them. `erasures` lists the positions that could not be read.
pub fn decode_codewords(codewords: &[u16], ec_level: u8, erasures: &[usize]) -> Result<DecoderResult> {
    if codewords.is_empty() {
        bail!(FormatError::TooFewCodewords);
    }
    if ec_level > ecc::MAX_LEVEL {
        bail!(ChecksumError::TooManyEcCodewords);
    }
    let num_ec_codewords = ecc::ecc_count(ec_level);

    let mut codewords = codewords.to_vec();
    let corrected = ecc::decode(&mut codewords, num_ec_codewords, erasures)?;
    if corrected > 0 {
        ldebug!("corrected {} codewords", corrected);
    }
    verify_codeword_count(&mut codewords, num_ec_codewords)?;

    let mut result = parse(&codewords, ec_level)?;
    result.errors_corrected = corrected;
    result.erasures = erasures.len();
    Ok(result)
}

/// Checks the symbol length descriptor, recomputing it when it reads 0.
fn verify_codeword_count(codewords: &mut [u16], num_ec_codewords: usize) -> Result<()> {
    if codewords.len() < 4 {
        bail!(FormatError::TooFewCodewords);
    }
    let count = usize::from(codewords[0]);
    if count > codewords.len() {
        bail!(FormatError::InvalidLengthDescriptor);
    }
    if count == 0 {
        if num_ec_codewords >= codewords.len() {
            bail!(FormatError::InvalidLengthDescriptor);
        }
        codewords[0] = (codewords.len() - num_ec_codewords) as u16;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{EncodeOptions, Symbol};
    use crate::ecc::generate_ecc;
    use crate::high_level::{encode_high_level, seal};

    /// Module width and row height of the rendered test symbols.
    const SCALE: (u16, u16) = (2, 6);
    const MARGIN: u32 = 10;

    struct Rendered {
        image: BitMatrix,
        corners: [Point; 4],
        codeword_width: u32,
    }

    fn render(symbol: &Symbol) -> Rendered {
        let render = symbol.pdf417().render().set_scale(SCALE);
        let image = render.to_bit_matrix(MARGIN);

        let module = u32::from(SCALE.0);
        let codeword_width = 17 * module;
        let left = (MARGIN + codeword_width) as f32;
        let right = (MARGIN + 17 * (u32::from(symbol.cols()) + 3) * module) as f32;
        let top = MARGIN as f32;
        let bottom = (MARGIN + render.height() - 1) as f32;
        Rendered {
            image,
            corners: [Point::new(left, top), Point::new(left, bottom), Point::new(right, top), Point::new(right, bottom)],
            codeword_width,
        }
    }

    fn scan(rendered: &Rendered, sides: (bool, bool)) -> Result<DecoderResult> {
        let [tl, bl, tr, br] = rendered.corners;
        let (left, right) = sides;
        decode(
            &rendered.image,
            left.then_some(tl),
            left.then_some(bl),
            right.then_some(tr),
            right.then_some(br),
            rendered.codeword_width,
            rendered.codeword_width,
        )
    }

    #[test]
    fn test_decode_rendered_symbol() {
        let symbol = Symbol::encode("Hello, PDF417! 0123456789", &EncodeOptions::default()).unwrap();
        let rendered = render(&symbol);

        let result = scan(&rendered, (true, true)).unwrap();
        assert_eq!(result.text, "Hello, PDF417! 0123456789");
        assert_eq!(result.ec_level, symbol.level());
        assert_eq!(result.errors_corrected, 0);
        assert_eq!(result.erasures, 0);
    }

    #[test]
    fn test_decode_from_one_side() {
        let options = EncodeOptions::default().set_columns(3, 3).set_level(3);
        let symbol = Symbol::encode("one sided", &options).unwrap();
        let rendered = render(&symbol);

        assert_eq!(scan(&rendered, (true, false)).unwrap().text, "one sided");
        assert_eq!(scan(&rendered, (false, true)).unwrap().text, "one sided");
        assert_eq!(scan(&rendered, (false, false)), Err(DecodeError::NotFound));
    }

    #[test]
    fn test_decode_damaged_symbol() {
        let options = EncodeOptions::default().set_columns(4, 4).set_level(4);
        let symbol = Symbol::encode("damaged but readable", &options).unwrap();
        let mut rendered = render(&symbol);

        // wipe the first data codeword on every pixel row of barcode row 1
        let module = u32::from(SCALE.0);
        let x = MARGIN + 2 * 17 * module;
        let y = MARGIN + u32::from(SCALE.1);
        for dy in 0..u32::from(SCALE.1) {
            for dx in 0..17 * module {
                rendered.image.set((x + dx) as usize, (y + dy) as usize, false);
            }
        }

        let result = scan(&rendered, (true, true)).unwrap();
        assert_eq!(result.text, "damaged but readable");
        assert_eq!(result.erasures, 1);
        assert_eq!(result.errors_corrected, 1);
    }

    #[test]
    fn test_blank_image() {
        let image = BitMatrix::new(200, 80);
        let result = decode(
            &image,
            Some(Point::new(40.0, 10.0)),
            Some(Point::new(40.0, 60.0)),
            Some(Point::new(160.0, 10.0)),
            Some(Point::new(160.0, 60.0)),
            34,
            34,
        );
        assert_eq!(result, Err(DecodeError::NotFound));
    }

    fn sealed(message: &str, capacity: usize, level: u8) -> Vec<u16> {
        seal(&encode_high_level(message), capacity, level).unwrap()
    }

    #[test]
    fn test_decode_codewords() {
        let codewords = sealed("codewords", 24, 2);
        let result = decode_codewords(&codewords, 2, &[]).unwrap();
        assert_eq!(result.text, "codewords");
        assert_eq!(result.errors_corrected, 0);
    }

    #[test]
    fn test_decode_codewords_corrects() {
        let mut codewords = sealed("errors and erasures", 30, 3);
        codewords[3] = 0;
        codewords[7] = 5;
        codewords[12] = 100;
        let result = decode_codewords(&codewords, 3, &[12]).unwrap();
        assert_eq!(result.text, "errors and erasures");
        assert_eq!(result.errors_corrected, 3);
        assert_eq!(result.erasures, 1);
    }

    #[test]
    fn test_decode_codewords_limits() {
        let codewords = sealed("x", 12, 1);
        assert_eq!(decode_codewords(&[], 1, &[]), Err(FormatError::TooFewCodewords.into()));
        assert_eq!(decode_codewords(&codewords, 9, &[]), Err(ChecksumError::TooManyEcCodewords.into()));

        let erasures: Vec<usize> = (0..8).collect();
        assert_eq!(decode_codewords(&codewords, 1, &erasures), Err(ChecksumError::TooManyErasures.into()));
    }

    #[test]
    fn test_zero_length_descriptor() {
        let mut codewords = vec![0, 900, 597, 138, 599, 0, 0, 0, 0];
        generate_ecc(&mut codewords, 1);
        let result = decode_codewords(&codewords, 1, &[]).unwrap();
        assert_eq!(result.text, "Test");

        let mut short = vec![0, 1, 2, 3];
        assert_eq!(verify_codeword_count(&mut short, 4), Err(FormatError::InvalidLengthDescriptor.into()));
        assert_eq!(verify_codeword_count(&mut short[..3], 0), Err(FormatError::TooFewCodewords.into()));
    }

    #[test]
    fn test_ambiguous_values() {
        let mut codewords = vec![6, 900, 597, 138, 599, 900, 0, 0];
        generate_ecc(&mut codewords, 0);

        // the first combination is beyond repair, the second one has a
        // single error
        let ambiguous = [(2, vec![17, 597]), (3, vec![0, 138])];
        let result = decode_ambiguous(0, codewords.clone(), &[], &ambiguous).unwrap();
        assert_eq!(result.text, "Test");
        assert_eq!(result.errors_corrected, 1);

        let hopeless = [(1, vec![901, 902]), (2, vec![1, 2]), (4, vec![3, 4]), (5, vec![5, 6])];
        assert_eq!(
            decode_ambiguous(0, codewords, &[], &hopeless),
            Err(ChecksumError::AmbiguityExhausted.into())
        );
    }

    #[test]
    fn test_ambiguous_search_is_capped() {
        // 2^7 combinations, only the last one is accepted
        let ambiguous: Vec<(usize, Vec<u16>)> = (0..7).map(|i| (i, vec![0, 1])).collect();
        let mut attempts = 0;
        let result = try_combinations(vec![0; 7], &ambiguous, |codewords| {
            attempts += 1;
            if codewords.iter().all(|&c| c == 1) {
                decode_codewords(&sealed("found", 8, 0), 0, &[])
            } else {
                Err(ChecksumError::Uncorrectable.into())
            }
        });
        assert_eq!(result, Err(ChecksumError::AmbiguityExhausted.into()));
        assert_eq!(attempts, MAX_AMBIGUOUS_TRIES);

        // the same search over six cells reaches its last combination
        let mut attempts = 0;
        let result = try_combinations(vec![0; 6], &ambiguous[..6], |codewords| {
            attempts += 1;
            if codewords.iter().all(|&c| c == 1) {
                decode_codewords(&sealed("found", 8, 0), 0, &[])
            } else {
                Err(ChecksumError::Uncorrectable.into())
            }
        });
        assert_eq!(result.map(|r| r.text), Ok("found".to_string()));
        assert_eq!(attempts, 64);
    }

    #[test]
    fn test_format_error_stops_search() {
        let ambiguous = [(0, vec![1, 2, 3])];
        let mut attempts = 0;
        let result = try_combinations(vec![0], &ambiguous, |_| {
            attempts += 1;
            Err(FormatError::TooFewCodewords.into())
        });
        assert_eq!(result, Err(FormatError::TooFewCodewords.into()));
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_erasures_beyond_ec_codewords() {
        let mut codewords = sealed("HELLO WORLD", 12, 0);
        for position in [2, 3, 4] {
            codewords[position] = 0;
        }
        assert_eq!(
            decode_codewords(&codewords, 0, &[2, 3, 4]),
            Err(ChecksumError::TooManyErasures.into())
        );
    }

    #[test]
    fn test_swapped_corners() {
        let image = BitMatrix::new(200, 80);
        let result = decode(
            &image,
            Some(Point::new(40.0, 60.0)),
            Some(Point::new(40.0, 10.0)),
            Some(Point::new(160.0, 60.0)),
            Some(Point::new(160.0, 10.0)),
            34,
            34,
        );
        assert_eq!(result, Err(DecodeError::NotFound));
    }

    #[test]
    fn test_adjust_codeword_count() {
        let image = BitMatrix::new(100, 100);
        let bbox = BoundingBox::new(&image, Some(Point::new(0.0, 0.0)), Some(Point::new(0.0, 50.0)), None, None).unwrap();
        let metadata = BarcodeMetadata { column_count: 2, ec_level: 1, row_count_upper: 4, row_count_lower: 2 };
        let result = DetectionResult::new(metadata, bbox);

        let mut matrix = vec![vec![BarcodeValue::default(); 4]; 6];
        adjust_codeword_count(&result, &mut matrix).unwrap();
        assert_eq!(matrix[0][1].values(), [8]);

        let mut matrix = vec![vec![BarcodeValue::default(); 4]; 6];
        matrix[0][1].set_value(3);
        adjust_codeword_count(&result, &mut matrix).unwrap();
        // the read value and the layout now tie
        assert_eq!(matrix[0][1].values(), [3, 8]);
    }
}
