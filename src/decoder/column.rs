use super::bounding_box::BoundingBox;
use super::codeword::{BarcodeMetadata, BarcodeValue, Codeword};
use crate::tables::{MAX_ROWS_IN_BARCODE, MIN_ROWS_IN_BARCODE};

const MAX_NEARBY_DISTANCE: usize = 5;

/// Position of a row indicator value within its group of three rows: 0 for
/// the row count upper part, 1 for the error correction level and the row
/// count lower part, 2 for the column count.
const fn indicator_kind(is_left: bool, row_number: u32) -> u32 {
    let row_number = if is_left { row_number } else { row_number + 2 };
    row_number % 3
}

/// Codewords found in one column of the symbol, indexed by image row.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DetectionResultColumn {
    bounding_box: BoundingBox,
    codewords: Vec<Option<Codeword>>,
    /// `Some(is_left)` for row indicator columns.
    is_left: Option<bool>,
}

impl DetectionResultColumn {
    pub fn new(bounding_box: BoundingBox) -> Self {
        let rows = (bounding_box.max_y() - bounding_box.min_y() + 1) as usize;
        Self { bounding_box, codewords: vec![None; rows], is_left: None }
    }

    pub fn row_indicator(bounding_box: BoundingBox, is_left: bool) -> Self {
        Self { is_left: Some(is_left), ..Self::new(bounding_box) }
    }

    fn index(&self, image_row: u32) -> Option<usize> {
        let index = image_row.checked_sub(self.bounding_box.min_y())? as usize;
        (index < self.codewords.len()).then_some(index)
    }

    pub fn codeword(&self, image_row: u32) -> Option<Codeword> {
        self.codewords[self.index(image_row)?]
    }

    pub fn set_codeword(&mut self, image_row: u32, codeword: Codeword) {
        if let Some(index) = self.index(image_row) {
            self.codewords[index] = Some(codeword);
        }
    }

    /// Codeword at `image_row` or the closest one within a few rows.
    pub fn codeword_nearby(&self, image_row: u32) -> Option<Codeword> {
        let index = self.index(image_row)?;
        if let Some(codeword) = self.codewords[index] {
            return Some(codeword);
        }
        (1..MAX_NEARBY_DISTANCE).find_map(|distance| {
            let above = index.checked_sub(distance).and_then(|i| self.codewords[i]);
            above.or_else(|| self.codewords.get(index + distance).copied().flatten())
        })
    }

    pub fn codewords(&self) -> &[Option<Codeword>] {
        &self.codewords
    }

    pub fn codewords_mut(&mut self) -> &mut [Option<Codeword>] {
        &mut self.codewords
    }

    pub const fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    pub const fn is_left_indicator(&self) -> bool {
        matches!(self.is_left, Some(true))
    }

    fn set_row_numbers(&mut self) {
        for codeword in self.codewords.iter_mut().flatten() {
            codeword.set_row_number_as_row_indicator();
        }
    }

    /// Votes the symbol layout from the row indicator codewords and removes
    /// the codewords disagreeing with the result.
    pub fn barcode_metadata(&mut self) -> Option<BarcodeMetadata> {
        let mut column_count = BarcodeValue::default();
        let mut row_count_upper = BarcodeValue::default();
        let mut row_count_lower = BarcodeValue::default();
        let mut ec_level = BarcodeValue::default();

        self.set_row_numbers();
        let is_left = self.is_left_indicator();
        for codeword in self.codewords.iter().flatten() {
            let value = u32::from(codeword.value % 30);
            match indicator_kind(is_left, codeword.row_number.unwrap_or_default()) {
                0 => row_count_upper.set_value(value * 3 + 1),
                1 => {
                    ec_level.set_value(value / 3);
                    row_count_lower.set_value(value % 3);
                }
                _ => column_count.set_value(value + 1),
            }
        }

        let metadata = BarcodeMetadata {
            column_count: *column_count.values().first()?,
            ec_level: *ec_level.values().first()? as u8,
            row_count_upper: *row_count_upper.values().first()?,
            row_count_lower: *row_count_lower.values().first()?,
        };
        let rows = u32::from(MIN_ROWS_IN_BARCODE)..=u32::from(MAX_ROWS_IN_BARCODE);
        if metadata.column_count < 1 || !rows.contains(&metadata.row_count()) {
            return None;
        }

        self.remove_incorrect_codewords(&metadata);
        Some(metadata)
    }

    fn remove_incorrect_codewords(&mut self, metadata: &BarcodeMetadata) {
        let is_left = self.is_left_indicator();
        for slot in &mut self.codewords {
            let Some(codeword) = *slot else { continue };
            let value = u32::from(codeword.value % 30);
            let row_number = codeword.row_number.unwrap_or_default();
            if row_number > metadata.row_count() {
                *slot = None;
                continue;
            }
            let consistent = match indicator_kind(is_left, row_number) {
                0 => value * 3 + 1 == metadata.row_count_upper,
                1 => value / 3 == u32::from(metadata.ec_level) && value % 3 == metadata.row_count_lower,
                _ => value + 1 == metadata.column_count,
            };
            if !consistent {
                *slot = None;
            }
        }
    }

    /// Range of codeword indexes between the top and bottom corners on the
    /// side of this row indicator.
    fn indicator_rows(&self) -> core::ops::Range<usize> {
        let is_left = self.is_left_indicator();
        let min_y = self.bounding_box.min_y();
        let first = (self.bounding_box.top(is_left).y as u32).saturating_sub(min_y) as usize;
        let last = (self.bounding_box.bottom(is_left).y as u32).saturating_sub(min_y) as usize;
        first..last.min(self.codewords.len())
    }

    /// Drops row indicator codewords whose row number does not follow the
    /// rows above them.
    pub fn adjust_complete_indicator_column_row_numbers(&mut self, metadata: &BarcodeMetadata) {
        self.set_row_numbers();
        self.remove_incorrect_codewords(metadata);

        let mut barcode_row = -1i64;
        let mut max_row_height = 1i64;
        let mut current_row_height = 0i64;
        for index in self.indicator_rows() {
            let Some(codeword) = self.codewords[index] else { continue };
            let row_number = i64::from(codeword.row_number.unwrap_or_default());
            let row_difference = row_number - barcode_row;

            if row_difference == 0 {
                current_row_height += 1;
            } else if row_difference == 1 {
                max_row_height = max_row_height.max(current_row_height);
                current_row_height = 1;
                barcode_row = row_number;
            } else if row_difference < 0 || row_number >= i64::from(metadata.row_count()) || row_difference > index as i64 {
                self.codewords[index] = None;
            } else {
                let checked_rows = if max_row_height > 2 { (max_row_height - 2) * row_difference } else { row_difference };
                let close_previous = checked_rows >= index as i64
                    || (1..=checked_rows as usize).any(|i| self.codewords[index - i].is_some());
                if close_previous {
                    self.codewords[index] = None;
                } else {
                    barcode_row = row_number;
                    current_row_height = 1;
                }
            }
        }
    }

    fn adjust_incomplete_indicator_column_row_numbers(&mut self, metadata: &BarcodeMetadata) {
        for index in self.indicator_rows() {
            let Some(codeword) = &mut self.codewords[index] else { continue };
            codeword.set_row_number_as_row_indicator();
            if codeword.row_number.is_some_and(|row| row >= metadata.row_count()) {
                self.codewords[index] = None;
            }
        }
    }

    /// Number of codewords found for each barcode row.
    pub fn row_heights(&mut self) -> Option<Vec<u32>> {
        let metadata = self.barcode_metadata()?;
        self.adjust_incomplete_indicator_column_row_numbers(&metadata);

        let mut heights = vec![0; metadata.row_count() as usize];
        for row in self.codewords.iter().flatten().filter_map(|codeword| codeword.row_number) {
            if let Some(height) = heights.get_mut(row as usize) {
                *height += 1;
            }
        }
        Some(heights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{BitMatrix, Point};

    fn bounding_box(min_y: f32, max_y: f32) -> BoundingBox {
        let image = BitMatrix::new(200, 200);
        BoundingBox::new(
            &image,
            Some(Point::new(10.0, min_y)),
            Some(Point::new(10.0, max_y)),
            Some(Point::new(150.0, min_y)),
            Some(Point::new(150.0, max_y)),
        )
        .unwrap()
    }

    /// Left row indicator codeword of `row` for a symbol of `rows` x `cols`
    /// at level `ec_level`.
    fn left_indicator(row: u32, rows: u32, cols: u32, ec_level: u32) -> Codeword {
        let value = match row % 3 {
            0 => (rows - 1) / 3,
            1 => ec_level * 3 + (rows - 1) % 3,
            _ => cols - 1,
        } + (row / 3) * 30;
        Codeword::new(0, 17, (row % 3) * 3, value as u16)
    }

    fn right_indicator(row: u32, rows: u32, cols: u32, ec_level: u32) -> Codeword {
        let value = match row % 3 {
            0 => cols - 1,
            1 => (rows - 1) / 3,
            _ => ec_level * 3 + (rows - 1) % 3,
        } + (row / 3) * 30;
        Codeword::new(0, 17, (row % 3) * 3, value as u16)
    }

    /// Six rows, three pixels high, starting at image row 10.
    fn filled_column(is_left: bool) -> DetectionResultColumn {
        let mut column = DetectionResultColumn::row_indicator(bounding_box(10.0, 27.0), is_left);
        for y in 10..28 {
            let row = (y - 10) / 3;
            let codeword = if is_left { left_indicator(row, 6, 4, 2) } else { right_indicator(row, 6, 4, 2) };
            column.set_codeword(y, codeword);
        }
        column
    }

    #[test]
    fn test_codeword_nearby() {
        let mut column = DetectionResultColumn::new(bounding_box(10.0, 30.0));
        assert_eq!(column.is_left, None);
        assert_eq!(column.codewords().len(), 21);
        assert_eq!(column.codeword_nearby(20), None);

        let codeword = Codeword::new(3, 20, 0, 42);
        column.set_codeword(24, codeword);
        assert_eq!(column.codeword(24), Some(codeword));
        assert_eq!(column.codeword_nearby(20), Some(codeword));
        assert_eq!(column.codeword_nearby(19), None);
        assert_eq!(column.codeword_nearby(28), Some(codeword));
        // outside of the column
        assert_eq!(column.codeword(5), None);
        assert_eq!(column.codeword_nearby(40), None);
    }

    #[test]
    fn test_barcode_metadata() {
        for is_left in [true, false] {
            let mut column = filled_column(is_left);
            assert_eq!(column.is_left, Some(is_left));
            let metadata = column.barcode_metadata().unwrap();
            assert_eq!(metadata.column_count, 4);
            assert_eq!(metadata.ec_level, 2);
            assert_eq!(metadata.row_count(), 6);
        }
    }

    #[test]
    fn test_barcode_metadata_outvotes_bad_reads() {
        let mut column = filled_column(true);
        // one misread column count
        column.set_codeword(17, left_indicator(2, 6, 9, 2));

        let metadata = column.barcode_metadata().unwrap();
        assert_eq!(metadata.column_count, 4);
        assert_eq!(column.codeword(17), None);
        assert!(column.codeword(16).is_some());
    }

    #[test]
    fn test_barcode_metadata_missing_votes() {
        let mut column = DetectionResultColumn::row_indicator(bounding_box(10.0, 27.0), true);
        column.set_codeword(10, left_indicator(0, 6, 4, 2));
        column.set_codeword(13, left_indicator(1, 6, 4, 2));
        assert_eq!(column.barcode_metadata(), None);
    }

    #[test]
    fn test_row_heights() {
        let mut column = filled_column(true);
        assert_eq!(column.row_heights().unwrap(), [3, 3, 3, 3, 3, 3]);
    }

    #[test]
    fn test_complete_indicator_drops_out_of_order_rows() {
        let mut column = filled_column(true);
        let metadata = column.barcode_metadata().unwrap();
        // row 4 read in the middle of row 1
        column.set_codeword(14, left_indicator(4, 6, 4, 2));

        column.adjust_complete_indicator_column_row_numbers(&metadata);
        assert_eq!(column.codeword(14), None);
        assert_eq!(column.codeword(13).and_then(|c| c.row_number), Some(1));
        assert_eq!(column.codeword(22).and_then(|c| c.row_number), Some(4));
    }
}
