use super::bounding_box::BoundingBox;
use super::codeword::{BarcodeMetadata, Codeword};
use super::column::DetectionResultColumn;
use crate::tables::MAX_CODEWORDS_IN_BARCODE;

/// Consecutive mismatching codewords after which a row indicator stops
/// propagating its row number along an image row.
const ADJUST_ROW_NUMBER_SKIP: usize = 2;

/// Columns read from the image: the left row indicator at index 0, the data
/// columns, then the right row indicator.
#[derive(Debug, Clone)]
pub(crate) struct DetectionResult {
    metadata: BarcodeMetadata,
    columns: Vec<Option<DetectionResultColumn>>,
    bounding_box: BoundingBox,
}

impl DetectionResult {
    pub fn new(metadata: BarcodeMetadata, bounding_box: BoundingBox) -> Self {
        Self { metadata, columns: vec![None; metadata.column_count as usize + 2], bounding_box }
    }

    /// Number of data columns.
    pub const fn column_count(&self) -> usize {
        self.metadata.column_count as usize
    }

    pub const fn row_count(&self) -> u32 {
        self.metadata.row_count()
    }

    pub const fn ec_level(&self) -> u8 {
        self.metadata.ec_level
    }

    pub const fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    pub fn set_bounding_box(&mut self, bounding_box: BoundingBox) {
        self.bounding_box = bounding_box;
    }

    pub fn column(&self, index: usize) -> Option<&DetectionResultColumn> {
        self.columns.get(index)?.as_ref()
    }

    pub fn set_column(&mut self, index: usize, column: DetectionResultColumn) {
        self.columns[index] = Some(column);
    }

    pub fn columns(&self) -> &[Option<DetectionResultColumn>] {
        &self.columns
    }

    fn codeword_at(&self, column: usize, index: usize) -> Option<Codeword> {
        *self.column(column)?.codewords().get(index)?
    }

    fn codeword_mut(&mut self, column: usize, index: usize) -> Option<&mut Option<Codeword>> {
        self.columns.get_mut(column)?.as_mut()?.codewords_mut().get_mut(index)
    }

    /// Assigns barcode rows to the codewords of every column, first from the
    /// row indicators then from already placed neighbours, until no more
    /// progress is made.
    pub fn adjust_columns(&mut self) {
        let metadata = self.metadata;
        let last = self.column_count() + 1;
        for index in [0, last] {
            if let Some(column) = self.columns[index].as_mut() {
                column.adjust_complete_indicator_column_row_numbers(&metadata);
            }
        }

        let mut unadjusted = usize::from(MAX_CODEWORDS_IN_BARCODE);
        loop {
            let previous = unadjusted;
            unadjusted = self.adjust_row_numbers();
            ltrace!("{} codewords without a row number", unadjusted);
            if unadjusted == 0 || unadjusted >= previous {
                break;
            }
        }
    }

    fn adjust_row_numbers(&mut self) -> usize {
        let unadjusted = self.adjust_row_numbers_by_row();
        if unadjusted == 0 {
            return 0;
        }

        for column in 1..=self.column_count() {
            let rows = self.column(column).map_or(0, |c| c.codewords().len());
            for index in 0..rows {
                if self.codeword_at(column, index).is_some_and(|c| !c.has_valid_row_number()) {
                    self.adjust_row_number_from_neighbours(column, index);
                }
            }
        }
        unadjusted
    }

    fn adjust_row_numbers_by_row(&mut self) -> usize {
        self.adjust_row_numbers_from_both_row_indicators();
        self.adjust_row_numbers_from_row_indicator(true) + self.adjust_row_numbers_from_row_indicator(false)
    }

    /// Image rows where both row indicators agree decide the row of every
    /// codeword in between.
    fn adjust_row_numbers_from_both_row_indicators(&mut self) {
        let last = self.column_count() + 1;
        let (Some(left), Some(right)) = (self.column(0), self.column(last)) else {
            return;
        };
        let agreed: Vec<(usize, Option<u32>)> = left
            .codewords()
            .iter()
            .zip(right.codewords())
            .enumerate()
            .filter_map(|(index, (l, r))| match (l, r) {
                (Some(l), Some(r)) if l.row_number == r.row_number => Some((index, l.row_number)),
                _ => None,
            })
            .collect();

        for (index, row_number) in agreed {
            for column in 1..last {
                let Some(slot) = self.codeword_mut(column, index) else { continue };
                let Some(codeword) = slot.as_mut() else { continue };
                codeword.row_number = row_number;
                if !codeword.has_valid_row_number() {
                    *slot = None;
                }
            }
        }
    }

    /// Walks each image row away from one row indicator, handing its row
    /// number to matching codewords. Returns the number of codewords left
    /// without a valid row.
    fn adjust_row_numbers_from_row_indicator(&mut self, is_left: bool) -> usize {
        let last = self.column_count() + 1;
        let indicator = if is_left { 0 } else { last };
        let Some(rows) = self.column(indicator).map(|c| c.codewords().len()) else {
            return 0;
        };
        let columns: Vec<usize> = if is_left { (1..last).collect() } else { (1..=last).rev().collect() };

        let mut unadjusted = 0;
        for index in 0..rows {
            let Some(row_number) = self.codeword_at(indicator, index).and_then(|c| c.row_number) else {
                continue;
            };
            let mut invalid_row_counts = 0;
            for &column in &columns {
                if invalid_row_counts >= ADJUST_ROW_NUMBER_SKIP {
                    break;
                }
                let Some(Some(codeword)) = self.codeword_mut(column, index) else { continue };
                if !codeword.has_valid_row_number() {
                    if codeword.is_valid_row_number(row_number) {
                        codeword.row_number = Some(row_number);
                        invalid_row_counts = 0;
                    } else {
                        invalid_row_counts += 1;
                    }
                }
                if !codeword.has_valid_row_number() {
                    unadjusted += 1;
                }
            }
        }
        unadjusted
    }

    /// Takes the row number of the closest neighbour in the same cluster.
    fn adjust_row_number_from_neighbours(&mut self, column: usize, index: usize) {
        let Some(codeword) = self.codeword_at(column, index) else { return };
        let previous = column - 1;
        let next = if self.column(column + 1).is_some() { column + 1 } else { previous };

        let neighbours = [
            (column, -1),
            (column, 1),
            (previous, 0),
            (next, 0),
            (previous, -1),
            (next, -1),
            (previous, 1),
            (next, 1),
            (column, -2),
            (column, 2),
            (previous, -2),
            (next, -2),
            (previous, 2),
            (next, 2),
        ];
        let found = neighbours.into_iter().find_map(|(other_column, offset): (usize, isize)| {
            let other = self.codeword_at(other_column, index.checked_add_signed(offset)?)?;
            (other.has_valid_row_number() && other.bucket == codeword.bucket).then_some(other.row_number)
        });

        if let (Some(row_number), Some(Some(codeword))) = (found, self.codeword_mut(column, index)) {
            codeword.row_number = row_number;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{BitMatrix, Point};

    const ROWS: u32 = 6;
    const COLS: u32 = 2;
    const EC_LEVEL: u32 = 1;

    fn bounding_box() -> BoundingBox {
        let image = BitMatrix::new(200, 100);
        BoundingBox::new(
            &image,
            Some(Point::new(10.0, 10.0)),
            Some(Point::new(10.0, 27.0)),
            Some(Point::new(150.0, 10.0)),
            Some(Point::new(150.0, 27.0)),
        )
        .unwrap()
    }

    fn metadata() -> BarcodeMetadata {
        BarcodeMetadata { column_count: COLS, ec_level: EC_LEVEL as u8, row_count_upper: 4, row_count_lower: 2 }
    }

    fn indicator_value(row: u32, is_left: bool) -> u16 {
        let rows_value = (ROWS - 1) / 3;
        let level_value = EC_LEVEL * 3 + (ROWS - 1) % 3;
        let cols_value = COLS - 1;
        let value = match (row % 3, is_left) {
            (0, true) | (1, false) => rows_value,
            (1, true) | (2, false) => level_value,
            _ => cols_value,
        };
        (value + (row / 3) * 30) as u16
    }

    /// Six rows of three pixels from image row 10, every codeword read
    /// without a row number.
    fn detection_result() -> DetectionResult {
        let bbox = bounding_box();
        let mut result = DetectionResult::new(metadata(), bbox);
        for column in 0..COLS as usize + 2 {
            let mut detected = match column {
                0 => DetectionResultColumn::row_indicator(bbox, true),
                3 => DetectionResultColumn::row_indicator(bbox, false),
                _ => DetectionResultColumn::new(bbox),
            };
            for y in 10..28 {
                let row = (y - 10) / 3;
                let value = match column {
                    0 => indicator_value(row, true),
                    3 => indicator_value(row, false),
                    _ => (row * 10 + column as u32) as u16,
                };
                detected.set_codeword(y, Codeword::new(0, 17, (row % 3) * 3, value));
            }
            result.set_column(column, detected);
        }
        result
    }

    fn row_numbers(result: &DetectionResult, column: usize) -> Vec<Option<u32>> {
        result.column(column).unwrap().codewords().iter().map(|c| c.and_then(|c| c.row_number)).collect()
    }

    #[test]
    fn test_adjust_columns() {
        let mut result = detection_result();
        assert_eq!(result.column_count(), 2);
        assert_eq!(result.row_count(), 6);
        result.adjust_columns();

        let expected: Vec<Option<u32>> = (0..18).map(|i| Some(i / 3)).collect();
        for column in 0..4 {
            assert_eq!(row_numbers(&result, column), expected, "column {column}");
        }
    }

    #[test]
    fn test_adjust_columns_is_idempotent() {
        let mut result = detection_result();
        result.adjust_columns();
        let adjusted = result.columns().to_vec();
        result.adjust_columns();
        assert_eq!(result.columns(), adjusted.as_slice());
    }

    #[test]
    fn test_single_row_indicator() {
        let mut result = detection_result();
        result.columns[3] = None;
        result.adjust_columns();
        assert_eq!(row_numbers(&result, 2)[4], Some(1));
        assert_eq!(row_numbers(&result, 1)[17], Some(5));
    }

    #[test]
    fn test_wrong_cluster_is_removed() {
        let mut result = detection_result();
        // a row 1 codeword read in the middle of row 0
        let stray = Codeword::new(0, 17, 3, 99);
        result.columns[1].as_mut().unwrap().set_codeword(11, stray);
        result.adjust_columns();
        assert_eq!(result.column(1).unwrap().codeword(11), None);
        assert_eq!(result.column(1).unwrap().codeword(10).and_then(|c| c.row_number), Some(0));
    }

    #[test]
    fn test_row_from_neighbours() {
        let mut result = detection_result();
        // no row indicator on either side of image row 13
        for column in [0, 3] {
            result.columns[column].as_mut().unwrap().codewords_mut()[3] = None;
        }
        result.adjust_columns();
        assert_eq!(result.column(1).unwrap().codeword(13).and_then(|c| c.row_number), None);

        // the codeword below is in the same cluster
        result.adjust_row_number_from_neighbours(1, 3);
        assert_eq!(result.column(1).unwrap().codeword(13).and_then(|c| c.row_number), Some(1));
    }
}
