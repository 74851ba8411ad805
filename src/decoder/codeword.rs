use std::collections::BTreeMap;

/// A codeword read from the image, with its horizontal extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Codeword {
    pub start_x: u32,
    pub end_x: u32,
    /// Cluster of the symbol: 0, 3 or 6.
    pub bucket: u32,
    pub value: u16,
    /// Barcode row, once known.
    pub row_number: Option<u32>,
}

impl Codeword {
    pub const fn new(start_x: u32, end_x: u32, bucket: u32, value: u16) -> Self {
        Self { start_x, end_x, bucket, value, row_number: None }
    }

    pub const fn width(&self) -> u32 {
        self.end_x - self.start_x
    }

    /// Whether `row` agrees with the cluster of this codeword.
    pub const fn is_valid_row_number(&self, row: u32) -> bool {
        self.bucket == (row % 3) * 3
    }

    pub const fn has_valid_row_number(&self) -> bool {
        match self.row_number {
            Some(row) => self.is_valid_row_number(row),
            None => false,
        }
    }

    /// Row number encoded by a row indicator codeword.
    pub fn set_row_number_as_row_indicator(&mut self) {
        self.row_number = Some((u32::from(self.value) / 30) * 3 + self.bucket / 3);
    }
}

/// Tally of the values read for one cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct BarcodeValue {
    votes: BTreeMap<u32, u32>,
}

impl BarcodeValue {
    pub fn set_value(&mut self, value: u32) {
        *self.votes.entry(value).or_default() += 1;
    }

    /// Every value sharing the highest count, smallest first. Empty when
    /// nothing was read.
    pub fn values(&self) -> Vec<u32> {
        let Some(&max) = self.votes.values().max() else {
            return Vec::new();
        };
        self.votes.iter().filter(|&(_, &count)| count == max).map(|(&value, _)| value).collect()
    }
}

/// Symbol layout voted by a row indicator column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BarcodeMetadata {
    pub column_count: u32,
    pub ec_level: u8,
    pub row_count_upper: u32,
    pub row_count_lower: u32,
}

impl BarcodeMetadata {
    pub const fn row_count(&self) -> u32 {
        self.row_count_upper + self.row_count_lower
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_number() {
        let mut codeword = Codeword::new(10, 27, 3, 64);
        assert_eq!(codeword.width(), 17);
        assert!(!codeword.has_valid_row_number());

        codeword.set_row_number_as_row_indicator();
        // 64 / 30 = 2, bucket 3 is the second row of the group
        assert_eq!(codeword.row_number, Some(7));
        assert!(codeword.has_valid_row_number());
        assert!(!codeword.is_valid_row_number(6));
    }

    #[test]
    fn test_barcode_value() {
        let mut value = BarcodeValue::default();
        assert!(value.values().is_empty());

        value.set_value(12);
        value.set_value(7);
        assert_eq!(value.values(), [7, 12]);

        value.set_value(12);
        assert_eq!(value.values(), [12]);
        assert_eq!(value.votes.get(&12), Some(&2));
    }
}
