use core::iter;

use crate::generators::{bitfield::Bitfield, row::Row};
use crate::tables::{symbol_for, MODULES_IN_CODEWORD, MODULES_IN_STOP_PATTERN};

pub const START_PAT: Bitfield = Bitfield::new(0b11111111010101000, 17);
pub const   END_PAT: Bitfield = Bitfield::new(0b111111101000101001, 18);
/// Stop pattern of compact symbols: a single dark module.
pub const TRUNCATED_END_PAT: Bitfield = Bitfield::new(1, 1);

macro_rules! cw {
    ($tb:expr, $val:expr) => {
        Bitfield::new(symbol_for($tb as usize, $val), MODULES_IN_CODEWORD as u8)
    }
}

#[derive(Debug, Clone)]
#[repr(u8)]
enum RowPattern {
    Start,
    Left,
    Data,
    Right,
    End,
    None,
}

/// Row of a PDF417 symbol. Compact (`TRUNCATED`) rows drop the right row
/// indicator and reduce the stop pattern to a single bar.
#[derive(Debug, Clone)]
pub struct PDF417Row<'a, const TRUNCATED: bool> {
    codewords: &'a [u16],
    next_pat: RowPattern,
    table: u8,
    /// (left, right)
    markers: (u16, u16)
}

impl<'a, const TRUNCATED: bool> Row<'a> for PDF417Row<'a, TRUNCATED> {
    /// (rows, cols, level) row indicator values
    type Info = (u8, u8, u8);
    const DEFAULT_SCALE: (u16, u16) = (1, 3);

    fn init(codewords: &'a [u16], row: u8, infos: Self::Info) -> Self {
        let (rows_val, cols_val, level_val) = infos;
        let table = row % 3;
        let row_id = (row / 3) as u16 * 30;

        let (left, right) = match table {
            0 => (rows_val, cols_val),
            1 => (level_val, rows_val),
            _ => (cols_val, level_val),
        };
        Self {
            codewords,
            table,
            markers: (left as u16 + row_id, right as u16 + row_id),
            next_pat: RowPattern::Start
        }
    }

    fn prepare((rows, cols): (u8, u8), level: u8) -> Self::Info {
        let rows_val = (rows - 1) / 3;
        let cols_val = cols - 1;
        let level_val = level * 3 + (rows - 1) % 3;
        (rows_val, cols_val, level_val)
    }

    fn width(cols: u8) -> u32 {
        let data = (cols as u32 + 2) * MODULES_IN_CODEWORD;
        if TRUNCATED {
            data + 1
        } else {
            data + MODULES_IN_CODEWORD + MODULES_IN_STOP_PATTERN
        }
    }
}

impl<'a, const TRUNCATED: bool> iter::Iterator for PDF417Row<'a, TRUNCATED> {
    type Item = Bitfield;

    fn next(&mut self) -> Option<Self::Item> {
        let (item, next) = match self.next_pat {
            RowPattern::Start => (Some(START_PAT), RowPattern::Left),
            RowPattern::Left => {
                let next = if self.codewords.is_empty() { RowPattern::Right } else { RowPattern::Data };
                (Some(cw!(self.table, self.markers.0)), next)
            }
            RowPattern::Data => {
                let (&cw, rest) = self.codewords.split_first()?;
                self.codewords = rest;

                let next = if rest.is_empty() { RowPattern::Right } else { RowPattern::Data };
                (Some(cw!(self.table, cw)), next)
            },
            RowPattern::Right if TRUNCATED => (Some(TRUNCATED_END_PAT), RowPattern::None),
            RowPattern::Right => (Some(cw!(self.table, self.markers.1)), RowPattern::End),
            RowPattern::End => (Some(END_PAT), RowPattern::None),
            RowPattern::None => (None, RowPattern::None)
        };

        self.next_pat = next;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let tail = if TRUNCATED { 1 } else { 2 };
        let count = self.codewords.len() + match self.next_pat {
            RowPattern::Start => 2 + tail,
            RowPattern::Left  => 1 + tail,
            RowPattern::Data | RowPattern::Right => tail,
            RowPattern::End   => 1,
            RowPattern::None  => 0,
        };
        (count, Some(count))
    }
}

impl<'a, const TRUNCATED: bool> ExactSizeIterator for PDF417Row<'a, TRUNCATED> {}
impl<'a, const TRUNCATED: bool> iter::FusedIterator for PDF417Row<'a, TRUNCATED> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn modules<'a, R: Row<'a>>(row: R) -> Vec<bool> {
        row.flatten().collect()
    }

    #[test]
    fn test_row_layout() {
        let infos = PDF417Row::<false>::prepare((6, 2), 1);
        assert_eq!(infos, (1, 1, 5));

        let row = PDF417Row::<false>::init(&[1, 2], 0, infos);
        assert_eq!(row.len(), 6);
        let bits = modules(row);
        assert_eq!(bits.len() as u32, PDF417Row::<false>::width(2));
        assert_eq!(bits.len(), 17 * 6 + 1);
        // start pattern then the leading bar of the left indicator
        assert_eq!(bits[..9], [true, true, true, true, true, true, true, true, false]);
        assert!(bits[17]);
        // stop pattern ends with a bar
        assert!(bits[bits.len() - 1]);
    }

    #[test]
    fn test_row_indicators() {
        let infos = (1, 1, 5);
        let row = PDF417Row::<false>::init(&[], 4, infos);
        // row 4 is in cluster 1: left = level, right = rows
        assert_eq!(row.markers, (35, 31));
        let row = PDF417Row::<false>::init(&[], 5, infos);
        assert_eq!(row.markers, (31, 35));
        assert_eq!(row.table, 2);
    }

    #[test]
    fn test_truncated_row() {
        let infos = PDF417Row::<true>::prepare((3, 1), 0);
        let row = PDF417Row::<true>::init(&[7], 0, infos);
        assert_eq!(row.len(), 4);
        let fields: Vec<Bitfield> = row.collect();
        assert_eq!(fields[0], START_PAT);
        assert_eq!(fields[2], Bitfield::new(symbol_for(0, 7), 17));
        assert_eq!(fields[3], TRUNCATED_END_PAT);
        assert_eq!(PDF417Row::<true>::width(1), 52);
    }
}
