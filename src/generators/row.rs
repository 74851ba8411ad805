use core::iter;
use crate::generators::bitfield::Bitfield;

/// A row of a symbol, produced as a sequence of [Bitfield]s from left to
/// right.
pub trait Row<'a>: iter::Iterator<Item = Bitfield> + Clone {
    type Info: Copy; // info must be cheap to copy
    const DEFAULT_SCALE: (u16, u16);

    /// Builds row number `row` out of its data codewords.
    fn init(codewords: &'a [u16], row: u8, infos: Self::Info) -> Self;
    /// Computes the per-symbol information shared by every row.
    fn prepare(dimensions: (u8, u8), level: u8) -> Self::Info;
    /// Width of a row in modules.
    fn width(cols: u8) -> u32;
}
