pub mod bitfield;
pub mod row;
pub mod pdf417;

pub type PDF417Row<'a> = pdf417::PDF417Row<'a, false>;
pub type TruncatedPDF417Row<'a> = pdf417::PDF417Row<'a, true>;
