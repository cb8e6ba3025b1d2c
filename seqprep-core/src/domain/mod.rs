//! Domain types for SeqPrep

pub mod row;
pub mod rowset;

pub use row::{Column, OhlcvRow};
pub use rowset::RowSet;
