//! Storage engine for RelicDB.
//!
//! This crate provides:
//! - Fixed-width row serialization (`TupleDesc`, `Tuple`)
//! - The table-file contract (`TableFile`, `RowCursor`)
//! - A B+tree table file with buffer-pool-backed pages
//! - An append-only heap table file
//! - Per-column equi-width histograms for selectivity estimation

mod btree;
mod heap;
mod stats;
mod table;
mod tuple;

pub use btree::{BTreeFile, IndexPage, LeafPage};
pub use heap::HeapFile;
pub use stats::ColumnStats;
pub use table::{RowCursor, TableFile};
pub use tuple::{Tuple, TupleDesc};
