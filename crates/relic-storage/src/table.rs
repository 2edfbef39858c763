//! The table-file contract shared by all storage backends.

use crate::tuple::{Tuple, TupleDesc};
use relic_buffer::BufferPool;
use relic_common::page::NO_PAGE;
use relic_common::Result;

/// A scan position: the page number and slot of a row.
///
/// Cursors hold coordinates only, never a live page reference, so they
/// stay valid across buffer-pool page turnover. The end position is an
/// explicit sentinel rather than a physical page count, because leaf
/// chain order need not match physical page order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCursor {
    page: u32,
    slot: u32,
}

impl RowCursor {
    /// The position past the last row of any scan.
    pub const END: RowCursor = RowCursor {
        page: NO_PAGE,
        slot: 0,
    };

    /// Creates a cursor addressing `slot` on `page`.
    pub fn new(page: u32, slot: u32) -> Self {
        Self { page, slot }
    }

    /// Page number this cursor addresses.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Slot within the page.
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Returns true if this is the end position.
    pub fn is_end(&self) -> bool {
        self.page == NO_PAGE
    }
}

/// Contract implemented by every table file and consumed by the query
/// operators.
///
/// The buffer pool is passed into each operation explicitly, so
/// multiple independent table files can share one pool without any
/// process-wide state.
pub trait TableFile {
    /// Schema of the rows stored in this file.
    fn desc(&self) -> &TupleDesc;

    /// Inserts a row.
    fn insert_tuple(&mut self, pool: &mut BufferPool, tuple: &Tuple) -> Result<()>;

    /// Deletes the row at `cursor`.
    fn delete_tuple(&mut self, pool: &mut BufferPool, cursor: &RowCursor) -> Result<()>;

    /// Reads the row at `cursor`.
    fn get_tuple(&self, pool: &mut BufferPool, cursor: &RowCursor) -> Result<Tuple>;

    /// Returns a cursor at the first row, or the end position for an
    /// empty file.
    fn begin(&self, pool: &mut BufferPool) -> Result<RowCursor>;

    /// Returns the end position.
    fn end(&self) -> RowCursor;

    /// Advances `cursor` to the next row, or to the end position.
    fn next(&self, pool: &mut BufferPool, cursor: &mut RowCursor) -> Result<()>;
}
