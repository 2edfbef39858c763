//! Append-only heap table file.
//!
//! Rows are stored in insertion order: each page holds a row count
//! followed by fixed-width rows, and new rows append to the last page.
//! Unlike B+tree leaves, physical page order is scan order, so no
//! successor pointer is needed.

use crate::table::{RowCursor, TableFile};
use crate::tuple::{Tuple, TupleDesc};
use relic_buffer::{BufferPool, PageBuf};
use relic_common::page::{PageId, PAGE_SIZE};
use relic_common::{RelicError, Result};

/// Heap header size: size (4 bytes) + 4 reserved bytes.
const HEAP_HEADER_SIZE: usize = 8;

/// An unordered table file; rows scan in insertion order.
pub struct HeapFile {
    file_id: u32,
    desc: TupleDesc,
}

impl HeapFile {
    /// Creates a heap file for rows described by `desc`.
    pub fn new(file_id: u32, desc: TupleDesc) -> Result<Self> {
        if desc.byte_len() > PAGE_SIZE - HEAP_HEADER_SIZE {
            return Err(RelicError::Config(format!(
                "row of {} bytes does not fit a page",
                desc.byte_len()
            )));
        }
        Ok(Self { file_id, desc })
    }

    /// File identifier of this table.
    pub fn file_id(&self) -> u32 {
        self.file_id
    }

    fn rows_per_page(&self) -> usize {
        (PAGE_SIZE - HEAP_HEADER_SIZE) / self.desc.byte_len()
    }

    fn page_size(page: &PageBuf) -> usize {
        u32::from_le_bytes([page[0], page[1], page[2], page[3]]) as usize
    }

    fn set_page_size(page: &mut PageBuf, size: usize) {
        page[0..4].copy_from_slice(&(size as u32).to_le_bytes());
    }
}

impl TableFile for HeapFile {
    fn desc(&self) -> &TupleDesc {
        &self.desc
    }

    fn insert_tuple(&mut self, pool: &mut BufferPool, tuple: &Tuple) -> Result<()> {
        let image = self.desc.encode(tuple)?;
        let capacity = self.rows_per_page();

        let count = pool.page_count(self.file_id);
        let mut page_num = if count == 0 {
            pool.allocate_page(self.file_id)
        } else {
            count - 1
        };

        let size = Self::page_size(pool.get_page(PageId::new(self.file_id, page_num)));
        if size >= capacity {
            page_num = pool.allocate_page(self.file_id);
        }

        let page = pool.get_page(PageId::new(self.file_id, page_num));
        let size = Self::page_size(page);
        let offset = HEAP_HEADER_SIZE + size * self.desc.byte_len();
        page[offset..offset + self.desc.byte_len()].copy_from_slice(&image);
        Self::set_page_size(page, size + 1);
        Ok(())
    }

    fn delete_tuple(&mut self, _pool: &mut BufferPool, _cursor: &RowCursor) -> Result<()> {
        Err(RelicError::Unsupported("tuple deletion".to_string()))
    }

    fn get_tuple(&self, pool: &mut BufferPool, cursor: &RowCursor) -> Result<Tuple> {
        if cursor.is_end() {
            return Err(RelicError::CursorOutOfRange);
        }
        let page = pool.get_page(PageId::new(self.file_id, cursor.page()));
        let size = Self::page_size(page);
        let slot = cursor.slot() as usize;
        if slot >= size {
            return Err(RelicError::SlotOutOfRange { slot, size });
        }
        let offset = HEAP_HEADER_SIZE + slot * self.desc.byte_len();
        Ok(self
            .desc
            .deserialize(&page[offset..offset + self.desc.byte_len()]))
    }

    fn begin(&self, pool: &mut BufferPool) -> Result<RowCursor> {
        if pool.page_count(self.file_id) == 0 {
            return Ok(RowCursor::END);
        }
        let page = pool.get_page(PageId::new(self.file_id, 0));
        if Self::page_size(page) == 0 {
            Ok(RowCursor::END)
        } else {
            Ok(RowCursor::new(0, 0))
        }
    }

    fn end(&self) -> RowCursor {
        RowCursor::END
    }

    fn next(&self, pool: &mut BufferPool, cursor: &mut RowCursor) -> Result<()> {
        if cursor.is_end() {
            return Err(RelicError::CursorOutOfRange);
        }
        let size = Self::page_size(pool.get_page(PageId::new(self.file_id, cursor.page())));
        let slot = cursor.slot() as usize + 1;
        if slot < size {
            *cursor = RowCursor::new(cursor.page(), slot as u32);
            return Ok(());
        }

        let next_page = cursor.page() + 1;
        if next_page >= pool.page_count(self.file_id) {
            *cursor = RowCursor::END;
            return Ok(());
        }
        let next_size = Self::page_size(pool.get_page(PageId::new(self.file_id, next_page)));
        *cursor = if next_size == 0 {
            RowCursor::END
        } else {
            RowCursor::new(next_page, 0)
        };
        Ok(())
    }
}
