//! B+tree leaf page view.

use crate::tuple::{Tuple, TupleDesc};
use relic_buffer::PageBuf;
use relic_common::page::NO_PAGE;
use relic_common::types::Field;
use relic_common::{RelicError, Result};

/// Leaf header size: size (4 bytes) + next_leaf (4 bytes).
pub(crate) const LEAF_HEADER_SIZE: usize = 8;

/// View of a page holding sorted fixed-width rows.
///
/// Layout: `{size: u32 LE, next_leaf: u32 LE}` followed by `size`
/// serialized rows. `next_leaf == u32::MAX` means no successor.
pub struct LeafPage<'a> {
    data: &'a mut PageBuf,
    desc: &'a TupleDesc,
    key_field: usize,
    capacity: usize,
}

impl<'a> LeafPage<'a> {
    /// Interprets `data` as a leaf page of rows described by `desc`,
    /// sorted on `key_field`.
    pub fn new(data: &'a mut PageBuf, desc: &'a TupleDesc, key_field: usize) -> Self {
        let capacity = (data.len() - LEAF_HEADER_SIZE) / desc.byte_len();
        Self {
            data,
            desc,
            key_field,
            capacity,
        }
    }

    /// Initializes an empty leaf: zero rows, no successor.
    pub fn init(&mut self) {
        self.set_size(0);
        self.set_next_leaf(None);
    }

    /// Number of rows on this page.
    pub fn size(&self) -> usize {
        u32::from_le_bytes([self.data[0], self.data[1], self.data[2], self.data[3]]) as usize
    }

    fn set_size(&mut self, size: usize) {
        self.data[0..4].copy_from_slice(&(size as u32).to_le_bytes());
    }

    /// Page number of the successor leaf, if any.
    pub fn next_leaf(&self) -> Option<u32> {
        let next = u32::from_le_bytes([self.data[4], self.data[5], self.data[6], self.data[7]]);
        if next == NO_PAGE {
            None
        } else {
            Some(next)
        }
    }

    /// Sets the successor leaf pointer.
    pub fn set_next_leaf(&mut self, next: Option<u32>) {
        let raw = next.unwrap_or(NO_PAGE);
        self.data[4..8].copy_from_slice(&raw.to_le_bytes());
    }

    /// Maximum number of rows this page can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn slot_offset(&self, slot: usize) -> usize {
        LEAF_HEADER_SIZE + slot * self.desc.byte_len()
    }

    /// Key of the row at `slot`. Caller guarantees the slot is
    /// occupied.
    pub fn key_at(&self, slot: usize) -> i32 {
        let offset = self.slot_offset(slot) + self.desc.offset_of(self.key_field);
        i32::from_le_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }

    /// Reads the row at `slot`.
    pub fn get_tuple(&self, slot: usize) -> Result<Tuple> {
        let size = self.size();
        if slot >= size {
            return Err(RelicError::SlotOutOfRange { slot, size });
        }
        let offset = self.slot_offset(slot);
        Ok(self.desc.deserialize(&self.data[offset..offset + self.desc.byte_len()]))
    }

    /// Inserts a row in key order. An exact key match overwrites the
    /// existing row in place without growing the page.
    ///
    /// Returns whether the leaf is now at capacity, in which case the
    /// caller must split it before the next insert.
    pub fn insert_tuple(&mut self, tuple: &Tuple) -> Result<bool> {
        let key = match tuple.field(self.key_field) {
            Field::Int(v) => *v,
            other => {
                return Err(RelicError::TypeMismatch {
                    expected: "INT".to_string(),
                    actual: other.field_type().to_string(),
                })
            }
        };
        let image = self.desc.encode(tuple)?;
        let row_len = self.desc.byte_len();
        let size = self.size();

        let mut slot = 0;
        while slot < size && self.key_at(slot) < key {
            slot += 1;
        }
        let offset = self.slot_offset(slot);

        if slot < size && self.key_at(slot) == key {
            self.data[offset..offset + row_len].copy_from_slice(&image);
            return Ok(size >= self.capacity);
        }
        if size >= self.capacity {
            return Err(RelicError::PageFull);
        }

        let end = self.slot_offset(size);
        self.data.copy_within(offset..end, offset + row_len);
        self.data[offset..offset + row_len].copy_from_slice(&image);
        self.set_size(size + 1);
        Ok(size + 1 >= self.capacity)
    }

    /// Moves the upper half of this page's rows into `right` (the page
    /// at `right_page_num`) and relinks the leaf chain through it.
    ///
    /// Returns the key of `right`'s first row, to be inserted into the
    /// parent as the separator.
    pub fn split(&mut self, right: &mut LeafPage<'_>, right_page_num: u32) -> i32 {
        let size = self.size();
        let split_at = size / 2;
        let moved = size - split_at;
        let row_len = self.desc.byte_len();

        let src_start = self.slot_offset(split_at);
        let src_end = self.slot_offset(size);
        right.data[LEAF_HEADER_SIZE..LEAF_HEADER_SIZE + moved * row_len]
            .copy_from_slice(&self.data[src_start..src_end]);
        right.set_size(moved);
        right.set_next_leaf(self.next_leaf());

        self.set_size(split_at);
        self.set_next_leaf(Some(right_page_num));

        right.key_at(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relic_common::page::PAGE_SIZE;
    use relic_common::types::FieldType;

    fn desc() -> TupleDesc {
        TupleDesc::new(
            vec![FieldType::Int, FieldType::Char],
            vec!["id".to_string(), "name".to_string()],
        )
        .unwrap()
    }

    fn row(id: i32, name: &str) -> Tuple {
        Tuple::new(vec![Field::Int(id), Field::Char(name.to_string())])
    }

    #[test]
    fn test_init_and_capacity() {
        let desc = desc();
        let mut buf = [0u8; PAGE_SIZE];
        let mut leaf = LeafPage::new(&mut buf, &desc, 0);
        leaf.init();
        assert_eq!(leaf.size(), 0);
        assert_eq!(leaf.next_leaf(), None);
        assert_eq!(leaf.capacity(), (PAGE_SIZE - LEAF_HEADER_SIZE) / desc.byte_len());
    }

    #[test]
    fn test_insert_keeps_key_order() {
        let desc = desc();
        let mut buf = [0u8; PAGE_SIZE];
        let mut leaf = LeafPage::new(&mut buf, &desc, 0);
        leaf.init();
        for id in [5, 1, 3] {
            assert!(!leaf.insert_tuple(&row(id, "x")).unwrap());
        }
        assert_eq!(leaf.size(), 3);
        assert_eq!(leaf.key_at(0), 1);
        assert_eq!(leaf.key_at(1), 3);
        assert_eq!(leaf.key_at(2), 5);
    }

    #[test]
    fn test_upsert_overwrites_in_place() {
        let desc = desc();
        let mut buf = [0u8; PAGE_SIZE];
        let mut leaf = LeafPage::new(&mut buf, &desc, 0);
        leaf.init();
        leaf.insert_tuple(&row(1, "old")).unwrap();
        leaf.insert_tuple(&row(2, "two")).unwrap();
        leaf.insert_tuple(&row(1, "new")).unwrap();
        assert_eq!(leaf.size(), 2);
        assert_eq!(leaf.get_tuple(0).unwrap(), row(1, "new"));
        assert_eq!(leaf.get_tuple(1).unwrap(), row(2, "two"));
    }

    #[test]
    fn test_insert_reports_full_at_capacity() {
        let desc = desc();
        let mut buf = [0u8; PAGE_SIZE];
        let mut leaf = LeafPage::new(&mut buf, &desc, 0);
        leaf.init();
        let capacity = leaf.capacity();
        for id in 0..capacity as i32 - 1 {
            assert!(!leaf.insert_tuple(&row(id, "x")).unwrap());
        }
        // The insert that fills the page reports it.
        assert!(leaf.insert_tuple(&row(capacity as i32, "x")).unwrap());
        assert_eq!(leaf.size(), capacity);
    }

    #[test]
    fn test_insert_into_full_page_fails() {
        let desc = desc();
        let mut buf = [0u8; PAGE_SIZE];
        let mut leaf = LeafPage::new(&mut buf, &desc, 0);
        leaf.init();
        for id in 0..leaf.capacity() as i32 {
            leaf.insert_tuple(&row(id, "x")).unwrap();
        }
        assert!(matches!(
            leaf.insert_tuple(&row(-1, "x")),
            Err(RelicError::PageFull)
        ));
        // Upsert of an existing key still works on a full page.
        assert!(leaf.insert_tuple(&row(0, "y")).unwrap());
        assert_eq!(leaf.get_tuple(0).unwrap(), row(0, "y"));
    }

    #[test]
    fn test_get_tuple_out_of_range() {
        let desc = desc();
        let mut buf = [0u8; PAGE_SIZE];
        let mut leaf = LeafPage::new(&mut buf, &desc, 0);
        leaf.init();
        leaf.insert_tuple(&row(1, "x")).unwrap();
        assert!(matches!(
            leaf.get_tuple(1),
            Err(RelicError::SlotOutOfRange { slot: 1, size: 1 })
        ));
    }

    #[test]
    fn test_split_moves_upper_half_and_relinks_chain() {
        let desc = desc();
        let mut left_buf = [0u8; PAGE_SIZE];
        let mut right_buf = [0u8; PAGE_SIZE];
        let mut left = LeafPage::new(&mut left_buf, &desc, 0);
        left.init();
        left.set_next_leaf(Some(9));
        for id in 0..10 {
            left.insert_tuple(&row(id, "x")).unwrap();
        }

        let mut right = LeafPage::new(&mut right_buf, &desc, 0);
        let separator = left.split(&mut right, 4);

        assert_eq!(separator, 5);
        assert_eq!(left.size(), 5);
        assert_eq!(right.size(), 5);
        // Every left key < separator <= every right key.
        for slot in 0..left.size() {
            assert!(left.key_at(slot) < separator);
        }
        for slot in 0..right.size() {
            assert!(right.key_at(slot) >= separator);
        }
        // Chain: left -> right -> old successor.
        assert_eq!(left.next_leaf(), Some(4));
        assert_eq!(right.next_leaf(), Some(9));
    }
}
