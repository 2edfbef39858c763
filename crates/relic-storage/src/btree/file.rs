//! B+tree table file: traversal, insertion, split propagation, and
//! ordered iteration.

use super::index::IndexPage;
use super::leaf::{LeafPage, LEAF_HEADER_SIZE};
use crate::table::{RowCursor, TableFile};
use crate::tuple::{Tuple, TupleDesc};
use relic_buffer::BufferPool;
use relic_common::page::{PageId, PAGE_SIZE};
use relic_common::types::{Field, FieldType};
use relic_common::{RelicError, Result};

/// A table file whose rows are kept in key order by a B+tree.
///
/// The tree owns a root page number and a height; `height == 1` means
/// the root is itself a leaf. Pages are fetched from the buffer pool
/// per operation and never cached here.
pub struct BTreeFile {
    file_id: u32,
    desc: TupleDesc,
    key_field: usize,
    root: u32,
    height: u32,
}

impl BTreeFile {
    /// Creates a B+tree file, initializing its root as an empty leaf.
    ///
    /// The key column must exist, must be INT, and a row must fit a
    /// page.
    pub fn create(
        pool: &mut BufferPool,
        file_id: u32,
        desc: TupleDesc,
        key_field: usize,
    ) -> Result<Self> {
        if key_field >= desc.field_count() {
            return Err(RelicError::FieldNotFound(format!(
                "key column {}",
                key_field
            )));
        }
        if desc.field_type(key_field) != FieldType::Int {
            return Err(RelicError::TypeMismatch {
                expected: FieldType::Int.to_string(),
                actual: desc.field_type(key_field).to_string(),
            });
        }
        if desc.byte_len() > PAGE_SIZE - LEAF_HEADER_SIZE {
            return Err(RelicError::Config(format!(
                "row of {} bytes does not fit a page",
                desc.byte_len()
            )));
        }

        let root = pool.allocate_page(file_id);
        let page = pool.get_page(PageId::new(file_id, root));
        LeafPage::new(page, &desc, key_field).init();

        Ok(Self {
            file_id,
            desc,
            key_field,
            root,
            height: 1,
        })
    }

    /// File identifier of this table.
    pub fn file_id(&self) -> u32 {
        self.file_id
    }

    /// Tree height (1 = root is a leaf).
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Index of the key column.
    pub fn key_field(&self) -> usize {
        self.key_field
    }

    fn key_of(&self, tuple: &Tuple) -> Result<i32> {
        match tuple.field(self.key_field) {
            Field::Int(v) => Ok(*v),
            other => Err(RelicError::TypeMismatch {
                expected: FieldType::Int.to_string(),
                actual: other.field_type().to_string(),
            }),
        }
    }

    /// Key-guided descent from the root. Returns the index pages
    /// visited (root first) and the leaf page number.
    fn find_leaf(&self, pool: &mut BufferPool, key: i32) -> (Vec<u32>, u32) {
        let mut path = Vec::with_capacity(self.height as usize);
        let mut current = self.root;
        for _ in 1..self.height {
            let page = pool.get_page(PageId::new(self.file_id, current));
            let node = IndexPage::new(page);
            path.push(current);
            current = node.find_child(key);
        }
        (path, current)
    }

    /// Splits the full leaf `leaf_num` and propagates the separator up
    /// the recorded root-to-leaf path.
    fn split_leaf(&mut self, pool: &mut BufferPool, leaf_num: u32, path: Vec<u32>) -> Result<()> {
        let new_num = pool.allocate_page(self.file_id);
        let (left_buf, right_buf) = pool.page_pair_mut(self.file_id, leaf_num, new_num)?;
        let mut left = LeafPage::new(left_buf, &self.desc, self.key_field);
        let mut right = LeafPage::new(right_buf, &self.desc, self.key_field);
        let separator = left.split(&mut right, new_num);
        tracing::debug!(
            file = self.file_id,
            left = leaf_num,
            right = new_num,
            separator,
            "leaf split"
        );
        self.insert_into_parent(pool, path, separator, new_num)
    }

    /// Inserts a separator key and its right child into the lowest
    /// index page on `path`, splitting upward as long as nodes fill.
    fn insert_into_parent(
        &mut self,
        pool: &mut BufferPool,
        mut path: Vec<u32>,
        mut key: i32,
        mut right: u32,
    ) -> Result<()> {
        loop {
            let Some(parent_num) = path.pop() else {
                return self.grow_root(pool, key, right);
            };
            let page = pool.get_page(PageId::new(self.file_id, parent_num));
            let mut parent = IndexPage::new(page);
            if !parent.insert(key, right) {
                return Ok(());
            }

            let new_num = pool.allocate_page(self.file_id);
            let (left_buf, right_buf) = pool.page_pair_mut(self.file_id, parent_num, new_num)?;
            let mut left = IndexPage::new(left_buf);
            let mut new_node = IndexPage::new(right_buf);
            key = left.split(&mut new_node);
            right = new_num;
            tracing::debug!(
                file = self.file_id,
                left = parent_num,
                right = new_num,
                separator = key,
                "index split"
            );
        }
    }

    /// Installs a new root index page over the old root and `right`.
    fn grow_root(&mut self, pool: &mut BufferPool, key: i32, right: u32) -> Result<()> {
        let new_root = pool.allocate_page(self.file_id);
        let page = pool.get_page(PageId::new(self.file_id, new_root));
        let mut node = IndexPage::new(page);
        node.init(self.height == 1);
        node.set_child_at(0, self.root);
        node.insert(key, right);

        tracing::debug!(
            file = self.file_id,
            root = new_root,
            height = self.height + 1,
            "tree grew a level"
        );
        self.root = new_root;
        self.height += 1;
        Ok(())
    }
}

impl TableFile for BTreeFile {
    fn desc(&self) -> &TupleDesc {
        &self.desc
    }

    fn insert_tuple(&mut self, pool: &mut BufferPool, tuple: &Tuple) -> Result<()> {
        let key = self.key_of(tuple)?;
        let (path, leaf_num) = self.find_leaf(pool, key);

        let page = pool.get_page(PageId::new(self.file_id, leaf_num));
        let mut leaf = LeafPage::new(page, &self.desc, self.key_field);
        let full = leaf.insert_tuple(tuple)?;

        if full {
            self.split_leaf(pool, leaf_num, path)?;
        }
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
        LeafPage::new(page, &self.desc, self.key_field).get_tuple(cursor.slot() as usize)
    }

    fn begin(&self, pool: &mut BufferPool) -> Result<RowCursor> {
        let mut current = self.root;
        for _ in 1..self.height {
            let page = pool.get_page(PageId::new(self.file_id, current));
            current = IndexPage::new(page).child_at(0);
        }
        let page = pool.get_page(PageId::new(self.file_id, current));
        let leaf = LeafPage::new(page, &self.desc, self.key_field);
        if leaf.size() == 0 {
            Ok(RowCursor::END)
        } else {
            Ok(RowCursor::new(current, 0))
        }
    }

    fn end(&self) -> RowCursor {
        RowCursor::END
    }

    fn next(&self, pool: &mut BufferPool, cursor: &mut RowCursor) -> Result<()> {
        if cursor.is_end() {
            return Err(RelicError::CursorOutOfRange);
        }
        let page = pool.get_page(PageId::new(self.file_id, cursor.page()));
        let leaf = LeafPage::new(page, &self.desc, self.key_field);

        let slot = cursor.slot() as usize + 1;
        if slot < leaf.size() {
            *cursor = RowCursor::new(cursor.page(), slot as u32);
            return Ok(());
        }
        // Splits place new pages anywhere in the file, so the scan
        // follows the successor pointer, never the physical order.
        *cursor = match leaf.next_leaf() {
            Some(next) => RowCursor::new(next, 0),
            None => RowCursor::END,
        };
        Ok(())
    }
}
