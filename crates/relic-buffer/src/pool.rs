//! Buffer pool manager.

use relic_common::page::{PageId, PAGE_SIZE};
use relic_common::{RelicError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A fixed-size page frame.
pub type PageBuf = [u8; PAGE_SIZE];

/// Configuration for the buffer pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferPoolConfig {
    /// Frame capacity reserved per file on its first access.
    pub frames_per_file_hint: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            frames_per_file_hint: 64,
        }
    }
}

/// Buffer pool.
///
/// Every page access fetches the frame by identifier; callers hold the
/// returned reference only for the duration of one page-level
/// operation. Accessing a page number beyond a file's current page
/// count grows the file with zero-filled frames.
pub struct BufferPool {
    config: BufferPoolConfig,
    files: HashMap<u32, Vec<Box<PageBuf>>>,
}

impl BufferPool {
    /// Creates a buffer pool with the default configuration.
    pub fn new() -> Self {
        Self::with_config(BufferPoolConfig::default())
    }

    /// Creates a buffer pool with the given configuration.
    pub fn with_config(config: BufferPoolConfig) -> Self {
        Self {
            config,
            files: HashMap::new(),
        }
    }

    /// Returns the number of pages currently allocated for a file.
    pub fn page_count(&self, file_id: u32) -> u32 {
        self.files.get(&file_id).map_or(0, |f| f.len() as u32)
    }

    /// Fetches the frame for a page, allocating zero-filled frames
    /// through `page_num` if the file is not yet that large.
    pub fn get_page(&mut self, page_id: PageId) -> &mut PageBuf {
        let hint = self.config.frames_per_file_hint;
        let frames = self
            .files
            .entry(page_id.file_id)
            .or_insert_with(|| Vec::with_capacity(hint));
        while frames.len() <= page_id.page_num as usize {
            tracing::trace!(page = %PageId::new(page_id.file_id, frames.len() as u32), "allocating page frame");
            frames.push(Box::new([0u8; PAGE_SIZE]));
        }
        &mut frames[page_id.page_num as usize]
    }

    /// Appends a zeroed page to a file and returns its page number.
    pub fn allocate_page(&mut self, file_id: u32) -> u32 {
        let page_num = self.page_count(file_id);
        self.get_page(PageId::new(file_id, page_num));
        page_num
    }

    /// Fetches two distinct frames of the same file at once.
    ///
    /// Needed by page splits, which write the old and new page in one
    /// page-level operation.
    pub fn page_pair_mut(
        &mut self,
        file_id: u32,
        a: u32,
        b: u32,
    ) -> Result<(&mut PageBuf, &mut PageBuf)> {
        if a == b {
            return Err(RelicError::Corrupted(format!(
                "page pair fetch for identical page {}",
                a
            )));
        }
        // Grow the file through the larger page number first.
        self.get_page(PageId::new(file_id, a.max(b)));
        let frames = self
            .files
            .get_mut(&file_id)
            .ok_or_else(|| RelicError::Corrupted(format!("unknown file {}", file_id)))?;

        let (lo, hi) = (a.min(b) as usize, a.max(b) as usize);
        let (head, tail) = frames.split_at_mut(hi);
        let (first, second) = (&mut *head[lo], &mut *tail[0]);
        if a < b {
            Ok((first, second))
        } else {
            Ok((second, first))
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}
