//! Buffer pool for RelicDB.
//!
//! Hands out fixed-size mutable page frames by page identifier. Pages
//! are allocated zero-filled on first access and live for the life of
//! the pool; there is no eviction and no page is ever freed.

mod pool;

pub use pool::{BufferPool, BufferPoolConfig, PageBuf};
