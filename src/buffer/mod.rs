//! Buffer pool management.
//!
//! The buffer pool is the page store underneath the B+Tree. It manages a
//! fixed pool of frames, each holding one page, and hands out pins as RAII
//! guards.
//!
//! # Components
//! - [`BufferPoolManager`] - The page cache, allocator and catalog front end
//! - [`Frame`] - A slot in the buffer pool holding a page + metadata
//! - [`PageReadGuard`] / [`PageWriteGuard`] - RAII pins
//! - [`BufferPoolStats`] - Performance and allocation statistics
//! - [`replacer`] - Eviction policy

mod buffer_pool_manager;
mod frame;
mod page_guard;
pub mod replacer;
mod stats;

pub use buffer_pool_manager::BufferPoolManager;
pub use frame::Frame;
pub use page_guard::{PageReadGuard, PageWriteGuard};
pub use stats::{BufferPoolStats, StatsSnapshot};
