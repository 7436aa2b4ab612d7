//! pagetree - a disk-resident B+Tree index over a pinned buffer pool.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            pagetree                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Index Layer (index/btree/)                  │   │
//! │  │   BTreeFile: open/destroy, insert, delete, scan, trace   │   │
//! │  │   Header / Index / Leaf pages on a sorted slot layout    │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓ pin / unpin (guards)             │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Buffer Pool (buffer/)                       │   │
//! │  │   BufferPoolManager + Frame + FIFO replacer + Stats      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Storage Layer (storage/)                    │   │
//! │  │   DiskManager + free list + file catalog (page 0)        │   │
//! │  │   Page + PageHeader (CRC32 checksums)                    │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, RecordId, FrameId, Error, config)
//! - [`storage`] - Disk I/O, the file catalog and page formats
//! - [`buffer`] - Buffer pool management and page guards
//! - [`index`] - The B+Tree
//!
//! # Quick Start
//! ```no_run
//! use pagetree::{BTreeFile, BufferPoolManager, DiskManager, Key, KeyType, PageId, RecordId};
//!
//! let dm = DiskManager::open_or_create("my_index.db").unwrap();
//! let bpm = BufferPoolManager::new(64, dm);
//!
//! let mut tree = BTreeFile::open_or_create(&bpm, "orders", KeyType::Integer, 8).unwrap();
//! tree.insert(&Key::Integer(42), RecordId::new(PageId::new(7), 3)).unwrap();
//!
//! for entry in tree.scan(None, None).unwrap() {
//!     println!("{}", entry.unwrap());
//! }
//!
//! tree.close();
//! bpm.flush_all_pages().unwrap();
//! ```

pub mod buffer;
pub mod common;
pub mod index;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{Error, FrameId, PageId, RecordId, Result};

pub use buffer::{BufferPoolManager, BufferPoolStats, Frame, StatsSnapshot};
pub use index::btree::{
    BTreeFile, BTreeScan, DeleteFashion, Key, KeyType, LeafEntry, TraceEvent, Tracer,
    WriterTracer,
};
pub use storage::page::{Page, PageHeader, PageType};
pub use storage::DiskManager;
