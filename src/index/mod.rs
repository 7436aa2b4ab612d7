//! Index structures.
//!
//! - [`btree`] - Disk-resident B+Tree over the buffer pool

pub mod btree;
