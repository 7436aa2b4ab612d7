//! Storage layer - disk I/O, the file catalog and page formats.
//!
//! This module handles persistent storage:
//! - [`DiskManager`] - Low-level file I/O and page allocation
//! - [`Catalog`] - Name → header page directory kept in page 0
//! - [`page`] - Page types and layouts

mod catalog;
mod disk_manager;
pub mod page;

pub use catalog::Catalog;
pub use disk_manager::DiskManager;
