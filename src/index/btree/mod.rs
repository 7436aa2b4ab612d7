//! Disk-resident B+Tree index.
//!
//! # Structure
//! ```text
//!                 ┌──────────────┐
//!                 │ header page  │  catalog: name → header page id
//!                 └──────┬───────┘
//!                        │ root
//!                 ┌──────▼───────┐
//!                 │  index page  │  leftmost | (sep, child) ...
//!                 └──┬────────┬──┘
//!           ┌────────▼─┐    ┌─▼────────┐
//!           │   leaf   │◄──►│   leaf   │  (key, rid) ... sorted
//!           └──────────┘    └──────────┘
//! ```
//!
//! Leaves are chained in key order, so scans walk the chain and never
//! return to the index pages. Deletes are naive: nodes are never merged,
//! and leaves may become empty.
//!
//! # Modules
//! - [`key`] - Keys and key types
//! - [`sorted_page`] / [`leaf_page`] / [`index_page`] / [`header_page`] - Page layouts
//! - [`trace`] - Structural tracing
//! - `btree_file`, `search`, `insert`, `delete`, `scan` - The tree operations

mod btree_file;
mod delete;
pub mod header_page;
pub mod index_page;
mod insert;
pub mod key;
pub mod leaf_page;
mod scan;
mod search;
pub mod sorted_page;
pub mod trace;

pub use btree_file::BTreeFile;
pub use header_page::{BTreeHeader, DeleteFashion};
pub use index_page::{IndexEntry, IndexPage};
pub use key::{Key, KeyType};
pub use leaf_page::{LeafEntry, LeafPage};
pub use scan::BTreeScan;
pub use sorted_page::SortedPage;
pub use trace::{TraceEvent, Tracer, WriterTracer};
