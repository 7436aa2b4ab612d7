//! Eviction policy implementations (replacers).
//!
//! - [`FifoReplacer`] - evicts unpinned frames in load order

mod fifo;

pub use fifo::FifoReplacer;
