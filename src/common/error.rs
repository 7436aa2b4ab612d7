//! Error types for pagetree.

use thiserror::Error;

use crate::index::btree::KeyType;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in pagetree.
///
/// Page-store failures (disk, buffer pool, catalog) are grouped by
/// [`Error::is_store_error`]. Index failures carry the offending sizes,
/// types or page so the caller can tell where the operation stopped.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from disk operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page does not exist on disk.
    #[error("Page {0} not found")]
    PageNotFound(u32),

    /// Buffer pool has no free frames and cannot evict any pages.
    ///
    /// This happens when all frames are pinned.
    #[error("No free frames available in buffer pool")]
    NoFreeFrames,

    /// The provided page ID is invalid (e.g., the sentinel or page 0).
    #[error("Invalid page ID: {0}")]
    InvalidPageId(u32),

    /// Attempted to free a page that is still pinned.
    #[error("Page {0} is still pinned")]
    PagePinned(u32),

    /// Stored CRC32 does not match the page contents.
    #[error("Checksum mismatch on page {0}")]
    ChecksumMismatch(u32),

    /// A file entry with this name is already registered in the catalog.
    #[error("File entry '{0}' already exists")]
    DuplicateFileEntry(String),

    /// No file entry with this name is registered in the catalog.
    #[error("File entry '{0}' not found")]
    FileEntryNotFound(String),

    /// File name does not fit in a catalog slot.
    #[error("File name '{0}' is too long")]
    FileNameTooLong(String),

    /// The catalog page has no free slots.
    #[error("File catalog is full")]
    DirectoryFull,

    /// Encoded key is larger than the index allows.
    #[error("Key of {size} bytes exceeds maximum key size {max}")]
    KeyTooLong { size: usize, max: usize },

    /// Key variant does not match the index key type.
    #[error("Key type mismatch: index holds {expected:?} keys, got {found:?}")]
    KeyTypeMismatch { expected: KeyType, found: KeyType },

    /// Requested maximum key size cannot be supported by the page layout.
    #[error("Invalid maximum key size: {0}")]
    InvalidKeySize(usize),

    /// A page did not have the layout the index expected.
    ///
    /// Treated as unrecoverable corruption.
    #[error("Corrupted page {page_id}: {context}")]
    Corrupted { page_id: u32, context: &'static str },

    /// Scan cursor has no current entry to operate on.
    #[error("Scan cursor has no current entry")]
    NoCurrentEntry,
}

impl Error {
    /// Whether this error originated in the page store (disk, buffer pool
    /// or file catalog) rather than in the index itself.
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::PageNotFound(_)
                | Error::NoFreeFrames
                | Error::InvalidPageId(_)
                | Error::PagePinned(_)
                | Error::ChecksumMismatch(_)
                | Error::DuplicateFileEntry(_)
                | Error::FileEntryNotFound(_)
                | Error::FileNameTooLong(_)
                | Error::DirectoryFull
        )
    }
}
