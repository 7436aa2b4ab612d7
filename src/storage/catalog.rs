//! File catalog - maps index names to their header pages.
//!
//! The catalog is kept in memory by the [`DiskManager`](super::DiskManager)
//! and written through to page 0 whenever it changes.

use crate::common::config::{DIRECTORY_PAGE_ID, MAX_FILE_NAME_LEN, PAGE_SIZE};
use crate::common::{Error, PageId, Result};
use crate::storage::page::{Page, PageHeader, PageType};

/// Name → header page directory.
///
/// # Layout (page 0)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       13    PageHeader (type = Directory)
/// 13      2     entry count (u16, little-endian)
/// 15      64×N  entries: name_len (u8) | name (59 bytes) | page_id (u32)
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<(String, PageId)>,
}

impl Catalog {
    const OFFSET_COUNT: usize = PageHeader::SIZE;
    const OFFSET_ENTRIES: usize = Self::OFFSET_COUNT + 2;
    const ENTRY_SIZE: usize = 1 + MAX_FILE_NAME_LEN + PageId::SIZE;

    /// Maximum number of entries that fit on the directory page.
    pub const CAPACITY: usize = (PAGE_SIZE - Self::OFFSET_ENTRIES) / Self::ENTRY_SIZE;

    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the catalog from the directory page.
    ///
    /// # Errors
    /// `Error::Corrupted` if the page is not a directory page or its entry
    /// count is out of range.
    pub fn from_page(page: &Page) -> Result<Self> {
        if page.page_type() != PageType::Directory {
            return Err(Error::Corrupted {
                page_id: DIRECTORY_PAGE_ID,
                context: "expected directory page",
            });
        }

        let data = page.as_slice();
        let count = u16::from_le_bytes([data[Self::OFFSET_COUNT], data[Self::OFFSET_COUNT + 1]])
            as usize;
        if count > Self::CAPACITY {
            return Err(Error::Corrupted {
                page_id: DIRECTORY_PAGE_ID,
                context: "directory entry count out of range",
            });
        }

        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let slot = &data[Self::OFFSET_ENTRIES + i * Self::ENTRY_SIZE..][..Self::ENTRY_SIZE];
            let len = (slot[0] as usize).min(MAX_FILE_NAME_LEN);
            let name = String::from_utf8_lossy(&slot[1..1 + len]).into_owned();
            let page_id = PageId::read_from(&slot[1 + MAX_FILE_NAME_LEN..]);
            entries.push((name, page_id));
        }

        Ok(Self { entries })
    }

    /// Encode the catalog onto a directory page.
    pub fn write_to(&self, page: &mut Page) {
        page.reset();
        page.set_header(&PageHeader::new(PageType::Directory));

        let data = page.as_mut_slice();
        data[Self::OFFSET_COUNT..Self::OFFSET_COUNT + 2]
            .copy_from_slice(&(self.entries.len() as u16).to_le_bytes());

        for (i, (name, page_id)) in self.entries.iter().enumerate() {
            let slot =
                &mut data[Self::OFFSET_ENTRIES + i * Self::ENTRY_SIZE..][..Self::ENTRY_SIZE];
            slot[0] = name.len() as u8;
            slot[1..1 + name.len()].copy_from_slice(name.as_bytes());
            page_id.write_to(&mut slot[1 + MAX_FILE_NAME_LEN..]);
        }
    }

    /// Look up the header page registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<PageId> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|&(_, page_id)| page_id)
    }

    /// Register `name` → `page_id`.
    ///
    /// # Errors
    /// - `Error::FileNameTooLong` if the name does not fit a slot
    /// - `Error::DuplicateFileEntry` if the name is already registered
    /// - `Error::DirectoryFull` if every slot is taken
    pub fn insert(&mut self, name: &str, page_id: PageId) -> Result<()> {
        if name.len() > MAX_FILE_NAME_LEN {
            return Err(Error::FileNameTooLong(name.to_string()));
        }
        if self.lookup(name).is_some() {
            return Err(Error::DuplicateFileEntry(name.to_string()));
        }
        if self.entries.len() >= Self::CAPACITY {
            return Err(Error::DirectoryFull);
        }
        self.entries.push((name.to_string(), page_id));
        Ok(())
    }

    /// Remove the entry registered under `name`.
    ///
    /// # Errors
    /// `Error::FileEntryNotFound` if no such entry exists.
    pub fn remove(&mut self, name: &str) -> Result<PageId> {
        let pos = self
            .entries
            .iter()
            .position(|(entry, _)| entry == name)
            .ok_or_else(|| Error::FileEntryNotFound(name.to_string()))?;
        Ok(self.entries.remove(pos).1)
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
