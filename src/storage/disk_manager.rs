//! Disk Manager - low-level file I/O for database pages.
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Reading and writing pages (with CRC32 checksums)
//! - Allocating and freeing pages
//! - Persisting the file catalog in page 0

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::{debug, trace};

use crate::common::config::{DIRECTORY_PAGE_ID, PAGE_SIZE};
use crate::common::{Error, PageId, Result};
use crate::storage::catalog::Catalog;
use crate::storage::page::{Page, PageHeader, PageType};

/// Manages disk I/O for a single database file.
///
/// # File Layout
/// ```text
/// ┌───────────┬─────────┬─────────┬─────────┬─────────┐
/// │  Page 0   │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (catalog) │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └───────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// Page N is located at file offset `N × PAGE_SIZE`. Page 0 always holds
/// the [`Catalog`]. Freed pages are tagged [`PageType::Free`] and reused by
/// later allocations before the file is extended.
///
/// # Thread Safety
/// `DiskManager` is **single-threaded**. The `BufferPoolManager` is responsible
/// for serializing access to the disk manager.
pub struct DiskManager {
    file: File,
    /// Number of pages in the file, including the catalog page.
    page_count: u32,
    /// Freed pages available for reuse (LIFO).
    free_list: Vec<PageId>,
    /// In-memory copy of page 0.
    catalog: Catalog,
}

impl DiskManager {
    /// Create a new database file with an empty catalog.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        let mut dm = Self {
            file,
            page_count: 1,
            free_list: Vec::new(),
            catalog: Catalog::new(),
        };
        dm.write_catalog()?;

        debug!("created database file with empty catalog");
        Ok(dm)
    }

    /// Open an existing database file.
    ///
    /// Reloads the catalog and rebuilds the free list by scanning page tags.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist, cannot be opened, or its
    /// catalog page is damaged.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let file_size = file.metadata()?.len();
        let page_count = (file_size / PAGE_SIZE as u64) as u32;
        if page_count == 0 {
            return Err(Error::PageNotFound(DIRECTORY_PAGE_ID));
        }

        let mut dm = Self {
            file,
            page_count,
            free_list: Vec::new(),
            catalog: Catalog::new(),
        };

        let directory = dm.read_page(PageId::new(DIRECTORY_PAGE_ID))?;
        dm.catalog = Catalog::from_page(&directory)?;

        for pid in 1..page_count {
            let page = dm.read_page(PageId::new(pid))?;
            if page.page_type() == PageType::Free {
                dm.free_list.push(PageId::new(pid));
            }
        }

        debug!(
            "opened database file: {} pages, {} free, {} catalog entries",
            dm.page_count,
            dm.free_list.len(),
            dm.catalog.len()
        );
        Ok(dm)
    }

    /// Open an existing database file, or create if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Read a page from disk.
    ///
    /// # Errors
    /// - `Error::PageNotFound` if the page doesn't exist
    /// - `Error::ChecksumMismatch` if an initialized page fails verification
    pub fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        self.file.seek(SeekFrom::Start(Self::offset(page_id)))?;

        let mut page = Page::new();
        self.file.read_exact(page.as_mut_slice())?;

        // Never-written pages are all zeros and carry no checksum.
        if page.page_type() != PageType::Invalid && !page.verify_checksum() {
            return Err(Error::ChecksumMismatch(page_id.0));
        }

        Ok(page)
    }

    /// Write a page to disk, stamping its checksum.
    ///
    /// The page must have been previously allocated with `allocate_page()`.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page hasn't been allocated.
    pub fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        let mut buf = [0u8; PAGE_SIZE];
        buf.copy_from_slice(page.as_slice());
        let checksum = PageHeader::compute_checksum(&buf);
        buf[PageHeader::OFFSET_CHECKSUM..PageHeader::OFFSET_CHECKSUM + 4]
            .copy_from_slice(&checksum.to_le_bytes());

        self.file.seek(SeekFrom::Start(Self::offset(page_id)))?;
        self.file.write_all(&buf)?;
        self.file.sync_all()?;

        trace!("wrote {}", page_id);
        Ok(())
    }

    /// Allocate a page, reusing a freed one if available.
    ///
    /// A fresh page extends the file with zeros.
    pub fn allocate_page(&mut self) -> Result<PageId> {
        if let Some(page_id) = self.free_list.pop() {
            trace!("reusing freed {}", page_id);
            return Ok(page_id);
        }

        let page_id = PageId::new(self.page_count);

        self.file.seek(SeekFrom::Start(Self::offset(page_id)))?;
        self.file.write_all(&[0u8; PAGE_SIZE])?;
        self.file.sync_all()?;

        self.page_count += 1;
        trace!("extended file with {}", page_id);
        Ok(page_id)
    }

    /// Return a page to the free list.
    ///
    /// # Errors
    /// - `Error::InvalidPageId` for the catalog page or the sentinel
    /// - `Error::PageNotFound` if the page was never allocated
    pub fn deallocate_page(&mut self, page_id: PageId) -> Result<()> {
        if !page_id.is_valid() || page_id.0 == DIRECTORY_PAGE_ID {
            return Err(Error::InvalidPageId(page_id.0));
        }
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        let mut page = Page::new();
        page.set_header(&PageHeader::new(PageType::Free));
        self.write_page(page_id, &page)?;

        self.free_list.push(page_id);
        trace!("freed {}", page_id);
        Ok(())
    }

    // ========================================================================
    // File catalog
    // ========================================================================

    /// Look up the header page registered under `name`.
    pub fn get_file_entry(&self, name: &str) -> Option<PageId> {
        self.catalog.lookup(name)
    }

    /// Register `name` → `page_id` and persist the catalog.
    pub fn add_file_entry(&mut self, name: &str, page_id: PageId) -> Result<()> {
        self.catalog.insert(name, page_id)?;
        self.write_catalog()
    }

    /// Remove the entry registered under `name` and persist the catalog.
    pub fn delete_file_entry(&mut self, name: &str) -> Result<()> {
        self.catalog.remove(name)?;
        self.write_catalog()
    }

    // ========================================================================
    // Info
    // ========================================================================

    /// Get the number of pages in the database, including page 0.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Number of pages waiting on the free list.
    #[inline]
    pub fn free_page_count(&self) -> usize {
        self.free_list.len()
    }

    /// Get the total size of the database file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.page_count as u64) * (PAGE_SIZE as u64)
    }

    fn write_catalog(&mut self) -> Result<()> {
        let mut page = Page::new();
        self.catalog.write_to(&mut page);
        self.write_page(PageId::new(DIRECTORY_PAGE_ID), &page)
    }

    #[inline]
    fn offset(page_id: PageId) -> u64 {
        (page_id.0 as u64) * (PAGE_SIZE as u64)
    }
}
