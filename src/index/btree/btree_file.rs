//! The B+Tree handle and its lifecycle.
//!
//! A [`BTreeFile`] is a named index inside a database file. Its header page
//! is registered in the file catalog under the index name; everything else
//! hangs off the root recorded there.
//!
//! Search, insert, delete and scan live in sibling modules as further
//! `impl BTreeFile` blocks.

use log::{debug, warn};

use crate::buffer::{BufferPoolManager, PageWriteGuard};
use crate::common::config::MAX_KEY_SIZE;
use crate::common::{Error, PageId, Result};
use crate::index::btree::header_page::{BTreeHeader, DeleteFashion};
use crate::index::btree::trace::{TraceEvent, Tracer};
use crate::index::btree::{IndexPage, Key, KeyType, LeafPage};
use crate::storage::page::PageType;

/// A handle to one B+Tree index.
///
/// The handle caches the header page in memory and writes it back whenever
/// the root changes. Every page it touches is pinned through a guard, so
/// no operation leaves a pin behind, whether it succeeds or fails.
///
/// # Example
/// ```ignore
/// let bpm = BufferPoolManager::new(64, DiskManager::create("idx.db")?);
/// let mut tree = BTreeFile::open_or_create(&bpm, "orders", KeyType::Integer, 8)?;
///
/// tree.insert(&Key::Integer(42), rid)?;
/// for entry in tree.scan(Some(&Key::Integer(40)), None)? {
///     println!("{}", entry?);
/// }
/// tree.close();
/// ```
pub struct BTreeFile<'a> {
    pub(super) bpm: &'a BufferPoolManager,
    pub(super) name: String,
    pub(super) header_page_id: PageId,
    pub(super) header: BTreeHeader,
    pub(super) tracer: Option<Box<dyn Tracer + 'a>>,
}

impl<'a> BTreeFile<'a> {
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Open the index registered as `name`, creating an empty one if the
    /// catalog has no such entry.
    ///
    /// `key_type` and `max_key_size` only matter when the index is created;
    /// an existing index keeps the values in its header.
    ///
    /// # Errors
    /// - `Error::InvalidKeySize` if a new index would get a maximum key
    ///   size too small for its key type (8 bytes for integers, 1 for
    ///   text) or above [`MAX_KEY_SIZE`]
    /// - `Error::Corrupted` if the registered header page is not valid
    /// - page store errors from allocation or the catalog
    pub fn open_or_create(
        bpm: &'a BufferPoolManager,
        name: &str,
        key_type: KeyType,
        max_key_size: usize,
    ) -> Result<Self> {
        if let Some(header_page_id) = bpm.get_file_entry(name) {
            return Self::load(bpm, name, header_page_id);
        }

        if max_key_size < key_type.min_key_size() || max_key_size > MAX_KEY_SIZE {
            return Err(Error::InvalidKeySize(max_key_size));
        }

        let header = BTreeHeader::new(key_type, max_key_size as u16);
        let header_page_id = {
            let mut guard = bpm.new_page()?;
            header.write_to(&mut guard);
            guard.page_id()
        };

        if let Err(e) = bpm.add_file_entry(name, header_page_id) {
            if let Err(free_err) = bpm.free_page(header_page_id) {
                warn!(
                    "could not free header {} of unregistered index '{}': {}",
                    header_page_id, name, free_err
                );
            }
            return Err(e);
        }

        debug!(
            "created index '{}' ({:?} keys, max {} bytes) at {}",
            name, key_type, max_key_size, header_page_id
        );
        Ok(Self::from_parts(bpm, name, header_page_id, header))
    }

    /// Open an existing index.
    ///
    /// # Errors
    /// `Error::FileEntryNotFound` if no index is registered as `name`.
    pub fn open(bpm: &'a BufferPoolManager, name: &str) -> Result<Self> {
        let header_page_id = bpm
            .get_file_entry(name)
            .ok_or_else(|| Error::FileEntryNotFound(name.to_string()))?;
        Self::load(bpm, name, header_page_id)
    }

    /// Attach a tracer that sees this handle's page visits and dumps.
    pub fn with_tracer(mut self, tracer: impl Tracer + 'a) -> Self {
        self.tracer = Some(Box::new(tracer));
        self
    }

    /// Release the handle. The index stays registered and intact.
    pub fn close(self) {
        debug!("closed index '{}'", self.name);
    }

    /// Free every page of the index and unregister it.
    ///
    /// Children are freed before the index page that points to them, then
    /// the header page goes and finally the catalog entry.
    pub fn destroy(self) -> Result<()> {
        if self.header.root.is_valid() {
            self.free_subtree(self.header.root)?;
        }
        self.bpm.free_page(self.header_page_id)?;
        self.bpm.delete_file_entry(&self.name)?;

        debug!("destroyed index '{}'", self.name);
        Ok(())
    }

    /// Point the header at a new root page.
    pub fn update_header(&mut self, new_root: PageId) -> Result<()> {
        let mut header = self.header;
        header.root = new_root;

        let mut guard = self.bpm.fetch_page_write(self.header_page_id)?;
        header.write_to(&mut guard);
        self.header = header;

        debug!("index '{}' root is now {}", self.name, new_root);
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header_page_id(&self) -> PageId {
        self.header_page_id
    }

    pub fn root_page_id(&self) -> PageId {
        self.header.root
    }

    pub fn key_type(&self) -> KeyType {
        self.header.key_type
    }

    pub fn max_key_size(&self) -> usize {
        self.header.max_key_size as usize
    }

    pub fn delete_fashion(&self) -> DeleteFashion {
        self.header.delete_fashion
    }

    pub fn is_empty(&self) -> bool {
        !self.header.root.is_valid()
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Send the children of `page_id` to the tracer.
    ///
    /// Index pages report their child pointers, leaves their entries.
    /// Without a tracer this still checks that the page is a tree node.
    pub fn trace_children(&mut self, page_id: PageId) -> Result<()> {
        let key_type = self.header.key_type;
        let event = {
            let guard = self.bpm.fetch_page_read(page_id)?;
            match guard.page_type() {
                PageType::BTreeIndex => {
                    let index = IndexPage::new(&*guard, key_type);
                    TraceEvent::IndexChildren {
                        page_id,
                        leftmost: index.leftmost(),
                        children: (0..index.len()).map(|i| index.child_at(i)).collect(),
                    }
                }
                PageType::BTreeLeaf => TraceEvent::LeafChildren {
                    page_id,
                    entries: LeafPage::new(&*guard, key_type).entries(),
                },
                _ => return Err(corrupted(page_id, "expected index or leaf page")),
            }
        };

        self.emit(&event);
        Ok(())
    }

    /// Page ids of all leaves, walking the sibling chain from the leftmost.
    pub fn leaf_page_ids(&self) -> Result<Vec<PageId>> {
        let mut leaves = Vec::new();
        if self.is_empty() {
            return Ok(leaves);
        }

        let key_type = self.header.key_type;
        let mut page_id = self.header.root;
        loop {
            let guard = self.bpm.fetch_page_read(page_id)?;
            match guard.page_type() {
                PageType::BTreeIndex => page_id = IndexPage::new(&*guard, key_type).leftmost(),
                PageType::BTreeLeaf => break,
                _ => return Err(corrupted(page_id, "expected index or leaf page")),
            }
        }

        while page_id.is_valid() {
            let guard = self.fetch_leaf(page_id)?;
            leaves.push(page_id);
            page_id = LeafPage::new(&*guard, key_type).next_page();
        }
        Ok(leaves)
    }

    // ========================================================================
    // Internal
    // ========================================================================

    fn load(bpm: &'a BufferPoolManager, name: &str, header_page_id: PageId) -> Result<Self> {
        let header = {
            let guard = bpm.fetch_page_read(header_page_id)?;
            BTreeHeader::read_from(&guard, header_page_id)?
        };

        debug!("opened index '{}' at {}, root {}", name, header_page_id, header.root);
        Ok(Self::from_parts(bpm, name, header_page_id, header))
    }

    fn from_parts(
        bpm: &'a BufferPoolManager,
        name: &str,
        header_page_id: PageId,
        header: BTreeHeader,
    ) -> Self {
        Self {
            bpm,
            name: name.to_string(),
            header_page_id,
            header,
            tracer: None,
        }
    }

    fn free_subtree(&self, page_id: PageId) -> Result<()> {
        let children = {
            let guard = self.bpm.fetch_page_read(page_id)?;
            match guard.page_type() {
                PageType::BTreeIndex => IndexPage::new(&*guard, self.header.key_type).children(),
                PageType::BTreeLeaf => Vec::new(),
                _ => return Err(corrupted(page_id, "expected index or leaf page")),
            }
        };

        for child in children {
            self.free_subtree(child)?;
        }
        self.bpm.free_page(page_id)
    }

    /// Reject keys the header does not allow.
    pub(super) fn check_key(&self, key: &Key) -> Result<()> {
        let size = key.encoded_len();
        let max = self.max_key_size();
        if size > max {
            return Err(Error::KeyTooLong { size, max });
        }
        self.check_key_type(key)
    }

    pub(super) fn check_key_type(&self, key: &Key) -> Result<()> {
        if key.key_type() != self.header.key_type {
            return Err(Error::KeyTypeMismatch {
                expected: self.header.key_type,
                found: key.key_type(),
            });
        }
        Ok(())
    }

    /// Pin `page_id` for writing and check that it is a leaf.
    pub(super) fn fetch_leaf(&self, page_id: PageId) -> Result<PageWriteGuard<'a>> {
        let guard = self.bpm.fetch_page_write(page_id)?;
        if guard.page_type() != PageType::BTreeLeaf {
            return Err(corrupted(page_id, "expected leaf page"));
        }
        Ok(guard)
    }

    pub(super) fn visit(&mut self, page_id: PageId) {
        self.emit(&TraceEvent::Visit(page_id));
    }

    fn emit(&mut self, event: &TraceEvent) {
        if let Some(tracer) = self.tracer.as_deref_mut() {
            tracer.record(event);
        }
    }
}

pub(super) fn corrupted(page_id: PageId, context: &'static str) -> Error {
    Error::Corrupted {
        page_id: page_id.0,
        context,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::RecordId;
    use crate::index::btree::LeafEntry;
    use crate::storage::DiskManager;
    use tempfile::tempdir;

    fn create_test_bpm(pool_size: usize) -> (BufferPoolManager, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let dm = DiskManager::create(&path).unwrap();
        (BufferPoolManager::new(pool_size, dm), dir)
    }

    fn rid(n: u32) -> RecordId {
        RecordId::new(PageId::new(n), 0)
    }

    #[test]
    fn test_create_registers_empty_index() {
        let (bpm, _dir) = create_test_bpm(8);

        let tree = BTreeFile::open_or_create(&bpm, "idx", KeyType::Integer, 8).unwrap();

        assert!(tree.is_empty());
        assert_eq!(tree.root_page_id(), PageId::INVALID);
        assert_eq!(tree.key_type(), KeyType::Integer);
        assert_eq!(tree.max_key_size(), 8);
        assert_eq!(tree.delete_fashion(), DeleteFashion::Naive);
        assert_eq!(tree.name(), "idx");
        assert_eq!(bpm.get_file_entry("idx"), Some(tree.header_page_id()));
        assert_eq!(bpm.pinned_frame_count(), 0);
    }

    #[test]
    fn test_reopen_keeps_header() {
        let (bpm, _dir) = create_test_bpm(8);
        let header_page_id = {
            let tree = BTreeFile::open_or_create(&bpm, "idx", KeyType::Text, 32).unwrap();
            let id = tree.header_page_id();
            tree.close();
            id
        };

        // Arguments are ignored for an existing index
        let tree = BTreeFile::open_or_create(&bpm, "idx", KeyType::Integer, 8).unwrap();
        assert_eq!(tree.header_page_id(), header_page_id);
        assert_eq!(tree.key_type(), KeyType::Text);
        assert_eq!(tree.max_key_size(), 32);

        let tree = BTreeFile::open(&bpm, "idx").unwrap();
        assert_eq!(tree.header_page_id(), header_page_id);
    }

    #[test]
    fn test_open_missing_index() {
        let (bpm, _dir) = create_test_bpm(8);

        assert!(matches!(
            BTreeFile::open(&bpm, "nope"),
            Err(Error::FileEntryNotFound(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_invalid_max_key_size() {
        let (bpm, _dir) = create_test_bpm(8);

        assert!(matches!(
            BTreeFile::open_or_create(&bpm, "a", KeyType::Integer, 0),
            Err(Error::InvalidKeySize(0))
        ));
        assert!(matches!(
            BTreeFile::open_or_create(&bpm, "b", KeyType::Text, MAX_KEY_SIZE + 1),
            Err(Error::InvalidKeySize(_))
        ));
        assert!(matches!(
            BTreeFile::open_or_create(&bpm, "c", KeyType::Integer, 7),
            Err(Error::InvalidKeySize(7))
        ));
        assert!(matches!(
            BTreeFile::open_or_create(&bpm, "d", KeyType::Text, 0),
            Err(Error::InvalidKeySize(0))
        ));
        assert_eq!(bpm.stats().snapshot().pages_allocated, 0);

        // Smallest valid sizes still work
        let mut ints = BTreeFile::open_or_create(&bpm, "e", KeyType::Integer, 8).unwrap();
        ints.insert(&Key::Integer(1), RecordId::new(PageId::new(1), 0)).unwrap();
        let mut text = BTreeFile::open_or_create(&bpm, "f", KeyType::Text, 1).unwrap();
        text.insert(&Key::from("x"), RecordId::new(PageId::new(1), 0)).unwrap();
    }

    #[test]
    fn test_failed_registration_frees_header() {
        let (bpm, _dir) = create_test_bpm(8);
        let long_name = "n".repeat(100);

        let result = BTreeFile::open_or_create(&bpm, &long_name, KeyType::Integer, 8);

        assert!(matches!(result, Err(Error::FileNameTooLong(_))));
        assert_eq!(bpm.stats().snapshot().live_pages(), 0);
    }

    #[test]
    fn test_open_rejects_non_header_page() {
        let (bpm, _dir) = create_test_bpm(8);
        let pid = {
            let mut guard = bpm.new_page().unwrap();
            guard.set_page_type(PageType::BTreeLeaf);
            guard.page_id()
        };
        bpm.add_file_entry("bogus", pid).unwrap();

        assert!(matches!(
            BTreeFile::open(&bpm, "bogus"),
            Err(Error::Corrupted { .. })
        ));
    }

    #[test]
    fn test_update_header_persists_root() {
        let (bpm, _dir) = create_test_bpm(8);
        let mut tree = BTreeFile::open_or_create(&bpm, "idx", KeyType::Integer, 8).unwrap();

        tree.update_header(PageId::new(42)).unwrap();
        assert_eq!(tree.root_page_id(), PageId::new(42));

        let guard = bpm.fetch_page_read(tree.header_page_id()).unwrap();
        let header = BTreeHeader::read_from(&guard, tree.header_page_id()).unwrap();
        assert_eq!(header.root, PageId::new(42));
    }

    #[test]
    fn test_check_key() {
        let (bpm, _dir) = create_test_bpm(8);
        let tree = BTreeFile::open_or_create(&bpm, "idx", KeyType::Text, 4).unwrap();

        assert!(tree.check_key(&Key::from("abcd")).is_ok());
        assert!(matches!(
            tree.check_key(&Key::from("abcde")),
            Err(Error::KeyTooLong { size: 5, max: 4 })
        ));
        assert!(matches!(
            tree.check_key(&Key::Integer(1)),
            Err(Error::KeyTooLong { size: 8, max: 4 })
        ));

        let tree = BTreeFile::open_or_create(&bpm, "ints", KeyType::Integer, 8).unwrap();
        assert!(matches!(
            tree.check_key(&Key::from("a")),
            Err(Error::KeyTypeMismatch {
                expected: KeyType::Integer,
                found: KeyType::Text
            })
        ));
    }

    #[test]
    fn test_destroy_empty_index() {
        let (bpm, _dir) = create_test_bpm(8);
        let tree = BTreeFile::open_or_create(&bpm, "idx", KeyType::Integer, 8).unwrap();

        tree.destroy().unwrap();

        assert_eq!(bpm.get_file_entry("idx"), None);
        assert_eq!(bpm.stats().snapshot().live_pages(), 0);
    }

    #[test]
    fn test_trace_children_of_leaf() {
        let (bpm, _dir) = create_test_bpm(8);
        let mut events: Vec<TraceEvent> = Vec::new();
        let root = {
            let mut tree = BTreeFile::open_or_create(&bpm, "idx", KeyType::Integer, 8)
                .unwrap()
                .with_tracer(&mut events);
            tree.insert(&Key::Integer(7), rid(1)).unwrap();
            let root = tree.root_page_id();
            tree.trace_children(root).unwrap();
            root
        };

        // The first insert creates the root leaf without descending
        assert_eq!(
            events,
            vec![TraceEvent::LeafChildren {
                page_id: root,
                entries: vec![LeafEntry::new(7i64, rid(1))],
            }]
        );
    }

    #[test]
    fn test_trace_children_rejects_header_page() {
        let (bpm, _dir) = create_test_bpm(8);
        let mut tree = BTreeFile::open_or_create(&bpm, "idx", KeyType::Integer, 8).unwrap();
        let header_page_id = tree.header_page_id();

        assert!(matches!(
            tree.trace_children(header_page_id),
            Err(Error::Corrupted { .. })
        ));
    }
}
