//! Leaf nodes: sorted (key, record id) entries plus the sibling chain.
//!
//! Each record is the encoded key followed by a 6-byte [`RecordId`]. The
//! sorted page's prev/next fields link all leaves into one chain in key
//! order.

use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::common::{PageId, RecordId};
use crate::index::btree::sorted_page::{partition_point, SortedPage, SLOT_SIZE};
use crate::index::btree::{Key, KeyType};
use crate::storage::page::{Page, PageType};

/// One entry of a leaf page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafEntry {
    pub key: Key,
    pub rid: RecordId,
}

impl LeafEntry {
    pub fn new(key: impl Into<Key>, rid: RecordId) -> Self {
        Self {
            key: key.into(),
            rid,
        }
    }
}

impl fmt::Display for LeafEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.key, self.rid)
    }
}

/// Bytes a leaf entry for `key` consumes, slot included.
pub fn leaf_entry_size(key: &Key) -> usize {
    key.encoded_len() + RecordId::SIZE + SLOT_SIZE
}

/// Leaf view over a page.
pub struct LeafPage<P> {
    inner: SortedPage<P>,
    key_type: KeyType,
}

impl<P: Deref<Target = Page>> LeafPage<P> {
    /// Wrap a page holding keys of `key_type`.
    pub fn new(page: P, key_type: KeyType) -> Self {
        Self {
            inner: SortedPage::new(page),
            key_type,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.slot_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn key_at(&self, i: usize) -> Key {
        let record = self.inner.record(i);
        Key::decode(self.key_type, &record[..record.len() - RecordId::SIZE])
    }

    pub fn rid_at(&self, i: usize) -> RecordId {
        let record = self.inner.record(i);
        RecordId::read_from(&record[record.len() - RecordId::SIZE..])
    }

    pub fn entry(&self, i: usize) -> LeafEntry {
        LeafEntry {
            key: self.key_at(i),
            rid: self.rid_at(i),
        }
    }

    pub fn entries(&self) -> Vec<LeafEntry> {
        (0..self.len()).map(|i| self.entry(i)).collect()
    }

    pub fn next_page(&self) -> PageId {
        self.inner.next_page()
    }

    pub fn prev_page(&self) -> PageId {
        self.inner.prev_page()
    }

    pub fn free_space(&self) -> usize {
        self.inner.free_space()
    }

    pub fn has_room_for(&self, key: &Key) -> bool {
        self.free_space() >= leaf_entry_size(key)
    }

    /// Position of the first entry with key >= `key`.
    pub fn lower_bound(&self, key: &Key) -> usize {
        partition_point(self.len(), |i| self.key_at(i) < *key)
    }

    /// Position of the first entry with key > `key`.
    pub fn upper_bound(&self, key: &Key) -> usize {
        partition_point(self.len(), |i| self.key_at(i) <= *key)
    }

    pub fn into_inner(self) -> P {
        self.inner.into_inner()
    }
}

impl<P: DerefMut<Target = Page>> LeafPage<P> {
    /// Format the page as an empty, unlinked leaf.
    pub fn init(&mut self) {
        self.inner.init(PageType::BTreeLeaf, self.key_type);
    }

    pub fn set_next_page(&mut self, page_id: PageId) {
        self.inner.set_next_page(page_id);
    }

    pub fn set_prev_page(&mut self, page_id: PageId) {
        self.inner.set_prev_page(page_id);
    }

    /// Insert after any entries with an equal key.
    ///
    /// Returns false, leaving the page untouched, if the entry does not fit.
    pub fn insert(&mut self, key: &Key, rid: RecordId) -> bool {
        let pos = self.upper_bound(key);
        self.insert_at(pos, key, rid)
    }

    /// Append an entry that sorts after everything already on the page.
    pub fn push(&mut self, entry: &LeafEntry) -> bool {
        let pos = self.len();
        self.insert_at(pos, &entry.key, entry.rid)
    }

    pub fn remove(&mut self, i: usize) {
        self.inner.delete_record(i);
    }

    fn insert_at(&mut self, pos: usize, key: &Key, rid: RecordId) -> bool {
        let key_len = key.encoded_len();
        match self.inner.insert_record(pos, key_len + RecordId::SIZE) {
            Some(buf) => {
                key.encode_into(buf);
                rid.write_to(&mut buf[key_len..]);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rid(n: u32) -> RecordId {
        RecordId::new(PageId::new(n), n as u16)
    }

    fn keys<P: Deref<Target = Page>>(leaf: &LeafPage<P>) -> Vec<Key> {
        (0..leaf.len()).map(|i| leaf.key_at(i)).collect()
    }

    #[test]
    fn test_init_unlinked() {
        let mut page = Page::new();
        let mut leaf = LeafPage::new(&mut page, KeyType::Integer);
        leaf.init();

        assert!(leaf.is_empty());
        assert_eq!(leaf.next_page(), PageId::INVALID);
        assert_eq!(leaf.prev_page(), PageId::INVALID);
        assert_eq!(page.page_type(), PageType::BTreeLeaf);
    }

    #[test]
    fn test_insert_sorted_with_duplicates_after() {
        let mut page = Page::new();
        let mut leaf = LeafPage::new(&mut page, KeyType::Integer);
        leaf.init();

        for (k, r) in [(5, 1), (1, 2), (5, 3), (3, 4), (5, 5)] {
            assert!(leaf.insert(&Key::Integer(k), rid(r)));
        }

        assert_eq!(keys(&leaf), [1, 3, 5, 5, 5].map(Key::Integer).to_vec());
        // equal keys keep insertion order
        assert_eq!(leaf.rid_at(2), rid(1));
        assert_eq!(leaf.rid_at(3), rid(3));
        assert_eq!(leaf.rid_at(4), rid(5));
    }

    #[test]
    fn test_bounds() {
        let mut page = Page::new();
        let mut leaf = LeafPage::new(&mut page, KeyType::Integer);
        leaf.init();
        for k in [10, 20, 20, 30] {
            leaf.insert(&Key::Integer(k), rid(k as u32));
        }

        assert_eq!(leaf.lower_bound(&Key::Integer(20)), 1);
        assert_eq!(leaf.upper_bound(&Key::Integer(20)), 3);
        assert_eq!(leaf.lower_bound(&Key::Integer(5)), 0);
        assert_eq!(leaf.lower_bound(&Key::Integer(35)), 4);
    }

    #[test]
    fn test_text_entries() {
        let mut page = Page::new();
        let mut leaf = LeafPage::new(&mut page, KeyType::Text);
        leaf.init();
        leaf.insert(&Key::from("pear"), rid(1));
        leaf.insert(&Key::from("apple"), rid(2));

        assert_eq!(leaf.entry(0), LeafEntry::new("apple", rid(2)));
        assert_eq!(leaf.entry(1), LeafEntry::new("pear", rid(1)));
        assert_eq!(leaf.entry(0).to_string(), "apple [2, 2]");
    }

    #[test]
    fn test_capacity_with_large_keys() {
        let mut page = Page::new();
        let mut leaf = LeafPage::new(&mut page, KeyType::Text);
        leaf.init();

        let mut n = 0;
        loop {
            let key = Key::Text(format!("{:0>1000}", n));
            if !leaf.has_room_for(&key) {
                assert!(!leaf.insert(&key, rid(n)));
                break;
            }
            assert!(leaf.insert(&key, rid(n)));
            n += 1;
        }
        assert_eq!(n, 4);
        assert_eq!(leaf.len(), 4);
    }

    #[test]
    fn test_remove_and_push() {
        let mut page = Page::new();
        let mut leaf = LeafPage::new(&mut page, KeyType::Integer);
        leaf.init();
        for k in 1..=4i64 {
            leaf.push(&LeafEntry::new(k, rid(k as u32)));
        }

        leaf.remove(0);
        leaf.remove(1);

        assert_eq!(keys(&leaf), vec![Key::Integer(2), Key::Integer(4)]);
        assert_eq!(leaf.rid_at(1), rid(4));
    }
}
