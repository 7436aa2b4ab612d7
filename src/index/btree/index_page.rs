//! Index (interior) nodes.
//!
//! An index page holds a leftmost child pointer, kept in the sorted page's
//! prev field, plus sorted (separator, child) entries. Keys under the child
//! of separator `s_i` are `>= s_i` and `< s_{i+1}`; keys under the leftmost
//! child are `< s_1`.

use std::ops::{Deref, DerefMut};

use crate::common::PageId;
use crate::index::btree::sorted_page::{partition_point, SortedPage, SLOT_SIZE};
use crate::index::btree::{Key, KeyType};
use crate::storage::page::{Page, PageType};

/// A separator and the child holding keys from it upward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub key: Key,
    pub child: PageId,
}

/// Bytes an index entry for `key` consumes, slot included.
pub fn index_entry_size(key: &Key) -> usize {
    key.encoded_len() + PageId::SIZE + SLOT_SIZE
}

/// Index view over a page.
pub struct IndexPage<P> {
    inner: SortedPage<P>,
    key_type: KeyType,
}

impl<P: Deref<Target = Page>> IndexPage<P> {
    pub fn new(page: P, key_type: KeyType) -> Self {
        Self {
            inner: SortedPage::new(page),
            key_type,
        }
    }

    /// Number of separator entries (the leftmost child is not counted).
    pub fn len(&self) -> usize {
        self.inner.slot_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn leftmost(&self) -> PageId {
        self.inner.prev_page()
    }

    pub fn key_at(&self, i: usize) -> Key {
        let record = self.inner.record(i);
        Key::decode(self.key_type, &record[..record.len() - PageId::SIZE])
    }

    pub fn child_at(&self, i: usize) -> PageId {
        let record = self.inner.record(i);
        PageId::read_from(&record[record.len() - PageId::SIZE..])
    }

    pub fn entry(&self, i: usize) -> IndexEntry {
        IndexEntry {
            key: self.key_at(i),
            child: self.child_at(i),
        }
    }

    pub fn entries(&self) -> Vec<IndexEntry> {
        (0..self.len()).map(|i| self.entry(i)).collect()
    }

    /// Every child pointer, leftmost first.
    pub fn children(&self) -> Vec<PageId> {
        std::iter::once(self.leftmost())
            .chain((0..self.len()).map(|i| self.child_at(i)))
            .collect()
    }

    pub fn free_space(&self) -> usize {
        self.inner.free_space()
    }

    pub fn has_room_for(&self, key: &Key) -> bool {
        self.free_space() >= index_entry_size(key)
    }

    /// Child to descend into when inserting `key`: the child of the last
    /// separator `<= key`, so equal keys go right.
    pub fn child_for_insert(&self, key: &Key) -> PageId {
        let pos = partition_point(self.len(), |i| self.key_at(i) <= *key);
        self.child_before(pos)
    }

    /// Child to descend into when looking for the leftmost entry `>= key`:
    /// the child of the last separator `< key`, so equal keys go left.
    ///
    /// Without a key this is the leftmost child.
    pub fn child_for_search(&self, key: Option<&Key>) -> PageId {
        match key {
            Some(key) => {
                let pos = partition_point(self.len(), |i| self.key_at(i) < *key);
                self.child_before(pos)
            }
            None => self.leftmost(),
        }
    }

    fn child_before(&self, pos: usize) -> PageId {
        if pos == 0 {
            self.leftmost()
        } else {
            self.child_at(pos - 1)
        }
    }
}

impl<P: DerefMut<Target = Page>> IndexPage<P> {
    /// Format the page as an index node with no separators.
    pub fn init(&mut self, leftmost: PageId) {
        self.inner.init(PageType::BTreeIndex, self.key_type);
        self.set_leftmost(leftmost);
    }

    pub fn set_leftmost(&mut self, page_id: PageId) {
        self.inner.set_prev_page(page_id);
    }

    /// Insert a separator after any equal separators.
    ///
    /// Returns false, leaving the page untouched, if the entry does not fit.
    pub fn insert(&mut self, entry: &IndexEntry) -> bool {
        let pos = partition_point(self.len(), |i| self.key_at(i) <= entry.key);
        let key_len = entry.key.encoded_len();
        match self.inner.insert_record(pos, key_len + PageId::SIZE) {
            Some(buf) => {
                entry.key.encode_into(buf);
                entry.child.write_to(&mut buf[key_len..]);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, i: usize) {
        self.inner.delete_record(i);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: i64, child: u32) -> IndexEntry {
        IndexEntry {
            key: Key::Integer(key),
            child: PageId::new(child),
        }
    }

    fn sample(page: &mut Page) -> IndexPage<&mut Page> {
        let mut index = IndexPage::new(page, KeyType::Integer);
        index.init(PageId::new(1));
        assert!(index.insert(&entry(30, 4)));
        assert!(index.insert(&entry(10, 2)));
        assert!(index.insert(&entry(20, 3)));
        index
    }

    #[test]
    fn test_entries_sorted_and_children() {
        let mut page = Page::new();
        let index = sample(&mut page);

        assert_eq!(index.len(), 3);
        assert_eq!(index.entries(), vec![entry(10, 2), entry(20, 3), entry(30, 4)]);
        assert_eq!(
            index.children(),
            [1, 2, 3, 4].map(PageId::new).to_vec()
        );
    }

    #[test]
    fn test_insert_descent_goes_right_on_ties() {
        let mut page = Page::new();
        let index = sample(&mut page);

        assert_eq!(index.child_for_insert(&Key::Integer(5)), PageId::new(1));
        assert_eq!(index.child_for_insert(&Key::Integer(10)), PageId::new(2));
        assert_eq!(index.child_for_insert(&Key::Integer(25)), PageId::new(3));
        assert_eq!(index.child_for_insert(&Key::Integer(30)), PageId::new(4));
        assert_eq!(index.child_for_insert(&Key::Integer(99)), PageId::new(4));
    }

    #[test]
    fn test_search_descent_goes_left_on_ties() {
        let mut page = Page::new();
        let index = sample(&mut page);

        assert_eq!(index.child_for_search(None), PageId::new(1));
        assert_eq!(index.child_for_search(Some(&Key::Integer(10))), PageId::new(1));
        assert_eq!(index.child_for_search(Some(&Key::Integer(11))), PageId::new(2));
        assert_eq!(index.child_for_search(Some(&Key::Integer(30))), PageId::new(3));
        assert_eq!(index.child_for_search(Some(&Key::Integer(31))), PageId::new(4));
    }

    #[test]
    fn test_remove_and_leftmost() {
        let mut page = Page::new();
        let mut index = sample(&mut page);

        let first = index.entry(0);
        index.remove(0);
        index.set_leftmost(first.child);

        assert_eq!(index.leftmost(), PageId::new(2));
        assert_eq!(index.entries(), vec![entry(20, 3), entry(30, 4)]);
        assert_eq!(page.page_type(), PageType::BTreeIndex);
    }
}
