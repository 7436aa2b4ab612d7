//! Range scans over the leaf chain.

use log::trace;

use crate::buffer::PageWriteGuard;
use crate::common::{Error, Result};
use crate::index::btree::{BTreeFile, Key, KeyType, LeafEntry, LeafPage};

impl<'a> BTreeFile<'a> {
    /// Open a cursor over entries with `lo <= key <= hi`.
    ///
    /// A missing bound leaves that end open, so `scan(None, None)` visits
    /// the whole index and `scan(Some(k), Some(k))` every duplicate of `k`.
    /// The cursor borrows the tree mutably: no inserts or deletes can
    /// happen while it is open, except through
    /// [`BTreeScan::delete_current`].
    ///
    /// # Errors
    /// - `Error::KeyTypeMismatch` if a bound has the wrong key type
    /// - page store errors from locating the first entry
    pub fn scan(&mut self, lo: Option<&Key>, hi: Option<&Key>) -> Result<BTreeScan<'_, 'a>> {
        for bound in lo.iter().chain(hi.iter()) {
            self.check_key_type(bound)?;
        }

        let (leaf, pos) = match self.find_run_start(lo)? {
            Some((guard, pos)) => (Some(guard), pos),
            None => (None, 0),
        };

        Ok(BTreeScan {
            key_type: self.key_type(),
            tree: self,
            leaf,
            pos,
            current: None,
            hi: hi.cloned(),
        })
    }
}

/// A cursor over a key range of a [`BTreeFile`].
///
/// The cursor pins the leaf it is positioned on and moves the pin along
/// the sibling chain as it advances. The pin is released once the range is
/// exhausted, or when the cursor is closed or dropped.
pub struct BTreeScan<'t, 'a> {
    tree: &'t mut BTreeFile<'a>,
    key_type: KeyType,
    /// Pinned leaf; `None` once the scan has ended.
    leaf: Option<PageWriteGuard<'a>>,
    /// Position of the next entry to return on `leaf`.
    pos: usize,
    /// Position of the entry last returned, while it can still be deleted.
    current: Option<usize>,
    hi: Option<Key>,
}

impl BTreeScan<'_, '_> {
    /// Remove the entry most recently returned by `next()`.
    ///
    /// The following `next()` returns the entry that came after it.
    ///
    /// # Errors
    /// `Error::NoCurrentEntry` before the first `next()`, after the scan
    /// ended, or when the current entry was already deleted.
    pub fn delete_current(&mut self) -> Result<()> {
        let cur = self.current.take().ok_or(Error::NoCurrentEntry)?;
        let guard = self.leaf.as_mut().ok_or(Error::NoCurrentEntry)?;

        LeafPage::new(&mut **guard, self.key_type).remove(cur);
        self.pos = cur;

        trace!("scan deleted slot {} on {}", cur, guard.page_id());
        Ok(())
    }

    /// Maximum key size of the index being scanned.
    pub fn key_size(&self) -> usize {
        self.tree.max_key_size()
    }

    /// End the scan and release its pin.
    pub fn close(self) {}

    fn finish(&mut self) {
        self.leaf = None;
        self.current = None;
    }
}

impl Iterator for BTreeScan<'_, '_> {
    type Item = Result<LeafEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.current = None;

        loop {
            let guard = self.leaf.as_ref()?;
            let leaf = LeafPage::new(&**guard, self.key_type);

            if self.pos < leaf.len() {
                let entry = leaf.entry(self.pos);
                if self.hi.as_ref().is_some_and(|hi| entry.key > *hi) {
                    self.finish();
                    return None;
                }

                self.current = Some(self.pos);
                self.pos += 1;
                return Some(Ok(entry));
            }

            let next = leaf.next_page();
            self.finish();
            if !next.is_valid() {
                return None;
            }

            match self.tree.fetch_leaf(next) {
                Ok(guard) => {
                    self.leaf = Some(guard);
                    self.pos = 0;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
