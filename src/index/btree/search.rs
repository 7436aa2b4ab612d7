//! Locating the start of a key run.

use crate::buffer::PageWriteGuard;
use crate::common::Result;
use crate::index::btree::btree_file::corrupted;
use crate::index::btree::{BTreeFile, IndexPage, Key, LeafPage};
use crate::storage::page::PageType;

impl<'a> BTreeFile<'a> {
    /// Find the leftmost entry with key `>= lo`, or the first entry of the
    /// tree if `lo` is `None`.
    ///
    /// Returns the pinned leaf holding it and its position, or `None` if no
    /// such entry exists. Index pages are descended through the child of
    /// the last separator strictly below `lo`, so a run of duplicates that
    /// spans several leaves is entered at its first leaf. Empty leaves left
    /// behind by deletes are skipped.
    pub fn find_run_start(
        &mut self,
        lo: Option<&Key>,
    ) -> Result<Option<(PageWriteGuard<'a>, usize)>> {
        if self.is_empty() {
            return Ok(None);
        }

        let key_type = self.key_type();
        let mut page_id = self.root_page_id();
        let mut guard = loop {
            let guard = self.bpm.fetch_page_write(page_id)?;
            self.visit(page_id);
            match guard.page_type() {
                PageType::BTreeIndex => {
                    page_id = IndexPage::new(&*guard, key_type).child_for_search(lo);
                }
                PageType::BTreeLeaf => break guard,
                _ => return Err(corrupted(page_id, "expected index or leaf page")),
            }
        };

        loop {
            let leaf = LeafPage::new(&*guard, key_type);
            let pos = lo.map_or(0, |key| leaf.lower_bound(key));
            if pos < leaf.len() {
                return Ok(Some((guard, pos)));
            }

            let next = leaf.next_page();
            if !next.is_valid() {
                return Ok(None);
            }
            drop(guard);
            guard = self.fetch_leaf(next)?;
        }
    }
}
