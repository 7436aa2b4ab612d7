//! Insertion with node splits.
//!
//! Insertion descends recursively to the leaf that owns the key. A full
//! leaf splits and copies its new sibling's first key up; a full index page
//! splits and pushes its middle separator up. A split that reaches the root
//! grows the tree by one level.

use log::debug;

use crate::buffer::PageWriteGuard;
use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, RecordId, Result};
use crate::index::btree::btree_file::corrupted;
use crate::index::btree::index_page::index_entry_size;
use crate::index::btree::leaf_page::leaf_entry_size;
use crate::index::btree::sorted_page::SORTED_PAGE_PREFIX;
use crate::index::btree::{BTreeFile, IndexEntry, IndexPage, Key, LeafEntry, LeafPage};
use crate::storage::page::PageType;

/// What a recursive insert hands back to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InsertOutcome {
    /// The entry fit without splitting.
    NoSplit,
    /// The child split: the parent must add a separator for `page_id`.
    Promoted { key: Key, page_id: PageId },
}

fn overflow(page_id: PageId) -> Error {
    corrupted(page_id, "page overflow during insert")
}

impl<'a> BTreeFile<'a> {
    /// Insert a (key, record id) pair.
    ///
    /// Duplicate keys are allowed; a new entry lands after existing entries
    /// with the same key on its leaf.
    ///
    /// # Errors
    /// - `Error::KeyTooLong` if the encoded key exceeds the maximum key size
    /// - `Error::KeyTypeMismatch` if the key's type differs from the index's
    /// - page store errors, which may leave a split half done
    pub fn insert(&mut self, key: &Key, rid: RecordId) -> Result<()> {
        self.check_key(key)?;
        let key_type = self.key_type();
        let root = self.root_page_id();

        if !root.is_valid() {
            let mut guard = self.bpm.new_page()?;
            let page_id = guard.page_id();
            let mut leaf = LeafPage::new(&mut *guard, key_type);
            leaf.init();
            if !leaf.insert(key, rid) {
                return Err(overflow(page_id));
            }
            drop(guard);
            return self.update_header(page_id);
        }

        if let InsertOutcome::Promoted {
            key: separator,
            page_id: right,
        } = self.insert_into(root, key, rid)?
        {
            let mut guard = self.bpm.new_page()?;
            let new_root = guard.page_id();
            let mut index = IndexPage::new(&mut *guard, key_type);
            index.init(root);
            if !index.insert(&IndexEntry {
                key: separator,
                child: right,
            }) {
                return Err(overflow(new_root));
            }
            drop(guard);

            debug!("root {} split, new root {}", root, new_root);
            self.update_header(new_root)?;
        }
        Ok(())
    }

    /// Insert below `page_id`, reporting whether that page split.
    pub(crate) fn insert_into(
        &mut self,
        page_id: PageId,
        key: &Key,
        rid: RecordId,
    ) -> Result<InsertOutcome> {
        let key_type = self.key_type();
        let mut guard = self.bpm.fetch_page_write(page_id)?;
        self.visit(page_id);

        match guard.page_type() {
            PageType::BTreeIndex => {
                let child = IndexPage::new(&*guard, key_type).child_for_insert(key);
                drop(guard);

                match self.insert_into(child, key, rid)? {
                    InsertOutcome::NoSplit => Ok(InsertOutcome::NoSplit),
                    InsertOutcome::Promoted {
                        key: separator,
                        page_id: new_child,
                    } => {
                        let guard = self.bpm.fetch_page_write(page_id)?;
                        self.insert_separator(
                            guard,
                            IndexEntry {
                                key: separator,
                                child: new_child,
                            },
                        )
                    }
                }
            }
            PageType::BTreeLeaf => {
                if LeafPage::new(&*guard, key_type).has_room_for(key) {
                    if !LeafPage::new(&mut *guard, key_type).insert(key, rid) {
                        return Err(overflow(page_id));
                    }
                    return Ok(InsertOutcome::NoSplit);
                }
                self.split_leaf(guard, key, rid)
            }
            _ => Err(corrupted(page_id, "expected index or leaf page")),
        }
    }

    fn insert_separator(
        &mut self,
        mut guard: PageWriteGuard<'a>,
        entry: IndexEntry,
    ) -> Result<InsertOutcome> {
        let key_type = self.key_type();
        if IndexPage::new(&*guard, key_type).has_room_for(&entry.key) {
            if !IndexPage::new(&mut *guard, key_type).insert(&entry) {
                return Err(overflow(guard.page_id()));
            }
            return Ok(InsertOutcome::NoSplit);
        }
        self.split_index(guard, entry)
    }

    /// Split a full leaf and insert the pending entry into whichever half
    /// owns it. The new right leaf's first key is copied up.
    ///
    /// The cut starts at the middle entry and moves one entry at a time
    /// until both halves, pending entry included, fit their pages.
    fn split_leaf(
        &mut self,
        mut guard: PageWriteGuard<'a>,
        key: &Key,
        rid: RecordId,
    ) -> Result<InsertOutcome> {
        let key_type = self.key_type();
        let old_id = guard.page_id();

        // Plan the cut over the merged entries before touching any page.
        let (merged, pos, split, right_id) = {
            let old = LeafPage::new(&*guard, key_type);
            let keep = old.len() / 2;
            let goes_right = keep == 0 || *key > old.key_at(keep - 1);
            let hint = if goes_right { keep } else { keep + 1 };

            let pos = old.upper_bound(key);
            let mut merged = old.entries();
            merged.insert(pos, LeafEntry::new(key.clone(), rid));

            let prefix = prefix_sums(merged.iter().map(|e| leaf_entry_size(&e.key)));
            let total = prefix[merged.len()];
            let split = nearest_fit(hint, 1, merged.len() - 1, |s| {
                prefix[s] <= NODE_CAPACITY && total - prefix[s] <= NODE_CAPACITY
            })
            .ok_or_else(|| overflow(old_id))?;
            (merged, pos, split, old.next_page())
        };

        // Pin everything the split touches before changing anything.
        let mut right_guard = if right_id.is_valid() {
            Some(self.fetch_leaf(right_id)?)
        } else {
            None
        };
        let mut new_guard = self.bpm.new_page()?;
        let new_id = new_guard.page_id();

        let mut old = LeafPage::new(&mut *guard, key_type);
        let mut new = LeafPage::new(&mut *new_guard, key_type);
        new.init();
        new.set_next_page(right_id);
        new.set_prev_page(old_id);
        old.set_next_page(new_id);
        if let Some(right_guard) = right_guard.as_mut() {
            LeafPage::new(&mut **right_guard, key_type).set_prev_page(new_id);
        }

        for entry in &merged[split..] {
            if !new.push(entry) {
                return Err(overflow(new_id));
            }
        }
        let pending_left = pos < split;
        let kept = if pending_left { split - 1 } else { split };
        for i in (kept..merged.len() - 1).rev() {
            old.remove(i);
        }
        if pending_left && !old.insert(key, rid) {
            return Err(overflow(old_id));
        }

        debug!(
            "split leaf {} -> {}, kept {} of {} entries",
            old_id,
            new_id,
            old.len(),
            merged.len()
        );
        Ok(InsertOutcome::Promoted {
            key: new.key_at(0),
            page_id: new_id,
        })
    }

    /// Split a full index page around the pending separator. The first
    /// separator of the right half is pushed up and its child becomes the
    /// new page's leftmost child.
    ///
    /// Separators are balanced by bytes, then the cut moves one entry at a
    /// time until both halves fit their pages.
    fn split_index(
        &mut self,
        mut guard: PageWriteGuard<'a>,
        entry: IndexEntry,
    ) -> Result<InsertOutcome> {
        let key_type = self.key_type();
        let old_id = guard.page_id();

        let (merged, pos, split) = {
            let existing = IndexPage::new(&*guard, key_type).entries();
            let sizes: Vec<usize> = existing.iter().map(|e| index_entry_size(&e.key)).collect();

            // Hand entries to the left until it is no emptier than the right.
            let (mut k, mut left, mut right) = (0, 0, sizes.iter().sum::<usize>());
            while existing.len() - k > 1 && right > left {
                left += sizes[k];
                right -= sizes[k];
                k += 1;
            }
            let goes_right = existing.get(k).is_some_and(|e| entry.key > e.key);
            let hint = if goes_right { k } else { k + 1 };

            let pos = existing.partition_point(|e| e.key <= entry.key);
            let mut merged = existing;
            merged.insert(pos, entry);

            let prefix = prefix_sums(merged.iter().map(|e| index_entry_size(&e.key)));
            let total = prefix[merged.len()];
            let split = nearest_fit(hint, 0, merged.len() - 1, |s| {
                prefix[s] <= NODE_CAPACITY && total - prefix[s + 1] <= NODE_CAPACITY
            })
            .ok_or_else(|| overflow(old_id))?;
            (merged, pos, split)
        };

        let mut new_guard = self.bpm.new_page()?;
        let new_id = new_guard.page_id();

        let pushed = &merged[split];
        let mut new = IndexPage::new(&mut *new_guard, key_type);
        new.init(pushed.child);
        for entry in &merged[split + 1..] {
            if !new.insert(entry) {
                return Err(overflow(new_id));
            }
        }

        let mut cur = IndexPage::new(&mut *guard, key_type);
        let pending_left = pos < split;
        let kept = if pending_left { split - 1 } else { split };
        for i in (kept..merged.len() - 1).rev() {
            cur.remove(i);
        }
        if pending_left && !cur.insert(&merged[pos]) {
            return Err(overflow(old_id));
        }

        debug!(
            "split index {} -> {}, pushed up separator {}",
            old_id, new_id, pushed.key
        );
        Ok(InsertOutcome::Promoted {
            key: pushed.key.clone(),
            page_id: new_id,
        })
    }
}

/// Bytes available for records on an empty node.
const NODE_CAPACITY: usize = PAGE_SIZE - SORTED_PAGE_PREFIX;

/// `prefix[s]` is the total size of the first `s` entries.
fn prefix_sums(sizes: impl Iterator<Item = usize>) -> Vec<usize> {
    std::iter::once(0)
        .chain(sizes.scan(0, |acc, size| {
            *acc += size;
            Some(*acc)
        }))
        .collect()
}

/// The cut point in `lo..=hi` closest to `hint` that `fits` accepts.
fn nearest_fit(hint: usize, lo: usize, hi: usize, fits: impl Fn(usize) -> bool) -> Option<usize> {
    if lo > hi {
        return None;
    }
    let hint = hint.clamp(lo, hi);
    (0..=hi - lo).find_map(|d| {
        [hint.checked_sub(d), Some(hint + d)]
            .into_iter()
            .flatten()
            .find(|&s| (lo..=hi).contains(&s) && fits(s))
    })
}
