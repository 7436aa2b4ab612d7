//! Naive delete: remove matching entries, never merge or free nodes.

use log::trace;

use crate::common::{RecordId, Result};
use crate::index::btree::{BTreeFile, Key, LeafPage};

impl<'a> BTreeFile<'a> {
    /// Remove every entry equal to (`key`, `rid`).
    ///
    /// Entries with the same key but another record id stay. Leaves that
    /// become underfull or empty stay in the tree until it is destroyed.
    /// Returns whether anything was removed; a key longer than the index
    /// allows was never inserted, so it reports `false`.
    ///
    /// # Errors
    /// - `Error::KeyTypeMismatch` if the key's type differs from the index's
    /// - page store errors
    pub fn delete(&mut self, key: &Key, rid: RecordId) -> Result<bool> {
        self.check_key_type(key)?;
        if key.encoded_len() > self.max_key_size() {
            return Ok(false);
        }
        let key_type = self.key_type();

        let Some((mut guard, mut pos)) = self.find_run_start(Some(key))? else {
            return Ok(false);
        };

        let mut removed = 0;
        loop {
            let leaf = LeafPage::new(&*guard, key_type);
            if pos >= leaf.len() {
                let next = leaf.next_page();
                if !next.is_valid() {
                    break;
                }
                drop(guard);
                guard = self.fetch_leaf(next)?;
                pos = 0;
                continue;
            }

            let entry = leaf.entry(pos);
            if entry.key > *key {
                break;
            }
            if entry.key == *key && entry.rid == rid {
                LeafPage::new(&mut *guard, key_type).remove(pos);
                removed += 1;
            } else {
                pos += 1;
            }
        }

        trace!("delete {} {} removed {} entries", key, rid, removed);
        Ok(removed > 0)
    }
}
