//! Configuration constants for pagetree.

/// Size of a page in bytes (4KB), matching the OS page size on most systems.
///
/// Every B+Tree node, header and the catalog occupy exactly one page.
pub const PAGE_SIZE: usize = 4096;

/// Page reserved for the file catalog in every database file.
pub const DIRECTORY_PAGE_ID: u32 = 0;

/// Longest file name the catalog can register.
pub const MAX_FILE_NAME_LEN: usize = 59;

/// Upper bound for an index's maximum encoded key size.
///
/// Chosen so that an index page always holds at least three entries,
/// which the index split needs to leave both halves non-empty.
pub const MAX_KEY_SIZE: usize = 1024;

/// Tag written into every B+Tree header page.
pub const BTREE_MAGIC: u32 = 1989;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_is_power_of_two() {
        assert!(PAGE_SIZE.is_power_of_two());
        assert_eq!(PAGE_SIZE, 4096);
    }

    #[test]
    fn test_max_key_size_leaves_room_for_three_entries() {
        // slot (4) + key + child page id (4), plus the sorted page prefix (26)
        assert!(3 * (4 + MAX_KEY_SIZE + 4) + 26 <= PAGE_SIZE);
    }
}
