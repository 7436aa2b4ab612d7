//! Record identifier type.

use std::fmt;

use super::PageId;

/// Locates a record stored outside the index: a page plus a slot on it.
///
/// The index stores these as leaf payloads and hands them back from scans.
/// It never dereferences them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: u16,
}

impl RecordId {
    /// Encoded size on a leaf page.
    pub const SIZE: usize = 6;

    #[inline]
    pub fn new(page_id: PageId, slot: u16) -> Self {
        Self { page_id, slot }
    }

    pub fn read_from(bytes: &[u8]) -> Self {
        Self {
            page_id: PageId::read_from(bytes),
            slot: u16::from_le_bytes([bytes[4], bytes[5]]),
        }
    }

    pub fn write_to(&self, bytes: &mut [u8]) {
        self.page_id.write_to(bytes);
        bytes[4..Self::SIZE].copy_from_slice(&self.slot.to_le_bytes());
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.page_id.0, self.slot)
    }
}
