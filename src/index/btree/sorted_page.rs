//! Slotted layout shared by leaf and index pages.
//!
//! # Layout
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       13    PageHeader (type = BTreeLeaf | BTreeIndex)
//! 13      1     key type
//! 14      2     slot count
//! 16      2     free pointer (start of the record area)
//! 18      4     prev page  (leaf: left sibling, index: leftmost child)
//! 22      4     next page  (leaf: right sibling, index: unused)
//! 26      4×N   slots: record offset (u16) | record length (u16)
//!  ...          free space
//! free    ...   records, packed toward the end of the page
//! ```
//!
//! Slots are kept in key order; records stay wherever they were written and
//! the record area is compacted on delete.

use std::ops::{Deref, DerefMut};

use crate::common::config::PAGE_SIZE;
use crate::common::PageId;
use crate::index::btree::KeyType;
use crate::storage::page::{Page, PageHeader, PageType};

const OFFSET_KEY_TYPE: usize = PageHeader::SIZE;
const OFFSET_SLOT_COUNT: usize = OFFSET_KEY_TYPE + 1;
const OFFSET_FREE_PTR: usize = OFFSET_SLOT_COUNT + 2;
const OFFSET_PREV: usize = OFFSET_FREE_PTR + 2;
const OFFSET_NEXT: usize = OFFSET_PREV + PageId::SIZE;

/// Start of the slot array.
pub const SORTED_PAGE_PREFIX: usize = OFFSET_NEXT + PageId::SIZE;

/// Bytes one slot occupies in the slot array.
pub const SLOT_SIZE: usize = 4;

/// First slot in `0..len` for which `pred` is false.
///
/// `pred` must hold for a (possibly empty) prefix of the slots and fail
/// for the rest, as it does for key comparisons on a sorted page.
pub(crate) fn partition_point(len: usize, mut pred: impl FnMut(usize) -> bool) -> usize {
    let (mut lo, mut hi) = (0, len);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

/// A view over a page laid out as a sorted slotted page.
///
/// `P` is anything that derefs to a [`Page`]: a plain `&Page`, a
/// `&mut Page`, or a buffer pool guard. Mutating methods need `DerefMut`.
pub struct SortedPage<P> {
    page: P,
}

impl<P: Deref<Target = Page>> SortedPage<P> {
    pub fn new(page: P) -> Self {
        Self { page }
    }

    pub fn node_type(&self) -> PageType {
        self.page.page_type()
    }

    pub fn key_type(&self) -> Option<KeyType> {
        KeyType::from_u8(self.bytes()[OFFSET_KEY_TYPE])
    }

    pub fn slot_count(&self) -> usize {
        self.read_u16(OFFSET_SLOT_COUNT) as usize
    }

    /// Bytes available for new records and their slots.
    pub fn free_space(&self) -> usize {
        self.free_ptr()
            .saturating_sub(SORTED_PAGE_PREFIX + self.slot_count() * SLOT_SIZE)
    }

    pub fn prev_page(&self) -> PageId {
        PageId::read_from(&self.bytes()[OFFSET_PREV..])
    }

    pub fn next_page(&self) -> PageId {
        PageId::read_from(&self.bytes()[OFFSET_NEXT..])
    }

    /// Raw bytes of the record in slot `i`.
    ///
    /// # Panics
    /// Panics if `i >= slot_count()`.
    pub fn record(&self, i: usize) -> &[u8] {
        assert!(i < self.slot_count(), "slot {} out of range", i);
        let (offset, len) = self.slot(i);
        &self.bytes()[offset..offset + len]
    }

    pub fn into_inner(self) -> P {
        self.page
    }

    fn free_ptr(&self) -> usize {
        self.read_u16(OFFSET_FREE_PTR) as usize
    }

    fn slot(&self, i: usize) -> (usize, usize) {
        let at = SORTED_PAGE_PREFIX + i * SLOT_SIZE;
        (self.read_u16(at) as usize, self.read_u16(at + 2) as usize)
    }

    fn read_u16(&self, at: usize) -> u16 {
        u16::from_le_bytes([self.bytes()[at], self.bytes()[at + 1]])
    }

    fn bytes(&self) -> &[u8] {
        self.page.as_slice()
    }
}

impl<P: DerefMut<Target = Page>> SortedPage<P> {
    /// Format the page as an empty sorted page.
    pub fn init(&mut self, node_type: PageType, key_type: KeyType) {
        self.page.reset();
        self.page.set_header(&PageHeader::new(node_type));
        self.bytes_mut()[OFFSET_KEY_TYPE] = key_type as u8;
        self.write_u16(OFFSET_SLOT_COUNT, 0);
        self.write_u16(OFFSET_FREE_PTR, PAGE_SIZE as u16);
        self.set_prev_page(PageId::INVALID);
        self.set_next_page(PageId::INVALID);
    }

    pub fn set_prev_page(&mut self, page_id: PageId) {
        page_id.write_to(&mut self.bytes_mut()[OFFSET_PREV..]);
    }

    pub fn set_next_page(&mut self, page_id: PageId) {
        page_id.write_to(&mut self.bytes_mut()[OFFSET_NEXT..]);
    }

    /// Reserve a `len`-byte record in slot `pos`, shifting later slots right.
    ///
    /// Returns the record bytes to fill in, or `None` if the page lacks room.
    pub fn insert_record(&mut self, pos: usize, len: usize) -> Option<&mut [u8]> {
        let count = self.slot_count();
        assert!(pos <= count, "slot {} out of range", pos);
        if self.free_space() < len + SLOT_SIZE {
            return None;
        }

        let offset = self.free_ptr() - len;
        let slots_at = SORTED_PAGE_PREFIX + pos * SLOT_SIZE;
        let slots_end = SORTED_PAGE_PREFIX + count * SLOT_SIZE;
        self.bytes_mut()
            .copy_within(slots_at..slots_end, slots_at + SLOT_SIZE);

        self.write_u16(slots_at, offset as u16);
        self.write_u16(slots_at + 2, len as u16);
        self.write_u16(OFFSET_SLOT_COUNT, (count + 1) as u16);
        self.write_u16(OFFSET_FREE_PTR, offset as u16);

        Some(&mut self.bytes_mut()[offset..offset + len])
    }

    /// Remove slot `i` and compact the record area.
    ///
    /// # Panics
    /// Panics if `i >= slot_count()`.
    pub fn delete_record(&mut self, i: usize) {
        let count = self.slot_count();
        assert!(i < count, "slot {} out of range", i);

        let (offset, len) = self.slot(i);
        let free_ptr = self.free_ptr();

        // Slide every record stored below the victim up over it.
        self.bytes_mut()
            .copy_within(free_ptr..offset, free_ptr + len);
        for j in 0..count {
            let (other, other_len) = self.slot(j);
            if other < offset {
                let at = SORTED_PAGE_PREFIX + j * SLOT_SIZE;
                self.write_u16(at, (other + len) as u16);
                self.write_u16(at + 2, other_len as u16);
            }
        }

        let slot_at = SORTED_PAGE_PREFIX + i * SLOT_SIZE;
        let slots_end = SORTED_PAGE_PREFIX + count * SLOT_SIZE;
        self.bytes_mut()
            .copy_within(slot_at + SLOT_SIZE..slots_end, slot_at);

        self.write_u16(OFFSET_SLOT_COUNT, (count - 1) as u16);
        self.write_u16(OFFSET_FREE_PTR, (free_ptr + len) as u16);
    }

    fn write_u16(&mut self, at: usize, value: u16) {
        self.bytes_mut()[at..at + 2].copy_from_slice(&value.to_le_bytes());
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        self.page.as_mut_slice()
    }
}
