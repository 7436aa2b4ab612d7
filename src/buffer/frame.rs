//! Frame - a slot in the buffer pool.
//!
//! A [`Frame`] holds a [`Page`] plus metadata needed for buffer management:
//! - Which page is loaded (if any)
//! - Pin count for reference counting
//! - Dirty flag for write-back tracking

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::PageId;
use crate::storage::page::Page;

/// A frame in the buffer pool.
///
/// The pool allocates a fixed number of frames up front; each holds at most
/// one page. All fields use interior mutability so frames can be shared
/// through `&BufferPoolManager`:
/// - `page`: `RwLock` guarding the bytes
/// - `page_id`: `Mutex`
/// - `pin_count` / `is_dirty`: atomics
pub struct Frame {
    page: RwLock<Page>,
    page_id: Mutex<Option<PageId>>,
    pin_count: AtomicU32,
    is_dirty: AtomicBool,
}

impl Frame {
    /// Create a new empty frame.
    pub fn new() -> Self {
        Self {
            page: RwLock::new(Page::new()),
            page_id: Mutex::new(None),
            pin_count: AtomicU32::new(0),
            is_dirty: AtomicBool::new(false),
        }
    }

    /// Acquire read lock on the page.
    #[inline]
    pub fn page(&self) -> RwLockReadGuard<'_, Page> {
        self.page.read()
    }

    /// Acquire write lock on the page.
    #[inline]
    pub fn page_mut(&self) -> RwLockWriteGuard<'_, Page> {
        self.page.write()
    }

    /// Get the page ID of the loaded page.
    #[inline]
    pub fn page_id(&self) -> Option<PageId> {
        *self.page_id.lock()
    }

    /// Set the page ID.
    #[inline]
    pub fn set_page_id(&self, page_id: Option<PageId>) {
        *self.page_id.lock() = page_id;
    }

    /// Bind an empty frame to `page_id` with `contents` and pin it once.
    ///
    /// `None` contents zero the page (a freshly allocated page).
    pub fn install(&self, page_id: PageId, contents: Option<&Page>) {
        {
            let mut page = self.page_mut();
            match contents {
                Some(src) => page.as_mut_slice().copy_from_slice(src.as_slice()),
                None => page.reset(),
            }
        }
        self.set_page_id(Some(page_id));
        self.is_dirty.store(false, Ordering::Relaxed);
        self.pin();
    }

    /// Increment the pin count. Returns the new pin count.
    #[inline]
    pub fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Decrement the pin count. Returns the new pin count.
    ///
    /// # Panics
    /// Panics if pin count is already 0.
    #[inline]
    pub fn unpin(&self) -> u32 {
        let old = self.pin_count.fetch_sub(1, Ordering::Relaxed);
        assert!(old > 0, "pin count underflow");
        old - 1
    }

    /// Get the current pin count.
    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Relaxed)
    }

    /// Check if the frame is currently pinned.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count() > 0
    }

    /// Mark the frame as dirty (modified).
    #[inline]
    pub fn mark_dirty(&self) {
        self.is_dirty.store(true, Ordering::Relaxed);
    }

    /// Clear the dirty flag.
    #[inline]
    pub fn clear_dirty(&self) {
        self.is_dirty.store(false, Ordering::Relaxed);
    }

    /// Check if the frame is dirty.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.is_dirty.load(Ordering::Relaxed)
    }

    /// Check if the frame is empty (no page loaded).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.page_id().is_none()
    }

    /// Check if the frame can be evicted.
    #[inline]
    pub fn is_evictable(&self) -> bool {
        self.page_id().is_some() && !self.is_pinned()
    }

    /// Detach the frame from its page so it can go back on the free list.
    pub fn clear(&self) {
        self.set_page_id(None);
        self.clear_dirty();
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_new() {
        let frame = Frame::new();
        assert!(frame.is_empty());
        assert!(!frame.is_pinned());
        assert!(!frame.is_dirty());
        assert_eq!(frame.page_id(), None);
    }

    #[test]
    fn test_frame_pin_unpin() {
        let frame = Frame::new();

        assert_eq!(frame.pin(), 1);
        assert_eq!(frame.pin(), 2);
        assert_eq!(frame.unpin(), 1);
        assert!(frame.is_pinned());
        assert_eq!(frame.unpin(), 0);
        assert!(!frame.is_pinned());
    }

    #[test]
    #[should_panic(expected = "pin count underflow")]
    fn test_frame_unpin_underflow() {
        let frame = Frame::new();
        frame.unpin();
    }

    #[test]
    fn test_frame_install_copies_and_pins() {
        let frame = Frame::new();
        let mut src = Page::new();
        src.as_mut_slice()[10] = 0x33;

        frame.install(PageId::new(4), Some(&src));

        assert_eq!(frame.page_id(), Some(PageId::new(4)));
        assert_eq!(frame.pin_count(), 1);
        assert_eq!(frame.page().as_slice()[10], 0x33);
        assert!(!frame.is_evictable());
    }

    #[test]
    fn test_frame_install_fresh_page_is_zeroed() {
        let frame = Frame::new();
        frame.page_mut().as_mut_slice()[100] = 0xFF;
        frame.mark_dirty();

        frame.install(PageId::new(9), None);

        assert_eq!(frame.page().as_slice()[100], 0);
        assert!(!frame.is_dirty());
    }

    #[test]
    fn test_frame_evictable_and_clear() {
        let frame = Frame::new();
        assert!(!frame.is_evictable());

        frame.install(PageId::new(1), None);
        assert!(!frame.is_evictable());
        frame.unpin();
        assert!(frame.is_evictable());

        frame.mark_dirty();
        frame.clear();
        assert!(frame.is_empty());
        assert!(!frame.is_dirty());
    }
}
