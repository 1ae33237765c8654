pub mod indexes;
pub(crate) mod traits;

use crate::latch::Latch;
use std::sync::Arc;
use traits::Serialize;

pub const PAGE_SIZE: usize = 4096; // 4 KBs
pub const INVALID_PAGE: PageId = -1;

pub type PageId = i64;
pub type Lsn = u64;

/// A generic page with an underlying array of [`PAGE_SIZE`] bytes.
/// Typed views (directory/bucket pages) are built on top of the raw bytes
/// and share the page's latch.
#[repr(C, align(8))]
#[derive(Debug)]
pub struct Page {
    /// Underlying block of memory of size [`PAGE_SIZE`]
    data: [u8; PAGE_SIZE],
    is_dirty: bool,
    page_id: PageId,
    latch: Arc<Latch>,
}

impl Serialize for Page {
    fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        assert_eq!(bytes.len(), PAGE_SIZE);
        let mut page = Page::new();
        page.data.copy_from_slice(bytes);
        page
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new()
    }
}

impl Page {
    pub fn new() -> Self {
        Page {
            data: [0u8; PAGE_SIZE],
            is_dirty: false,
            page_id: INVALID_PAGE,
            latch: Arc::new(Latch::new()),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    pub fn get_page_id(&self) -> PageId {
        self.page_id
    }

    pub fn set_page_id(&mut self, page_id: PageId) {
        self.page_id = page_id;
    }

    /// The latch is shared with any typed view built over this page,
    /// so latching the view latches the page and vice versa.
    pub fn get_latch(&self) -> &Arc<Latch> {
        &self.latch
    }

    pub fn read_bytes(&self, start: usize, end: usize) -> &[u8] {
        &self.data[start..end]
    }

    pub fn write_bytes(&mut self, start: usize, end: usize, bytes: &[u8]) {
        self.data[start..end].copy_from_slice(bytes);
        self.is_dirty = true;
    }

    /// Raw base pointer for typed views. Callers must hold a pin on the
    /// owning frame for as long as the view is dereferenced.
    pub(crate) fn data_ptr(&mut self) -> *mut u8 {
        self.data.as_mut_ptr()
    }
}
