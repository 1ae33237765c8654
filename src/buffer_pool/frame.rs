use crate::pages::{Page, PageId};

/// An in-memory slot holding one page plus its pin count. The dirty flag
/// lives on the page itself; eviction is forbidden while the count is
/// non-zero.
#[derive(Debug, Default)]
pub struct Frame {
    page: Page,
    counter: u16,
}

impl Frame {
    pub fn new() -> Self {
        Self {
            page: Page::new(),
            counter: 0,
        }
    }

    pub(super) fn pin(&mut self) {
        self.counter += 1;
    }

    pub(super) fn unpin(&mut self) {
        assert!(self.counter > 0, "unpin of a frame with pin count 0");
        self.counter -= 1;
    }

    pub fn get_pin_count(&self) -> u16 {
        self.counter
    }

    pub fn get_page_id(&self) -> PageId {
        self.page.get_page_id()
    }

    /// Installs a new page image, dropping whatever the frame held before.
    pub(super) fn set_page(&mut self, page: Page) {
        self.page = page;
    }

    pub fn reader(&self) -> &Page {
        &self.page
    }

    pub fn writer(&mut self) -> &mut Page {
        &mut self.page
    }
}
