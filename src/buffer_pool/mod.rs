mod frame;
mod parallel;
mod replacer;

use crate::disk_manager::DiskManager;
use crate::errors::Error;
#[cfg(debug_assertions)]
use crate::get_caller_name;
use crate::pages::{Page, PageId, INVALID_PAGE};
use crate::printdbg;
use anyhow::{anyhow, Result};
use parking_lot::FairMutex;
use replacer::LRU;
use std::collections::{HashMap, LinkedList};
use std::sync::Arc;

pub use frame::Frame;
pub use parallel::{FrameGuard, ParallelBufferPool};

pub type FrameId = usize;
pub type ArcBufferPool = Arc<FairMutex<BufferPoolManager>>;

/// One buffer pool instance. When sharded (see [`ParallelBufferPool`]) it
/// owns the slice of the page-id space congruent to its shard index; the
/// ids it mints advance by the number of instances so shards never collide.
///
/// The surrounding mutex is the instance latch; per-page latches live on
/// the pages and are taken by callers of the returned frames.
pub struct BufferPoolManager {
    disk_manager: DiskManager,

    free_frames: LinkedList<FrameId>,
    page_table: HashMap<PageId, FrameId>,
    frames: Vec<Frame>,

    replacer: Box<dyn replacer::Replacer>,

    next_page_id: PageId,
    num_instances: usize,
    instance_index: usize,
}

impl BufferPoolManager {
    pub fn new(pool_size: usize, path: &str) -> Self {
        Self::with_shard(pool_size, 1, 0, path)
    }

    pub fn with_shard(
        pool_size: usize,
        num_instances: usize,
        instance_index: usize,
        path: &str,
    ) -> Self {
        assert!(num_instances > 0, "a pool needs at least one instance");
        assert!(instance_index < num_instances, "shard index out of range");

        let frames = (0..pool_size).map(|_| Frame::new()).collect::<Vec<_>>();

        Self {
            disk_manager: DiskManager::new(path),
            free_frames: LinkedList::from_iter(0..pool_size),
            page_table: HashMap::new(),
            frames,
            replacer: Box::new(LRU::new(pool_size)),
            next_page_id: instance_index as PageId,
            num_instances,
            instance_index,
        }
    }

    fn allocate_page(&mut self) -> PageId {
        let page_id = self.next_page_id;
        self.next_page_id += self.num_instances as PageId;
        assert_eq!(
            page_id % self.num_instances as PageId,
            self.instance_index as PageId,
            "page id escaped its shard"
        );
        page_id
    }

    fn find_free_frame(&mut self) -> Result<FrameId> {
        if let Some(frame_id) = self.free_frames.pop_front() {
            Ok(frame_id)
        } else if let Some(frame_id) = self.replacer.victim() {
            self.evict_frame(frame_id)?;
            Ok(frame_id)
        } else {
            Err(anyhow!(Error::NoFreeFrames))
        }
    }

    fn evict_frame(&mut self, frame_id: FrameId) -> Result<()> {
        let frame = &mut self.frames[frame_id];
        assert_eq!(frame.get_pin_count(), 0, "evicting a pinned frame");

        let page = frame.writer();

        printdbg!(
            "Page {} (frame: {frame_id}) chosen for eviction, is dirty: {}",
            page.get_page_id(),
            page.is_dirty()
        );

        if page.is_dirty() {
            self.disk_manager.write_page(page)?;
            page.mark_clean();
        }

        self.page_table.remove(&page.get_page_id());

        Ok(())
    }

    /// Mints a fresh zeroed page and returns its frame, pinned once. The
    /// zero image is written through so that a fetch after eviction reads
    /// zeros rather than failing.
    pub fn new_page(&mut self) -> Result<&mut Frame> {
        let frame_id = self.find_free_frame()?;
        let page_id = self.allocate_page();

        let mut page = Page::new();
        page.set_page_id(page_id);

        printdbg!("Created page {} and writing to disk", page_id);
        if let Err(e) = self.disk_manager.write_page(&page) {
            // the frame was already pulled out of the free structures
            self.frames[frame_id].set_page(Page::new());
            self.free_frames.push_back(frame_id);
            return Err(e);
        }

        let frame = &mut self.frames[frame_id];
        frame.set_page(page);
        frame.pin();
        self.replacer.pin(frame_id);
        self.page_table.insert(page_id, frame_id);

        Ok(&mut self.frames[frame_id])
    }

    /// Returns the frame holding `page_id`, reading it from disk if it is
    /// not resident. The frame comes back with its pin count incremented;
    /// the caller owes a matching [`Self::unpin_page`].
    pub fn fetch_page(&mut self, page_id: PageId) -> Result<&mut Frame> {
        if let Some(&frame_id) = self.page_table.get(&page_id) {
            let frame = &mut self.frames[frame_id];
            frame.pin();
            self.replacer.pin(frame_id);

            printdbg!(
                "{} Fetched page {page_id} (frame: {frame_id}) with pin count {}",
                get_caller_name!(),
                self.frames[frame_id].get_pin_count()
            );

            return Ok(&mut self.frames[frame_id]);
        }

        // read before taking a frame so a failed read leaves the pool untouched
        let page = self.disk_manager.read_page(page_id)?;
        let frame_id = self.find_free_frame()?;

        let frame = &mut self.frames[frame_id];
        frame.set_page(page);
        frame.pin();
        self.replacer.pin(frame_id);
        self.page_table.insert(page_id, frame_id);

        printdbg!(
            "{} Fetched page {page_id} (frame: {frame_id}) from disk",
            get_caller_name!()
        );

        Ok(&mut self.frames[frame_id])
    }

    /// Drops one pin. `is_dirty` is sticky: once a page is reported dirty it
    /// stays dirty until flushed, no matter what later unpins claim.
    pub fn unpin_page(&mut self, page_id: PageId, is_dirty: bool) -> bool {
        if page_id == INVALID_PAGE {
            return false;
        }
        let frame_id = match self.page_table.get(&page_id) {
            Some(&frame_id) => frame_id,
            None => return false,
        };

        let frame = &mut self.frames[frame_id];
        if is_dirty {
            frame.writer().mark_dirty();
        }
        if frame.get_pin_count() == 0 {
            return false;
        }
        frame.unpin();

        printdbg!(
            "{} page {page_id} (frame: {frame_id}) unpinned, pin count: {}",
            get_caller_name!(),
            frame.get_pin_count()
        );

        if frame.get_pin_count() == 0 {
            self.replacer.unpin(frame_id);
        }
        true
    }

    /// Writes the resident page through, pinned or not, and clears its
    /// dirty flag. `false` when the page is not resident or the write
    /// failed; a failed write leaves the flag set so the page can be
    /// flushed again.
    pub fn flush_page(&mut self, page_id: PageId) -> bool {
        let frame_id = match self.page_table.get(&page_id) {
            Some(&frame_id) => frame_id,
            None => return false,
        };

        let frame = &mut self.frames[frame_id];
        match self.disk_manager.write_page(frame.reader()) {
            Ok(()) => {
                frame.writer().mark_clean();
                true
            }
            Err(_) => false,
        }
    }

    pub fn flush_all_pages(&mut self) -> Result<()> {
        for frame in self
            .frames
            .iter_mut()
            .filter(|f| f.get_page_id() != INVALID_PAGE)
        {
            self.disk_manager.write_page(frame.reader())?;
            frame.writer().mark_clean();
        }
        Ok(())
    }

    /// Evicts `page_id` for good. `true` when the page was not resident to
    /// begin with or was deleted; `false` when someone still holds a pin.
    pub fn delete_page(&mut self, page_id: PageId) -> bool {
        let frame_id = match self.page_table.get(&page_id) {
            Some(&frame_id) => frame_id,
            None => return true,
        };

        let frame = &mut self.frames[frame_id];
        if frame.get_pin_count() > 0 {
            return false;
        }

        if frame.reader().is_dirty() && self.disk_manager.write_page(frame.reader()).is_err() {
            // leave the page resident and dirty; the caller may retry
            return false;
        }
        frame.set_page(Page::new());

        self.page_table.remove(&page_id);
        // an unpinned resident frame sits in the replacer; pull it out
        self.replacer.pin(frame_id);
        self.free_frames.push_back(frame_id);

        self.disk_manager.deallocate_page(page_id);

        printdbg!("Deleted page {page_id} (frame: {frame_id})");

        true
    }

    #[cfg(test)]
    pub fn get_pin_count(&self, page_id: &PageId) -> Option<u16> {
        let frame_id = *self.page_table.get(page_id)?;
        Some(self.frames[frame_id].get_pin_count())
    }

    #[cfg(test)]
    pub fn is_resident(&self, page_id: &PageId) -> bool {
        self.page_table.contains_key(page_id)
    }

    #[cfg(test)]
    pub fn is_dirty(&self, page_id: &PageId) -> Option<bool> {
        let frame_id = *self.page_table.get(page_id)?;
        Some(self.frames[frame_id].reader().is_dirty())
    }

    /// Frame accounting cross-check: page table, free list and replacer
    /// membership must line up with every frame's id and pin count.
    #[cfg(test)]
    pub fn assert_frame_accounting(&self) {
        for (frame_id, frame) in self.frames.iter().enumerate() {
            let page_id = frame.get_page_id();
            if page_id == INVALID_PAGE {
                assert_eq!(frame.get_pin_count(), 0);
                assert!(self.free_frames.contains(&frame_id));
                assert!(!self.replacer.contains(frame_id));
            } else {
                assert_eq!(self.page_table.get(&page_id), Some(&frame_id));
                assert!(!self.free_frames.contains(&frame_id));
                assert_eq!(self.replacer.contains(frame_id), frame.get_pin_count() == 0);
            }
        }
        for (page_id, frame_id) in &self.page_table {
            assert_eq!(self.frames[*frame_id].get_page_id(), *page_id);
        }
    }
}
