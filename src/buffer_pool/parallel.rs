use super::{ArcBufferPool, BufferPoolManager, Frame};
use crate::errors::Error;
use crate::pages::PageId;
use anyhow::{anyhow, Result};
use parking_lot::{FairMutex, FairMutexGuard, MappedFairMutexGuard, Mutex};
use std::sync::Arc;

/// A frame handle returned by the parallel pool. It keeps the owning
/// shard's instance latch held, so copy what you need and drop it; the pin
/// taken underneath outlives the guard until `unpin_page`.
pub type FrameGuard<'a> = MappedFairMutexGuard<'a, Frame>;

/// Statically shards the page-id space over `num_instances` buffer pool
/// instances: `page_id % num_instances` owns the page. Routed operations
/// only ever lock their own shard; allocation rotates over the shards so
/// no single one soaks up every new page.
pub struct ParallelBufferPool {
    instances: Vec<ArcBufferPool>,
    num_instances: usize,
    pool_size: usize,
    start_idx: Mutex<usize>,
}

impl ParallelBufferPool {
    pub fn new(num_instances: usize, pool_size: usize, path: &str) -> Self {
        assert!(num_instances > 0, "a pool needs at least one instance");

        let instances = (0..num_instances)
            .map(|instance_index| {
                Arc::new(FairMutex::new(BufferPoolManager::with_shard(
                    pool_size,
                    num_instances,
                    instance_index,
                    path,
                )))
            })
            .collect();

        Self {
            instances,
            num_instances,
            pool_size,
            start_idx: Mutex::new(0),
        }
    }

    pub fn get_pool_size(&self) -> usize {
        self.num_instances * self.pool_size
    }

    /// The shard responsible for `page_id`.
    pub fn instance(&self, page_id: PageId) -> &ArcBufferPool {
        &self.instances[page_id as usize % self.num_instances]
    }

    /// Round-robin allocation: try every shard once, starting one shard
    /// later on each call so refusals don't pile up on a cold shard.
    pub fn new_page(&self) -> Result<(PageId, FrameGuard<'_>)> {
        let begin = {
            let mut start_idx = self.start_idx.lock();
            let begin = *start_idx;
            *start_idx = (begin + 1) % self.num_instances;
            begin
        };

        let mut failure = None;
        for offset in 0..self.num_instances {
            let shard = &self.instances[(begin + offset) % self.num_instances];
            let guard = shard.lock();
            match FairMutexGuard::try_map(guard, |pool| {
                pool.new_page().map_err(|e| failure = Some(e)).ok()
            }) {
                Ok(frame) => {
                    let page_id = frame.get_page_id();
                    return Ok((page_id, frame));
                }
                Err(_guard) => continue,
            }
        }

        Err(failure.unwrap_or_else(|| anyhow!(Error::NoFreeFrames)))
    }

    pub fn fetch_page(&self, page_id: PageId) -> Result<FrameGuard<'_>> {
        let mut failure = None;
        let guard = self.instance(page_id).lock();
        FairMutexGuard::try_map(guard, |pool| {
            pool.fetch_page(page_id).map_err(|e| failure = Some(e)).ok()
        })
        .map_err(|_guard| failure.expect("fetch failed without an error"))
    }

    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        self.instance(page_id).lock().unpin_page(page_id, is_dirty)
    }

    pub fn flush_page(&self, page_id: PageId) -> bool {
        self.instance(page_id).lock().flush_page(page_id)
    }

    pub fn delete_page(&self, page_id: PageId) -> bool {
        self.instance(page_id).lock().delete_page(page_id)
    }

    pub fn flush_all_pages(&self) -> Result<()> {
        for shard in &self.instances {
            shard.lock().flush_all_pages()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk_manager::test_path;
    use anyhow::Result;

    #[test]
    fn test_round_robin_allocation() -> Result<()> {
        let pool = ParallelBufferPool::new(4, 5, &test_path());
        assert_eq!(pool.get_pool_size(), 20);

        let mut ids = Vec::new();
        for _ in 0..10 {
            let (page_id, frame) = pool.new_page()?;
            assert_eq!(frame.get_page_id(), page_id);
            drop(frame);
            assert!(pool.unpin_page(page_id, false));
            ids.push(page_id);
        }

        // allocation k lands on shard k % 4, so residues cycle in order
        for (k, page_id) in ids.iter().enumerate() {
            assert_eq!(*page_id as usize % 4, k % 4);
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 10);
        Ok(())
    }

    #[test]
    fn test_fetch_routes_to_owner() -> Result<()> {
        let pool = ParallelBufferPool::new(3, 2, &test_path());

        let mut ids = Vec::new();
        for tag in 0u8..6 {
            let (page_id, mut frame) = pool.new_page()?;
            frame.writer().write_bytes(0, 1, &[tag]);
            drop(frame);
            assert!(pool.unpin_page(page_id, true));
            ids.push(page_id);
        }

        for (tag, page_id) in ids.iter().enumerate() {
            let frame = pool.fetch_page(*page_id)?;
            assert_eq!(frame.reader().read_bytes(0, 1), &[tag as u8]);
            drop(frame);
            assert!(pool.unpin_page(*page_id, false));
        }
        Ok(())
    }

    #[test]
    fn test_full_shards_fall_through() -> Result<()> {
        let pool = ParallelBufferPool::new(2, 1, &test_path());

        let (a, frame) = pool.new_page()?;
        drop(frame);
        let (b, frame) = pool.new_page()?;
        drop(frame);
        assert_ne!(a as usize % 2, b as usize % 2);

        // every frame in every shard is pinned
        assert!(pool.new_page().is_err());

        assert!(pool.unpin_page(a, false));
        // the rotation starts on the full shard and falls through to a's
        let (c, frame) = pool.new_page()?;
        drop(frame);
        assert_eq!(c as usize % 2, a as usize % 2);

        assert!(pool.unpin_page(b, false));
        assert!(pool.unpin_page(c, false));
        Ok(())
    }

    #[test]
    fn test_flush_and_delete_route() -> Result<()> {
        let pool = ParallelBufferPool::new(2, 2, &test_path());

        let (a, mut frame) = pool.new_page()?;
        frame.writer().write_bytes(0, 2, b"hi");
        drop(frame);
        assert!(pool.unpin_page(a, true));

        assert!(pool.flush_page(a));
        assert!(!pool.flush_page(a + 1024));

        assert!(pool.delete_page(a));
        assert!(!pool.instance(a).lock().is_resident(&a));
        pool.flush_all_pages()?;
        Ok(())
    }
}
