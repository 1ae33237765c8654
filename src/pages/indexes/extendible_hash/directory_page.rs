use super::DIRECTORY_ARRAY_SIZE;
use crate::latch::Latch;
use crate::pages::{Lsn, Page, PageId, PAGE_SIZE};
use std::collections::HashMap;
use std::mem::size_of;
use std::sync::Arc;

/// On-page image of the directory. Only the first `2^global_depth`
/// entries of the two arrays are meaningful.
#[repr(C)]
pub struct HashDirectoryPageData {
    page_id: PageId,
    lsn: Lsn,
    global_depth: u32,
    local_depths: [u8; DIRECTORY_ARRAY_SIZE],
    bucket_page_ids: [PageId; DIRECTORY_ARRAY_SIZE],
}

const _: () = assert!(size_of::<HashDirectoryPageData>() <= PAGE_SIZE);

/// View over the directory page. Like the bucket view it points straight
/// into the frame's bytes and must not outlive the pin on its frame.
pub struct HashDirectoryPage {
    data: *mut HashDirectoryPageData,
    latch: Arc<Latch>,
}

impl HashDirectoryPage {
    fn data(&self) -> &HashDirectoryPageData {
        unsafe { self.data.as_ref().unwrap() }
    }

    fn data_mut(&mut self) -> &mut HashDirectoryPageData {
        unsafe { self.data.as_mut().unwrap() }
    }

    /// Shared with the underlying page, see [`Page::get_latch`].
    #[allow(unused)]
    pub fn latch(&self) -> Arc<Latch> {
        self.latch.clone()
    }

    pub fn get_page_id(&self) -> PageId {
        self.data().page_id
    }

    pub fn set_page_id(&mut self, page_id: PageId) {
        self.data_mut().page_id = page_id;
    }

    pub fn get_lsn(&self) -> Lsn {
        self.data().lsn
    }

    pub fn set_lsn(&mut self, lsn: Lsn) {
        self.data_mut().lsn = lsn;
    }

    pub fn get_global_depth(&self) -> u32 {
        self.data().global_depth
    }

    pub fn global_depth_mask(&self) -> u32 {
        (1u32 << self.get_global_depth()) - 1
    }

    /// Number of defined directory slots.
    pub fn size(&self) -> u32 {
        1u32 << self.get_global_depth()
    }

    /// Doubles the directory by mirroring the defined prefix of both
    /// arrays into the next `size()` slots. Callers retarget specific
    /// slots afterwards.
    pub fn incr_global_depth(&mut self) {
        let size = self.size() as usize;
        assert!(
            size <= DIRECTORY_ARRAY_SIZE / 2,
            "directory cannot grow past its page"
        );
        let data = self.data_mut();
        data.local_depths.copy_within(0..size, size);
        data.bucket_page_ids.copy_within(0..size, size);
        data.global_depth += 1;
    }

    /// Callers must have made the upper half redundant first, see
    /// [`Self::can_shrink`].
    pub fn decr_global_depth(&mut self) {
        assert!(self.get_global_depth() > 0, "directory is already minimal");
        self.data_mut().global_depth -= 1;
    }

    pub fn get_bucket_page_id(&self, bucket_idx: u32) -> PageId {
        self.data().bucket_page_ids[bucket_idx as usize]
    }

    pub fn set_bucket_page_id(&mut self, bucket_idx: u32, bucket_page_id: PageId) {
        self.data_mut().bucket_page_ids[bucket_idx as usize] = bucket_page_id;
    }

    /// The sibling slot a split of `bucket_idx` would create: flip the
    /// highest bit of its local index range.
    pub fn get_split_image_index(&self, bucket_idx: u32) -> u32 {
        bucket_idx ^ self.get_local_high_bit(bucket_idx)
    }

    pub fn can_shrink(&self) -> bool {
        (0..self.size()).all(|bucket_idx| self.get_local_depth(bucket_idx) < self.get_global_depth())
    }

    pub fn get_local_depth(&self, bucket_idx: u32) -> u32 {
        self.data().local_depths[bucket_idx as usize] as u32
    }

    pub fn get_local_depth_mask(&self, bucket_idx: u32) -> u32 {
        (1u32 << self.get_local_depth(bucket_idx)) - 1
    }

    pub fn set_local_depth(&mut self, bucket_idx: u32, local_depth: u8) {
        assert!(local_depth as u32 <= self.get_global_depth());
        self.data_mut().local_depths[bucket_idx as usize] = local_depth;
    }

    pub fn incr_local_depth(&mut self, bucket_idx: u32) {
        assert!(self.get_local_depth(bucket_idx) < self.get_global_depth());
        self.data_mut().local_depths[bucket_idx as usize] += 1;
    }

    pub fn decr_local_depth(&mut self, bucket_idx: u32) {
        assert!(self.get_local_depth(bucket_idx) > 0);
        self.data_mut().local_depths[bucket_idx as usize] -= 1;
    }

    /// `0b100...` at the local-depth bit, or 0 when the depth is 0.
    pub fn get_local_high_bit(&self, bucket_idx: u32) -> u32 {
        (1u32 << self.get_local_depth(bucket_idx)) >> 1
    }

    /// Asserts the structural invariants: every local depth is bounded by
    /// the global depth, all slots sharing a bucket page agree on its
    /// local depth, and each page has exactly `2^(GD - LD)` referrers.
    pub fn verify_integrity(&self) {
        let mut page_id_to_count: HashMap<PageId, u32> = HashMap::new();
        let mut page_id_to_ld: HashMap<PageId, u32> = HashMap::new();

        for bucket_idx in 0..self.size() {
            let bucket_page_id = self.get_bucket_page_id(bucket_idx);
            let local_depth = self.get_local_depth(bucket_idx);
            assert!(
                local_depth <= self.get_global_depth(),
                "local depth above global depth at slot {bucket_idx}"
            );

            *page_id_to_count.entry(bucket_page_id).or_default() += 1;
            match page_id_to_ld.get(&bucket_page_id) {
                Some(&seen) => assert_eq!(
                    local_depth, seen,
                    "local depths disagree for page {bucket_page_id}"
                ),
                None => {
                    page_id_to_ld.insert(bucket_page_id, local_depth);
                }
            }
        }

        for (bucket_page_id, count) in page_id_to_count {
            let local_depth = page_id_to_ld[&bucket_page_id];
            let required = 1u32 << (self.get_global_depth() - local_depth);
            assert_eq!(
                count, required,
                "page {bucket_page_id} has {count} referrers, expected {required}"
            );
        }
    }
}

impl From<&mut Page> for HashDirectoryPage {
    fn from(page: &mut Page) -> Self {
        Self {
            data: page.data_ptr() as *mut HashDirectoryPageData,
            latch: page.get_latch().clone(),
        }
    }
}
