use crate::buffer_pool::ArcBufferPool;
use crate::errors::Error;
use crate::latch::Latch;
use crate::pages::indexes::extendible_hash::bucket_page::HashBucketPage;
use crate::pages::indexes::extendible_hash::directory_page::HashDirectoryPage;
use crate::pages::indexes::extendible_hash::{KeyComparator, KeyHasher, DIRECTORY_ARRAY_SIZE};
use crate::pages::PageId;
use crate::printdbg;
use anyhow::{bail, ensure, Result};
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Comparator for keys that already carry a total order.
#[derive(Clone, Copy, Debug, Default)]
pub struct OrdComparator;

impl<K: Ord> KeyComparator<K> for OrdComparator {
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering {
        lhs.cmp(rhs)
    }
}

/// Hashes keys with the standard library's default hasher.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultKeyHasher;

impl<K: Hash> KeyHasher<K> for DefaultKeyHasher {
    fn hash_key(&self, key: &K) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Clone, Copy)]
enum InsertOutcome {
    Inserted,
    Duplicate,
    BucketFull,
}

/// A disk-backed extendible hash index. All page access goes through the
/// buffer pool; the directory page maps the low bits of a key's hash to
/// the bucket page holding it, buckets split as they fill and merge back
/// as they drain.
///
/// Point reads and writes share the table latch and serialize per bucket
/// through the bucket page's own latch; splits and merges take the table
/// latch exclusively since they rewrite the directory.
pub struct ExtendibleHashTable<K, V, C, H> {
    directory_page_id: PageId,
    bpm: ArcBufferPool,
    comparator: C,
    hash_fn: H,
    table_latch: Latch,
    _marker: PhantomData<(K, V)>,
}

impl<K, V, C, H> ExtendibleHashTable<K, V, C, H>
where
    K: Copy + Default,
    V: Copy + Default + PartialEq,
    C: KeyComparator<K>,
    H: KeyHasher<K>,
{
    /// Builds a fresh index: a directory page plus one empty bucket at
    /// depth 0. Both pages are unpinned before this returns.
    pub fn new(bpm: ArcBufferPool, comparator: C, hash_fn: H) -> Result<Self> {
        let directory_page_id;
        let bucket_page_id;

        let mut dir: HashDirectoryPage = {
            let mut pool = bpm.lock();
            let frame = pool.new_page()?;
            directory_page_id = frame.get_page_id();
            frame.writer().into()
        };
        {
            let mut pool = bpm.lock();
            let frame = pool.new_page()?;
            bucket_page_id = frame.get_page_id();
        }

        dir.set_page_id(directory_page_id);
        dir.set_bucket_page_id(0, bucket_page_id);
        dir.set_local_depth(0, 0);

        {
            let mut pool = bpm.lock();
            assert!(pool.unpin_page(bucket_page_id, false));
            assert!(pool.unpin_page(directory_page_id, true));
        }

        printdbg!(
            "Hash index created, directory page {directory_page_id}, bucket 0 on page {bucket_page_id}"
        );

        Ok(Self {
            directory_page_id,
            bpm,
            comparator,
            hash_fn,
            table_latch: Latch::new(),
            _marker: PhantomData,
        })
    }

    /// Reattaches to an index persisted earlier; the directory page id is
    /// the only state a caller needs to keep.
    pub fn open(directory_page_id: PageId, bpm: ArcBufferPool, comparator: C, hash_fn: H) -> Self {
        Self {
            directory_page_id,
            bpm,
            comparator,
            hash_fn,
            table_latch: Latch::new(),
            _marker: PhantomData,
        }
    }

    pub fn directory_page_id(&self) -> PageId {
        self.directory_page_id
    }

    /// The user hash folded to the 32 bits the directory indexes with.
    fn hash(&self, key: &K) -> u32 {
        self.hash_fn.hash_key(key) as u32
    }

    fn key_to_directory_index(&self, key: &K, dir: &HashDirectoryPage) -> u32 {
        self.hash(key) & dir.global_depth_mask()
    }

    fn key_to_page_id(&self, key: &K, dir: &HashDirectoryPage) -> PageId {
        dir.get_bucket_page_id(self.key_to_directory_index(key, dir))
    }

    fn fetch_directory(&self) -> Result<HashDirectoryPage> {
        Ok(self
            .bpm
            .lock()
            .fetch_page(self.directory_page_id)?
            .writer()
            .into())
    }

    fn fetch_bucket(&self, bucket_page_id: PageId) -> Result<HashBucketPage<K, V>> {
        Ok(self.bpm.lock().fetch_page(bucket_page_id)?.writer().into())
    }

    fn unpin(&self, page_id: PageId, is_dirty: bool) {
        assert!(
            self.bpm.lock().unpin_page(page_id, is_dirty),
            "unpin of page {page_id} refused"
        );
    }

    /// Every value stored under `key`, in slot order of its bucket.
    pub fn get_value(&self, key: &K) -> Result<Vec<V>> {
        let _table = self.table_latch.rguard();

        let dir = self.fetch_directory()?;
        let bucket_page_id = self.key_to_page_id(key, &dir);
        let bucket = self.fetch_bucket(bucket_page_id)?;

        let mut result = Vec::new();
        {
            let latch = bucket.latch();
            let _page = latch.rguard();
            bucket.get_value(key, &self.comparator, &mut result);
        }

        self.unpin(self.directory_page_id, false);
        self.unpin(bucket_page_id, false);

        Ok(result)
    }

    /// Stores `(key, value)`. Duplicate pairs are rejected; a full bucket
    /// is split, growing the directory when it has no slack, and the
    /// insert retried until it lands or the directory cannot grow.
    pub fn insert(&self, key: K, value: V) -> Result<()> {
        loop {
            match self.try_insert(&key, &value)? {
                InsertOutcome::Inserted => return Ok(()),
                InsertOutcome::Duplicate => bail!(Error::EntryExists),
                InsertOutcome::BucketFull => {}
            }
            match self.split_insert(&key, &value)? {
                InsertOutcome::Inserted => return Ok(()),
                InsertOutcome::Duplicate => bail!(Error::EntryExists),
                // the split may have left every key in the old bucket;
                // go around again, the next round splits deeper
                InsertOutcome::BucketFull => {}
            }
        }
    }

    fn try_insert(&self, key: &K, value: &V) -> Result<InsertOutcome> {
        let _table = self.table_latch.rguard();

        let dir = self.fetch_directory()?;
        let bucket_page_id = self.key_to_page_id(key, &dir);
        let mut bucket = self.fetch_bucket(bucket_page_id)?;

        let outcome = {
            let latch = bucket.latch();
            let _page = latch.wguard();
            if bucket.is_full() {
                InsertOutcome::BucketFull
            } else if bucket.insert(*key, *value, &self.comparator) {
                InsertOutcome::Inserted
            } else {
                InsertOutcome::Duplicate
            }
        };

        self.unpin(self.directory_page_id, false);
        self.unpin(
            bucket_page_id,
            !matches!(outcome, InsertOutcome::BucketFull),
        );
        Ok(outcome)
    }

    /// Splits the bucket `key` maps to and retries. Runs with the table
    /// latch exclusive, so no page latches are needed.
    fn split_insert(&self, key: &K, value: &V) -> Result<InsertOutcome> {
        let _table = self.table_latch.wguard();

        let mut dir = self.fetch_directory()?;
        let bucket_idx = self.key_to_directory_index(key, &dir);
        let bucket_page_id = dir.get_bucket_page_id(bucket_idx);
        let mut bucket = self.fetch_bucket(bucket_page_id)?;

        // a remove may have made room while we waited for the write latch
        if !bucket.is_full() {
            let inserted = bucket.insert(*key, *value, &self.comparator);
            self.unpin(self.directory_page_id, false);
            self.unpin(bucket_page_id, true);
            return Ok(if inserted {
                InsertOutcome::Inserted
            } else {
                InsertOutcome::Duplicate
            });
        }

        if dir.get_local_depth(bucket_idx) == dir.get_global_depth()
            && dir.size() as usize > DIRECTORY_ARRAY_SIZE / 2
        {
            self.unpin(self.directory_page_id, false);
            self.unpin(bucket_page_id, false);
            bail!(Error::DirectoryFull);
        }

        // allocate the split image before touching the directory, so a
        // refused allocation leaves the table as it was
        let (split_page_id, mut split_bucket) = {
            let mut pool = self.bpm.lock();
            match pool.new_page() {
                Ok(frame) => {
                    let page_id = frame.get_page_id();
                    let view: HashBucketPage<K, V> = frame.writer().into();
                    (page_id, view)
                }
                Err(e) => {
                    assert!(pool.unpin_page(self.directory_page_id, false));
                    assert!(pool.unpin_page(bucket_page_id, false));
                    return Err(e);
                }
            }
        };

        if dir.get_local_depth(bucket_idx) < dir.get_global_depth() {
            dir.incr_local_depth(bucket_idx);
        } else {
            // grow first: the mirror copies the old depths, then the
            // target slot is raised past its fresh image
            dir.incr_global_depth();
            dir.incr_local_depth(bucket_idx);
        }

        let new_local_depth = dir.get_local_depth(bucket_idx) as u8;
        let split_bucket_idx = dir.get_split_image_index(bucket_idx);

        printdbg!(
            "Splitting bucket {bucket_idx} (page {bucket_page_id}) into slot {split_bucket_idx} (page {split_page_id})"
        );

        dir.set_bucket_page_id(split_bucket_idx, split_page_id);
        dir.set_local_depth(split_bucket_idx, new_local_depth);

        // retarget the image's slot family, then raise the surviving one
        let step = dir.get_local_high_bit(split_bucket_idx) << 1;
        let mut slot = split_bucket_idx & dir.get_local_depth_mask(split_bucket_idx);
        while slot < dir.size() {
            dir.set_bucket_page_id(slot, split_page_id);
            dir.set_local_depth(slot, new_local_depth);
            slot += step;
        }
        let mut slot = bucket_idx & dir.get_local_depth_mask(bucket_idx);
        while slot < dir.size() {
            dir.set_local_depth(slot, new_local_depth);
            slot += step;
        }

        assert!(bucket.is_full());
        assert!(split_bucket.is_empty());
        for slot in 0..HashBucketPage::<K, V>::CAPACITY {
            if bucket.is_readable(slot) {
                let slot_key = bucket.key_at(slot);
                let slot_value = bucket.value_at(slot);
                if self.key_to_page_id(&slot_key, &dir) != bucket_page_id {
                    split_bucket.insert(slot_key, slot_value, &self.comparator);
                    bucket.remove_at(slot);
                }
            }
        }

        self.unpin(self.directory_page_id, true);
        self.unpin(bucket_page_id, true);
        self.unpin(split_page_id, true);

        Ok(InsertOutcome::BucketFull)
    }

    /// Removes the exact `(key, value)` pair, then gives the emptied
    /// bucket (if any) a chance to merge with its split image.
    pub fn remove(&self, key: &K, value: &V) -> Result<()> {
        let removed = {
            let _table = self.table_latch.rguard();

            let dir = self.fetch_directory()?;
            let bucket_page_id = self.key_to_page_id(key, &dir);
            let mut bucket = self.fetch_bucket(bucket_page_id)?;

            let removed = {
                let latch = bucket.latch();
                let _page = latch.wguard();
                bucket.remove(key, value, &self.comparator)
            };

            self.unpin(bucket_page_id, true);
            self.unpin(self.directory_page_id, false);
            removed
        };

        // merge re-checks emptiness itself; even a failed remove may
        // follow a concurrent one that emptied the bucket
        self.merge(key)?;

        ensure!(removed, Error::EntryNotFound);
        Ok(())
    }

    /// Folds the (empty) bucket `key` maps to into its split image and
    /// shrinks the directory while every bucket has depth slack. Merging
    /// never cascades; later removes pick up what this one left.
    fn merge(&self, key: &K) -> Result<()> {
        let _table = self.table_latch.wguard();

        let mut dir = self.fetch_directory()?;
        let bucket_idx = self.key_to_directory_index(key, &dir);
        let bucket_page_id = dir.get_bucket_page_id(bucket_idx);
        let bucket = self.fetch_bucket(bucket_page_id)?;

        if dir.get_local_depth(bucket_idx) == 0 || !bucket.is_empty() {
            self.unpin(bucket_page_id, false);
            self.unpin(self.directory_page_id, false);
            return Ok(());
        }

        let split_bucket_idx = dir.get_split_image_index(bucket_idx);
        let split_page_id = dir.get_bucket_page_id(split_bucket_idx);
        assert_ne!(split_page_id, bucket_page_id, "bucket is its own image");

        if dir.get_local_depth(split_bucket_idx) != dir.get_local_depth(bucket_idx) {
            self.unpin(bucket_page_id, false);
            self.unpin(self.directory_page_id, false);
            return Ok(());
        }

        printdbg!(
            "Merging bucket {bucket_idx} (page {bucket_page_id}) into its image at slot {split_bucket_idx} (page {split_page_id})"
        );

        {
            let mut pool = self.bpm.lock();
            assert!(pool.unpin_page(bucket_page_id, false));
            assert!(
                pool.delete_page(bucket_page_id),
                "empty bucket page {bucket_page_id} still pinned"
            );
        }

        // both walks use the pre-merge step; the depths shift under us
        let mask = dir.get_local_depth_mask(bucket_idx);
        let step = dir.get_local_high_bit(bucket_idx) << 1;
        let mut slot = bucket_idx & mask;
        while slot < dir.size() {
            dir.set_bucket_page_id(slot, split_page_id);
            dir.decr_local_depth(slot);
            slot += step;
        }
        let mut slot = split_bucket_idx & dir.get_local_depth_mask(split_bucket_idx);
        while slot < dir.size() {
            dir.decr_local_depth(slot);
            slot += step;
        }

        while dir.can_shrink() {
            dir.decr_global_depth();
        }

        self.unpin(self.directory_page_id, true);
        Ok(())
    }

    pub fn global_depth(&self) -> Result<u32> {
        let _table = self.table_latch.rguard();

        let dir = self.fetch_directory()?;
        let global_depth = dir.get_global_depth();
        self.unpin(self.directory_page_id, false);

        Ok(global_depth)
    }

    /// Asserts the directory invariants, see
    /// [`HashDirectoryPage::verify_integrity`].
    pub fn verify_integrity(&self) -> Result<()> {
        let _table = self.table_latch.rguard();

        let dir = self.fetch_directory()?;
        dir.verify_integrity();
        self.unpin(self.directory_page_id, false);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer_pool::tests::test_arc_bpm;
    use crate::pages::indexes::extendible_hash::MAX_GLOBAL_DEPTH;
    use rand::prelude::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use std::thread;

    /// Passes small integer keys through untouched so tests can steer
    /// keys into chosen directory slots.
    struct IdentityHasher;

    impl KeyHasher<u64> for IdentityHasher {
        fn hash_key(&self, key: &u64) -> u64 {
            *key
        }
    }

    fn setup_table() -> ExtendibleHashTable<u64, u64, OrdComparator, IdentityHasher> {
        let bpm = test_arc_bpm(32);
        ExtendibleHashTable::new(bpm, OrdComparator, IdentityHasher).unwrap()
    }

    #[test]
    fn test_insert_and_get_single_pair() -> Result<()> {
        let table = setup_table();

        table.insert(42, 7)?;
        assert_eq!(table.get_value(&42)?, vec![7]);
        Ok(())
    }

    #[test]
    fn test_missing_key_reads_empty() -> Result<()> {
        let table = setup_table();

        table.insert(1, 1)?;
        assert!(table.get_value(&2)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_duplicate_insert() -> Result<()> {
        let table = setup_table();

        table.insert(5, 50)?;
        assert!(table.insert(5, 50).is_err());
        // rejection changes nothing; retrying rejects again
        assert!(table.insert(5, 50).is_err());
        assert_eq!(table.get_value(&5)?, vec![50]);

        // same key, different value is a second entry
        table.insert(5, 51)?;
        let mut values = table.get_value(&5)?;
        values.sort_unstable();
        assert_eq!(values, vec![50, 51]);
        Ok(())
    }

    #[test]
    fn test_remove_and_reinsert() -> Result<()> {
        let table = setup_table();

        assert!(table.remove(&9, &90).is_err());

        table.insert(9, 90)?;
        table.remove(&9, &90)?;
        assert!(table.get_value(&9)?.is_empty());
        assert!(table.remove(&9, &90).is_err());

        table.insert(9, 91)?;
        assert_eq!(table.get_value(&9)?, vec![91]);
        Ok(())
    }

    #[test]
    fn test_splits_preserve_every_entry() -> Result<()> {
        let table = setup_table();
        let count = 1500u64;

        for key in 0..count {
            table.insert(key, key * 3)?;
        }
        assert!(table.global_depth()? >= 2);
        table.verify_integrity()?;

        for key in 0..count {
            assert_eq!(table.get_value(&key)?, vec![key * 3]);
        }

        for key in (0..count).step_by(2) {
            table.remove(&key, &(key * 3))?;
        }
        table.verify_integrity()?;
        for key in 0..count {
            if key % 2 == 0 {
                assert!(table.get_value(&key)?.is_empty());
            } else {
                assert_eq!(table.get_value(&key)?, vec![key * 3]);
            }
        }
        Ok(())
    }

    #[test]
    fn test_colliding_keys_exhaust_the_directory() -> Result<()> {
        let table = setup_table();
        let capacity = HashBucketPage::<u64, u64>::CAPACITY as u64;

        // distinct keys, identical low 32 hash bits: splits cannot ever
        // separate them, so the directory grows to its cap and gives up
        for i in 0..capacity {
            table.insert(i << 32, i)?;
        }
        let overflow = capacity << 32;
        assert!(table.insert(overflow, capacity).is_err());

        assert_eq!(table.global_depth()?, MAX_GLOBAL_DEPTH);
        table.verify_integrity()?;
        for i in 0..capacity {
            assert_eq!(table.get_value(&(i << 32))?, vec![i]);
        }
        Ok(())
    }

    #[test]
    fn test_reopen_from_directory_page() -> Result<()> {
        let bpm = test_arc_bpm(16);
        let directory_page_id;
        {
            let table: ExtendibleHashTable<u64, u64, OrdComparator, DefaultKeyHasher> =
                ExtendibleHashTable::new(bpm.clone(), OrdComparator, DefaultKeyHasher)?;
            for key in 0..32u64 {
                table.insert(key, key * 2)?;
            }
            directory_page_id = table.directory_page_id();
        }

        let table: ExtendibleHashTable<u64, u64, OrdComparator, DefaultKeyHasher> =
            ExtendibleHashTable::open(directory_page_id, bpm, OrdComparator, DefaultKeyHasher);
        for key in 0..32u64 {
            assert_eq!(table.get_value(&key)?, vec![key * 2]);
        }
        Ok(())
    }

    /// A 1 KB key shrinks buckets to three slots, making directory moves
    /// observable with a handful of keys.
    #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    struct WideKey([u8; 1024]);

    impl WideKey {
        fn new(tag: u32) -> Self {
            let mut bytes = [0u8; 1024];
            bytes[..4].copy_from_slice(&tag.to_le_bytes());
            WideKey(bytes)
        }
    }

    impl Default for WideKey {
        fn default() -> Self {
            WideKey([0; 1024])
        }
    }

    struct PrefixHasher;

    impl KeyHasher<WideKey> for PrefixHasher {
        fn hash_key(&self, key: &WideKey) -> u64 {
            u32::from_le_bytes(key.0[..4].try_into().unwrap()) as u64
        }
    }

    #[test]
    fn test_split_growth_then_merge_shrink() -> Result<()> {
        let bpm = test_arc_bpm(16);
        let table: ExtendibleHashTable<WideKey, u64, OrdComparator, PrefixHasher> =
            ExtendibleHashTable::new(bpm, OrdComparator, PrefixHasher)?;

        assert_eq!(HashBucketPage::<WideKey, u64>::CAPACITY, 3);

        // 0, 2 and 4 fill the only bucket at depth 0
        for tag in [0u32, 2, 4] {
            table.insert(WideKey::new(tag), tag as u64)?;
        }
        assert_eq!(table.global_depth()?, 0);

        // 6 collides with everything on bit 0, so the first split moves
        // nothing; the retry splits on bit 1 and separates {2, 6}
        table.insert(WideKey::new(6), 6)?;
        assert_eq!(table.global_depth()?, 2);
        table.verify_integrity()?;
        for tag in [0u32, 2, 4, 6] {
            assert_eq!(table.get_value(&WideKey::new(tag))?, vec![tag as u64]);
        }

        // draining {2, 6} empties their bucket; it folds back into its
        // image and the directory halves
        table.remove(&WideKey::new(2), &2)?;
        table.remove(&WideKey::new(6), &6)?;
        assert_eq!(table.global_depth()?, 1);
        table.verify_integrity()?;

        // removing the rest collapses the directory completely
        table.remove(&WideKey::new(0), &0)?;
        table.remove(&WideKey::new(4), &4)?;
        assert_eq!(table.global_depth()?, 0);
        table.verify_integrity()?;

        for tag in [0u32, 2, 4, 6] {
            assert!(table.get_value(&WideKey::new(tag))?.is_empty());
        }

        // the collapsed table is still writable
        table.insert(WideKey::new(8), 8)?;
        assert_eq!(table.get_value(&WideKey::new(8))?, vec![8]);
        Ok(())
    }

    #[test]
    fn test_randomized_against_model() -> Result<()> {
        let bpm = test_arc_bpm(64);
        let table: ExtendibleHashTable<u64, u64, OrdComparator, DefaultKeyHasher> =
            ExtendibleHashTable::new(bpm, OrdComparator, DefaultKeyHasher)?;

        let mut rng = StdRng::seed_from_u64(0xda7aba5e);
        let mut model: HashMap<u64, HashSet<u64>> = HashMap::new();

        for round in 0..4000 {
            let key = rng.gen_range(0..512u64);
            match rng.gen_range(0..3) {
                0 => {
                    let value = rng.gen_range(0..4u64);
                    let fresh = model.entry(key).or_default().insert(value);
                    assert_eq!(table.insert(key, value).is_ok(), fresh);
                }
                1 => {
                    let value = rng.gen_range(0..4u64);
                    let present = model.get_mut(&key).map_or(false, |vs| vs.remove(&value));
                    assert_eq!(table.remove(&key, &value).is_ok(), present);
                }
                _ => {
                    let mut found = table.get_value(&key)?;
                    found.sort_unstable();
                    let mut expected: Vec<u64> =
                        model.get(&key).into_iter().flatten().copied().collect();
                    expected.sort_unstable();
                    assert_eq!(found, expected);
                }
            }
            if round % 64 == 0 {
                table.verify_integrity()?;
            }
        }
        table.verify_integrity()?;
        Ok(())
    }

    #[test]
    fn test_concurrent_inserts_and_reads() -> Result<()> {
        let bpm = test_arc_bpm(64);
        let table: Arc<ExtendibleHashTable<u64, u64, OrdComparator, DefaultKeyHasher>> =
            Arc::new(ExtendibleHashTable::new(bpm, OrdComparator, DefaultKeyHasher)?);

        thread::scope(|scope| {
            for t in 0..4u64 {
                let table = Arc::clone(&table);
                scope.spawn(move || {
                    for i in 0..200u64 {
                        let key = t * 1000 + i;
                        table.insert(key, key).unwrap();
                        assert_eq!(table.get_value(&key).unwrap(), vec![key]);
                    }
                });
            }
        });

        for t in 0..4u64 {
            for i in 0..200u64 {
                let key = t * 1000 + i;
                assert_eq!(table.get_value(&key)?, vec![key]);
            }
        }
        table.verify_integrity()?;
        Ok(())
    }

    #[test]
    fn test_concurrent_removes_leave_survivors() -> Result<()> {
        let bpm = test_arc_bpm(64);
        let table: Arc<ExtendibleHashTable<u64, u64, OrdComparator, DefaultKeyHasher>> =
            Arc::new(ExtendibleHashTable::new(bpm, OrdComparator, DefaultKeyHasher)?);

        for key in 0..800u64 {
            table.insert(key, key)?;
        }

        thread::scope(|scope| {
            for t in 0..4u64 {
                let table = Arc::clone(&table);
                // each worker clears a disjoint quarter
                scope.spawn(move || {
                    for i in 0..200u64 {
                        let key = t * 200 + i;
                        if key % 2 == 0 {
                            table.remove(&key, &key).unwrap();
                        }
                    }
                });
            }
        });

        for key in 0..800u64 {
            if key % 2 == 0 {
                assert!(table.get_value(&key)?.is_empty());
            } else {
                assert_eq!(table.get_value(&key)?, vec![key]);
            }
        }
        table.verify_integrity()?;
        Ok(())
    }
}
