pub mod bucket_page;
pub mod directory_page;

use crate::pages::PAGE_SIZE;
use std::cmp::Ordering;
use std::mem::size_of;

/// Upper bound on directory slots; fixes the directory page image size.
pub const DIRECTORY_ARRAY_SIZE: usize = 256;
/// The directory indexes with at most this many hashed bits.
pub const MAX_GLOBAL_DEPTH: u32 = 8;

const _: () = assert!(1usize << MAX_GLOBAL_DEPTH == DIRECTORY_ARRAY_SIZE);

/// Total order over keys. The hash table itself only relies on equality,
/// the full ordering is for callers that want to reuse the comparator.
pub trait KeyComparator<K> {
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering;
}

/// User hash over keys. The table folds the result down to 32 bits before
/// masking with the directory depth.
pub trait KeyHasher<K> {
    fn hash_key(&self, key: &K) -> u64;
}

/// Slots a bucket page can hold: one occupied bit, one readable bit and a
/// packed `(key, value)` image per slot, all fitted into a page.
pub const fn bucket_array_size<K, V>() -> usize {
    (4 * PAGE_SIZE) / (4 * (size_of::<K>() + size_of::<V>()) + 1)
}
