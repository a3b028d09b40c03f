use log::debug;

use crate::common::types::{PageId, PagePtr};
use crate::index::hash::error::HashTableError;
use crate::index::hash::hasher::KeyHasher;
use crate::index::hash::table::ExtendibleHashTable;
use crate::storage::buffer::BufferPool;
use crate::storage::page::{FixedCodec, HashBucketPage, HashDirectoryPage, MAX_DEPTH};
use crate::transaction::Transaction;

impl<K, V, H, P> ExtendibleHashTable<K, V, H, P>
where
    K: FixedCodec + Ord + Default,
    V: FixedCodec + PartialEq + Default,
    H: KeyHasher<K>,
    P: BufferPool,
{
    /// Insert a `(key, value)` pair.
    ///
    /// Returns `Ok(false)` when the exact pair is already present. A full
    /// target bucket splits, doubling the directory when the bucket already
    /// distinguishes `global_depth` bits; a bucket that stays full at
    /// `MAX_DEPTH` fails with `CapacityExhausted`.
    pub fn insert(&self, _txn: &Transaction, key: &K, value: &V) -> Result<bool, HashTableError> {
        let _guard = self.table_latch.write();

        let (directory_page, mut directory) = self.fetch_directory()?;
        let mut directory_dirty = false;

        // Splitting may need several rounds when the redistributed pairs all
        // land back in one half; every round raises the target bucket's local
        // depth, so the loop is bounded by MAX_DEPTH.
        let result = loop {
            let bucket_idx = self.bucket_index(key, &directory);
            let bucket_page_id = directory.bucket_page_id(bucket_idx);
            let (bucket_page, mut bucket) = match self.fetch_bucket(bucket_page_id) {
                Ok(fetched) => fetched,
                Err(e) => break Err(e),
            };

            if !bucket.is_full() {
                let inserted = bucket.insert(key, value);
                if inserted {
                    bucket.store(&mut bucket_page.write());
                }
                self.buffer_pool.unpin_page(bucket_page_id, inserted)?;
                break Ok(inserted);
            }

            if bucket.contains(key, value) {
                self.buffer_pool.unpin_page(bucket_page_id, false)?;
                break Ok(false);
            }

            if directory.local_depth(bucket_idx) >= MAX_DEPTH {
                self.buffer_pool.unpin_page(bucket_page_id, false)?;
                break Err(HashTableError::CapacityExhausted);
            }

            match self.split_bucket(
                &mut directory,
                &directory_page,
                bucket_idx,
                bucket_page_id,
                &bucket_page,
                &mut bucket,
            ) {
                Ok(()) => directory_dirty = true,
                Err(e) => break Err(e),
            }
        };

        self.buffer_pool.unpin_page(self.directory_page_id, directory_dirty)?;

        result
    }

    /// Split the full bucket at `bucket_idx`, redistributing its pairs
    /// between itself and a freshly allocated split image.
    ///
    /// The whole rehash happens here, under the write latch the caller
    /// already holds; nothing re-enters the public insert path. On success
    /// the split is fully applied, directory page included; the old bucket
    /// page is unpinned on every path out of this function.
    fn split_bucket(
        &self,
        directory: &mut HashDirectoryPage,
        directory_page: &PagePtr,
        bucket_idx: usize,
        bucket_page_id: PageId,
        bucket_page: &PagePtr,
        bucket: &mut HashBucketPage<K, V>,
    ) -> Result<(), HashTableError> {
        // Allocate the image bucket before any directory mutation, so a
        // failed allocation leaves the index untouched
        let (image_page, image_page_id) = match self.buffer_pool.new_page() {
            Ok(allocated) => allocated,
            Err(e) => {
                self.buffer_pool.unpin_page(bucket_page_id, false)?;
                return Err(e.into());
            }
        };

        let old_depth = directory.local_depth(bucket_idx);
        if old_depth == directory.global_depth() {
            directory.incr_global_depth();
        }

        debug!(
            "splitting bucket page {} (depth {} -> {}), new image page {}",
            bucket_page_id,
            old_depth,
            old_depth + 1,
            image_page_id
        );

        let new_depth = old_depth + 1;
        let old_mask = (1usize << old_depth) - 1;
        let depth_bit = 1usize << old_depth;
        let low_bits = bucket_idx & old_mask;

        // Every slot that referenced the old bucket now distinguishes one
        // more bit; the half with the new bit set moves to the image
        for i in 0..directory.size() {
            if i & old_mask == low_bits {
                directory.set_local_depth(i, new_depth);
                if i & depth_bit != 0 {
                    directory.set_bucket_page_id(i, image_page_id);
                }
            }
        }

        let pairs = bucket.get_all();
        bucket.clear();
        let mut image = HashBucketPage::<K, V>::new();
        for (k, v) in &pairs {
            if self.hash(k) as usize & depth_bit != 0 {
                image.insert(k, v);
            } else {
                bucket.insert(k, v);
            }
        }

        bucket.store(&mut bucket_page.write());
        image.store(&mut image_page.write());
        directory.verify_integrity();
        directory.store(&mut directory_page.write());

        self.buffer_pool.unpin_page(bucket_page_id, true)?;
        self.buffer_pool.unpin_page(image_page_id, true)?;

        Ok(())
    }
}
