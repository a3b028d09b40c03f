use log::debug;

use crate::index::hash::error::HashTableError;
use crate::index::hash::hasher::KeyHasher;
use crate::index::hash::table::ExtendibleHashTable;
use crate::storage::buffer::BufferPool;
use crate::storage::page::FixedCodec;
use crate::transaction::Transaction;

impl<K, V, H, P> ExtendibleHashTable<K, V, H, P>
where
    K: FixedCodec + Ord + Default,
    V: FixedCodec + PartialEq + Default,
    H: KeyHasher<K>,
    P: BufferPool,
{
    /// Remove the exact `(key, value)` pair.
    ///
    /// Returns `Ok(false)` when the pair is not present. Emptying a bucket
    /// triggers a merge with its split image, which reacquires the latch.
    pub fn remove(&self, txn: &Transaction, key: &K, value: &V) -> Result<bool, HashTableError> {
        let emptied = {
            let _guard = self.table_latch.write();

            let (_directory_page, directory) = self.fetch_directory()?;
            let bucket_idx = self.bucket_index(key, &directory);
            let bucket_page_id = directory.bucket_page_id(bucket_idx);
            let (bucket_page, mut bucket) = self.fetch_bucket(bucket_page_id)?;

            let removed = bucket.remove(key, value);
            if removed {
                bucket.store(&mut bucket_page.write());
            }
            let emptied = removed && bucket.is_empty();

            self.buffer_pool.unpin_page(bucket_page_id, removed)?;
            self.buffer_pool.unpin_page(self.directory_page_id, false)?;

            if !removed {
                return Ok(false);
            }
            emptied
        };

        if emptied {
            self.merge(txn, key)?;
        }

        Ok(true)
    }

    /// Coalesce the (still) empty bucket for `key` into its split image and
    /// shrink the directory as far as it allows.
    ///
    /// Merging requires the bucket and its split image to distinguish the
    /// same number of bits; otherwise the directory is left unchanged.
    fn merge(&self, _txn: &Transaction, key: &K) -> Result<(), HashTableError> {
        let _guard = self.table_latch.write();

        let (directory_page, mut directory) = self.fetch_directory()?;
        let bucket_idx = self.bucket_index(key, &directory);
        let bucket_page_id = directory.bucket_page_id(bucket_idx);

        let local_depth = directory.local_depth(bucket_idx);
        if local_depth == 0 {
            self.buffer_pool.unpin_page(self.directory_page_id, false)?;
            return Ok(());
        }

        // The latch was dropped between remove and merge; someone may have
        // refilled the bucket in the window
        let (_bucket_page, bucket) = self.fetch_bucket(bucket_page_id)?;
        let still_empty = bucket.is_empty();
        self.buffer_pool.unpin_page(bucket_page_id, false)?;
        if !still_empty {
            self.buffer_pool.unpin_page(self.directory_page_id, false)?;
            return Ok(());
        }

        let image_idx = directory.split_image_index(bucket_idx);
        let image_page_id = directory.bucket_page_id(image_idx);
        if directory.local_depth(image_idx) != local_depth || image_page_id == bucket_page_id {
            self.buffer_pool.unpin_page(self.directory_page_id, false)?;
            return Ok(());
        }

        debug!(
            "merging empty bucket page {} into split image {}",
            bucket_page_id, image_page_id
        );

        // Repoint every slot of the empty bucket, then drop one distinguished
        // bit from the coalesced bucket's slots
        for i in 0..directory.size() {
            if directory.bucket_page_id(i) == bucket_page_id {
                directory.set_bucket_page_id(i, image_page_id);
            }
        }
        for i in 0..directory.size() {
            if directory.bucket_page_id(i) == image_page_id {
                directory.set_local_depth(i, local_depth - 1);
            }
        }

        self.buffer_pool.delete_page(bucket_page_id)?;

        while directory.can_shrink() {
            directory.decr_global_depth();
        }

        directory.verify_integrity();
        directory.store(&mut directory_page.write());
        self.buffer_pool.unpin_page(self.directory_page_id, true)?;

        Ok(())
    }
}
