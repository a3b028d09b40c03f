mod deletion;
mod operations;

use std::marker::PhantomData;
use std::sync::Arc;
use parking_lot::RwLock;

use crate::common::types::{PageId, PagePtr};
use crate::index::hash::error::HashTableError;
use crate::index::hash::hasher::KeyHasher;
use crate::storage::buffer::BufferPool;
use crate::storage::page::{FixedCodec, HashBucketPage, HashDirectoryPage};
use crate::transaction::Transaction;

/// Extendible hash table index, layered over the buffer pool.
///
/// The directory page maps the low `global_depth` bits of a key's hash to a
/// bucket page; buckets split when full and merge with their split image when
/// emptied, growing and shrinking the directory as needed.
///
/// One table-wide reader/writer latch guards the directory-to-bucket mapping:
/// lookups share the read side, every mutation (including split and merge)
/// holds the write side.
pub struct ExtendibleHashTable<K, V, H, P> {
    pub(crate) buffer_pool: Arc<P>,
    pub(crate) directory_page_id: PageId,
    pub(crate) hasher: H,
    pub(crate) table_latch: RwLock<()>,
    pub(crate) _phantom: PhantomData<(K, V)>,
}

impl<K, V, H, P> ExtendibleHashTable<K, V, H, P>
where
    K: FixedCodec + Ord + Default,
    V: FixedCodec + PartialEq + Default,
    H: KeyHasher<K>,
    P: BufferPool,
{
    /// Create a new table: allocates the directory page and the single
    /// initial bucket (directory index 0, depth 0).
    pub fn new(buffer_pool: Arc<P>, hasher: H) -> Result<Self, HashTableError> {
        let (directory_page, directory_page_id) = buffer_pool.new_page()?;
        // A zeroed page is a valid empty bucket, so the bucket needs no init
        let (_bucket_page, bucket_page_id) = buffer_pool.new_page()?;

        let mut directory = HashDirectoryPage::new(directory_page_id);
        directory.set_bucket_page_id(0, bucket_page_id);
        directory.store(&mut directory_page.write());
        directory.verify_integrity();

        buffer_pool.unpin_page(directory_page_id, true)?;
        buffer_pool.unpin_page(bucket_page_id, true)?;

        Ok(Self {
            buffer_pool,
            directory_page_id,
            hasher,
            table_latch: RwLock::new(()),
            _phantom: PhantomData,
        })
    }

    /// The page id of the directory, fixed for the table's lifetime
    pub fn directory_page_id(&self) -> PageId {
        self.directory_page_id
    }

    /// Collect every value stored under `key`
    pub fn get_value(&self, _txn: &Transaction, key: &K) -> Result<Vec<V>, HashTableError> {
        let _guard = self.table_latch.read();

        let (_directory_page, directory) = self.fetch_directory()?;
        let bucket_idx = self.bucket_index(key, &directory);
        let bucket_page_id = directory.bucket_page_id(bucket_idx);

        let (_bucket_page, bucket) = self.fetch_bucket(bucket_page_id)?;

        let mut result = Vec::new();
        bucket.get_value(key, &mut result);

        self.buffer_pool.unpin_page(bucket_page_id, false)?;
        self.buffer_pool.unpin_page(self.directory_page_id, false)?;

        Ok(result)
    }

    /// Current directory depth
    pub fn global_depth(&self) -> Result<u32, HashTableError> {
        let _guard = self.table_latch.read();

        let (_directory_page, directory) = self.fetch_directory()?;
        let depth = directory.global_depth();
        self.buffer_pool.unpin_page(self.directory_page_id, false)?;

        Ok(depth)
    }

    /// Assert the directory invariants; panics on violation
    pub fn verify_integrity(&self) -> Result<(), HashTableError> {
        let _guard = self.table_latch.read();

        let (_directory_page, directory) = self.fetch_directory()?;
        directory.verify_integrity();
        self.buffer_pool.unpin_page(self.directory_page_id, false)?;

        Ok(())
    }

    /// Downcast the hash capability to the 32 bits the directory indexes by
    pub(crate) fn hash(&self, key: &K) -> u32 {
        self.hasher.hash_key(key)
    }

    /// The live directory slot for `key`
    pub(crate) fn bucket_index(&self, key: &K, directory: &HashDirectoryPage) -> usize {
        (self.hash(key) & directory.global_depth_mask()) as usize
    }

    /// Fetch and decode the directory page, leaving it pinned
    pub(crate) fn fetch_directory(
        &self,
    ) -> Result<(PagePtr, HashDirectoryPage), HashTableError> {
        let page = self.buffer_pool.fetch_page(self.directory_page_id)?;
        let directory = HashDirectoryPage::load(&page.read());
        Ok((page, directory))
    }

    /// Fetch and decode a bucket page, leaving it pinned
    pub(crate) fn fetch_bucket(
        &self,
        bucket_page_id: PageId,
    ) -> Result<(PagePtr, HashBucketPage<K, V>), HashTableError> {
        let page = self.buffer_pool.fetch_page(bucket_page_id)?;
        let bucket = HashBucketPage::load(&page.read());
        Ok((page, bucket))
    }
}
