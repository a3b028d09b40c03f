use std::sync::Arc;
use parking_lot::Mutex;

use crate::common::types::{PageId, PagePtr};
use crate::storage::buffer::error::BufferPoolError;
use crate::storage::buffer::instance::BufferPoolInstance;
use crate::storage::buffer::BufferPool;
use crate::storage::disk::DiskManager;
use crate::wal::LogManager;

/// A buffer pool front that shards page ids across `N` independent instances
/// to cut latch contention.
///
/// Instance `i` owns exactly the page ids with `page_id % N == i`, which is
/// also how each instance allocates, so every per-page operation has a unique
/// home. `new_page` rotates a cursor across instances for allocation fairness.
pub struct ParallelBufferPool {
    instances: Vec<Arc<BufferPoolInstance>>,
    next_instance: Mutex<usize>,
}

impl ParallelBufferPool {
    pub fn new(
        num_instances: usize,
        pool_size: usize,
        disk_manager: Arc<DiskManager>,
    ) -> Self {
        Self::new_inner(num_instances, pool_size, disk_manager, None)
    }

    pub fn new_with_wal(
        num_instances: usize,
        pool_size: usize,
        disk_manager: Arc<DiskManager>,
        log_manager: Arc<LogManager>,
    ) -> Self {
        Self::new_inner(num_instances, pool_size, disk_manager, Some(log_manager))
    }

    fn new_inner(
        num_instances: usize,
        pool_size: usize,
        disk_manager: Arc<DiskManager>,
        log_manager: Option<Arc<LogManager>>,
    ) -> Self {
        assert!(num_instances > 0, "a pool needs at least one instance");

        let instances = (0..num_instances)
            .map(|i| {
                Arc::new(BufferPoolInstance::new_sharded(
                    pool_size,
                    num_instances as u32,
                    i as u32,
                    disk_manager.clone(),
                    log_manager.clone(),
                ))
            })
            .collect();

        Self {
            instances,
            next_instance: Mutex::new(0),
        }
    }

    /// The instance responsible for `page_id`
    fn instance_for(&self, page_id: PageId) -> &BufferPoolInstance {
        &self.instances[page_id as usize % self.instances.len()]
    }
}

impl BufferPool for ParallelBufferPool {
    fn fetch_page(&self, page_id: PageId) -> Result<PagePtr, BufferPoolError> {
        self.instance_for(page_id).fetch_page(page_id)
    }

    /// Try each instance once, starting at the rotating cursor; the cursor
    /// advances by one per call whether or not the allocation succeeded.
    fn new_page(&self) -> Result<(PagePtr, PageId), BufferPoolError> {
        let start = {
            let mut cursor = self.next_instance.lock();
            let start = *cursor;
            *cursor = (*cursor + 1) % self.instances.len();
            start
        };

        for offset in 0..self.instances.len() {
            let index = (start + offset) % self.instances.len();
            match self.instances[index].new_page() {
                Ok(result) => return Ok(result),
                Err(BufferPoolError::PoolExhausted) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(BufferPoolError::PoolExhausted)
    }

    fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> Result<(), BufferPoolError> {
        self.instance_for(page_id).unpin_page(page_id, is_dirty)
    }

    fn flush_page(&self, page_id: PageId) -> Result<(), BufferPoolError> {
        self.instance_for(page_id).flush_page(page_id)
    }

    fn delete_page(&self, page_id: PageId) -> Result<(), BufferPoolError> {
        self.instance_for(page_id).delete_page(page_id)
    }

    fn flush_all_pages(&self) -> Result<(), BufferPoolError> {
        for instance in &self.instances {
            instance.flush_all_pages()?;
        }
        Ok(())
    }

    fn contains_page(&self, page_id: PageId) -> bool {
        self.instance_for(page_id).contains_page(page_id)
    }

    fn pool_size(&self) -> usize {
        self.instances.iter().map(|i| i.pool_size()).sum()
    }
}
