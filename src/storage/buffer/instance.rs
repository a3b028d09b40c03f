use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use log::debug;
use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::common::types::{Frame, FrameId, FramePtr, Lsn, Page, PageId, PagePtr, INVALID_PAGE_ID};
use crate::storage::buffer::error::BufferPoolError;
use crate::storage::buffer::replacer::LruReplacer;
use crate::storage::buffer::BufferPool;
use crate::storage::disk::DiskManager;
use crate::wal::LogManager;

/// State guarded by the instance latch: the frame table, the free list and
/// the allocation cursor. Every public operation holds this for its entire
/// body, disk I/O included; the coarse latch is deliberate.
struct PoolCore {
    page_table: HashMap<PageId, FrameId>,
    free_list: VecDeque<FrameId>,
    next_page_id: PageId,
}

/// One buffer pool instance: a fixed array of frames fronting the disk
/// manager, with LRU replacement over unpinned frames.
///
/// When the instance is part of a parallel pool it owns exactly the page ids
/// congruent to `instance_index` modulo `num_instances`; allocation hands out
/// `instance_index, instance_index + num_instances, ...` so routing by
/// `page_id % num_instances` always finds the owner.
pub struct BufferPoolInstance {
    pool_size: usize,
    num_instances: u32,
    instance_index: u32,
    frames: Vec<FramePtr>,
    core: Mutex<PoolCore>,
    replacer: LruReplacer,
    disk_manager: Arc<DiskManager>,
    log_manager: Option<Arc<LogManager>>,
}

impl BufferPoolInstance {
    /// Create a standalone instance (a parallel pool of one)
    pub fn new(pool_size: usize, disk_manager: Arc<DiskManager>) -> Self {
        Self::new_sharded(pool_size, 1, 0, disk_manager, None)
    }

    /// Create a standalone instance with a WAL sink attached
    pub fn new_with_wal(
        pool_size: usize,
        disk_manager: Arc<DiskManager>,
        log_manager: Arc<LogManager>,
    ) -> Self {
        Self::new_sharded(pool_size, 1, 0, disk_manager, Some(log_manager))
    }

    /// Create instance `instance_index` of a pool of `num_instances`
    pub fn new_sharded(
        pool_size: usize,
        num_instances: u32,
        instance_index: u32,
        disk_manager: Arc<DiskManager>,
        log_manager: Option<Arc<LogManager>>,
    ) -> Self {
        assert!(num_instances > 0, "a pool needs at least one instance");
        assert!(
            instance_index < num_instances,
            "instance index {} out of range for {} instances",
            instance_index,
            num_instances
        );

        let mut frames = Vec::with_capacity(pool_size);
        let mut free_list = VecDeque::with_capacity(pool_size);

        for frame_id in 0..pool_size {
            let page = Arc::new(RwLock::new(Page::new(INVALID_PAGE_ID)));
            frames.push(Arc::new(RwLock::new(Frame::new(frame_id, page))));
            free_list.push_back(frame_id);
        }

        Self {
            pool_size,
            num_instances,
            instance_index,
            frames,
            core: Mutex::new(PoolCore {
                page_table: HashMap::new(),
                free_list,
                next_page_id: instance_index,
            }),
            replacer: LruReplacer::new(pool_size),
            disk_manager,
            log_manager,
        }
    }

    /// Fetch a page, pinning its frame. Reads from disk on a miss.
    pub fn fetch_page(&self, page_id: PageId) -> Result<PagePtr, BufferPoolError> {
        if page_id == INVALID_PAGE_ID {
            return Err(BufferPoolError::InvalidPageId);
        }

        let mut core = self.core.lock();

        // Hit: pin and return
        if let Some(&frame_id) = core.page_table.get(&page_id) {
            let frame = &self.frames[frame_id];
            let mut frame_guard = frame.write();
            frame_guard.pin_count += 1;
            self.replacer.pin(frame_id);
            return Ok(frame_guard.page.clone());
        }

        // Miss: claim a frame, retire whatever lived there, read from disk
        let frame_id = self
            .claim_frame(&mut core)
            .ok_or(BufferPoolError::PoolExhausted)?;
        self.retire_resident(&mut core, frame_id)?;

        let frame = &self.frames[frame_id];
        let mut frame_guard = frame.write();

        {
            let mut page_guard = frame_guard.page.write();
            if let Err(e) = self.disk_manager.read_page(page_id, &mut page_guard) {
                // The frame holds nothing now; hand it back before bailing out
                page_guard.page_id = INVALID_PAGE_ID;
                drop(page_guard);
                drop(frame_guard);
                core.free_list.push_front(frame_id);
                return Err(e.into());
            }
        }

        frame_guard.pin_count = 1;
        frame_guard.is_dirty = false;
        self.replacer.pin(frame_id);
        core.page_table.insert(page_id, frame_id);

        Ok(frame_guard.page.clone())
    }

    /// Allocate a fresh page id and pin a zeroed frame for it.
    ///
    /// The blank page is written to disk eagerly so the allocated id is
    /// durable even if it is never modified.
    pub fn new_page(&self) -> Result<(PagePtr, PageId), BufferPoolError> {
        let mut core = self.core.lock();

        if self.all_frames_pinned() {
            return Err(BufferPoolError::PoolExhausted);
        }

        let frame_id = self
            .claim_frame(&mut core)
            .ok_or(BufferPoolError::PoolExhausted)?;
        self.retire_resident(&mut core, frame_id)?;

        let page_id = self.allocate_page(&mut core);

        let frame = &self.frames[frame_id];
        let mut frame_guard = frame.write();

        {
            let mut page_guard = frame_guard.page.write();
            page_guard.page_id = page_id;
            page_guard.lsn = 0;
            page_guard.reset_data();
            if let Err(e) = self.disk_manager.write_page(page_id, &page_guard.data) {
                page_guard.page_id = INVALID_PAGE_ID;
                drop(page_guard);
                drop(frame_guard);
                core.free_list.push_front(frame_id);
                return Err(e.into());
            }
        }

        frame_guard.pin_count = 1;
        frame_guard.is_dirty = false;
        self.replacer.pin(frame_id);
        core.page_table.insert(page_id, frame_id);

        Ok((frame_guard.page.clone(), page_id))
    }

    /// Drop one pin on a resident page, recording whether the caller wrote it
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> Result<(), BufferPoolError> {
        let core = self.core.lock();

        let &frame_id = core
            .page_table
            .get(&page_id)
            .ok_or(BufferPoolError::PageNotFound(page_id))?;

        let frame = &self.frames[frame_id];
        let mut frame_guard = frame.write();

        if frame_guard.pin_count == 0 {
            return Err(BufferPoolError::PageNotPinned(page_id));
        }

        if is_dirty {
            frame_guard.is_dirty = true;
        }

        frame_guard.pin_count -= 1;
        if frame_guard.pin_count == 0 {
            self.replacer.unpin(frame_id);
        }

        Ok(())
    }

    /// Write a resident page's payload to disk. The dirty flag is left as-is.
    pub fn flush_page(&self, page_id: PageId) -> Result<(), BufferPoolError> {
        if page_id == INVALID_PAGE_ID {
            return Err(BufferPoolError::InvalidPageId);
        }

        let core = self.core.lock();

        let &frame_id = core
            .page_table
            .get(&page_id)
            .ok_or(BufferPoolError::PageNotFound(page_id))?;

        let frame = &self.frames[frame_id];
        let frame_guard = frame.read();
        let page_guard = frame_guard.page.read();

        self.flush_wal_up_to(page_guard.lsn);
        self.disk_manager.write_page(page_id, &page_guard.data)?;

        Ok(())
    }

    /// Write every resident page to disk
    pub fn flush_all_pages(&self) -> Result<(), BufferPoolError> {
        let core = self.core.lock();

        for (&page_id, &frame_id) in core.page_table.iter() {
            let frame = &self.frames[frame_id];
            let frame_guard = frame.read();
            let page_guard = frame_guard.page.read();

            self.flush_wal_up_to(page_guard.lsn);
            self.disk_manager.write_page(page_id, &page_guard.data)?;
        }

        Ok(())
    }

    /// Delete a page. Vacuously succeeds when the page is not resident;
    /// refuses while anyone holds a pin.
    pub fn delete_page(&self, page_id: PageId) -> Result<(), BufferPoolError> {
        let mut core = self.core.lock();

        let frame_id = match core.page_table.get(&page_id) {
            Some(&frame_id) => frame_id,
            None => return Ok(()),
        };

        let frame = &self.frames[frame_id];
        let mut frame_guard = frame.write();

        if frame_guard.pin_count > 0 {
            return Err(BufferPoolError::PagePinned(page_id));
        }

        if frame_guard.is_dirty {
            let page_guard = frame_guard.page.read();
            self.flush_wal_up_to(page_guard.lsn);
            self.disk_manager.write_page(page_id, &page_guard.data)?;
        }

        self.disk_manager.deallocate_page(page_id);

        core.page_table.remove(&page_id);
        {
            let mut page_guard = frame_guard.page.write();
            page_guard.page_id = INVALID_PAGE_ID;
            page_guard.lsn = 0;
            page_guard.reset_data();
        }
        frame_guard.is_dirty = false;
        frame_guard.pin_count = 0;

        self.replacer.pin(frame_id);
        core.free_list.push_back(frame_id);

        Ok(())
    }

    /// Whether the page currently occupies a frame
    pub fn contains_page(&self, page_id: PageId) -> bool {
        self.core.lock().page_table.contains_key(&page_id)
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Pick a frame for an incoming page: free list first, then the replacer
    fn claim_frame(&self, core: &mut MutexGuard<'_, PoolCore>) -> Option<FrameId> {
        if let Some(frame_id) = core.free_list.pop_front() {
            return Some(frame_id);
        }
        self.replacer.victim()
    }

    /// Write back and unmap whatever page currently lives in `frame_id`.
    /// The dirty payload goes out under its old page id, before the frame's
    /// identity is overwritten.
    fn retire_resident(
        &self,
        core: &mut MutexGuard<'_, PoolCore>,
        frame_id: FrameId,
    ) -> Result<(), BufferPoolError> {
        let frame = &self.frames[frame_id];
        let mut frame_guard = frame.write();

        let old_page_id = frame_guard.page.read().page_id;
        if old_page_id == INVALID_PAGE_ID {
            return Ok(());
        }

        if frame_guard.is_dirty {
            debug!("evicting dirty page {} from frame {}", old_page_id, frame_id);
            let page_guard = frame_guard.page.read();
            self.flush_wal_up_to(page_guard.lsn);
            self.disk_manager.write_page(old_page_id, &page_guard.data)?;
        }

        frame_guard.is_dirty = false;
        frame_guard.pin_count = 0;
        core.page_table.remove(&old_page_id);

        Ok(())
    }

    /// Hand out the next page id owned by this instance
    fn allocate_page(&self, core: &mut MutexGuard<'_, PoolCore>) -> PageId {
        let page_id = core.next_page_id;
        core.next_page_id += self.num_instances;
        // Allocated ids must route back to this instance; a mismatch is a bug,
        // not a recoverable condition.
        assert_eq!(
            page_id % self.num_instances,
            self.instance_index,
            "allocated page id {} does not belong to instance {} of {}",
            page_id,
            self.instance_index,
            self.num_instances
        );
        page_id
    }

    fn all_frames_pinned(&self) -> bool {
        self.frames
            .iter()
            .all(|frame| frame.read().pin_count > 0)
    }

    /// WAL-before-data: make log records durable up to the page's LSN before
    /// its payload reaches disk
    fn flush_wal_up_to(&self, lsn: Lsn) {
        if let Some(ref log_manager) = self.log_manager {
            log_manager.flush_till_lsn(lsn);
        }
    }
}

impl BufferPool for BufferPoolInstance {
    fn fetch_page(&self, page_id: PageId) -> Result<PagePtr, BufferPoolError> {
        BufferPoolInstance::fetch_page(self, page_id)
    }

    fn new_page(&self) -> Result<(PagePtr, PageId), BufferPoolError> {
        BufferPoolInstance::new_page(self)
    }

    fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> Result<(), BufferPoolError> {
        BufferPoolInstance::unpin_page(self, page_id, is_dirty)
    }

    fn flush_page(&self, page_id: PageId) -> Result<(), BufferPoolError> {
        BufferPoolInstance::flush_page(self, page_id)
    }

    fn delete_page(&self, page_id: PageId) -> Result<(), BufferPoolError> {
        BufferPoolInstance::delete_page(self, page_id)
    }

    fn flush_all_pages(&self) -> Result<(), BufferPoolError> {
        BufferPoolInstance::flush_all_pages(self)
    }

    fn contains_page(&self, page_id: PageId) -> bool {
        BufferPoolInstance::contains_page(self, page_id)
    }

    fn pool_size(&self) -> usize {
        BufferPoolInstance::pool_size(self)
    }
}
