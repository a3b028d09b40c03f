pub mod error;
pub mod instance;
pub mod parallel;
pub mod replacer;

pub use error::BufferPoolError;
pub use instance::BufferPoolInstance;
pub use parallel::ParallelBufferPool;

use crate::common::types::{PageId, PagePtr};

/// The buffer pool surface shared by a single instance and the sharded
/// parallel front. Index structures are written against this trait so they
/// work with either.
pub trait BufferPool: Send + Sync {
    /// Pin the frame holding `page_id`, reading it from disk on a miss
    fn fetch_page(&self, page_id: PageId) -> Result<PagePtr, BufferPoolError>;

    /// Allocate a fresh page id and pin a zeroed frame for it
    fn new_page(&self) -> Result<(PagePtr, PageId), BufferPoolError>;

    /// Drop one pin, recording whether the caller modified the page
    fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> Result<(), BufferPoolError>;

    /// Write a resident page's payload to disk
    fn flush_page(&self, page_id: PageId) -> Result<(), BufferPoolError>;

    /// Delete a page; vacuous when not resident, refused while pinned
    fn delete_page(&self, page_id: PageId) -> Result<(), BufferPoolError>;

    /// Write every resident page to disk
    fn flush_all_pages(&self) -> Result<(), BufferPoolError>;

    /// Whether the page currently occupies a frame
    fn contains_page(&self, page_id: PageId) -> bool;

    /// Total number of frames
    fn pool_size(&self) -> usize;
}
