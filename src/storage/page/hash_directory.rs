use std::collections::HashMap;
use byteorder::{ByteOrder, LittleEndian};

use crate::common::types::{Page, PageId};

/// Maximum directory depth; the directory never outgrows one page
pub const MAX_DEPTH: u32 = 9;

/// Backing array length, `1 << MAX_DEPTH`
pub const DIRECTORY_ARRAY_SIZE: usize = 1 << MAX_DEPTH;

/// In-memory image of the extendible hash table's directory page.
///
/// On-disk layout, packed little-endian:
///
/// ```text
/// | lsn: u32 | page_id: u32 | global_depth: u32
/// | local_depths: u8[512] | bucket_page_ids: u32[512] |
/// ```
///
/// Only the first `1 << global_depth` entries are live. Two live indices
/// whose low `local_depth` bits agree reference the same bucket page.
pub struct HashDirectoryPage {
    page_id: PageId,
    lsn: u32,
    global_depth: u32,
    local_depths: [u8; DIRECTORY_ARRAY_SIZE],
    bucket_page_ids: [PageId; DIRECTORY_ARRAY_SIZE],
}

impl HashDirectoryPage {
    /// A fresh directory of depth zero
    pub fn new(page_id: PageId) -> Self {
        Self {
            page_id,
            lsn: 0,
            global_depth: 0,
            local_depths: [0; DIRECTORY_ARRAY_SIZE],
            bucket_page_ids: [0; DIRECTORY_ARRAY_SIZE],
        }
    }

    /// Decode a directory from a page's payload
    pub fn load(page: &Page) -> Self {
        let data = &page.data;

        let lsn = LittleEndian::read_u32(&data[0..4]);
        let page_id = LittleEndian::read_u32(&data[4..8]);
        let global_depth = LittleEndian::read_u32(&data[8..12]);

        let mut local_depths = [0u8; DIRECTORY_ARRAY_SIZE];
        local_depths.copy_from_slice(&data[12..12 + DIRECTORY_ARRAY_SIZE]);

        let mut bucket_page_ids = [0 as PageId; DIRECTORY_ARRAY_SIZE];
        let base = 12 + DIRECTORY_ARRAY_SIZE;
        for (i, slot) in bucket_page_ids.iter_mut().enumerate() {
            *slot = LittleEndian::read_u32(&data[base + i * 4..base + i * 4 + 4]);
        }

        Self {
            page_id,
            lsn,
            global_depth,
            local_depths,
            bucket_page_ids,
        }
    }

    /// Encode the directory into a page's payload
    pub fn store(&self, page: &mut Page) {
        let data = &mut page.data;

        LittleEndian::write_u32(&mut data[0..4], self.lsn);
        LittleEndian::write_u32(&mut data[4..8], self.page_id);
        LittleEndian::write_u32(&mut data[8..12], self.global_depth);

        data[12..12 + DIRECTORY_ARRAY_SIZE].copy_from_slice(&self.local_depths);

        let base = 12 + DIRECTORY_ARRAY_SIZE;
        for (i, &pid) in self.bucket_page_ids.iter().enumerate() {
            LittleEndian::write_u32(&mut data[base + i * 4..base + i * 4 + 4], pid);
        }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn set_page_id(&mut self, page_id: PageId) {
        self.page_id = page_id;
    }

    pub fn lsn(&self) -> u32 {
        self.lsn
    }

    pub fn set_lsn(&mut self, lsn: u32) {
        self.lsn = lsn;
    }

    pub fn global_depth(&self) -> u32 {
        self.global_depth
    }

    /// Number of live directory entries
    pub fn size(&self) -> usize {
        1 << self.global_depth
    }

    /// Mask selecting the hash bits that index the directory
    pub fn global_depth_mask(&self) -> u32 {
        (1 << self.global_depth) - 1
    }

    pub fn local_depth(&self, bucket_idx: usize) -> u32 {
        self.local_depths[bucket_idx] as u32
    }

    pub fn set_local_depth(&mut self, bucket_idx: usize, depth: u32) {
        debug_assert!(depth <= MAX_DEPTH);
        self.local_depths[bucket_idx] = depth as u8;
    }

    pub fn incr_local_depth(&mut self, bucket_idx: usize) {
        debug_assert!(self.local_depth(bucket_idx) < MAX_DEPTH);
        self.local_depths[bucket_idx] += 1;
    }

    pub fn decr_local_depth(&mut self, bucket_idx: usize) {
        debug_assert!(self.local_depth(bucket_idx) > 0);
        self.local_depths[bucket_idx] -= 1;
    }

    pub fn local_depth_mask(&self, bucket_idx: usize) -> u32 {
        (1 << self.local_depth(bucket_idx)) - 1
    }

    pub fn bucket_page_id(&self, bucket_idx: usize) -> PageId {
        self.bucket_page_ids[bucket_idx]
    }

    pub fn set_bucket_page_id(&mut self, bucket_idx: usize, bucket_page_id: PageId) {
        self.bucket_page_ids[bucket_idx] = bucket_page_id;
    }

    /// Double the directory: the newly live upper half mirrors the lower
    /// half's bucket ids and local depths.
    pub fn incr_global_depth(&mut self) {
        assert!(
            self.global_depth < MAX_DEPTH,
            "directory is already at maximum depth"
        );

        let size = self.size();
        for i in 0..size {
            self.bucket_page_ids[size + i] = self.bucket_page_ids[i];
            self.local_depths[size + i] = self.local_depths[i];
        }
        self.global_depth += 1;
    }

    /// Halve the directory. The dropped upper half must already mirror the
    /// lower half (every local depth strictly below the global depth).
    pub fn decr_global_depth(&mut self) {
        assert!(self.global_depth > 0, "directory is already at depth zero");
        self.global_depth -= 1;
    }

    /// The index differing from `bucket_idx` only in the bucket's highest
    /// distinguished bit
    pub fn split_image_index(&self, bucket_idx: usize) -> usize {
        let local_depth = self.local_depth(bucket_idx);
        debug_assert!(local_depth > 0, "a depth-zero bucket has no split image");
        bucket_idx ^ (1 << (local_depth - 1))
    }

    /// The directory may halve iff every live bucket distinguishes fewer
    /// bits than the directory does
    pub fn can_shrink(&self) -> bool {
        self.global_depth > 0
            && (0..self.size()).all(|i| self.local_depth(i) < self.global_depth)
    }

    /// Assert the directory invariants. A violation is a bug in the split or
    /// merge protocol, not a recoverable condition.
    pub fn verify_integrity(&self) {
        // page id -> (reference count, local depth)
        let mut seen: HashMap<PageId, (usize, u32)> = HashMap::new();

        for i in 0..self.size() {
            let local_depth = self.local_depth(i);
            let page_id = self.bucket_page_id(i);

            assert!(
                local_depth <= self.global_depth,
                "local depth {} at index {} exceeds global depth {}",
                local_depth,
                i,
                self.global_depth
            );

            let entry = seen.entry(page_id).or_insert((0, local_depth));
            entry.0 += 1;
            assert_eq!(
                entry.1, local_depth,
                "bucket page {} is referenced with differing local depths",
                page_id
            );
        }

        for (&page_id, &(count, local_depth)) in seen.iter() {
            let expected = 1 << (self.global_depth - local_depth);
            assert_eq!(
                count, expected,
                "bucket page {} has {} directory references, expected {}",
                page_id, count, expected
            );
        }
    }
}
