use crate::common::types::{Page, PAGE_SIZE};
use crate::storage::page::codec::FixedCodec;

/// Number of `(K, V)` slots that fit in one bucket page alongside the two
/// slot-state bitmaps: the largest `n` with
/// `2 * ceil(n / 8) + n * pair_size <= PAGE_SIZE`.
pub fn bucket_array_size<K: FixedCodec, V: FixedCodec>() -> usize {
    let pair_size = K::ENCODED_SIZE + V::ENCODED_SIZE;
    let mut n = 4 * PAGE_SIZE / (4 * pair_size + 1);
    while 2 * bitmap_bytes(n) + n * pair_size > PAGE_SIZE {
        n -= 1;
    }
    n
}

fn bitmap_bytes(slots: usize) -> usize {
    (slots + 7) / 8
}

/// In-memory image of one hash bucket page.
///
/// On-disk layout, all little-endian:
///
/// ```text
/// | occupied: u8[ceil(n/8)] | readable: u8[ceil(n/8)] | array: (K, V)[n] |
/// ```
///
/// Bit `i` of a bitmap lives at byte `i / 8` under mask `128 >> (i % 8)`.
/// `occupied` is set once when a slot is first written and survives removal,
/// so an unoccupied slot terminates the lookup scan; `readable` tracks live
/// entries. A slot with `occupied` set but `readable` clear is a tombstone
/// and can be rewritten by a later insert.
pub struct HashBucketPage<K, V> {
    capacity: usize,
    occupied: Vec<u8>,
    readable: Vec<u8>,
    slots: Vec<(K, V)>,
}

impl<K, V> HashBucketPage<K, V>
where
    K: FixedCodec + Ord + Default,
    V: FixedCodec + PartialEq + Default,
{
    /// An empty bucket. Equivalent to loading a zeroed page.
    pub fn new() -> Self {
        let capacity = bucket_array_size::<K, V>();
        let bitmap_len = bitmap_bytes(capacity);

        Self {
            capacity,
            occupied: vec![0; bitmap_len],
            readable: vec![0; bitmap_len],
            slots: (0..capacity).map(|_| (K::default(), V::default())).collect(),
        }
    }

    /// Decode a bucket from a page's payload
    pub fn load(page: &Page) -> Self {
        let capacity = bucket_array_size::<K, V>();
        let bitmap_len = bitmap_bytes(capacity);
        let pair_size = K::ENCODED_SIZE + V::ENCODED_SIZE;

        let occupied = page.data[0..bitmap_len].to_vec();
        let readable = page.data[bitmap_len..2 * bitmap_len].to_vec();

        let base = 2 * bitmap_len;
        let slots = (0..capacity)
            .map(|i| {
                let offset = base + i * pair_size;
                (
                    K::decode_from(&page.data[offset..offset + K::ENCODED_SIZE]),
                    V::decode_from(
                        &page.data[offset + K::ENCODED_SIZE..offset + pair_size],
                    ),
                )
            })
            .collect();

        Self {
            capacity,
            occupied,
            readable,
            slots,
        }
    }

    /// Encode the bucket into a page's payload
    pub fn store(&self, page: &mut Page) {
        let bitmap_len = bitmap_bytes(self.capacity);
        let pair_size = K::ENCODED_SIZE + V::ENCODED_SIZE;

        page.data[0..bitmap_len].copy_from_slice(&self.occupied);
        page.data[bitmap_len..2 * bitmap_len].copy_from_slice(&self.readable);

        let base = 2 * bitmap_len;
        for (i, (key, value)) in self.slots.iter().enumerate() {
            let offset = base + i * pair_size;
            key.encode_into(&mut page.data[offset..offset + K::ENCODED_SIZE]);
            value.encode_into(&mut page.data[offset + K::ENCODED_SIZE..offset + pair_size]);
        }
    }

    /// Insert a pair into the first tombstone or fresh slot.
    ///
    /// Returns `false` when the exact `(key, value)` pair is already present
    /// or no slot is free.
    pub fn insert(&mut self, key: &K, value: &V) -> bool {
        if self.contains(key, value) {
            return false;
        }

        for i in 0..self.capacity {
            if !self.is_readable(i) {
                self.slots[i] = (key.clone(), value.clone());
                self.set_occupied(i);
                self.set_readable(i);
                return true;
            }
        }

        false
    }

    /// Tombstone the slot holding the exact `(key, value)` pair.
    ///
    /// Only `readable` is cleared; `occupied` stays set so lookup scans keep
    /// probing past the removed slot.
    pub fn remove(&mut self, key: &K, value: &V) -> bool {
        for i in 0..self.capacity {
            if self.is_readable(i) && self.slots[i].0 == *key && self.slots[i].1 == *value {
                self.clear_readable(i);
                return true;
            }
        }
        false
    }

    /// Collect the values stored under `key`. The scan stops at the first
    /// never-occupied slot. Returns whether anything matched.
    pub fn get_value(&self, key: &K, result: &mut Vec<V>) -> bool {
        let mut found = false;
        for i in 0..self.capacity {
            if !self.is_occupied(i) {
                break;
            }
            if self.is_readable(i) && self.slots[i].0 == *key {
                result.push(self.slots[i].1.clone());
                found = true;
            }
        }
        found
    }

    /// Whether the exact `(key, value)` pair is present
    pub fn contains(&self, key: &K, value: &V) -> bool {
        for i in 0..self.capacity {
            if !self.is_occupied(i) {
                break;
            }
            if self.is_readable(i) && self.slots[i].0 == *key && self.slots[i].1 == *value {
                return true;
            }
        }
        false
    }

    /// Snapshot of every live pair in slot order (split uses this to
    /// redistribute a bucket's contents)
    pub fn get_all(&self) -> Vec<(K, V)> {
        (0..self.capacity)
            .filter(|&i| self.is_readable(i))
            .map(|i| self.slots[i].clone())
            .collect()
    }

    /// Zero both bitmaps, emptying the bucket
    pub fn clear(&mut self) {
        self.occupied.fill(0);
        self.readable.fill(0);
    }

    pub fn is_full(&self) -> bool {
        self.num_readable() == self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.readable.iter().all(|&byte| byte == 0)
    }

    /// Number of live entries
    pub fn num_readable(&self) -> usize {
        self.readable
            .iter()
            .map(|byte| byte.count_ones() as usize)
            .sum()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn is_occupied(&self, i: usize) -> bool {
        self.occupied[i / 8] & (128 >> (i % 8)) != 0
    }

    fn is_readable(&self, i: usize) -> bool {
        self.readable[i / 8] & (128 >> (i % 8)) != 0
    }

    fn set_occupied(&mut self, i: usize) {
        self.occupied[i / 8] |= 128 >> (i % 8);
    }

    fn set_readable(&mut self, i: usize) {
        self.readable[i / 8] |= 128 >> (i % 8);
    }

    fn clear_readable(&mut self, i: usize) {
        self.readable[i / 8] &= !(128 >> (i % 8));
    }
}

impl<K, V> Default for HashBucketPage<K, V>
where
    K: FixedCodec + Ord + Default,
    V: FixedCodec + PartialEq + Default,
{
    fn default() -> Self {
        Self::new()
    }
}
