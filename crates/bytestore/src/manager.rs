use std::collections::BTreeSet;

use log::debug;

use crate::{Error, Result, check_index, check_insert_index};

/// Location and occupancy of one chunk inside the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDescriptor {
    start: usize,
    occupied: usize,
}

impl ChunkDescriptor {
    /// Byte offset of the chunk's range in the backing store.
    #[inline(always)]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of occupied slots, always `1..=capacity`.
    #[inline(always)]
    pub fn occupied(&self) -> usize {
        self.occupied
    }
}

/// Owning chunk of a logical index and the slot offset inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub chunk: usize,
    pub offset: usize,
}

/// Byte moves needed to insert one slot, computed before anything is mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPlan {
    /// The chunk has room: slots `offset..occupied` move right by one and the
    /// new slot is written at `offset`.
    Shift {
        chunk: usize,
        start: usize,
        offset: usize,
        occupied: usize,
    },
    /// The chunk is full. Slots `offset..capacity` move to a new chunk at
    /// `new_start`, placed right after it, and the new slot takes `offset`, so
    /// the original chunk ends with the new slot.
    Split {
        chunk: usize,
        start: usize,
        offset: usize,
        new_start: usize,
    },
    /// A new chunk holding only the new slot opens at position `chunk`.
    Open { chunk: usize, new_start: usize },
}

/// Byte moves needed to remove one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovePlan {
    pub chunk: usize,
    pub start: usize,
    pub offset: usize,
    pub occupied: usize,
    /// New backing length when the chunk empties and its range (plus any free
    /// ranges before it) sits at the end of the backing store.
    pub trim_to: Option<usize>,
}

/// Bookkeeping for a sequence of bounded-capacity chunks.
///
/// Maps a logical slot index to its owning chunk using prefix sums of chunk
/// occupancy, and decides where chunks open, split and close. It never
/// touches bytes: mutations are planned first, the caller performs the byte
/// moves, and only then commits the plan. A failed move thus leaves the
/// bookkeeping untouched.
///
/// Every chunk owns a `capacity * element_size` byte range of the backing
/// store. Ranges of destroyed chunks are reused lowest first, and trailing
/// free ranges are given back.
#[derive(Debug, Clone)]
pub struct ChunkManager {
    element_size: usize,
    capacity: usize,
    chunks: Vec<ChunkDescriptor>,
    /// `ends[k]` is the number of slots in chunks `0..=k`.
    ends: Vec<usize>,
    free: BTreeSet<usize>,
    end: usize,
}

impl ChunkManager {
    pub fn new(element_size: usize, chunk_bytes: usize) -> Result<Self> {
        if element_size == 0 {
            return Err(Error::InvalidElementSize);
        }
        let capacity = chunk_bytes / element_size;
        if capacity == 0 {
            return Err(Error::InvalidChunkCapacity {
                chunk_bytes,
                element_size,
            });
        }
        Ok(Self {
            element_size,
            capacity,
            chunks: vec![],
            ends: vec![],
            free: BTreeSet::new(),
            end: 0,
        })
    }

    #[inline]
    pub fn element_size(&self) -> usize {
        self.element_size
    }

    /// Slots per chunk.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes reserved per chunk.
    #[inline]
    pub fn chunk_bytes(&self) -> usize {
        self.capacity * self.element_size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ends.last().copied().unwrap_or_default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn descriptors(&self) -> &[ChunkDescriptor] {
        &self.chunks
    }

    /// Bytes of the backing store covered by live or free chunk ranges.
    #[inline]
    pub fn allocated_len(&self) -> usize {
        self.end
    }

    pub fn locate(&self, index: usize) -> Result<Location> {
        check_index(index, self.len())?;
        let chunk = self.ends.partition_point(|&end| end <= index);
        let first = self.ends[chunk] - self.chunks[chunk].occupied;
        Ok(Location {
            chunk,
            offset: index - first,
        })
    }

    /// Byte offset of the slot at `index` in the backing store.
    pub fn byte_offset(&self, index: usize) -> Result<usize> {
        let Location { chunk, offset } = self.locate(index)?;
        Ok(self.chunks[chunk].start + offset * self.element_size)
    }

    pub fn plan_insert(&self, index: usize) -> Result<InsertPlan> {
        let len = self.len();
        check_insert_index(index, len)?;

        if index == len {
            return Ok(match self.chunks.last() {
                Some(last) if last.occupied < self.capacity => InsertPlan::Shift {
                    chunk: self.chunks.len() - 1,
                    start: last.start,
                    offset: last.occupied,
                    occupied: last.occupied,
                },
                _ => InsertPlan::Open {
                    chunk: self.chunks.len(),
                    new_start: self.next_start(),
                },
            });
        }

        let Location { chunk, offset } = self.locate(index)?;
        let descriptor = self.chunks[chunk];
        if descriptor.occupied < self.capacity {
            Ok(InsertPlan::Shift {
                chunk,
                start: descriptor.start,
                offset,
                occupied: descriptor.occupied,
            })
        } else {
            Ok(InsertPlan::Split {
                chunk,
                start: descriptor.start,
                offset,
                new_start: self.next_start(),
            })
        }
    }

    pub fn commit_insert(&mut self, plan: InsertPlan) {
        match plan {
            InsertPlan::Shift { chunk, .. } => {
                self.chunks[chunk].occupied += 1;
                self.refresh_ends(chunk);
            }
            InsertPlan::Split {
                chunk,
                offset,
                new_start,
                ..
            } => {
                self.take_start(new_start);
                self.chunks[chunk].occupied = offset + 1;
                self.chunks.insert(
                    chunk + 1,
                    ChunkDescriptor {
                        start: new_start,
                        occupied: self.capacity - offset,
                    },
                );
                self.refresh_ends(chunk);
                debug!("Split chunk {chunk} into a new chunk at byte {new_start}");
            }
            InsertPlan::Open { chunk, new_start } => {
                self.take_start(new_start);
                self.chunks.insert(
                    chunk,
                    ChunkDescriptor {
                        start: new_start,
                        occupied: 1,
                    },
                );
                self.refresh_ends(chunk);
                debug!("Opened chunk {chunk} at byte {new_start}");
            }
        }
    }

    pub fn plan_remove(&self, index: usize) -> Result<RemovePlan> {
        let Location { chunk, offset } = self.locate(index)?;
        let descriptor = self.chunks[chunk];
        let trim_to = if descriptor.occupied == 1 {
            self.released_end(descriptor.start)
        } else {
            None
        };
        Ok(RemovePlan {
            chunk,
            start: descriptor.start,
            offset,
            occupied: descriptor.occupied,
            trim_to,
        })
    }

    /// Returns true when the chunk emptied and was destroyed.
    pub fn commit_remove(&mut self, plan: RemovePlan) -> bool {
        let chunk = plan.chunk;
        self.chunks[chunk].occupied -= 1;
        let destroyed = self.chunks[chunk].occupied == 0;
        if destroyed {
            let descriptor = self.chunks.remove(chunk);
            self.release(descriptor.start);
            debug!("Released chunk {chunk} at byte {}", descriptor.start);
        }
        self.refresh_ends(chunk);
        destroyed
    }

    /// Drops every chunk.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.ends.clear();
        self.free.clear();
        self.end = 0;
    }

    #[inline]
    fn next_start(&self) -> usize {
        self.free.first().copied().unwrap_or(self.end)
    }

    fn take_start(&mut self, start: usize) {
        if !self.free.remove(&start) {
            debug_assert_eq!(start, self.end);
            self.end += self.chunk_bytes();
        }
    }

    fn release(&mut self, start: usize) {
        let chunk_bytes = self.chunk_bytes();
        self.free.insert(start);
        while let Some(&last) = self.free.last()
            && last + chunk_bytes == self.end
        {
            self.free.pop_last();
            self.end = last;
        }
    }

    fn released_end(&self, start: usize) -> Option<usize> {
        let chunk_bytes = self.chunk_bytes();
        if start + chunk_bytes != self.end {
            return None;
        }
        let mut end = start;
        while end >= chunk_bytes && self.free.contains(&(end - chunk_bytes)) {
            end -= chunk_bytes;
        }
        Some(end)
    }

    fn refresh_ends(&mut self, from: usize) {
        self.ends.truncate(from);
        let mut acc = from
            .checked_sub(1)
            .map_or(0, |prev| self.ends[prev]);
        for descriptor in &self.chunks[from..] {
            acc += descriptor.occupied;
            self.ends.push(acc);
        }
    }
}
