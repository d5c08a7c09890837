use crate::{
    ByteStore, ChunkManager, InsertPlan, Result, SlotStore, check_slot_len,
};

/// Slot store spread over bounded-capacity chunks inside one backing store.
///
/// Inserting or removing a slot only moves slots of the owning chunk, so the
/// cost of a mutation is bounded by the chunk capacity instead of the total
/// length. A full chunk splits in two; a chunk that empties is destroyed and
/// its byte range released for reuse.
///
/// Chunk topology lives in memory only. The backing store holds the chunk
/// ranges with no header, so a chunked file can't be reopened on its own.
#[derive(Debug)]
pub struct ChunkedByteStore<S> {
    manager: ChunkManager,
    backing: S,
}

impl<S> ChunkedByteStore<S>
where
    S: ByteStore,
{
    /// Starts an empty chunked store over `backing`, discarding its previous content.
    pub fn new(mut backing: S, element_size: usize, chunk_bytes: usize) -> Result<Self> {
        let manager = ChunkManager::new(element_size, chunk_bytes)?;
        backing.truncate(0)?;
        Ok(Self { manager, backing })
    }

    #[inline]
    pub fn manager(&self) -> &ChunkManager {
        &self.manager
    }

    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.manager.chunk_count()
    }

    /// Slots per chunk.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.manager.capacity()
    }

    #[inline]
    pub fn backing(&self) -> &S {
        &self.backing
    }

    pub fn into_backing(self) -> S {
        self.backing
    }

    /// Drops every slot and chunk.
    pub fn clear(&mut self) -> Result<()> {
        self.backing.truncate(0)?;
        self.manager.clear();
        Ok(())
    }

    #[inline]
    fn element_size(&self) -> usize {
        self.manager.element_size()
    }
}

impl<S> SlotStore for ChunkedByteStore<S>
where
    S: ByteStore,
{
    #[inline]
    fn slot_size(&self) -> usize {
        self.element_size()
    }

    #[inline]
    fn len(&self) -> usize {
        self.manager.len()
    }

    fn read_slot(&self, index: usize, buf: &mut [u8]) -> Result<()> {
        check_slot_len(buf.len(), self.element_size())?;
        let offset = self.manager.byte_offset(index)?;
        self.backing.read_into(offset, buf)
    }

    fn write_slot(&mut self, index: usize, data: &[u8]) -> Result<()> {
        check_slot_len(data.len(), self.element_size())?;
        let offset = self.manager.byte_offset(index)?;
        self.backing.write(offset, data)
    }

    fn insert_slot(&mut self, index: usize, data: &[u8]) -> Result<()> {
        let es = self.element_size();
        check_slot_len(data.len(), es)?;
        let plan = self.manager.plan_insert(index)?;

        match plan {
            InsertPlan::Shift {
                start,
                offset,
                occupied,
                ..
            } => {
                let at = start + offset * es;
                let shifted = (occupied - offset) * es;
                self.backing.copy_within(at, at + es, shifted)?;
                if let Err(e) = self.backing.write(at, data) {
                    // Slide the chunk's slots back before reporting.
                    self.backing.copy_within(at + es, at, shifted)?;
                    return Err(e);
                }
            }
            InsertPlan::Split {
                start,
                offset,
                new_start,
                ..
            } => {
                let at = start + offset * es;
                let moved = self
                    .backing
                    .read(at, (self.manager.capacity() - offset) * es)?;

                // Moved slots go first so a failure leaves the full chunk intact.
                self.backing.write(new_start, &moved)?;
                self.backing.write(at, data)?;
            }
            InsertPlan::Open { new_start, .. } => {
                self.backing.write(new_start, data)?;
            }
        }

        self.manager.commit_insert(plan);
        Ok(())
    }

    fn remove_slot(&mut self, index: usize) -> Result<()> {
        let es = self.element_size();
        let plan = self.manager.plan_remove(index)?;

        // A chunk about to be destroyed holds only this slot, so the copy is
        // empty and a failed truncation leaves the slots untouched.
        let at = plan.start + plan.offset * es;
        self.backing
            .copy_within(at + es, at, (plan.occupied - plan.offset - 1) * es)?;
        if let Some(len) = plan.trim_to {
            self.backing.truncate(len)?;
        }

        self.manager.commit_remove(plan);
        Ok(())
    }

    #[inline]
    fn chunk_count(&self) -> Option<usize> {
        Some(self.manager.chunk_count())
    }

    #[inline]
    fn flush(&mut self) -> Result<()> {
        self.backing.flush()
    }

    #[inline]
    fn close(&mut self) -> Result<()> {
        self.backing.close()
    }
}
