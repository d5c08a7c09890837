use crate::{Error, Result};

/// Index-granular storage of fixed-size slots.
///
/// This is the surface the element layer is written against: callers think in
/// slot indices and never see raw byte offsets. Implementations decide how a
/// shift on insert/remove is carried out (a full tail shift for a flat store,
/// a chunk-local one for a chunked store).
pub trait SlotStore {
    /// Size in bytes of every slot.
    fn slot_size(&self) -> usize;

    /// Number of occupied slots.
    fn len(&self) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads slot `index` into `buf`, which must be exactly one slot long.
    fn read_slot(&self, index: usize, buf: &mut [u8]) -> Result<()>;

    /// Overwrites slot `index` in place.
    fn write_slot(&mut self, index: usize, data: &[u8]) -> Result<()>;

    /// Inserts a slot at `index`, shifting later slots by one. `index == len()` appends.
    fn insert_slot(&mut self, index: usize, data: &[u8]) -> Result<()>;

    /// Removes slot `index`, shifting later slots back by one.
    fn remove_slot(&mut self, index: usize) -> Result<()>;

    /// Number of live chunks for chunked layouts, `None` for flat ones.
    fn chunk_count(&self) -> Option<usize> {
        None
    }

    fn flush(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}

impl<S> SlotStore for Box<S>
where
    S: SlotStore + ?Sized,
{
    #[inline]
    fn slot_size(&self) -> usize {
        (**self).slot_size()
    }

    #[inline]
    fn len(&self) -> usize {
        (**self).len()
    }

    #[inline]
    fn read_slot(&self, index: usize, buf: &mut [u8]) -> Result<()> {
        (**self).read_slot(index, buf)
    }

    #[inline]
    fn write_slot(&mut self, index: usize, data: &[u8]) -> Result<()> {
        (**self).write_slot(index, data)
    }

    #[inline]
    fn insert_slot(&mut self, index: usize, data: &[u8]) -> Result<()> {
        (**self).insert_slot(index, data)
    }

    #[inline]
    fn remove_slot(&mut self, index: usize) -> Result<()> {
        (**self).remove_slot(index)
    }

    #[inline]
    fn chunk_count(&self) -> Option<usize> {
        (**self).chunk_count()
    }

    #[inline]
    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    #[inline]
    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

#[inline]
pub(crate) fn check_slot_len(len: usize, element_size: usize) -> Result<()> {
    if len != element_size {
        return Err(Error::Misaligned { len, element_size });
    }
    Ok(())
}

#[inline]
pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(Error::IndexOutOfBounds { index, len });
    }
    Ok(())
}

#[inline]
pub(crate) fn check_insert_index(index: usize, len: usize) -> Result<()> {
    if index > len {
        return Err(Error::IndexOutOfBounds { index, len });
    }
    Ok(())
}
