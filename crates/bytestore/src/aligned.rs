use crate::{
    ByteStore, Error, Result, SlotStore, check_index, check_insert_index, check_slot_len,
};

/// Flat slot store over a [`ByteStore`].
///
/// Slot `i` lives at bytes `[i * element_size, (i + 1) * element_size)` of the
/// inner store, with no header. Every access must be a whole number of slots;
/// anything else is rejected with [`Error::Misaligned`] before touching the
/// medium. Inserting or removing a slot shifts the entire tail.
#[derive(Debug)]
pub struct AlignedByteStore<S> {
    inner: S,
    element_size: usize,
}

impl<S> AlignedByteStore<S>
where
    S: ByteStore,
{
    /// Wraps `inner`, whose current length must already be slot aligned.
    pub fn new(inner: S, element_size: usize) -> Result<Self> {
        if element_size == 0 {
            return Err(Error::InvalidElementSize);
        }
        let store_len = inner.len();
        if !store_len.is_multiple_of(element_size) {
            return Err(Error::CorruptedLength {
                store_len,
                element_size,
            });
        }
        Ok(Self {
            inner,
            element_size,
        })
    }

    #[inline]
    pub fn element_size(&self) -> usize {
        self.element_size
    }

    #[inline]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    #[inline]
    fn offset_of(&self, index: usize) -> usize {
        index * self.element_size
    }

    #[inline]
    fn check_aligned(&self, len: usize) -> Result<usize> {
        if len == 0 || !len.is_multiple_of(self.element_size) {
            return Err(Error::Misaligned {
                len,
                element_size: self.element_size,
            });
        }
        Ok(len / self.element_size)
    }

    /// Reads `buf.len() / element_size` consecutive slots starting at `index`.
    pub fn read_slots(&self, index: usize, buf: &mut [u8]) -> Result<()> {
        let count = self.check_aligned(buf.len())?;
        check_index(index + count - 1, self.len())?;
        self.inner.read_into(self.offset_of(index), buf)
    }

    /// Writes consecutive slots starting at `index`. Writing at `len()` appends.
    pub fn write_slots(&mut self, index: usize, data: &[u8]) -> Result<()> {
        self.check_aligned(data.len())?;
        check_insert_index(index, self.len())?;
        self.inner.write(self.offset_of(index), data)
    }
}

impl<S> SlotStore for AlignedByteStore<S>
where
    S: ByteStore,
{
    #[inline]
    fn slot_size(&self) -> usize {
        self.element_size
    }

    #[inline]
    fn len(&self) -> usize {
        self.inner.len() / self.element_size
    }

    fn read_slot(&self, index: usize, buf: &mut [u8]) -> Result<()> {
        check_slot_len(buf.len(), self.element_size)?;
        check_index(index, self.len())?;
        self.inner.read_into(self.offset_of(index), buf)
    }

    fn write_slot(&mut self, index: usize, data: &[u8]) -> Result<()> {
        check_slot_len(data.len(), self.element_size)?;
        check_index(index, self.len())?;
        self.inner.write(self.offset_of(index), data)
    }

    fn insert_slot(&mut self, index: usize, data: &[u8]) -> Result<()> {
        check_slot_len(data.len(), self.element_size)?;
        let len = self.len();
        check_insert_index(index, len)?;

        let offset = self.offset_of(index);
        let tail = self.offset_of(len - index);
        self.inner
            .copy_within(offset, offset + self.element_size, tail)?;
        self.inner.write(offset, data)
    }

    fn remove_slot(&mut self, index: usize) -> Result<()> {
        let len = self.len();
        check_index(index, len)?;

        let offset = self.offset_of(index);
        let tail = self.offset_of(len - index - 1);
        self.inner
            .copy_within(offset + self.element_size, offset, tail)?;
        self.inner.truncate(self.offset_of(len - 1))
    }

    #[inline]
    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }

    #[inline]
    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }
}
