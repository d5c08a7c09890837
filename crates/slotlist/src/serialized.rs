use std::{marker::PhantomData, path::Path};

use bytestore::{
    AlignedByteStore, ArrayByteStore, ChunkedByteStore, FileByteStore, SlotStore,
};

use crate::{
    BinarySerializer, ElementStore, Error, Result, check_bounds, check_insert_bounds,
};

/// Flat store: one contiguous run of slots, full tail shift on insert/remove.
pub type FlatStore<T, Ser, B> = SerializedStore<T, Ser, AlignedByteStore<B>>;

/// Chunked store: slots spread over bounded-capacity chunks.
pub type ChunkedStore<T, Ser, B> = SerializedStore<T, Ser, ChunkedByteStore<B>>;

/// Elements serialized into the fixed-size slots of a [`SlotStore`].
///
/// Serialization happens at this boundary: `get` decodes one slot, `set`
/// overwrites one slot in place, and `insert`/`remove` leave the shifting to
/// the slot store (chunk-local for chunked stores, the whole tail for flat
/// ones). A slot is fully encoded before any byte is written, so a failed
/// serialization never leaves a partial element behind.
#[derive(Debug)]
#[must_use = "Store should be kept to access the elements"]
pub struct SerializedStore<T, Ser, S> {
    serializer: Ser,
    slots: S,
    _marker: PhantomData<fn() -> T>,
}

impl<T, Ser, S> SerializedStore<T, Ser, S>
where
    Ser: BinarySerializer<T>,
    S: SlotStore,
{
    pub fn new(serializer: Ser, slots: S) -> Result<Self> {
        let element_size = serializer.element_size();
        if element_size == 0 {
            return Err(Error::InvalidElementSize);
        }
        if element_size != slots.slot_size() {
            return Err(Error::ElementSizeMismatch {
                serializer: element_size,
                store: slots.slot_size(),
            });
        }
        Ok(Self {
            serializer,
            slots,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub fn serializer(&self) -> &Ser {
        &self.serializer
    }

    #[inline]
    pub fn slots(&self) -> &S {
        &self.slots
    }

    pub fn into_parts(self) -> (Ser, S) {
        (self.serializer, self.slots)
    }

    #[inline]
    pub fn element_size(&self) -> usize {
        self.serializer.element_size()
    }
}

impl<T, Ser> SerializedStore<T, Ser, AlignedByteStore<ArrayByteStore>>
where
    Ser: BinarySerializer<T>,
{
    pub fn in_memory(serializer: Ser) -> Result<Self> {
        let slots = AlignedByteStore::new(ArrayByteStore::new(), serializer.element_size())?;
        Self::new(serializer, slots)
    }
}

impl<T, Ser> SerializedStore<T, Ser, ChunkedByteStore<ArrayByteStore>>
where
    Ser: BinarySerializer<T>,
{
    pub fn chunked_in_memory(serializer: Ser, chunk_bytes: usize) -> Result<Self> {
        let slots =
            ChunkedByteStore::new(ArrayByteStore::new(), serializer.element_size(), chunk_bytes)?;
        Self::new(serializer, slots)
    }
}

impl<T, Ser> SerializedStore<T, Ser, AlignedByteStore<FileByteStore>>
where
    Ser: BinarySerializer<T>,
{
    /// Creates a new flat file of slots at `path`, truncating any existing one.
    pub fn create_file(path: &Path, serializer: Ser) -> Result<Self> {
        let slots = AlignedByteStore::new(
            FileByteStore::create_at(path)?,
            serializer.element_size(),
        )?;
        Self::new(serializer, slots)
    }

    /// Opens a flat file of slots written with the same serializer configuration.
    pub fn open_file(path: &Path, serializer: Ser) -> Result<Self> {
        let slots =
            AlignedByteStore::new(FileByteStore::open(path)?, serializer.element_size())?;
        Self::new(serializer, slots)
    }
}

impl<T, Ser> SerializedStore<T, Ser, ChunkedByteStore<FileByteStore>>
where
    Ser: BinarySerializer<T>,
{
    pub fn create_chunked_file(path: &Path, serializer: Ser, chunk_bytes: usize) -> Result<Self> {
        let slots = ChunkedByteStore::new(
            FileByteStore::create_at(path)?,
            serializer.element_size(),
            chunk_bytes,
        )?;
        Self::new(serializer, slots)
    }
}

impl<T, Ser, S> ElementStore<T> for SerializedStore<T, Ser, S>
where
    Ser: BinarySerializer<T>,
    S: SlotStore,
{
    #[inline]
    fn len(&self) -> usize {
        self.slots.len()
    }

    fn get(&self, index: usize) -> Result<T> {
        check_bounds(index, self.len())?;
        let mut slot = vec![0; self.element_size()];
        self.slots.read_slot(index, &mut slot)?;
        self.serializer.deserialize(&slot)
    }

    fn set(&mut self, index: usize, element: &T) -> Result<()> {
        check_bounds(index, self.len())?;
        let slot = self.serializer.to_slot(element)?;
        self.slots.write_slot(index, &slot)?;
        Ok(())
    }

    fn insert(&mut self, index: usize, element: &T) -> Result<()> {
        check_insert_bounds(index, self.len())?;
        let slot = self.serializer.to_slot(element)?;
        self.slots.insert_slot(index, &slot)?;
        Ok(())
    }

    fn remove(&mut self, index: usize) -> Result<T> {
        let element = self.get(index)?;
        self.slots.remove_slot(index)?;
        Ok(element)
    }

    #[inline]
    fn chunk_count(&self) -> Option<usize> {
        self.slots.chunk_count()
    }

    #[inline]
    fn flush(&mut self) -> Result<()> {
        Ok(self.slots.flush()?)
    }

    #[inline]
    fn close(&mut self) -> Result<()> {
        Ok(self.slots.close()?)
    }
}
