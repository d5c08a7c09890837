use std::marker::PhantomData;

use bytestore::ArrayByteStore;
use log::{debug, warn};

use crate::{
    BinarySerializer, ElementStore, Error, FlatStore, Result, SerializedStore, check_bounds,
    check_insert_bounds,
};

/// In-memory flat store, the usual buffer of a [`BufferedStore`].
pub type MemoryBuffer<T, Ser> = FlatStore<T, Ser, ArrayByteStore>;

/// Operational knobs of a buffered store. Not persisted.
pub trait BufferController {
    /// Number of buffered mutations that triggers a drain.
    fn buffer_size(&self) -> usize;

    /// Changes the drain threshold, draining right away if it's already reached.
    fn set_buffer_size(&mut self, size: usize) -> Result<()>;

    /// Mutations recorded since the last drain.
    fn pending(&self) -> usize;

    /// Appends every buffered element to the main store and empties the buffer.
    fn flush_buffer(&mut self) -> Result<()>;
}

/// Batches mutations in a small buffer store in front of a main store.
///
/// The logical sequence is always `main[..main.len()]` followed by the buffer,
/// so the buffer holds the most recently mutated tail of the list. Mutating an
/// index still in main first moves main's tail from that index into the front
/// of the buffer (removing it from main, last element first), then applies
/// the mutation to the buffer. Reads pick whichever side holds the index, so
/// they always observe the latest write.
///
/// Once `buffer_size` mutations are pending, or on an explicit
/// [`flush_buffer`](BufferController::flush_buffer), the buffer is drained by
/// appending its elements to main in order. Main therefore sees a few large
/// batches of appends instead of many scattered edits.
///
/// Buffered mutations only reach main through a drain. `flush` and `close`
/// drain first; dropping the store with a non-empty buffer loses those
/// mutations and logs a warning.
///
/// The buffer holds the whole window from the lowest mutated index to the
/// end, not just the mutated elements. A mutation at index `i` of a list of
/// `n` elements copies `n - i` elements into the buffer (linear in that
/// count), and the buffer keeps them until the next drain. Mutations near the
/// front of a large list therefore hold most of the list in the buffer's
/// memory; a small `buffer_size` bounds how long that lasts.
///
/// A mutation is all-or-nothing at the logical level: if the drain it
/// triggers fails, the mutation is undone before the error is returned.
#[derive(Debug)]
pub struct BufferedStore<T, M, B>
where
    M: ElementStore<T>,
    B: ElementStore<T>,
{
    main: M,
    buffer: B,
    buffer_size: usize,
    pending: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T, M, B> BufferedStore<T, M, B>
where
    M: ElementStore<T>,
    B: ElementStore<T>,
{
    /// Elements already in `buffer` count as the tail of the list and reach
    /// `main` on the next drain.
    pub fn new(main: M, buffer: B, buffer_size: usize) -> Result<Self> {
        if buffer_size == 0 {
            return Err(Error::InvalidBufferSize);
        }
        Ok(Self {
            main,
            buffer,
            buffer_size,
            pending: 0,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub fn main(&self) -> &M {
        &self.main
    }

    #[inline]
    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    /// Moves `main[index..]` to the front of the buffer.
    ///
    /// Elements are copied into the buffer at ascending positions, then
    /// removed from main starting at the back, so each pulled element costs
    /// one buffer insert ahead of the elements already buffered and one
    /// removal at the end of main.
    fn pull_tail(&mut self, index: usize) -> Result<()> {
        let start = self.main.len();
        if index >= start {
            return Ok(());
        }
        let count = start - index;

        for offset in 0..count {
            let copied = self
                .main
                .get(index + offset)
                .and_then(|element| self.buffer.insert(offset, &element));
            if let Err(e) = copied {
                for j in (0..offset).rev() {
                    self.buffer.remove(j)?;
                }
                return Err(e);
            }
        }

        for i in (index..start).rev() {
            if let Err(e) = self.main.remove(i) {
                // main[index..=i] is still in main, drop its copies.
                for j in (0..=i - index).rev() {
                    self.buffer.remove(j)?;
                }
                return Err(e);
            }
        }

        debug!("Pulled {count} elements from main into the buffer");
        Ok(())
    }

    fn apply_set(&mut self, index: usize, element: &T) -> Result<()> {
        self.pull_tail(index)?;
        self.buffer.set(index - self.main.len(), element)
    }

    fn apply_insert(&mut self, index: usize, element: &T) -> Result<()> {
        self.pull_tail(index)?;
        self.buffer.insert(index - self.main.len(), element)
    }

    fn apply_remove(&mut self, index: usize) -> Result<T> {
        self.pull_tail(index)?;
        self.buffer.remove(index - self.main.len())
    }

    /// Counts an applied mutation and drains once the threshold is reached.
    /// If the drain fails, `undo` reverts the mutation and the drain error is
    /// returned.
    fn record<F>(&mut self, undo: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.pending += 1;
        if self.pending < self.buffer_size {
            return Ok(());
        }
        if let Err(e) = self.flush_buffer() {
            self.pending -= 1;
            undo(self)?;
            return Err(e);
        }
        Ok(())
    }
}

impl<T, M, Ser> BufferedStore<T, M, MemoryBuffer<T, Ser>>
where
    M: ElementStore<T>,
    Ser: BinarySerializer<T>,
{
    /// Buffers `main` through an in-memory flat store using `serializer`.
    pub fn in_memory_buffer(main: M, serializer: Ser, buffer_size: usize) -> Result<Self> {
        Self::new(main, SerializedStore::in_memory(serializer)?, buffer_size)
    }
}

impl<T, M, B> BufferController for BufferedStore<T, M, B>
where
    M: ElementStore<T>,
    B: ElementStore<T>,
{
    #[inline]
    fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn set_buffer_size(&mut self, size: usize) -> Result<()> {
        if size == 0 {
            return Err(Error::InvalidBufferSize);
        }
        self.buffer_size = size;
        if self.pending >= size {
            self.flush_buffer()?;
        }
        Ok(())
    }

    #[inline]
    fn pending(&self) -> usize {
        self.pending
    }

    fn flush_buffer(&mut self) -> Result<()> {
        let count = self.buffer.len();

        for i in 0..count {
            let appended = self
                .buffer
                .get(i)
                .and_then(|element| self.main.push(&element));
            if let Err(e) = appended {
                // Drop what already reached main so nothing is seen twice.
                for j in (0..i).rev() {
                    self.buffer.remove(j)?;
                }
                return Err(e);
            }
        }

        for i in (0..count).rev() {
            self.buffer.remove(i)?;
        }

        self.pending = 0;
        if count > 0 {
            debug!("Drained {count} buffered elements into main");
        }
        Ok(())
    }
}

impl<T, M, B> ElementStore<T> for BufferedStore<T, M, B>
where
    M: ElementStore<T>,
    B: ElementStore<T>,
{
    #[inline]
    fn len(&self) -> usize {
        self.main.len() + self.buffer.len()
    }

    fn get(&self, index: usize) -> Result<T> {
        check_bounds(index, self.len())?;
        let start = self.main.len();
        if index < start {
            self.main.get(index)
        } else {
            self.buffer.get(index - start)
        }
    }

    fn set(&mut self, index: usize, element: &T) -> Result<()> {
        check_bounds(index, self.len())?;
        let previous = self.get(index)?;
        self.apply_set(index, element)?;
        self.record(|store| store.apply_set(index, &previous))
    }

    fn insert(&mut self, index: usize, element: &T) -> Result<()> {
        check_insert_bounds(index, self.len())?;
        self.apply_insert(index, element)?;
        self.record(|store| store.apply_remove(index).map(drop))
    }

    fn remove(&mut self, index: usize) -> Result<T> {
        check_bounds(index, self.len())?;
        let element = self.apply_remove(index)?;
        self.record(|store| store.apply_insert(index, &element))?;
        Ok(element)
    }

    /// Chunk count of the main store; reflects drained mutations only.
    #[inline]
    fn chunk_count(&self) -> Option<usize> {
        self.main.chunk_count()
    }

    fn flush(&mut self) -> Result<()> {
        self.flush_buffer()?;
        self.main.flush()
    }

    fn close(&mut self) -> Result<()> {
        self.flush_buffer()?;
        self.main.close()?;
        self.buffer.close()
    }
}

impl<T, M, B> Drop for BufferedStore<T, M, B>
where
    M: ElementStore<T>,
    B: ElementStore<T>,
{
    fn drop(&mut self) {
        let undrained = self.buffer.len();
        if undrained > 0 {
            warn!("Dropping buffered store with {undrained} undrained elements");
        }
    }
}
