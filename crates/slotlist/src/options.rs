use std::{fs, path::Path};

use log::debug;

use crate::{
    BinarySerializer, BufferedStore, ElementStore, Error, MemoryBuffer, Result, SerializedStore,
    StoreList,
};

/// Boxed store chain assembled from [`StoreOptions`].
pub type DynStore<T> = Box<dyn ElementStore<T>>;

/// Options for assembling a list's store chain.
///
/// The defaults give a flat, unbuffered store. Neither setting is written to
/// the backing file: the opening code has to pass the same options again.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Byte capacity of each chunk, or `None` for a flat store.
    pub chunk_bytes: Option<usize>,
    /// Number of mutations buffered before a drain, or `None` to write through.
    pub buffer_size: Option<usize>,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk_bytes(mut self, chunk_bytes: usize) -> Self {
        self.chunk_bytes = Some(chunk_bytes);
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = Some(buffer_size);
        self
    }

    pub fn in_memory<T, Ser>(&self, serializer: Ser) -> Result<StoreList<T, DynStore<T>>>
    where
        T: 'static,
        Ser: BinarySerializer<T> + Clone + 'static,
    {
        let main: DynStore<T> = match self.chunk_bytes {
            Some(chunk_bytes) => Box::new(SerializedStore::<T, Ser, _>::chunked_in_memory(
                serializer.clone(),
                chunk_bytes,
            )?),
            None => Box::new(SerializedStore::<T, Ser, _>::in_memory(serializer.clone())?),
        };
        self.finish(main, serializer)
    }

    /// Creates a list backed by a new file at `path`, truncating any existing one.
    /// Missing parent directories are created.
    pub fn create_file<T, Ser>(
        &self,
        path: impl AsRef<Path>,
        serializer: Ser,
    ) -> Result<StoreList<T, DynStore<T>>>
    where
        T: 'static,
        Ser: BinarySerializer<T> + Clone + 'static,
    {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.is_dir()
        {
            fs::create_dir_all(parent)?;
            debug!("Created directory {}", parent.display());
        }
        let main: DynStore<T> = match self.chunk_bytes {
            Some(chunk_bytes) => Box::new(SerializedStore::<T, Ser, _>::create_chunked_file(
                path,
                serializer.clone(),
                chunk_bytes,
            )?),
            None => Box::new(SerializedStore::<T, Ser, _>::create_file(
                path,
                serializer.clone(),
            )?),
        };
        self.finish(main, serializer)
    }

    /// Reopens a flat file written with the same serializer configuration.
    ///
    /// Fails with [`Error::ChunkedReopen`] when chunking is configured, since
    /// chunk boundaries can't be recovered from the file.
    pub fn open_file<T, Ser>(
        &self,
        path: impl AsRef<Path>,
        serializer: Ser,
    ) -> Result<StoreList<T, DynStore<T>>>
    where
        T: 'static,
        Ser: BinarySerializer<T> + Clone + 'static,
    {
        if self.chunk_bytes.is_some() {
            return Err(Error::ChunkedReopen);
        }
        let main: DynStore<T> = Box::new(SerializedStore::<T, Ser, _>::open_file(
            path.as_ref(),
            serializer.clone(),
        )?);
        self.finish(main, serializer)
    }

    fn finish<T, Ser>(
        &self,
        main: DynStore<T>,
        serializer: Ser,
    ) -> Result<StoreList<T, DynStore<T>>>
    where
        T: 'static,
        Ser: BinarySerializer<T> + 'static,
    {
        let store: DynStore<T> = match self.buffer_size {
            Some(buffer_size) => {
                let buffered: BufferedStore<T, DynStore<T>, MemoryBuffer<T, Ser>> =
                    BufferedStore::in_memory_buffer(main, serializer, buffer_size)?;
                Box::new(buffered)
            }
            None => main,
        };
        debug!("Assembled store chain with {self:?}");
        Ok(StoreList::new(store))
    }
}
