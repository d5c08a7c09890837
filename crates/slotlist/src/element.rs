use crate::Result;

/// Index-addressed storage of whole elements.
///
/// Implemented by [`SerializedStore`](crate::SerializedStore), which encodes
/// elements straight into slots, and by [`BufferedStore`](crate::BufferedStore),
/// which stages mutations in front of another store. Index checks follow the
/// usual list rules: `0..len` for access and removal, `0..=len` for insertion.
pub trait ElementStore<T> {
    fn len(&self) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> Result<T>;

    /// Overwrites the element at `index` in place.
    fn set(&mut self, index: usize, element: &T) -> Result<()>;

    fn insert(&mut self, index: usize, element: &T) -> Result<()>;

    /// Removes and returns the element at `index`.
    fn remove(&mut self, index: usize) -> Result<T>;

    #[inline]
    fn push(&mut self, element: &T) -> Result<()> {
        self.insert(self.len(), element)
    }

    /// Number of live chunks of the underlying slot store, if chunked.
    fn chunk_count(&self) -> Option<usize>;

    fn flush(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}

impl<T, S> ElementStore<T> for Box<S>
where
    S: ElementStore<T> + ?Sized,
{
    #[inline]
    fn len(&self) -> usize {
        (**self).len()
    }

    #[inline]
    fn get(&self, index: usize) -> Result<T> {
        (**self).get(index)
    }

    #[inline]
    fn set(&mut self, index: usize, element: &T) -> Result<()> {
        (**self).set(index, element)
    }

    #[inline]
    fn insert(&mut self, index: usize, element: &T) -> Result<()> {
        (**self).insert(index, element)
    }

    #[inline]
    fn remove(&mut self, index: usize) -> Result<T> {
        (**self).remove(index)
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
pub(crate) fn check_bounds(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(crate::Error::IndexOutOfBounds { index, len });
    }
    Ok(())
}

#[inline]
pub(crate) fn check_insert_bounds(index: usize, len: usize) -> Result<()> {
    if index > len {
        return Err(crate::Error::IndexOutOfBounds { index, len });
    }
    Ok(())
}
