use std::{iter::FusedIterator, marker::PhantomData};

use crate::{ElementStore, Result, check_insert_bounds};

/// List surface over an [`ElementStore`].
///
/// Holds no element cache: every read decodes from the store and every write
/// goes straight to it, so what a list observes is exactly what the store
/// holds. Element types only need `PartialEq` for the searching methods.
#[derive(Debug)]
#[must_use = "List should be kept to access the elements"]
pub struct StoreList<T, S> {
    store: S,
    _marker: PhantomData<fn() -> T>,
}

impl<T, S> StoreList<T, S>
where
    S: ElementStore<T>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Result<T> {
        self.store.get(index)
    }

    /// Replaces the element at `index`, returning the previous one.
    pub fn set(&mut self, index: usize, element: T) -> Result<T> {
        let previous = self.store.get(index)?;
        self.store.set(index, &element)?;
        Ok(previous)
    }

    #[inline]
    pub fn push(&mut self, element: T) -> Result<()> {
        self.store.push(&element)
    }

    /// Alias of [`push`](Self::push).
    #[inline]
    pub fn add(&mut self, element: T) -> Result<()> {
        self.push(element)
    }

    #[inline]
    pub fn insert(&mut self, index: usize, element: T) -> Result<()> {
        self.store.insert(index, &element)
    }

    pub fn add_all<I>(&mut self, elements: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        elements
            .into_iter()
            .try_for_each(|element| self.store.push(&element))
    }

    /// Inserts `elements` one by one at ascending indices starting at `index`.
    pub fn insert_all<I>(&mut self, index: usize, elements: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        check_insert_bounds(index, self.len())?;
        elements
            .into_iter()
            .enumerate()
            .try_for_each(|(i, element)| self.store.insert(index + i, &element))
    }

    /// Removes and returns the element at `index`.
    #[inline]
    pub fn remove(&mut self, index: usize) -> Result<T> {
        self.store.remove(index)
    }

    /// Empties the list, last element first.
    pub fn clear(&mut self) -> Result<()> {
        for index in (0..self.len()).rev() {
            self.store.remove(index)?;
        }
        Ok(())
    }

    pub fn iter(&self) -> Iter<'_, T, S> {
        Iter {
            store: &self.store,
            index: 0,
            end: self.store.len(),
            _marker: PhantomData,
        }
    }

    pub fn to_vec(&self) -> Result<Vec<T>> {
        self.iter().collect()
    }

    #[inline]
    pub fn flush(&mut self) -> Result<()> {
        self.store.flush()
    }

    #[inline]
    pub fn close(&mut self) -> Result<()> {
        self.store.close()
    }

    /// Chunk count of the underlying store, `None` when it isn't chunked.
    #[inline]
    pub fn chunk_count(&self) -> Option<usize> {
        self.store.chunk_count()
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[inline]
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<T, S> StoreList<T, S>
where
    T: PartialEq,
    S: ElementStore<T>,
{
    pub fn index_of(&self, element: &T) -> Result<Option<usize>> {
        for (index, current) in self.iter().enumerate() {
            if current? == *element {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    #[inline]
    pub fn contains(&self, element: &T) -> Result<bool> {
        Ok(self.index_of(element)?.is_some())
    }

    /// Removes the first element equal to `element`, if any.
    pub fn remove_value(&mut self, element: &T) -> Result<bool> {
        match self.index_of(element)? {
            Some(index) => {
                self.store.remove(index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl<T, S> From<S> for StoreList<T, S>
where
    S: ElementStore<T>,
{
    fn from(store: S) -> Self {
        Self::new(store)
    }
}

impl<'a, T, S> IntoIterator for &'a StoreList<T, S>
where
    S: ElementStore<T>,
{
    type Item = Result<T>;
    type IntoIter = Iter<'a, T, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Decoding iterator over a [`StoreList`], front to back.
#[derive(Debug)]
pub struct Iter<'a, T, S> {
    store: &'a S,
    index: usize,
    end: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T, S> Iterator for Iter<'_, T, S>
where
    S: ElementStore<T>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.end {
            return None;
        }
        let item = self.store.get(self.index);
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.index;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.index = self.index.saturating_add(n).min(self.end);
        self.next()
    }
}

impl<T, S> DoubleEndedIterator for Iter<'_, T, S>
where
    S: ElementStore<T>,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.index >= self.end {
            return None;
        }
        self.end -= 1;
        Some(self.store.get(self.end))
    }
}

impl<T, S> ExactSizeIterator for Iter<'_, T, S> where S: ElementStore<T> {}

impl<T, S> FusedIterator for Iter<'_, T, S> where S: ElementStore<T> {}
