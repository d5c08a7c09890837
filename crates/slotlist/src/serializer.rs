use std::marker::PhantomData;

use crate::{Bytes, Error, Result};

/// Fixed-width binary encoding of one element type.
///
/// Every call to `serialize` appends exactly `element_size()` bytes, padding
/// with zeros when the natural encoding is shorter, so a slot can be found by
/// offset arithmetic alone. `deserialize` receives exactly one slot.
pub trait BinarySerializer<T> {
    /// Size in bytes of every serialized element. Fixed and at least 1.
    fn element_size(&self) -> usize;

    fn serialize(&self, output: &mut Vec<u8>, element: &T) -> Result<()>;

    fn deserialize(&self, input: &[u8]) -> Result<T>;

    /// Serializes `element` into a fresh slot, enforcing the fixed width.
    fn to_slot(&self, element: &T) -> Result<Vec<u8>> {
        let expected = self.element_size();
        let mut slot = Vec::with_capacity(expected);
        self.serialize(&mut slot, element)?;
        if slot.len() != expected {
            return Err(Error::WrongLength {
                expected,
                actual: slot.len(),
            });
        }
        Ok(slot)
    }
}

impl<T, S> BinarySerializer<T> for &S
where
    S: BinarySerializer<T> + ?Sized,
{
    #[inline]
    fn element_size(&self) -> usize {
        (**self).element_size()
    }

    #[inline]
    fn serialize(&self, output: &mut Vec<u8>, element: &T) -> Result<()> {
        (**self).serialize(output, element)
    }

    #[inline]
    fn deserialize(&self, input: &[u8]) -> Result<T> {
        (**self).deserialize(input)
    }
}

/// Serializer for [`Bytes`] types, zero-padded up to a declared slot size.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveSerializer<T> {
    element_size: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> PrimitiveSerializer<T>
where
    T: Bytes,
{
    /// Slots of exactly the natural width of `T`.
    pub fn natural() -> Self {
        Self {
            element_size: T::SIZE,
            _marker: PhantomData,
        }
    }

    /// Slots of `element_size` bytes, which can't be below the natural width.
    pub fn with_element_size(element_size: usize) -> Result<Self> {
        if element_size == 0 {
            return Err(Error::InvalidElementSize);
        }
        if element_size < T::SIZE {
            return Err(Error::ElementSizeTooSmall {
                declared: element_size,
                natural: T::SIZE,
            });
        }
        Ok(Self {
            element_size,
            _marker: PhantomData,
        })
    }
}

impl<T> Default for PrimitiveSerializer<T>
where
    T: Bytes,
{
    fn default() -> Self {
        Self::natural()
    }
}

impl<T> BinarySerializer<T> for PrimitiveSerializer<T>
where
    T: Bytes,
{
    #[inline]
    fn element_size(&self) -> usize {
        self.element_size
    }

    fn serialize(&self, output: &mut Vec<u8>, element: &T) -> Result<()> {
        let start = output.len();
        element.extend_bytes(output);
        output.resize(start + self.element_size, 0);
        Ok(())
    }

    fn deserialize(&self, input: &[u8]) -> Result<T> {
        if input.len() != self.element_size {
            return Err(Error::WrongLength {
                expected: self.element_size,
                actual: input.len(),
            });
        }
        T::from_bytes(&input[..T::SIZE])
    }
}
