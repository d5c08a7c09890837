use std::marker::PhantomData;

use serde::{Serialize, de::DeserializeOwned};

use crate::{BinarySerializer, Error, Result};

const SIZE_OF_PREFIX: usize = size_of::<u32>();

/// Serializer for any serde type, stored as a length-prefixed JSON payload.
///
/// Slot layout: a 4-byte little-endian payload length, the payload, then
/// zero padding up to `element_size`. Elements whose payload doesn't fit are
/// rejected at serialization time; pick the slot size for the largest value
/// the list will hold.
#[derive(Debug)]
pub struct ObjectSerializer<T> {
    element_size: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ObjectSerializer<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ObjectSerializer<T> {}

impl<T> ObjectSerializer<T> {
    pub fn new(element_size: usize) -> Result<Self> {
        if element_size == 0 {
            return Err(Error::InvalidElementSize);
        }
        Ok(Self {
            element_size,
            _marker: PhantomData,
        })
    }

    /// Largest payload a slot can carry.
    #[inline]
    pub fn max_payload(&self) -> usize {
        self.element_size.saturating_sub(SIZE_OF_PREFIX)
    }
}

impl<T> BinarySerializer<T> for ObjectSerializer<T>
where
    T: Serialize + DeserializeOwned,
{
    #[inline]
    fn element_size(&self) -> usize {
        self.element_size
    }

    fn serialize(&self, output: &mut Vec<u8>, element: &T) -> Result<()> {
        let payload = serde_json::to_vec(element)?;
        let too_large = || Error::PayloadTooLarge {
            payload: payload.len(),
            element_size: self.element_size,
        };
        if SIZE_OF_PREFIX + payload.len() > self.element_size {
            return Err(too_large());
        }
        let prefix = u32::try_from(payload.len()).map_err(|_| too_large())?;

        let start = output.len();
        output.extend_from_slice(&prefix.to_le_bytes());
        output.extend_from_slice(&payload);
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
        let Some((prefix, rest)) = input.split_first_chunk::<SIZE_OF_PREFIX>() else {
            return Err(Error::CorruptedSlot(format!(
                "{}-byte slot can't hold a length prefix",
                input.len()
            )));
        };
        let len = u32::from_le_bytes(*prefix) as usize;
        if len > rest.len() {
            return Err(Error::CorruptedSlot(format!(
                "payload length {len} exceeds slot capacity {}",
                rest.len()
            )));
        }
        Ok(serde_json::from_slice(&rest[..len])?)
    }
}
