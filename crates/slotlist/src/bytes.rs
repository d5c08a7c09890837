use std::fmt::Debug;

use crate::{Error, Result};

/// Types with a fixed-width binary encoding.
///
/// Encodings are little-endian so that files are portable across
/// architectures.
pub trait Bytes: Sized + Debug + Clone + 'static {
    /// Natural width in bytes of the encoding.
    const SIZE: usize;

    /// Appends exactly `SIZE` bytes to `out`.
    fn extend_bytes(&self, out: &mut Vec<u8>);

    /// Decodes a value from exactly `SIZE` bytes.
    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}

macro_rules! impl_bytes_for_numeric {
    ($($t:ty),*) => {
        $(
            impl Bytes for $t {
                const SIZE: usize = size_of::<$t>();

                #[inline]
                fn extend_bytes(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn from_bytes(bytes: &[u8]) -> Result<Self> {
                    let arr: [u8; size_of::<$t>()] =
                        bytes.try_into().map_err(|_| Error::WrongLength {
                            expected: size_of::<$t>(),
                            actual: bytes.len(),
                        })?;
                    Ok(<$t>::from_le_bytes(arr))
                }
            }
        )*
    };
}

impl_bytes_for_numeric!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64
);

impl Bytes for bool {
    const SIZE: usize = 1;

    #[inline]
    fn extend_bytes(&self, out: &mut Vec<u8>) {
        out.push(u8::from(*self));
    }

    #[inline]
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes {
            [0] => Ok(false),
            [1] => Ok(true),
            [b] => Err(Error::CorruptedSlot(format!("invalid bool byte {b}"))),
            _ => Err(Error::WrongLength {
                expected: 1,
                actual: bytes.len(),
            }),
        }
    }
}
