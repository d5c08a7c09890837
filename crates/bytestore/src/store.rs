use crate::{Error, Result};

/// Positional, byte-addressable storage over some medium.
///
/// Offsets are absolute within the store. Reads must stay within `len()`;
/// writes may start at or past the end, in which case the store grows and any
/// gap is zero-filled.
pub trait ByteStore {
    /// Current length of the store in bytes.
    fn len(&self) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fills `buf` with the bytes at `offset..offset + buf.len()`.
    fn read_into(&self, offset: usize, buf: &mut [u8]) -> Result<()>;

    /// Reads `len` bytes starting at `offset`.
    fn read(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0; len];
        self.read_into(offset, &mut buf)?;
        Ok(buf)
    }

    /// Writes `data` at `offset`, extending the store if needed.
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<()>;

    /// Shrinks the store to `len` bytes. Truncating to a length at or past the
    /// current one does nothing.
    fn truncate(&mut self, len: usize) -> Result<()>;

    /// Copies `len` bytes from `src` to `dst`. The ranges may overlap.
    fn copy_within(&mut self, src: usize, dst: usize, len: usize) -> Result<()> {
        if len == 0 || src == dst {
            return Ok(());
        }
        let bytes = self.read(src, len)?;
        self.write(dst, &bytes)
    }

    /// Pushes buffered bytes to the medium.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Releases the medium. Closing an already closed store does nothing.
    fn close(&mut self) -> Result<()>;

    fn is_closed(&self) -> bool {
        false
    }
}

impl<S> ByteStore for Box<S>
where
    S: ByteStore + ?Sized,
{
    #[inline]
    fn len(&self) -> usize {
        (**self).len()
    }

    #[inline]
    fn read_into(&self, offset: usize, buf: &mut [u8]) -> Result<()> {
        (**self).read_into(offset, buf)
    }

    #[inline]
    fn read(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        (**self).read(offset, len)
    }

    #[inline]
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        (**self).write(offset, data)
    }

    #[inline]
    fn truncate(&mut self, len: usize) -> Result<()> {
        (**self).truncate(len)
    }

    #[inline]
    fn copy_within(&mut self, src: usize, dst: usize, len: usize) -> Result<()> {
        (**self).copy_within(src, dst, len)
    }

    #[inline]
    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    #[inline]
    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    #[inline]
    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

/// Fails with `OutOfBounds` unless `offset..offset + len` lies within `store_len`.
#[inline]
pub fn check_range(offset: usize, len: usize, store_len: usize) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= store_len => Ok(()),
        _ => Err(Error::OutOfBounds {
            offset,
            len,
            store_len,
        }),
    }
}
