use crate::{ByteStore, Result, check_range};

/// Growable in-memory byte store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrayByteStore {
    data: Vec<u8>,
}

impl ArrayByteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl ByteStore for ArrayByteStore {
    #[inline]
    fn len(&self) -> usize {
        self.data.len()
    }

    fn read_into(&self, offset: usize, buf: &mut [u8]) -> Result<()> {
        check_range(offset, buf.len(), self.data.len())?;
        buf.copy_from_slice(&self.data[offset..offset + buf.len()]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        let end = offset + data.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[offset..end].copy_from_slice(data);
        Ok(())
    }

    fn truncate(&mut self, len: usize) -> Result<()> {
        self.data.truncate(len);
        Ok(())
    }

    fn copy_within(&mut self, src: usize, dst: usize, len: usize) -> Result<()> {
        check_range(src, len, self.data.len())?;
        if len == 0 {
            return Ok(());
        }
        let end = dst + len;
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data.copy_within(src..src + len, dst);
        Ok(())
    }

    /// Nothing to release for memory.
    #[inline]
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
