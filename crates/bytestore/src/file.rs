use std::{
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use memmap2::{MmapMut, MmapOptions};

use crate::{ByteStore, Error, PAGE_SIZE, Result, ceil_to_page_size_multiple, check_range};

/// Byte store backed by a single file, accessed through a mutable memory map.
///
/// The file grows in page-sized steps (doubling) as data is written, so the
/// mapping isn't recreated on every append. The logical length is tracked
/// separately and the file is trimmed back to it on `flush()` and `close()`,
/// which keeps the on-disk file exactly the flat sequence of written bytes.
#[derive(Debug)]
pub struct FileByteStore {
    path: PathBuf,
    inner: Option<OpenFile>,
}

#[derive(Debug)]
struct OpenFile {
    file: File,
    mmap: Option<MmapMut>,
    len: usize,
    reserved: usize,
}

impl FileByteStore {
    /// Creates a new, empty backing file at `path`, truncating any existing one.
    pub fn create_at(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        debug!("Created {}", path.display());

        Ok(Self {
            path: path.to_owned(),
            inner: Some(OpenFile {
                file,
                mmap: None,
                len: 0,
                reserved: 0,
            }),
        })
    }

    /// Opens an existing backing file; its current length becomes the store length.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len() as usize;
        let mmap = create_mmap_if_needed(&file, len)?;
        debug!("Opened {} ({len} bytes)", path.display());

        Ok(Self {
            path: path.to_owned(),
            inner: Some(OpenFile {
                file,
                mmap,
                len,
                reserved: len,
            }),
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    fn open_file(&self) -> Result<&OpenFile> {
        self.inner.as_ref().ok_or(Error::Closed)
    }

    #[inline]
    fn open_file_mut(&mut self) -> Result<&mut OpenFile> {
        self.inner.as_mut().ok_or(Error::Closed)
    }
}

impl OpenFile {
    /// Grows the file and remaps it so that `end` bytes are addressable.
    fn reserve(&mut self, end: usize) -> Result<()> {
        if end <= self.reserved {
            return Ok(());
        }

        let mut reserved = self.reserved.max(PAGE_SIZE);
        while reserved < end {
            reserved = reserved.checked_mul(2).ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "File size would overflow usize")
            })?;
        }
        let reserved = ceil_to_page_size_multiple(reserved);

        // Growing never invalidates the current map, which stays in place
        // until the new one exists.
        self.file.set_len(reserved as u64)?;
        let mmap = create_mmap_if_needed(&self.file, reserved)?;
        self.mmap = mmap;
        self.reserved = reserved;
        debug!("File grown to {reserved} bytes");
        Ok(())
    }

    /// Zeroes bytes between the logical end and `offset`, which may hold stale
    /// data left behind by a truncation.
    fn zero_gap(&mut self, offset: usize) {
        if offset > self.len
            && let Some(mmap) = self.mmap.as_mut()
        {
            mmap[self.len..offset].fill(0);
        }
    }

    fn trim(&mut self) -> Result<()> {
        if self.reserved == self.len {
            return Ok(());
        }
        self.mmap = None;
        if let Err(e) = self.file.set_len(self.len as u64) {
            self.mmap = create_mmap_if_needed(&self.file, self.reserved)?;
            return Err(e.into());
        }
        self.mmap = create_mmap_if_needed(&self.file, self.len)?;
        self.reserved = self.len;
        Ok(())
    }
}

impl ByteStore for FileByteStore {
    #[inline]
    fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |inner| inner.len)
    }

    fn read_into(&self, offset: usize, buf: &mut [u8]) -> Result<()> {
        let inner = self.open_file()?;
        check_range(offset, buf.len(), inner.len)?;
        if buf.is_empty() {
            return Ok(());
        }
        let mmap = inner.mmap.as_ref().ok_or(Error::Closed)?;
        buf.copy_from_slice(&mmap[offset..offset + buf.len()]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        let inner = self.open_file_mut()?;
        if data.is_empty() {
            return Ok(());
        }
        let end = offset + data.len();
        inner.reserve(end)?;
        inner.zero_gap(offset);
        let mmap = inner.mmap.as_mut().ok_or(Error::Closed)?;
        mmap[offset..end].copy_from_slice(data);
        inner.len = inner.len.max(end);
        Ok(())
    }

    fn truncate(&mut self, len: usize) -> Result<()> {
        let inner = self.open_file_mut()?;
        inner.len = inner.len.min(len);
        Ok(())
    }

    fn copy_within(&mut self, src: usize, dst: usize, len: usize) -> Result<()> {
        let inner = self.open_file_mut()?;
        check_range(src, len, inner.len)?;
        if len == 0 || src == dst {
            return Ok(());
        }
        let end = dst + len;
        inner.reserve(end)?;
        inner.zero_gap(dst);
        let mmap = inner.mmap.as_mut().ok_or(Error::Closed)?;
        mmap.copy_within(src..src + len, dst);
        inner.len = inner.len.max(end);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let inner = self.open_file_mut()?;
        if let Some(mmap) = inner.mmap.as_ref() {
            mmap.flush()?;
        }
        inner.trim()?;
        inner.file.sync_all()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.inner.is_none() {
            return Ok(());
        }
        self.flush()?;
        self.inner = None;
        debug!("Closed {}", self.path.display());
        Ok(())
    }

    #[inline]
    fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl Drop for FileByteStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close {}: {e}", self.path.display());
        }
    }
}

/// Maps `file` unless it is empty, which can't be mapped.
#[inline]
fn create_mmap_if_needed(file: &File, len: usize) -> Result<Option<MmapMut>> {
    if len == 0 {
        return Ok(None);
    }
    Ok(Some(unsafe { MmapOptions::new().map_mut(file)? }))
}
