//! Scoped, resizable memory map over a file.
//!
//! The handle is acquired with [`TrimmableMap::open`] or
//! [`TrimmableMap::open_writable`] and released either explicitly with
//! [`TrimmableMap::close`] or implicitly on drop. Releasing a writable map
//! flushes it and truncates the backing file to the logical length, so a
//! trimmed map never leaves stale bytes behind.
use crate::{AzulejoError, Result};
use memmap2::{Mmap, MmapMut};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

enum View {
    // Zero-length files cannot be mapped.
    Empty,
    ReadOnly(Mmap),
    Writable(MmapMut),
}

pub struct TrimmableMap {
    path: PathBuf,
    file: File,
    view: View,
    len: usize,
    writable: bool,
    released: bool,
}

impl TrimmableMap {
    /// Map a file read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AzulejoError::InputNotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;
        Self::acquire(path, file, false)
    }

    /// Map a file for in-place mutation and trimming.
    pub fn open_writable<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AzulejoError::InputNotFound(path.to_path_buf()));
        }
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Self::acquire(path, file, true)
    }

    fn acquire(path: &Path, file: File, writable: bool) -> Result<Self> {
        let len = usize::try_from(file.metadata()?.len())
            .map_err(|_| {
                AzulejoError::InvalidInput(format!("{} is too large to map", path.display()))
            })?;
        let view = Self::map(&file, len, writable)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            view,
            len,
            writable,
            released: false,
        })
    }

    fn map(file: &File, len: usize, writable: bool) -> Result<View> {
        if len == 0 {
            return Ok(View::Empty);
        }
        // Safety: the file handle is owned by the map for its whole lifetime.
        let view = if writable {
            View::Writable(unsafe { MmapMut::map_mut(file)? })
        } else {
            View::ReadOnly(unsafe { Mmap::map(file)? })
        };
        Ok(view)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Logical length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.view {
            View::Empty => &[],
            View::ReadOnly(map) => &map[..self.len],
            View::Writable(map) => &map[..self.len],
        }
    }

    pub fn as_bytes_mut(&mut self) -> Result<&mut [u8]> {
        let len = self.len;
        match &mut self.view {
            View::Writable(map) => Ok(&mut map[..len]),
            View::Empty => Ok(&mut []),
            View::ReadOnly(_) => Err(AzulejoError::InvalidInput(format!(
                "{} is mapped read-only",
                self.path.display()
            ))),
        }
    }

    /// Shrink the logical length. The file is truncated on release.
    pub fn trim(&mut self, new_len: usize) -> Result<()> {
        if !self.writable {
            return Err(AzulejoError::InvalidInput(format!(
                "cannot trim read-only map of {}",
                self.path.display()
            )));
        }
        if new_len > self.len {
            return Err(AzulejoError::InvalidInput(format!(
                "cannot trim {} bytes to {}",
                self.len, new_len
            )));
        }
        self.len = new_len;
        Ok(())
    }

    /// Grow or shrink the backing file and remap it.
    pub fn resize(&mut self, new_len: usize) -> Result<()> {
        if !self.writable {
            return Err(AzulejoError::InvalidInput(format!(
                "cannot resize read-only map of {}",
                self.path.display()
            )));
        }
        if let View::Writable(map) = &self.view {
            map.flush()?;
        }
        self.view = View::Empty;
        self.file.set_len(new_len as u64)?;
        self.view = Self::map(&self.file, new_len, true)?;
        self.len = new_len;
        Ok(())
    }

    /// Flush, unmap and truncate the file to its logical length.
    pub fn close(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        if let View::Writable(map) = &self.view {
            map.flush()?;
        }
        self.view = View::Empty;

        if self.writable {
            self.file.set_len(self.len as u64)?;
            self.file.sync_all()?;
            debug!("Released {} at {} bytes", self.path.display(), self.len);
        }
        Ok(())
    }
}

impl Drop for TrimmableMap {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("Failed to release map of {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_trim_truncates_on_close() {
        let file = file_with(b"0123456789");
        let mut map = TrimmableMap::open_writable(file.path()).unwrap();
        map.trim(4).unwrap();
        assert_eq!(map.as_bytes(), b"0123");
        map.close().unwrap();
        assert_eq!(std::fs::read(file.path()).unwrap(), b"0123");
    }

    #[test]
    fn test_trim_truncates_on_early_exit() {
        let file = file_with(b"abcdefgh");

        fn body(path: &Path) -> Result<()> {
            let mut map = TrimmableMap::open_writable(path)?;
            map.trim(3)?;
            Err(AzulejoError::InvalidInput("bail out".to_string()))
        }

        assert!(body(file.path()).is_err());
        assert_eq!(std::fs::read(file.path()).unwrap(), b"abc");
    }

    #[test]
    fn test_resize_grows_and_writes() {
        let file = file_with(b"ab");
        let mut map = TrimmableMap::open_writable(file.path()).unwrap();
        map.resize(4).unwrap();
        map.as_bytes_mut().unwrap()[2..].copy_from_slice(b"cd");
        map.close().unwrap();
        assert_eq!(std::fs::read(file.path()).unwrap(), b"abcd");
    }

    #[test]
    fn test_read_only_cannot_trim() {
        let file = file_with(b"xyz");
        let mut map = TrimmableMap::open(file.path()).unwrap();
        assert!(map.trim(1).is_err());
        assert!(map.as_bytes_mut().is_err());
        drop(map);
        assert_eq!(std::fs::read(file.path()).unwrap(), b"xyz");
    }

    #[test]
    fn test_empty_file() {
        let file = file_with(b"");
        let map = TrimmableMap::open(file.path()).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.as_bytes(), b"");
    }
}
