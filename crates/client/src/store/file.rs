//! File-backed cart store.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use cartsync_core::CartModel;
use tracing::debug;

use super::{LocalCartStore, LocalStoreError, decode_record, encode_record};

/// A cart store persisting one JSON record on disk.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// record, so a crash mid-write leaves the previous record intact.
#[derive(Debug, Clone)]
pub struct FileCartStore {
    path: PathBuf,
}

impl FileCartStore {
    /// Create a store for the given record path. Nothing is touched on disk
    /// until the first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the record.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl LocalCartStore for FileCartStore {
    fn read(&self) -> Result<Option<CartModel>, LocalStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            // Non-UTF-8 content is a damaged record, not a storage failure
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(LocalStoreError::Corrupt(e.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        decode_record(&raw).map(Some)
    }

    fn write(&self, cart: &CartModel) -> Result<(), LocalStoreError> {
        let raw = encode_record(cart)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let temp = self.temp_path();
        fs::write(&temp, raw)?;
        fs::rename(&temp, &self.path)?;

        debug!(path = %self.path.display(), items = cart.len(), "Cart record written");
        Ok(())
    }

    fn erase(&self) -> Result<(), LocalStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Cart record erased");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
