//! Read-only memory-mapped model weights

use crate::assets::AssetRegion;
use memmap2::{Mmap, MmapOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Serialized model bytes, mapped read-only from an asset region.
///
/// The mapping stays valid after the originating file handle is closed and
/// is released when the blob is dropped.
#[derive(Debug)]
pub struct ModelBlob {
    mmap: Mmap,
    path: PathBuf,
}

impl ModelBlob {
    /// Map `region` read-only
    pub fn map(region: &AssetRegion) -> io::Result<Self> {
        if region.length() == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "model asset is empty",
            ));
        }
        let len = usize::try_from(region.length()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "model asset too large to map")
        })?;

        // SAFETY: the mapping is read-only; assets are not modified while a
        // classifier holds them.
        let mmap = unsafe {
            MmapOptions::new()
                .offset(region.offset())
                .len(len)
                .map(region.file())?
        };

        tracing::debug!(
            path = %region.path().display(),
            offset = region.offset(),
            length = len,
            "Mapped model asset"
        );

        Ok(Self {
            mmap,
            path: region.path().to_path_buf(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Asset the blob was mapped from
    pub fn path(&self) -> &Path {
        &self.path
    }
}
