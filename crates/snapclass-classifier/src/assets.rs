//! Asset access for label and model files
//!
//! An [`AssetSource`] hands out readers for text assets and mappable file
//! regions for model weights. Regions carry a start offset and a declared
//! length so a model packed inside a larger bundle can be mapped in place.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// Readable region of an asset file
#[derive(Debug)]
pub struct AssetRegion {
    file: File,
    path: PathBuf,
    offset: u64,
    length: u64,
}

impl AssetRegion {
    /// Region covering the whole of `file`
    pub fn whole_file(path: impl Into<PathBuf>, file: File) -> io::Result<Self> {
        let length = file.metadata()?.len();
        Ok(Self {
            file,
            path: path.into(),
            offset: 0,
            length,
        })
    }

    /// Narrow to `length` bytes starting `offset` bytes into this region
    pub fn sub_region(self, offset: u64, length: u64) -> io::Result<Self> {
        let end = offset.checked_add(length).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "asset region overflows")
        })?;
        if end > self.length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "asset region {}..{} exceeds asset length {}",
                    offset, end, self.length
                ),
            ));
        }

        Ok(Self {
            offset: self.offset + offset,
            length,
            ..self
        })
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start offset within the file
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Declared length in bytes
    pub fn length(&self) -> u64 {
        self.length
    }
}

/// Source of bundled assets
pub trait AssetSource: Send + Sync {
    /// Open a text asset for sequential reading
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;

    /// Open an asset as a mappable region
    fn open_region(&self, path: &Path) -> io::Result<AssetRegion>;
}

/// Assets served from a directory on disk
#[derive(Debug, Clone)]
pub struct DirAssetSource {
    root: PathBuf,
}

impl DirAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl AssetSource for DirAssetSource {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        let file = File::open(self.resolve(path))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn open_region(&self, path: &Path) -> io::Result<AssetRegion> {
        let full = self.resolve(path);
        let file = File::open(&full)?;
        AssetRegion::whole_file(full, file)
    }
}
