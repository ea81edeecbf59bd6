//! Label table loading

use crate::assets::AssetSource;
use snapclass_core::{Error, Result};
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Ordered class names; the position of a label is its class index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    /// Read one label per line, trimming whitespace and skipping blank lines
    pub fn from_reader(reader: impl Read) -> io::Result<Self> {
        let mut labels = Vec::new();
        for line in BufReader::new(reader).lines() {
            let line = line?;
            let label = line.trim();
            if !label.is_empty() {
                labels.push(label.to_string());
            }
        }

        if labels.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "label file contains no labels",
            ));
        }

        Ok(Self { labels })
    }

    /// Load the label asset at `path`
    pub fn load(assets: &dyn AssetSource, path: &Path) -> Result<Self> {
        let table = assets
            .open(path)
            .and_then(Self::from_reader)
            .map_err(|e| Error::asset_read(path, e))?;

        tracing::debug!(path = %path.display(), labels = table.len(), "Loaded label table");
        Ok(table)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}
