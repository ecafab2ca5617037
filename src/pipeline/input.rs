//! Input discovery: prepare the destination and enumerate source documents.
//!
//! Listing is non-recursive and matches extensions case-insensitively, so
//! `Report.PDF` is picked up alongside `invoice.pdf`. Directory order is
//! filesystem-dependent; [`list_inputs`] sorts by file name unless told not
//! to.

use crate::error::BatchError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A document found in the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: PathBuf,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name including extension, lossily decoded.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without its final extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Create `dest_dir` and any missing parents. Succeeds if it already exists.
pub fn ensure_destination(dest_dir: &Path) -> Result<(), BatchError> {
    std::fs::create_dir_all(dest_dir).map_err(|e| BatchError::DestinationCreateFailed {
        path: dest_dir.to_path_buf(),
        source: e,
    })?;
    debug!("Destination ready: {}", dest_dir.display());
    Ok(())
}

/// List regular files directly inside `source_dir` whose extension equals
/// `extension` (ASCII case-insensitive, no leading dot).
pub fn list_inputs(
    source_dir: &Path,
    extension: &str,
    sort: bool,
) -> Result<Vec<SourceFile>, BatchError> {
    let list_err = |e: std::io::Error| BatchError::SourceListFailed {
        path: source_dir.to_path_buf(),
        source: e,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(source_dir).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if has_extension(&path, extension) {
            files.push(SourceFile::new(path));
        }
    }

    if sort {
        files.sort_by_key(|f| f.file_name());
    }

    debug!(
        "Listed {} .{} files in {}",
        files.len(),
        extension,
        source_dir.display()
    );
    Ok(files)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}
