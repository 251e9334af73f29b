// src/fs.rs

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Abstract filesystem interface.
///
/// Covers exactly what the config loader and the transformation pipeline
/// need: whole-file reads, one-level directory listing, and atomic
/// whole-file writes.
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Write `contents` to `path` atomically: the file either keeps its old
    /// content or holds the new content in full, never a partial write.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()>;

    fn is_file(&self, path: &Path) -> bool;

    /// Return the entries of a directory, one level deep, as full paths.
    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading file {:?}", path))
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
            }
        }

        // Stage next to the destination so the rename stays on one filesystem.
        let staged = staging_path(path);
        fs::write(&staged, contents).with_context(|| format!("writing to file {:?}", staged))?;
        fs::rename(&staged, path)
            .with_context(|| format!("renaming {:?} into place at {:?}", staged, path))?;
        Ok(())
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
