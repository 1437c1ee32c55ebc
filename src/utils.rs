//! File helpers shared by the file-level API and the CLI.

use crate::error::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

fn reject_symlink(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => Err(Error::Validation(format!(
            "refusing to follow symbolic link: {}",
            path.display()
        ))),
        _ => Ok(()),
    }
}

/// Open an existing file for reading.
///
/// Symbolic links are rejected unless `allow_symlinks` is set.
pub fn safe_open_file(path: &Path, allow_symlinks: bool) -> Result<File> {
    if !allow_symlinks {
        reject_symlink(path)?;
    }
    Ok(File::open(path)?)
}

/// Create (or truncate) a file for writing, creating missing parent directories.
pub fn safe_create_file(path: &Path, allow_symlinks: bool) -> Result<File> {
    if !allow_symlinks {
        reject_symlink(path)?;
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?)
}

pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    let mut file = safe_open_file(path, false)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    Ok(data)
}

pub fn read_file_to_string(path: &Path) -> Result<String> {
    let mut file = safe_open_file(path, false)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(content)
}

pub fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = safe_create_file(path, false)?;
    file.write_all(data)?;
    file.flush()?;
    Ok(())
}
