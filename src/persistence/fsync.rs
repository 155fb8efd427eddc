//! fsync helpers for the settings file.
//!
//! A rename is only durable once the containing directory has been synced,
//! so an atomic save needs both of these.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Flushes a file's contents and metadata to disk.
pub fn fsync_file(file: &File) -> io::Result<()> {
    file.sync_all()
}

/// Flushes a directory's entries to disk.
///
/// Should only be called with directory paths.
pub fn fsync_dir(dir_path: &Path) -> io::Result<()> {
    OpenOptions::new().read(true).open(dir_path)?.sync_all()
}
