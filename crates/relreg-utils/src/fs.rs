use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::trace;

use crate::error::{FileSystemError, FileSystemResult};

/// Kind of a directory entry after following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Broken symlinks, sockets, fifos and anything else that is neither a file nor a directory.
    Other,
}

/// A single entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

impl DirEntryInfo {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

pub trait FileSystemProvider {
    /// Removes the specified file or directory safely.
    ///
    /// If the path does not exist, this function returns `Ok(())` without error. Directories are
    /// removed recursively.
    ///
    /// # Errors
    ///
    /// Returns a [`FileSystemError::File`] if the removal fails for any reason other than
    /// the path not existing.
    fn safe_remove<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()>;

    /// Creates a directory structure if it doesn't exist.
    ///
    /// # Errors
    ///
    /// * [`FileSystemError::Directory`] if the directory could not be created.
    /// * [`FileSystemError::NotADirectory`] if the path exists but is not a directory.
    fn ensure_dir_exists<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()>;

    /// Removes the directory and everything below it, then creates it again empty.
    ///
    /// When this returns `Ok(())` the directory exists and is empty.
    fn recreate_dir<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()> {
        let path = path.as_ref();
        self.safe_remove(path)?;
        self.ensure_dir_exists(path)
    }

    /// Lists the immediate children of a directory, sorted by name.
    ///
    /// Symlinks are followed before the entry kind is decided, so a link to a directory is
    /// reported as [`EntryKind::Directory`] and a dangling link as [`EntryKind::Other`].
    /// Entries whose names are not valid UTF-8 are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`FileSystemError::Directory`] if the directory cannot be read.
    fn list_dir<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<Vec<DirEntryInfo>>;

    /// Writes `contents` to `path`, creating missing parent directories.
    ///
    /// The data is written to a hidden sibling file first and renamed into place, so readers
    /// never observe a partially written file.
    fn write_atomic<P: AsRef<Path>>(&self, path: P, contents: &[u8]) -> FileSystemResult<()>;
}

#[derive(Default, Clone)]
pub struct StandardFileSystemProvider;

impl FileSystemProvider for StandardFileSystemProvider {
    fn safe_remove<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()> {
        let path = path.as_ref();

        if fs::symlink_metadata(path).is_err() {
            return Ok(());
        }

        let result = if path.is_dir() && !path.is_symlink() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };

        result.map_err(|err| {
            FileSystemError::File {
                path: path.to_path_buf(),
                action: "remove",
                source: err,
            }
        })
    }

    fn ensure_dir_exists<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path).map_err(|err| {
                FileSystemError::Directory {
                    path: path.to_path_buf(),
                    action: "create",
                    source: err,
                }
            })?;
        } else if !path.is_dir() {
            return Err(FileSystemError::NotADirectory {
                path: path.to_path_buf(),
            });
        }

        Ok(())
    }

    fn list_dir<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<Vec<DirEntryInfo>> {
        let path = path.as_ref();
        let read_error = |err| {
            FileSystemError::Directory {
                path: path.to_path_buf(),
                action: "read",
                source: err,
            }
        };

        let mut entries = Vec::new();
        for entry in fs::read_dir(path).map_err(read_error)? {
            let entry = entry.map_err(read_error)?;
            let entry_path = entry.path();

            let Ok(name) = entry.file_name().into_string() else {
                trace!("skipping non utf-8 entry {}", entry_path.display());
                continue;
            };

            let kind = match fs::metadata(&entry_path) {
                Ok(meta) if meta.is_dir() => EntryKind::Directory,
                Ok(meta) if meta.is_file() => EntryKind::File,
                _ => EntryKind::Other,
            };

            entries.push(DirEntryInfo {
                name,
                path: entry_path,
                kind,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn write_atomic<P: AsRef<Path>>(&self, path: P, contents: &[u8]) -> FileSystemResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.ensure_dir_exists(parent)?;
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let staging = path.with_file_name(format!(".{file_name}.partial"));

        let write_error = |err| {
            FileSystemError::File {
                path: path.to_path_buf(),
                action: "write",
                source: err,
            }
        };

        fs::write(&staging, contents).map_err(write_error)?;
        fs::rename(&staging, path).map_err(|err| {
            let _ = fs::remove_file(&staging);
            write_error(err)
        })
    }
}

/// Creates a directory structure if it doesn't exist.
///
/// See [`FileSystemProvider::ensure_dir_exists`] for detailed documentation.
pub fn ensure_dir_exists<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    StandardFileSystemProvider.ensure_dir_exists(path)
}

/// Removes the specified file or directory safely.
///
/// See [`FileSystemProvider::safe_remove`] for detailed documentation.
pub fn safe_remove<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    StandardFileSystemProvider.safe_remove(path)
}

/// See [`FileSystemProvider::recreate_dir`].
pub fn recreate_dir<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    StandardFileSystemProvider.recreate_dir(path)
}

/// See [`FileSystemProvider::list_dir`].
pub fn list_dir<P: AsRef<Path>>(path: P) -> FileSystemResult<Vec<DirEntryInfo>> {
    StandardFileSystemProvider.list_dir(path)
}

/// See [`FileSystemProvider::write_atomic`].
pub fn write_atomic<P: AsRef<Path>>(path: P, contents: &[u8]) -> FileSystemResult<()> {
    StandardFileSystemProvider.write_atomic(path, contents)
}
