//! Status files on disk.
//!
//! Each status path is a file under the state directory. Writes go through a
//! temporary sibling and a rename, so a crash never leaves a torn value.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use devstate_core::{StatusStore, StoreError};

use crate::error::RuntimeError;

/// Status store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Store under `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, RuntimeError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|source| RuntimeError::StateDir { path: root.clone(), source })?;
        Ok(Self { root })
    }

    /// Directory holding the status files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

fn io_error(path: &Path, err: &io::Error) -> StoreError {
    StoreError::Io { path: path.display().to_string(), reason: err.to_string() }
}

impl StatusStore for FileStore {
    fn read_string(&self, name: &str) -> Result<Option<String>, StoreError> {
        let path = self.path(name);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value.trim_end().to_string())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(&path, &err)),
        }
    }

    fn write_string(&mut self, name: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path(name);
        let tmp = self.path(&format!(".{name}.tmp"));

        fs::write(&tmp, format!("{value}\n")).map_err(|err| io_error(&tmp, &err))?;
        fs::rename(&tmp, &path).map_err(|err| io_error(&path, &err))?;
        tracing::trace!(path = %path.display(), value, "status file written");
        Ok(())
    }
}
