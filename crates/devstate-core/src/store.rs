//! Plain-text status files.
//!
//! Two files are persisted: the device mode (`normal` / `flight`) and the
//! devlock boot flag (`yes` / `no`). Paths are relative to whatever root the
//! store implementation was created with.

use std::collections::HashMap;

use crate::error::StoreError;

/// Storage for small status strings.
pub trait StatusStore {
    /// Contents of `path`, or `None` if it was never written.
    fn read_string(&self, path: &str) -> Result<Option<String>, StoreError>;

    /// Replace the contents of `path` with `value`.
    fn write_string(&mut self, path: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory status store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: HashMap<String, String>,
    writes: usize,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with one file.
    #[must_use]
    pub fn with_file(mut self, path: &str, value: &str) -> Self {
        self.files.insert(path.to_string(), value.to_string());
        self
    }

    /// Current contents of `path`.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl StatusStore for MemoryStore {
    fn read_string(&self, path: &str) -> Result<Option<String>, StoreError> {
        Ok(self.files.get(path).cloned())
    }

    fn write_string(&mut self, path: &str, value: &str) -> Result<(), StoreError> {
        self.files.insert(path.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_none() {
        let store = MemoryStore::new();
        assert_eq!(store.read_string("mode"), Ok(None));
    }

    #[test]
    fn write_replaces_contents() {
        let mut store = MemoryStore::new().with_file("mode", "normal");
        store.write_string("mode", "flight").unwrap();

        assert_eq!(store.read_string("mode"), Ok(Some("flight".to_string())));
        assert_eq!(store.write_count(), 1);
    }
}
