//! File id interning.
//!
//! Traces refer to files by small integer ids announced once with an
//! `InternFile` record. An id announced twice means two traces were glued
//! together, which makes every later id ambiguous.

use crate::parser::FileId;
use crate::utils::error::ProfileError;
use std::collections::HashMap;

/// Bidirectional map between file ids and paths
#[derive(Debug, Clone, Default)]
pub struct FileTable {
    paths: HashMap<FileId, String>,
    ids: HashMap<String, Vec<FileId>>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id -> path`
    ///
    /// # Errors
    /// * `ProfileError::DuplicateFileId` - `id` was already registered
    pub fn register(&mut self, id: FileId, path: impl Into<String>) -> Result<(), ProfileError> {
        let path = path.into();
        if let Some(existing) = self.paths.get(&id) {
            return Err(ProfileError::DuplicateFileId {
                file_id: id,
                existing: existing.clone(),
                path,
            });
        }

        self.ids.entry(path.clone()).or_default().push(id);
        self.paths.insert(id, path);
        Ok(())
    }

    pub fn resolve(&self, id: FileId) -> Option<&str> {
        self.paths.get(&id).map(String::as_str)
    }

    /// Ids registered for a path, in registration order
    pub fn ids_for(&self, path: &str) -> &[FileId] {
        self.ids.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let mut table = FileTable::new();
        table.register(1, "lib/a.g").unwrap();
        table.register(2, "lib/b.g").unwrap();

        assert_eq!(table.resolve(1), Some("lib/a.g"));
        assert_eq!(table.resolve(3), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut table = FileTable::new();
        table.register(1, "lib/a.g").unwrap();

        let err = table.register(1, "lib/other.g").unwrap_err();
        assert!(matches!(err, ProfileError::DuplicateFileId { file_id: 1, .. }));
        // the first mapping survives
        assert_eq!(table.resolve(1), Some("lib/a.g"));
    }

    #[test]
    fn test_same_path_under_two_ids() {
        let mut table = FileTable::new();
        table.register(4, "a.g").unwrap();
        table.register(7, "a.g").unwrap();
        assert_eq!(table.ids_for("a.g"), &[4, 7]);
        assert!(table.ids_for("missing.g").is_empty());
    }
}
