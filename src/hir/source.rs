//! File set: stable `FileId`s for paths, plus file contents.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::base::FileId;

/// Maps paths to `FileId`s and stores the text of each file.
///
/// Ids are never reused: removing a file and adding the same path again
/// yields a fresh id.
#[derive(Debug, Default)]
pub struct FileSet {
    inner: RwLock<FileSetInner>,
}

#[derive(Debug, Default)]
struct FileSetInner {
    path_to_id: IndexMap<PathBuf, FileId>,
    id_to_path: IndexMap<FileId, PathBuf>,
    contents: IndexMap<FileId, Arc<str>>,
    next_id: u32,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the `FileId` of a path.
    pub fn file_id(&self, path: &Path) -> FileId {
        // Fast path: read lock
        if let Some(&id) = self.inner.read().path_to_id.get(path) {
            return id;
        }

        let mut inner = self.inner.write();
        if let Some(&id) = inner.path_to_id.get(path) {
            return id;
        }
        let id = FileId::new(inner.next_id);
        inner.next_id += 1;
        inner.path_to_id.insert(path.to_owned(), id);
        inner.id_to_path.insert(id, path.to_owned());
        id
    }

    /// The `FileId` of a known path, without assigning one.
    pub fn lookup(&self, path: &Path) -> Option<FileId> {
        self.inner.read().path_to_id.get(path).copied()
    }

    pub fn path(&self, file: FileId) -> Option<PathBuf> {
        self.inner.read().id_to_path.get(&file).cloned()
    }

    pub fn set_contents(&self, file: FileId, contents: impl Into<Arc<str>>) {
        self.inner.write().contents.insert(file, contents.into());
    }

    pub fn contents(&self, file: FileId) -> Option<Arc<str>> {
        self.inner.read().contents.get(&file).cloned()
    }

    /// Forget a file; returns whether it was known.
    pub fn remove(&self, file: FileId) -> bool {
        let mut inner = self.inner.write();
        inner.contents.swap_remove(&file);
        match inner.id_to_path.swap_remove(&file) {
            Some(path) => {
                inner.path_to_id.swap_remove(&path);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().path_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn files(&self) -> Vec<FileId> {
        self.inner.read().id_to_path.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_set_id_assignment() {
        let files = FileSet::new();

        let id1 = files.file_id(Path::new("/default.nix"));
        let id2 = files.file_id(Path::new("/shell.nix"));
        let id3 = files.file_id(Path::new("/default.nix"));

        assert_ne!(id1, id2);
        assert_eq!(id1, id3);
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_file_set_contents() {
        let files = FileSet::new();
        let id = files.file_id(Path::new("/flake.nix"));

        assert!(files.contents(id).is_none());
        files.set_contents(id, "{ outputs = _: { }; }");
        assert_eq!(files.contents(id).as_deref(), Some("{ outputs = _: { }; }"));
    }

    #[test]
    fn test_file_set_remove_does_not_reuse_ids() {
        let files = FileSet::new();
        let path = Path::new("/a.nix");
        let id = files.file_id(path);
        files.set_contents(id, "1");

        assert!(files.remove(id));
        assert!(!files.remove(id));
        assert!(files.is_empty());
        assert_eq!(files.lookup(path), None);
        assert!(files.contents(id).is_none());
        assert_ne!(files.file_id(path), id);
    }

    #[test]
    fn test_file_set_path_lookup() {
        let files = FileSet::new();
        let path = Path::new("/lib/default.nix");
        let id = files.file_id(path);

        assert_eq!(files.path(id).as_deref(), Some(path));
        assert_eq!(files.lookup(path), Some(id));
    }
}
