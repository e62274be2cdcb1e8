//! `AnalysisHost` owns the files; `Analysis` is an immutable snapshot of them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use super::goto::goto_definition;
use super::navigation::NavigationTarget;
use super::references::{Reference, find_references};
use super::semantic_tokens::{SemanticToken, semantic_tokens};
use crate::base::{FileId, LineIndex, TextSize};
use crate::hir::{Diagnostic, DiagnosticsConfig, FileSet, check_file, syntax_diagnostics};
use crate::syntax::{Parse, SyntaxNode, parse};

/// Failure to bring a file from disk into an [`AnalysisHost`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One parsed file of a snapshot.
#[derive(Clone, Debug)]
pub struct FileData {
    path: PathBuf,
    text: Arc<str>,
    parse: Parse,
    line_index: Arc<LineIndex>,
}

impl FileData {
    fn new(path: PathBuf, text: Arc<str>) -> Self {
        let parse = parse(&text);
        let line_index = Arc::new(LineIndex::new(&text));
        Self {
            path,
            text,
            parse,
            line_index,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &Arc<str> {
        &self.text
    }

    pub fn parse(&self) -> &Parse {
        &self.parse
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }
}

/// The mutable side: files are added, changed and removed here.
///
/// ```
/// use nixref::ide::AnalysisHost;
///
/// let mut host = AnalysisHost::new();
/// let file = host.set_file_content("default.nix", "let x = 1; in x");
/// let analysis = host.analysis();
/// assert!(analysis.diagnostics(file, &Default::default()).is_empty());
/// ```
#[derive(Debug, Default)]
pub struct AnalysisHost {
    file_set: FileSet,
    files: Arc<IndexMap<FileId, FileData>>,
}

impl AnalysisHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the text of a file, parsing it; returns the file's id.
    pub fn set_file_content(&mut self, path: impl AsRef<Path>, text: impl Into<Arc<str>>) -> FileId {
        let path = path.as_ref();
        let text = text.into();
        let file = self.file_set.file_id(path);
        self.file_set.set_contents(file, text.clone());
        let data = FileData::new(path.to_owned(), text);
        debug!(%file, path = %path.display(), errors = data.parse.errors().len(), "file updated");
        Arc::make_mut(&mut self.files).insert(file, data);
        file
    }

    /// Read a file from disk and add it.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<FileId, LoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_owned(),
            source,
        })?;
        info!(path = %path.display(), "loaded file");
        Ok(self.set_file_content(path, text))
    }

    /// Forget a file; returns whether it was known.
    pub fn remove_file(&mut self, file: FileId) -> bool {
        let removed = Arc::make_mut(&mut self.files).shift_remove(&file).is_some();
        self.file_set.remove(file);
        removed
    }

    pub fn file_id(&self, path: impl AsRef<Path>) -> Option<FileId> {
        self.file_set.lookup(path.as_ref())
    }

    /// A snapshot of the current files. Later changes to the host do not
    /// affect it.
    pub fn analysis(&self) -> Analysis {
        Analysis {
            files: Arc::clone(&self.files),
        }
    }
}

/// An immutable, cheaply clonable view of all files. `Send + Sync`.
#[derive(Clone, Debug)]
pub struct Analysis {
    files: Arc<IndexMap<FileId, FileData>>,
}

impl Analysis {
    pub fn file(&self, file: FileId) -> Option<&FileData> {
        self.files.get(&file)
    }

    pub fn file_ids(&self) -> impl Iterator<Item = FileId> + '_ {
        self.files.keys().copied()
    }

    /// A fresh red tree for `file`, owned by the calling thread.
    pub fn syntax(&self, file: FileId) -> Option<SyntaxNode> {
        self.file(file).map(|data| data.parse.syntax_node())
    }

    /// Syntax errors followed by semantic diagnostics.
    pub fn diagnostics(&self, file: FileId, config: &DiagnosticsConfig) -> Vec<Diagnostic> {
        let Some(data) = self.file(file) else {
            return Vec::new();
        };
        let mut diagnostics = syntax_diagnostics(file, data.parse.errors(), &data.line_index);
        diagnostics.extend(check_file(file, &data.parse.tree(), &data.line_index, config));
        diagnostics
    }

    /// Diagnostics for every file, checked in parallel.
    pub fn diagnostics_all(&self, config: &DiagnosticsConfig) -> Vec<(FileId, Vec<Diagnostic>)> {
        let files: Vec<FileId> = self.file_ids().collect();
        files
            .par_iter()
            .map(|&file| (file, self.diagnostics(file, config)))
            .collect()
    }

    pub fn goto_definition(&self, file: FileId, offset: TextSize) -> Vec<NavigationTarget> {
        goto_definition(self, file, offset)
    }

    pub fn find_references(&self, file: FileId, offset: TextSize) -> Vec<Reference> {
        find_references(self, file, offset)
    }

    pub fn semantic_tokens(&self, file: FileId) -> Vec<SemanticToken> {
        semantic_tokens(self, file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_analysis_is_send_sync() {
        fn check<T: Send + Sync>() {}
        check::<Analysis>();
    }

    #[test]
    fn test_set_file_content_reuses_id() {
        let mut host = AnalysisHost::new();
        let first = host.set_file_content("/a.nix", "1");
        let second = host.set_file_content("/a.nix", "2");
        assert_eq!(first, second);
        assert_eq!(host.file_id("/a.nix"), Some(first));
        assert_eq!(host.analysis().file(first).unwrap().text().as_ref(), "2");
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_changes() {
        let mut host = AnalysisHost::new();
        let file = host.set_file_content("/a.nix", "x");
        let before = host.analysis();
        host.set_file_content("/a.nix", "let x = 1; in x");

        assert_eq!(before.diagnostics(file, &DiagnosticsConfig::default()).len(), 1);
        assert!(host.analysis().diagnostics(file, &DiagnosticsConfig::default()).is_empty());
    }

    #[test]
    fn test_remove_file() {
        let mut host = AnalysisHost::new();
        let file = host.set_file_content("/a.nix", "x");
        assert!(host.remove_file(file));
        assert!(!host.remove_file(file));
        assert!(host.analysis().file(file).is_none());
        assert_eq!(host.file_id("/a.nix"), None);
    }

    #[test]
    fn test_load_file_from_disk() {
        let mut temp = tempfile::NamedTempFile::new().unwrap();
        write!(temp, "{{ pkgs }}: pkgs.hello").unwrap();

        let mut host = AnalysisHost::new();
        let file = host.load_file(temp.path()).unwrap();
        let analysis = host.analysis();
        assert_eq!(analysis.file(file).unwrap().path(), temp.path());
        assert!(!analysis.file(file).unwrap().parse().has_errors());
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = AnalysisHost::new();
        let error = host.load_file(dir.path().join("missing.nix")).unwrap_err();
        assert!(matches!(error, LoadError::Io { .. }));
        assert!(error.to_string().contains("missing.nix"));
    }

    #[test]
    fn test_diagnostics_all_in_file_order() {
        let mut host = AnalysisHost::new();
        let a = host.set_file_content("/a.nix", "undefinedA");
        let b = host.set_file_content("/b.nix", "{ x = 1; x = 2; }");
        let c = host.set_file_content("/c.nix", "let = ;");

        let all = host.analysis().diagnostics_all(&DiagnosticsConfig::default());
        let ids: Vec<_> = all.iter().map(|(file, _)| *file).collect();
        assert_eq!(ids, [a, b, c]);
        assert_eq!(all[0].1.len(), 1);
        assert_eq!(all[1].1.len(), 1);
        assert!(!all[2].1.is_empty());
    }
}
