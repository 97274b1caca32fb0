//! The file-loading service interface.
//!
//! Documents may reference auxiliary files by relative-generic paths
//! (`/`-separated, regardless of platform). Loading is performed by a
//! [`FileLoader`] supplied by the embedder; [`RelativeFileLoader`] is
//! the standard-filesystem implementation.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use cowel_base::FileId;

/// Why a file could not be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FileLoadError {
    #[error("file not found")]
    NotFound,
    #[error("the file could not be read")]
    ReadError,
    #[error("permission denied")]
    Permissions,
    #[error("file loading failed")]
    Error,
}

impl From<io::ErrorKind> for FileLoadError {
    fn from(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::NotFound => FileLoadError::NotFound,
            io::ErrorKind::PermissionDenied => FileLoadError::Permissions,
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => FileLoadError::ReadError,
            _ => FileLoadError::Error,
        }
    }
}

/// A successfully loaded file.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// The id assigned to this file, used in subsequent diagnostics.
    pub id: FileId,
    /// The UTF-8 contents.
    pub source: String,
    /// The path the file was requested under.
    pub name: String,
}

/// Loads files referenced by a document.
pub trait FileLoader {
    /// Loads `path`, a relative-generic (`/`-separated) path, resolved
    /// relative to the file identified by `relative_to`.
    /// [`FileId::MAIN`] names the primary source document.
    fn load(&mut self, path: &str, relative_to: FileId) -> Result<FileEntry, FileLoadError>;
}

/// A loader that refuses every request. The default service.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFileLoader;

impl FileLoader for NoFileLoader {
    fn load(&mut self, _path: &str, _relative_to: FileId) -> Result<FileEntry, FileLoadError> {
        Err(FileLoadError::Error)
    }
}

/// Loads files from the filesystem, relative to a base directory.
///
/// Loaded files receive increasing ids starting at 0; directories of
/// previously loaded files become the base for loads relative to them.
#[derive(Debug)]
pub struct RelativeFileLoader {
    base: PathBuf,
    loaded: Vec<PathBuf>,
}

impl RelativeFileLoader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            loaded: Vec::new(),
        }
    }

    /// Loads relative to the directory of the referencing file.
    fn directory_of(&self, relative_to: FileId) -> PathBuf {
        if relative_to == FileId::MAIN {
            return self.base.clone();
        }
        self.loaded
            .get(relative_to.0 as usize)
            .and_then(|p| p.parent())
            .map_or_else(|| self.base.clone(), PathBuf::from)
    }
}

impl FileLoader for RelativeFileLoader {
    fn load(&mut self, path: &str, relative_to: FileId) -> Result<FileEntry, FileLoadError> {
        let mut full = self.directory_of(relative_to);
        for component in path.split('/') {
            full.push(component);
        }

        let bytes = fs::read(&full).map_err(|e| FileLoadError::from(e.kind()))?;
        let source = String::from_utf8(bytes).map_err(|_| FileLoadError::ReadError)?;

        let id = FileId(self.loaded.len() as i32);
        self.loaded.push(full);
        log::debug!("loaded file {path:?} as id {}", id.0);
        Ok(FileEntry {
            id,
            source,
            name: path.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_relative_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = fs::File::create(dir.path().join("doc.cow")).unwrap();
        file.write_all(b"contents").unwrap();

        let mut loader = RelativeFileLoader::new(dir.path());
        let entry = loader.load("doc.cow", FileId::MAIN).unwrap();
        assert_eq!(entry.source, "contents");
        assert_eq!(entry.id, FileId(0));
        assert_eq!(entry.name, "doc.cow");
    }

    #[test]
    fn missing_files_are_classified() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = RelativeFileLoader::new(dir.path());
        assert_eq!(
            loader.load("ghost.cow", FileId::MAIN).unwrap_err(),
            FileLoadError::NotFound
        );
    }

    #[test]
    fn invalid_utf8_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.bin"), [0xFF, 0xFE]).unwrap();

        let mut loader = RelativeFileLoader::new(dir.path());
        assert_eq!(
            loader.load("bad.bin", FileId::MAIN).unwrap_err(),
            FileLoadError::ReadError
        );
    }

    #[test]
    fn ids_increase_per_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a"), "a").unwrap();
        fs::write(dir.path().join("b"), "b").unwrap();

        let mut loader = RelativeFileLoader::new(dir.path());
        assert_eq!(loader.load("a", FileId::MAIN).unwrap().id, FileId(0));
        assert_eq!(loader.load("b", FileId::MAIN).unwrap().id, FileId(1));
    }
}
