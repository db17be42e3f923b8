//! Byte-level persistence for the registry collection.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Where the serialized collection lives.
pub trait RegistryBackend: Send + Sync {
    /// Read the stored document. `Ok(None)` when nothing has been written yet.
    fn read(&self) -> io::Result<Option<Vec<u8>>>;

    /// Replace the stored document.
    fn write(&self, bytes: &[u8]) -> io::Result<()>;
}

/// JSON file on local disk.
///
/// Writes go to a sibling temp file and are renamed into place.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "registry.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RegistryBackend for JsonFileBackend {
    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let temp = self.temp_path();
        std::fs::write(&temp, bytes)?;
        std::fs::rename(&temp, &self.path)
    }
}

/// In-process storage, for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    contents: Mutex<Option<Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-seeded with a document.
    pub fn with_contents(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            contents: Mutex::new(Some(bytes.into())),
        }
    }

    /// Current stored document.
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.contents.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl RegistryBackend for MemoryBackend {
    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.contents())
    }

    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        *self.contents.lock().unwrap_or_else(|e| e.into_inner()) = Some(bytes.to_vec());
        Ok(())
    }
}

impl<B: RegistryBackend + ?Sized> RegistryBackend for std::sync::Arc<B> {
    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        (**self).read()
    }

    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        (**self).write(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_backend_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("nested/registry.json"));

        assert_eq!(backend.read().unwrap(), None);

        backend.write(b"[]").unwrap();
        assert_eq!(backend.read().unwrap().as_deref(), Some(&b"[]"[..]));
        assert!(!dir.path().join("nested/registry.json.tmp").exists());
    }

    #[test]
    fn test_memory_backend() {
        let backend = MemoryBackend::with_contents("[1]");
        assert_eq!(backend.read().unwrap(), Some(b"[1]".to_vec()));
        backend.write(b"[]").unwrap();
        assert_eq!(backend.contents(), Some(b"[]".to_vec()));
    }
}
