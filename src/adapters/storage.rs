use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Mounted-filesystem storage. Relative paths resolve against `base_path`;
/// absolute paths are used as-is.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.base_path.join(path)
    }

    fn temp_path_for(full_path: &Path) -> PathBuf {
        let name = full_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        full_path.with_file_name(format!(".{}.tmp-{}", name, std::process::id()))
    }
}

impl Storage for LocalStorage {
    async fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        let data = fs::read(self.resolve(path))?;
        Ok(data)
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = Self::temp_path_for(&full_path);
        if let Err(e) = fs::write(&temp_path, data) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, &full_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }

    async fn create_new(&self, path: &Path, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)?;
        if let Err(e) = file.write_all(data).and_then(|_| file.sync_all()) {
            drop(file);
            let _ = fs::remove_file(&full_path);
            return Err(e.into());
        }
        Ok(())
    }

    async fn append(&self, path: &Path, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(full_path)?;
        file.write_all(data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::EtlError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_file_replaces_without_leaving_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        storage.write_file(Path::new("staged.csv"), b"a\n1\n").await.unwrap();
        storage.write_file(Path::new("staged.csv"), b"a\n2\n").await.unwrap();

        let data = storage.read_file(Path::new("staged.csv")).await.unwrap();
        assert_eq!(data, b"a\n2\n");
        let entries: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_create_new_refuses_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());
        let path = Path::new("out.csv");

        storage.create_new(path, b"first").await.unwrap();
        let err = storage.create_new(path, b"second").await.unwrap_err();

        match err {
            EtlError::IoError(e) => assert_eq!(e.kind(), std::io::ErrorKind::AlreadyExists),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(storage.read_file(path).await.unwrap(), b"first");
    }

    #[tokio::test]
    async fn test_append_keeps_existing_lines() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());
        let path = Path::new("logs/run.log");

        storage.append(path, b"one\n").await.unwrap();
        storage.append(path, b"two\n").await.unwrap();

        assert_eq!(storage.read_file(path).await.unwrap(), b"one\ntwo\n");
        assert!(storage.exists(path).await);
    }

    #[tokio::test]
    async fn test_absolute_paths_ignore_base_path() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new("/nonexistent-base");
        let path = temp_dir.path().join("abs.txt");

        storage.write_file(&path, b"x").await.unwrap();
        assert!(path.exists());
    }
}
