//! File Store

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::task;

use crate::storage::{KeyValueStore, StorageError};

/// File-backed storage: one file per key inside a data directory.
///
/// Writes land in a temporary file in the same directory which is then renamed
/// over the target, so readers only ever see a complete old or new value.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: Arc<PathBuf>,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();

        fs::create_dir_all(&dir)?;

        Ok(Self { dir: Arc::new(dir) })
    }

    /// Directory holding the stored files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] for empty keys or keys containing
    /// anything other than ASCII alphanumerics, `-` and `_`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        Ok(self.dir.join(format!("{key}.json")))
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T, StorageError> + Send + 'static,
    {
        let dir = Arc::clone(&self.dir);

        task::spawn_blocking(move || f(&dir))
            .await
            .map_err(|err| StorageError::Backend(format!("storage task failed: {err}")))?
    }
}

fn read_file(path: &Path) -> Result<Option<String>, StorageError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn write_file_atomic(dir: &Path, path: &Path, value: &str) -> Result<(), StorageError> {
    let mut file = NamedTempFile::new_in(dir)?;

    file.write_all(value.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| err.error)?;

    Ok(())
}

fn remove_file(path: &Path) -> Result<(), StorageError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;

        self.blocking(move |_| read_file(&path)).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let value = value.to_string();

        self.blocking(move |dir| write_file_atomic(dir, &path, &value))
            .await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;

        self.blocking(move |_| remove_file(&path)).await
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn round_trips_values_through_disk() -> TestResult {
        let dir = TempDir::new()?;
        let store = FileStore::open(dir.path())?;

        store.set("cart", r#"{"version":1,"items":[]}"#).await?;

        assert_eq!(
            store.get("cart").await?,
            Some(r#"{"version":1,"items":[]}"#.to_string())
        );
        assert!(dir.path().join("cart.json").exists());

        Ok(())
    }

    #[tokio::test]
    async fn set_overwrites_previous_value() -> TestResult {
        let dir = TempDir::new()?;
        let store = FileStore::open(dir.path())?;

        store.set("cart", "first").await?;
        store.set("cart", "second").await?;

        assert_eq!(store.get("cart").await?, Some("second".to_string()));

        let leftovers = fs::read_dir(dir.path())?.count();

        assert_eq!(leftovers, 1, "temporary files should not be left behind");

        Ok(())
    }

    #[tokio::test]
    async fn missing_key_reads_as_none() -> TestResult {
        let dir = TempDir::new()?;
        let store = FileStore::open(dir.path())?;

        assert_eq!(store.get("cart").await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn remove_tolerates_missing_file() -> TestResult {
        let dir = TempDir::new()?;
        let store = FileStore::open(dir.path())?;

        store.set("cart", "value").await?;
        store.remove("cart").await?;
        store.remove("cart").await?;

        assert_eq!(store.get("cart").await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn open_creates_nested_directory() -> TestResult {
        let dir = TempDir::new()?;
        let nested = dir.path().join("a").join("b");

        let store = FileStore::open(&nested)?;

        assert!(nested.is_dir());
        assert_eq!(store.dir(), nested.as_path());

        Ok(())
    }

    #[test]
    fn rejects_path_like_keys() -> TestResult {
        let dir = TempDir::new()?;
        let store = FileStore::open(dir.path())?;

        for key in ["", "../cart", "a/b", "cart.json"] {
            assert!(
                matches!(store.path_for(key), Err(StorageError::InvalidKey(_))),
                "key {key:?} should be rejected"
            );
        }

        Ok(())
    }
}
