//! File-backed local store: one file per key inside a directory.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use storefront::local::{LocalStore, LocalStoreError};

#[derive(Debug, Clone)]
pub struct FileLocalStore {
    dir: PathBuf,
}

impl FileLocalStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keys become file names; anything outside `[A-Za-z0-9_.-]` is replaced so
    /// a key can never escape the directory.
    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        self.dir.join(format!("{}.json", name.trim_start_matches('.')))
    }
}

impl LocalStore for FileLocalStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(LocalStoreError::unavailable(error)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        fs::create_dir_all(&self.dir).map_err(LocalStoreError::unavailable)?;

        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");

        fs::write(&staging, value).map_err(LocalStoreError::unavailable)?;
        fs::rename(&staging, &path).map_err(LocalStoreError::unavailable)
    }

    fn remove_item(&self, key: &str) -> Result<(), LocalStoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(LocalStoreError::unavailable(error)),
        }
    }
}
