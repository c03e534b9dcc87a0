//! Blob store backed by one local file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;

use super::store::{Store, StoreDescriptor};
use crate::errors::Result;
use crate::fsio;

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Store for FileStore {
    async fn write(&self, bytes: &[u8]) -> Result<()> {
        fsio::write_atomic(&self.path, bytes).await?;
        tracing::debug!(path = %self.path.display(), len = bytes.len(), "wrote file store");
        Ok(())
    }

    async fn read(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// SHA-256 of the file contents, hex encoded.
    async fn hash(&self) -> Result<String> {
        let bytes = fs::read(&self.path).await?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    fn export(&self) -> Result<StoreDescriptor> {
        Ok(StoreDescriptor::File {
            path: self.path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::errors::VaultError;

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("blob"));
        assert_eq!(store.read().await.unwrap(), None);
        assert!(matches!(store.hash().await, Err(VaultError::Io(_))));
    }

    #[tokio::test]
    async fn write_then_read_and_hash() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("blob"));

        store.write(b"abc").await.unwrap();
        assert_eq!(store.read().await.unwrap().unwrap(), b"abc");
        assert_eq!(
            store.hash().await.unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );

        store.write(b"other").await.unwrap();
        assert_eq!(store.read().await.unwrap().unwrap(), b"other");
    }

    #[test]
    fn export_names_the_path() {
        let store = FileStore::new("/var/tmp/blob");
        assert_eq!(
            store.export().unwrap(),
            StoreDescriptor::File {
                path: PathBuf::from("/var/tmp/blob")
            }
        );
    }
}
