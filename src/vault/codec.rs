//! Client-side vault: typed configuration in, signed blob out.
//!
//! `save_configs` serializes to JSON and runs the raw RSA private-key
//! transform; `read_configs` reverses it with the public key. The stored
//! blob is authenticated (only the private key could have produced it)
//! but it is not secret: the public key alone recovers the plaintext.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::store::{Store, StoreDescriptor};
use crate::crypto::{max_payload_len, private_transform, public_transform};
use crate::crypto::{KeyPair, KeyPairExport, KeyPairOptions};
use crate::errors::{VaultError, Result};

pub struct Vault {
    store: Box<dyn Store>,
    key_pair: KeyPair,
}

impl Vault {
    /// Pair a store with a resolved key pair.
    pub async fn create(store: Box<dyn Store>, options: KeyPairOptions) -> Result<Self> {
        let key_pair = KeyPair::resolve(options).await?;
        Ok(Self::with_key_pair(store, key_pair))
    }

    pub fn with_key_pair(store: Box<dyn Store>, key_pair: KeyPair) -> Self {
        Self { store, key_pair }
    }

    /// Shorthand for `create` followed by `read_configs`.
    pub async fn create_and_read_configs<T: DeserializeOwned>(
        store: Box<dyn Store>,
        options: KeyPairOptions,
    ) -> Result<Option<T>> {
        Self::create(store, options).await?.read_configs().await
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    pub fn is_read_only(&self) -> bool {
        self.key_pair.is_read_only()
    }

    /// Largest JSON payload this vault's key can carry.
    pub fn capacity(&self) -> usize {
        max_payload_len(self.key_pair.public_key())
    }

    /// Encode `value` and write it to the store.
    pub async fn save_configs<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let private_key = self.key_pair.private_key().ok_or(VaultError::MissingKey)?;
        let plain = zeroize::Zeroizing::new(serde_json::to_vec(value)?);
        let blob = private_transform(private_key, &plain)?;
        self.store.write(&blob).await
    }

    /// Read and decode the stored value; `None` when the store is empty.
    pub async fn read_configs<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let Some(blob) = self.store.read().await? else {
            return Ok(None);
        };
        let plain = zeroize::Zeroizing::new(public_transform(self.key_pair.public_key(), &blob)?);
        Ok(Some(serde_json::from_slice(&plain)?))
    }

    /// Base64 key pair, private half included when held.
    pub fn export(&self) -> Result<KeyPairExport> {
        self.key_pair.export()
    }

    pub fn export_store(&self) -> Result<StoreDescriptor> {
        self.store.export()
    }

    /// First characters of the public key, used to name the vault.
    pub fn title(&self) -> Result<String> {
        self.key_pair.title()
    }
}

impl fmt::Debug for Vault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = self.title().unwrap_or_default();
        if self.is_read_only() {
            write!(f, "Vault [READABLE] {title}")
        } else {
            write!(f, "Vault {title}")
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use tempfile::TempDir;

    use super::*;
    use crate::crypto::ModulusLength;
    use crate::vault::FileStore;

    fn file_store(tmp: &TempDir) -> Box<dyn Store> {
        Box::new(FileStore::new(tmp.path().join("configs.vault")))
    }

    #[tokio::test]
    async fn empty_store_reads_none() {
        let tmp = TempDir::new().unwrap();
        let vault = Vault::create(
            file_store(&tmp),
            KeyPairOptions::Generate {
                modulus_length: ModulusLength::Bits512,
            },
        )
        .await
        .unwrap();
        assert_eq!(vault.read_configs::<Value>().await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_then_read_round_trips() {
        let tmp = TempDir::new().unwrap();
        let vault = Vault::create(
            file_store(&tmp),
            KeyPairOptions::Generate {
                modulus_length: ModulusLength::Bits512,
            },
        )
        .await
        .unwrap();

        let value = json!({"db": "pg://x", "n": 3});
        vault.save_configs(&value).await.unwrap();
        assert_eq!(vault.read_configs::<Value>().await.unwrap(), Some(value));
    }

    #[tokio::test]
    async fn stored_blob_is_not_plaintext() {
        let tmp = TempDir::new().unwrap();
        let vault = Vault::create(
            file_store(&tmp),
            KeyPairOptions::Generate {
                modulus_length: ModulusLength::Bits512,
            },
        )
        .await
        .unwrap();
        vault.save_configs(&json!({"marker": "zzz"})).await.unwrap();

        let raw = std::fs::read(tmp.path().join("configs.vault")).unwrap();
        assert_eq!(raw.len(), 64);
        assert!(!raw.windows(3).any(|w| w == b"zzz"));
    }

    #[tokio::test]
    async fn read_only_vault_reads_but_cannot_save() {
        let tmp = TempDir::new().unwrap();
        let writer = Vault::create(
            file_store(&tmp),
            KeyPairOptions::Generate {
                modulus_length: ModulusLength::Bits512,
            },
        )
        .await
        .unwrap();
        writer.save_configs(&json!([1, 2, 3])).await.unwrap();

        let public_key = writer.export().unwrap().public_key;
        let reader = Vault::create(
            file_store(&tmp),
            KeyPairOptions::Import {
                public_key,
                private_key: None,
            },
        )
        .await
        .unwrap();

        assert!(reader.is_read_only());
        assert_eq!(
            reader.read_configs::<Value>().await.unwrap(),
            Some(json!([1, 2, 3]))
        );
        assert!(matches!(
            reader.save_configs(&json!([4])).await,
            Err(VaultError::MissingKey)
        ));
        assert!(format!("{reader:?}").starts_with("Vault [READABLE]"));
    }

    #[tokio::test]
    async fn oversize_config_is_rejected_before_writing() {
        let tmp = TempDir::new().unwrap();
        let vault = Vault::create(
            file_store(&tmp),
            KeyPairOptions::Generate {
                modulus_length: ModulusLength::Bits512,
            },
        )
        .await
        .unwrap();
        assert_eq!(vault.capacity(), 53);

        let big = "x".repeat(vault.capacity());
        assert!(vault.save_configs(&big).await.is_err());
        assert!(!tmp.path().join("configs.vault").exists());
    }

    #[tokio::test]
    async fn title_is_public_key_prefix() {
        let tmp = TempDir::new().unwrap();
        let vault = Vault::create(
            file_store(&tmp),
            KeyPairOptions::Generate {
                modulus_length: ModulusLength::Bits512,
            },
        )
        .await
        .unwrap();
        let title = vault.title().unwrap();
        assert_eq!(title.len(), 25);
        assert!(vault.export().unwrap().public_key.starts_with(&title));
    }
}
