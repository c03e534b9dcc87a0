//! The local list of vaults this user has created.
//!
//! One JSON document (default `~/.vault`):
//!
//! ```json
//! {"vaults": [{"storeDescriptor": {...}, "vaultExport": {"publicKey": "..."}, "createdAt": "..."}]}
//! ```
//!
//! Entries are addressed by a prefix of the vault's public key, which is
//! what the CLI shows as the vault title.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::fs;

use super::codec::Vault;
use super::store::{open_store, StoreDescriptor};
use crate::crypto::{KeyPair, KeyPairExport};
use crate::errors::{VaultError, Result};
use crate::fsio;

/// One remembered vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultEntry {
    /// Kept as raw JSON so an unknown protocol only fails when opened.
    pub store_descriptor: Value,
    pub vault_export: KeyPairExport,
    pub created_at: DateTime<Utc>,
}

impl VaultEntry {
    pub fn descriptor(&self) -> Result<StoreDescriptor> {
        StoreDescriptor::from_value(self.store_descriptor.clone())
    }

    /// Reopen the vault this entry describes.
    pub fn open(&self) -> Result<Vault> {
        let store = open_store(self.descriptor()?)?;
        let key_pair = KeyPair::import(
            &self.vault_export.public_key,
            self.vault_export.private_key.as_deref(),
        )?;
        Ok(Vault::with_key_pair(store, key_pair))
    }

    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.vault_export.public_key.starts_with(prefix)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct VaultListFile {
    #[serde(default)]
    vaults: Vec<VaultEntry>,

    /// Unknown top-level keys survive a rewrite.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct LocalVaultList {
    path: PathBuf,
}

impl LocalVaultList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remember `vault`, returning the stored entry.
    pub async fn push(&self, vault: &Vault) -> Result<VaultEntry> {
        let entry = VaultEntry {
            store_descriptor: serde_json::to_value(vault.export_store()?)?,
            vault_export: vault.export()?,
            created_at: Utc::now(),
        };

        let mut file = self.load().await?;
        file.vaults.push(entry.clone());
        self.save(&file).await?;
        Ok(entry)
    }

    pub async fn list(&self) -> Result<Vec<VaultEntry>> {
        Ok(self.load().await?.vaults)
    }

    /// First entry whose public key starts with `prefix`.
    pub async fn find_by_prefix(&self, prefix: &str) -> Result<Option<VaultEntry>> {
        check_prefix(prefix)?;
        Ok(self
            .load()
            .await?
            .vaults
            .into_iter()
            .find(|v| v.matches_prefix(prefix)))
    }

    /// Forget the first entry whose public key starts with `prefix`.
    pub async fn remove_by_prefix(&self, prefix: &str) -> Result<Option<VaultEntry>> {
        check_prefix(prefix)?;
        let mut file = self.load().await?;
        let Some(pos) = file.vaults.iter().position(|v| v.matches_prefix(prefix)) else {
            return Ok(None);
        };
        let removed = file.vaults.remove(pos);
        self.save(&file).await?;
        Ok(Some(removed))
    }

    async fn load(&self) -> Result<VaultListFile> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                VaultError::Serialization(format!("{} is corrupt: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(VaultListFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, file: &VaultListFile) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fsio::ensure_private_dir(parent)?;
        }
        let json = serde_json::to_vec_pretty(file)?;
        fsio::write_atomic(&self.path, &json).await
    }
}

fn check_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(VaultError::Validation("vault id prefix cannot be empty".into()));
    }
    Ok(())
}
