//! `vault export` — print (or save) what someone needs to read a vault.
//!
//! The export carries the vault public key and a store location. For a
//! remote store the location is the registry URL with a read signature,
//! so the receiver can fetch and decode the configs but never change them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::info::read_url;
use crate::cli::{find_vault, load_settings, local_vaults, output, Cli};
use crate::crypto::{Intent, KeyPair};
use crate::errors::Result;
use crate::fsio;
use crate::vault::{StoreDescriptor, VaultEntry};

/// Read-only description of a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VaultExport {
    pub public_key: String,
    pub store: String,
}

impl VaultExport {
    pub fn from_entry(entry: &VaultEntry) -> Result<Self> {
        let store = match entry.descriptor()? {
            StoreDescriptor::File { path } => path.display().to_string(),
            StoreDescriptor::Remote {
                url,
                id,
                public_key,
                private_key,
            } => {
                let store_keys = KeyPair::import(&public_key, private_key.as_deref())?;
                read_url(&url, &id.to_hex(), &store_keys.sign(Intent::Read)?)?
            }
        };
        Ok(Self {
            public_key: entry.vault_export.public_key.clone(),
            store,
        })
    }
}

/// Execute the `export` command.
pub async fn execute(cli: &Cli, vault_id: &str, out: Option<&Path>) -> Result<()> {
    let settings = load_settings(cli)?;
    let entry = find_vault(&local_vaults(&settings), vault_id).await?;
    let json = serde_json::to_string_pretty(&VaultExport::from_entry(&entry)?)?;

    match out {
        Some(path) => {
            fsio::write_atomic(path, json.as_bytes()).await?;
            output::success(&format!("Export stored on {}", path.display()));
        }
        None => {
            println!("{json}");
            output::tip("Use `--out <path>` to save the export to a file.");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::crypto::{KeyPairExport, ModulusLength};
    use crate::repository::Id;

    fn entry(descriptor: serde_json::Value, public_key: &str) -> VaultEntry {
        VaultEntry {
            store_descriptor: descriptor,
            vault_export: KeyPairExport {
                public_key: public_key.to_string(),
                private_key: Some("secret".to_string()),
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn file_export_names_the_path_and_drops_private_key() {
        let e = entry(json!({"protocol": "fs", "path": "/tmp/a.vault"}), "PUB");
        let export = VaultExport::from_entry(&e).unwrap();
        assert_eq!(export.store, "/tmp/a.vault");

        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json, json!({"PublicKey": "PUB", "Store": "/tmp/a.vault"}));
    }

    #[tokio::test]
    async fn remote_export_carries_a_read_signature() {
        let store_keys = KeyPair::generate(ModulusLength::Bits512).await.unwrap();
        let exported = store_keys.export().unwrap();
        let id = Id::from_hex("abcd").unwrap();
        let e = entry(
            json!({
                "protocol": "rs",
                "url": "http://localhost:4874",
                "id": id.to_hex(),
                "publicKey": exported.public_key,
                "privateKey": exported.private_key,
            }),
            "PUB",
        );

        let export = VaultExport::from_entry(&e).unwrap();
        let url = reqwest::Url::parse(&export.store).unwrap();
        assert_eq!(url.path(), "/vault/abcd");
        let key = url
            .query_pairs()
            .find(|(k, _)| k == "key")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert!(store_keys.create_signer(Intent::Read).verify(&key));
    }
}
