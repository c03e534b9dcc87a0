//! `vault info` — show details of one local vault.

use serde_json::{Map, Value};

use crate::cli::{find_vault, load_settings, local_vaults, Cli};
use crate::crypto::{Intent, KeyPair};
use crate::errors::{VaultError, Result};
use crate::vault::StoreDescriptor;

/// Execute the `info` command.
pub async fn execute(cli: &Cli, vault_id: &str, json: bool) -> Result<()> {
    let settings = load_settings(cli)?;
    let entry = find_vault(&local_vaults(&settings), vault_id).await?;

    let mut fields: Vec<(&str, String)> = vec![
        ("Vault Public Key", entry.vault_export.public_key.clone()),
        (
            "Access",
            if entry.vault_export.private_key.is_some() {
                "read/write".to_string()
            } else {
                "read-only".to_string()
            },
        ),
    ];

    match entry.descriptor()? {
        StoreDescriptor::File { path } => {
            fields.push(("Store Protocol", "fs".to_string()));
            fields.push(("Store Path", path.display().to_string()));
        }
        StoreDescriptor::Remote {
            url,
            id,
            public_key,
            private_key,
        } => {
            let store_keys = KeyPair::import(&public_key, private_key.as_deref())?;
            fields.push(("Store Protocol", "rs".to_string()));
            fields.push(("Remote Store ID", id.to_hex()));
            fields.push(("Remote Public Key", public_key));
            if let Ok(read_sign) = store_keys.sign(Intent::Read) {
                fields.push(("Remote Store URL", read_url(&url, &id.to_hex(), &read_sign)?));
                fields.push(("Remote Read Sign", read_sign));
            }
        }
    }

    fields.push(("Created At", entry.created_at.to_rfc3339()));

    if json {
        let obj: Map<String, Value> = fields
            .into_iter()
            .map(|(k, v)| (k.replace(' ', ""), Value::String(v)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&obj)?);
    } else {
        for (k, v) in fields {
            println!("{k:<20} = {v}");
        }
    }
    Ok(())
}

/// Shareable read URL: anyone holding it can fetch the registry.
pub(crate) fn read_url(base: &str, id: &str, read_sign: &str) -> Result<String> {
    reqwest::Url::parse_with_params(&format!("{base}/vault/{id}"), &[("key", read_sign)])
        .map(|u| u.to_string())
        .map_err(|e| VaultError::Config(format!("invalid registry url '{base}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_url_escapes_signature() {
        let url = read_url("http://localhost:4874", "abcd", "a+b/c==").unwrap();
        assert_eq!(url, "http://localhost:4874/vault/abcd?key=a%2Bb%2Fc%3D%3D");
    }

    #[test]
    fn read_url_rejects_garbage_base() {
        assert!(read_url("not a url", "abcd", "x").is_err());
    }
}
