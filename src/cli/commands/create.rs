//! `vault create` — create a vault and remember it locally.

use std::path::PathBuf;

use crate::cli::{load_settings, local_vaults, output, Cli};
use crate::crypto::{KeyPairOptions, ModulusLength};
use crate::errors::Result;
use crate::server::RepositoryClient;
use crate::vault::{FileStore, RemoteStore, Store, Vault};

/// Execute the `create` command.
pub async fn execute(cli: &Cli, file: Option<&PathBuf>, modulus_length: Option<u32>) -> Result<()> {
    let settings = load_settings(cli)?;
    let modulus_length = match modulus_length {
        Some(bits) => ModulusLength::try_from(bits)?,
        None => settings.modulus_length,
    };

    // 1. Pick the store: a local file, or a fresh registry on the server.
    let store: Box<dyn Store> = match file {
        Some(path) => Box::new(FileStore::new(path.clone())),
        None => {
            let client = RepositoryClient::new(&settings.url)?;
            Box::new(RemoteStore::create(client).await?)
        }
    };

    // 2. The vault gets its own key pair, independent of the store's.
    let vault = Vault::create(store, KeyPairOptions::Generate { modulus_length }).await?;

    // 3. Remember it.
    local_vaults(&settings).push(&vault).await?;

    output::success(&format!("vault {} stored", vault.title()?));
    output::info(&format!(
        "Holds up to {} bytes of JSON configs ({}-bit key)",
        vault.capacity(),
        modulus_length.bits()
    ));
    output::tip("Run `vault write <vault-id> <file.json>` to store configs.");
    Ok(())
}
