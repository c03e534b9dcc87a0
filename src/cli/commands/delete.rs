//! `vault delete` — delete a vault's store and forget it locally.

use dialoguer::Confirm;

use crate::cli::{find_vault, load_settings, local_vaults, output, Cli};
use crate::errors::{VaultError, Result};
use crate::server::RepositoryClient;
use crate::vault::{RemoteStore, StoreDescriptor};

/// Execute the `delete` command.
pub async fn execute(cli: &Cli, vault_id: &str, force: bool) -> Result<()> {
    let settings = load_settings(cli)?;
    let list = local_vaults(&settings);
    let entry = find_vault(&list, vault_id).await?;
    let title = output::vault_title(&entry);

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete vault '{title}' and its stored configs?"))
            .default(false)
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    // Remove the underlying blob first so a failure keeps the local entry.
    match entry.descriptor()? {
        StoreDescriptor::File { path } => match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                output::warning(&format!("Store file {} was already gone", path.display()));
            }
            Err(e) => return Err(e.into()),
        },
        StoreDescriptor::Remote {
            url,
            id,
            public_key,
            private_key,
        } => {
            let store = RemoteStore::open(
                RepositoryClient::new(url)?,
                id,
                &public_key,
                private_key.as_deref(),
            )?;
            store.delete().await?;
        }
    }

    list.remove_by_prefix(&entry.vault_export.public_key).await?;
    output::success(&format!("Deleted vault '{title}'"));

    Ok(())
}
