//! `vault show` — print the configs stored in a vault.

use serde_json::Value;

use crate::cli::{find_vault, load_settings, local_vaults, output, Cli};
use crate::errors::Result;

/// Execute the `show` command.
pub async fn execute(cli: &Cli, vault_id: &str) -> Result<()> {
    let settings = load_settings(cli)?;
    let entry = find_vault(&local_vaults(&settings), vault_id).await?;
    let vault = entry.open()?;

    match vault.read_configs::<Value>().await? {
        Some(configs) => println!("{}", serde_json::to_string_pretty(&configs)?),
        None => {
            output::info(&format!("Vault {} is empty.", vault.title()?));
            output::tip("Run `vault write <vault-id> <file.json>` to store configs.");
        }
    }
    Ok(())
}
