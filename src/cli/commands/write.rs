//! `vault write` — replace a vault's configs with a JSON document.

use std::io::Read;

use serde_json::Value;

use crate::cli::{find_vault, load_settings, local_vaults, output, Cli};
use crate::errors::{VaultError, Result};

/// Execute the `write` command.
pub async fn execute(cli: &Cli, vault_id: &str, file: &str) -> Result<()> {
    let settings = load_settings(cli)?;
    let entry = find_vault(&local_vaults(&settings), vault_id).await?;
    let vault = entry.open()?;

    let contents = read_input(file)?;
    let configs: Value = serde_json::from_str(&contents)
        .map_err(|e| VaultError::Validation(format!("Error format file: {e}")))?;

    vault.save_configs(&configs).await?;

    output::success(&format!("Saved configs to vault {}", vault.title()?));
    Ok(())
}

/// Read the whole document from a path, or stdin for `-`.
fn read_input(file: &str) -> Result<String> {
    if file == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    Ok(std::fs::read_to_string(file)?)
}
