//! `vault list` — display local vaults in a table.

use crate::cli::{load_settings, local_vaults, output, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub async fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let vaults = local_vaults(&settings).list().await?;

    output::info(&format!(
        "{} vault(s) in {}",
        vaults.len(),
        settings.vaults_file.display()
    ));

    output::print_vaults_table(&vaults);

    Ok(())
}
