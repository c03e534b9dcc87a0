//! `vault server` — run the registry server.

use crate::cli::{load_settings, output, Cli};
use crate::errors::Result;

/// Execute the `server` command.
pub async fn execute(cli: &Cli, port: Option<u16>) -> Result<()> {
    let mut settings = load_settings(cli)?;
    if let Some(port) = port {
        settings.port = port;
    }

    output::info(&format!(
        "Registries stored in {}",
        settings.registries_dir.display()
    ));
    crate::server::serve(&settings).await
}
