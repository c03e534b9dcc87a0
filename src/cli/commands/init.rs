//! `vault init` — write a starter settings file.

use crate::cli::{config_path, output, Cli};
use crate::config::Settings;
use crate::errors::Result;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let path = config_path(cli);

    if Settings::default().write_default(&path)? {
        output::success(&format!("Created {}", path.display()));
        output::tip("Edit `url` to point at your registry server.");
    } else {
        output::info(&format!("Skipped. Already exists file {}", path.display()));
    }

    Ok(())
}
