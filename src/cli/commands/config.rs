//! `vault config` — show the effective settings.

use crate::cli::{config_path, load_settings, output, Cli};
use crate::errors::Result;

/// Execute the `config` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    output::print_settings(&settings, &config_path(cli));
    Ok(())
}
