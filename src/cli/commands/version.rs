//! `vault version` — display version.

use console::style;

use crate::config::Settings;
use crate::errors::Result;

/// Execute the `version` command.
pub fn execute() -> Result<()> {
    println!(
        "vault {} ({} {})",
        style(env!("CARGO_PKG_VERSION")).green().bold(),
        env!("CARGO_PKG_NAME"),
        style(format!("settings: {}", Settings::default_path().display())).dim()
    );
    Ok(())
}
