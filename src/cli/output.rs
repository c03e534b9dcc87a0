//! Terminal output for the `vault` commands.
//!
//! Status lines are a colored glyph followed by the message. Results go
//! to stdout, problems to stderr, so `vault show` output stays pipeable.

use comfy_table::{ContentArrangement, Table};
use console::{style, StyledObject};

use crate::config::Settings;
use crate::vault::VaultEntry;

/// Characters of the public key used as a vault's display id.
const TITLE_LEN: usize = 25;

fn mark(glyph: &'static str) -> StyledObject<&'static str> {
    style(glyph).bold()
}

pub fn success(msg: &str) {
    println!("{} {msg}", mark("\u{2713}").green());
}

pub fn error(msg: &str) {
    eprintln!("{} {msg}", mark("\u{2717}").red());
}

pub fn warning(msg: &str) {
    eprintln!("{} {msg}", mark("\u{26a0}").yellow());
}

pub fn info(msg: &str) {
    println!("{} {msg}", mark("\u{2139}").blue());
}

/// Dimmed follow-up hint, e.g. the next command to run.
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

pub fn vault_title(entry: &VaultEntry) -> String {
    entry.vault_export.public_key.chars().take(TITLE_LEN).collect()
}

/// Print a table of local vaults (Vault, Store, Access, Created).
pub fn print_vaults_table(vaults: &[VaultEntry]) {
    if vaults.is_empty() {
        info("No vaults yet.");
        tip("Run `vault create` to make your first vault.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Vault", "Store", "Access", "Created"]);

    for v in vaults {
        let protocol = v
            .store_descriptor
            .get("protocol")
            .and_then(|p| p.as_str())
            .unwrap_or("?")
            .to_string();
        let access = if v.vault_export.private_key.is_some() {
            "read/write"
        } else {
            "read-only"
        };
        table.add_row(vec![
            vault_title(v),
            protocol,
            access.to_string(),
            v.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{table}");
}

/// Print the effective settings as a two-column table.
pub fn print_settings(settings: &Settings, source: &std::path::Path) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Setting", "Value"]);
    table.add_row(vec!["url".to_string(), settings.url.clone()]);
    table.add_row(vec!["host".to_string(), settings.host.clone()]);
    table.add_row(vec!["port".to_string(), settings.port.to_string()]);
    table.add_row(vec![
        "registries_dir".to_string(),
        settings.registries_dir.display().to_string(),
    ]);
    table.add_row(vec![
        "vaults_file".to_string(),
        settings.vaults_file.display().to_string(),
    ]);
    table.add_row(vec![
        "modulus_length".to_string(),
        settings.modulus_length.bits().to_string(),
    ]);

    info(&format!("Settings from {}", source.display()));
    println!("{table}");
}
