//! The `vault` command line: clap definitions, shared lookups and one module per subcommand.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::errors::{VaultError, Result};
use crate::vault::{LocalVaultList, VaultEntry};

/// Sign-gated configuration vaults backed by RSA key pairs.
#[derive(Parser)]
#[command(
    name = "vault",
    about = "Sign-gated configuration vaults",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (default: ~/.vaultrc)
    #[arg(long, env = "VAULTRC", global = true)]
    pub config: Option<PathBuf>,

    /// Local vault list (default: `vaults_file` from settings)
    #[arg(long, global = true)]
    pub vaults_file: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run the registry server
    Server {
        /// Port to listen on (default: settings, then PORT, then 4874)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create the settings file with defaults
    Init,

    /// Show the effective settings
    Config,

    /// Create a vault (remote registry unless --file is given)
    Create {
        /// Keep the vault blob in a local file instead of the registry
        #[arg(long)]
        file: Option<PathBuf>,

        /// RSA modulus length: 512, 1024, 2048 or 4096
        #[arg(long)]
        modulus_length: Option<u32>,
    },

    /// List local vaults
    List,

    /// Show details of a vault
    Info {
        /// Vault id (a prefix of its public key)
        vault_id: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a read-only export of a vault (public key and store location)
    Export {
        /// Vault id (a prefix of its public key)
        vault_id: String,
        /// Write the export to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the configs stored in a vault
    Show {
        /// Vault id (a prefix of its public key)
        vault_id: String,
    },

    /// Replace the configs stored in a vault with a JSON document
    Write {
        /// Vault id (a prefix of its public key)
        vault_id: String,
        /// JSON file to store, or `-` for stdin
        file: String,
    },

    /// Delete a vault and its store
    Delete {
        /// Vault id (a prefix of its public key)
        vault_id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Show version
    Version,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Path of the settings file from the CLI arguments.
pub fn config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(Settings::default_path)
}

/// Load settings, applying the `--vaults-file` override.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(&config_path(cli))?;
    if let Some(path) = &cli.vaults_file {
        settings.vaults_file = path.clone();
    }
    Ok(settings)
}

pub fn local_vaults(settings: &Settings) -> LocalVaultList {
    LocalVaultList::new(&settings.vaults_file)
}

/// Log filter from a `RUST_LOG` value, defaulting to `info`.
pub fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Look up a local vault by public-key prefix, failing when absent.
pub async fn find_vault(list: &LocalVaultList, vault_id: &str) -> Result<VaultEntry> {
    list.find_by_prefix(vault_id)
        .await?
        .ok_or_else(|| VaultError::NotFound(format!("Cannot found vault '{vault_id}'")))
}
