use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::ModulusLength;
use crate::errors::{VaultError, Result};

/// User-level configuration, loaded from `~/.vaultrc` (TOML).
///
/// Every field has a default, so the tool works without any config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the remote registry used by `rs` stores.
    #[serde(default = "default_url")]
    pub url: String,

    /// Address the registry server binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the registry server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding one JSON file per registry (server side).
    #[serde(default = "default_registries_dir")]
    pub registries_dir: PathBuf,

    /// The local list of vaults this user created (client side).
    #[serde(default = "default_vaults_file")]
    pub vaults_file: PathBuf,

    /// RSA size for newly generated key pairs.
    #[serde(default)]
    pub modulus_length: ModulusLength,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_url() -> String {
    "http://localhost:4874".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4874
}

fn default_registries_dir() -> PathBuf {
    home_dir().join("._vault").join("vault_registries")
}

fn default_vaults_file() -> PathBuf {
    home_dir().join(".vault")
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: default_url(),
            host: default_host(),
            port: default_port(),
            registries_dir: default_registries_dir(),
            vaults_file: default_vaults_file(),
            modulus_length: ModulusLength::default(),
        }
    }
}

impl Settings {
    /// Name of the config file in the home directory.
    pub const FILE_NAME: &'static str = ".vaultrc";

    /// `~/.vaultrc`.
    pub fn default_path() -> PathBuf {
        home_dir().join(Self::FILE_NAME)
    }

    /// Load settings from `path`, then apply environment overrides.
    ///
    /// If the file does not exist, defaults are used.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = Self::load_file(path)?;
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;

        toml::from_str(&contents).map_err(|e| {
            VaultError::Config(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    /// Apply `PORT` (digits only) and `VAULT_URL` overrides.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(port) = var("PORT")
            .filter(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|p| p.parse().ok())
        {
            self.port = port;
        }
        if let Some(url) = var("VAULT_URL").filter(|u| !u.is_empty()) {
            self.url = url;
        }
    }

    /// Write these settings to `path` unless a file is already there.
    ///
    /// Returns `true` when a file was written.
    pub fn write_default(&self, path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| VaultError::Config(format!("cannot render settings: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(true)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
