use thiserror::Error;

/// All errors that can occur in the vault, its registry and its stores.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Lookup errors ---
    #[error("{0}")]
    NotFound(String),

    // --- Capability errors ---
    #[error("{0}")]
    Authorization(String),

    // --- Input errors ---
    #[error("{0}")]
    Validation(String),

    #[error("ID is not valid format: {0}")]
    InvalidId(String),

    #[error("Cannot find private key — this vault is read-only")]
    MissingKey,

    // --- Store errors ---
    #[error("Protocol store is not supported: {0}")]
    UnsupportedProtocol(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Crypto errors ---
    #[error("Crypto error: {0}")]
    Crypto(String),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl VaultError {
    /// HTTP status the error is reported with at the API boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_)
            | Self::InvalidId(_)
            | Self::MissingKey
            | Self::UnsupportedProtocol(_) => 400,
            Self::Authorization(_) => 401,
            Self::NotFound(_) => 404,
            _ => 500,
        }
    }

    /// Stable machine-readable code, sent as `codeError` in the envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Authorization(_) => "AUTHORIZATION_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidId(_) => "INVALID_ID",
            Self::MissingKey => "MISSING_KEY",
            Self::UnsupportedProtocol(_) => "UNSUPPORTED_PROTOCOL",
            Self::Transport(_) | Self::Io(_) => "TRANSPORT_ERROR",
            Self::Crypto(_) => "CRYPTO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::CommandFailed(_) => "COMMAND_FAILED",
        }
    }

    /// Rebuild an error from a status code received over HTTP.
    ///
    /// Used by the repository client so remote failures surface as the
    /// same variants a local repository would raise.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 => Self::Validation(message),
            401 | 403 => Self::Authorization(message),
            404 => Self::NotFound(message),
            _ => Self::Transport(message),
        }
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for VaultError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Convenience type alias for vault results.
pub type Result<T> = std::result::Result<T, VaultError>;
