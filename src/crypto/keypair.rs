//! RSA key pair handling.
//!
//! Keys travel as base64 text wrapping PKCS#1 DER, with or without
//! `=` padding. A `KeyPair` always holds a public key; the private key
//! is optional and its presence is what grants signing and writing.

use std::fmt;

use base64::Engine;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

use super::signer::{HashAlgorithm, Intent, Signer};
use super::BASE64;
use crate::errors::{VaultError, Result};

/// Characters of the public key shown as a vault's title.
const TITLE_LEN: usize = 25;

/// Supported RSA modulus sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ModulusLength {
    Bits512,
    Bits1024,
    Bits2048,
    Bits4096,
}

impl ModulusLength {
    pub fn bits(self) -> usize {
        match self {
            Self::Bits512 => 512,
            Self::Bits1024 => 1024,
            Self::Bits2048 => 2048,
            Self::Bits4096 => 4096,
        }
    }
}

impl Default for ModulusLength {
    fn default() -> Self {
        Self::Bits512
    }
}

impl TryFrom<u32> for ModulusLength {
    type Error = VaultError;

    fn try_from(bits: u32) -> Result<Self> {
        match bits {
            512 => Ok(Self::Bits512),
            1024 => Ok(Self::Bits1024),
            2048 => Ok(Self::Bits2048),
            4096 => Ok(Self::Bits4096),
            other => Err(VaultError::Validation(format!(
                "modulus length {other} is not supported — use 512, 1024, 2048 or 4096"
            ))),
        }
    }
}

impl From<ModulusLength> for u32 {
    fn from(m: ModulusLength) -> Self {
        m.bits() as u32
    }
}

/// How to obtain a key pair: import existing material or generate new keys.
#[derive(Debug, Clone)]
pub enum KeyPairOptions {
    Import {
        public_key: String,
        private_key: Option<String>,
    },
    Generate {
        modulus_length: ModulusLength,
    },
}

impl KeyPairOptions {
    /// Import when a public key is given, otherwise generate.
    ///
    /// Mirrors the resolution rule shared by `publish` and `Vault::create`.
    pub fn from_parts(
        public_key: Option<String>,
        private_key: Option<String>,
        modulus_length: Option<ModulusLength>,
    ) -> Self {
        match public_key.filter(|k| !k.is_empty()) {
            Some(public_key) => Self::Import {
                public_key,
                private_key: private_key.filter(|k| !k.is_empty()),
            },
            None => Self::Generate {
                modulus_length: modulus_length.unwrap_or_default(),
            },
        }
    }
}

/// Base64 form of a key pair, as handed to callers and persisted locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPairExport {
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

/// An RSA key pair; read-only when it carries only the public half.
#[derive(Clone)]
pub struct KeyPair {
    public_key: RsaPublicKey,
    private_key: Option<RsaPrivateKey>,
}

impl KeyPair {
    /// Resolve options into a key pair, generating keys off the async reactor.
    pub async fn resolve(options: KeyPairOptions) -> Result<Self> {
        match options {
            KeyPairOptions::Import {
                public_key,
                private_key,
            } => Self::import(&public_key, private_key.as_deref()),
            KeyPairOptions::Generate { modulus_length } => Self::generate(modulus_length).await,
        }
    }

    /// Generate a fresh key pair of the requested size.
    pub async fn generate(modulus_length: ModulusLength) -> Result<Self> {
        let bits = modulus_length.bits();
        let private_key = tokio::task::spawn_blocking(move || {
            let mut rng = rand::rngs::OsRng;
            RsaPrivateKey::new(&mut rng, bits)
        })
        .await
        .map_err(|e| VaultError::Crypto(format!("key generation task failed: {e}")))?
        .map_err(|e| VaultError::Crypto(format!("key generation failed: {e}")))?;

        tracing::debug!(bits, "generated RSA key pair");

        Ok(Self {
            public_key: private_key.to_public_key(),
            private_key: Some(private_key),
        })
    }

    /// Import base64 PKCS#1 DER keys.
    ///
    /// When a private key is given it must belong to the public key.
    pub fn import(public_key: &str, private_key: Option<&str>) -> Result<Self> {
        let public_der = decode_base64(public_key, "public key")?;
        let public_key = RsaPublicKey::from_pkcs1_der(&public_der)
            .map_err(|e| VaultError::Crypto(format!("invalid public key: {e}")))?;

        let private_key = match private_key {
            Some(encoded) => {
                let der = zeroize::Zeroizing::new(decode_base64(encoded, "private key")?);
                let key = RsaPrivateKey::from_pkcs1_der(&der)
                    .map_err(|e| VaultError::Crypto(format!("invalid private key: {e}")))?;
                if key.to_public_key() != public_key {
                    return Err(VaultError::Crypto(
                        "private key does not belong to the public key".into(),
                    ));
                }
                Some(key)
            }
            None => None,
        };

        Ok(Self {
            public_key,
            private_key,
        })
    }

    /// Drop the private half, keeping only verification/read material.
    pub fn to_read_only(&self) -> Self {
        Self {
            public_key: self.public_key.clone(),
            private_key: None,
        }
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn private_key(&self) -> Option<&RsaPrivateKey> {
        self.private_key.as_ref()
    }

    pub fn is_read_only(&self) -> bool {
        self.private_key.is_none()
    }

    /// Base64 PKCS#1 DER of the public key.
    pub fn export_public_key(&self) -> Result<String> {
        let der = self
            .public_key
            .to_pkcs1_der()
            .map_err(|e| VaultError::Crypto(format!("cannot encode public key: {e}")))?;
        Ok(BASE64.encode(der.as_bytes()))
    }

    /// Base64 PKCS#1 DER of the private key, if present.
    pub fn export_private_key(&self) -> Result<Option<String>> {
        self.private_key
            .as_ref()
            .map(|key| {
                let der = key
                    .to_pkcs1_der()
                    .map_err(|e| VaultError::Crypto(format!("cannot encode private key: {e}")))?;
                Ok(BASE64.encode(der.as_bytes()))
            })
            .transpose()
    }

    pub fn export(&self) -> Result<KeyPairExport> {
        Ok(KeyPairExport {
            public_key: self.export_public_key()?,
            private_key: self.export_private_key()?,
        })
    }

    /// Short human label: the first characters of the public key.
    pub fn title(&self) -> Result<String> {
        Ok(self.export_public_key()?.chars().take(TITLE_LEN).collect())
    }

    /// Signer over a capability intent tag, using RSA-SHA1.
    pub fn create_signer(&self, intent: Intent) -> Signer<'_> {
        Signer::new(self, intent.tag().as_bytes().to_vec(), HashAlgorithm::Sha1)
    }

    /// Shorthand for `create_signer(intent).sign()`.
    pub fn sign(&self, intent: Intent) -> Result<String> {
        self.create_signer(intent).sign()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = self.title().unwrap_or_default();
        if self.is_read_only() {
            write!(f, "KeyPair [READABLE] {title}")
        } else {
            write!(f, "KeyPair {title}")
        }
    }
}

fn decode_base64(encoded: &str, what: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(encoded.trim())
        .map_err(|e| VaultError::Crypto(format!("{what} is not valid base64: {e}")))
}
