//! Detached capability signatures.
//!
//! A capability is a PKCS#1 v1.5 signature over one of the fixed tags
//! `read`, `update` or `delete`. Nothing else goes into the signed
//! message: no nonce, no expiry, no registry id. A signature computed
//! once stays valid for that key pair forever and anyone who observes
//! it can replay it, which is what lets it be shared as a read URL.

use base64::Engine;
use rsa::Pkcs1v15Sign;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use super::keypair::KeyPair;
use super::BASE64;
use crate::errors::{VaultError, Result};

/// Operation a capability signature authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Read,
    Update,
    Delete,
}

impl Intent {
    /// The literal message bytes that get signed.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Digest used inside the PKCS#1 v1.5 signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    fn digest(self, message: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => Sha1::digest(message).to_vec(),
            Self::Sha256 => Sha256::digest(message).to_vec(),
        }
    }

    fn scheme(self) -> Pkcs1v15Sign {
        match self {
            Self::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
            Self::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        }
    }
}

/// Binds a key pair, a message and a hash for one sign or verify call.
pub struct Signer<'a> {
    key_pair: &'a KeyPair,
    message: Vec<u8>,
    hash: HashAlgorithm,
}

impl<'a> Signer<'a> {
    pub fn new(key_pair: &'a KeyPair, message: Vec<u8>, hash: HashAlgorithm) -> Self {
        Self {
            key_pair,
            message,
            hash,
        }
    }

    pub fn message(&self) -> &[u8] {
        &self.message
    }

    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    /// Produce the base64 signature. Requires the private key.
    pub fn sign(&self) -> Result<String> {
        let private_key = self.key_pair.private_key().ok_or(VaultError::MissingKey)?;
        let digest = self.hash.digest(&self.message);
        let signature = private_key
            .sign(self.hash.scheme(), &digest)
            .map_err(|e| VaultError::Crypto(format!("signing failed: {e}")))?;
        Ok(BASE64.encode(signature))
    }

    /// Check a base64 signature against the public key.
    ///
    /// Undecodable input simply fails verification.
    pub fn verify(&self, signature: &str) -> bool {
        let Ok(signature) = BASE64.decode(signature.trim()) else {
            return false;
        };
        let digest = self.hash.digest(&self.message);
        self.key_pair
            .public_key()
            .verify(self.hash.scheme(), &digest, &signature)
            .is_ok()
    }
}
