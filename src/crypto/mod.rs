//! RSA primitives for the vault.
//!
//! This module provides:
//! - `KeyPair` import, export and generation (`keypair`)
//! - Capability signatures over fixed intent tags (`signer`)
//! - The reversed-role raw RSA transform used by the codec (`transform`)

pub mod keypair;
pub mod signer;
pub mod transform;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{KeyPair, Intent, ...};
pub use keypair::{KeyPair, KeyPairExport, KeyPairOptions, ModulusLength};
pub use signer::{HashAlgorithm, Intent, Signer};
pub use transform::{max_payload_len, private_transform, public_transform};

/// Standard alphabet, written without `=` padding, read with or without it.
pub const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);
