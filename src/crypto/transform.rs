//! Raw RSA transforms with the key roles reversed.
//!
//! `private_transform` pads the payload with PKCS#1 v1.5 block type 1
//! (`00 01 FF.. 00 || payload`) and raises it to the private exponent.
//! `public_transform` raises the result to the public exponent and strips
//! that padding again. Only the private-key holder can produce a blob the
//! public transform accepts, but anyone with the public key recovers the
//! payload: this is a recoverable signature, not encryption.

use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};

use crate::errors::{VaultError, Result};

/// Bytes of framing added by block type 1 padding (00 01 PS 00, |PS| >= 8).
pub const PADDING_OVERHEAD: usize = 11;

/// Largest payload a key of this size can carry.
pub fn max_payload_len(key: &RsaPublicKey) -> usize {
    key.size().saturating_sub(PADDING_OVERHEAD)
}

/// Pad and transform `payload` with the private key.
///
/// Output is exactly one modulus-sized block.
pub fn private_transform(key: &RsaPrivateKey, payload: &[u8]) -> Result<Vec<u8>> {
    let limit = max_payload_len(&key.to_public_key());
    if payload.len() > limit {
        return Err(VaultError::Crypto(format!(
            "payload of {} bytes is too large for a {}-bit key (max {limit} bytes)",
            payload.len(),
            key.size() * 8
        )));
    }

    // An unprefixed PKCS#1 v1.5 signature is exactly the type 1 padded
    // private-key operation; the rng only blinds the exponentiation.
    key.sign_with_rng(&mut OsRng, Pkcs1v15Sign::new_unprefixed(), payload)
        .map_err(|e| VaultError::Crypto(format!("private transform failed: {e}")))
}

/// Undo `private_transform` with the public key.
pub fn public_transform(key: &RsaPublicKey, block: &[u8]) -> Result<Vec<u8>> {
    let k = key.size();
    if block.len() != k {
        return Err(VaultError::Crypto(format!(
            "expected a {k}-byte block, got {} bytes",
            block.len()
        )));
    }

    let c = BigUint::from_bytes_be(block);
    if &c >= key.n() {
        return Err(VaultError::Crypto("block is out of range for this key".into()));
    }

    let m = c.modpow(key.e(), key.n()).to_bytes_be();
    if m.len() > k {
        return Err(VaultError::Crypto("block is out of range for this key".into()));
    }
    let mut em = vec![0u8; k - m.len()];
    em.extend_from_slice(&m);

    unpad_type1(&em).ok_or_else(|| {
        VaultError::Crypto("payload was not produced by this vault's private key".into())
    })
}

fn unpad_type1(em: &[u8]) -> Option<Vec<u8>> {
    if em.len() < PADDING_OVERHEAD || em[0] != 0x00 || em[1] != 0x01 {
        return None;
    }
    let rest = &em[2..];
    let separator = rest.iter().position(|&b| b != 0xFF)?;
    if separator < 8 || rest[separator] != 0x00 {
        return None;
    }
    Some(rest[separator + 1..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{KeyPair, ModulusLength};

    #[tokio::test]
    async fn transform_round_trips() {
        let kp = KeyPair::generate(ModulusLength::Bits512).await.unwrap();
        let private = kp.private_key().unwrap();

        let block = private_transform(private, b"{\"a\":1}").unwrap();
        assert_eq!(block.len(), 64);

        let back = public_transform(kp.public_key(), &block).unwrap();
        assert_eq!(back, b"{\"a\":1}");
    }

    #[tokio::test]
    async fn empty_payload_round_trips() {
        let kp = KeyPair::generate(ModulusLength::Bits512).await.unwrap();
        let block = private_transform(kp.private_key().unwrap(), b"").unwrap();
        assert_eq!(public_transform(kp.public_key(), &block).unwrap(), b"");
    }

    #[tokio::test]
    async fn oversize_payload_is_rejected() {
        let kp = KeyPair::generate(ModulusLength::Bits512).await.unwrap();
        let limit = max_payload_len(kp.public_key());
        assert_eq!(limit, 53);

        let ok = vec![b'x'; limit];
        assert!(private_transform(kp.private_key().unwrap(), &ok).is_ok());

        let too_big = vec![b'x'; limit + 1];
        assert!(matches!(
            private_transform(kp.private_key().unwrap(), &too_big),
            Err(VaultError::Crypto(_))
        ));
    }

    #[tokio::test]
    async fn other_key_cannot_recover() {
        let kp = KeyPair::generate(ModulusLength::Bits512).await.unwrap();
        let other = KeyPair::generate(ModulusLength::Bits512).await.unwrap();
        let block = private_transform(kp.private_key().unwrap(), b"hello").unwrap();
        assert!(public_transform(other.public_key(), &block).is_err());
    }

    #[tokio::test]
    async fn tampered_block_is_rejected() {
        let kp = KeyPair::generate(ModulusLength::Bits512).await.unwrap();
        let mut block = private_transform(kp.private_key().unwrap(), b"hello").unwrap();
        block[10] ^= 0x55;
        assert!(public_transform(kp.public_key(), &block).is_err());
        assert!(public_transform(kp.public_key(), &block[..10]).is_err());
    }

    #[test]
    fn unpad_requires_eight_ff_bytes() {
        let mut em = vec![0x00, 0x01];
        em.extend_from_slice(&[0xFF; 7]);
        em.push(0x00);
        em.extend_from_slice(b"abc");
        assert!(unpad_type1(&em).is_none());

        let mut em = vec![0x00, 0x01];
        em.extend_from_slice(&[0xFF; 8]);
        em.push(0x00);
        em.extend_from_slice(b"abc");
        assert_eq!(unpad_type1(&em).unwrap(), b"abc");
    }
}
