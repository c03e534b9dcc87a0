//! Registry identifiers.
//!
//! An `Id` is a byte string laid out as
//!
//! ```text
//! [12 random bytes] \n [counter, base 36] \n [unix millis, base 36]
//! ```
//!
//! and travels as lowercase hex. The random prefix keeps concurrent ids
//! apart; the counter only breaks ties inside one process. Because the
//! prefix is random, hex order says nothing about creation order.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{VaultError, Result};

/// Length of the random prefix.
const RANDOM_LEN: usize = 12;

const SEPARATOR: u8 = b'\n';

static COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(Vec<u8>);

impl Id {
    /// Allocate a fresh id.
    pub fn generate() -> Self {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
        let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();

        let mut random = [0u8; RANDOM_LEN];
        rand::rngs::OsRng.fill_bytes(&mut random);

        let mut buf = Vec::with_capacity(RANDOM_LEN + 16);
        buf.extend_from_slice(&random);
        buf.push(SEPARATOR);
        buf.extend_from_slice(to_base36(n).as_bytes());
        buf.push(SEPARATOR);
        buf.extend_from_slice(to_base36(millis).as_bytes());
        Self(buf)
    }

    /// Parse the hex form.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        if hex_str.is_empty() {
            return Err(VaultError::InvalidId("empty id".into()));
        }
        hex::decode(hex_str)
            .map(Self)
            .map_err(|e| VaultError::InvalidId(format!("'{hex_str}': {e}")))
    }

    /// Wrap raw bytes as an id.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(VaultError::InvalidId("empty id".into()));
        }
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID({})", self.to_hex())
    }
}

impl FromStr for Id {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl TryFrom<&str> for Id {
    type Error = VaultError;

    fn try_from(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl TryFrom<Vec<u8>> for Id {
    type Error = VaultError;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".into();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
