//! Pluggable blob backends for a vault.
//!
//! A `Store` holds exactly one opaque blob. Implementations decide where
//! it lives; the vault codec only ever calls `write`, `read`, `hash` and
//! `export`.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::file_store::FileStore;
use super::remote_store::RemoteStore;
use crate::errors::{VaultError, Result};
use crate::repository::Id;
use crate::server::client::RepositoryClient;

/// Async interface over one stored blob.
#[async_trait]
pub trait Store: Send + Sync {
    /// Replace the blob.
    async fn write(&self, bytes: &[u8]) -> Result<()>;

    /// The current blob, or `None` when nothing has been written yet.
    async fn read(&self) -> Result<Option<Vec<u8>>>;

    /// A short string identifying the current state or location.
    async fn hash(&self) -> Result<String>;

    /// Serializable description sufficient to reopen this store.
    fn export(&self) -> Result<StoreDescriptor>;
}

/// How to reopen a store, tagged by `protocol`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "protocol")]
pub enum StoreDescriptor {
    #[serde(rename = "fs")]
    File { path: PathBuf },

    #[serde(rename = "rs", rename_all = "camelCase")]
    Remote {
        url: String,
        id: Id,
        public_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        private_key: Option<String>,
    },
}

impl StoreDescriptor {
    /// The protocol tag this descriptor serializes with.
    pub fn protocol(&self) -> &'static str {
        match self {
            Self::File { .. } => "fs",
            Self::Remote { .. } => "rs",
        }
    }

    /// Parse a descriptor, reporting unknown tags as unsupported.
    pub fn from_value(value: Value) -> Result<Self> {
        let protocol = value
            .get("protocol")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if !matches!(protocol.as_str(), "fs" | "rs") {
            return Err(VaultError::UnsupportedProtocol(protocol));
        }
        serde_json::from_value(value)
            .map_err(|e| VaultError::Validation(format!("invalid '{protocol}' store: {e}")))
    }
}

/// Build the adapter a descriptor names.
pub fn open_store(descriptor: StoreDescriptor) -> Result<Box<dyn Store>> {
    match descriptor {
        StoreDescriptor::File { path } => Ok(Box::new(FileStore::new(path))),
        StoreDescriptor::Remote {
            url,
            id,
            public_key,
            private_key,
        } => {
            let client = RepositoryClient::new(url)?;
            let store = RemoteStore::open(client, id, &public_key, private_key.as_deref())?;
            Ok(Box::new(store))
        }
    }
}

/// `open_store` over the raw JSON form.
pub fn open_store_value(value: Value) -> Result<Box<dyn Store>> {
    open_store(StoreDescriptor::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn descriptor_json_uses_protocol_tag() {
        let d = StoreDescriptor::File {
            path: PathBuf::from("/tmp/blob"),
        };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json, json!({"protocol": "fs", "path": "/tmp/blob"}));

        let d = StoreDescriptor::Remote {
            url: "http://localhost:4874".into(),
            id: Id::from_hex("abcd").unwrap(),
            public_key: "PK".into(),
            private_key: None,
        };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["protocol"], "rs");
        assert_eq!(json["publicKey"], "PK");
        assert!(json.get("privateKey").is_none());
    }

    #[test]
    fn unknown_protocol_is_unsupported() {
        let err = StoreDescriptor::from_value(json!({"protocol": "s3", "bucket": "x"})).unwrap_err();
        assert!(matches!(err, VaultError::UnsupportedProtocol(p) if p == "s3"));

        let err = StoreDescriptor::from_value(json!({"path": "/x"})).unwrap_err();
        assert!(matches!(err, VaultError::UnsupportedProtocol(_)));

        assert!(matches!(
            open_store_value(json!({"protocol": "ftp"})),
            Err(VaultError::UnsupportedProtocol(_))
        ));
    }

    #[test]
    fn known_protocol_with_bad_fields_is_a_validation_error() {
        let err = StoreDescriptor::from_value(json!({"protocol": "rs", "url": 1})).unwrap_err();
        assert!(matches!(err, VaultError::Validation(_)));
    }

    #[test]
    fn factory_opens_file_store() {
        let store = open_store_value(json!({"protocol": "fs", "path": "/tmp/x"})).unwrap();
        assert_eq!(store.export().unwrap().protocol(), "fs");
    }
}
