//! The persisted registry record.
//!
//! Each registry is stored as `<id-hex>.json` holding every field,
//! including the owner's public key. Only `content` ever changes after
//! creation, and it is replaced wholesale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::Id;

/// One stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    id: Id,

    /// Opaque payload; base64 when it came in as a raw body.
    #[serde(default, alias = "vaultStore")]
    content: String,

    /// Base64 PKCS#1 DER public key that capability signatures must match.
    #[serde(alias = "publicKey")]
    owner_public_key: String,

    created_at: DateTime<Utc>,
}

impl Registry {
    /// Build a record stamped with the current time.
    pub fn new(id: Id, content: String, owner_public_key: String) -> Self {
        Self {
            id,
            content,
            owner_public_key,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn owner_public_key(&self) -> &str {
        &self.owner_public_key
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn into_content(self) -> String {
        self.content
    }

    /// True when `other` differs from `self` in nothing but `content`.
    pub(crate) fn same_identity(&self, other: &Registry) -> bool {
        self.id == other.id
            && self.owner_public_key == other.owner_public_key
            && self.created_at == other.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_json_uses_camel_case() {
        let r = Registry::new(Id::from_hex("aa").unwrap(), "abc".into(), "KEY".into());
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["id"], "aa");
        assert_eq!(json["content"], "abc");
        assert_eq!(json["ownerPublicKey"], "KEY");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn legacy_field_names_still_load() {
        let json = r#"{"id":"0102","vaultStore":"x","publicKey":"K","createdAt":"2021-03-04T05:06:07Z"}"#;
        let r: Registry = serde_json::from_str(json).unwrap();
        assert_eq!(r.content(), "x");
        assert_eq!(r.owner_public_key(), "K");
    }

    #[test]
    fn missing_content_defaults_to_empty() {
        let json = r#"{"id":"0102","ownerPublicKey":"K","createdAt":"2021-03-04T05:06:07Z"}"#;
        let r: Registry = serde_json::from_str(json).unwrap();
        assert_eq!(r.content(), "");
    }
}
