//! Sign-gated repository operations.
//!
//! `VaultRepository` owns a `RegistryStore` and guards every read,
//! update and delete with a capability signature checked against the
//! owner key stored in the record. Verification always happens before
//! any mutation, so a rejected signature never changes state.

use serde::{Deserialize, Serialize};

use super::db::RegistryStore;
use super::id::Id;
use super::query::{Comparator, Field, Filter, Mutation, Query};
use super::registry::Registry;
use crate::crypto::{Intent, KeyPair, KeyPairOptions, ModulusLength};
use crate::errors::{VaultError, Result};

/// Page size used when the caller gives none.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Key material choices for `publish`.
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Existing public key to bind the record to; generated when absent.
    pub public_key: Option<String>,
    pub modulus_length: Option<ModulusLength>,
}

/// Result of `publish`. The private key appears here and nowhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Published {
    pub id: Id,
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub limit: Option<usize>,
    pub continue_token: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    pub result: Vec<Registry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continue_token: Option<Id>,
}

pub struct VaultRepository {
    db: RegistryStore,
    default_modulus: ModulusLength,
}

impl VaultRepository {
    pub fn new(db: RegistryStore) -> Self {
        Self {
            db,
            default_modulus: ModulusLength::default(),
        }
    }

    /// Key size used by `publish` when the caller asks for none.
    pub fn with_default_modulus(mut self, modulus_length: ModulusLength) -> Self {
        self.default_modulus = modulus_length;
        self
    }

    pub fn store(&self) -> &RegistryStore {
        &self.db
    }

    /// Create a registry owned by a given or freshly generated key pair.
    pub async fn publish(&self, content: String, options: PublishOptions) -> Result<Published> {
        let key_pair = KeyPair::resolve(KeyPairOptions::from_parts(
            options.public_key,
            None,
            Some(options.modulus_length.unwrap_or(self.default_modulus)),
        ))
        .await?;
        let export = key_pair.export()?;

        let registry = self
            .db
            .create(content, export.public_key.clone(), None)
            .await?;
        tracing::info!(id = %registry.id(), "published registry");

        Ok(Published {
            id: registry.id().clone(),
            public_key: export.public_key,
            private_key: export.private_key,
        })
    }

    /// Fetch a registry with a read signature. `None` if it does not exist.
    pub async fn read(&self, id: &Id, read_sign: &str) -> Result<Option<Registry>> {
        self.authorize(id, Intent::Read, read_sign).await
    }

    /// Replace a registry's content with an update signature.
    ///
    /// Returns `None` when the registry does not exist.
    pub async fn update(&self, id: &Id, update_sign: &str, content: String) -> Result<Option<()>> {
        if self.authorize(id, Intent::Update, update_sign).await?.is_none() {
            return Ok(None);
        }
        let updated = self
            .db
            .update_one(
                &Query::by_id(id.clone()),
                &[Mutation::assign(Field::Content, content)],
            )
            .await?;
        Ok(updated.map(|_| ()))
    }

    /// Remove a registry with a delete signature.
    ///
    /// Returns `None` when the registry does not exist.
    pub async fn delete(&self, id: &Id, delete_sign: &str) -> Result<Option<()>> {
        if self.authorize(id, Intent::Delete, delete_sign).await?.is_none() {
            return Ok(None);
        }
        let deleted = self.db.delete_one(&Query::by_id(id.clone())).await?;
        if deleted.is_some() {
            tracing::info!(%id, "deleted registry");
        }
        Ok(deleted.map(|_| ()))
    }

    /// One page of registries in ascending id order.
    ///
    /// Passing the previous page's `continue_token` yields the records
    /// strictly after it.
    pub async fn list(&self, options: ListOptions) -> Result<ListPage> {
        let limit = options.limit.unwrap_or(DEFAULT_LIST_LIMIT);
        let mut query = Query::new();
        if let Some(token) = options.continue_token {
            query = query.and(Filter::Id(Comparator::Gt(token)));
        }

        let mut result = Vec::with_capacity(limit.min(DEFAULT_LIST_LIMIT));
        for id in self.db.ids(&query).await? {
            if result.len() >= limit {
                break;
            }
            // Deleted between the listing and the read.
            if let Some(registry) = self.db.find_one(&Query::by_id(id)).await? {
                result.push(registry);
            }
        }

        let continue_token = result.last().map(|r| r.id().clone());
        Ok(ListPage {
            result,
            continue_token,
        })
    }

    async fn authorize(&self, id: &Id, intent: Intent, signature: &str) -> Result<Option<Registry>> {
        let Some(registry) = self.db.find_one(&Query::by_id(id.clone())).await? else {
            return Ok(None);
        };

        let owner = KeyPair::import(registry.owner_public_key(), None)?;
        if !owner.create_signer(intent).verify(signature) {
            tracing::warn!(%id, intent = intent.tag(), "signature rejected");
            return Err(VaultError::Authorization("Error verify sign".into()));
        }
        Ok(Some(registry))
    }
}
