//! Blob store backed by a registry on a remote server.
//!
//! Every call signs the matching intent with the local key pair and
//! passes the signature as the `key` query parameter.

use async_trait::async_trait;
use base64::Engine;

use super::store::{Store, StoreDescriptor};
use crate::crypto::{Intent, KeyPair, BASE64};
use crate::errors::{VaultError, Result};
use crate::repository::Id;
use crate::server::client::RepositoryClient;
use crate::server::PublishRequest;

pub struct RemoteStore {
    client: RepositoryClient,
    id: Id,
    key_pair: KeyPair,
}

impl RemoteStore {
    /// Attach to an existing remote registry.
    pub fn open(
        client: RepositoryClient,
        id: Id,
        public_key: &str,
        private_key: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            client,
            id,
            key_pair: KeyPair::import(public_key, private_key)?,
        })
    }

    /// Publish an empty registry and keep the key pair the server returns.
    pub async fn create(client: RepositoryClient) -> Result<Self> {
        let published = client.create(&PublishRequest::default()).await?;
        tracing::info!(id = %published.id, url = client.url(), "created remote store");
        Self::open(
            client,
            published.id,
            &published.public_key,
            published.private_key.as_deref(),
        )
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    /// Remove the remote registry.
    pub async fn delete(&self) -> Result<()> {
        let sign = self.sign(Intent::Delete)?;
        self.client.delete(&self.id, &sign).await?;
        tracing::info!(id = %self.id, "deleted remote store");
        Ok(())
    }

    fn sign(&self, intent: Intent) -> Result<String> {
        self.key_pair.sign(intent)
    }
}

#[async_trait]
impl Store for RemoteStore {
    async fn write(&self, bytes: &[u8]) -> Result<()> {
        let sign = self.sign(Intent::Update)?;
        self.client.update(&self.id, &sign, bytes.to_vec()).await?;
        tracing::debug!(id = %self.id, len = bytes.len(), "wrote remote store");
        Ok(())
    }

    async fn read(&self) -> Result<Option<Vec<u8>>> {
        let sign = self.sign(Intent::Read)?;
        let registry = self.client.read(&self.id, &sign).await?;
        if registry.content().is_empty() {
            return Ok(None);
        }
        BASE64
            .decode(registry.content())
            .map(Some)
            .map_err(|e| VaultError::Serialization(format!("remote content is not base64: {e}")))
    }

    /// The registry id; remote content is never hashed locally.
    async fn hash(&self) -> Result<String> {
        Ok(self.id.to_hex())
    }

    fn export(&self) -> Result<StoreDescriptor> {
        let keys = self.key_pair.export()?;
        Ok(StoreDescriptor::Remote {
            url: self.client.url().to_string(),
            id: self.id.clone(),
            public_key: keys.public_key,
            private_key: keys.private_key,
        })
    }
}

impl std::fmt::Debug for RemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStore")
            .field("url", &self.client.url())
            .field("id", &self.id)
            .field("key_pair", &self.key_pair)
            .finish()
    }
}
