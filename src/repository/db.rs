//! File-per-record document store for registries.
//!
//! Every registry lives in `<dir>/<id-hex>.json`. There is no index and
//! no locking: concurrent updates to one record are last-writer-wins.
//! Names starting with `.` (temp files, editor droppings) are ignored.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use tokio::fs;

use super::id::Id;
use super::query::{apply_mutations, Mutation, Query};
use super::registry::Registry;
use crate::errors::{VaultError, Result};
use crate::fsio;

const EXTENSION: &str = ".json";

/// Handle on a registry directory.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    dir: PathBuf,
}

impl RegistryStore {
    /// Open (creating if needed) the registry directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fsio::ensure_private_dir(&dir)?;
        tracing::debug!(dir = %dir.display(), "opened registry store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the record for `id` is (or would be) stored.
    pub fn path_for(&self, id: &Id) -> PathBuf {
        self.dir.join(format!("{}{EXTENSION}", id.to_hex()))
    }

    /// Persist a new registry, allocating an id unless one is given.
    ///
    /// An explicit id that already exists is overwritten.
    pub async fn create(
        &self,
        content: String,
        owner_public_key: String,
        id: Option<Id>,
    ) -> Result<Registry> {
        let id = id.unwrap_or_else(Id::generate);
        let registry = Registry::new(id, content, owner_public_key);
        self.write(&registry).await?;
        tracing::debug!(id = %registry.id(), "created registry");
        Ok(registry)
    }

    /// Lazily stream every record matching `query`.
    ///
    /// Records come out in directory-listing order. Files that vanish
    /// between listing and reading are skipped. The stream is single-use.
    pub fn find(&self, query: Query) -> impl Stream<Item = Result<Registry>> + Send + '_ {
        try_stream! {
            let mut entries = fs::read_dir(&self.dir).await.map_err(VaultError::from)?;
            while let Some(entry) = entries.next_entry().await.map_err(VaultError::from)? {
                let Some(id) = id_from_file_name(&entry.file_name().to_string_lossy()) else {
                    continue;
                };
                if !query.matches_id(&id) {
                    continue;
                }
                let Some(registry) = self.load(&id).await? else {
                    continue;
                };
                if query.matches(&registry) {
                    yield registry;
                }
            }
        }
    }

    /// Ids of every record passing the id filters of `query`, ascending
    /// by hex. Only file names are read.
    pub async fn ids(&self, query: &Query) -> Result<Vec<Id>> {
        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(id) = id_from_file_name(&entry.file_name().to_string_lossy()) {
                if query.matches_id(&id) {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Collect the whole of `find` into memory.
    pub async fn find_all(&self, query: Query) -> Result<Vec<Registry>> {
        let stream = self.find(query);
        futures::pin_mut!(stream);
        let mut out = Vec::new();
        while let Some(item) = stream.next().await {
            out.push(item?);
        }
        Ok(out)
    }

    /// Fetch the single record named by the query's `id` equality.
    pub async fn find_one(&self, query: &Query) -> Result<Option<Registry>> {
        let id = require_id(query)?;
        match self.load(id).await? {
            Some(registry) if query.matches(&registry) => Ok(Some(registry)),
            _ => Ok(None),
        }
    }

    /// Remove the record named by the query's `id` equality.
    ///
    /// Returns the removed id, or `None` when nothing was there.
    pub async fn delete_one(&self, query: &Query) -> Result<Option<Id>> {
        let Some(registry) = self.find_one(query).await? else {
            return Ok(None);
        };
        match fs::remove_file(self.path_for(registry.id())).await {
            Ok(()) => {
                tracing::debug!(id = %registry.id(), "deleted registry");
                Ok(Some(registry.id().clone()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply `mutations` to the matching record and overwrite it whole.
    pub async fn update_one(
        &self,
        query: &Query,
        mutations: &[Mutation],
    ) -> Result<Option<Registry>> {
        let Some(current) = self.find_one(query).await? else {
            return Ok(None);
        };
        let next = apply_mutations(&current, mutations)?;
        self.write(&next).await?;
        tracing::debug!(id = %next.id(), "updated registry");
        Ok(Some(next))
    }

    async fn load(&self, id: &Id) -> Result<Option<Registry>> {
        let bytes = match fs::read(self.path_for(id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let registry: Registry = serde_json::from_slice(&bytes).map_err(|e| {
            VaultError::Serialization(format!("registry {id} is corrupt: {e}"))
        })?;
        Ok(Some(registry))
    }

    async fn write(&self, registry: &Registry) -> Result<()> {
        let bytes = serde_json::to_vec(registry)?;
        fsio::write_atomic(&self.path_for(registry.id()), &bytes).await
    }
}

fn id_from_file_name(name: &str) -> Option<Id> {
    if name.starts_with('.') {
        return None;
    }
    name.strip_suffix(EXTENSION)
        .and_then(|stem| Id::from_hex(stem).ok())
}

fn require_id(query: &Query) -> Result<&Id> {
    query.id_eq().ok_or_else(|| {
        VaultError::Validation("single-record operations need an id equality filter".into())
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::repository::query::{Comparator, Field, Filter};

    fn store() -> (TempDir, RegistryStore) {
        let tmp = TempDir::new().unwrap();
        let store = RegistryStore::open(tmp.path().join("registries")).unwrap();
        (tmp, store)
    }

    #[tokio::test]
    async fn create_then_find_one() {
        let (_tmp, db) = store();
        let created = db.create("hello".into(), "PK".into(), None).await.unwrap();

        assert!(db.path_for(created.id()).exists());
        let found = db
            .find_one(&Query::by_id(created.id().clone()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn find_one_on_absent_id_is_none() {
        let (_tmp, db) = store();
        let got = db.find_one(&Query::by_id(Id::generate())).await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn single_record_ops_need_an_id() {
        let (_tmp, db) = store();
        assert!(matches!(
            db.find_one(&Query::new()).await,
            Err(VaultError::Validation(_))
        ));
        assert!(matches!(
            db.delete_one(&Query::new()).await,
            Err(VaultError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn create_with_explicit_id() {
        let (_tmp, db) = store();
        let id = Id::from_hex("00ff").unwrap();
        let r = db.create("x".into(), "PK".into(), Some(id.clone())).await.unwrap();
        assert_eq!(r.id(), &id);
        assert!(db.dir().join("00ff.json").exists());
    }

    #[tokio::test]
    async fn update_overwrites_content_only() {
        let (_tmp, db) = store();
        let r = db.create("old".into(), "PK".into(), None).await.unwrap();
        let q = Query::by_id(r.id().clone());

        let updated = db
            .update_one(&q, &[Mutation::assign(Field::Content, "new")])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.content(), "new");
        assert_eq!(updated.created_at(), r.created_at());

        let reread = db.find_one(&q).await.unwrap().unwrap();
        assert_eq!(reread.content(), "new");
        assert_eq!(reread.owner_public_key(), "PK");
    }

    #[tokio::test]
    async fn failed_mutation_leaves_record_untouched() {
        let (_tmp, db) = store();
        let r = db.create("old".into(), "PK".into(), None).await.unwrap();
        let q = Query::by_id(r.id().clone());

        let err = db
            .update_one(&q, &[Mutation::Set(Field::Content, json!([1, 2]))])
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::Validation(_)));
        assert_eq!(db.find_one(&q).await.unwrap().unwrap().content(), "old");
    }

    #[tokio::test]
    async fn delete_removes_file() {
        let (_tmp, db) = store();
        let r = db.create("x".into(), "PK".into(), None).await.unwrap();
        let q = Query::by_id(r.id().clone());

        assert_eq!(db.delete_one(&q).await.unwrap(), Some(r.id().clone()));
        assert!(!db.path_for(r.id()).exists());
        assert_eq!(db.delete_one(&q).await.unwrap(), None);
    }

    #[tokio::test]
    async fn find_streams_matching_records_and_skips_dotfiles() {
        let (_tmp, db) = store();
        for i in 0..5 {
            db.create(format!("c{i}"), "PK".into(), None).await.unwrap();
        }
        std::fs::write(db.dir().join(".scratch.json.tmp"), b"junk").unwrap();
        std::fs::write(db.dir().join("README"), b"junk").unwrap();

        let all = db.find_all(Query::new()).await.unwrap();
        assert_eq!(all.len(), 5);
    }

    #[tokio::test]
    async fn find_applies_id_range() {
        let (_tmp, db) = store();
        for hex in ["10", "20", "30"] {
            db.create("x".into(), "PK".into(), Some(Id::from_hex(hex).unwrap()))
                .await
                .unwrap();
        }
        let q = Query::new().and(Filter::Id(Comparator::Gt(Id::from_hex("10").unwrap())));
        let mut ids: Vec<_> = db
            .find_all(q.clone())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id().to_hex())
            .collect();
        ids.sort();
        assert_eq!(ids, ["20", "30"]);

        let sorted: Vec<_> = db.ids(&q).await.unwrap().iter().map(Id::to_hex).collect();
        assert_eq!(sorted, ["20", "30"]);
    }

    #[tokio::test]
    async fn corrupt_record_is_a_serialization_error() {
        let (_tmp, db) = store();
        let id = Id::generate();
        std::fs::write(db.path_for(&id), b"{not json").unwrap();
        assert!(matches!(
            db.find_one(&Query::by_id(id)).await,
            Err(VaultError::Serialization(_))
        ));
    }
}
