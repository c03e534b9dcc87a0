//! Integration tests for the sign-gated registry repository.

use std::collections::HashSet;
use std::sync::Arc;

use futures::StreamExt;
use signvault::crypto::{Intent, KeyPair, ModulusLength};
use signvault::errors::VaultError;
use signvault::repository::{
    Comparator, Filter, Id, ListOptions, PublishOptions, Query, RegistryStore, VaultRepository,
};
use tempfile::TempDir;

fn repo(tmp: &TempDir) -> VaultRepository {
    VaultRepository::new(RegistryStore::open(tmp.path().join("registries")).unwrap())
}

#[tokio::test]
async fn publish_read_update_delete_scenario() {
    let tmp = TempDir::new().unwrap();
    let repo = repo(&tmp);

    let published = repo.publish("abc".into(), PublishOptions::default()).await.unwrap();
    let keys = KeyPair::import(&published.public_key, published.private_key.as_deref()).unwrap();
    let read_sign = keys.sign(Intent::Read).unwrap();

    let got = repo.read(&published.id, &read_sign).await.unwrap().unwrap();
    assert_eq!(got.content(), "abc");

    repo.update(&published.id, &keys.sign(Intent::Update).unwrap(), "xyz".into())
        .await
        .unwrap()
        .unwrap();
    let got = repo.read(&published.id, &read_sign).await.unwrap().unwrap();
    assert_eq!(got.content(), "xyz");

    repo.delete(&published.id, &keys.sign(Intent::Delete).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(repo.read(&published.id, &read_sign).await.unwrap().is_none());

    let remaining = repo.store().find_all(Query::new()).await.unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn tampered_signature_is_rejected_and_content_survives() {
    let tmp = TempDir::new().unwrap();
    let repo = repo(&tmp);

    let published = repo.publish("keep".into(), PublishOptions::default()).await.unwrap();
    let keys = KeyPair::import(&published.public_key, published.private_key.as_deref()).unwrap();

    let mut forged = keys.sign(Intent::Update).unwrap().into_bytes();
    forged[4] = if forged[4] == b'A' { b'B' } else { b'A' };
    let forged = String::from_utf8(forged).unwrap();

    let err = repo
        .update(&published.id, &forged, "evil".into())
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::Authorization(_)));
    assert_eq!(err.status_code(), 401);

    let got = repo
        .read(&published.id, &keys.sign(Intent::Read).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(got.content(), "keep");
}

#[tokio::test]
async fn signatures_are_replayable() {
    let tmp = TempDir::new().unwrap();
    let repo = repo(&tmp);

    let published = repo.publish("v1".into(), PublishOptions::default()).await.unwrap();
    let keys = KeyPair::import(&published.public_key, published.private_key.as_deref()).unwrap();
    let update_sign = keys.sign(Intent::Update).unwrap();

    for content in ["v2", "v3", "v4"] {
        repo.update(&published.id, &update_sign, content.into())
            .await
            .unwrap()
            .unwrap();
    }
    let got = repo
        .read(&published.id, &keys.sign(Intent::Read).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(got.content(), "v4");
}

#[tokio::test]
async fn list_pages_are_disjoint_and_complete() {
    let tmp = TempDir::new().unwrap();
    let repo = repo(&tmp);
    let owner = KeyPair::generate(ModulusLength::Bits512).await.unwrap();
    let public_key = owner.export_public_key().unwrap();

    let mut published = HashSet::new();
    for i in 0..7 {
        let p = repo
            .publish(
                format!("c{i}"),
                PublishOptions {
                    public_key: Some(public_key.clone()),
                    modulus_length: None,
                },
            )
            .await
            .unwrap();
        published.insert(p.id);
    }

    let mut seen = Vec::new();
    let mut token: Option<Id> = None;
    loop {
        let page = repo
            .list(ListOptions {
                limit: Some(3),
                continue_token: token.clone(),
            })
            .await
            .unwrap();
        if page.result.is_empty() {
            assert!(page.continue_token.is_none());
            break;
        }
        assert!(page.result.len() <= 3);
        seen.extend(page.result.iter().map(|r| r.id().clone()));
        token = page.continue_token;
    }

    let unique: HashSet<_> = seen.iter().cloned().collect();
    assert_eq!(unique.len(), seen.len(), "pages overlapped");
    assert_eq!(unique, published);
}

#[tokio::test]
async fn find_streams_lazily_with_filters() {
    let tmp = TempDir::new().unwrap();
    let db = RegistryStore::open(tmp.path().join("registries")).unwrap();
    for hex in ["01", "02", "03", "04"] {
        db.create(hex.into(), "PK".into(), Some(Id::from_hex(hex).unwrap()))
            .await
            .unwrap();
    }

    let query = Query::new()
        .and(Filter::Id(Comparator::Gte(Id::from_hex("02").unwrap())))
        .and(Filter::Id(Comparator::Lt(Id::from_hex("04").unwrap())));
    let stream = db.find(query);
    futures::pin_mut!(stream);

    let mut contents = Vec::new();
    while let Some(item) = stream.next().await {
        contents.push(item.unwrap().into_content());
    }
    contents.sort();
    assert_eq!(contents, ["02", "03"]);
}

#[tokio::test]
async fn concurrent_publishes_get_distinct_ids() {
    let tmp = TempDir::new().unwrap();
    let repo = Arc::new(repo(&tmp));
    let owner = KeyPair::generate(ModulusLength::Bits512).await.unwrap();
    let public_key = owner.export_public_key().unwrap();

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let repo = Arc::clone(&repo);
            let public_key = public_key.clone();
            tokio::spawn(async move {
                repo.publish(
                    format!("{i}"),
                    PublishOptions {
                        public_key: Some(public_key),
                        modulus_length: None,
                    },
                )
                .await
                .unwrap()
                .id
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for t in tasks {
        assert!(ids.insert(t.await.unwrap()));
    }
    assert_eq!(repo.store().ids(&Query::new()).await.unwrap().len(), 32);
}

#[tokio::test]
async fn registry_file_is_named_by_hex_id() {
    let tmp = TempDir::new().unwrap();
    let repo = repo(&tmp);
    let published = repo.publish("abc".into(), PublishOptions::default()).await.unwrap();

    let path = tmp
        .path()
        .join("registries")
        .join(format!("{}.json", published.id.to_hex()));
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(raw["id"], published.id.to_hex());
    assert_eq!(raw["content"], "abc");
    assert_eq!(raw["ownerPublicKey"], published.public_key);
}
