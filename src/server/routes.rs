//! Handlers for the `/vault` API.
//!
//! - `GET    /vault?limit=&continueToken=` page through registries
//! - `POST   /vault` publish (JSON body)
//! - `GET    /vault/{id}?key=` read with a read signature
//! - `PUT    /vault/{id}?key=` replace content with the raw body
//! - `DELETE /vault/{id}?key=` remove with a delete signature

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::error::ApiError;
use crate::crypto::{ModulusLength, BASE64};
use crate::errors::VaultError;
use crate::repository::{Id, ListOptions, PublishOptions, VaultRepository};

pub type AppState = Arc<VaultRepository>;

/// Body of `POST /vault`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    #[serde(default, alias = "content", skip_serializing_if = "Option::is_none")]
    pub vault_store: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modulus_length: Option<ModulusLength>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    limit: Option<String>,
    continue_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct KeyParam {
    key: Option<String>,
}

impl KeyParam {
    fn require(self) -> Result<String, ApiError> {
        self.key
            .ok_or_else(|| VaultError::Validation("Require key parameter on query".into()).into())
    }
}

pub async fn list_vaults(
    State(repo): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params.map_err(|e| VaultError::Validation(e.body_text()))?;

    // An empty value (`?limit=`) means no limit was given.
    let limit = match params.limit.as_deref().filter(|l| !l.is_empty()) {
        None => None,
        Some(raw) if raw.bytes().all(|b| b.is_ascii_digit()) => Some(
            raw.parse::<usize>()
                .map_err(|_| VaultError::Validation(r#"Query "limit" is not a number"#.into()))?,
        ),
        Some(_) => {
            return Err(VaultError::Validation(r#"Query "limit" is not a number"#.into()).into())
        }
    };
    let continue_token = params
        .continue_token
        .filter(|t| !t.is_empty())
        .map(|t| Id::from_hex(&t))
        .transpose()?;

    let page = repo
        .list(ListOptions {
            limit,
            continue_token,
        })
        .await?;
    Ok(Json(page))
}

pub async fn publish_vault(
    State(repo): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"));
    if !is_json {
        return Err(VaultError::Validation("Require JSON body".into()).into());
    }

    let request: PublishRequest = serde_json::from_slice(&body)
        .map_err(|e| VaultError::Validation(format!("Invalid JSON body: {e}")))?;

    let published = repo
        .publish(
            request.vault_store.unwrap_or_default(),
            PublishOptions {
                public_key: request.public_key,
                modulus_length: request.modulus_length,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(published)))
}

pub async fn read_vault(
    State(repo): State<AppState>,
    Path(id): Path<String>,
    params: Result<Query<KeyParam>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = Id::from_hex(&id)?;
    let key = key_from(params)?;

    let registry = repo.read(&id, &key).await?.ok_or_else(not_found)?;
    Ok(Json(registry))
}

pub async fn update_vault(
    State(repo): State<AppState>,
    Path(id): Path<String>,
    params: Result<Query<KeyParam>, QueryRejection>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let id = Id::from_hex(&id)?;
    let key = key_from(params)?;

    repo.update(&id, &key, BASE64.encode(&body))
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(json!({})))
}

pub async fn delete_vault(
    State(repo): State<AppState>,
    Path(id): Path<String>,
    params: Result<Query<KeyParam>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = Id::from_hex(&id)?;
    let key = key_from(params)?;

    repo.delete(&id, &key).await?.ok_or_else(not_found)?;
    Ok(Json(json!({})))
}

pub async fn fallback() -> ApiError {
    ApiError(VaultError::NotFound("Cannot found".into()))
}

fn key_from(params: Result<Query<KeyParam>, QueryRejection>) -> Result<String, ApiError> {
    let Query(params) = params.map_err(|e| VaultError::Validation(e.body_text()))?;
    params.require()
}

fn not_found() -> VaultError {
    VaultError::NotFound("Cannot found vault".into())
}
