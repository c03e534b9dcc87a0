//! HTTP client for the `/vault` API.
//!
//! Failures come back as the same `VaultError` variants the server
//! raised, rebuilt from the status code. Nothing is retried and no
//! timeout is imposed; callers wanting a deadline wrap the future.

use reqwest::{Method, RequestBuilder, Response};

use super::error::{ErrorEnvelope, ERR_MESSAGE_HEADER};
use super::routes::PublishRequest;
use crate::errors::{VaultError, Result};
use crate::repository::{Id, ListPage, Published, Registry};

#[derive(Debug, Clone)]
pub struct RepositoryClient {
    http: reqwest::Client,
    url: String,
}

impl RepositoryClient {
    /// Client for the registry at `url` (e.g. `http://localhost:4874`).
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into().trim_end_matches('/').to_string();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(VaultError::Config(format!(
                "registry url '{url}' must start with http:// or https://"
            )));
        }
        let http = reqwest::Client::builder()
            .user_agent(format!("signvault/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn req(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{path}", self.url))
    }

    /// Publish a registry; an empty request makes the server generate keys.
    pub async fn create(&self, request: &PublishRequest) -> Result<Published> {
        let res = self
            .handle(self.req(Method::POST, "/vault").json(request))
            .await?;
        Ok(res.json().await?)
    }

    pub async fn read(&self, id: &Id, read_sign: &str) -> Result<Registry> {
        let res = self
            .handle(
                self.req(Method::GET, &format!("/vault/{id}"))
                    .query(&[("key", read_sign)]),
            )
            .await?;
        Ok(res.json().await?)
    }

    /// Replace the content with `body`; the server stores it base64 encoded.
    pub async fn update(&self, id: &Id, update_sign: &str, body: Vec<u8>) -> Result<()> {
        self.handle(
            self.req(Method::PUT, &format!("/vault/{id}"))
                .query(&[("key", update_sign)])
                .body(body),
        )
        .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &Id, delete_sign: &str) -> Result<()> {
        self.handle(
            self.req(Method::DELETE, &format!("/vault/{id}"))
                .query(&[("key", delete_sign)]),
        )
        .await?;
        Ok(())
    }

    pub async fn list(&self, limit: Option<usize>, continue_token: Option<&Id>) -> Result<ListPage> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(token) = continue_token {
            query.push(("continueToken", token.to_hex()));
        }
        let res = self
            .handle(self.req(Method::GET, "/vault").query(&query))
            .await?;
        Ok(res.json().await?)
    }

    async fn handle(&self, request: RequestBuilder) -> Result<Response> {
        let res = request.send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let header = res
            .headers()
            .get(ERR_MESSAGE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = res.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|env| env.error.message)
            .ok()
            .or(header)
            .unwrap_or_else(|| {
                if body.is_empty() {
                    status.to_string()
                } else {
                    body
                }
            });

        tracing::debug!(status = status.as_u16(), %message, "registry request failed");
        Err(VaultError::from_status(status.as_u16(), message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_must_be_http() {
        assert!(RepositoryClient::new("ftp://x").is_err());
        let c = RepositoryClient::new("http://localhost:4874/").unwrap();
        assert_eq!(c.url(), "http://localhost:4874");
    }
}
