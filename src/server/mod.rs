//! The remote registry: an axum server over `VaultRepository`, and the
//! reqwest client that talks to it.

pub mod client;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Settings;
use crate::errors::{Result, VaultError};
use crate::repository::{RegistryStore, VaultRepository};

pub use client::RepositoryClient;
pub use error::{ApiError, ErrorEnvelope};
pub use routes::PublishRequest;

/// Build the `/vault` router around a repository.
pub fn router(repo: Arc<VaultRepository>) -> Router {
    Router::new()
        .route(
            "/vault",
            get(routes::list_vaults).post(routes::publish_vault),
        )
        .route(
            "/vault/{id}",
            get(routes::read_vault)
                .put(routes::update_vault)
                .delete(routes::delete_vault),
        )
        .fallback(routes::fallback)
        .layer(middleware::from_fn(log_failures))
        .with_state(repo)
}

/// Open the registry directory from settings and serve until Ctrl-C.
pub async fn serve(settings: &Settings) -> Result<()> {
    let db = RegistryStore::open(&settings.registries_dir)?;
    let repo = VaultRepository::new(db).with_default_modulus(settings.modulus_length);

    let listener = bind(settings).await?;
    serve_on(listener, Arc::new(repo)).await
}

/// Bind `host:port` from settings. `host` may be a name or an address.
pub async fn bind(settings: &Settings) -> Result<TcpListener> {
    info!("Starting vault registry on {}:{}", settings.host, settings.port);
    TcpListener::bind((settings.host.as_str(), settings.port))
        .await
        .map_err(|e| {
            VaultError::Config(format!(
                "cannot listen on {}:{}: {e}",
                settings.host, settings.port
            ))
        })
}

/// Serve on an already bound listener. Returns after Ctrl-C.
pub async fn serve_on(listener: TcpListener, repo: Arc<VaultRepository>) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(
        registries = %repo.store().dir().display(),
        "Server ready http://{}", addr
    );

    axum::serve(listener, router(repo))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed.
        std::future::pending::<()>().await;
    }
}

async fn log_failures(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let response = next.run(req).await;

    let status = response.status();
    let message = response
        .headers()
        .get(error::ERR_MESSAGE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if status.is_server_error() {
        tracing::error!(%method, %path, status = status.as_u16(), %message, "request failed");
    } else if status.is_client_error() {
        tracing::warn!(%method, %path, status = status.as_u16(), %message, "request rejected");
    }
    response
}
