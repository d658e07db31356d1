//! # Hashwatt Server
//!
//! axum JSON API over [`hashwatt_core::HashrateService`].
//!
//! The binary (`hashwatt`) parses [`cli::Cli`], installs a `tracing`
//! subscriber, loads [`hashwatt_core::HashwattConfig`] from the environment
//! and calls [`serve`].

pub mod cli;
pub mod error;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use hashwatt_core::HashrateService;
use tracing::info;

pub use error::ServerError;
pub use routes::{router, AppState};

/// Binds `addr` and serves the API until the process is stopped.
pub async fn serve(addr: SocketAddr, service: Arc<HashrateService>) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "listening");

    axum::serve(listener, router(service))
        .await
        .map_err(ServerError::Serve)
}
