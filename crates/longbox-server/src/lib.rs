//! Longbox API Server
//!
//! HTTP surface for the Longbox comic catalog's authorization core.
//!
//! # Architecture
//!
//! - **Routes**: HTTP endpoint definitions
//! - **Middleware**: session resolution and the authorization gate
//! - **Accounts**: user storage, login and administration
//! - **State**: the evaluator, audit logger and services shared by handlers
//!
//! Every protected route goes through [`Authorizer::authorize`], either via
//! [`AuthzLayer`] on a router or [`protect`] around a single handler.

#![warn(clippy::all)]

pub mod accounts;
pub mod error;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use middleware::authz::{protect, Authorizer, AuthzConfig, AuthzLayer, AuthzVerdict};
pub use middleware::session::{Identity, SessionIssuer, SessionResolver};
pub use state::AppState;

use axum::Router;
use longbox_common_config::LongboxConfig;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Server builder for constructing and running the API server.
pub struct Server {
    config: LongboxConfig,
    state: AppState,
}

impl Server {
    /// Create a new server with the given configuration.
    pub async fn new(config: LongboxConfig) -> Result<Self, anyhow::Error> {
        let state = AppState::new(config.clone()).await?;
        Ok(Self { config, state })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        routes::create_router(self.state.clone())
    }

    /// Run the server, binding to the configured address.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let addr = self.config.server.bind_address();
        let listener = TcpListener::bind(&addr).await?;

        info!(
            address = %addr,
            rbac = %self.state.evaluator.mode(),
            "Server listening"
        );

        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        self.state.db.close().await;
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
