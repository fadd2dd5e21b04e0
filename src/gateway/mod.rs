//! HTTP Gateway
//!
//! | Method | Path | Operation |
//! |---|---|---|
//! | PUT | `/account` | create account |
//! | GET | `/account/{id}` | read account |
//! | POST | `/account` | update owner name / comment |
//! | DELETE | `/account/{id}` | delete account |
//! | PUT | `/payment` | transfer funds |
//! | GET | `/payment` | list payments by account and interval |
//! | GET | `/payment/{id}` | read payment |
//! | GET | `/health` | store liveness |

pub mod handlers;
pub mod state;
pub mod types;

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, put},
};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::GatewayConfig;
use state::AppState;

/// Build the router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/account",
            put(handlers::create_account).post(handlers::update_account),
        )
        .route(
            "/account/{id}",
            get(handlers::read_account).delete(handlers::delete_account),
        )
        .route(
            "/payment",
            put(handlers::create_payment).get(handlers::list_payments),
        )
        .route("/payment/{id}", get(handlers::read_payment))
        .route("/health", get(handlers::health_check))
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Gateway server error")
}

/// Bind `host:port` and serve until `shutdown` resolves
pub async fn run_server<F>(
    config: &GatewayConfig,
    state: Arc<AppState>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(addr = %addr, store = state.store.name(), "Gateway listening");
    serve(listener, state, shutdown).await
}
