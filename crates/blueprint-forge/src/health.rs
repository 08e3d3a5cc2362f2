//! Liveness endpoint for the hosting platform's health check.
//!
//! One route, one task, no shared state with the pipeline.

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tracing::info;

pub async fn serve(port: u16) -> Result<()> {
    let app = Router::new().route("/", get(|| async { "blueprint-forge is alive" }));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind liveness port {port}"))?;
    info!(port, "liveness endpoint up");
    axum::serve(listener, app).await.context("liveness server exited")?;
    Ok(())
}
