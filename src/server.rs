//! The server module exposes the improve endpoint over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::AdvisoryMode;
use crate::advisory::Advisor;
use crate::constants::IMPROVE_ROUTE;
use crate::error::ImproveError;
use crate::improve::{ImproveContext, improve_html};
use crate::normalize::prettify;
use crate::storage::RecordStore;
use crate::upload::read_upload;

/// Process-wide collaborators shared by all requests. Nothing in it changes after startup.
#[derive(Clone)]
pub struct AppState {
    pub advisor: Arc<dyn Advisor>,
    pub store: Arc<dyn RecordStore>,
    pub prompt_template: Option<Arc<str>>,
    pub advisory: AdvisoryMode,
}

/// Success body of the improve endpoint.
#[derive(Debug, Serialize)]
pub struct ImproveResponse {
    pub improved_html: String,
}

/// Builds the application router.
///
/// CORS allows every origin, method and header. The request body size is not limited.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(IMPROVE_ROUTE, post(improve_code))
        .route(IMPROVE_ROUTE.trim_end_matches('/'), post(improve_code))
        .route("/healthz", get(liveness))
        .layer(DefaultBodyLimit::disable())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Binds `addr` and serves until Ctrl-C or SIGTERM, then waits for in-flight requests.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .context(format!("Unable to bind {addr}"))?;

    info!(
        "Listening on {} (advisory {})",
        listener.local_addr()?,
        state.advisory
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    info!("Server stopped");
    Ok(())
}

async fn improve_code(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImproveResponse>, ImproveError> {
    let upload = read_upload(&mut multipart).await?;
    let parsed_html = prettify(&upload.content);
    info!(
        "Normalized {} ({} bytes)",
        upload.file_name.as_deref().unwrap_or("upload"),
        upload.content.len()
    );

    let improved_html = match state.advisory {
        AdvisoryMode::Dormant => parsed_html,
        AdvisoryMode::Active => {
            let ctx = ImproveContext {
                advisor: state.advisor.as_ref(),
                store: state.store.as_ref(),
                prompt_template: state.prompt_template.as_deref(),
            };
            improve_html(&ctx, &parsed_html).await?
        }
    };

    Ok(Json(ImproveResponse { improved_html }))
}

async fn liveness() -> &'static str {
    "ok"
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Unable to listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("Unable to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = sigterm => {}
    }

    info!("Shutdown signal received, draining requests");
}
