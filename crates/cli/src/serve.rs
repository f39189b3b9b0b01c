// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Demo app: `/` shows the signed-in user's profile, `/oauth/*` runs the flow.

use std::sync::Arc;

use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{middleware, Extension, Json, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use nexaas_id::support::axum::{error_response, oauth_router, require_authorization, AdapterState};
use nexaas_id::{OAuthClient, ResourceClient};

pub const MOUNT: &str = "/oauth";

pub async fn run(oauth: OAuthClient, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AdapterState::new(oauth, MOUNT);
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("nexaas-id demo listening on {addr}");
    axum::serve(listener, build_router(state)).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

pub fn build_router(state: Arc<AdapterState>) -> Router {
    Router::new()
        .route("/", get(profile))
        .route("/widgets", get(widgets))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), require_authorization))
        .nest(MOUNT, oauth_router(state))
        .layer(TraceLayer::new_for_http())
}

async fn profile(Extension(client): Extension<Arc<ResourceClient>>) -> Response {
    match client.personal_info().await {
        Ok(record) => Json((*record).clone()).into_response(),
        // Revoked or expired upstream: start over.
        Err(e) if e.is_auth_failure() => Redirect::to(&format!("{MOUNT}/signout")).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn widgets(Extension(client): Extension<Arc<ResourceClient>>) -> Response {
    Json(serde_json::json!({
        "navbar": client.navbar_url(),
        "user": client.user_widget_url(),
    }))
    .into_response()
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[cfg(test)]
#[path = "serve_tests.rs"]
mod tests;
