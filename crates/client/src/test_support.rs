// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mock identity provider for network tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// One request observed by the mock provider.
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

impl Hit {
    /// Decode a form-encoded request body.
    pub fn form(&self) -> HashMap<String, String> {
        serde_urlencoded::from_str(&self.body).unwrap_or_default()
    }
}

struct ProviderState {
    routes: HashMap<String, (u16, String)>,
    hits: Mutex<Vec<Hit>>,
}

/// A provider answering fixed `(status, body)` pairs by request path.
pub struct MockProvider {
    pub addr: SocketAddr,
    state: Arc<ProviderState>,
}

impl MockProvider {
    pub async fn spawn(routes: &[(&str, u16, &str)]) -> anyhow::Result<Self> {
        let state = Arc::new(ProviderState {
            routes: routes
                .iter()
                .map(|(path, status, body)| ((*path).to_owned(), (*status, (*body).to_owned())))
                .collect(),
            hits: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(respond).with_state(Arc::clone(&state));
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        Ok(Self { addr, state })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub async fn hits(&self, path: &str) -> Vec<Hit> {
        self.state.hits.lock().await.iter().filter(|h| h.path == path).cloned().collect()
    }

    pub async fn count(&self, path: &str) -> usize {
        self.hits(path).await.len()
    }
}

async fn respond(
    State(state): State<Arc<ProviderState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let path = uri.path().to_owned();
    state.hits.lock().await.push(Hit {
        method,
        path: path.clone(),
        query: uri.query().map(str::to_owned),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        body,
    });

    let (status, body) =
        state.routes.get(&path).cloned().unwrap_or((404, r#"{"error":"not_found"}"#.to_owned()));
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
}
