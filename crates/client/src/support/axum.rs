// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! axum adapter: in-memory cookie sessions, the sign-in/callback/sign-out
//! routes, and a middleware guard.
//!
//! ```ignore
//! let state = AdapterState::new(oauth, "/oauth");
//! let app = Router::new()
//!     .route("/", get(index))
//!     .layer(middleware::from_fn_with_state(state.clone(), require_authorization))
//!     .nest("/oauth", oauth_router(state));
//! ```
//!
//! Guarded handlers receive the client as `Extension<Arc<ResourceClient>>`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ::axum::extract::{Query, Request, State};
use ::axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use ::axum::middleware::Next;
use ::axum::response::{IntoResponse, Redirect as AxumRedirect, Response};
use ::axum::routing::get;
use ::axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::Redirect;
use crate::error::Error;
use crate::oauth::OAuthClient;

/// Cookie carrying the session identifier.
pub const SESSION_COOKIE: &str = "nexaas_id_session";

type SessionData = HashMap<String, String>;

/// Sessions idle for longer than this are dropped.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Most sessions held at once before the least recently used is evicted.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

#[derive(Debug)]
struct Entry {
    data: SessionData,
    last_seen: Instant,
}

/// Process-local session storage keyed by cookie value.
///
/// Bounded by an idle TTL and an entry cap, so anonymous traffic that mints
/// cookies cannot grow it without limit.
#[derive(Debug)]
pub struct MemorySessions {
    inner: RwLock<HashMap<String, Entry>>,
    ttl: Duration,
    max_sessions: usize,
}

impl Default for MemorySessions {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_TTL)
    }
}

impl MemorySessions {
    /// `max_sessions` is raised to 1 if zero.
    pub fn with_limits(max_sessions: usize, ttl: Duration) -> Self {
        Self { inner: RwLock::new(HashMap::new()), ttl, max_sessions: max_sessions.max(1) }
    }

    /// Session data for `id`, refreshing its idle timer. Expired or unknown
    /// ids yield an empty session.
    pub async fn load(&self, id: &str) -> SessionData {
        let mut inner = self.inner.write().await;
        let now = Instant::now();
        let live = inner.get(id).is_some_and(|entry| now.duration_since(entry.last_seen) <= self.ttl);
        if !live {
            inner.remove(id);
            return SessionData::new();
        }
        match inner.get_mut(id) {
            Some(entry) => {
                entry.last_seen = now;
                entry.data.clone()
            }
            None => SessionData::new(),
        }
    }

    /// Save `data` under `id`; an empty session is removed. Sweeps expired
    /// entries and evicts the least recently used past the cap.
    pub async fn store(&self, id: &str, data: SessionData) {
        let mut inner = self.inner.write().await;
        let now = Instant::now();
        if data.is_empty() {
            inner.remove(id);
        } else {
            inner.insert(id.to_owned(), Entry { data, last_seen: now });
        }

        inner.retain(|_, entry| now.duration_since(entry.last_seen) <= self.ttl);
        while inner.len() > self.max_sessions {
            let oldest = inner
                .iter()
                .filter(|(key, _)| key.as_str() != id)
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(key, _)| key.clone());
            let Some(oldest) = oldest else { break };
            debug!("evicting least recently used session");
            inner.remove(&oldest);
        }
    }

    /// Live (unexpired) sessions.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.inner
            .read()
            .await
            .values()
            .filter(|entry| now.duration_since(entry.last_seen) <= self.ttl)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Shared state for the adapter routes and guard.
#[derive(Debug)]
pub struct AdapterState {
    pub oauth: OAuthClient,
    pub sessions: MemorySessions,
    /// Path the OAuth routes are nested under, e.g. `/oauth`.
    pub mount: String,
}

impl AdapterState {
    pub fn new(oauth: OAuthClient, mount: impl Into<String>) -> Arc<Self> {
        Self::with_sessions(oauth, mount, MemorySessions::default())
    }

    /// [`AdapterState::new`] with a caller-configured session store.
    pub fn with_sessions(
        oauth: OAuthClient,
        mount: impl Into<String>,
        sessions: MemorySessions,
    ) -> Arc<Self> {
        Arc::new(Self { oauth, sessions, mount: mount.into().trim_end_matches('/').to_owned() })
    }

    pub fn sign_in_path(&self) -> String {
        format!("{}/signin", self.mount)
    }
}

/// Error envelope returned when the provider exchange fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// JSON error envelope with the status mapped from the error kind.
pub fn error_response(err: &Error) -> Response {
    let kind = err.kind();
    let status = StatusCode::from_u16(kind.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorResponse {
        error: ErrorBody { code: kind.as_str().to_owned(), message: err.to_string() },
    };
    (status, Json(body)).into_response()
}

/// `/signin`, `/callback` and `/signout`, to be nested under `state.mount`.
pub fn oauth_router(state: Arc<AdapterState>) -> Router {
    Router::new()
        .route("/signin", get(sign_in))
        .route("/callback", get(callback))
        .route("/signout", get(sign_out))
        .with_state(state)
}

/// Middleware: redirect to sign-in, or attach `Arc<ResourceClient>` to the
/// request extensions.
pub async fn require_authorization(
    State(state): State<Arc<AdapterState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(id) = session_id(req.headers()) else {
        return AxumRedirect::to(&state.sign_in_path()).into_response();
    };

    let mut session = state.sessions.load(&id).await;
    let authorized = super::authorize(&mut session, &state.oauth);
    match authorized {
        Ok(ctx) => {
            req.extensions_mut().insert(Arc::new(ctx.client));
            next.run(req).await
        }
        Err(_) => {
            // authorize() may have dropped an undecodable token.
            state.sessions.store(&id, session).await;
            AxumRedirect::to(&state.sign_in_path()).into_response()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SignInQuery {
    next_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
}

async fn sign_in(
    State(state): State<Arc<AdapterState>>,
    Query(query): Query<SignInQuery>,
    headers: HeaderMap,
) -> Response {
    let (id, fresh) = match session_id(&headers) {
        Some(id) => (id, false),
        None => (uuid::Uuid::new_v4().to_string(), true),
    };
    let mut session = state.sessions.load(&id).await;
    let redirect = super::sign_in(&mut session, &state.oauth, query.next_url.as_deref(), referer(&headers));
    state.sessions.store(&id, session).await;

    let mut resp = redirect_response(&redirect);
    if fresh {
        set_session_cookie(&mut resp, &id);
    }
    resp
}

async fn callback(
    State(state): State<Arc<AdapterState>>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> Response {
    let (id, fresh) = match session_id(&headers) {
        Some(id) => (id, false),
        None => (uuid::Uuid::new_v4().to_string(), true),
    };
    let mut session = state.sessions.load(&id).await;
    match super::callback(&mut session, &state.oauth, query.code.as_deref()).await {
        Ok(redirect) => {
            state.sessions.store(&id, session).await;
            let mut resp = redirect_response(&redirect);
            if fresh {
                set_session_cookie(&mut resp, &id);
            }
            resp
        }
        Err(e) => {
            debug!(err = %e, "code exchange failed");
            error_response(&e)
        }
    }
}

async fn sign_out(
    State(state): State<Arc<AdapterState>>,
    Query(query): Query<SignInQuery>,
    headers: HeaderMap,
) -> Response {
    let Some(id) = session_id(&headers) else {
        let mut empty = SessionData::new();
        return redirect_response(&super::sign_out(&mut empty, query.next_url.as_deref(), referer(&headers)));
    };
    let mut session = state.sessions.load(&id).await;
    let redirect = super::sign_out(&mut session, query.next_url.as_deref(), referer(&headers));
    state.sessions.store(&id, session).await;
    redirect_response(&redirect)
}

fn redirect_response(redirect: &Redirect) -> Response {
    AxumRedirect::to(redirect.location()).into_response()
}

fn referer(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::REFERER).and_then(|v| v.to_str().ok())
}

/// Session id from the `Cookie` header, if present.
fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_owned())
}

fn set_session_cookie(resp: &mut Response, id: &str) {
    let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        resp.headers_mut().append(header::SET_COOKIE, value);
    }
}

#[cfg(test)]
#[path = "axum_tests.rs"]
mod tests;
