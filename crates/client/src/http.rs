// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider base URL resolution and shared HTTP plumbing.

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Provider used when none is configured.
pub const DEFAULT_SERVER: &str = "http://localhost:3000/";

/// Resolved provider base URL.
///
/// Keeps the string as configured (with `https://` prepended when the scheme
/// was missing) alongside the parsed form used to build endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    raw: String,
    url: Url,
}

impl Server {
    pub fn parse(server: Option<&str>) -> Result<Self> {
        let raw = match server.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) if has_scheme(s) => s.to_owned(),
            Some(s) => format!("https://{s}"),
            None => DEFAULT_SERVER.to_owned(),
        };
        let url = Url::parse(&raw)
            .map_err(|e| Error::InvalidArgument(format!("invalid server {raw:?}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(Error::InvalidArgument(format!("server {raw:?} is not a base URL")));
        }
        Ok(Self { raw, url })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The server URL with its path replaced by `path` and no query.
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.url.clone();
        url.set_path(path);
        url.set_query(None);
        url.set_fragment(None);
        url
    }
}

/// `^[a-z]+://`
fn has_scheme(s: &str) -> bool {
    s.split_once("://").is_some_and(|(scheme, _)| {
        !scheme.is_empty() && scheme.bytes().all(|b| b.is_ascii_lowercase())
    })
}

/// Build the default HTTP client.
///
/// Callers supply their own client to control timeouts, proxies or
/// cancellation.
pub fn default_client() -> reqwest::Client {
    let _ = rustls::crypto::ring::default_provider().install_default();
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_default()
}

/// Return the body of a 2xx response, or [`Error::Http`] with status and body.
pub(crate) async fn success_body(resp: reqwest::Response) -> Result<bytes::Bytes> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), "provider request failed");
        return Err(Error::Http { status: status.as_u16(), body });
    }
    Ok(resp.bytes().await?)
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
