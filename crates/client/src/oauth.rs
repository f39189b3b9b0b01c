// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth2 endpoints of the identity provider: authorize redirect and token grants.

use chrono::Utc;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::http::{self, Server};
use crate::token::{Token, DEFAULT_SCOPE};

const NO_ACCESS_TOKEN: &str = "no access token supplied";

/// Client registration and provider location.
#[derive(Debug, Clone, clap::Args)]
pub struct OAuthConfig {
    /// OAuth client identifier.
    #[arg(long, env = "NEXAAS_ID_CLIENT_ID")]
    pub client_id: String,

    /// OAuth client secret.
    #[arg(long, env = "NEXAAS_ID_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// Absolute URL the provider redirects back to after authorization.
    #[arg(long, env = "NEXAAS_ID_REDIRECT_URI")]
    pub redirect_uri: String,

    /// Requested scope. Defaults to `profile`.
    #[arg(long, env = "NEXAAS_ID_SCOPE")]
    pub scope: Option<String>,

    /// Provider base URL; `https://` is assumed when no scheme is given.
    #[arg(long = "host", env = "NEXAAS_ID_HOST")]
    pub server: Option<String>,
}

impl OAuthConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scope: None,
            server: None,
        }
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }
}

/// Standard OAuth2 token response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_in: Option<i64>,
    /// Epoch seconds or a timestamp string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<serde_json::Value>,
    /// Epoch seconds at which the provider issued the token.
    #[serde(
        default,
        deserialize_with = "lenient_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

/// Whole seconds sent as an integer, an integral float (`7200.0`) or a
/// decimal string (`"7200"`).
fn lenient_seconds<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && f.fract() == 0.0).map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected whole seconds, got {n}"))),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected whole seconds, got {s:?}"))),
        Some(other) => Err(D::Error::custom(format!("expected whole seconds, got {other}"))),
    }
}

/// Grant kinds supported by [`OAuthClient::exchange_token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantType {
    AuthorizationCode,
    ClientCredentials,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::ClientCredentials => "client_credentials",
        }
    }
}

/// OAuth client for one registered application. Immutable once built.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    id: String,
    secret: String,
    scope: String,
    redirect_uri: String,
    server: Server,
    http: reqwest::Client,
}

impl OAuthClient {
    pub fn new(config: OAuthConfig) -> Result<Self> {
        let server = Server::parse(config.server.as_deref())?;
        url::Url::parse(&config.redirect_uri).map_err(|e| {
            Error::InvalidArgument(format!("redirect_uri {:?}: {e}", config.redirect_uri))
        })?;
        Ok(Self {
            id: config.client_id,
            secret: config.client_secret,
            scope: config.scope.filter(|s| !s.is_empty()).unwrap_or_else(|| DEFAULT_SCOPE.to_owned()),
            redirect_uri: config.redirect_uri,
            server,
            http: http::default_client(),
        })
    }

    /// Replace the HTTP client, e.g. to set a different timeout.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn server(&self) -> &Server {
        &self.server
    }

    pub(crate) fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    /// Browser redirect target that starts the authorization-code flow.
    pub fn authorize_url(&self) -> String {
        let mut url = self.server.endpoint("/oauth/authorize");
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &self.scope);
        url.into()
    }

    pub fn token_url(&self) -> String {
        self.server.endpoint("/oauth/token").into()
    }

    /// Exchange a grant for a token.
    ///
    /// With a `code` this is the authorization-code grant; without one (or
    /// with an empty one) it is the client-credentials grant.
    pub async fn exchange_token(&self, code: Option<&str>) -> Result<Token> {
        let code = code.filter(|c| !c.is_empty());
        let grant = match code {
            Some(_) => GrantType::AuthorizationCode,
            None => GrantType::ClientCredentials,
        };

        let mut form = vec![
            ("client_id", self.id.as_str()),
            ("client_secret", self.secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", grant.as_str()),
        ];
        if let Some(code) = code {
            form.push(("code", code));
        }

        debug!(grant = grant.as_str(), "requesting token");
        let resp = self.http.post(self.token_url()).form(&form).send().await?;
        let body = http::success_body(resp).await?;

        let value: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|e| Error::invalid_response_with(NO_ACCESS_TOKEN, e))?;
        let has_access_token = value
            .get("access_token")
            .and_then(serde_json::Value::as_str)
            .is_some_and(|t| !t.is_empty());
        let token = match (has_access_token, serde_json::from_value::<TokenResponse>(value)) {
            (true, Ok(token)) => token,
            (true, Err(e)) => return Err(Error::invalid_response_with("malformed token response", e)),
            (false, Err(e)) => return Err(Error::invalid_response_with(NO_ACCESS_TOKEN, e)),
            (false, Ok(_)) => return Err(Error::invalid_response(NO_ACCESS_TOKEN)),
        };
        Token::from_response(token, Utc::now())
    }
}

#[cfg(test)]
#[path = "oauth_tests.rs"]
mod tests;
