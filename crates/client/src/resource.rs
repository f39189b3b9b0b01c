// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authenticated access to the provider's profile resources.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::http::{self, Server};
use crate::oauth::OAuthClient;
use crate::record::Record;
use crate::token::TokenLike;

/// How the access token is attached to resource requests.
///
/// A client uses exactly one transport for every call. `QueryParam` exists
/// for provider deployments that predate bearer authentication; it exposes
/// the token in request URLs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AuthTransport {
    /// `Authorization: Bearer <token>`.
    #[default]
    Bearer,
    /// `?access_token=<token>`.
    QueryParam,
}

/// Cached profile resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Resource {
    PersonalInfo,
    ProfessionalInfo,
    Emails,
    Contacts,
}

impl Resource {
    pub const ALL: [Resource; 4] =
        [Self::PersonalInfo, Self::ProfessionalInfo, Self::Emails, Self::Contacts];

    pub fn path(&self) -> &'static str {
        match self {
            Self::PersonalInfo => "/api/v1/profile",
            Self::ProfessionalInfo => "/api/v1/profile/professional_info",
            Self::Emails => "/api/v1/profile/emails",
            Self::Contacts => "/api/v1/profile/contacts",
        }
    }

    fn slot(&self) -> usize {
        *self as usize
    }
}

/// Result of [`ResourceClient::invite`].
#[derive(Debug, Clone, PartialEq)]
pub struct Invitation {
    /// The inviting user.
    pub requester: Uuid,
    pub email: String,
    pub id: Uuid,
    /// Every field the provider returned.
    pub record: Record,
}

impl TryFrom<Record> for Invitation {
    type Error = Error;

    fn try_from(record: Record) -> Result<Self> {
        let field = |name: &str| Error::invalid_response(format!("invitation without {name}"));
        Ok(Self {
            requester: record.uuid("requester").ok_or_else(|| field("requester"))?,
            email: record.str("email").ok_or_else(|| field("email"))?.to_owned(),
            id: record.uuid("id").ok_or_else(|| field("id"))?,
            record,
        })
    }
}

/// Client for the provider's resource API, bound to one access token.
///
/// Each profile resource is fetched at most once per client and then served
/// from cache until [`ResourceClient::reset`].
#[derive(Debug)]
pub struct ResourceClient {
    access_token: String,
    id: Option<String>,
    secret: Option<String>,
    server: Server,
    transport: AuthTransport,
    http: reqwest::Client,
    cache: [Mutex<Option<Arc<Record>>>; 4],
}

impl ResourceClient {
    pub fn new(access_token: impl Into<String>, server: Option<&str>) -> Result<Self> {
        Ok(Self::build(access_token.into(), None, None, Server::parse(server)?, http::default_client()))
    }

    /// Reuse the server, credentials and HTTP client of an OAuth client.
    pub fn from_oauth(access_token: impl Into<String>, client: &OAuthClient) -> Self {
        Self::build(
            access_token.into(),
            Some(client.id().to_owned()),
            Some(client.secret().to_owned()),
            client.server().clone(),
            client.http_client().clone(),
        )
    }

    /// [`ResourceClient::from_oauth`] with the access token of a token-like value.
    pub fn from_token(token: &impl TokenLike, client: &OAuthClient) -> Self {
        Self::from_oauth(token.access_token(), client)
    }

    fn build(
        access_token: String,
        id: Option<String>,
        secret: Option<String>,
        server: Server,
        http: reqwest::Client,
    ) -> Self {
        Self {
            access_token,
            id,
            secret,
            server,
            transport: AuthTransport::default(),
            http,
            cache: Default::default(),
        }
    }

    pub fn with_credentials(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self.secret = Some(secret.into());
        self
    }

    pub fn with_transport(mut self, transport: AuthTransport) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }

    pub fn server(&self) -> &Server {
        &self.server
    }

    pub fn transport(&self) -> AuthTransport {
        self.transport
    }

    /// Navbar widget script, authenticated by query parameter.
    pub fn navbar_url(&self) -> String {
        self.widget_url("/api/v1/widgets/navbar.js")
    }

    /// User widget script, authenticated by query parameter.
    pub fn user_widget_url(&self) -> String {
        self.widget_url("/api/v1/widgets/user.js")
    }

    fn widget_url(&self, path: &str) -> String {
        let mut url = self.server.endpoint(path);
        url.query_pairs_mut().append_pair("access_token", &self.access_token);
        url.into()
    }

    pub async fn personal_info(&self) -> Result<Arc<Record>> {
        self.cached(Resource::PersonalInfo).await
    }

    pub async fn professional_info(&self) -> Result<Arc<Record>> {
        self.cached(Resource::ProfessionalInfo).await
    }

    pub async fn emails(&self) -> Result<Arc<Record>> {
        self.cached(Resource::Emails).await
    }

    pub async fn contacts(&self) -> Result<Arc<Record>> {
        self.cached(Resource::Contacts).await
    }

    /// Fetch `resource`, or return the copy cached by an earlier call.
    ///
    /// The slot's lock is held across the request, so concurrent first calls
    /// for the same resource issue one request.
    pub async fn cached(&self, resource: Resource) -> Result<Arc<Record>> {
        let mut slot = self.cache[resource.slot()].lock().await;
        if let Some(record) = slot.as_ref() {
            return Ok(Arc::clone(record));
        }
        let record = Arc::new(self.get(resource.path()).await?);
        *slot = Some(Arc::clone(&record));
        Ok(record)
    }

    /// Drop every cached resource.
    pub fn reset(&mut self) {
        for slot in &mut self.cache {
            *slot.get_mut() = None;
        }
    }

    /// Invite `email` to sign up. Never cached.
    pub async fn invite(&self, email: &str) -> Result<Invitation> {
        let body = serde_json::json!({ "invited": email });
        let req = self.http.post(self.resource_url("/api/v1/sign_up")).json(&body);
        let record = self.send(req, "/api/v1/sign_up").await?;
        Invitation::try_from(record)
    }

    /// Uncached authenticated GET of any resource path.
    pub async fn get(&self, path: &str) -> Result<Record> {
        let req = self.http.get(self.resource_url(path));
        self.send(req, path).await
    }

    /// `path` on the server, carrying the token when the transport is
    /// [`AuthTransport::QueryParam`].
    pub fn resource_url(&self, path: &str) -> Url {
        let mut url = self.server.endpoint(path);
        if self.transport == AuthTransport::QueryParam {
            url.query_pairs_mut().append_pair("access_token", &self.access_token);
        }
        url
    }

    async fn send(&self, req: reqwest::RequestBuilder, path: &str) -> Result<Record> {
        let req = match self.transport {
            AuthTransport::Bearer => req.bearer_auth(&self.access_token),
            AuthTransport::QueryParam => req,
        };
        let resp = req.send().await?;
        debug!(path, status = resp.status().as_u16(), "resource response");
        let body = http::success_body(resp).await?;
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(&body)
            .map_err(|e| Error::invalid_response_with(format!("{path}: expected a JSON object"), e))?;
        Ok(Record::from(map))
    }
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
