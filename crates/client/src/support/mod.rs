// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Web-framework adapter contract: session-backed sign-in, callback,
//! sign-out and a guard that hands an authenticated [`ResourceClient`] to
//! request handlers.
//!
//! The functions here know nothing about any framework; [`axum`] wires them
//! into routes and middleware.

pub mod axum;

use std::collections::HashMap;

use tracing::warn;

use crate::codec::TokenCodec;
use crate::error::{Error, Result};
use crate::oauth::OAuthClient;
use crate::resource::ResourceClient;
use crate::token::Token;

/// Session key holding the serialized token.
pub const TOKEN_KEY: &str = "oauth_token";

/// Session key holding the URL to return to after sign-in.
pub const NEXT_URL_KEY: &str = "oauth_next_url";

/// Opaque string mapping provided by the hosting framework.
pub trait Session {
    fn get(&self, key: &str) -> Option<String>;
    fn insert(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str) -> Option<String>;
}

impl Session for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }

    fn insert(&mut self, key: &str, value: String) {
        HashMap::insert(self, key.to_owned(), value);
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        HashMap::remove(self, key)
    }
}

/// Where the adapter should send the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect(pub String);

impl Redirect {
    pub fn location(&self) -> &str {
        &self.0
    }
}

/// Context handed to guarded handlers.
#[derive(Debug)]
pub struct Authorized {
    pub token: Token,
    pub client: ResourceClient,
}

/// Load the session token and build a client for it.
///
/// Fails with [`Error::NotAuthenticated`] when the session holds no token or
/// one that no longer decodes; an undecodable token is removed.
pub fn authorize<S: Session + ?Sized>(session: &mut S, oauth: &OAuthClient) -> Result<Authorized> {
    let encoded = session.get(TOKEN_KEY).ok_or(Error::NotAuthenticated)?;
    let token = match TokenCodec::deserialize(&encoded) {
        Ok(token) => token,
        Err(e) => {
            warn!(err = %e, "discarding undecodable session token");
            session.remove(TOKEN_KEY);
            return Err(Error::NotAuthenticated);
        }
    };
    let client = ResourceClient::from_token(&token, oauth);
    Ok(Authorized { token, client })
}

/// Wrap `handler` so it only runs for sessions holding a token.
///
/// Unauthenticated sessions get `Err(Redirect(sign_in_url))` instead.
pub fn require_authorization<'a, S, F, R>(
    oauth: &'a OAuthClient,
    sign_in_url: &'a str,
    handler: F,
) -> impl Fn(&mut S) -> std::result::Result<R, Redirect> + 'a
where
    S: Session + ?Sized,
    F: Fn(Authorized) -> R + 'a,
{
    move |session: &mut S| match authorize(session, oauth) {
        Ok(ctx) => Ok(handler(ctx)),
        Err(_) => Err(Redirect(sign_in_url.to_owned())),
    }
}

/// Remember where to return and send the browser to the provider.
///
/// `next_url` (query parameter) wins over `referer`.
pub fn sign_in<S: Session + ?Sized>(
    session: &mut S,
    oauth: &OAuthClient,
    next_url: Option<&str>,
    referer: Option<&str>,
) -> Redirect {
    if let Some(next) = first_non_empty([next_url, referer]) {
        session.insert(NEXT_URL_KEY, next.to_owned());
    }
    Redirect(oauth.authorize_url())
}

/// Exchange the provider's `code`, store the token, return to the saved URL.
pub async fn callback<S: Session + ?Sized>(
    session: &mut S,
    oauth: &OAuthClient,
    code: Option<&str>,
) -> Result<Redirect> {
    let token = oauth.exchange_token(code).await?;
    session.insert(TOKEN_KEY, TokenCodec::serialize(&token));
    let next = session.remove(NEXT_URL_KEY).filter(|n| !n.is_empty());
    Ok(Redirect(next.unwrap_or_else(|| "/".to_owned())))
}

/// Forget the token and redirect to `next_url`, the saved URL, the referer,
/// or `/`, in that order.
pub fn sign_out<S: Session + ?Sized>(
    session: &mut S,
    next_url: Option<&str>,
    referer: Option<&str>,
) -> Redirect {
    session.remove(TOKEN_KEY);
    let stored = session.remove(NEXT_URL_KEY);
    let next = first_non_empty([next_url, stored.as_deref(), referer]).unwrap_or("/");
    Redirect(next.to_owned())
}

fn first_non_empty<'a, const N: usize>(candidates: [Option<&'a str>; N]) -> Option<&'a str> {
    candidates.into_iter().flatten().find(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
