// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth token value type and the structural "token-like" contract.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::oauth::TokenResponse;

/// Scope assigned when the provider (or caller) does not name one.
pub const DEFAULT_SCOPE: &str = "profile";

/// Fields every token-like value must expose.
pub const TOKEN_FIELDS: [&str; 3] = ["access_token", "refresh_token", "expires_at"];

/// Format used for `expires_at` in text form (UTC, no zone suffix).
pub const EXPIRES_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accessors shared by [`Token`] and caller-defined token types.
pub trait TokenLike {
    fn access_token(&self) -> &str;
    fn refresh_token(&self) -> Option<&str>;
    fn expires_at(&self) -> Option<DateTime<Utc>>;

    fn scope(&self) -> Option<&str> {
        None
    }
}

/// An issued OAuth token. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    scope: String,
}

/// Absolute expiry as supplied by a provider or caller, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpiresAt {
    At(DateTime<Utc>),
    /// Epoch seconds. Negative means "not supplied".
    Epoch(i64),
    /// Epoch seconds as digits, `YYYY-MM-DD HH:MM:SS` (UTC), or RFC 3339.
    Text(String),
}

impl ExpiresAt {
    /// Interpret a JSON `expires_at` field. `null` means absent.
    pub fn from_json(value: &serde_json::Value) -> Result<Option<Self>> {
        match value {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(secs) => Ok(Some(Self::Epoch(secs))),
                None => Err(Error::InvalidArgument(format!("expires_at out of range: {n}"))),
            },
            serde_json::Value::String(s) => Ok(Some(Self::Text(s.clone()))),
            other => Err(Error::InvalidArgument(format!("expires_at is not a timestamp: {other}"))),
        }
    }

    fn resolve(&self) -> Result<Option<DateTime<Utc>>> {
        match self {
            Self::At(at) => Ok(Some(*at)),
            Self::Epoch(secs) => epoch(*secs),
            Self::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(None);
                }
                if let Ok(secs) = text.parse::<i64>() {
                    return epoch(secs);
                }
                if let Ok(naive) = NaiveDateTime::parse_from_str(text, EXPIRES_AT_FORMAT) {
                    return Ok(Some(naive.and_utc()));
                }
                DateTime::parse_from_rfc3339(text)
                    .map(|at| Some(at.with_timezone(&Utc)))
                    .map_err(|e| Error::InvalidArgument(format!("expires_at {text:?}: {e}")))
            }
        }
    }
}

fn non_empty_access_token(access_token: String) -> Result<String> {
    if access_token.is_empty() {
        return Err(Error::InvalidArgument("access_token is empty".to_owned()));
    }
    Ok(access_token)
}

fn epoch(secs: i64) -> Result<Option<DateTime<Utc>>> {
    if secs < 0 {
        return Ok(None);
    }
    DateTime::from_timestamp(secs, 0)
        .map(Some)
        .ok_or_else(|| Error::InvalidArgument(format!("expires_at out of range: {secs}")))
}

impl Token {
    /// A token with no refresh token, no expiry and the default scope.
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            access_token: non_empty_access_token(access_token.into())?,
            refresh_token: None,
            expires_at: None,
            scope: DEFAULT_SCOPE.to_owned(),
        })
    }

    /// Build a token, deriving `expires_at` once.
    ///
    /// An absolute `expires_at` wins over `expires_in`; `expires_in` (seconds,
    /// negative meaning absent) is measured from `now`. With neither, the token
    /// never expires. An empty `access_token` is rejected.
    pub fn create(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_at: Option<ExpiresAt>,
        expires_in: Option<i64>,
        scope: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let access_token = non_empty_access_token(access_token.into())?;
        let absolute = match expires_at {
            Some(ref at) => at.resolve()?,
            None => None,
        };
        let expires_at = match (absolute, expires_in) {
            (Some(at), _) => Some(at),
            (None, Some(secs)) if secs >= 0 => {
                let delta = TimeDelta::try_seconds(secs)
                    .ok_or_else(|| Error::InvalidArgument(format!("expires_in too large: {secs}")))?;
                Some(now.checked_add_signed(delta).ok_or_else(|| {
                    Error::InvalidArgument(format!("expires_in too large: {secs}"))
                })?)
            }
            _ => None,
        };

        Ok(Self {
            access_token,
            refresh_token: refresh_token.filter(|t| !t.is_empty()),
            expires_at,
            scope: scope.filter(|s| !s.is_empty()).unwrap_or_else(|| DEFAULT_SCOPE.to_owned()),
        })
    }

    /// Build a token from a decoded token-endpoint response.
    ///
    /// `created_at`, when the provider sends it, replaces `now` as the base for
    /// `expires_in`.
    pub fn from_response(resp: TokenResponse, now: DateTime<Utc>) -> Result<Self> {
        let base = match resp.created_at {
            Some(secs) => epoch(secs)?.unwrap_or(now),
            None => now,
        };
        let expires_at = match resp.expires_at {
            Some(ref value) => ExpiresAt::from_json(value)?,
            None => None,
        };
        Self::create(
            resp.access_token,
            resp.refresh_token,
            expires_at,
            resp.expires_in,
            resp.scope,
            base,
        )
    }

    /// Build a token from any serializable record exposing the token fields.
    pub fn from_shape<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| Error::InvalidArgument(format!("unserializable token: {e}")))?;
        if !has_token_fields(&value) {
            return Err(Error::InvalidArgument(format!(
                "value does not expose {}",
                TOKEN_FIELDS.join(", ")
            )));
        }

        let text = |key: &str| -> Result<Option<String>> {
            match &value[key] {
                serde_json::Value::Null => Ok(None),
                serde_json::Value::String(s) => Ok(Some(s.clone())),
                other => Err(Error::InvalidArgument(format!("{key} is not a string: {other}"))),
            }
        };
        let access_token =
            text("access_token")?.ok_or_else(|| Error::InvalidArgument("access_token is null".to_owned()))?;
        let scope = match value.get("scope") {
            Some(_) => text("scope")?,
            None => None,
        };

        Self::create(
            access_token,
            text("refresh_token")?,
            ExpiresAt::from_json(&value["expires_at"])?,
            None,
            scope,
            Utc::now(),
        )
    }

    /// Copy any token-like value into a `Token`.
    pub fn from_token_like(token: &impl TokenLike) -> Result<Self> {
        Ok(Self {
            access_token: non_empty_access_token(token.access_token().to_owned())?,
            refresh_token: token.refresh_token().filter(|t| !t.is_empty()).map(str::to_owned),
            expires_at: token.expires_at(),
            scope: token.scope().filter(|s| !s.is_empty()).unwrap_or(DEFAULT_SCOPE).to_owned(),
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// True iff an expiry is set and lies strictly before `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }

    /// [`Token::is_expired`] against the system clock.
    pub fn expired(&self) -> bool {
        self.is_expired(Utc::now())
    }
}

impl TokenLike for Token {
    fn access_token(&self) -> &str {
        &self.access_token
    }

    fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    fn scope(&self) -> Option<&str> {
        Some(&self.scope)
    }
}

/// Runtime check that `value` exposes `access_token`, `refresh_token` and
/// `expires_at`, whatever its type.
///
/// Fields may be null; they only have to be present in the value's serialized
/// form.
pub fn satisfies_token_shape<T: Serialize + ?Sized>(value: &T) -> bool {
    serde_json::to_value(value).map(|v| has_token_fields(&v)).unwrap_or(false)
}

fn has_token_fields(value: &serde_json::Value) -> bool {
    match value.as_object() {
        Some(map) => TOKEN_FIELDS.iter().all(|field| map.contains_key(*field)),
        None => false,
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
