// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flat string encoding of a token, for opaque session storage.
//!
//! The encoding is `application/x-www-form-urlencoded` with exactly four keys,
//! each present even when empty:
//!
//! ```text
//! access_token=tk1&refresh_token=&expires_at=2100-10-10+10%3A10%3A00&scope=profile
//! ```
//!
//! Consumers must treat the pairs as unordered.

use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::token::{ExpiresAt, Token, TokenLike, EXPIRES_AT_FORMAT};

const ACCESS_TOKEN: &str = "access_token";
const REFRESH_TOKEN: &str = "refresh_token";
const EXPIRES_AT: &str = "expires_at";
const SCOPE: &str = "scope";

/// Serializer for session-stored tokens.
pub struct TokenCodec;

impl TokenCodec {
    /// Encode any token-like value. `expires_at` is written in whole seconds.
    ///
    /// A [`Token`] always round-trips; a foreign value with an empty access
    /// token encodes, but [`TokenCodec::deserialize`] rejects the result.
    pub fn serialize<T: TokenLike + ?Sized>(token: &T) -> String {
        let expires_at = token
            .expires_at()
            .map(|at| at.format(EXPIRES_AT_FORMAT).to_string())
            .unwrap_or_default();
        let pairs = [
            (ACCESS_TOKEN, token.access_token()),
            (REFRESH_TOKEN, token.refresh_token().unwrap_or_default()),
            (EXPIRES_AT, expires_at.as_str()),
            (SCOPE, token.scope().unwrap_or_default()),
        ];
        form_encode(&pairs)
    }

    /// Decode a string produced by [`TokenCodec::serialize`].
    ///
    /// Unknown keys are ignored and empty values are treated as absent.
    pub fn deserialize(encoded: &str) -> Result<Token> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(encoded)
            .map_err(|e| Error::decode_with("malformed token encoding", e))?;

        let mut access_token = None;
        let mut refresh_token = None;
        let mut expires_at = None;
        let mut scope = None;
        for (key, value) in pairs {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                ACCESS_TOKEN => access_token = Some(value),
                REFRESH_TOKEN => refresh_token = Some(value),
                EXPIRES_AT => expires_at = Some(value),
                SCOPE => scope = Some(value),
                _ => {}
            }
        }

        let access_token = access_token.ok_or_else(|| Error::decode("no access token stored"))?;
        let expires_at = match expires_at {
            Some(text) => {
                let naive = NaiveDateTime::parse_from_str(&text, EXPIRES_AT_FORMAT)
                    .map_err(|e| Error::decode_with(format!("bad expires_at {text:?}"), e))?;
                Some(ExpiresAt::At(naive.and_utc()))
            }
            None => None,
        };

        Token::create(access_token, refresh_token, expires_at, None, scope, chrono::Utc::now())
    }
}

fn form_encode(pairs: &[(&str, &str)]) -> String {
    // Serializing a slice of string pairs cannot fail.
    serde_urlencoded::to_string(pairs).unwrap_or_default()
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
