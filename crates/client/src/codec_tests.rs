// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

use super::*;
use crate::error::ErrorKind;

/// Caller-defined token without a scope accessor.
struct PlainToken {
    access: &'static str,
    refresh: Option<&'static str>,
    expires: Option<DateTime<Utc>>,
}

impl TokenLike for PlainToken {
    fn access_token(&self) -> &str {
        self.access
    }

    fn refresh_token(&self) -> Option<&str> {
        self.refresh
    }

    fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires
    }
}

fn pairs(encoded: &str) -> HashSet<String> {
    encoded.split('&').map(str::to_owned).collect()
}

fn set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

#[test]
fn serialize_empty_fields() -> anyhow::Result<()> {
    let token = Token::new("tk1")?;
    assert_eq!(
        pairs(&TokenCodec::serialize(&token)),
        set(&["access_token=tk1", "refresh_token=", "expires_at=", "scope=profile"]),
    );
    Ok(())
}

#[test]
fn serialize_expires_at_with_plus_and_percent() -> anyhow::Result<()> {
    let expires = Utc.with_ymd_and_hms(2100, 10, 10, 10, 10, 0).single();
    let token = PlainToken { access: "the-token", refresh: Some("refresh-token"), expires };
    assert_eq!(
        pairs(&TokenCodec::serialize(&token)),
        set(&[
            "access_token=the-token",
            "refresh_token=refresh-token",
            "expires_at=2100-10-10+10%3A10%3A00",
            "scope=",
        ]),
    );
    Ok(())
}

#[test]
fn deserialize_empty_values_are_absent() -> anyhow::Result<()> {
    let token = TokenCodec::deserialize("access_token=tk1&refresh_token=&expires_at=&scope=profile")?;
    assert_eq!(token.access_token(), "tk1");
    assert_eq!(token.refresh_token(), None);
    assert_eq!(token.expires_at(), None);
    assert_eq!(token.scope(), "profile");
    Ok(())
}

#[test]
fn deserialize_full() -> anyhow::Result<()> {
    let token = TokenCodec::deserialize(
        "scope=invite&expires_at=1970-01-01+00%3A00%3A00&refresh_token=refresh-token&access_token=access-token&extra=1",
    )?;
    assert_eq!(token.access_token(), "access-token");
    assert_eq!(token.refresh_token(), Some("refresh-token"));
    assert_eq!(token.expires_at(), DateTime::from_timestamp(0, 0));
    assert_eq!(token.scope(), "invite");
    Ok(())
}

#[yare::parameterized(
    missing_access_token = { "refresh_token=r&expires_at=&scope=profile" },
    empty_access_token = { "access_token=&scope=profile" },
    bad_expiry = { "access_token=a&expires_at=2100-10-10T10%3A10%3A00" },
    no_pairs = { "nonsense" },
)]
fn deserialize_rejects(encoded: &str) {
    let kind = TokenCodec::deserialize(encoded).err().map(|e| e.kind());
    assert!(matches!(kind, Some(ErrorKind::Decode)), "{encoded}: {kind:?}");
}

proptest! {
    #[test]
    fn round_trip_truncates_to_seconds(
        access in "[a-zA-Z0-9 &=+%:/._-]{1,32}",
        refresh in proptest::option::of("[a-zA-Z0-9 &=+._-]{1,32}"),
        expires in proptest::option::of((0i64..4_102_444_800, 0u32..1_000_000_000)),
        scope in "[a-z: ]{1,16}",
    ) {
        let expires_at = expires.and_then(|(secs, nanos)| DateTime::from_timestamp(secs, nanos));
        let original = Token::create(
            access.clone(),
            refresh.clone(),
            expires_at.map(ExpiresAt::At),
            None,
            Some(scope.clone()),
            Utc::now(),
        );
        prop_assert!(original.is_ok());
        let Ok(original) = original else { return Ok(()) };

        let encoded = TokenCodec::serialize(&original);
        let keys: HashSet<&str> = encoded.split('&').filter_map(|p| p.split('=').next()).collect();
        prop_assert_eq!(keys, HashSet::from(["access_token", "refresh_token", "expires_at", "scope"]));

        let decoded = TokenCodec::deserialize(&encoded);
        prop_assert!(decoded.is_ok());
        let Ok(decoded) = decoded else { return Ok(()) };
        prop_assert_eq!(decoded.access_token(), original.access_token());
        prop_assert_eq!(decoded.refresh_token(), original.refresh_token());
        prop_assert_eq!(decoded.scope(), original.scope());
        prop_assert_eq!(
            decoded.expires_at(),
            expires.and_then(|(secs, _)| DateTime::from_timestamp(secs, 0)),
        );
    }
}
