// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    invalid_argument = { ErrorKind::InvalidArgument, 400, "INVALID_ARGUMENT" },
    http = { ErrorKind::Http, 502, "HTTP_ERROR" },
    invalid_response = { ErrorKind::InvalidResponse, 502, "INVALID_RESPONSE" },
    decode = { ErrorKind::Decode, 400, "DECODE_ERROR" },
    not_authenticated = { ErrorKind::NotAuthenticated, 401, "NOT_AUTHENTICATED" },
    transport = { ErrorKind::Transport, 502, "TRANSPORT" },
)]
fn kind_codes(kind: ErrorKind, status: u16, code: &str) {
    assert_eq!(kind.http_status(), status);
    assert_eq!(kind.as_str(), code);
    assert_eq!(kind.to_string(), code);
}

#[test]
fn auth_failure_only_for_401_and_403() {
    let err = |status| Error::Http { status, body: String::new() };
    assert!(err(401).is_auth_failure());
    assert!(err(403).is_auth_failure());
    assert!(!err(404).is_auth_failure());
    assert!(!err(500).is_auth_failure());
    assert!(!Error::NotAuthenticated.is_auth_failure());
}

#[test]
fn invalid_response_chains_parse_error() {
    let parse = serde_json::from_str::<serde_json::Value>("{").err();
    let Some(parse) = parse else {
        unreachable!("truncated JSON must fail to parse");
    };
    let err = Error::invalid_response_with("no access token supplied", parse);
    assert_eq!(err.to_string(), "no access token supplied");
    assert!(std::error::Error::source(&err).is_some());
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
}
