// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client library for the Nexaas ID OAuth2 identity provider.
//!
//! - [`OAuthClient`] builds the authorize redirect and exchanges grants for a
//!   [`Token`].
//! - [`TokenCodec`] turns a token into a flat string for session storage.
//! - [`ResourceClient`] reads the profile resources with an access token.
//! - [`support`] is the contract web-framework adapters build on.

pub mod codec;
pub mod error;
pub mod http;
pub mod oauth;
pub mod record;
pub mod resource;
pub mod support;
pub mod token;

#[cfg(test)]
mod test_support;

pub use codec::TokenCodec;
pub use error::{Error, ErrorKind, Result};
pub use oauth::{OAuthClient, OAuthConfig, TokenResponse};
pub use record::{Record, Timestamp, Value};
pub use resource::{AuthTransport, Invitation, Resource, ResourceClient};
pub use token::{satisfies_token_shape, ExpiresAt, Token, TokenLike};
