// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Args, Parser, Subcommand};

use nexaas_id::{AuthTransport, OAuthConfig, Resource, Token, TokenCodec};

/// Command-line client for the Nexaas ID identity provider.
#[derive(Debug, Parser)]
#[command(name = "nexaas-id", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub oauth: OAuthConfig,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, env = "NEXAAS_ID_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format (text or json).
    #[arg(long, env = "NEXAAS_ID_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the URL that starts the authorization-code flow.
    AuthorizeUrl,

    /// Exchange an authorization code for a token and print it serialized.
    ///
    /// Without `--code` the client-credentials grant is used.
    Token {
        #[arg(long)]
        code: Option<String>,
    },

    /// Fetch one profile resource and print it as JSON.
    Fetch {
        #[command(flatten)]
        token: TokenArgs,

        #[arg(value_enum, default_value_t = Resource::PersonalInfo)]
        resource: Resource,

        /// How the access token is presented to the provider.
        #[arg(long, value_enum, default_value_t = AuthTransport::Bearer)]
        transport: AuthTransport,
    },

    /// Invite a new user by email on behalf of the token owner.
    Invite {
        #[command(flatten)]
        token: TokenArgs,

        email: String,
    },

    /// Run a demo web app guarded by the sign-in flow.
    Serve {
        #[arg(long, env = "NEXAAS_ID_SERVE_HOST", default_value = "127.0.0.1")]
        host: String,

        #[arg(long, env = "NEXAAS_ID_SERVE_PORT", default_value_t = 3030)]
        port: u16,
    },
}

#[derive(Debug, Clone, Args)]
pub struct TokenArgs {
    /// Bare access token, or the output of `nexaas-id token`.
    #[arg(long, env = "NEXAAS_ID_TOKEN", hide_env_values = true)]
    pub token: String,
}

impl TokenArgs {
    pub fn resolve(&self) -> nexaas_id::Result<Token> {
        parse_token(&self.token)
    }
}

/// Accept either a serialized token or a bare access token.
pub fn parse_token(raw: &str) -> nexaas_id::Result<Token> {
    let raw = raw.trim();
    if raw.contains("access_token=") {
        TokenCodec::deserialize(raw)
    } else {
        Token::new(raw)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
