// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod config;
pub mod serve;

use tracing::debug;

use nexaas_id::{OAuthClient, ResourceClient, TokenCodec};

use crate::config::{Cli, Command};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let oauth = OAuthClient::new(cli.oauth)?;
    debug!(server = oauth.server().as_str(), "provider configured");

    match cli.command {
        Command::AuthorizeUrl => {
            println!("{}", oauth.authorize_url());
        }
        Command::Token { code } => {
            let token = oauth.exchange_token(code.as_deref()).await?;
            println!("{}", TokenCodec::serialize(&token));
        }
        Command::Fetch { token, resource, transport } => {
            let token = token.resolve()?;
            let client = ResourceClient::from_token(&token, &oauth).with_transport(transport);
            let record = client.cached(resource).await?;
            println!("{}", serde_json::to_string_pretty(&*record)?);
        }
        Command::Invite { token, email } => {
            let token = token.resolve()?;
            let client = ResourceClient::from_token(&token, &oauth);
            let invitation = client.invite(&email).await?;
            println!("{}", serde_json::to_string_pretty(&invitation.record)?);
        }
        Command::Serve { host, port } => {
            serve::run(oauth, &host, port).await?;
        }
    }
    Ok(())
}
