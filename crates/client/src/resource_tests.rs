// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::NaiveDate;

use super::*;
use crate::error::ErrorKind;
use crate::oauth::OAuthConfig;
use crate::test_support::MockProvider;

const ACCESS_TOKEN: &str = "35822300c02a679292f2dda5069aa4a997419dc114637dc8aae62f55394a52b0";
const USER_ID: &str = "9680f8e1-ff10-46b5-bedb-f4545adabfca";

const PERSONAL_INFO: &str = r#"{
    "id": "9680f8e1-ff10-46b5-bedb-f4545adabfca",
    "full_name": "Rodrigo Cacilhas",
    "nickname": "cacilhas",
    "email": "rodrigo.cacilhas@nexaas.com",
    "birth": "1975-11-20",
    "gender": "male",
    "language": "pt-br",
    "timezone": "America/Sao_Paulo",
    "country": "BR",
    "city": "Niterói / RJ"
}"#;

fn oauth_client(server: Option<String>) -> Result<OAuthClient> {
    let config =
        OAuthConfig::new("E4KAAPDCBBBZVHZBTXZX6EEBDU", "F6K34MJSAZBC7FNG7XBBS6HMRY", "http://localhost:9000/callback");
    OAuthClient::new(match server {
        Some(server) => config.server(server),
        None => config,
    })
}

async fn provider() -> anyhow::Result<MockProvider> {
    MockProvider::spawn(&[
        ("/api/v1/profile", 200, PERSONAL_INFO),
        (
            "/api/v1/profile/professional_info",
            200,
            r#"{"id":"9680f8e1-ff10-46b5-bedb-f4545adabfca","profession":"Desenvolvedor","company":"NexaaS","position":"Analista de Desenvolvimento Sênior I"}"#,
        ),
        (
            "/api/v1/profile/emails",
            200,
            r#"{"id":"9680f8e1-ff10-46b5-bedb-f4545adabfca","emails":["rodrigo.cacilhas@nexaas.com","batalema@cacilhas.info"]}"#,
        ),
        (
            "/api/v1/profile/contacts",
            200,
            r#"{"id":"9680f8e1-ff10-46b5-bedb-f4545adabfca","phone_numbers":["+55-21-999999999"]}"#,
        ),
        (
            "/api/v1/sign_up",
            200,
            r#"{"id":"813500b4-ab60-41ce-a036-61563aec297d","requester":"9680f8e1-ff10-46b5-bedb-f4545adabfca","email":"blablabla@example.com"}"#,
        ),
    ])
    .await
}

fn api_client(provider: &MockProvider) -> anyhow::Result<ResourceClient> {
    Ok(ResourceClient::from_oauth(ACCESS_TOKEN, &oauth_client(Some(provider.base_url()))?))
}

#[test]
fn attributes_from_oauth() -> anyhow::Result<()> {
    let client = ResourceClient::from_oauth(ACCESS_TOKEN, &oauth_client(None)?);
    assert_eq!(client.access_token(), ACCESS_TOKEN);
    assert_eq!(client.id(), Some("E4KAAPDCBBBZVHZBTXZX6EEBDU"));
    assert_eq!(client.secret(), Some("F6K34MJSAZBC7FNG7XBBS6HMRY"));
    assert_eq!(client.server().url().host_str(), Some("localhost"));
    assert_eq!(client.server().url().port(), Some(3000));
    assert_eq!(client.server().url().path(), "/");
    assert_eq!(client.transport(), AuthTransport::Bearer);
    assert_eq!(
        client.navbar_url(),
        format!("http://localhost:3000/api/v1/widgets/navbar.js?access_token={ACCESS_TOKEN}"),
    );
    assert_eq!(
        client.user_widget_url(),
        format!("http://localhost:3000/api/v1/widgets/user.js?access_token={ACCESS_TOKEN}"),
    );
    Ok(())
}

#[test]
fn from_token_uses_access_token() -> anyhow::Result<()> {
    let token = crate::token::Token::new("tok")?;
    let client = ResourceClient::from_token(&token, &oauth_client(None)?);
    assert_eq!(client.access_token(), "tok");
    Ok(())
}

#[test]
fn direct_construction() -> anyhow::Result<()> {
    let client = ResourceClient::new("tok", Some("id.example.com"))?.with_credentials("id", "secret");
    assert_eq!(client.server().as_str(), "https://id.example.com");
    assert_eq!(client.id(), Some("id"));
    assert_eq!(client.secret(), Some("secret"));

    let client = ResourceClient::new("tok", None)?;
    assert_eq!(client.id(), None);
    assert_eq!(client.resource_url("/api/v1/profile").as_str(), "http://localhost:3000/api/v1/profile");
    Ok(())
}

#[tokio::test]
async fn personal_info_decodes_scalars() -> anyhow::Result<()> {
    let provider = provider().await?;
    let info = api_client(&provider)?.personal_info().await?;
    assert_eq!(info.uuid("id"), Some(Uuid::parse_str(USER_ID)?));
    assert_eq!(info.str("full_name"), Some("Rodrigo Cacilhas"));
    assert_eq!(info.str("nickname"), Some("cacilhas"));
    assert_eq!(info.date("birth"), NaiveDate::from_ymd_opt(1975, 11, 20));
    assert_eq!(info.str("city"), Some("Niterói / RJ"));
    Ok(())
}

#[tokio::test]
async fn bearer_transport_sends_header_only() -> anyhow::Result<()> {
    let provider = provider().await?;
    api_client(&provider)?.personal_info().await?;

    let hits = provider.hits("/api/v1/profile").await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].authorization.as_deref(), Some(format!("Bearer {ACCESS_TOKEN}").as_str()));
    assert_eq!(hits[0].query, None);
    Ok(())
}

#[tokio::test]
async fn query_param_transport_sends_query_only() -> anyhow::Result<()> {
    let provider = provider().await?;
    let client = api_client(&provider)?.with_transport(AuthTransport::QueryParam);
    client.emails().await?;

    let hits = provider.hits("/api/v1/profile/emails").await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].authorization, None);
    assert_eq!(hits[0].query.as_deref(), Some(format!("access_token={ACCESS_TOKEN}").as_str()));
    Ok(())
}

#[tokio::test]
async fn other_resources() -> anyhow::Result<()> {
    let provider = provider().await?;
    let client = api_client(&provider)?;
    let user_id = Some(Uuid::parse_str(USER_ID)?);

    let info = client.professional_info().await?;
    assert_eq!(info.uuid("id"), user_id);
    assert_eq!(info.str("company"), Some("NexaaS"));
    assert_eq!(info.str("position"), Some("Analista de Desenvolvimento Sênior I"));

    let info = client.emails().await?;
    assert_eq!(info.uuid("id"), user_id);
    assert_eq!(info.strings("emails"), ["rodrigo.cacilhas@nexaas.com", "batalema@cacilhas.info"]);

    let info = client.contacts().await?;
    assert_eq!(info.uuid("id"), user_id);
    assert_eq!(info.strings("phone_numbers"), ["+55-21-999999999"]);
    Ok(())
}

#[tokio::test]
async fn resources_are_memoized_until_reset() -> anyhow::Result<()> {
    let provider = provider().await?;
    let mut client = api_client(&provider)?;

    let first = client.personal_info().await?;
    let second = client.personal_info().await?;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(provider.count("/api/v1/profile").await, 1);

    client.reset();
    client.reset();
    client.personal_info().await?;
    assert_eq!(provider.count("/api/v1/profile").await, 2);
    Ok(())
}

#[tokio::test]
async fn concurrent_first_access_fetches_once() -> anyhow::Result<()> {
    let provider = provider().await?;
    let client = api_client(&provider)?;

    let (a, b) = tokio::join!(client.contacts(), client.contacts());
    assert!(Arc::ptr_eq(&a?, &b?));
    assert_eq!(provider.count("/api/v1/profile/contacts").await, 1);
    Ok(())
}

#[tokio::test]
async fn invite_posts_json_and_is_not_cached() -> anyhow::Result<()> {
    let provider = provider().await?;
    let client = api_client(&provider)?;

    let invitation = client.invite("blablabla@example.com").await?;
    assert_eq!(invitation.requester, Uuid::parse_str(USER_ID)?);
    assert_eq!(invitation.email, "blablabla@example.com");
    assert_eq!(invitation.id, Uuid::parse_str("813500b4-ab60-41ce-a036-61563aec297d")?);
    client.invite("blablabla@example.com").await?;

    let hits = provider.hits("/api/v1/sign_up").await;
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].method, axum::http::Method::POST);
    let body: serde_json::Value = serde_json::from_str(&hits[0].body)?;
    assert_eq!(body, serde_json::json!({ "invited": "blablabla@example.com" }));
    Ok(())
}

#[tokio::test]
async fn failures_are_not_cached() -> anyhow::Result<()> {
    let provider = MockProvider::spawn(&[("/api/v1/profile", 401, r#"{"error":"invalid_token"}"#)]).await?;
    let client = api_client(&provider)?;

    for _ in 0..2 {
        let err = client.personal_info().await.err();
        assert_eq!(err.as_ref().and_then(Error::status), Some(401));
        assert!(err.is_some_and(|e| e.is_auth_failure()));
    }
    assert_eq!(provider.count("/api/v1/profile").await, 2);
    Ok(())
}

#[tokio::test]
async fn non_object_body_is_invalid_response() -> anyhow::Result<()> {
    let provider = MockProvider::spawn(&[
        ("/api/v1/profile", 200, "[1, 2]"),
        ("/api/v1/sign_up", 200, r#"{"email":"x@example.com"}"#),
    ])
    .await?;
    let client = api_client(&provider)?;

    let kind = client.personal_info().await.err().map(|e| e.kind());
    assert_eq!(kind, Some(ErrorKind::InvalidResponse));
    let kind = client.invite("x@example.com").await.err().map(|e| e.kind());
    assert_eq!(kind, Some(ErrorKind::InvalidResponse));
    Ok(())
}
