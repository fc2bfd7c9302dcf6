//! Discord REST client against a mock API

use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::{Value, json};
use temple_sidebar::{discord::rest::DiscordRest, error::ChatError};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param, query_param_is_missing},
};

fn rest(server: &MockServer) -> DiscordRest {
    DiscordRest::new("bot-token", &server.uri(), Duration::from_secs(5)).unwrap()
}

fn guild_page(ids: impl Iterator<Item = u64>) -> Value {
    Value::Array(
        ids.map(|id| json!({ "id": id.to_string(), "name": format!("guild {id}"), "owner": false }))
            .collect(),
    )
}

#[tokio::test]
async fn test_current_user_sends_bot_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .and(header("authorization", "Bot bot-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "42", "username": "TPI" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let user = rest(&server).current_user().await.unwrap();

    assert_eq!(user.id, "42");
    assert_eq!(user.username, "TPI");
}

#[tokio::test]
async fn test_invalid_token_is_permission_denied() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "401: Unauthorized" })),
        )
        .mount(&server)
        .await;

    let result = rest(&server).current_user().await;

    assert_matches!(result, Err(ChatError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_guild_listing_follows_pagination() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/@me/guilds"))
        .and(query_param("limit", "200"))
        .and(query_param_is_missing("after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(guild_page(1..=200)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/@me/guilds"))
        .and(query_param("after", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(guild_page(201..=203)))
        .expect(1)
        .mount(&server)
        .await;

    let guilds = rest(&server).current_user_guilds().await.unwrap();

    assert_eq!(guilds.len(), 203);
    assert_eq!(guilds[0].id, "1");
    assert_eq!(guilds[202].name, "guild 203");
}

#[tokio::test]
async fn test_set_nickname_patches_own_member() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/guilds/7/members/@me"))
        .and(body_json(json!({ "nick": "$0.974 | 0.93x TPI" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "nick": "$0.974 | 0.93x TPI" })))
        .expect(1)
        .mount(&server)
        .await;

    rest(&server)
        .modify_current_member_nick("7", "$0.974 | 0.93x TPI")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_set_nickname_error_classification() {
    let server = MockServer::start().await;
    for (guild, status) in [("1", 403), ("2", 404), ("3", 429)] {
        Mock::given(method("PATCH"))
            .and(path(format!("/guilds/{guild}/members/@me")))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .mount(&server)
            .await;
    }
    let rest = rest(&server);

    assert_matches!(
        rest.modify_current_member_nick("1", "x").await,
        Err(ChatError::PermissionDenied(_))
    );
    assert_matches!(
        rest.modify_current_member_nick("2", "x").await,
        Err(ChatError::NotFound(_))
    );
    assert_matches!(
        rest.modify_current_member_nick("3", "x").await,
        Err(ChatError::Rejected { status: 429, body }) if body == "nope"
    );
}
