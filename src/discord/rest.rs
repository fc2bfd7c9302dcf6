//! Discord REST calls: who am I, which guilds am I in, set my nickname

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header::AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{instrument, trace};

use crate::{
    chat::Membership,
    error::{ChatError, ChatResult},
};

use super::types::CurrentUser;

/// Discord returns at most 200 guilds per page
const GUILD_PAGE_LIMIT: usize = 200;

#[derive(Debug, Clone)]
pub struct DiscordRest {
    client: Client,
    api_url: String,
    token: String,
}

impl DiscordRest {
    pub fn new(token: &str, api_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub async fn current_user(&self) -> ChatResult<CurrentUser> {
        self.get("/users/@me").await
    }

    /// Every guild the bot is in, following pagination
    #[instrument(skip(self))]
    pub async fn current_user_guilds(&self) -> ChatResult<Vec<Membership>> {
        let mut guilds: Vec<Membership> = vec![];

        loop {
            let mut path = format!("/users/@me/guilds?limit={GUILD_PAGE_LIMIT}");
            if let Some(last) = guilds.last() {
                path.push_str(&format!("&after={}", last.id));
            }

            let page: Vec<Membership> = self.get(&path).await?;
            let page_len = page.len();
            guilds.extend(page);

            if page_len < GUILD_PAGE_LIMIT {
                break;
            }
        }

        trace!("bot is in {} guilds", guilds.len());
        Ok(guilds)
    }

    /// Change the bot's own nickname in one guild
    pub async fn modify_current_member_nick(&self, guild_id: &str, nick: &str) -> ChatResult<()> {
        let response = self
            .request(Method::PATCH, &format!("/guilds/{guild_id}/members/@me"))
            .json(&json!({ "nick": nick }))
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ChatResult<T> {
        let response = self.request(Method::GET, path).send().await?;
        let response = check(response).await?;

        response
            .json()
            .await
            .map_err(|e| ChatError::Transport(format!("invalid response for {path}: {e}")))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.api_url))
            .header(AUTHORIZATION, format!("Bot {}", self.token))
    }
}

/// Map error statuses onto the chat error taxonomy
async fn check(response: Response) -> ChatResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ChatError::PermissionDenied(body),
        StatusCode::NOT_FOUND => ChatError::NotFound(body),
        _ => ChatError::Rejected {
            status: status.as_u16(),
            body,
        },
    })
}
