//! Discord as the chat platform behind every sidebar bot
//!
//! Nicknames and guild listings go over REST, the status line over a gateway session.

pub mod gateway;
pub mod rest;
pub mod types;

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::{
    chat::{ActivityKind, ChatClient, Membership},
    error::ChatResult,
    util,
};

use self::{
    gateway::GatewayHandle,
    rest::DiscordRest,
    types::Presence,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordEndpoints {
    pub api_url: String,
    pub gateway_url: String,
}

impl DiscordEndpoints {
    pub fn from_env() -> Self {
        Self {
            api_url: util::get_discord_api_url(),
            gateway_url: util::get_discord_gateway_url(),
        }
    }
}

impl Default for DiscordEndpoints {
    fn default() -> Self {
        Self::from_env()
    }
}

/// One logged-in bot account
pub struct DiscordClient {
    rest: DiscordRest,
    gateway: GatewayHandle,
}

impl DiscordClient {
    /// Check the token against the API, then open the gateway session
    pub async fn connect(token: &str, endpoints: &DiscordEndpoints, timeout: Duration) -> Result<Self> {
        let rest = DiscordRest::new(token, &endpoints.api_url, timeout)
            .context("failed to build Discord HTTP client")?;

        let user = rest
            .current_user()
            .await
            .context("failed to log in to Discord")?;
        info!("logged in as {} ({})", user.username, user.id);

        let gateway = GatewayHandle::spawn(token, endpoints.gateway_url.as_str(), timeout);

        Ok(Self { rest, gateway })
    }
}

#[async_trait]
impl ChatClient for DiscordClient {
    async fn set_status(&self, text: &str, kind: ActivityKind) -> ChatResult<()> {
        self.gateway.update_presence(Presence::activity(text, kind)).await
    }

    async fn memberships(&self) -> ChatResult<Vec<Membership>> {
        self.rest.current_user_guilds().await
    }

    async fn set_display_name(&self, membership: &Membership, name: &str) -> ChatResult<()> {
        self.rest.modify_current_member_nick(&membership.id, name).await
    }

    async fn disconnect(&self) {
        self.gateway.shutdown().await;
    }
}
