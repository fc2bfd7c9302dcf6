//! Chat collaborator interface
//!
//! The refresh cycle only needs three things from a chat platform: a bot-wide status
//! line, the list of groups the bot is in, and a per-group display name. Anything
//! that can do those can host a sidebar bot.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChatResult;

/// Activity type shown in front of the status text ("Watching ...")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Watching,
}

impl ActivityKind {
    /// Discord activity type code
    pub fn code(self) -> u8 {
        match self {
            ActivityKind::Watching => 3,
        }
    }
}

/// A group the bot account belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: String,
    pub name: String,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Set the bot-wide status line
    async fn set_status(&self, text: &str, kind: ActivityKind) -> ChatResult<()>;

    /// Enumerate the groups the bot currently belongs to
    async fn memberships(&self) -> ChatResult<Vec<Membership>>;

    /// Set the bot's display name inside one group
    async fn set_display_name(&self, membership: &Membership, name: &str) -> ChatResult<()>;

    /// Close any long-lived connection; the default has nothing to close
    async fn disconnect(&self) {}
}
