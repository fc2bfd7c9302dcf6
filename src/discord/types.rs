//! Discord REST and gateway payloads used by the sidebar bots

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::chat::ActivityKind;

/// Gateway opcodes
pub mod opcode {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const PRESENCE_UPDATE: u8 = 3;
    pub const RECONNECT: u8 = 7;
    pub const INVALID_SESSION: u8 = 9;
    pub const HELLO: u8 = 10;
    pub const HEARTBEAT_ACK: u8 = 11;
}

/// GUILDS is the only intent a sidebar bot needs
pub const INTENT_GUILDS: u64 = 1;

/// Any frame received from the gateway
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    pub s: Option<u64>,
    pub t: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hello {
    /// Milliseconds
    pub heartbeat_interval: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Presence {
    pub since: Option<u64>,
    pub activities: Vec<Activity>,
    pub status: String,
    pub afk: bool,
}

impl Presence {
    /// Online presence with a single activity
    pub fn activity(name: impl Into<String>, kind: ActivityKind) -> Self {
        Self {
            since: None,
            activities: vec![Activity {
                name: name.into(),
                kind: kind.code(),
            }],
            status: "online".to_string(),
            afk: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
}

/// The authenticated bot user
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
}

pub fn heartbeat(sequence: Option<u64>) -> Value {
    json!({ "op": opcode::HEARTBEAT, "d": sequence })
}

pub fn identify(token: &str, presence: Option<&Presence>) -> Value {
    json!({
        "op": opcode::IDENTIFY,
        "d": {
            "token": token,
            "intents": INTENT_GUILDS,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "temple-sidebar",
                "device": "temple-sidebar",
            },
            "presence": presence,
        }
    })
}

pub fn presence_update(presence: &Presence) -> Value {
    json!({ "op": opcode::PRESENCE_UPDATE, "d": presence })
}
