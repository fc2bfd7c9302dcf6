//! Actors that keep the bots running
//!
//! Each actor runs as its own task and is driven over an mpsc command channel through
//! a cloneable handle; replies travel back on oneshot channels.
//!
//! ```text
//!  BotRuntime ──spawns──→ RefreshScheduler ──tick──→ RefreshCycle (own task)
//!      │                                                  │
//!      └──spawns──→ GatewayActor ←──UpdatePresence────────┘
//! ```
//!
//! - **RefreshScheduler**: fires the refresh cycle on a fixed interval
//! - **GatewayActor** (in `discord::gateway`): holds the presence session

pub mod messages;
pub mod scheduler;
