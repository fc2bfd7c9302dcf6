//! Message types for actor communication
//!
//! Commands are sent to a specific actor over its mpsc channel; replies come back on
//! a oneshot channel carried inside the command.

use tokio::sync::oneshot;

use crate::{cycle::CycleOutcome, discord::types::Presence, error::ChatResult};

/// Commands that can be sent to a RefreshScheduler
#[derive(Debug)]
pub enum SchedulerCommand {
    /// Run a cycle right away, outside the interval timer
    ///
    /// The regular cadence is unaffected.
    RefreshNow {
        /// Channel to send the outcome back
        respond_to: oneshot::Sender<CycleOutcome>,
    },

    /// Stop ticking; cycles still in flight are abandoned
    Shutdown,
}

/// Commands that can be sent to a GatewayActor
#[derive(Debug)]
pub enum GatewayCommand {
    /// Replace the bot's presence
    ///
    /// The presence is remembered and re-sent after every reconnect, even when this
    /// particular update could not be delivered.
    UpdatePresence {
        presence: Presence,
        respond_to: oneshot::Sender<ChatResult<()>>,
    },

    /// Close the gateway session and stop reconnecting
    Shutdown,
}
