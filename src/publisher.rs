use std::{sync::Arc, time::Duration};

use tracing::{debug, error, info, instrument, warn};

use crate::{
    chat::{ActivityKind, ChatClient},
    display::DisplayState,
    error::{ChatError, ChatResult},
};

/// Tally of one publish pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Whether the bot-wide status line was accepted
    pub status_updated: bool,

    /// Whether memberships could be enumerated at all
    pub memberships_listed: bool,

    /// Memberships whose display name was updated
    pub succeeded: usize,

    /// Memberships whose display name update failed
    pub failed: usize,
}

impl PublishOutcome {
    /// Every call went through
    pub fn is_complete(&self) -> bool {
        self.status_updated && self.memberships_listed && self.failed == 0
    }

    /// Something was published, but not everywhere
    pub fn is_partial_failure(&self) -> bool {
        !self.is_complete() && (self.status_updated || self.succeeded > 0)
    }
}

/// Pushes a display state to every membership of one bot account
#[derive(Clone)]
pub struct Publisher {
    chat: Arc<dyn ChatClient>,

    /// Upper bound for every single chat call
    timeout: Duration,
}

impl Publisher {
    pub fn new(chat: Arc<dyn ChatClient>, timeout: Duration) -> Self {
        Self { chat, timeout }
    }

    /// A call that does not answer in time counts as a transport failure
    async fn bounded<T>(&self, call: impl Future<Output = ChatResult<T>>) -> ChatResult<T> {
        tokio::time::timeout(self.timeout, call)
            .await
            .unwrap_or_else(|_| {
                Err(ChatError::Transport(format!(
                    "no answer within {}s",
                    self.timeout.as_secs()
                )))
            })
    }

    /// Apply `state` as status line and per-group display name
    ///
    /// No step aborts another: a rejected status still lets names through, and a
    /// group that refuses the new name does not stop the remaining groups.
    #[instrument(skip_all)]
    pub async fn publish(&self, state: &DisplayState) -> PublishOutcome {
        let mut outcome = PublishOutcome::default();

        match self
            .bounded(self.chat.set_status(state.status(), ActivityKind::Watching))
            .await
        {
            Ok(()) => outcome.status_updated = true,
            Err(e) => error!("failed to set status: {e}"),
        }

        let memberships = match self.bounded(self.chat.memberships()).await {
            Ok(memberships) => {
                outcome.memberships_listed = true;
                memberships
            }
            Err(e) => {
                error!("failed to list memberships: {e}");
                return outcome;
            }
        };

        for membership in &memberships {
            match self
                .bounded(self.chat.set_display_name(membership, state.name()))
                .await
            {
                Ok(()) => {
                    debug!("updated display name in {} {}", membership.id, membership.name);
                    outcome.succeeded += 1;
                }
                Err(e) => {
                    warn!("ERROR: {e} in group {} {}", membership.id, membership.name);
                    outcome.failed += 1;
                }
            }
        }

        if outcome.is_complete() {
            debug!("published to {} memberships", outcome.succeeded);
        } else {
            info!(
                "published with failures: status updated {}, {} succeeded, {} failed",
                outcome.status_updated, outcome.succeeded, outcome.failed
            );
        }

        outcome
    }
}
