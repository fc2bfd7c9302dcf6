//! One refresh-and-publish pass
//!
//! ```text
//! fetch (bounded by timeout) ─┬─ Ok  → derive ─┬─ Ok  → state
//!                             │                └─ Err → fallback
//!                             └─ Err ──────────────────→ fallback
//!                                                         │
//!                                                   publish(state)
//! ```
//!
//! A failed fetch never leaves the bot silent: the fallback state is published
//! like any other.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use futures::{FutureExt, future::BoxFuture};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::{
    display::{DerivationFault, DisplayFormat, DisplayState},
    error::SourceError,
    publisher::{PublishOutcome, Publisher},
    sources::MetricSource,
};

/// A cycle as a plain function value, so the scheduler can run it without knowing
/// where metrics come from or where they go
pub type CycleFn = Arc<dyn Fn() -> BoxFuture<'static, CycleOutcome> + Send + Sync>;

/// Why a cycle had to fall back to the error state
#[derive(Debug, Error)]
pub enum CycleFault {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("derivation failed: {0}")]
    Derivation(#[from] DerivationFault),
}

/// Result of one scheduler tick, used for logging only
#[derive(Debug)]
pub enum CycleOutcome {
    /// Fresh metrics were derived and published
    Published {
        state: DisplayState,
        publish: PublishOutcome,
    },

    /// Fetch or derivation failed; the fallback state was published instead
    Degraded {
        reason: CycleFault,
        state: DisplayState,
        publish: PublishOutcome,
    },
}

impl CycleOutcome {
    pub fn state(&self) -> &DisplayState {
        match self {
            CycleOutcome::Published { state, .. } | CycleOutcome::Degraded { state, .. } => state,
        }
    }

    pub fn publish(&self) -> &PublishOutcome {
        match self {
            CycleOutcome::Published { publish, .. } | CycleOutcome::Degraded { publish, .. } => {
                publish
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, CycleOutcome::Degraded { .. })
    }
}

pub struct RefreshCycle {
    bot: String,
    source: Arc<dyn MetricSource>,
    format: DisplayFormat,
    publisher: Publisher,
    timeout: Duration,
}

impl RefreshCycle {
    pub fn new(
        bot: impl Into<String>,
        source: Arc<dyn MetricSource>,
        format: DisplayFormat,
        publisher: Publisher,
        timeout: Duration,
    ) -> Self {
        Self {
            bot: bot.into(),
            source,
            format,
            publisher,
            timeout,
        }
    }

    #[instrument(skip(self), fields(bot = %self.bot))]
    pub async fn run(&self) -> CycleOutcome {
        info!("refreshing {} metrics", self.source.kind());

        let fetched = tokio::time::timeout(self.timeout, self.source.fetch())
            .await
            .unwrap_or_else(|_| {
                Err(SourceError::Unavailable(format!(
                    "fetch timed out after {}s",
                    self.timeout.as_secs()
                )))
            });

        let (state, fault) = match fetched {
            Ok(record) => match self.format.try_derive(&record, Utc::now()) {
                Ok(state) => (state, None),
                Err(fault) => {
                    warn!("derivation failed: {fault}");
                    (self.format.fallback(), Some(CycleFault::from(fault)))
                }
            },
            Err(e) => {
                error!("Error refreshing metrics: {e}");
                (self.format.fallback(), Some(CycleFault::from(e)))
            }
        };

        info!("New stats {} || {}", state.name(), state.status());

        let publish = self.publisher.publish(&state).await;

        match fault {
            None => CycleOutcome::Published { state, publish },
            Some(reason) => CycleOutcome::Degraded {
                reason,
                state,
                publish,
            },
        }
    }

    pub fn into_cycle_fn(self) -> CycleFn {
        let cycle = Arc::new(self);
        Arc::new(move || {
            let cycle = cycle.clone();
            async move { cycle.run().await }.boxed()
        })
    }
}
