//! RefreshScheduler - Runs the refresh cycle on a fixed cadence
//!
//! ## States
//!
//! ```text
//!        tick / RefreshNow
//! Idle ─────────────────────→ Running (one or more cycles in flight)
//!  ↑                              │
//!  └──── cycle finished, failed ──┘
//!        or panicked
//! ```
//!
//! Every tick spawns the cycle as its own task, so a slow provider never delays the
//! next tick and a panicking cycle only takes its own task down. Cycles may overlap
//! when one outlasts the interval; their publishes are plain overwrites.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, instrument, trace, warn};

use crate::cycle::{CycleFn, CycleOutcome};

use super::messages::SchedulerCommand;

/// Actor that drives the refresh cycle of one bot
pub struct RefreshScheduler {
    /// Bot name for logging
    bot: String,

    /// The cycle to run on every tick
    cycle: CycleFn,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<SchedulerCommand>,

    /// Fixed refresh interval
    interval_duration: Duration,

    /// Cycles currently running
    in_flight: JoinSet<()>,
}

impl RefreshScheduler {
    pub fn new(
        bot: String,
        interval_duration: Duration,
        cycle: CycleFn,
        command_rx: mpsc::Receiver<SchedulerCommand>,
    ) -> Self {
        Self {
            bot,
            cycle,
            command_rx,
            interval_duration,
            in_flight: JoinSet::new(),
        }
    }

    /// Run the actor's main loop
    ///
    /// Runs until a Shutdown command is received or every handle is dropped. Cycle
    /// failures never end the loop.
    #[instrument(skip(self), fields(bot = %self.bot))]
    pub async fn run(mut self) {
        debug!(
            "starting refresh scheduler with interval {}s",
            self.interval_duration.as_secs()
        );

        let mut ticker = interval(self.interval_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                // Timer tick - start a cycle
                _ = ticker.tick() => {
                    trace!("tick with {} cycles in flight", self.in_flight.len());
                    let cycle = (self.cycle)();
                    self.in_flight.spawn(async move {
                        log_outcome(&cycle.await);
                    });
                }

                // Reap finished cycles
                Some(finished) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    if let Err(e) = finished {
                        log_join_error(e);
                    }
                    if self.in_flight.is_empty() {
                        trace!("scheduler idle");
                    }
                }

                // Handle commands
                cmd = self.command_rx.recv() => match cmd {
                    Some(SchedulerCommand::RefreshNow { respond_to }) => {
                        debug!("received RefreshNow command");
                        let cycle = (self.cycle)();
                        self.in_flight.spawn(async move {
                            let outcome = cycle.await;
                            log_outcome(&outcome);
                            let _ = respond_to.send(outcome);
                        });
                    }

                    Some(SchedulerCommand::Shutdown) => {
                        debug!("received shutdown command");
                        break;
                    }

                    None => {
                        warn!("command channel closed, shutting down");
                        break;
                    }
                }
            }
        }

        if !self.in_flight.is_empty() {
            debug!("abandoning {} in-flight cycles", self.in_flight.len());
        }
        self.in_flight.abort_all();

        debug!("refresh scheduler stopped");
    }
}

fn log_outcome(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::Published { publish, .. } if publish.is_complete() => {
            debug!("cycle published");
        }
        CycleOutcome::Published { publish, .. } => {
            warn!(
                "cycle published with failures: {} succeeded, {} failed",
                publish.succeeded, publish.failed
            );
        }
        CycleOutcome::Degraded { reason, .. } => {
            warn!("cycle degraded to error state: {reason}");
        }
    }
}

fn log_join_error(e: JoinError) {
    if e.is_panic() {
        error!("refresh cycle panicked: {e}");
    } else {
        trace!("refresh cycle cancelled: {e}");
    }
}

/// Handle for controlling a RefreshScheduler
///
/// Dropping every clone of the handle stops the scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    /// Command sender
    sender: mpsc::Sender<SchedulerCommand>,

    /// Bot name for identification
    pub bot: String,
}

impl SchedulerHandle {
    /// Spawn a new scheduler; the first cycle starts immediately
    pub fn spawn(bot: impl Into<String>, interval: Duration, cycle: CycleFn) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let bot = bot.into();

        let actor = RefreshScheduler::new(bot.clone(), interval, cycle, cmd_rx);

        tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            bot,
        }
    }

    /// Run one cycle now and wait for its outcome
    pub async fn refresh_now(&self) -> Result<CycleOutcome> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::RefreshNow { respond_to: tx })
            .await
            .context("failed to send RefreshNow command")?;

        rx.await.context("refresh cycle ended without an outcome")
    }

    /// Stop the scheduler
    pub async fn shutdown(self) -> Result<()> {
        self.sender
            .send(SchedulerCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
