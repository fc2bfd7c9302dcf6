//! One running sidebar bot: chat session, metric source and refresh scheduler

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::{
    actors::scheduler::SchedulerHandle,
    chat::ChatClient,
    config::ResolvedBotConfig,
    cycle::RefreshCycle,
    discord::{DiscordClient, DiscordEndpoints},
    display::DisplayFormat,
    publisher::Publisher,
    sources::{MetricSource, Source},
};

pub struct BotRuntime {
    name: String,
    chat: Arc<dyn ChatClient>,
    scheduler: SchedulerHandle,
}

impl BotRuntime {
    /// Log in to Discord and start refreshing
    ///
    /// Fails when the credential is rejected; nothing is scheduled in that case.
    #[instrument(skip_all, fields(bot = %config.name))]
    pub async fn start(config: ResolvedBotConfig, endpoints: &DiscordEndpoints) -> Result<Self> {
        let source = Source::from_config(&config.source, config.timeout)
            .context("failed to build metric source")?;
        let format = DisplayFormat::for_source(&config.source);

        let chat = DiscordClient::connect(&config.token, endpoints, config.timeout)
            .await
            .with_context(|| format!("bot '{}' could not log in", config.name))?;

        Ok(Self::assemble(
            config.name,
            config.interval,
            config.timeout,
            Arc::new(source),
            format,
            Arc::new(chat),
        ))
    }

    /// Wire an already connected chat client to a source and start the scheduler
    pub fn assemble(
        name: String,
        interval: Duration,
        timeout: Duration,
        source: Arc<dyn MetricSource>,
        format: DisplayFormat,
        chat: Arc<dyn ChatClient>,
    ) -> Self {
        debug!(
            "starting bot {name} with {} source every {}s",
            source.kind(),
            interval.as_secs()
        );

        let publisher = Publisher::new(chat.clone(), timeout);
        let cycle = RefreshCycle::new(name.clone(), source, format, publisher, timeout);
        let scheduler = SchedulerHandle::spawn(name.clone(), interval, cycle.into_cycle_fn());

        Self {
            name,
            chat,
            scheduler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.scheduler
    }

    /// Stop refreshing, then close the chat session
    pub async fn shutdown(self) {
        if let Err(e) = self.scheduler.shutdown().await {
            debug!("scheduler already stopped: {e}");
        }
        self.chat.disconnect().await;
        info!("bot {} stopped", self.name);
    }
}
