use clap::Parser;
use futures::future::try_join_all;
use temple_sidebar::{config::Config, discord::DiscordEndpoints, runtime::BotRuntime};
use tokio::signal;
use tracing::{debug, error, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file; bots are built from the environment when omitted
    #[arg(short)]
    file: Option<String>,
}

const LOG_LEVEL: &str = "LOG_LEVEL";

fn init() {
    dotenv::dotenv().ok();

    let level = std::env::var(LOG_LEVEL)
        .ok()
        .and_then(|level| level.parse().ok())
        .unwrap_or(LevelFilter::DEBUG);

    let filter = filter::Targets::new().with_targets(vec![
        ("temple_sidebar", level),
        ("sidebar_bot", level),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let bots = Config::load(args.file.as_deref())?.resolve()?;
    let endpoints = DiscordEndpoints::from_env();
    debug!("starting {} bots", bots.len());

    let runtimes = try_join_all(
        bots.into_iter()
            .map(|bot| BotRuntime::start(bot, &endpoints)),
    )
    .await?;

    info!(
        "running {}",
        runtimes
            .iter()
            .map(|runtime| runtime.name())
            .collect::<Vec<_>>()
            .join(", ")
    );

    shutdown_signal().await;
    info!("shutting down");

    for runtime in runtimes {
        runtime.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
