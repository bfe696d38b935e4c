use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use godfield_agent::bridge::{HttpBridge, LoggingActuator};
use godfield_agent::config::{DEFAULT_BRIDGE_URL, DEFAULT_DECIDE_URL};
use godfield_agent::scene::InputActuator;
use godfield_agent::{scheduler, Agent, AgentConfig, FileConfig};
use tracing::{info, info_span, warn, Instrument};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "godfield-agent", version, about = "Autonomous Godfield player")]
struct Cli {
    /// Decision service endpoint.
    #[arg(long, default_value = DEFAULT_DECIDE_URL)]
    decide_url: String,

    /// Base URL of the scene bridge that samples the game and injects input.
    #[arg(long, default_value = DEFAULT_BRIDGE_URL)]
    bridge_url: String,

    /// Optional TOML file with [timings] and [vocabulary] overrides.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log input commands instead of sending them.
    #[arg(long)]
    dry_run: bool,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log: String,
}

// One thread: a busy check and the lock acquire that follows it cannot be
// interleaved by another worker.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log));
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .init();

    let file = match &cli.config {
        Some(path) => FileConfig::load_from(path).context("load config")?,
        None => FileConfig::default(),
    };
    let cfg = AgentConfig {
        decide_url: cli.decide_url,
        bridge_url: cli.bridge_url,
        dry_run: cli.dry_run,
        timings: file.timings,
        vocabulary: file.vocabulary,
    };

    let session = uuid::Uuid::new_v4();
    let span = info_span!("session", id = %session);

    async move {
        info!(
            "starting; decide={} bridge={} dry_run={}",
            cfg.decide_url, cfg.bridge_url, cfg.dry_run
        );

        let bridge = HttpBridge::new(cfg.bridge_url.clone());
        let actuator: Arc<dyn InputActuator> = if cfg.dry_run {
            Arc::new(LoggingActuator)
        } else {
            Arc::new(bridge.clone())
        };
        let agent = Agent::new(cfg, Arc::new(bridge), actuator);

        scheduler::run(agent, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("ctrl-c handler failed: {e:?}; running until killed");
                std::future::pending::<()>().await;
            }
        })
        .await;

        info!("stopped");
        Ok(())
    }
    .instrument(span)
    .await
}
