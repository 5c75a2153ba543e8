use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use display_core::{
    websocket_url, ChannelExit, CommandChannel, DisplayEvent, HttpSponsorLoader, Orchestrator,
    OrchestratorOptions,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use transitions::{audience_graph, TracingStage};

mod config;

use config::{load_settings, validate, Settings};

/// Headless audience display: follows the server's screen commands and
/// plays the transition choreography between them.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    display_id: Option<String>,
    /// Multiplier applied to every animation step; 0 skips them.
    #[arg(long)]
    time_scale: Option<f64>,
    #[arg(long)]
    settle_delay_ms: Option<u64>,
    #[arg(long)]
    log_filter: Option<String>,
}

impl Args {
    fn apply(self, settings: &mut Settings) {
        if let Some(v) = self.server_url {
            settings.server_url = v;
        }
        if let Some(v) = self.display_id {
            settings.display_id = Some(v);
        }
        if let Some(v) = self.time_scale {
            settings.time_scale = v;
        }
        if let Some(v) = self.settle_delay_ms {
            settings.settle_delay_ms = v;
        }
        if let Some(v) = self.log_filter {
            settings.log_filter = v;
        }
    }
}

fn build_orchestrator(
    settings: &Settings,
    sponsor: Arc<HttpSponsorLoader>,
) -> Result<Arc<Orchestrator>> {
    let graph = audience_graph(Arc::new(TracingStage), settings.time_scale)
        .context("authored transition graph is invalid")?;
    let options = OrchestratorOptions {
        settle_delay: settings.settle_delay(),
    };
    Ok(Orchestrator::with_content_loader(graph, options, sponsor))
}

fn log_events(orchestrator: &Orchestrator) {
    let mut events = orchestrator.subscribe_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(DisplayEvent::ScreenChanged { from, to }) => {
                    info!(%from, %to, "audience screen now showing");
                }
                Ok(event) => debug!(?event, "display event"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "display event log lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

async fn run(settings: Settings) -> Result<()> {
    let url = websocket_url(&settings.server_url, settings.display_id.as_deref())?;
    let sponsor = Arc::new(HttpSponsorLoader::new(settings.server_url.clone()));
    let mut orchestrator = build_orchestrator(&settings, Arc::clone(&sponsor))?;
    log_events(&orchestrator);

    loop {
        let exit = match CommandChannel::connect(&url, Arc::clone(&orchestrator)).await {
            Ok(channel) => channel.run().await?,
            Err(err) => ChannelExit::Failed(format!("{err:#}")),
        };

        match exit {
            ChannelExit::ReloadRequested => {
                info!("reloading display");
                orchestrator.wait_until_idle().await;
                orchestrator = build_orchestrator(&settings, Arc::clone(&sponsor))?;
                log_events(&orchestrator);
                continue;
            }
            ChannelExit::Closed => info!("display websocket closed by server"),
            ChannelExit::Failed(reason) => warn!(%reason, "display websocket failed"),
        }

        tokio::time::sleep(settings.reconnect_delay()).await;
        info!(%url, "reconnecting display websocket");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings()?;
    args.apply(&mut settings);
    validate(&settings)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&settings.log_filter)
                .with_context(|| format!("invalid log_filter '{}'", settings.log_filter))?,
        )
        .init();
    info!(
        server_url = %settings.server_url,
        display_id = settings.display_id.as_deref().unwrap_or("-"),
        time_scale = settings.time_scale,
        "starting audience display"
    );

    tokio::select! {
        result = run(settings) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down audience display");
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
