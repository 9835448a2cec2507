//! skirmish - run a scripted battle scenario
//!
//! Logs are written to stdout (or `--output`) as JSON lines; diagnostics
//! go to stderr.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use skirmish::{Battle, EngineConfig, JsonLinesRecorder, Scenario, TickEvent};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Turn-based combat resolution engine
#[derive(Parser, Debug)]
#[command(name = "skirmish", version, about = "Run a scripted battle scenario")]
struct Args {
    /// Scenario file (JSON)
    #[arg(short, long)]
    scenario: PathBuf,

    /// Engine configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks to run (default: last scripted tick)
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Tick immediately instead of on the configured interval
    #[arg(long)]
    manual: bool,

    /// Write logs here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit diagnostics as JSON
    #[arg(long)]
    json_diagnostics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let json = args.json_diagnostics;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skirmish=info".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();

    let mut config = EngineConfig::load(args.config.as_deref())?;
    if args.manual {
        config.tick_interval_ms = 0;
    }

    let scenario = Scenario::load(&args.scenario)
        .with_context(|| format!("loading {}", args.scenario.display()))?;
    let ticks = args.ticks.unwrap_or_else(|| scenario.last_tick()).max(1);

    let recorder = match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            JsonLinesRecorder::named("file", BufWriter::new(file))
        }
        None => JsonLinesRecorder::stdout(),
    };

    let battle = Battle::builder(scenario.roster())
        .config(&config)
        .action_source(Arc::new(scenario.script()))
        .observer(Arc::new(recorder))
        .build()?;
    let mut events = battle.subscribe();

    info!(battle = %battle.id(), ticks, interval_ms = config.tick_interval_ms, "Running scenario");

    if config.tick_interval().is_some() {
        loop {
            let tick = tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    warn!("Interrupted");
                    break;
                }
                event = events.recv() => match event {
                    Ok(TickEvent::Completed(report)) => {
                        for rejection in &report.rejections {
                            warn!(tick = report.tick, %rejection, "Action rejected");
                        }
                        report.tick
                    }
                    Ok(TickEvent::Failed { tick, error }) => {
                        warn!(tick, %error, "Tick failed");
                        tick
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed tick events");
                        battle.current_tick()
                    }
                    Err(RecvError::Closed) => break,
                },
            };
            if tick >= ticks || battle.registry().await.alive_count() <= 1 {
                break;
            }
        }
    } else {
        for _ in 0..ticks {
            let report = battle.tick().await?;
            for rejection in &report.rejections {
                warn!(tick = report.tick, %rejection, "Action rejected");
            }
            if battle.registry().await.alive_count() <= 1 {
                break;
            }
        }
    }

    battle.cancel().await?;

    for combatant in battle.combatants().await {
        let name = scenario.name_of(&combatant.id()).unwrap_or("?");
        info!(
            name,
            state = ?combatant.state,
            health = combatant.number(&config.health_stat),
            "Final state"
        );
    }
    info!(ticks = battle.current_tick(), logs = battle.log_count(), "Battle over");

    Ok(())
}
