use anyhow::Context;
use cascadebot::driver::{self, DriverOptions, RunReport};
use cascadebot::{EngineConfig, TradingEngine};
use chrono::{Duration, Utc};
use clap::Parser;
use std::path::PathBuf;

/// Run the cascade trading simulation and print a performance report
#[derive(Parser, Debug)]
#[command(name = "cascadebot", version)]
struct Args {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of cycles to run
    #[arg(short = 'n', long, default_value_t = 2_000)]
    cycles: u64,

    /// Run until Ctrl+C instead of stopping after --cycles
    #[arg(long)]
    forever: bool,

    /// Override the configured seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Wall-clock milliseconds between cycles
    #[arg(long, default_value_t = 1)]
    tick_ms: u64,

    /// Candles generated before the first cycle
    #[arg(long, default_value_t = 100)]
    warm_up: usize,

    /// Print the final report as JSON instead of the text report
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let args = Args::parse();

    let mut config = EngineConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    tracing::info!("🚀 cascadebot starting");
    tracing::info!("📊 Configuration:");
    tracing::info!("  Balance: ${:.2}", config.initial_balance);
    tracing::info!("  Seed: {}", config.seed);
    tracing::info!("  Active: {}", config.active_symbol()?);
    tracing::info!("  Daily Loss Limit: {}%", config.risk.daily_loss_limit_pct);
    tracing::info!("  Monthly Loss Limit: {}%", config.risk.monthly_loss_limit_pct);

    let schedule = config.schedule.clone();
    let mut engine = TradingEngine::new(config)?;

    let start = Utc::now();
    engine.warm_up(args.warm_up, start - Duration::seconds(schedule.cycle_secs));

    let options = DriverOptions {
        max_cycles: (!args.forever).then_some(args.cycles),
        tick: std::time::Duration::from_millis(args.tick_ms),
        start,
    };
    let summary = driver::run(&mut engine, schedule, options).await;

    tracing::info!(
        cycles = summary.cycles,
        approved = summary.approved,
        rejected = summary.rejected,
        checklist_failed = summary.checklist_failed,
        skipped = summary.skipped,
        "Simulation finished"
    );

    for position in engine.open_positions() {
        tracing::info!(
            slot = position.slot,
            symbol = %position.symbol,
            direction = %position.direction,
            pnl = position.pnl,
            tp1_hit = position.tp1_hit,
            "Still open"
        );
    }

    if args.json {
        let report = RunReport::new(&engine, summary);
        println!("{}", report.to_json().context("serializing report")?);
    } else {
        engine.statistics().print_report();
    }

    Ok(())
}

fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cascadebot=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
