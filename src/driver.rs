//! Cycle loop around the engine.
//!
//! Each step advances the feed by one candle, applies exit rules, runs one
//! decision cycle and moves the simulated clock forward by
//! `Schedule::cycle_secs`. Daily, weekly and monthly baselines roll over
//! on cycle counts, which is the only place resets are triggered.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;

use crate::cascade::CycleOutcome;
use crate::config::Schedule;
use crate::engine::TradingEngine;
use crate::execution::{Position, Statistics};
use crate::risk::RiskSummary;

/// Which baselines roll over after a cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rollover {
    pub daily: bool,
    pub weekly: bool,
    pub monthly: bool,
}

/// Counts cycles and maps them onto the simulated clock
#[derive(Debug, Clone)]
pub struct Scheduler {
    schedule: Schedule,
    start: DateTime<Utc>,
    cycles: u64,
}

impl Scheduler {
    pub fn new(schedule: Schedule, start: DateTime<Utc>) -> Self {
        Self {
            schedule,
            start,
            cycles: 0,
        }
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Simulated time of the current cycle
    pub fn now(&self) -> DateTime<Utc> {
        self.start + Duration::seconds(self.schedule.cycle_secs * self.cycles as i64)
    }

    /// Finish the current cycle and report the rollovers it crossed
    pub fn complete_cycle(&mut self) -> Rollover {
        self.cycles += 1;
        let due = |every: u64| every > 0 && self.cycles % every == 0;

        Rollover {
            daily: due(self.schedule.cycles_per_day),
            weekly: due(self.schedule.cycles_per_week),
            monthly: due(self.schedule.cycles_per_month),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub max_cycles: Option<u64>,    // run until Ctrl+C when None
    pub tick: std::time::Duration, // wall-clock delay between cycles
    pub start: DateTime<Utc>,
}

/// Counters for one driver run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub cycles: u64,
    pub skipped: u64,
    pub rejected: u64,
    pub checklist_failed: u64,
    pub approved: u64,
    pub closed: u64,
}

impl RunSummary {
    fn record(&mut self, outcome: &CycleOutcome) {
        match outcome {
            CycleOutcome::Skipped(_) => self.skipped += 1,
            CycleOutcome::Rejected(_) => self.rejected += 1,
            CycleOutcome::ChecklistFailed { .. } => self.checklist_failed += 1,
            CycleOutcome::Approved(_) => self.approved += 1,
        }
    }
}

/// End-of-run snapshot, printable as JSON
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub summary: RunSummary,
    pub statistics: Statistics,
    pub risk: RiskSummary,
    pub open_positions: Vec<Position>,
}

impl RunReport {
    pub fn new<R: Rng>(engine: &TradingEngine<R>, summary: RunSummary) -> Self {
        Self {
            summary,
            statistics: engine.statistics(),
            risk: engine.risk_summary(),
            open_positions: engine.open_positions().to_vec(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Drive the engine until the cycle budget is spent or Ctrl+C arrives
pub async fn run<R: Rng>(
    engine: &mut TradingEngine<R>,
    schedule: Schedule,
    options: DriverOptions,
) -> RunSummary {
    let mut scheduler = Scheduler::new(schedule, options.start);
    let mut summary = RunSummary::default();

    let mut interval = tokio::time::interval(options.tick.max(std::time::Duration::from_millis(1)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    engine.start();

    loop {
        if options.max_cycles.is_some_and(|max| scheduler.cycles() >= max) {
            break;
        }

        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => {
                tracing::info!(cycles = scheduler.cycles(), "Shutdown requested");
                break;
            }
        }

        let now = scheduler.now();
        let closed = engine.advance_at(now);
        summary.closed += closed.len() as u64;

        let outcome = engine.run_cycle_at(now);
        summary.record(&outcome);
        summary.cycles += 1;

        match &outcome {
            CycleOutcome::Approved(position) => {
                tracing::info!(
                    slot = position.slot,
                    symbol = %position.symbol,
                    direction = %position.direction,
                    score = ?position.checklist_score,
                    "Cascade approved trade"
                );
            }
            CycleOutcome::ChecklistFailed { score } => {
                tracing::debug!(score, "Checklist blocked trade");
            }
            _ => {}
        }

        let rollover = scheduler.complete_cycle();
        if rollover.daily {
            engine.reset_daily();
        }
        if rollover.weekly {
            engine.reset_weekly();
        }
        if rollover.monthly {
            engine.reset_monthly();
        }
    }

    engine.stop();
    summary
}
