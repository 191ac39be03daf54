// Decision cascade: four gates, then the 23-point checklist
pub mod checklist;
pub mod draws;
pub mod levels;
pub mod state;

pub use checklist::{Checklist, ChecklistCategory, ChecklistItem, CHECKLIST_ITEMS};
pub use draws::ScriptedDraws;
pub use levels::{RejectReason, RiskAssessment, StructureAnalysis};
pub use state::{AnalysisLevels, Level, LevelState};

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::execution::Position;
use crate::models::{Direction, IndicatorSnapshot, Pattern};
use crate::risk::RiskLedger;

/// Gate thresholds and simulated confirmation pass marks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CascadeConfig {
    pub rsi_min: f64,
    pub rsi_max: f64,
    pub min_volume_ratio: f64,
    pub alignment_threshold: f64,
    pub risk_reward: f64, // assumed reward profile, fixed for now
    pub min_risk_reward: f64,
    pub min_entry_quality: f64,
    pub fear_greed_min: f64,
    pub fear_greed_max: f64,
    pub checklist_threshold: u32,
    pub min_cycle_interval_secs: i64,
    pub timeframe_pass: f64,
    pub pattern_confirm_pass: f64,
    pub session_pass: f64,
    pub max_volatility_pct: f64,
    pub rsi_long_ceiling: f64,
    pub rsi_short_floor: f64,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            rsi_min: 30.0,
            rsi_max: 70.0,
            min_volume_ratio: 0.5,
            alignment_threshold: 0.4,
            risk_reward: 2.5,
            min_risk_reward: 2.0,
            min_entry_quality: 0.5,
            fear_greed_min: 20.0,
            fear_greed_max: 80.0,
            checklist_threshold: 20,
            min_cycle_interval_secs: 5,
            timeframe_pass: 0.3,
            pattern_confirm_pass: 0.3,
            session_pass: 0.2,
            max_volatility_pct: 3.0,
            rsi_long_ceiling: 65.0,
            rsi_short_floor: 35.0,
        }
    }
}

/// Read-only view of the engine the cascade decides on
#[derive(Debug, Clone, Copy)]
pub struct MarketContext<'a> {
    pub symbol: &'a str,
    pub price: f64,
    pub indicators: &'a IndicatorSnapshot,
    pub fear_greed: f64,
    pub ledger: &'a RiskLedger,
    pub open_positions: usize,
    pub max_positions: usize,
}

/// What an approved cascade asks the position manager to open
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeIntent {
    pub symbol: String,
    pub direction: Direction,
    pub pattern: Pattern,
    pub size: f64,
    pub checklist_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Verdict {
    Rejected(RejectReason),
    ChecklistFailed(Checklist),
    Approved(TradeIntent),
}

/// Why a cycle did not start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    NotRunning,
    TradingDisabled,
    SlotsFull,
    AwaitingFirstTarget,
    Cooldown,
    InsufficientHistory,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::NotRunning => "engine not running",
            SkipReason::TradingDisabled => "trading disabled",
            SkipReason::SlotsFull => "all position slots in use",
            SkipReason::AwaitingFirstTarget => "waiting for open position to reach TP1",
            SkipReason::Cooldown => "minimum cycle interval not elapsed",
            SkipReason::InsufficientHistory => "not enough candles for indicators",
        };
        f.write_str(text)
    }
}

/// Result of one `run_cycle`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CycleOutcome {
    /// Nothing started; not a failure
    Skipped(SkipReason),
    Rejected(RejectReason),
    ChecklistFailed { score: u32 },
    Approved(Position),
}

impl CycleOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, CycleOutcome::Skipped(_))
    }
}

/// Stateless evaluator over a [`MarketContext`]
#[derive(Debug, Clone, Default)]
pub struct DecisionCascade {
    config: CascadeConfig,
}

impl DecisionCascade {
    pub fn new(config: CascadeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// Run the four levels in order, then the checklist
    ///
    /// `states` is updated as each stage resolves; stages after a
    /// rejection stay `Waiting`.
    pub fn evaluate<R: Rng + ?Sized>(
        &self,
        ctx: &MarketContext<'_>,
        rng: &mut R,
        states: &mut AnalysisLevels,
    ) -> Verdict {
        let (structure, risk) = match self.run_levels(ctx, rng, states) {
            Ok(analysis) => analysis,
            Err(reason) => {
                tracing::debug!(symbol = ctx.symbol, level = %reason.level(), %reason, "Cascade rejected");
                return Verdict::Rejected(reason);
            }
        };

        states.set_checklist(LevelState::Analyzing);
        let checklist = Checklist::evaluate(ctx, &self.config, &structure, &risk, rng);
        let score = checklist.score();

        if !checklist.passes(self.config.checklist_threshold) {
            states.set_checklist(LevelState::Failed);
            tracing::debug!(
                symbol = ctx.symbol,
                score,
                threshold = self.config.checklist_threshold,
                failed = ?checklist.failures(),
                "Checklist below threshold"
            );
            return Verdict::ChecklistFailed(checklist);
        }
        states.set_checklist(LevelState::Passed);

        Verdict::Approved(TradeIntent {
            symbol: ctx.symbol.to_string(),
            direction: structure.direction,
            pattern: structure.pattern,
            size: risk.size,
            checklist_score: score,
        })
    }

    fn run_levels<R: Rng + ?Sized>(
        &self,
        ctx: &MarketContext<'_>,
        rng: &mut R,
        states: &mut AnalysisLevels,
    ) -> Result<(StructureAnalysis, RiskAssessment), RejectReason> {
        let config = &self.config;

        track(states, Level::Safety, || levels::safety_gates(ctx, config))?;
        let structure = track(states, Level::Structure, || {
            levels::structural_analysis(ctx, config, &mut *rng)
        })?;
        let risk = track(states, Level::Risk, || levels::risk_assessment(ctx, config, &mut *rng))?;
        track(states, Level::Sentiment, || levels::sentiment_check(ctx, config))?;

        Ok((structure, risk))
    }
}

/// Run one gate, moving its level through `Analyzing` to the result
fn track<T>(
    states: &mut AnalysisLevels,
    level: Level,
    gate: impl FnOnce() -> Result<T, RejectReason>,
) -> Result<T, RejectReason> {
    states.begin(level);
    let result = gate();
    states.finish(level, result.is_ok());
    result
}
