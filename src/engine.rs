use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::cascade::{
    AnalysisLevels, CycleOutcome, DecisionCascade, Level, LevelState, MarketContext, RejectReason,
    SkipReason, Verdict,
};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::execution::{CloseReason, ClosedTrade, Position, PositionManager, Statistics};
use crate::market::MarketDataFeed;
use crate::models::{Candle, Direction, IndicatorSnapshot, Pattern};
use crate::risk::{RiskLedger, RiskSummary};

/// Per-instrument snapshot for presentation layers
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentView {
    pub symbol: String,
    pub price: f64,
    pub indicators: Option<IndicatorSnapshot>,
    pub candles: Vec<Candle>,
}

/// Owns the feed, the ledger and the open positions, and runs one
/// decision cycle at a time
///
/// `R` drives the cascade's simulated confirmations; production uses a
/// seeded `StdRng`, tests inject fixed generators.
pub struct TradingEngine<R = StdRng> {
    feed: MarketDataFeed,
    ledger: RiskLedger,
    positions: PositionManager,
    cascade: DecisionCascade,
    levels: AnalysisLevels,
    active_symbol: String,
    candle_interval: Duration,
    running: bool,
    last_cycle: Option<DateTime<Utc>>,
    last_outcome: Option<CycleOutcome>,
    rng: R,
}

impl TradingEngine<StdRng> {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let rng = StdRng::seed_from_u64(config.seed.wrapping_add(1));
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> TradingEngine<R> {
    pub fn with_rng(config: EngineConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let active_symbol = config.active_symbol()?.to_string();

        Ok(Self {
            feed: MarketDataFeed::new(&config.instruments, config.seed),
            ledger: RiskLedger::new(config.initial_balance, config.risk),
            positions: PositionManager::new(config.exits),
            cascade: DecisionCascade::new(config.cascade),
            levels: AnalysisLevels::default(),
            active_symbol,
            candle_interval: Duration::seconds(config.schedule.cycle_secs),
            running: false,
            last_cycle: None,
            last_outcome: None,
            rng,
        })
    }

    pub fn start(&mut self) {
        self.running = true;
        tracing::info!(symbol = %self.active_symbol, "Engine started");
    }

    pub fn stop(&mut self) {
        self.running = false;
        tracing::info!("Engine stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Seed the candle history so indicators are defined from the start
    pub fn warm_up(&mut self, count: usize, end: DateTime<Utc>) {
        self.feed.warm_up(count, end, self.candle_interval);
    }

    /// Advance prices one candle, then apply exit rules (live clock)
    pub fn advance(&mut self) -> Vec<ClosedTrade> {
        self.advance_at(Utc::now())
    }

    pub fn advance_at(&mut self, now: DateTime<Utc>) -> Vec<ClosedTrade> {
        self.feed.advance_at(now);
        self.update_positions_at(now)
    }

    /// Mark open positions against current feed prices (live clock)
    pub fn update_positions(&mut self) -> Vec<ClosedTrade> {
        self.update_positions_at(Utc::now())
    }

    pub fn update_positions_at(&mut self, now: DateTime<Utc>) -> Vec<ClosedTrade> {
        let prices = self.feed.prices();
        self.positions.tick_at(&prices, &mut self.ledger, now)
    }

    /// Run one decision cycle on the active instrument (live clock)
    pub fn run_cycle(&mut self) -> CycleOutcome {
        self.run_cycle_at(Utc::now())
    }

    /// Run one decision cycle at `now`
    ///
    /// Preconditions that fail leave every piece of state untouched and
    /// return `Skipped`. A started cycle resets the level display first.
    pub fn run_cycle_at(&mut self, now: DateTime<Utc>) -> CycleOutcome {
        if let Some(reason) = self.skip_reason(now) {
            tracing::debug!(symbol = %self.active_symbol, %reason, "Cycle skipped");
            return CycleOutcome::Skipped(reason);
        }

        let Some(indicators) = self.feed.indicators_for(&self.active_symbol) else {
            tracing::debug!(symbol = %self.active_symbol, "Cycle skipped, indicators undefined");
            return CycleOutcome::Skipped(SkipReason::InsufficientHistory);
        };
        let Some(price) = self.feed.price(&self.active_symbol) else {
            return CycleOutcome::Skipped(SkipReason::InsufficientHistory);
        };

        self.last_cycle = Some(now);
        self.levels.reset();

        let ctx = MarketContext {
            symbol: &self.active_symbol,
            price,
            indicators,
            fear_greed: self.feed.fear_greed(),
            ledger: &self.ledger,
            open_positions: self.positions.open_positions().len(),
            max_positions: self.positions.rules().max_positions,
        };

        let outcome = match self.cascade.evaluate(&ctx, &mut self.rng, &mut self.levels) {
            Verdict::Rejected(reason) => CycleOutcome::Rejected(reason),
            Verdict::ChecklistFailed(checklist) => CycleOutcome::ChecklistFailed {
                score: checklist.score(),
            },
            Verdict::Approved(intent) => {
                let opened = self.feed.instrument(&intent.symbol).and_then(|instrument| {
                    self.positions
                        .open_at(instrument, intent.direction, intent.pattern, intent.size, now)
                });

                match opened {
                    Some(position) => {
                        self.positions.set_checklist_score(position.slot, intent.checklist_score);
                        CycleOutcome::Approved(Position {
                            checklist_score: Some(intent.checklist_score),
                            ..position
                        })
                    }
                    None => {
                        tracing::error!(symbol = %intent.symbol, "Approved trade could not be placed");
                        self.levels.set(Level::Risk, LevelState::Failed);
                        CycleOutcome::Rejected(RejectReason::NoFreeSlot)
                    }
                }
            }
        };

        self.last_outcome = Some(outcome.clone());
        outcome
    }

    fn skip_reason(&mut self, now: DateTime<Utc>) -> Option<SkipReason> {
        if !self.running {
            return Some(SkipReason::NotRunning);
        }

        if !self.ledger.can_trade() {
            return Some(SkipReason::TradingDisabled);
        }

        if self.positions.is_full() {
            return Some(SkipReason::SlotsFull);
        }

        // Slot 2 only opens once slot 1 has banked tp1
        if self.positions.position_in_slot(1).is_some_and(|p| !p.tp1_hit) {
            return Some(SkipReason::AwaitingFirstTarget);
        }

        let min_interval = Duration::seconds(self.cascade.config().min_cycle_interval_secs);
        if let Some(last) = self.last_cycle {
            if now - last < min_interval {
                return Some(SkipReason::Cooldown);
            }
        }

        None
    }

    /// Open a position on `symbol` without running the cascade
    ///
    /// Respects the slot limit only; size comes from the ledger.
    pub fn open_manual(&mut self, symbol: &str, direction: Direction) -> Result<Position> {
        let max_positions = self.positions.rules().max_positions;
        if self.positions.is_full() {
            return Err(EngineError::SlotsFull(max_positions));
        }

        let instrument = self
            .feed
            .instrument(symbol)
            .ok_or_else(|| EngineError::UnknownSymbol(symbol.to_string()))?;
        let size = self.ledger.position_size();

        self.positions
            .open(instrument, direction, Pattern::Manual, size)
            .ok_or(EngineError::SlotsFull(max_positions))
    }

    /// Close the position in `slot` at its current mark; empty slots are a no-op
    pub fn manual_close(&mut self, slot: u8) -> Option<ClosedTrade> {
        let symbol = self.positions.position_in_slot(slot)?.symbol.clone();
        let price = self.feed.price(&symbol)?;
        self.positions
            .close(slot, CloseReason::Manual, price, &mut self.ledger)
    }

    pub fn set_active_symbol(&mut self, symbol: &str) -> Result<()> {
        if self.feed.instrument(symbol).is_none() {
            return Err(EngineError::UnknownSymbol(symbol.to_string()));
        }
        self.active_symbol = symbol.to_string();
        Ok(())
    }

    /// Override an instrument's mark price
    pub fn set_price(&mut self, symbol: &str, price: f64) -> Result<()> {
        self.feed.set_price(symbol, price)
    }

    pub fn set_fear_greed(&mut self, value: f64) {
        self.feed.set_fear_greed(value);
    }

    pub fn reset_daily(&mut self) {
        self.ledger.reset_daily();
    }

    pub fn reset_weekly(&mut self) {
        self.ledger.reset_weekly();
    }

    pub fn reset_monthly(&mut self) {
        self.ledger.reset_monthly();
    }

    pub fn active_symbol(&self) -> &str {
        &self.active_symbol
    }

    pub fn feed(&self) -> &MarketDataFeed {
        &self.feed
    }

    pub fn ledger(&self) -> &RiskLedger {
        &self.ledger
    }

    pub fn open_positions(&self) -> &[Position] {
        self.positions.open_positions()
    }

    pub fn closed_trades(&self) -> &[ClosedTrade] {
        self.positions.closed_trades()
    }

    pub fn levels(&self) -> &AnalysisLevels {
        &self.levels
    }

    pub fn last_outcome(&self) -> Option<&CycleOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn statistics(&self) -> Statistics {
        self.positions.statistics(&self.ledger)
    }

    pub fn risk_summary(&self) -> RiskSummary {
        self.ledger.summary()
    }

    /// Price, indicators and the last `candles` candles for one instrument
    pub fn instrument_view(&self, symbol: &str, candles: usize) -> Option<InstrumentView> {
        let instrument = self.feed.instrument(symbol)?;

        Some(InstrumentView {
            symbol: instrument.symbol.clone(),
            price: instrument.price,
            indicators: self.feed.indicators_for(symbol).cloned(),
            candles: self.feed.history_for(symbol, candles),
        })
    }
}
