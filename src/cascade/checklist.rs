//! 23-point confirmation checklist.
//!
//! Runs only after all four levels pass. Several items restate level 1 and
//! level 3 conditions; a cascade that passed every level can still be
//! blocked here.

use rand::Rng;
use serde::Serialize;

use super::levels::{RiskAssessment, StructureAnalysis};
use super::{CascadeConfig, MarketContext};
use crate::models::Direction;

pub const CHECKLIST_ITEMS: usize = 23;

const TIMEFRAMES: [&str; 4] = [
    "1m timeframe aligned",
    "5m timeframe aligned",
    "15m timeframe aligned",
    "1h timeframe aligned",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChecklistCategory {
    Safety,
    MarketStructure,
    PatternEntry,
    RiskManagement,
    Psychology,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistItem {
    pub category: ChecklistCategory,
    pub name: &'static str,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Checklist {
    items: Vec<ChecklistItem>,
}

impl Checklist {
    /// Evaluate every item
    ///
    /// Random items draw in order: four timeframe checks, pattern
    /// confirmation, session activity.
    pub fn evaluate<R: Rng + ?Sized>(
        ctx: &MarketContext<'_>,
        config: &CascadeConfig,
        structure: &StructureAnalysis,
        risk: &RiskAssessment,
        rng: &mut R,
    ) -> Self {
        use ChecklistCategory::*;

        let mut items = Vec::with_capacity(CHECKLIST_ITEMS);
        let mut push = |category, name, passed| {
            items.push(ChecklistItem {
                category,
                name,
                passed,
            })
        };

        let indicators = ctx.indicators;
        let limits = ctx.ledger.limits();

        // Safety
        push(
            Safety,
            "RSI within safe band",
            (config.rsi_min..=config.rsi_max).contains(&indicators.rsi),
        );
        push(
            Safety,
            "Volume above minimum",
            indicators.volume_ratio() >= config.min_volume_ratio,
        );
        push(
            Safety,
            "Loss streak below limit",
            ctx.ledger.consecutive_losses() < limits.max_consecutive_losses,
        );
        push(
            Safety,
            "Daily drawdown within limit",
            ctx.ledger.daily_drawdown() > limits.daily_loss_limit_pct,
        );
        push(
            Safety,
            "Monthly drawdown within alert",
            ctx.ledger.monthly_drawdown() > limits.monthly_alert_pct,
        );

        // Market structure
        push(
            MarketStructure,
            "Direction matches trend",
            structure.direction == Direction::from_trend(indicators.trend),
        );
        let price_side = match structure.direction {
            Direction::Long => ctx.price > indicators.ma21,
            Direction::Short => ctx.price < indicators.ma21,
        };
        push(MarketStructure, "Price on trend side of MA21", price_side);
        push(
            MarketStructure,
            "Volatility in normal range",
            indicators.volatility <= config.max_volatility_pct,
        );
        for name in TIMEFRAMES {
            push(MarketStructure, name, rng.gen::<f64>() >= config.timeframe_pass);
        }

        // Pattern / entry
        push(
            PatternEntry,
            "Pattern confirmed",
            rng.gen::<f64>() >= config.pattern_confirm_pass,
        );
        push(
            PatternEntry,
            "Entry signal quality",
            risk.entry_quality >= config.min_entry_quality,
        );
        let momentum_room = match structure.direction {
            Direction::Long => indicators.rsi < config.rsi_long_ceiling,
            Direction::Short => indicators.rsi > config.rsi_short_floor,
        };
        push(PatternEntry, "Momentum has room", momentum_room);
        push(
            PatternEntry,
            "Structure alignment confirmed",
            structure.alignment > config.alignment_threshold,
        );

        // Risk management
        push(
            RiskManagement,
            "Risk/reward acceptable",
            risk.risk_reward >= config.min_risk_reward,
        );
        let budget = ctx.ledger.current_balance() * limits.base_risk_pct / 100.0;
        push(
            RiskManagement,
            "Size within risk budget",
            risk.size > 0.0 && risk.size <= budget,
        );
        push(
            RiskManagement,
            "Position slot available",
            ctx.open_positions < ctx.max_positions,
        );
        push(
            RiskManagement,
            "Weekly drawdown acceptable",
            ctx.ledger.weekly_drawdown() > limits.weekly_reduction_pct,
        );

        // Psychology / session
        push(
            Psychology,
            "Sentiment not extreme",
            (config.fear_greed_min..=config.fear_greed_max).contains(&ctx.fear_greed),
        );
        push(
            Psychology,
            "Session active",
            rng.gen::<f64>() >= config.session_pass,
        );
        push(
            Psychology,
            "Not trading on tilt",
            ctx.ledger.consecutive_losses() < 2,
        );

        Self { items }
    }

    pub fn items(&self) -> &[ChecklistItem] {
        &self.items
    }

    pub fn score(&self) -> u32 {
        self.items.iter().filter(|i| i.passed).count() as u32
    }

    pub fn max_score(&self) -> u32 {
        self.items.len() as u32
    }

    pub fn passes(&self, threshold: u32) -> bool {
        self.score() >= threshold
    }

    /// Names of the items that failed
    pub fn failures(&self) -> Vec<&'static str> {
        self.items
            .iter()
            .filter(|i| !i.passed)
            .map(|i| i.name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::draws::ScriptedDraws;
    use crate::models::{IndicatorSnapshot, Pattern, Trend};
    use crate::risk::{RiskLedger, RiskLimits};

    fn snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            rsi: 55.0,
            ma9: 101.0,
            ma21: 100.0,
            avg_volume: 1000.0,
            current_volume: 1200.0,
            volatility: 0.4,
            trend: Trend::Bullish,
        }
    }

    fn structure() -> StructureAnalysis {
        StructureAnalysis {
            direction: Direction::Long,
            pattern: Pattern::BullFlag,
            alignment: 0.8,
        }
    }

    fn risk() -> RiskAssessment {
        RiskAssessment {
            risk_reward: 2.5,
            entry_quality: 0.8,
            size: 50.0,
        }
    }

    fn evaluate(draw: f64, indicators: &IndicatorSnapshot, ledger: &RiskLedger) -> Checklist {
        let ctx = MarketContext {
            symbol: "BTC/USDT",
            price: 102.0,
            indicators,
            fear_greed: 50.0,
            ledger,
            open_positions: 0,
            max_positions: 2,
        };
        let risk = RiskAssessment {
            size: ledger.position_size(),
            ..risk()
        };
        let mut draws = ScriptedDraws::constant(draw);
        Checklist::evaluate(&ctx, &CascadeConfig::default(), &structure(), &risk, &mut draws)
    }

    #[test]
    fn test_has_23_items() {
        let ledger = RiskLedger::new(10000.0, RiskLimits::default());
        let checklist = evaluate(0.9, &snapshot(), &ledger);

        assert_eq!(checklist.items().len(), CHECKLIST_ITEMS);
        assert_eq!(checklist.max_score(), 23);
        let timeframe_items = checklist
            .items()
            .iter()
            .filter(|i| i.name.contains("timeframe"))
            .count();
        assert_eq!(timeframe_items, 4);
    }

    #[test]
    fn test_perfect_score() {
        let ledger = RiskLedger::new(10000.0, RiskLimits::default());
        let checklist = evaluate(0.9, &snapshot(), &ledger);

        assert_eq!(checklist.score(), 23);
        assert!(checklist.passes(20));
        assert!(checklist.failures().is_empty());
    }

    #[test]
    fn test_failed_draws_block_even_with_clean_conditions() {
        let ledger = RiskLedger::new(10000.0, RiskLimits::default());
        let checklist = evaluate(0.0, &snapshot(), &ledger);

        // Six random confirmations fail, 17 deterministic items pass
        assert_eq!(checklist.score(), 17);
        assert!(!checklist.passes(20));
        assert!(checklist.failures().contains(&"Session active"));
    }

    #[test]
    fn test_deterministic_items_track_market() {
        let ledger = RiskLedger::new(10000.0, RiskLimits::default());
        let stretched = IndicatorSnapshot {
            rsi: 68.0,
            volatility: 4.0,
            ma21: 103.0,
            ..snapshot()
        };
        let checklist = evaluate(0.9, &stretched, &ledger);

        let failures = checklist.failures();
        assert_eq!(checklist.score(), 20);
        assert!(failures.contains(&"Momentum has room"));
        assert!(failures.contains(&"Volatility in normal range"));
        assert!(failures.contains(&"Price on trend side of MA21"));
    }

    #[test]
    fn test_tilt_check() {
        let mut ledger = RiskLedger::new(10000.0, RiskLimits::default());
        ledger.record_trade(-5.0);
        ledger.record_trade(-5.0);

        let checklist = evaluate(0.9, &snapshot(), &ledger);
        assert_eq!(checklist.failures(), vec!["Not trading on tilt"]);
    }
}
