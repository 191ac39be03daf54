use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::statistics::Statistics;
use crate::models::{Direction, Instrument, Pattern};
use crate::risk::RiskLedger;

/// Entry/exit geometry, all values in percent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExitRules {
    pub slippage_pct: f64,
    pub stop_loss_pct: f64,
    pub tp1_pct: f64,
    pub tp2_pct: f64,
    pub tp1_close_fraction: f64, // share of the position realized at tp1
    pub max_positions: usize,
}

impl Default for ExitRules {
    fn default() -> Self {
        Self {
            slippage_pct: 0.05,
            stop_loss_pct: 1.0,
            tp1_pct: 0.5,
            tp2_pct: 1.2,
            tp1_close_fraction: 0.5,
            max_positions: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    #[serde(rename = "TP2")]
    Tp2,
    #[serde(rename = "SL")]
    StopLoss,
    #[serde(rename = "MANUAL")]
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub id: Uuid,
    pub slot: u8,
    pub symbol: String,
    pub direction: Direction,
    pub pattern: Pattern,
    pub entry_price: f64,  // after slippage
    pub stop_loss: f64,    // moves to entry once tp1 is hit
    pub tp1: f64,
    pub tp2: f64,
    pub size: f64,         // remaining notional
    pub initial_size: f64,
    pub tp1_hit: bool,
    pub opened_at: DateTime<Utc>,
    pub pnl: f64,          // live, on the remaining size
    pub partial_pnl: f64,  // realized at tp1
    pub checklist_score: Option<u32>,
}

impl Position {
    /// Signed fractional move from entry, positive when in profit
    pub fn move_fraction(&self, price: f64) -> f64 {
        self.direction.sign() * (price - self.entry_price) / self.entry_price
    }

    fn reached(&self, price: f64, target: f64) -> bool {
        match self.direction {
            Direction::Long => price >= target,
            Direction::Short => price <= target,
        }
    }

    fn stopped(&self, price: f64) -> bool {
        match self.direction {
            Direction::Long => price <= self.stop_loss,
            Direction::Short => price >= self.stop_loss,
        }
    }
}

/// Immutable record of a closed position
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClosedTrade {
    #[serde(flatten)]
    pub position: Position,
    pub close_price: f64,
    pub closed_at: DateTime<Utc>,
    pub reason: CloseReason,
    pub pnl: f64, // closing leg, as committed to the ledger
}

impl ClosedTrade {
    /// Closing leg plus any profit realized at tp1
    pub fn total_pnl(&self) -> f64 {
        self.pnl + self.position.partial_pnl
    }
}

pub struct PositionManager {
    rules: ExitRules,
    positions: Vec<Position>,
    history: Vec<ClosedTrade>,
}

impl PositionManager {
    pub fn new(rules: ExitRules) -> Self {
        Self {
            rules,
            positions: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn rules(&self) -> &ExitRules {
        &self.rules
    }

    /// Open positions ordered by slot
    pub fn open_positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn position_in_slot(&self, slot: u8) -> Option<&Position> {
        self.positions.iter().find(|p| p.slot == slot)
    }

    pub fn closed_trades(&self) -> &[ClosedTrade] {
        &self.history
    }

    pub fn is_full(&self) -> bool {
        self.positions.len() >= self.rules.max_positions
    }

    /// Lowest unoccupied slot index, starting at 1
    pub fn next_free_slot(&self) -> Option<u8> {
        (1..=self.rules.max_positions as u8).find(|slot| self.position_in_slot(*slot).is_none())
    }

    /// Open a position at the instrument's current price (live clock)
    pub fn open(
        &mut self,
        instrument: &Instrument,
        direction: Direction,
        pattern: Pattern,
        size: f64,
    ) -> Option<Position> {
        self.open_at(instrument, direction, pattern, size, Utc::now())
    }

    /// Open a position with an explicit timestamp
    ///
    /// Slot limits are the caller's precondition; this only returns None
    /// when no slot index is left to assign.
    pub fn open_at(
        &mut self,
        instrument: &Instrument,
        direction: Direction,
        pattern: Pattern,
        size: f64,
        timestamp: DateTime<Utc>,
    ) -> Option<Position> {
        let slot = self.next_free_slot()?;
        let sign = direction.sign();

        // Slippage always fills against us
        let entry_price = instrument.price * (1.0 + sign * self.rules.slippage_pct / 100.0);
        let stop_loss = entry_price * (1.0 - sign * self.rules.stop_loss_pct / 100.0);
        let tp1 = entry_price * (1.0 + sign * self.rules.tp1_pct / 100.0);
        let tp2 = entry_price * (1.0 + sign * self.rules.tp2_pct / 100.0);

        let position = Position {
            id: Uuid::new_v4(),
            slot,
            symbol: instrument.symbol.clone(),
            direction,
            pattern,
            entry_price,
            stop_loss,
            tp1,
            tp2,
            size,
            initial_size: size,
            tp1_hit: false,
            opened_at: timestamp,
            pnl: 0.0,
            partial_pnl: 0.0,
            checklist_score: None,
        };

        tracing::info!(
            slot,
            symbol = %position.symbol,
            direction = %direction,
            pattern = pattern.label(),
            entry = entry_price,
            size,
            "Opened position"
        );

        self.positions.push(position.clone());
        self.positions.sort_by_key(|p| p.slot);
        Some(position)
    }

    /// Attach the approving checklist score to an open position
    pub fn set_checklist_score(&mut self, slot: u8, score: u32) {
        if let Some(position) = self.positions.iter_mut().find(|p| p.slot == slot) {
            position.checklist_score = Some(score);
        }
    }

    /// Mark open positions to market and apply exit rules (live clock)
    pub fn tick(&mut self, prices: &HashMap<String, f64>, ledger: &mut RiskLedger) -> Vec<ClosedTrade> {
        self.tick_at(prices, ledger, Utc::now())
    }

    /// Mark open positions to market and apply exit rules
    ///
    /// Order per position: tp1 partial (stop to breakeven), then tp2 full
    /// close, otherwise stop-loss close.
    pub fn tick_at(
        &mut self,
        prices: &HashMap<String, f64>,
        ledger: &mut RiskLedger,
        timestamp: DateTime<Utc>,
    ) -> Vec<ClosedTrade> {
        let mut to_close = Vec::new();

        for position in self.positions.iter_mut() {
            let Some(&price) = prices.get(&position.symbol) else {
                continue;
            };

            if !position.tp1_hit && position.reached(price, position.tp1) {
                let closed_size = position.initial_size * self.rules.tp1_close_fraction;
                let partial = closed_size * self.rules.tp1_pct / 100.0;

                ledger.credit_partial(partial);
                position.partial_pnl += partial;
                position.size -= closed_size;
                position.tp1_hit = true;
                position.stop_loss = position.entry_price;

                tracing::info!(
                    slot = position.slot,
                    symbol = %position.symbol,
                    partial,
                    "TP1 hit, stop moved to breakeven"
                );
            }

            position.pnl = position.size * position.move_fraction(price);

            if position.reached(price, position.tp2) {
                to_close.push((position.slot, CloseReason::Tp2, price));
            } else if position.stopped(price) {
                to_close.push((position.slot, CloseReason::StopLoss, price));
            }
        }

        to_close
            .into_iter()
            .filter_map(|(slot, reason, price)| self.close_at(slot, reason, price, ledger, timestamp))
            .collect()
    }

    /// Close the position in `slot` (live clock)
    pub fn close(
        &mut self,
        slot: u8,
        reason: CloseReason,
        price: f64,
        ledger: &mut RiskLedger,
    ) -> Option<ClosedTrade> {
        self.close_at(slot, reason, price, ledger, Utc::now())
    }

    /// Close the position in `slot` with an explicit timestamp
    ///
    /// TP2 realizes the fixed tp2 tier on the remaining size; stop-loss and
    /// manual closes realize the mark-to-market move. Empty slots are a no-op.
    pub fn close_at(
        &mut self,
        slot: u8,
        reason: CloseReason,
        price: f64,
        ledger: &mut RiskLedger,
        timestamp: DateTime<Utc>,
    ) -> Option<ClosedTrade> {
        let index = self.positions.iter().position(|p| p.slot == slot)?;
        let mut position = self.positions.remove(index);

        let pnl = match reason {
            CloseReason::Tp2 => position.size * self.rules.tp2_pct / 100.0,
            CloseReason::StopLoss | CloseReason::Manual => {
                position.size * position.move_fraction(price)
            }
        };
        position.pnl = pnl;

        ledger.record_trade(pnl);

        let trade = ClosedTrade {
            position,
            close_price: price,
            closed_at: timestamp,
            reason,
            pnl,
        };

        tracing::info!(
            slot,
            symbol = %trade.position.symbol,
            ?reason,
            price,
            pnl,
            "Closed position"
        );

        self.history.push(trade.clone());
        Some(trade)
    }

    /// Aggregate statistics over the closed-trade history
    pub fn statistics(&self, ledger: &RiskLedger) -> Statistics {
        Statistics::from_trades(&self.history, ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskLimits;
    use proptest::prelude::*;

    fn setup() -> (PositionManager, RiskLedger, Instrument) {
        (
            PositionManager::new(ExitRules::default()),
            RiskLedger::new(10000.0, RiskLimits::default()),
            Instrument::new("BTC/USDT", "Bitcoin", 45000.0),
        )
    }

    fn prices(symbol: &str, price: f64) -> HashMap<String, f64> {
        HashMap::from([(symbol.to_string(), price)])
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{} != {}", a, b);
    }

    #[test]
    fn test_open_long_levels() {
        let (mut pm, _, btc) = setup();
        let position = pm.open(&btc, Direction::Long, Pattern::BullFlag, 50.0).unwrap();

        assert_eq!(position.slot, 1);
        assert_close(position.entry_price, 45000.0 * 1.0005);
        assert_close(position.stop_loss, position.entry_price * 0.99);
        assert_close(position.tp1, position.entry_price * 1.005);
        assert_close(position.tp2, position.entry_price * 1.012);
        assert!(position.stop_loss < position.entry_price);
        assert!(position.entry_price < position.tp1);
        assert!(position.tp1 < position.tp2);
    }

    #[test]
    fn test_open_short_levels_are_mirrored() {
        let (mut pm, _, btc) = setup();
        let position = pm.open(&btc, Direction::Short, Pattern::BearFlag, 50.0).unwrap();

        // Short fills lower than the mark
        assert_close(position.entry_price, 45000.0 * 0.9995);
        assert!(position.stop_loss > position.entry_price);
        assert!(position.entry_price > position.tp1);
        assert!(position.tp1 > position.tp2);
    }

    #[test]
    fn test_slots_are_assigned_lowest_first() {
        let (mut pm, mut ledger, btc) = setup();
        pm.open(&btc, Direction::Long, Pattern::Breakout, 50.0).unwrap();
        pm.open(&btc, Direction::Long, Pattern::Breakout, 50.0).unwrap();
        assert!(pm.is_full());
        assert!(pm.open(&btc, Direction::Long, Pattern::Breakout, 50.0).is_none());

        pm.close(1, CloseReason::Manual, 45000.0, &mut ledger).unwrap();
        assert_eq!(pm.next_free_slot(), Some(1));

        let reopened = pm.open(&btc, Direction::Short, Pattern::Pullback, 50.0).unwrap();
        assert_eq!(reopened.slot, 1);
        assert_eq!(pm.open_positions()[0].slot, 1);
        assert_eq!(pm.open_positions()[1].slot, 2);
    }

    #[test]
    fn test_live_pnl() {
        let (mut pm, mut ledger, btc) = setup();
        let position = pm.open(&btc, Direction::Short, Pattern::DoubleTop, 100.0).unwrap();

        let price = position.entry_price * 0.998; // +0.2% for a short
        let closed = pm.tick(&prices("BTC/USDT", price), &mut ledger);

        assert!(closed.is_empty());
        assert_close(pm.open_positions()[0].pnl, 0.2);
    }

    #[test]
    fn test_tp1_moves_stop_to_breakeven() {
        let (mut pm, mut ledger, btc) = setup();
        let position = pm.open(&btc, Direction::Long, Pattern::BullFlag, 100.0).unwrap();

        let closed = pm.tick(&prices("BTC/USDT", position.tp1 + 1.0), &mut ledger);
        assert!(closed.is_empty());

        let position = &pm.open_positions()[0];
        assert!(position.tp1_hit);
        assert_eq!(position.stop_loss, position.entry_price);
        assert_close(position.size, 50.0);
        assert_close(position.partial_pnl, 0.25); // 50 * 0.5%
        assert_close(ledger.current_balance(), 10000.25);
        assert_eq!(ledger.consecutive_losses(), 0);
    }

    #[test]
    fn test_tp1_only_fires_once() {
        let (mut pm, mut ledger, btc) = setup();
        let position = pm.open(&btc, Direction::Long, Pattern::BullFlag, 100.0).unwrap();

        let price = position.tp1 + 1.0;
        pm.tick(&prices("BTC/USDT", price), &mut ledger);
        pm.tick(&prices("BTC/USDT", price), &mut ledger);

        assert_close(pm.open_positions()[0].partial_pnl, 0.25);
        assert_close(ledger.current_balance(), 10000.25);
    }

    #[test]
    fn test_tp2_closes_long() {
        let (mut pm, mut ledger, btc) = setup();
        let position = pm.open(&btc, Direction::Long, Pattern::Breakout, 100.0).unwrap();

        let closed = pm.tick(&prices("BTC/USDT", position.tp2 + 1.0), &mut ledger);

        assert_eq!(closed.len(), 1);
        assert!(pm.open_positions().is_empty());
        assert_eq!(pm.closed_trades().len(), 1);

        let trade = &pm.closed_trades()[0];
        assert_eq!(trade.reason, CloseReason::Tp2);
        assert!(trade.position.tp1_hit);
        assert_close(trade.pnl, 50.0 * 0.012); // remaining half at tp2 tier
        assert_close(trade.total_pnl(), 0.25 + 0.6);
        assert_close(ledger.current_balance(), 10000.85);
    }

    #[test]
    fn test_tp2_closes_short() {
        let (mut pm, mut ledger, btc) = setup();
        let position = pm.open(&btc, Direction::Short, Pattern::BearFlag, 100.0).unwrap();

        pm.tick(&prices("BTC/USDT", position.tp2 - 1.0), &mut ledger);

        assert!(pm.open_positions().is_empty());
        assert_eq!(pm.closed_trades().len(), 1);
        assert_eq!(pm.closed_trades()[0].reason, CloseReason::Tp2);
    }

    #[test]
    fn test_stop_loss_closes_at_market() {
        let (mut pm, mut ledger, btc) = setup();
        let position = pm.open(&btc, Direction::Long, Pattern::Pullback, 100.0).unwrap();

        let price = position.entry_price * 0.985; // beyond the 1% stop
        let closed = pm.tick(&prices("BTC/USDT", price), &mut ledger);

        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].reason, CloseReason::StopLoss);
        assert_close(closed[0].pnl, -1.5);
        assert_eq!(ledger.consecutive_losses(), 1);
    }

    #[test]
    fn test_breakeven_stop_after_tp1() {
        let (mut pm, mut ledger, btc) = setup();
        let position = pm.open(&btc, Direction::Long, Pattern::BullFlag, 100.0).unwrap();

        pm.tick(&prices("BTC/USDT", position.tp1 + 1.0), &mut ledger);
        let closed = pm.tick(&prices("BTC/USDT", position.entry_price), &mut ledger);

        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].reason, CloseReason::StopLoss);
        assert_close(closed[0].pnl, 0.0);
        assert!(closed[0].total_pnl() > 0.0);
    }

    #[test]
    fn test_manual_close_empty_slot_is_noop() {
        let (mut pm, mut ledger, _) = setup();
        assert!(pm.close(2, CloseReason::Manual, 100.0, &mut ledger).is_none());
        assert!(pm.closed_trades().is_empty());
        assert_eq!(ledger.current_balance(), 10000.0);
    }

    #[test]
    fn test_prices_for_other_symbols_are_ignored() {
        let (mut pm, mut ledger, btc) = setup();
        pm.open(&btc, Direction::Long, Pattern::BullFlag, 100.0).unwrap();

        let closed = pm.tick(&prices("ETH/USDT", 1.0), &mut ledger);
        assert!(closed.is_empty());
        assert_eq!(pm.open_positions().len(), 1);
    }

    proptest! {
        #[test]
        fn levels_are_strictly_ordered(price in 0.01f64..1_000_000.0, long in any::<bool>()) {
            let mut pm = PositionManager::new(ExitRules::default());
            let instrument = Instrument::new("SOL/USDT", "Solana", price);
            let direction = if long { Direction::Long } else { Direction::Short };

            let p = pm.open(&instrument, direction, Pattern::Breakout, 50.0).unwrap();

            match direction {
                Direction::Long => {
                    prop_assert!(p.stop_loss < p.entry_price);
                    prop_assert!(p.entry_price < p.tp1);
                    prop_assert!(p.tp1 < p.tp2);
                    prop_assert!(p.entry_price > price);
                }
                Direction::Short => {
                    prop_assert!(p.stop_loss > p.entry_price);
                    prop_assert!(p.entry_price > p.tp1);
                    prop_assert!(p.tp1 > p.tp2);
                    prop_assert!(p.entry_price < price);
                }
            }
        }
    }
}
