use super::{CandleBuffer, PriceWalk};
use crate::error::{EngineError, Result};
use crate::indicators::compute_snapshot;
use crate::models::{Candle, IndicatorSnapshot, Instrument};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Static description of a simulated instrument
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstrumentSpec {
    pub symbol: String,
    pub name: String,
    pub base_price: f64,
    pub trend_bias: f64,  // per-step drift as a fraction of price
    pub base_volume: f64,
}

impl InstrumentSpec {
    pub fn new(symbol: &str, name: &str, base_price: f64, trend_bias: f64, base_volume: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            base_price,
            trend_bias,
            base_volume,
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("BTC/USDT", "Bitcoin", 45_000.0, 0.0001, 1_500.0),
            Self::new("ETH/USDT", "Ethereum", 2_500.0, 0.0001, 12_000.0),
            Self::new("SOL/USDT", "Solana", 100.0, 0.00015, 250_000.0),
        ]
    }
}

/// Synthetic market data feed
///
/// Owns the instruments, their rolling candle windows and the latest
/// indicator snapshots. Also carries a fear/greed index that drifts with
/// every advance.
pub struct MarketDataFeed {
    instruments: Vec<Instrument>,
    specs: HashMap<String, InstrumentSpec>,
    buffer: CandleBuffer,
    snapshots: HashMap<String, IndicatorSnapshot>,
    walk: PriceWalk,
    rng: StdRng,
    fear_greed: f64,
}

impl MarketDataFeed {
    /// Create a feed with a seed for reproducibility
    pub fn new(specs: &[InstrumentSpec], seed: u64) -> Self {
        let instruments = specs
            .iter()
            .map(|s| Instrument::new(s.symbol.clone(), s.name.clone(), s.base_price))
            .collect();

        Self {
            instruments,
            specs: specs.iter().map(|s| (s.symbol.clone(), s.clone())).collect(),
            buffer: CandleBuffer::default(),
            snapshots: HashMap::new(),
            walk: PriceWalk::default(),
            rng: StdRng::seed_from_u64(seed),
            fear_greed: 50.0,
        }
    }

    /// Advance every instrument by one candle (live clock)
    pub fn advance(&mut self) {
        self.advance_at(Utc::now())
    }

    /// Advance every instrument by one candle stamped at `timestamp`
    pub fn advance_at(&mut self, timestamp: DateTime<Utc>) {
        for instrument in self.instruments.iter_mut() {
            let Some(spec) = self.specs.get(&instrument.symbol) else {
                continue;
            };

            let open = instrument.price;
            let close = self.walk.next_price(&mut self.rng, instrument, spec.trend_bias);
            let candle = self.walk.candle(
                &mut self.rng,
                &instrument.symbol,
                open,
                close,
                spec.base_volume,
                timestamp,
            );

            instrument.price = close;
            self.buffer.add_candle(candle);

            let history = self.buffer.get_candles(&instrument.symbol);
            match compute_snapshot(&history) {
                Some(snapshot) => {
                    self.snapshots.insert(instrument.symbol.clone(), snapshot);
                }
                None => {
                    self.snapshots.remove(&instrument.symbol);
                }
            }
        }

        self.fear_greed = (self.fear_greed + self.rng.gen_range(-3.0..3.0)).clamp(0.0, 100.0);
    }

    /// Generate `count` candles ending at `end`, spaced `interval` apart
    pub fn warm_up(&mut self, count: usize, end: DateTime<Utc>, interval: Duration) {
        let mut stamps: Vec<DateTime<Utc>> =
            std::iter::successors(Some(end), |t| t.checked_sub_signed(interval))
                .take(count)
                .collect();
        stamps.reverse();

        for timestamp in stamps {
            self.advance_at(timestamp);
        }

        tracing::debug!(candles = count, "Warmed up market history");
    }

    /// Latest indicator snapshot, None until 21 candles exist
    pub fn indicators_for(&self, symbol: &str) -> Option<&IndicatorSnapshot> {
        self.snapshots.get(symbol)
    }

    /// Most recent `n` candles, oldest first
    pub fn history_for(&self, symbol: &str, n: usize) -> Vec<Candle> {
        self.buffer.get_recent_candles(symbol, n)
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn instrument(&self, symbol: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.symbol == symbol)
    }

    pub fn price(&self, symbol: &str) -> Option<f64> {
        self.instrument(symbol).map(|i| i.price)
    }

    /// Current mark price of every instrument
    pub fn prices(&self) -> HashMap<String, f64> {
        self.instruments
            .iter()
            .map(|i| (i.symbol.clone(), i.price))
            .collect()
    }

    /// Override the mark price of an instrument
    ///
    /// Candle history and indicators are left untouched.
    pub fn set_price(&mut self, symbol: &str, price: f64) -> Result<()> {
        let instrument = self
            .instruments
            .iter_mut()
            .find(|i| i.symbol == symbol)
            .ok_or_else(|| EngineError::UnknownSymbol(symbol.to_string()))?;

        instrument.price = price;
        Ok(())
    }

    pub fn fear_greed(&self) -> f64 {
        self.fear_greed
    }

    pub fn set_fear_greed(&mut self, value: f64) {
        self.fear_greed = value.clamp(0.0, 100.0);
    }
}
