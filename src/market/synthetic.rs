use crate::models::{Candle, Instrument};
use chrono::{DateTime, Utc};
use rand::Rng;

/// Random-walk candle generator
///
/// Each step moves the price by a trend bias plus bounded noise. The price
/// is floored at a fraction of the instrument's base price so the walk
/// cannot collapse.
#[derive(Debug, Clone)]
pub struct PriceWalk {
    pub noise_pct: f64,    // ±0.2% per step
    pub wick_pct: f64,     // intrabar high/low offset
    pub floor_ratio: f64,  // never below 70% of base price
    pub volume_low: f64,   // volume drawn from base * [low, high)
    pub volume_high: f64,
}

impl Default for PriceWalk {
    fn default() -> Self {
        Self {
            noise_pct: 0.002,
            wick_pct: 0.001,
            floor_ratio: 0.7,
            volume_low: 0.5,
            volume_high: 1.5,
        }
    }
}

impl PriceWalk {
    /// Next close price for an instrument
    pub fn next_price<R: Rng + ?Sized>(&self, rng: &mut R, instrument: &Instrument, trend_bias: f64) -> f64 {
        let noise = rng.gen_range(-self.noise_pct..self.noise_pct);
        let next = instrument.price * (1.0 + trend_bias + noise);
        next.max(instrument.base_price * self.floor_ratio)
    }

    /// Build a candle closing at `close`, opened at the previous price
    pub fn candle<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        symbol: &str,
        open: f64,
        close: f64,
        base_volume: f64,
        timestamp: DateTime<Utc>,
    ) -> Candle {
        // Wicks extend past both the open and the close
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..self.wick_pct));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..self.wick_pct));
        let volume = base_volume * rng.gen_range(self.volume_low..self.volume_high);

        Candle {
            symbol: symbol.to_string(),
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_step_is_bounded() {
        let walk = PriceWalk::default();
        let mut rng = StdRng::seed_from_u64(42);
        let instrument = Instrument::new("BTC/USDT", "Bitcoin", 45000.0);

        for _ in 0..500 {
            let next = walk.next_price(&mut rng, &instrument, 0.0);
            let change = (next - instrument.price).abs() / instrument.price;
            assert!(change <= 0.002 + 1e-12, "step too large: {}", change);
        }
    }

    #[test]
    fn test_price_never_below_floor() {
        let walk = PriceWalk::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut instrument = Instrument::new("SOL/USDT", "Solana", 100.0);

        // Heavy negative bias drives the walk into the floor
        for _ in 0..2000 {
            instrument.price = walk.next_price(&mut rng, &instrument, -0.01);
            assert!(instrument.price >= 70.0 - 1e-9);
        }
        assert!((instrument.price - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_ohlc_consistency() {
        let walk = PriceWalk::default();
        let mut rng = StdRng::seed_from_u64(42);

        for i in 0..100 {
            let open = 100.0 + i as f64 * 0.1;
            let candle = walk.candle(&mut rng, "ETH/USDT", open, open * 1.001, 1000.0, Utc::now());

            assert!(candle.high >= candle.close, "High should be >= close");
            assert!(candle.high >= candle.open, "High should be >= open");
            assert!(candle.low <= candle.close, "Low should be <= close");
            assert!(candle.low <= candle.open, "Low should be <= open");
            assert!(candle.volume >= 500.0 && candle.volume < 1500.0);
        }
    }

    #[test]
    fn test_open_is_previous_close_even_on_large_gaps() {
        let walk = PriceWalk::default();
        let mut rng = StdRng::seed_from_u64(3);

        // A 5% gap is far outside the wick range
        for (open, close) in [(100.0, 105.0), (105.0, 100.0)] {
            let candle = walk.candle(&mut rng, "SOL/USDT", open, close, 1000.0, Utc::now());

            assert_eq!(candle.open, open);
            assert!(candle.high >= open.max(close));
            assert!(candle.low <= open.min(close));
        }
    }
}
