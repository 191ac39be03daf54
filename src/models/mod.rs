use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tradable instrument in the simulated market
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instrument {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub base_price: f64, // Reference price, the walk never drops below 70% of it
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, base_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            price: base_price,
            base_price,
        }
    }
}

/// OHLCV candlestick data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Trend label derived from the MA(9)/MA(21) relationship
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
}

/// Trade direction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Direction that follows a trend label
    pub fn from_trend(trend: Trend) -> Self {
        match trend {
            Trend::Bullish => Direction::Long,
            Trend::Bearish => Direction::Short,
        }
    }

    /// +1.0 for longs, -1.0 for shorts
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// Chart pattern labels the structural analysis can recognise
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Pattern {
    BullFlag,
    BearFlag,
    AscendingTriangle,
    DescendingTriangle,
    DoubleBottom,
    DoubleTop,
    Breakout,
    Pullback,
    Manual, // Opened by hand, no pattern analysis
}

impl Pattern {
    /// Patterns the structural analysis draws from
    pub const DETECTABLE: [Pattern; 8] = [
        Pattern::BullFlag,
        Pattern::BearFlag,
        Pattern::AscendingTriangle,
        Pattern::DescendingTriangle,
        Pattern::DoubleBottom,
        Pattern::DoubleTop,
        Pattern::Breakout,
        Pattern::Pullback,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Pattern::BullFlag => "Bull Flag",
            Pattern::BearFlag => "Bear Flag",
            Pattern::AscendingTriangle => "Ascending Triangle",
            Pattern::DescendingTriangle => "Descending Triangle",
            Pattern::DoubleBottom => "Double Bottom",
            Pattern::DoubleTop => "Double Top",
            Pattern::Breakout => "Breakout",
            Pattern::Pullback => "Pullback",
            Pattern::Manual => "Manual",
        }
    }
}

/// Indicator values for one instrument, recomputed from the candle window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub ma9: f64,
    pub ma21: f64,
    pub avg_volume: f64,
    pub current_volume: f64,
    pub volatility: f64, // stddev / mean of last 20 closes, in percent
    pub trend: Trend,
}

impl IndicatorSnapshot {
    /// Current volume as a multiple of the 20-candle average
    pub fn volume_ratio(&self) -> f64 {
        if self.avg_volume > 0.0 {
            self.current_volume / self.avg_volume
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_creation() {
        let instrument = Instrument::new("BTC/USDT", "Bitcoin", 45000.0);

        assert_eq!(instrument.symbol, "BTC/USDT");
        assert_eq!(instrument.price, 45000.0);
        assert_eq!(instrument.base_price, 45000.0);
    }

    #[test]
    fn test_direction_follows_trend() {
        assert_eq!(Direction::from_trend(Trend::Bullish), Direction::Long);
        assert_eq!(Direction::from_trend(Trend::Bearish), Direction::Short);
        assert_eq!(Direction::Short.sign(), -1.0);
    }

    #[test]
    fn test_volume_ratio_handles_zero_average() {
        let snapshot = IndicatorSnapshot {
            rsi: 50.0,
            ma9: 100.0,
            ma21: 99.0,
            avg_volume: 0.0,
            current_volume: 10.0,
            volatility: 0.5,
            trend: Trend::Bullish,
        };

        assert_eq!(snapshot.volume_ratio(), 0.0);
    }
}
