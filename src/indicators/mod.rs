// Technical indicators module
// Implements RSI, SMA, volatility and volume averages for the indicator snapshot

pub mod moving_average;
pub mod rsi;
pub mod volatility;
pub mod volume;

pub use moving_average::calculate_sma;
pub use rsi::calculate_rsi;
pub use volatility::calculate_volatility;
pub use volume::calculate_average_volume;

use crate::models::{Candle, IndicatorSnapshot, Trend};

pub const RSI_PERIOD: usize = 14;
pub const SHORT_MA_PERIOD: usize = 9;
pub const LONG_MA_PERIOD: usize = 21;
pub const VOLUME_PERIOD: usize = 20;
pub const VOLATILITY_PERIOD: usize = 20;

/// Minimum history before a snapshot is defined
pub const MIN_CANDLES: usize = LONG_MA_PERIOD;

/// Recompute the full indicator snapshot from a candle window
///
/// Returns None until `MIN_CANDLES` candles are available.
pub fn compute_snapshot(candles: &[Candle]) -> Option<IndicatorSnapshot> {
    if candles.len() < MIN_CANDLES {
        return None;
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    let rsi = calculate_rsi(&closes, RSI_PERIOD)?;
    let ma9 = calculate_sma(&closes, SHORT_MA_PERIOD)?;
    let ma21 = calculate_sma(&closes, LONG_MA_PERIOD)?;
    let avg_volume = calculate_average_volume(candles, VOLUME_PERIOD)?;
    let volatility = calculate_volatility(&closes, VOLATILITY_PERIOD)?;
    let current_volume = candles.last()?.volume;

    let trend = if ma9 > ma21 {
        Trend::Bullish
    } else {
        Trend::Bearish
    };

    Some(IndicatorSnapshot {
        rsi,
        ma9,
        ma21,
        avg_volume,
        current_volume,
        volatility,
        trend,
    })
}
