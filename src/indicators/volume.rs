/// Volume analysis
use crate::models::Candle;

/// Calculate average volume over the most recent `period` candles
pub fn calculate_average_volume(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period {
        return None;
    }

    let recent_candles = &candles[candles.len() - period..];
    let total_volume: f64 = recent_candles.iter().map(|c| c.volume).sum();
    Some(total_volume / period as f64)
}
