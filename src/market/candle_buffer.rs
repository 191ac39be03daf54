use crate::models::Candle;
use std::collections::{HashMap, VecDeque};

/// Default rolling window per instrument
pub const DEFAULT_CAPACITY: usize = 100;

/// In-memory buffer for candle data
///
/// Maintains a rolling window of candles for each symbol. The oldest
/// candle is evicted once the window exceeds `max_candles`.
#[derive(Debug, Clone)]
pub struct CandleBuffer {
    data: HashMap<String, VecDeque<Candle>>,
    max_candles: usize,
}

impl CandleBuffer {
    /// Create a new candle buffer
    ///
    /// # Arguments
    /// * `max_candles` - Maximum number of candles to keep per symbol
    pub fn new(max_candles: usize) -> Self {
        Self {
            data: HashMap::new(),
            max_candles,
        }
    }

    /// Add a candle for its symbol, evicting the oldest when full
    pub fn add_candle(&mut self, candle: Candle) {
        let max_candles = self.max_candles;
        let candles = self
            .data
            .entry(candle.symbol.clone())
            .or_insert_with(|| VecDeque::with_capacity(max_candles + 1));

        candles.push_back(candle);

        while candles.len() > max_candles {
            candles.pop_front();
        }
    }

    /// Get all candles for a symbol, oldest first
    pub fn get_candles(&self, symbol: &str) -> Vec<Candle> {
        self.data
            .get(symbol)
            .map(|deque| deque.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Get the N most recent candles for a symbol, oldest first
    pub fn get_recent_candles(&self, symbol: &str, n: usize) -> Vec<Candle> {
        self.data
            .get(symbol)
            .map(|deque| {
                let skip = deque.len().saturating_sub(n);
                deque.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default()
    }

    pub fn candle_count(&self, symbol: &str) -> usize {
        self.data.get(symbol).map(|d| d.len()).unwrap_or(0)
    }

    pub fn max_candles(&self) -> usize {
        self.max_candles
    }
}

impl Default for CandleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_test_candle(symbol: &str, price: f64) -> Candle {
        Candle {
            symbol: symbol.to_string(),
            timestamp: Utc::now(),
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 1000.0,
        }
    }

    #[test]
    fn test_add_candle() {
        let mut buffer = CandleBuffer::default();
        buffer.add_candle(create_test_candle("BTC/USDT", 100.0));

        assert_eq!(buffer.candle_count("BTC/USDT"), 1);
        assert_eq!(buffer.candle_count("ETH/USDT"), 0);
    }

    #[test]
    fn test_max_candles_limit() {
        let mut buffer = CandleBuffer::new(5);

        for i in 0..10 {
            buffer.add_candle(create_test_candle("BTC/USDT", 100.0 + i as f64));
        }

        let candles = buffer.get_candles("BTC/USDT");
        assert_eq!(candles.len(), 5); // Should only keep last 5

        // FIFO: prices 105-109 survive
        assert_eq!(candles[0].close, 105.0);
        assert_eq!(candles[4].close, 109.0);
    }

    #[test]
    fn test_default_capacity_is_100() {
        let mut buffer = CandleBuffer::default();
        for i in 0..150 {
            buffer.add_candle(create_test_candle("BTC/USDT", i as f64));
        }

        assert_eq!(buffer.candle_count("BTC/USDT"), 100);
        assert_eq!(buffer.get_candles("BTC/USDT")[0].close, 50.0);
    }

    #[test]
    fn test_get_recent_candles() {
        let mut buffer = CandleBuffer::default();
        for i in 0..10 {
            buffer.add_candle(create_test_candle("BTC/USDT", 100.0 + i as f64));
        }

        let recent = buffer.get_recent_candles("BTC/USDT", 3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].close, 107.0); // Last 3: 107, 108, 109
        assert_eq!(recent[2].close, 109.0);

        // Fewer available than requested
        assert_eq!(buffer.get_recent_candles("BTC/USDT", 50).len(), 10);
        assert!(buffer.get_recent_candles("DOGE/USDT", 5).is_empty());
    }
}
