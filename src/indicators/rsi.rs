/// Calculate Relative Strength Index (RSI)
///
/// Uses the simple-average form: the last `period` close-to-close changes
/// are split into gains and losses, each averaged over `period`.
///
/// Values:
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
///
pub fn calculate_rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let window = &prices[prices.len() - period - 1..];

    let mut gains = 0.0;
    let mut losses = 0.0;
    for pair in window.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gains += change;
        } else {
            losses += change.abs();
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rsi_calculation() {
        let prices = vec![
            44.0, 44.25, 44.5, 43.75, 44.0, 44.5, 45.0, 45.5, 45.25, 45.5, 46.0, 46.5, 46.25,
            46.0, 46.5,
        ];

        let rsi = calculate_rsi(&prices, 14).unwrap();

        // gains = 4.0, losses = 1.5 over 14 changes -> RS = 8/3
        assert!((rsi - (100.0 - 300.0 / 11.0)).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_only_uses_latest_period() {
        // Large early drop must not leak into a 3-period RSI
        let prices = vec![200.0, 100.0, 101.0, 102.0, 103.0];
        assert_eq!(calculate_rsi(&prices, 3), Some(100.0));
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let prices = vec![100.0, 102.0, 101.0];
        assert!(calculate_rsi(&prices, 14).is_none());
        assert!(calculate_rsi(&prices, 0).is_none());
    }

    #[test]
    fn test_rsi_all_gains() {
        let prices = vec![100.0, 101.0, 102.0, 103.0, 104.0, 105.0];
        assert_eq!(calculate_rsi(&prices, 5), Some(100.0)); // All gains = RSI 100
    }

    #[test]
    fn test_rsi_all_losses() {
        let prices = vec![105.0, 104.0, 103.0, 102.0, 101.0, 100.0];
        assert_eq!(calculate_rsi(&prices, 5), Some(0.0));
    }

    proptest! {
        #[test]
        fn rsi_stays_in_bounds(prices in prop::collection::vec(1.0f64..100_000.0, 15..120)) {
            let rsi = calculate_rsi(&prices, 14).unwrap();
            prop_assert!((0.0..=100.0).contains(&rsi));
        }
    }
}
