/// Calculate volatility as a coefficient of variation
///
/// Population standard deviation of the last `period` closes divided by
/// their mean, expressed in percent.
pub fn calculate_volatility(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let window = &prices[prices.len() - period..];
    let mean = window.iter().sum::<f64>() / period as f64;
    if mean == 0.0 {
        return None;
    }

    let variance = window
        .iter()
        .map(|p| {
            let diff = p - mean;
            diff * diff
        })
        .sum::<f64>()
        / period as f64;

    Some(variance.sqrt() / mean * 100.0)
}
