use serde::{Deserialize, Serialize};

/// Risk thresholds, all drawdowns in percent (negative numbers)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskLimits {
    pub daily_loss_limit_pct: f64,
    pub monthly_loss_limit_pct: f64,
    pub monthly_alert_pct: f64,
    pub weekly_reduction_pct: f64,
    pub weekly_size_factor: f64,
    pub max_consecutive_losses: u32,
    pub base_risk_pct: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            daily_loss_limit_pct: -3.0,   // kill switch
            monthly_loss_limit_pct: -15.0, // kill switch
            monthly_alert_pct: -12.0,     // safety gate, stricter than the kill switch
            weekly_reduction_pct: -8.0,   // size reduced at or below this
            weekly_size_factor: 0.7,
            max_consecutive_losses: 3,
            base_risk_pct: 0.5, // of current balance
        }
    }
}

/// Which limit stopped trading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitBreach {
    DailyLoss,
    MonthlyLoss,
    ConsecutiveLosses,
}

impl LimitBreach {
    /// Breaches that clear the trading-enabled flag until a baseline reset
    pub fn is_kill_switch(self) -> bool {
        matches!(self, LimitBreach::DailyLoss | LimitBreach::MonthlyLoss)
    }
}
