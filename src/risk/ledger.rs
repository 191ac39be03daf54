use super::limits::{LimitBreach, RiskLimits};
use serde::{Deserialize, Serialize};

/// Account balance and drawdown bookkeeping
///
/// `current_balance` is the only stored figure; every drawdown is derived
/// from it against the matching baseline on each call.
#[derive(Debug, Clone)]
pub struct RiskLedger {
    limits: RiskLimits,
    initial_balance: f64,
    current_balance: f64,
    daily_baseline: f64,
    weekly_baseline: f64,
    monthly_baseline: f64,
    consecutive_losses: u32,
    trading_enabled: bool,
}

/// Read-only risk view for presentation layers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskSummary {
    pub current_balance: f64,
    pub daily_drawdown: f64,
    pub weekly_drawdown: f64,
    pub monthly_drawdown: f64,
    pub trading_enabled: bool,
    pub consecutive_losses: u32,
}

fn drawdown(current: f64, baseline: f64) -> f64 {
    if baseline == 0.0 {
        return 0.0;
    }
    (current - baseline) / baseline * 100.0
}

impl RiskLedger {
    pub fn new(initial_balance: f64, limits: RiskLimits) -> Self {
        Self {
            limits,
            initial_balance,
            current_balance: initial_balance,
            daily_baseline: initial_balance,
            weekly_baseline: initial_balance,
            monthly_baseline: initial_balance,
            consecutive_losses: 0,
            trading_enabled: true,
        }
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    pub fn current_balance(&self) -> f64 {
        self.current_balance
    }

    pub fn daily_baseline(&self) -> f64 {
        self.daily_baseline
    }

    pub fn monthly_baseline(&self) -> f64 {
        self.monthly_baseline
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.consecutive_losses
    }

    pub fn trading_enabled(&self) -> bool {
        self.trading_enabled
    }

    pub fn daily_drawdown(&self) -> f64 {
        drawdown(self.current_balance, self.daily_baseline)
    }

    pub fn weekly_drawdown(&self) -> f64 {
        drawdown(self.current_balance, self.weekly_baseline)
    }

    pub fn monthly_drawdown(&self) -> f64 {
        drawdown(self.current_balance, self.monthly_baseline)
    }

    /// Check limits without side effects
    pub fn check(&self) -> Result<(), LimitBreach> {
        if self.daily_drawdown() <= self.limits.daily_loss_limit_pct {
            return Err(LimitBreach::DailyLoss);
        }

        if self.monthly_drawdown() <= self.limits.monthly_loss_limit_pct {
            return Err(LimitBreach::MonthlyLoss);
        }

        if self.consecutive_losses >= self.limits.max_consecutive_losses {
            return Err(LimitBreach::ConsecutiveLosses);
        }

        Ok(())
    }

    /// Whether a new position may be opened
    ///
    /// A daily or monthly breach clears `trading_enabled`, which stays
    /// cleared until a baseline reset. A loss streak only blocks while it
    /// lasts.
    pub fn can_trade(&mut self) -> bool {
        if let Err(breach) = self.check() {
            if breach.is_kill_switch() && self.trading_enabled {
                self.trading_enabled = false;
                tracing::warn!(
                    ?breach,
                    daily_drawdown = self.daily_drawdown(),
                    monthly_drawdown = self.monthly_drawdown(),
                    "Kill switch tripped, trading disabled"
                );
            }
            return false;
        }

        self.trading_enabled
    }

    /// Risk-adjusted notional for the next position
    pub fn position_size(&self) -> f64 {
        let base = self.current_balance * self.limits.base_risk_pct / 100.0;

        if self.weekly_drawdown() <= self.limits.weekly_reduction_pct {
            base * self.limits.weekly_size_factor
        } else {
            base
        }
    }

    /// Commit a closed trade's P&L
    pub fn record_trade(&mut self, pnl: f64) {
        self.current_balance += pnl;

        if pnl < 0.0 {
            self.consecutive_losses += 1;
        } else {
            self.consecutive_losses = 0;
        }
    }

    /// Credit a partial profit without touching the loss streak
    pub fn credit_partial(&mut self, pnl: f64) {
        self.current_balance += pnl;
    }

    pub fn reset_daily(&mut self) {
        self.daily_baseline = self.current_balance;
        self.trading_enabled = true;
        tracing::info!(baseline = self.daily_baseline, "Daily baseline reset");
    }

    pub fn reset_weekly(&mut self) {
        self.weekly_baseline = self.current_balance;
        self.trading_enabled = true;
        tracing::info!(baseline = self.weekly_baseline, "Weekly baseline reset");
    }

    pub fn reset_monthly(&mut self) {
        self.monthly_baseline = self.current_balance;
        self.trading_enabled = true;
        tracing::info!(baseline = self.monthly_baseline, "Monthly baseline reset");
    }

    pub fn summary(&self) -> RiskSummary {
        RiskSummary {
            current_balance: self.current_balance,
            daily_drawdown: self.daily_drawdown(),
            weekly_drawdown: self.weekly_drawdown(),
            monthly_drawdown: self.monthly_drawdown(),
            trading_enabled: self.trading_enabled,
            consecutive_losses: self.consecutive_losses,
        }
    }
}
