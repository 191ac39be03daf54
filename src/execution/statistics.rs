use super::position_manager::ClosedTrade;
use crate::risk::RiskLedger;
use serde::{Deserialize, Serialize};

/// Profit factor reported when there are wins and no losses
pub const PROFIT_FACTOR_SENTINEL: f64 = 999.0;

/// Performance figures derived on demand from closed-trade history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Statistics {
    // Trade Statistics
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,

    // P&L Distribution
    pub total_pnl: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub profit_factor: f64, // Total wins / Total losses

    // Returns
    pub current_balance: f64,
    pub daily_roi: f64,
    pub monthly_roi: f64,
    pub total_return_pct: f64,
}

impl Statistics {
    pub fn from_trades(trades: &[ClosedTrade], ledger: &RiskLedger) -> Self {
        let pnls: Vec<f64> = trades.iter().map(|t| t.total_pnl()).collect();

        let wins: Vec<f64> = pnls.iter().copied().filter(|p| *p > 0.0).collect();
        let losses: Vec<f64> = pnls.iter().copied().filter(|p| *p < 0.0).collect();

        let total_trades = pnls.len();
        let win_rate = if total_trades > 0 {
            wins.len() as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let total_wins: f64 = wins.iter().sum();
        let total_losses: f64 = losses.iter().map(|l| l.abs()).sum();

        let avg_win = if !wins.is_empty() {
            total_wins / wins.len() as f64
        } else {
            0.0
        };

        let avg_loss = if !losses.is_empty() {
            total_losses / losses.len() as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            PROFIT_FACTOR_SENTINEL
        } else {
            0.0
        };

        let current_balance = ledger.current_balance();
        let roi = |baseline: f64| {
            if baseline > 0.0 {
                (current_balance - baseline) / baseline * 100.0
            } else {
                0.0
            }
        };

        Self {
            total_trades,
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate,
            total_pnl: pnls.iter().sum(),
            avg_win,
            avg_loss,
            largest_win: wins.iter().copied().fold(0.0, f64::max),
            largest_loss: losses.iter().copied().fold(0.0, f64::min),
            profit_factor,
            current_balance,
            daily_roi: roi(ledger.daily_baseline()),
            monthly_roi: roi(ledger.monthly_baseline()),
            total_return_pct: roi(ledger.initial_balance()),
        }
    }

    /// Print a formatted report to stdout
    pub fn print_report(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║              CASCADE PERFORMANCE REPORT               ║");
        println!("╚═══════════════════════════════════════════════════════╝\n");

        println!("💰 BALANCE");
        println!("  Current Balance:       ${:.2}", self.current_balance);
        println!("  Total P&L:             ${:.2}", self.total_pnl);
        println!("  Total Return:          {:+.2}%", self.total_return_pct);
        println!("  Daily ROI:             {:+.2}%", self.daily_roi);
        println!("  Monthly ROI:           {:+.2}%", self.monthly_roi);

        println!("\n📈 TRADE STATISTICS");
        println!("  Total Trades:          {}", self.total_trades);
        println!(
            "  Winning Trades:        {} ({:.1}%)",
            self.winning_trades, self.win_rate
        );
        println!("  Losing Trades:         {}", self.losing_trades);

        if self.total_trades > 0 {
            println!("\n📊 WIN/LOSS ANALYSIS");
            println!("  Average Win:           ${:.2}", self.avg_win);
            println!("  Average Loss:          ${:.2}", self.avg_loss);
            println!("  Largest Win:           ${:.2}", self.largest_win);
            println!("  Largest Loss:          ${:.2}", self.largest_loss);
            println!("  Profit Factor:         {:.2}", self.profit_factor);
        }

        println!("\n═══════════════════════════════════════════════════════\n");
    }
}
