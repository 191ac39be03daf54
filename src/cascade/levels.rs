//! The four coarse gates.
//!
//! Each gate reads the cycle's [`MarketContext`] and either passes (with
//! whatever it derived) or rejects with a [`RejectReason`]. Randomised
//! gates draw from the caller's generator so a seed or script fixes them.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{CascadeConfig, Level, MarketContext};
use crate::models::{Direction, Pattern};

/// Why a gate rejected the cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    RsiOutOfRange(f64),
    LowVolume(f64),
    ConsecutiveLosses(u32),
    DailyDrawdown(f64),
    MonthlyDrawdown(f64),
    WeakAlignment(f64),
    RiskRewardTooLow(f64),
    WeakEntrySignal(f64),
    ExtremeSentiment(f64),
    NoFreeSlot, // approved, but the position manager had no slot to assign
}

impl RejectReason {
    /// Gate that produced this rejection
    pub fn level(&self) -> Level {
        match self {
            RejectReason::RsiOutOfRange(_)
            | RejectReason::LowVolume(_)
            | RejectReason::ConsecutiveLosses(_)
            | RejectReason::DailyDrawdown(_)
            | RejectReason::MonthlyDrawdown(_) => Level::Safety,
            RejectReason::WeakAlignment(_) => Level::Structure,
            RejectReason::RiskRewardTooLow(_)
            | RejectReason::WeakEntrySignal(_)
            | RejectReason::NoFreeSlot => Level::Risk,
            RejectReason::ExtremeSentiment(_) => Level::Sentiment,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::RsiOutOfRange(rsi) => write!(f, "RSI {:.1} outside safe range", rsi),
            RejectReason::LowVolume(ratio) => {
                write!(f, "volume at {:.0}% of average", ratio * 100.0)
            }
            RejectReason::ConsecutiveLosses(n) => write!(f, "{} consecutive losses", n),
            RejectReason::DailyDrawdown(dd) => write!(f, "daily drawdown {:.2}% at limit", dd),
            RejectReason::MonthlyDrawdown(dd) => {
                write!(f, "monthly drawdown {:.2}% past alert threshold", dd)
            }
            RejectReason::WeakAlignment(score) => {
                write!(f, "timeframe alignment {:.2} too weak", score)
            }
            RejectReason::RiskRewardTooLow(rr) => write!(f, "risk/reward 1:{:.1} too low", rr),
            RejectReason::WeakEntrySignal(quality) => {
                write!(f, "entry signal quality {:.2} too weak", quality)
            }
            RejectReason::ExtremeSentiment(index) => {
                write!(f, "fear/greed index {:.0} is extreme", index)
            }
            RejectReason::NoFreeSlot => write!(f, "no free position slot"),
        }
    }
}

/// Output of the structural analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructureAnalysis {
    pub direction: Direction,
    pub pattern: Pattern,
    pub alignment: f64,
}

/// Output of the risk assessment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_reward: f64,
    pub entry_quality: f64,
    pub size: f64,
}

/// Level 1: hard safety conditions
pub fn safety_gates(ctx: &MarketContext<'_>, config: &CascadeConfig) -> Result<(), RejectReason> {
    let rsi = ctx.indicators.rsi;
    if rsi < config.rsi_min || rsi > config.rsi_max {
        return Err(RejectReason::RsiOutOfRange(rsi));
    }

    let volume_ratio = ctx.indicators.volume_ratio();
    if volume_ratio < config.min_volume_ratio {
        return Err(RejectReason::LowVolume(volume_ratio));
    }

    let limits = ctx.ledger.limits();

    let losses = ctx.ledger.consecutive_losses();
    if losses >= limits.max_consecutive_losses {
        return Err(RejectReason::ConsecutiveLosses(losses));
    }

    let daily = ctx.ledger.daily_drawdown();
    if daily <= limits.daily_loss_limit_pct {
        return Err(RejectReason::DailyDrawdown(daily));
    }

    let monthly = ctx.ledger.monthly_drawdown();
    if monthly <= limits.monthly_alert_pct {
        return Err(RejectReason::MonthlyDrawdown(monthly));
    }

    Ok(())
}

/// Level 2: direction, pattern and multi-timeframe alignment
///
/// Draws the pattern, then the alignment score.
pub fn structural_analysis<R: Rng + ?Sized>(
    ctx: &MarketContext<'_>,
    config: &CascadeConfig,
    rng: &mut R,
) -> Result<StructureAnalysis, RejectReason> {
    let direction = Direction::from_trend(ctx.indicators.trend);

    // Scaled unit draw rather than gen_range so scripted draws map directly
    let patterns = Pattern::DETECTABLE;
    let pick = (rng.gen::<f64>() * patterns.len() as f64) as usize;
    let pattern = patterns[pick.min(patterns.len() - 1)];

    let alignment: f64 = rng.gen();
    if alignment <= config.alignment_threshold {
        return Err(RejectReason::WeakAlignment(alignment));
    }

    Ok(StructureAnalysis {
        direction,
        pattern,
        alignment,
    })
}

/// Level 3: reward profile, entry quality and sizing
pub fn risk_assessment<R: Rng + ?Sized>(
    ctx: &MarketContext<'_>,
    config: &CascadeConfig,
    rng: &mut R,
) -> Result<RiskAssessment, RejectReason> {
    let risk_reward = config.risk_reward;
    if risk_reward < config.min_risk_reward {
        return Err(RejectReason::RiskRewardTooLow(risk_reward));
    }

    let entry_quality: f64 = rng.gen();
    if entry_quality < config.min_entry_quality {
        return Err(RejectReason::WeakEntrySignal(entry_quality));
    }

    Ok(RiskAssessment {
        risk_reward,
        entry_quality,
        size: ctx.ledger.position_size(),
    })
}

/// Level 4: fear/greed must be outside the extremes
pub fn sentiment_check(ctx: &MarketContext<'_>, config: &CascadeConfig) -> Result<(), RejectReason> {
    let index = ctx.fear_greed;
    if index < config.fear_greed_min || index > config.fear_greed_max {
        return Err(RejectReason::ExtremeSentiment(index));
    }

    Ok(())
}
