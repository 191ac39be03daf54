// Risk management module
pub mod ledger;
pub mod limits;

pub use ledger::{RiskLedger, RiskSummary};
pub use limits::{LimitBreach, RiskLimits};
