// Position lifecycle and trade history
pub mod position_manager;
pub mod statistics;

pub use position_manager::{CloseReason, ClosedTrade, ExitRules, Position, PositionManager};
pub use statistics::{Statistics, PROFIT_FACTOR_SENTINEL};
