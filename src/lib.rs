// Core modules
pub mod cascade;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod market;
pub mod models;
pub mod risk;

// Re-export commonly used types
pub use cascade::{CycleOutcome, DecisionCascade, SkipReason};
pub use config::EngineConfig;
pub use engine::TradingEngine;
pub use error::{EngineError, Result};
pub use models::*;
