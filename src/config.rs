use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cascade::CascadeConfig;
use crate::error::{EngineError, Result};
use crate::execution::ExitRules;
use crate::market::InstrumentSpec;
use crate::risk::RiskLimits;

/// Simulated clock used by the driver
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Schedule {
    pub cycle_secs: i64,
    pub cycles_per_day: u64,
    pub cycles_per_week: u64,
    pub cycles_per_month: u64,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            cycle_secs: 6,
            cycles_per_day: 14_400,
            cycles_per_week: 100_800,
            cycles_per_month: 432_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub initial_balance: f64,
    pub seed: u64,
    pub instruments: Vec<InstrumentSpec>,
    pub active_symbol: Option<String>, // first instrument when unset
    pub risk: RiskLimits,
    pub cascade: CascadeConfig,
    pub exits: ExitRules,
    pub schedule: Schedule,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_balance: 10_000.0,
            seed: 42,
            instruments: InstrumentSpec::defaults(),
            active_symbol: None,
            risk: RiskLimits::default(),
            cascade: CascadeConfig::default(),
            exits: ExitRules::default(),
            schedule: Schedule::default(),
        }
    }
}

impl EngineConfig {
    /// Layer an optional file and `CASCADEBOT_*` environment variables
    ///
    /// Nested keys use `__`, e.g. `CASCADEBOT_RISK__DAILY_LOSS_LIMIT_PCT=-2.5`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("CASCADEBOT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: EngineConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.instruments.is_empty() {
            return Err(EngineError::InvalidConfig("no instruments configured".into()));
        }

        if let Some(spec) = self.instruments.iter().find(|s| s.base_price <= 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "{} has non-positive base price",
                spec.symbol
            )));
        }

        if self.initial_balance <= 0.0 {
            return Err(EngineError::InvalidConfig("initial balance must be positive".into()));
        }

        if self.exits.max_positions == 0 || self.exits.max_positions > u8::MAX as usize {
            return Err(EngineError::InvalidConfig(format!(
                "max_positions {} out of range",
                self.exits.max_positions
            )));
        }

        if self.schedule.cycle_secs <= 0 {
            return Err(EngineError::InvalidConfig("cycle_secs must be positive".into()));
        }

        let active = self.active_symbol()?;
        if !self.instruments.iter().any(|s| s.symbol == active) {
            return Err(EngineError::UnknownSymbol(active.to_string()));
        }

        Ok(())
    }

    /// Symbol the cascade evaluates
    pub fn active_symbol(&self) -> Result<&str> {
        match &self.active_symbol {
            Some(symbol) => Ok(symbol),
            None => self
                .instruments
                .first()
                .map(|s| s.symbol.as_str())
                .ok_or_else(|| EngineError::InvalidConfig("no instruments configured".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();

        assert_eq!(config.initial_balance, 10_000.0);
        assert_eq!(config.instruments.len(), 3);
        assert_eq!(config.active_symbol().unwrap(), "BTC/USDT");
        assert_eq!(config.schedule.cycles_per_day * 6, 86_400);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let path = std::env::temp_dir().join(format!("cascadebot-{}.toml", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            r#"
initial_balance = 25000.0
active_symbol = "SOL/USDT"

[risk]
daily_loss_limit_pct = -2.0

[cascade]
checklist_threshold = 21
"#,
        )
        .unwrap();

        let config = EngineConfig::load(Some(&path)).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.initial_balance, 25_000.0);
        assert_eq!(config.active_symbol().unwrap(), "SOL/USDT");
        assert_eq!(config.risk.daily_loss_limit_pct, -2.0);
        // Untouched fields keep their defaults
        assert_eq!(config.risk.monthly_loss_limit_pct, -15.0);
        assert_eq!(config.cascade.checklist_threshold, 21);
        assert_eq!(config.cascade.rsi_min, 30.0);
        assert_eq!(config.exits, ExitRules::default());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("cascadebot-does-not-exist.toml");
        assert!(matches!(EngineConfig::load(Some(&path)), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_active_symbol() {
        let config = EngineConfig {
            active_symbol: Some("DOGE/USDT".into()),
            ..EngineConfig::default()
        };

        assert!(matches!(config.validate(), Err(EngineError::UnknownSymbol(_))));
    }

    #[test]
    fn test_validate_rejects_empty_instruments() {
        let config = EngineConfig {
            instruments: Vec::new(),
            ..EngineConfig::default()
        };

        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
    }
}
