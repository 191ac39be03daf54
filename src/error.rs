use thiserror::Error;

/// Errors surfaced at the edges of the engine
///
/// Gate rejections and skipped cycles are decision outcomes, not errors;
/// see [`crate::cascade::CycleOutcome`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown instrument: {0}")]
    UnknownSymbol(String),

    #[error("all {0} position slots are occupied")]
    SlotsFull(usize),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
