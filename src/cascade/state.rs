use serde::{Deserialize, Serialize};
use std::fmt;

/// The four coarse gates, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Safety,
    Structure,
    Risk,
    Sentiment,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Safety, Level::Structure, Level::Risk, Level::Sentiment];

    /// 1-based level number
    pub fn number(self) -> u8 {
        match self {
            Level::Safety => 1,
            Level::Structure => 2,
            Level::Risk => 3,
            Level::Sentiment => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Level::Safety => "Safety Gates",
            Level::Structure => "Structural Analysis",
            Level::Risk => "Risk Assessment",
            Level::Sentiment => "Sentiment Check",
        }
    }

    fn index(self) -> usize {
        self.number() as usize - 1
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level {} ({})", self.number(), self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LevelState {
    #[default]
    Waiting,
    Analyzing,
    Passed,
    Failed,
}

/// Display state of the last started cycle
///
/// Stays as the last cycle left it; the next started cycle resets
/// everything to `Waiting` before evaluating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisLevels {
    levels: [LevelState; 4],
    checklist: LevelState,
}

impl AnalysisLevels {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn get(&self, level: Level) -> LevelState {
        self.levels[level.index()]
    }

    pub fn set(&mut self, level: Level, state: LevelState) {
        self.levels[level.index()] = state;
    }

    /// Mark `level` as under evaluation
    pub fn begin(&mut self, level: Level) {
        self.set(level, LevelState::Analyzing);
    }

    /// Resolve an analyzing level
    pub fn finish(&mut self, level: Level, passed: bool) {
        let state = if passed {
            LevelState::Passed
        } else {
            LevelState::Failed
        };
        self.set(level, state);
    }

    /// Level currently under evaluation, if any
    pub fn analyzing(&self) -> Option<Level> {
        Level::ALL
            .into_iter()
            .find(|level| self.get(*level) == LevelState::Analyzing)
    }

    pub fn checklist(&self) -> LevelState {
        self.checklist
    }

    pub fn set_checklist(&mut self, state: LevelState) {
        self.checklist = state;
    }

    /// Level states in order, for progress display
    pub fn levels(&self) -> [(Level, LevelState); 4] {
        Level::ALL.map(|level| (level, self.get(level)))
    }
}
