use crate::error::{Result, RummyError};
use crate::Card;
use serde::{Deserialize, Serialize};

/// Knobs for [`crate::find_best_play`] and committing its result.
///
/// Missing JSON fields fall back to the defaults, so `{}` is a valid config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Anchor rank for melds made entirely of wilds.
    pub fix_value: u8,
    /// Stop examining outcomes after this many milliseconds.
    pub time_limit_ms: Option<u64>,
    /// Stop after examining this many outcomes.
    pub max_outcomes: Option<usize>,
    /// Stop as soon as an outcome reaches zero residual score.
    pub stop_at_go_out: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            fix_value: 1,
            time_limit_ms: None,
            max_outcomes: None,
            stop_at_go_out: false,
        }
    }
}

impl SearchConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SearchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=Card::MAX_RANK).contains(&self.fix_value) {
            return Err(RummyError::InvalidConfig(format!(
                "fix_value must be 1-{}, got {}",
                Card::MAX_RANK,
                self.fix_value
            )));
        }
        if self.time_limit_ms == Some(0) {
            return Err(RummyError::InvalidConfig(
                "time_limit_ms must be positive".to_string(),
            ));
        }
        if self.max_outcomes == Some(0) {
            return Err(RummyError::InvalidConfig(
                "max_outcomes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
