use crate::failure::FailureConfig;
use crate::fixed::{Fixed64, Turn, is_probability};
use crate::player::{MIN_PLAYERS, TrainSpec};
use serde::{Deserialize, Serialize};

/// Errors from [`GameConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config: {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Caps on what a single player can hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllotmentConfig {
    pub max_resources: usize,
    pub max_goals: usize,
}

impl Default for AllotmentConfig {
    fn default() -> Self {
        Self {
            max_resources: 7,
            max_goals: 3,
        }
    }
}

/// Top-level game settings. Every field has a default, so a config file only
/// needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player_count: usize,
    /// The game ends once this many rotations have completed.
    pub total_turns: Turn,
    /// Length of the post-turn animation, in host time units.
    #[serde(with = "crate::serde_fixed64")]
    pub animation_duration: Fixed64,
    pub seed: u64,
    /// Events retained per kind in the bus history.
    pub history_capacity: usize,
    pub failure: FailureConfig,
    pub allotment: AllotmentConfig,
    /// Train models handed out by the allotment.
    pub trains: Vec<TrainSpec>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_count: 2,
            total_turns: 30,
            animation_duration: Fixed64::from_num(2),
            seed: 0,
            history_capacity: 64,
            failure: FailureConfig::default(),
            allotment: AllotmentConfig::default(),
            trains: default_trains(),
        }
    }
}

/// The stock train catalog.
pub fn default_trains() -> Vec<TrainSpec> {
    [
        ("Steam Train", 50),
        ("Petrol Train", 70),
        ("Diesel Train", 100),
        ("Electric Train", 150),
        ("Nuclear Train", 200),
        ("Magnet Train", 250),
        ("Thunder Train", 300),
    ]
    .into_iter()
    .map(|(name, speed)| TrainSpec::new(name, speed))
    .collect()
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.player_count < MIN_PLAYERS {
            return Err(ConfigError::invalid(
                "player_count",
                format!("must be at least {MIN_PLAYERS}, got {}", self.player_count),
            ));
        }
        if self.total_turns == 0 {
            return Err(ConfigError::invalid("total_turns", "must be positive"));
        }
        if self.animation_duration <= Fixed64::ZERO {
            return Err(ConfigError::invalid(
                "animation_duration",
                format!("must be positive, got {}", self.animation_duration),
            ));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::invalid("history_capacity", "must be positive"));
        }
        for (field, p) in [
            ("failure.break_probability", self.failure.break_probability),
            ("failure.fix_probability", self.failure.fix_probability),
        ] {
            if !is_probability(p) {
                return Err(ConfigError::invalid(
                    field,
                    format!("{p} is outside [0, 1]"),
                ));
            }
        }
        if let Some(spec) = self.trains.iter().find(|t| t.speed == 0) {
            return Err(ConfigError::invalid(
                "trains",
                format!("{} has zero speed", spec.name),
            ));
        }
        Ok(())
    }
}
