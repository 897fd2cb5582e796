//! Gameplay tuning.
//!
//! Every number the update loop depends on lives in [`Tuning`].  The defaults
//! are the stock arcade balance; a TOML file can override any subset of them.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming an optional tuning file.
pub const CONFIG_ENV: &str = "SKY_STRIKE_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read tuning file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed tuning file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid tuning: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // ── Playfield ─────────────────────────────────────────────────────────────
    /// Logical playfield width in pixels.
    pub width: f32,
    pub height: f32,

    // ── Player ────────────────────────────────────────────────────────────────
    pub player_width: f32,
    pub player_height: f32,
    /// Gap between the bottom of the player and the bottom of the playfield.
    pub player_bottom_margin: f32,
    /// Horizontal pixels per tick while a direction is held.
    pub player_speed: f32,
    pub starting_lives: u32,
    /// Grace window after losing a life, in ms.
    pub invulnerability_ms: u64,

    // ── Spawning & difficulty ─────────────────────────────────────────────────
    pub spawn_interval_ms: u64,
    pub spawn_interval_floor_ms: u64,
    pub spawn_interval_step_ms: u64,
    /// Score needed per level: a level-up needs `score > level * level_score`.
    pub level_score: u32,
    pub speed_multiplier_step: f32,

    // ── Power-ups ─────────────────────────────────────────────────────────────
    /// Probability that a destroyed enemy drops a power-up.
    pub drop_chance: f64,
    pub double_score_ms: u64,
    pub rapid_fire_ms: u64,
    pub shield_ms: u64,

    // ── Abilities ─────────────────────────────────────────────────────────────
    pub bomb_charges: u32,
    pub bomb_cooldown_ms: u64,
    pub laser_charges: u32,
    pub laser_cooldown_ms: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            width: 480.0,
            height: 640.0,

            player_width: 40.0,
            player_height: 50.0,
            player_bottom_margin: 20.0,
            player_speed: 5.0,
            starting_lives: 3,
            invulnerability_ms: 2000,

            spawn_interval_ms: 1000,
            spawn_interval_floor_ms: 500,
            spawn_interval_step_ms: 50,
            level_score: 1000,
            speed_multiplier_step: 0.1,

            drop_chance: 0.2,
            double_score_ms: 10_000,
            rapid_fire_ms: 5_000,
            shield_ms: 8_000,

            bomb_charges: 3,
            bomb_cooldown_ms: 5_000,
            laser_charges: 2,
            laser_cooldown_ms: 5_000,
        }
    }
}

impl Tuning {
    /// Parse a TOML document.  Keys that are absent keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = toml::from_str(text)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tuning = Self::from_toml(&text)?;
        log::info!("loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Load the file named by [`CONFIG_ENV`], or the defaults when it is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width.is_finite() && self.height.is_finite())
            || !(self.width > 0.0 && self.height > 0.0)
        {
            return Err(ConfigError::Invalid(format!(
                "playfield must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.player_width <= 0.0
            || self.player_height <= 0.0
            || self.player_width > self.width
            || self.player_height + self.player_bottom_margin > self.height
        {
            return Err(ConfigError::Invalid(
                "player does not fit inside the playfield".to_string(),
            ));
        }
        if self.starting_lives == 0 {
            return Err(ConfigError::Invalid("starting_lives must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.drop_chance) {
            return Err(ConfigError::Invalid(format!(
                "drop_chance must be within [0, 1], got {}",
                self.drop_chance
            )));
        }
        if self.spawn_interval_floor_ms > self.spawn_interval_ms {
            return Err(ConfigError::Invalid(format!(
                "spawn floor {}ms exceeds starting interval {}ms",
                self.spawn_interval_floor_ms, self.spawn_interval_ms
            )));
        }
        if self.level_score == 0 {
            return Err(ConfigError::Invalid("level_score must be positive".to_string()));
        }
        if !(self.player_speed.is_finite() && self.player_speed > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "player_speed must be a positive number, got {}",
                self.player_speed
            )));
        }
        if !(self.speed_multiplier_step.is_finite() && self.speed_multiplier_step >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "speed_multiplier_step must be a non-negative number, got {}",
                self.speed_multiplier_step
            )));
        }
        Ok(())
    }
}
