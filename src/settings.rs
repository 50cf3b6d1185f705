//! Match settings
//!
//! Every tunable of a round lives here. Settings are plain serde data so a
//! host can ship them as JSON; missing fields fall back to the defaults in
//! `crate::consts`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::PowerUpKind;

/// Board size and brick density
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Board width including the outer walls
    pub width: i32,
    /// Board height including the outer walls
    pub height: i32,
    /// Fraction of eligible cells that become bricks (0.0 - 1.0)
    pub fill_ratio: f32,
    /// Pillars are kept out of this radius around each spawn corner
    pub pillar_safe_radius: u32,
    /// Bricks are kept out of this radius around each spawn corner
    pub destructible_safe_radius: u32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_BOARD_WIDTH,
            height: DEFAULT_BOARD_HEIGHT,
            fill_ratio: DEFAULT_FILL_RATIO,
            pillar_safe_radius: 0,
            destructible_safe_radius: 1,
        }
    }
}

impl LevelConfig {
    pub fn inner_width(&self) -> i32 {
        self.width - 2
    }

    pub fn inner_height(&self) -> i32 {
        self.height - 2
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 3 || self.height < 3 {
            return Err(ConfigError::BoardTooSmall {
                width: self.width,
                height: self.height,
            });
        }
        if self.width > MAX_BOARD_SIDE || self.height > MAX_BOARD_SIDE {
            return Err(ConfigError::BoardTooLarge {
                width: self.width,
                height: self.height,
                max: MAX_BOARD_SIDE,
            });
        }
        if !self.fill_ratio.is_finite() || !(0.0..=1.0).contains(&self.fill_ratio) {
            return Err(ConfigError::FillRatio(self.fill_ratio));
        }
        Ok(())
    }
}

/// Sudden death tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuddenDeathSettings {
    /// When false the lockdown queue stays empty (no tiles ever fall)
    pub enabled: bool,
    /// Start automatically when the round timer runs out
    pub start_on_timer: bool,
    /// Seconds between two locked cells
    pub interval_secs: f32,
    /// Siren plays this many seconds before automatic activation
    pub warning_secs: f32,
    /// Lockable region is the board shrunk by this many cells per side
    pub inset: i32,
}

impl Default for SuddenDeathSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            start_on_timer: true,
            interval_secs: SUDDEN_DEATH_INTERVAL_SECS,
            warning_secs: SUDDEN_DEATH_WARNING_SECS,
            inset: 0,
        }
    }
}

/// Complete configuration of one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    pub level: LevelConfig,
    /// Fixed seed for reproducible rounds (None = random)
    pub seed: Option<u64>,
    pub player_count: usize,

    // === Match flow ===
    pub pre_game_secs: f32,
    pub match_duration_secs: f32,
    pub double_kill_window_secs: f32,
    pub game_over_delay_secs: f32,
    pub sudden_death: SuddenDeathSettings,

    // === Bombs ===
    pub bomb_fuse_secs: f32,
    pub bomb_roll_cell_secs: f32,

    // === Power-ups ===
    /// Chance that a destroyed brick hides a power-up
    pub power_up_chance: f32,
    /// Kinds a hidden power-up is chosen from (uniformly)
    pub power_up_kinds: Vec<PowerUpKind>,
    pub power_up_reveal_secs: f32,
    pub speed_up_amount: f32,

    // === Player starting stats ===
    pub player_speed: f32,
    pub player_blast_range: u32,
    pub player_bomb_capacity: u32,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            level: LevelConfig::default(),
            seed: None,
            player_count: 2,

            pre_game_secs: PRE_GAME_SECS,
            match_duration_secs: MATCH_DURATION_SECS,
            double_kill_window_secs: DOUBLE_KILL_WINDOW_SECS,
            game_over_delay_secs: GAME_OVER_DELAY_SECS,
            sudden_death: SuddenDeathSettings::default(),

            bomb_fuse_secs: BOMB_FUSE_SECS,
            bomb_roll_cell_secs: BOMB_ROLL_CELL_SECS,

            power_up_chance: POWER_UP_CHANCE,
            power_up_kinds: vec![
                PowerUpKind::RangeUp,
                PowerUpKind::SpeedUp,
                PowerUpKind::BombCapacityUp,
            ],
            power_up_reveal_secs: POWER_UP_REVEAL_SECS,
            speed_up_amount: SPEED_UP_AMOUNT,

            player_speed: PLAYER_SPEED,
            player_blast_range: PLAYER_BLAST_RANGE,
            player_bomb_capacity: PLAYER_BOMB_CAPACITY,
        }
    }
}

impl MatchSettings {
    /// Default settings with a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Parse settings from JSON (missing fields use defaults)
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check every field; the first problem found is returned
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.level.validate()?;

        if self.player_count == 0 || self.player_count > MAX_PLAYERS {
            return Err(ConfigError::PlayerCount {
                requested: self.player_count,
                available: MAX_PLAYERS,
            });
        }

        let durations = [
            ("pre_game_secs", self.pre_game_secs),
            ("match_duration_secs", self.match_duration_secs),
            ("double_kill_window_secs", self.double_kill_window_secs),
            ("game_over_delay_secs", self.game_over_delay_secs),
            ("sudden_death.interval_secs", self.sudden_death.interval_secs),
            ("sudden_death.warning_secs", self.sudden_death.warning_secs),
            ("bomb_fuse_secs", self.bomb_fuse_secs),
            ("bomb_roll_cell_secs", self.bomb_roll_cell_secs),
            ("power_up_reveal_secs", self.power_up_reveal_secs),
            ("speed_up_amount", self.speed_up_amount),
        ];
        for (name, value) in durations {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDuration { name, value });
            }
        }
        // A zero interval would lock the whole board in one tick
        if self.sudden_death.interval_secs == 0.0 {
            return Err(ConfigError::InvalidDuration {
                name: "sudden_death.interval_secs",
                value: 0.0,
            });
        }
        if self.bomb_roll_cell_secs == 0.0 {
            return Err(ConfigError::InvalidDuration {
                name: "bomb_roll_cell_secs",
                value: 0.0,
            });
        }

        if !self.power_up_chance.is_finite() || !(0.0..=1.0).contains(&self.power_up_chance) {
            return Err(ConfigError::PowerUpChance(self.power_up_chance));
        }
        if self.power_up_chance > 0.0 && self.power_up_kinds.is_empty() {
            return Err(ConfigError::NoPowerUpKinds);
        }

        if !self.player_speed.is_finite() || self.player_speed <= 0.0 {
            return Err(ConfigError::PlayerStat {
                name: "player_speed",
            });
        }
        if self.player_blast_range == 0 {
            return Err(ConfigError::PlayerStat {
                name: "player_blast_range",
            });
        }
        if self.player_bomb_capacity == 0 {
            return Err(ConfigError::PlayerStat {
                name: "player_bomb_capacity",
            });
        }

        Ok(())
    }
}
