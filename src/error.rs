//! Error types
//!
//! Configuration problems fail fast at generation or spawn time. Everything
//! else in the simulation is either prevented by idempotency flags or
//! degrades gracefully with a log line.

use glam::IVec2;
use thiserror::Error;

use crate::sim::Tile;

/// Invalid match, board or spawn configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("board {width}x{height} is too small, need at least 3x3 including walls")]
    BoardTooSmall { width: i32, height: i32 },
    #[error("board {width}x{height} is too large, each side is at most {max}")]
    BoardTooLarge { width: i32, height: i32, max: i32 },
    #[error("fill ratio {0} must be within 0.0..=1.0")]
    FillRatio(f32),
    #[error("player count {requested} not supported, board has {available} spawn corners")]
    PlayerCount { requested: usize, available: usize },
    #[error("{name} must be a finite, non-negative number (got {value})")]
    InvalidDuration { name: &'static str, value: f32 },
    #[error("power-up chance {0} must be within 0.0..=1.0")]
    PowerUpChance(f32),
    #[error("power-up drops are enabled but no power-up kinds are configured")]
    NoPowerUpKinds,
    #[error("player stat {name} must be positive")]
    PlayerStat { name: &'static str },
    #[error("failed to parse settings: {0}")]
    Parse(String),
    #[error("failed to read settings file: {0}")]
    Io(String),
}

/// Rejected grid mutation through the storage API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell ({}, {}) is outside the grid", .0.x, .0.y)]
    OutOfBounds(IVec2),
    #[error("illegal transition {from:?} -> {to:?} at ({}, {})", .cell.x, .cell.y)]
    IllegalTransition { cell: IVec2, from: Tile, to: Tile },
}
