//! Blast Arena - a grid arena game of timed bombs and shrinking boards
//!
//! Core modules:
//! - `sim`: Deterministic match simulation (grid, bombs, sudden death, match flow)
//! - `settings`: Data-driven match configuration
//! - `error`: Configuration and grid errors

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, GridError};
pub use settings::MatchSettings;

use glam::{IVec2, Vec2};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Board defaults (outer size, walls included)
    pub const DEFAULT_BOARD_WIDTH: i32 = 15;
    pub const DEFAULT_BOARD_HEIGHT: i32 = 13;
    pub const DEFAULT_FILL_RATIO: f32 = 0.55;
    /// Largest accepted board side
    pub const MAX_BOARD_SIDE: i32 = 256;

    /// Player defaults
    pub const PLAYER_SPEED: f32 = 3.0;
    pub const PLAYER_BLAST_RANGE: u32 = 1;
    pub const PLAYER_BOMB_CAPACITY: u32 = 1;
    /// Half extent of the player's square collision box (cells)
    pub const PLAYER_HALF_EXTENT: f32 = 0.4;
    /// Gap kept between a player and the obstacle it slides against
    pub const MOVE_SKIN: f32 = 0.01;

    /// Bomb defaults
    pub const BOMB_FUSE_SECS: f32 = 2.0;
    /// Seconds for a rolling bomb to cross one cell
    pub const BOMB_ROLL_CELL_SECS: f32 = 0.12;

    /// Power-up defaults
    pub const POWER_UP_CHANCE: f32 = 0.3;
    pub const SPEED_UP_AMOUNT: f32 = 0.5;
    /// Delay between a brick breaking and its power-up appearing
    pub const POWER_UP_REVEAL_SECS: f32 = 0.4;

    /// Match flow timings
    pub const PRE_GAME_SECS: f32 = 3.0;
    pub const MATCH_DURATION_SECS: f32 = 180.0;
    pub const SUDDEN_DEATH_WARNING_SECS: f32 = 5.0;
    pub const SUDDEN_DEATH_INTERVAL_SECS: f32 = 0.35;
    pub const DOUBLE_KILL_WINDOW_SECS: f32 = 0.25;
    pub const GAME_OVER_DELAY_SECS: f32 = 3.0;

    /// Players in one round; the coordinator resolves on the first death
    pub const MAX_PLAYERS: usize = 2;
}

/// World-space center of a cell (cells are one unit wide)
#[inline]
pub fn cell_center(cell: IVec2) -> Vec2 {
    cell.as_vec2() + Vec2::splat(0.5)
}

/// Cell containing a world-space position
#[inline]
pub fn world_to_cell(pos: Vec2) -> IVec2 {
    pos.floor().as_ivec2()
}
