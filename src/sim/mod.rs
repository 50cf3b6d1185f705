//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies

pub mod events;
pub mod explosion;
pub mod grid;
pub mod level;
pub mod movement;
pub mod rolling;
pub mod round;
pub mod state;
pub mod sudden_death;
pub mod tick;

pub use events::{GameEvent, MusicTrack, PresentationSink, SegmentKind, SoundCue};
pub use explosion::{DetonationReport, Explosion, ExplosionArm, Segment};
pub use grid::{Bounds, Direction, Grid, Tile};
pub use level::{Level, generate_level, generate_level_with_rng, spawn_corners};
pub use movement::Obstacle;
pub use round::{MatchCoordinator, MatchPhase, MatchResult, RoundSignal, RoundTimings};
pub use state::{
    Bomb, GameState, PendingDrop, Player, PlayerId, PowerUp, PowerUpKind, RollState,
};
pub use sudden_death::{SuddenDeath, build_spiral};
pub use tick::{PlayerInput, TickInput, tick};
