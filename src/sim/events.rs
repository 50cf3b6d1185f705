//! Presentation events
//!
//! The simulation never renders or plays audio. It queues fire-and-forget
//! requests that a host drains once per frame and hands to its renderer,
//! mixer and scene manager.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::grid::Direction;
use super::round::MatchResult;
use super::state::{PlayerId, PowerUpKind};

/// One-shot sound effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    /// Round is about to begin
    GameStart,
    BombPlace,
    Explosion,
    PlayerDeath,
    ItemPickup,
    /// A sudden death block slams down
    BlockFall,
    /// Sudden death is imminent
    Siren,
    /// Pause toggled
    Pause,
}

/// Background music tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MusicTrack {
    Normal,
    SuddenDeath,
}

/// Position of a blast segment within its arm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    /// The bomb's own cell
    Center,
    Middle,
    /// Last cell of an arm
    End,
}

/// Requests for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A brick broke; `pending_power_up` appears after the reveal delay
    DestructionEffect {
        cell: IVec2,
        pending_power_up: Option<PowerUpKind>,
    },
    /// One cell of a blast (`direction` is None for the center)
    ExplosionSegment {
        cell: IVec2,
        direction: Option<Direction>,
        kind: SegmentKind,
    },
    PowerUpSpawned {
        cell: IVec2,
        kind: PowerUpKind,
    },
    PowerUpCollected {
        player: PlayerId,
        kind: PowerUpKind,
    },
    /// Sudden death sealed a cell
    CellLocked {
        cell: IVec2,
    },
    PlayerEliminated {
        player: PlayerId,
    },
    Sound(SoundCue),
    Music(MusicTrack),
    PauseMusic,
    ResumeMusic,
    StopMusic,
    /// Final result, emitted exactly once per round
    RoundOver(MatchResult),
}

/// Consumer of presentation events
pub trait PresentationSink {
    fn present(&mut self, event: GameEvent);
}

impl<F: FnMut(GameEvent)> PresentationSink for F {
    fn present(&mut self, event: GameEvent) {
        self(event)
    }
}
