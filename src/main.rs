//! Blast Arena headless runner
//!
//! Plays one round between autopilot players with the fixed timestep loop
//! and logs what happens. Pass a JSON settings file as the first argument to
//! override the defaults (`RUST_LOG=debug` for per-entity detail).

use std::process::ExitCode;

use glam::Vec2;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use blast_arena::MatchSettings;
use blast_arena::consts::{MAX_SUBSTEPS, SIM_DT};
use blast_arena::sim::{
    Direction, GameEvent, GameState, MatchPhase, PlayerId, PlayerInput, TickInput, Tile, tick,
};

/// Host frame time the runner pretends to render at
const FRAME_DT: f32 = 1.0 / 30.0;
/// Give up after this much simulated time
const MAX_SIM_SECS: f32 = 600.0;

/// Wandering bot: picks a free direction every so often and drops bombs next
/// to bricks
struct Autopilot {
    rng: Pcg32,
    heading: Vec2,
    retarget: f32,
}

impl Autopilot {
    fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            heading: Vec2::ZERO,
            retarget: 0.0,
        }
    }

    fn think(&mut self, state: &GameState, id: PlayerId, dt: f32) -> PlayerInput {
        let Some(player) = state.players.get(id) else {
            return PlayerInput::default();
        };
        if !player.can_act() {
            return PlayerInput::default();
        }
        let cell = player.cell();

        self.retarget -= dt;
        let ahead = Direction::from_vector(self.heading).map(|d| cell + d.offset());
        let stuck = ahead.is_none_or(|c| state.grid.tile(c) != Tile::Open);
        if self.retarget <= 0.0 || stuck {
            let free: Vec<Direction> = Direction::ALL
                .into_iter()
                .filter(|d| {
                    let next = cell + d.offset();
                    state.grid.tile(next) == Tile::Open && state.bomb_at(next).is_none()
                })
                .collect();
            self.heading = free
                .choose(&mut self.rng)
                .map_or(Vec2::ZERO, |d| d.offset().as_vec2());
            self.retarget = self.rng.random_range(0.3..1.2);
        }

        let near_brick = Direction::ALL
            .iter()
            .any(|d| state.grid.tile(cell + d.offset()) == Tile::Destructible);
        let place_bomb = near_brick && self.rng.random::<f32>() < 0.02;
        if place_bomb {
            // Force a new heading away from the bomb next step
            self.retarget = 0.0;
        }

        PlayerInput {
            movement: self.heading,
            place_bomb,
        }
    }
}

fn describe(event: &GameEvent) {
    match event {
        GameEvent::PlayerEliminated { player } => {
            log::info!("Player {} was eliminated", player + 1)
        }
        GameEvent::PowerUpCollected { player, kind } => {
            log::info!("Player {} collected {:?}", player + 1, kind)
        }
        GameEvent::RoundOver(result) => log::info!("Round over: {result:?}"),
        other => log::trace!("{other:?}"),
    }
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Blast Arena (headless) starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => match MatchSettings::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Could not load settings from {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => MatchSettings::default(),
    };

    let mut state = match GameState::new(settings) {
        Ok(state) => state,
        Err(e) => {
            log::error!("Invalid match settings: {e}");
            return ExitCode::FAILURE;
        }
    };
    log::info!("Board (seed {}):\n{}", state.seed, state.grid);

    let mut bots: Vec<Autopilot> = (0..state.players.len())
        .map(|i| Autopilot::new(state.seed.wrapping_add(i as u64 + 1)))
        .collect();

    let mut sink = |event: GameEvent| describe(&event);
    let mut accumulator = 0.0;
    let mut elapsed = 0.0;

    while state.phase() != MatchPhase::Ended {
        if elapsed >= MAX_SIM_SECS {
            log::warn!("Round still running after {MAX_SIM_SECS} s, stopping");
            break;
        }
        accumulator += FRAME_DT;
        elapsed += FRAME_DT;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = TickInput {
                players: bots
                    .iter_mut()
                    .enumerate()
                    .map(|(id, bot)| bot.think(&state, id, SIM_DT))
                    .collect(),
                ..Default::default()
            };
            tick(&mut state, &input, SIM_DT);
            accumulator -= SIM_DT;
            substeps += 1;
        }

        state.dispatch_events(&mut sink);
    }

    log::info!("Final board after {elapsed:.1} s:\n{}", state.grid);
    match state.result() {
        Some(result) => {
            println!("{result:?}");
            ExitCode::SUCCESS
        }
        None => ExitCode::FAILURE,
    }
}
