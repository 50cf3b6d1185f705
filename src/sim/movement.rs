//! Player movement and pickups
//!
//! Players are axis-aligned boxes moved X first, then Y. Each axis stops
//! flush against the first blocking cell, leaving a small skin so the next
//! step does not start inside it.

use glam::{IVec2, Vec2};

use super::events::{GameEvent, SoundCue};
use super::grid::Direction;
use super::state::{GameState, PlayerId};
use crate::consts::{MOVE_SKIN, PLAYER_HALF_EXTENT};

/// What stopped a move along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Obstacle {
    Tile(IVec2),
    Bomb(u32),
}

impl GameState {
    /// Move a player for one step. Input is normalized; zero input only
    /// keeps the player still. Walking into a pushable bomb kicks it.
    pub fn move_player(&mut self, id: PlayerId, input: Vec2, dt: f32) {
        let Some(player) = self.players.get(id) else {
            return;
        };
        if !player.can_act() {
            return;
        }
        let Some(facing) = Direction::from_vector(input) else {
            return;
        };

        let delta = input.normalize_or_zero() * player.speed * dt;
        let start = player.pos;

        // Bombs already under the player never block them
        let ignored: Vec<u32> = self
            .bombs
            .iter()
            .filter(|b| player.overlaps_cell(b.cell))
            .map(|b| b.id)
            .collect();

        let (x, hit_x) = self.sweep_axis(start, delta.x, true, &ignored);
        let (y, hit_y) = self.sweep_axis(Vec2::new(x, start.y), delta.y, false, &ignored);

        if let Some(p) = self.players.get_mut(id) {
            p.pos = Vec2::new(x, y);
            p.facing = facing;
        }

        // Bombs roll along the axis they were hit on
        let pushes = [
            (hit_x, if delta.x > 0.0 { Direction::Right } else { Direction::Left }),
            (hit_y, if delta.y > 0.0 { Direction::Up } else { Direction::Down }),
        ];
        for (hit, direction) in pushes {
            if let Some(Obstacle::Bomb(bomb_id)) = hit {
                self.push_bomb(id, bomb_id, direction);
            }
        }
    }

    /// Kick a bomb the player ran into, if it can be pushed
    fn push_bomb(&mut self, player: PlayerId, bomb_id: u32, direction: Direction) {
        let pushable = self
            .bomb(bomb_id)
            .is_some_and(|b| !b.solid && b.owner != player && !b.is_rolling());
        if pushable && self.kick_bomb(bomb_id, direction) {
            log::debug!("Player {} pushed bomb {}", player + 1, bomb_id);
        }
    }

    /// New coordinate along one axis and what stopped it, if anything
    fn sweep_axis(
        &self,
        pos: Vec2,
        delta: f32,
        horizontal: bool,
        ignored: &[u32],
    ) -> (f32, Option<Obstacle>) {
        let (along, across) = if horizontal {
            (pos.x, pos.y)
        } else {
            (pos.y, pos.x)
        };
        if delta == 0.0 {
            return (along, None);
        }

        let leading = along + delta.signum() * (PLAYER_HALF_EXTENT + MOVE_SKIN) + delta;
        let line = leading.floor() as i32;
        let lo = (across - PLAYER_HALF_EXTENT + MOVE_SKIN).floor() as i32;
        let hi = (across + PLAYER_HALF_EXTENT - MOVE_SKIN).floor() as i32;

        for k in lo..=hi {
            let cell = if horizontal {
                IVec2::new(line, k)
            } else {
                IVec2::new(k, line)
            };
            if let Some(obstacle) = self.obstacle_at(cell, ignored) {
                let stop = if delta > 0.0 {
                    line as f32 - PLAYER_HALF_EXTENT - MOVE_SKIN
                } else {
                    (line + 1) as f32 + PLAYER_HALF_EXTENT + MOVE_SKIN
                };
                return (stop, Some(obstacle));
            }
        }

        (along + delta, None)
    }

    fn obstacle_at(&self, cell: IVec2, ignored: &[u32]) -> Option<Obstacle> {
        if self.grid.tile(cell).is_solid() {
            return Some(Obstacle::Tile(cell));
        }
        self.bombs
            .iter()
            .find(|b| !ignored.contains(&b.id) && b.claims(cell))
            .map(|b| Obstacle::Bomb(b.id))
    }

    /// Hand each power-up to the living player standing on it
    pub(crate) fn collect_power_ups(&mut self) {
        let speed_up = self.settings.speed_up_amount;
        for id in 0..self.players.len() {
            let player = &self.players[id];
            if !player.alive {
                continue;
            }
            let cell = player.cell();
            let Some(index) = self.power_ups.iter().position(|p| p.cell == cell) else {
                continue;
            };
            let power_up = self.power_ups.remove(index);
            self.players[id].apply_power_up(power_up.kind, speed_up);
            log::debug!("Player {} picked up {:?}", id + 1, power_up.kind);
            self.emit(GameEvent::PowerUpCollected {
                player: id,
                kind: power_up.kind,
            });
            self.emit(GameEvent::Sound(SoundCue::ItemPickup));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell_center;
    use crate::sim::grid::Tile;
    use crate::sim::state::PowerUpKind;
    use crate::sim::state::tests::open_state;

    const DT: f32 = 1.0 / 60.0;

    fn walk(state: &mut GameState, id: PlayerId, input: Vec2, secs: f32) {
        let steps = (secs / DT).round() as usize;
        for _ in 0..steps {
            state.move_player(id, input, DT);
            state.update_rolling(DT);
            state.update_bomb_solidity();
        }
    }

    #[test]
    fn test_moves_at_player_speed() {
        let mut state = open_state();
        state.move_player(0, Vec2::X, 0.1);
        let p = &state.players[0];
        assert!((p.pos.x - 1.8).abs() < 1e-5);
        assert_eq!(p.pos.y, 1.5);
        assert_eq!(p.facing, Direction::Right);
    }

    #[test]
    fn test_diagonal_input_is_normalized() {
        let mut state = open_state();
        state.move_player(0, Vec2::new(1.0, 1.0), 0.1);
        let moved = state.players[0].pos - cell_center(IVec2::ONE);
        assert!((moved.length() - 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_walls_stop_player_flush() {
        let mut state = open_state();
        walk(&mut state, 0, Vec2::NEG_X, 0.5);
        let x = state.players[0].pos.x;
        assert!((x - (1.0 + PLAYER_HALF_EXTENT + MOVE_SKIN)).abs() < 1e-5);
        assert_eq!(state.players[0].cell(), IVec2::new(1, 1));
    }

    #[test]
    fn test_slides_along_wall() {
        let mut state = open_state();
        walk(&mut state, 0, Vec2::new(-1.0, 1.0), 0.5);
        let p = &state.players[0];
        assert!((p.pos.x - 1.41).abs() < 1e-4);
        assert!(p.pos.y > 2.0);
    }

    #[test]
    fn test_frozen_and_disabled_players_stay_put() {
        let mut state = open_state();
        state.players[0].frozen = true;
        state.players[1].controls_enabled = false;
        walk(&mut state, 0, Vec2::X, 0.5);
        walk(&mut state, 1, Vec2::NEG_X, 0.5);
        assert_eq!(state.players[0].pos, cell_center(IVec2::new(1, 1)));
        assert_eq!(state.players[1].pos, cell_center(IVec2::new(7, 5)));
    }

    #[test]
    fn test_own_bomb_blocks_after_stepping_off() {
        let mut state = open_state();
        let id = state.place_bomb(0).unwrap();
        walk(&mut state, 0, Vec2::X, 0.5);
        assert!(state.players[0].pos.x > 2.4);
        assert!(state.bomb(id).unwrap().solid);

        walk(&mut state, 0, Vec2::NEG_X, 0.5);
        let x = state.players[0].pos.x;
        assert!((x - (2.0 + PLAYER_HALF_EXTENT + MOVE_SKIN)).abs() < 1e-4);
        // Solid bombs never roll
        assert_eq!(state.bomb(id).unwrap().cell, IVec2::new(1, 1));
    }

    #[test]
    fn test_running_into_fresh_bomb_kicks_it() {
        let mut state = open_state();
        state.players[0].pos = cell_center(IVec2::new(2, 3));
        state.players[1].pos = cell_center(IVec2::new(4, 3));
        let id = state.place_bomb(0).unwrap();

        walk(&mut state, 1, Vec2::NEG_X, 0.8);
        let bomb = state.bomb(id).unwrap();
        assert_eq!(bomb.cell, IVec2::new(1, 3));
        assert!(!bomb.is_rolling());
    }

    #[test]
    fn test_diagonal_push_kicks_along_hit_axis() {
        let mut state = open_state();
        state.players[0].pos = cell_center(IVec2::new(3, 3));
        state.players[1].pos = cell_center(IVec2::new(4, 3));
        let id = state.place_bomb(0).unwrap();

        // Equal components face Up, but the bomb was hit moving left
        walk(&mut state, 1, Vec2::new(-1.0, 1.0), 0.8);
        let bomb = state.bomb(id).unwrap();
        assert_eq!(bomb.cell, IVec2::new(1, 3));
        assert!(!bomb.is_rolling());
    }

    #[test]
    fn test_pickup_applies_effect() {
        let mut state = open_state();
        state.spawn_power_up(IVec2::new(2, 1), PowerUpKind::RangeUp);
        state.drain_events();
        walk(&mut state, 0, Vec2::X, 0.4);
        state.collect_power_ups();

        assert!(state.power_ups.is_empty());
        assert_eq!(state.players[0].blast_range, 2);
        assert_eq!(
            state.drain_events(),
            vec![
                GameEvent::PowerUpCollected {
                    player: 0,
                    kind: PowerUpKind::RangeUp
                },
                GameEvent::Sound(SoundCue::ItemPickup)
            ]
        );
    }

    #[test]
    fn test_locked_cells_block() {
        let mut state = open_state();
        state.grid.paint(IVec2::new(2, 1), Tile::Locked);
        walk(&mut state, 0, Vec2::X, 0.5);
        assert!(state.players[0].pos.x < 1.6);
    }
}
