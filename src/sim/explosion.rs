//! Explosion propagation
//!
//! A detonating bomb sends four arms out (up, down, left, right, always in
//! that order) up to its range. Walls stop an arm dead; a brick, a power-up
//! or another bomb absorbs it and caps it. Bombs hit by an arm go off at once
//! and their own arm back toward the source is suppressed. Everything runs
//! synchronously: a detonation and its whole chain finish before anything
//! else happens on the board.

use glam::IVec2;
use rand::Rng;
use rand::seq::IndexedRandom;

use super::events::{GameEvent, SegmentKind, SoundCue};
use super::grid::{Direction, Tile};
use super::state::{GameState, PendingDrop, PlayerId, PowerUpKind, RollState};
use crate::world_to_cell;

/// One cell reached by a blast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub cell: IVec2,
    pub kind: SegmentKind,
}

/// The cells a blast reached in one direction, nearest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplosionArm {
    pub direction: Direction,
    pub segments: Vec<Segment>,
}

/// Shape of a single bomb's blast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explosion {
    pub bomb_id: u32,
    pub origin: IVec2,
    /// Direction that was not propagated (chain reactions only)
    pub blocked: Option<Direction>,
    pub arms: Vec<ExplosionArm>,
}

impl Explosion {
    pub fn arm(&self, direction: Direction) -> Option<&ExplosionArm> {
        self.arms.iter().find(|a| a.direction == direction)
    }

    /// Origin plus every arm cell
    pub fn cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        std::iter::once(self.origin)
            .chain(self.arms.iter().flat_map(|a| a.segments.iter().map(|s| s.cell)))
    }
}

/// Everything a detonation (including its chain) changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetonationReport {
    /// One entry per bomb that went off, recorded when its blast finishes
    /// (a chained bomb comes before the bomb that set it off)
    pub explosions: Vec<Explosion>,
    /// Bricks broken
    pub destroyed_cells: Vec<IVec2>,
    pub eliminated: Vec<PlayerId>,
    /// Bombs set off by another blast
    pub chained: Vec<u32>,
    /// Cells whose power-up was burned
    pub destroyed_power_ups: Vec<IVec2>,
}

impl DetonationReport {
    pub fn is_empty(&self) -> bool {
        self.explosions.is_empty()
    }
}

impl GameState {
    /// Set off a bomb now. A bomb that already went off (or no longer
    /// exists) is left alone and the report is empty.
    pub fn detonate(&mut self, bomb_id: u32) -> DetonationReport {
        let mut report = DetonationReport::default();
        self.detonate_into(bomb_id, &mut report);
        report
    }

    fn detonate_into(&mut self, bomb_id: u32, report: &mut DetonationReport) {
        let Some(bomb) = self.bombs.iter_mut().find(|b| b.id == bomb_id) else {
            return;
        };
        if bomb.exploded {
            return;
        }
        bomb.exploded = true;
        // A rolling bomb goes off where it currently is
        bomb.roll = RollState::Idle;
        bomb.cell = world_to_cell(bomb.pos);

        let origin = bomb.cell;
        let range = bomb.range as i32;
        let blocked = bomb.blocked;
        let owner = bomb.owner;

        log::debug!(
            "Bomb {} detonates at ({}, {}) range {} blocked {:?}",
            bomb_id,
            origin.x,
            origin.y,
            range,
            blocked
        );
        self.emit(GameEvent::Sound(SoundCue::Explosion));
        self.emit(GameEvent::ExplosionSegment {
            cell: origin,
            direction: None,
            kind: SegmentKind::Center,
        });
        self.burn_players(origin, report);

        let mut explosion = Explosion {
            bomb_id,
            origin,
            blocked,
            arms: Vec::with_capacity(4),
        };

        for direction in Direction::ALL {
            if blocked == Some(direction) {
                continue;
            }

            let mut segments = Vec::new();
            let mut chain = None;

            for step in 1..=range {
                let cell = origin + direction.offset() * step;
                match self.grid.tile(cell) {
                    Tile::Destructible => {
                        self.break_brick(cell);
                        report.destroyed_cells.push(cell);
                        segments.push(Segment {
                            cell,
                            kind: SegmentKind::End,
                        });
                        break;
                    }
                    Tile::Open => {
                        if self.destroy_power_up_at(cell) {
                            report.destroyed_power_ups.push(cell);
                            segments.push(Segment {
                                cell,
                                kind: SegmentKind::End,
                            });
                            break;
                        }

                        if let Some(other) = self
                            .bombs
                            .iter_mut()
                            .find(|b| b.id != bomb_id && b.cell == cell)
                        {
                            if !other.exploded {
                                other.blocked = Some(direction.opposite());
                                chain = Some(other.id);
                            }
                            segments.push(Segment {
                                cell,
                                kind: SegmentKind::End,
                            });
                            break;
                        }

                        let kind = if step == range {
                            SegmentKind::End
                        } else {
                            SegmentKind::Middle
                        };
                        segments.push(Segment { cell, kind });
                    }
                    Tile::Wall | Tile::Locked => break,
                }
            }

            for segment in &segments {
                self.emit(GameEvent::ExplosionSegment {
                    cell: segment.cell,
                    direction: Some(direction),
                    kind: segment.kind,
                });
                self.burn_players(segment.cell, report);
            }
            explosion.arms.push(ExplosionArm {
                direction,
                segments,
            });

            if let Some(chained_id) = chain {
                log::debug!("Bomb {bomb_id} sets off bomb {chained_id}");
                report.chained.push(chained_id);
                self.detonate_into(chained_id, report);
            }
        }

        // Free the owner's slot and drop the bomb
        if let Some(index) = self.bombs.iter().position(|b| b.id == bomb_id) {
            self.bombs.remove(index);
        }
        if let Some(p) = self.players.get_mut(owner) {
            p.active_bombs = p.active_bombs.saturating_sub(1);
        }

        report.explosions.push(explosion);
    }

    fn burn_players(&mut self, cell: IVec2, report: &mut DetonationReport) {
        for player in self.players_at(cell) {
            if self.eliminate_player(player) {
                report.eliminated.push(player);
            }
        }
    }

    /// Break a brick and maybe hide a power-up under it
    fn break_brick(&mut self, cell: IVec2) {
        if !self.grid.destroy_brick(cell) {
            return;
        }
        let drop = self.roll_power_up();
        if let Some(kind) = drop {
            self.pending_drops.push(PendingDrop {
                cell,
                kind,
                remaining: self.settings.power_up_reveal_secs,
            });
        }
        self.emit(GameEvent::DestructionEffect {
            cell,
            pending_power_up: drop,
        });
    }

    /// Weighted drop roll, then a uniform pick among the configured kinds
    fn roll_power_up(&mut self) -> Option<PowerUpKind> {
        let chance = self.settings.power_up_chance;
        if chance <= 0.0 || self.settings.power_up_kinds.is_empty() {
            return None;
        }
        if self.rng.random::<f32>() >= chance {
            return None;
        }
        self.settings.power_up_kinds.choose(&mut self.rng).copied()
    }

    /// Burn fuses and set off every bomb whose time is up, one full chain at
    /// a time, in bomb id order
    pub(crate) fn update_fuses(&mut self, dt: f32) {
        let mut due = Vec::new();
        for bomb in self.bombs.iter_mut().filter(|b| !b.exploded) {
            bomb.fuse -= dt;
            if bomb.fuse <= 0.0 {
                due.push(bomb.id);
            }
        }
        for id in due {
            self.detonate(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::Grid;
    use crate::sim::state::tests::{open_state, state_on};
    use proptest::prelude::*;

    /// 11x11 floor board with a wall ring; players parked in far corners
    fn board(rows: &[&str]) -> GameState {
        state_on(Grid::from_rows(rows), vec![IVec2::new(1, 1), IVec2::new(9, 9)])
    }

    fn empty_board() -> GameState {
        board(&[
            "###########",
            "#.........#",
            "#.........#",
            "#.........#",
            "#.........#",
            "#.........#",
            "#.........#",
            "#.........#",
            "#.........#",
            "#.........#",
            "###########",
        ])
    }

    fn seg(x: i32, y: i32, kind: SegmentKind) -> Segment {
        Segment {
            cell: IVec2::new(x, y),
            kind,
        }
    }

    #[test]
    fn test_wall_stops_arm() {
        let mut state = empty_board();
        state.grid.paint(IVec2::new(7, 5), Tile::Wall);
        let id = state.spawn_bomb(0, IVec2::new(5, 5), 2, 2.0);

        let report = state.detonate(id);
        let explosion = &report.explosions[0];
        let right = explosion.arm(Direction::Right).unwrap();
        assert_eq!(right.segments, vec![seg(6, 5, SegmentKind::Middle)]);
        assert!(explosion.cells().all(|c| c.x < 7 || c.y != 5));

        let left = explosion.arm(Direction::Left).unwrap();
        assert_eq!(
            left.segments,
            vec![seg(4, 5, SegmentKind::Middle), seg(3, 5, SegmentKind::End)]
        );
    }

    #[test]
    fn test_first_brick_absorbs_blast() {
        let mut state = empty_board();
        state.grid.paint(IVec2::new(5, 7), Tile::Destructible);
        state.grid.paint(IVec2::new(5, 8), Tile::Destructible);
        let id = state.spawn_bomb(0, IVec2::new(5, 5), 4, 2.0);

        let report = state.detonate(id);
        assert_eq!(report.destroyed_cells, vec![IVec2::new(5, 7)]);
        assert_eq!(state.grid.tile(IVec2::new(5, 7)), Tile::Open);
        assert_eq!(state.grid.tile(IVec2::new(5, 8)), Tile::Destructible);
        let up = report.explosions[0].arm(Direction::Up).unwrap();
        assert_eq!(
            up.segments,
            vec![seg(5, 6, SegmentKind::Middle), seg(5, 7, SegmentKind::End)]
        );
    }

    #[test]
    fn test_detonate_is_idempotent() {
        let mut state = empty_board();
        state.grid.paint(IVec2::new(6, 5), Tile::Destructible);
        let id = state.spawn_bomb(0, IVec2::new(5, 5), 2, 2.0);

        let first = state.detonate(id);
        assert!(!first.is_empty());
        let grid = state.grid.clone();
        state.drain_events();

        let second = state.detonate(id);
        assert!(second.is_empty());
        assert_eq!(state.grid, grid);
        assert!(state.events().is_empty());
        assert_eq!(state.players[0].active_bombs, 0);
    }

    #[test]
    fn test_adjacent_bomb_chains_without_backfire() {
        let mut state = empty_board();
        let a = state.spawn_bomb(0, IVec2::new(3, 3), 1, 2.0);
        let b = state.spawn_bomb(1, IVec2::new(4, 3), 1, 2.0);

        let report = state.detonate(a);
        assert_eq!(report.chained, vec![b]);
        assert_eq!(report.explosions.len(), 2);

        let chained = report.explosions.iter().find(|e| e.bomb_id == b).unwrap();
        assert_eq!(chained.blocked, Some(Direction::Left));
        assert!(chained.arm(Direction::Left).is_none());
        assert!(chained.cells().all(|c| c != IVec2::new(3, 3)));

        // Source arm is capped on the chained bomb
        let source = report.explosions.iter().find(|e| e.bomb_id == a).unwrap();
        assert_eq!(
            source.arm(Direction::Right).unwrap().segments,
            vec![seg(4, 3, SegmentKind::End)]
        );
        assert!(state.bombs.is_empty());
        assert_eq!(state.players[0].active_bombs, 0);
        assert_eq!(state.players[1].active_bombs, 0);
    }

    #[test]
    fn test_bomb_cycle_terminates() {
        let mut state = empty_board();
        let ids: Vec<u32> = [(3, 3), (4, 3), (4, 4), (3, 4)]
            .iter()
            .map(|&(x, y)| state.spawn_bomb(0, IVec2::new(x, y), 3, 2.0))
            .collect();

        let report = state.detonate(ids[0]);
        assert_eq!(report.explosions.len(), 4);
        assert_eq!(report.chained.len(), 3);
        assert!(state.bombs.is_empty());
        for explosion in &report.explosions {
            let count = report
                .explosions
                .iter()
                .filter(|e| e.bomb_id == explosion.bomb_id)
                .count();
            assert_eq!(count, 1);
        }
    }

    #[test]
    fn test_blast_kills_players_on_arm_and_center() {
        let mut state = empty_board();
        state.players[0].pos = crate::cell_center(IVec2::new(5, 5));
        state.players[1].pos = crate::cell_center(IVec2::new(5, 3));
        let id = state.spawn_bomb(0, IVec2::new(5, 5), 2, 2.0);

        let report = state.detonate(id);
        assert_eq!(report.eliminated, vec![0, 1]);
        assert!(state.players.iter().all(|p| !p.alive));
        assert_eq!(state.round.eliminated(), &[0, 1]);
    }

    #[test]
    fn test_power_up_absorbs_blast() {
        let mut state = empty_board();
        state.spawn_power_up(IVec2::new(6, 5), PowerUpKind::RangeUp);
        let id = state.spawn_bomb(0, IVec2::new(5, 5), 3, 2.0);

        let report = state.detonate(id);
        assert_eq!(report.destroyed_power_ups, vec![IVec2::new(6, 5)]);
        assert!(state.power_ups.is_empty());
        assert_eq!(
            report.explosions[0].arm(Direction::Right).unwrap().segments,
            vec![seg(6, 5, SegmentKind::End)]
        );
    }

    #[test]
    fn test_locked_cells_stop_arm() {
        let mut state = empty_board();
        state.grid.paint(IVec2::new(5, 4), Tile::Locked);
        let id = state.spawn_bomb(0, IVec2::new(5, 5), 3, 2.0);
        let report = state.detonate(id);
        assert!(report.explosions[0].arm(Direction::Down).unwrap().segments.is_empty());
    }

    #[test]
    fn test_brick_drop_is_deferred() {
        let mut state = empty_board();
        state.settings.power_up_chance = 1.0;
        state.settings.power_up_kinds = vec![PowerUpKind::BombCapacityUp];
        state.grid.paint(IVec2::new(5, 6), Tile::Destructible);
        let id = state.spawn_bomb(0, IVec2::new(5, 5), 1, 2.0);

        state.detonate(id);
        assert!(state.power_ups.is_empty());
        assert_eq!(state.pending_drops.len(), 1);
        assert!(state.events().contains(&GameEvent::DestructionEffect {
            cell: IVec2::new(5, 6),
            pending_power_up: Some(PowerUpKind::BombCapacityUp),
        }));

        state.update_pending_drops(1.0);
        assert_eq!(
            state.power_up_at(IVec2::new(5, 6)).unwrap().kind,
            PowerUpKind::BombCapacityUp
        );
    }

    #[test]
    fn test_fuses_expire_in_order() {
        let mut state = open_state();
        let slow = state.spawn_bomb(0, IVec2::new(2, 3), 1, 1.0);
        let fast = state.spawn_bomb(1, IVec2::new(6, 3), 1, 0.5);

        state.update_fuses(0.6);
        assert!(state.bomb(fast).is_none());
        assert!(state.bomb(slow).is_some());

        state.update_fuses(0.6);
        assert!(state.bombs.is_empty());
    }

    #[test]
    fn test_rolling_bomb_detonates_where_it_is() {
        let mut state = empty_board();
        let id = state.spawn_bomb(1, IVec2::new(3, 5), 1, 2.0);
        if let Some(bomb) = state.bombs.iter_mut().find(|b| b.id == id) {
            bomb.roll = RollState::Rolling {
                direction: Direction::Right,
                from: IVec2::new(3, 5),
                to: IVec2::new(4, 5),
                progress: 0.7,
            };
            bomb.pos = crate::cell_center(IVec2::new(3, 5))
                .lerp(crate::cell_center(IVec2::new(4, 5)), 0.7);
        }
        let report = state.detonate(id);
        assert_eq!(report.explosions[0].origin, IVec2::new(4, 5));
    }

    proptest! {
        #[test]
        fn prop_arms_respect_walls_and_bricks(
            tiles in proptest::collection::vec(0u8..4, 81),
            range in 1u32..6,
        ) {
            let mut state = empty_board();
            let origin = IVec2::new(5, 5);
            for (i, t) in tiles.iter().enumerate() {
                let cell = IVec2::new(1 + (i % 9) as i32, 1 + (i / 9) as i32);
                if cell == origin || cell == IVec2::new(1, 1) || cell == IVec2::new(9, 9) {
                    continue;
                }
                let tile = match *t {
                    0 => Tile::Wall,
                    1 => Tile::Destructible,
                    _ => Tile::Open,
                };
                state.grid.paint(cell, tile);
            }
            let before = state.grid.clone();
            let id = state.spawn_bomb(0, origin, range, 2.0);
            let report = state.detonate(id);
            let explosion = &report.explosions[0];

            for arm in &explosion.arms {
                let bricks: Vec<_> = arm
                    .segments
                    .iter()
                    .filter(|s| before.tile(s.cell) == Tile::Destructible)
                    .collect();
                prop_assert!(bricks.len() <= 1);
                if let Some(brick) = bricks.first() {
                    prop_assert_eq!(arm.segments.last().map(|s| s.cell), Some(brick.cell));
                }
                for (i, segment) in arm.segments.iter().enumerate() {
                    let expected = origin + arm.direction.offset() * (i as i32 + 1);
                    prop_assert_eq!(segment.cell, expected);
                    prop_assert_ne!(before.tile(segment.cell), Tile::Wall);
                }
                prop_assert!(arm.segments.len() <= range as usize);
            }
            prop_assert_eq!(
                report.destroyed_cells.len(),
                before.count(Tile::Destructible) - state.grid.count(Tile::Destructible)
            );
        }
    }
}
