//! Level generation
//!
//! Builds the starting board of a round: an outer wall ring, a checkerboard
//! of pillars, and bricks scattered over the remaining floor. Spawn corners
//! are kept clear so every player can move and drop a first bomb.

use glam::IVec2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::grid::{Grid, Tile};
use crate::error::ConfigError;
use crate::settings::LevelConfig;

/// A generated board plus where the players start
#[derive(Debug, Clone)]
pub struct Level {
    pub grid: Grid,
    /// Spawn cells in player order: bottom-left, top-right, bottom-right, top-left
    pub spawns: Vec<IVec2>,
    /// Seed the bricks were shuffled with
    pub seed: u64,
    /// Number of cells that were eligible for a brick
    pub candidate_count: usize,
}

/// Interior corner cells of a board, in player order
pub fn spawn_corners(width: i32, height: i32) -> Vec<IVec2> {
    let (lo_x, lo_y) = (1, 1);
    let (hi_x, hi_y) = (width - 2, height - 2);
    let mut corners = Vec::with_capacity(4);
    for corner in [
        IVec2::new(lo_x, lo_y),
        IVec2::new(hi_x, hi_y),
        IVec2::new(hi_x, lo_y),
        IVec2::new(lo_x, hi_y),
    ] {
        // Degenerate boards collapse corners onto each other
        if !corners.contains(&corner) {
            corners.push(corner);
        }
    }
    corners
}

/// Whether `cell` lies within Chebyshev distance `radius` of any corner
fn in_safe_zone(cell: IVec2, corners: &[IVec2], radius: u32) -> bool {
    let r = radius as i32;
    corners.iter().any(|c| {
        let d = (cell - *c).abs();
        d.x <= r && d.y <= r
    })
}

/// Generate a level, seeded if `seed` is given
pub fn generate_level(config: &LevelConfig, seed: Option<u64>) -> Result<Level, ConfigError> {
    let seed = seed.unwrap_or_else(|| {
        let seed = rand::random::<u64>();
        log::info!("No level seed configured, using random seed {seed}");
        seed
    });
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut level = generate_level_with_rng(config, &mut rng)?;
    level.seed = seed;
    Ok(level)
}

/// Generate a level using an injected random source
pub fn generate_level_with_rng<R: Rng + ?Sized>(
    config: &LevelConfig,
    rng: &mut R,
) -> Result<Level, ConfigError> {
    config.validate()?;

    let (width, height) = (config.width, config.height);
    let (inner_w, inner_h) = (config.inner_width(), config.inner_height());
    let corners = spawn_corners(width, height);

    // Interior starts as floor; the outer ring is wall
    let mut grid = Grid::new(width, height);
    for x in 0..width {
        grid.paint(IVec2::new(x, 0), Tile::Wall);
        grid.paint(IVec2::new(x, height - 1), Tile::Wall);
    }
    for y in 0..height {
        grid.paint(IVec2::new(0, y), Tile::Wall);
        grid.paint(IVec2::new(width - 1, y), Tile::Wall);
    }

    // Pillars at odd interior offsets
    let mut pillars = 0;
    for iy in (1..=inner_h - 2).step_by(2) {
        for ix in (1..=inner_w - 2).step_by(2) {
            let cell = IVec2::new(ix + 1, iy + 1);
            if in_safe_zone(cell, &corners, config.pillar_safe_radius) {
                continue;
            }
            grid.paint(cell, Tile::Wall);
            pillars += 1;
        }
    }

    let mut candidates: Vec<IVec2> = (1..=inner_h)
        .flat_map(|y| (1..=inner_w).map(move |x| IVec2::new(x, y)))
        .filter(|&cell| grid.tile(cell) == Tile::Open)
        .filter(|&cell| !in_safe_zone(cell, &corners, config.destructible_safe_radius))
        .collect();
    let candidate_count = candidates.len();

    candidates.shuffle(rng);
    // Halves round to even: 101 candidates at 0.5 give 50 bricks
    let target = (candidate_count as f32 * config.fill_ratio).round_ties_even() as usize;
    for &cell in candidates.iter().take(target) {
        grid.paint(cell, Tile::Destructible);
    }

    log::info!(
        "Level generated: {}x{} (inner {}x{}), {} pillars, {}/{} bricks",
        width,
        height,
        inner_w,
        inner_h,
        pillars,
        target.min(candidate_count),
        candidate_count
    );

    Ok(Level {
        grid,
        spawns: corners,
        seed: 0,
        candidate_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(fill_ratio: f32) -> LevelConfig {
        LevelConfig {
            fill_ratio,
            ..LevelConfig::default()
        }
    }

    #[test]
    fn test_default_board_scenario() {
        let level = generate_level(&config(0.55), Some(42)).unwrap();
        // 113 interior floor cells minus 12 corner safe cells
        assert_eq!(level.candidate_count, 101);
        let expected = (level.candidate_count as f32 * 0.55).round_ties_even() as usize;
        assert_eq!(expected, 56);
        assert_eq!(level.grid.count(Tile::Destructible), expected);
        assert_eq!(level.seed, 42);
    }

    #[test]
    fn test_half_brick_rounds_to_even() {
        let level = generate_level(&config(0.5), Some(42)).unwrap();
        assert_eq!(level.candidate_count, 101);
        assert_eq!(level.grid.count(Tile::Destructible), 50);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let a = generate_level(&config(0.55), Some(42)).unwrap();
        let b = generate_level(&config(0.55), Some(42)).unwrap();
        assert_eq!(a.grid, b.grid);

        let c = generate_level(&config(0.55), Some(43)).unwrap();
        assert_eq!(
            a.grid.count(Tile::Destructible),
            c.grid.count(Tile::Destructible)
        );
    }

    #[test]
    fn test_fill_extremes() {
        let empty = generate_level(&config(0.0), Some(1)).unwrap();
        assert_eq!(empty.grid.count(Tile::Destructible), 0);

        let full = generate_level(&config(1.0), Some(1)).unwrap();
        assert_eq!(full.grid.count(Tile::Destructible), full.candidate_count);
    }

    #[test]
    fn test_walls_and_pillars() {
        let level = generate_level(&config(0.0), Some(1)).unwrap();
        let grid = &level.grid;
        for x in 0..grid.width() {
            assert_eq!(grid.tile(IVec2::new(x, 0)), Tile::Wall);
            assert_eq!(grid.tile(IVec2::new(x, grid.height() - 1)), Tile::Wall);
        }
        // Interior offset (1, 1) is board cell (2, 2)
        assert_eq!(grid.tile(IVec2::new(2, 2)), Tile::Wall);
        assert_eq!(grid.tile(IVec2::new(3, 2)), Tile::Open);
        // 6 x 5 pillars plus the ring
        let ring = 2 * 15 + 2 * 11;
        assert_eq!(grid.count(Tile::Wall), ring + 30);
    }

    #[test]
    fn test_spawn_corners_stay_clear() {
        let level = generate_level(&config(1.0), Some(9)).unwrap();
        assert_eq!(
            level.spawns,
            vec![
                IVec2::new(1, 1),
                IVec2::new(13, 11),
                IVec2::new(13, 1),
                IVec2::new(1, 11)
            ]
        );
        for &spawn in &level.spawns {
            assert_eq!(level.grid.tile(spawn), Tile::Open);
            // Radius 1: the neighbours along the walls are free as well
            let inward_x = if spawn.x == 1 { 1 } else { -1 };
            let inward_y = if spawn.y == 1 { 1 } else { -1 };
            assert_eq!(level.grid.tile(spawn + IVec2::new(inward_x, 0)), Tile::Open);
            assert_eq!(level.grid.tile(spawn + IVec2::new(0, inward_y)), Tile::Open);
        }
    }

    #[test]
    fn test_pillar_safe_radius_removes_corner_pillars() {
        let cfg = LevelConfig {
            pillar_safe_radius: 1,
            fill_ratio: 0.0,
            ..LevelConfig::default()
        };
        let level = generate_level(&cfg, Some(3)).unwrap();
        assert_eq!(level.grid.tile(IVec2::new(2, 2)), Tile::Open);
        assert_eq!(level.grid.tile(IVec2::new(4, 2)), Tile::Wall);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let cfg = LevelConfig {
            width: 2,
            ..LevelConfig::default()
        };
        assert!(matches!(
            generate_level(&cfg, Some(1)),
            Err(ConfigError::BoardTooSmall { .. })
        ));
        assert!(matches!(
            generate_level(&config(-0.1), Some(1)),
            Err(ConfigError::FillRatio(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_bricks_avoid_safe_zones_and_pillars(
            seed in any::<u64>(),
            fill in 0.0f32..=1.0,
            width in 3i32..20,
            height in 3i32..20,
            pillar_radius in 0u32..2,
            brick_radius in 0u32..3,
        ) {
            let cfg = LevelConfig {
                width,
                height,
                fill_ratio: fill,
                pillar_safe_radius: pillar_radius,
                destructible_safe_radius: brick_radius,
            };
            let level = generate_level(&cfg, Some(seed)).unwrap();
            let bare = generate_level(&LevelConfig { fill_ratio: 0.0, ..cfg }, Some(seed)).unwrap();

            let bricks: Vec<IVec2> = level
                .grid
                .cells()
                .filter(|&c| level.grid.tile(c) == Tile::Destructible)
                .collect();
            prop_assert!(bricks.len() <= level.candidate_count);
            for &cell in &bricks {
                prop_assert!(!in_safe_zone(cell, &level.spawns, brick_radius));
                // Never on the wall ring or a pillar
                prop_assert_eq!(bare.grid.tile(cell), Tile::Open);
            }
            // Bricks only replace floor; walls are identical with or without them
            prop_assert_eq!(level.grid.count(Tile::Wall), bare.grid.count(Tile::Wall));
            for &spawn in &level.spawns {
                prop_assert_eq!(level.grid.tile(spawn), Tile::Open);
            }
        }
    }
}
