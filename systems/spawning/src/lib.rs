#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawning system responsible for placing enemies when a session starts.

use dungeon_crawl_core::{
    Command, Event, Tile, TileGrid, TilePos, DEFAULT_ENEMY_COUNT, MIN_SPAWN_DISTANCE,
};
use rand::{seq::SliceRandom, Rng};

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    enemy_count: usize,
}

impl Config {
    /// Creates a new configuration placing `enemy_count` enemies per session.
    #[must_use]
    pub const fn new(enemy_count: usize) -> Self {
        Self { enemy_count }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_ENEMY_COUNT)
    }
}

/// Pure system that emits enemy spawn commands whenever a session is configured.
#[derive(Debug)]
pub struct Spawning {
    enemy_count: usize,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            enemy_count: config.enemy_count,
        }
    }

    /// Consumes world events and emits one spawn command per enemy after a
    /// `SessionConfigured` event.
    ///
    /// Enemies land on distinct floor tiles at least [`MIN_SPAWN_DISTANCE`]
    /// away from the start. Fewer enemies are placed when the grid lacks room.
    pub fn handle<R: Rng + ?Sized>(
        &self,
        events: &[Event],
        grid: &TileGrid,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) {
        let configured = events
            .iter()
            .any(|event| matches!(event, Event::SessionConfigured { .. }));
        if !configured || self.enemy_count == 0 {
            return;
        }

        let candidates = spawn_candidates(grid);
        out.extend(
            candidates
                .choose_multiple(rng, self.enemy_count)
                .map(|tile| Command::SpawnEnemy { tile: *tile }),
        );
    }
}

/// Enumerates every tile an enemy may start on.
#[must_use]
pub fn spawn_candidates(grid: &TileGrid) -> Vec<TilePos> {
    let start = grid.start();
    grid.iter()
        .filter(|(tile, contents)| {
            *contents == Tile::Floor
                && *tile != start
                && tile.manhattan_distance(start) >= MIN_SPAWN_DISTANCE
        })
        .map(|(tile, _)| tile)
        .collect()
}
