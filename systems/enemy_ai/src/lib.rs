#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure enemy decision system.
//!
//! Each AI pass inspects immutable enemy snapshots and emits one
//! [`Command::EnemyThink`] per living enemy that acts. The world re-validates
//! every decision before applying it.

use dungeon_crawl_core::{
    Command, Direction, EnemyDecision, EnemySnapshot, EnemyView, TileGrid, TilePos,
    ENEMY_SIGHT_RANGE, PATROL_REST_MAX, PATROL_REST_MIN,
};
use rand::{seq::SliceRandom, Rng};

/// Configuration parameters for the enemy AI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    sight_range: u32,
}

impl Config {
    /// Creates a configuration with the provided Manhattan sight range.
    #[must_use]
    pub const fn new(sight_range: u32) -> Self {
        Self { sight_range }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(ENEMY_SIGHT_RANGE)
    }
}

/// Patrol, chase and flee state machine shared by every enemy.
#[derive(Debug, Default)]
pub struct EnemyAi {
    config: Config,
}

impl EnemyAi {
    /// Creates a new AI system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs one AI pass over every living enemy in storage order.
    pub fn handle<R: Rng + ?Sized>(
        &self,
        enemies: &EnemyView,
        player: TilePos,
        grid: &TileGrid,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) {
        for enemy in enemies.living() {
            if let Some(decision) = self.decide(enemy, player, grid, rng) {
                out.push(Command::EnemyThink {
                    enemy: enemy.id,
                    decision,
                });
            }
        }
    }

    /// Chooses what a single enemy does this AI tick.
    ///
    /// Returns `None` when the enemy is dead or has nowhere to go.
    pub fn decide<R: Rng + ?Sized>(
        &self,
        enemy: &EnemySnapshot,
        player: TilePos,
        grid: &TileGrid,
        rng: &mut R,
    ) -> Option<EnemyDecision> {
        if !enemy.alive {
            return None;
        }
        if enemy.move_cooldown > 0 {
            return Some(EnemyDecision::CoolDown);
        }

        if enemy.health.current() <= 1 {
            let to = axis_step(enemy.tile, player, Heading::Away)?;
            return grid.is_floor(to).then_some(EnemyDecision::Flee { to });
        }

        if enemy.can_see(player, self.config.sight_range) {
            let to = axis_step(enemy.tile, player, Heading::Toward)?;
            let open = grid.is_floor(to) || (grid.is_walkable(to) && enemy.move_cooldown == 0);
            return open.then_some(EnemyDecision::Chase { to });
        }

        if enemy.patrol_cooldown > 0 {
            return Some(EnemyDecision::Rest);
        }
        let neighbours: Vec<TilePos> = Direction::PATROL_ORDER
            .iter()
            .filter_map(|direction| enemy.tile.step(*direction))
            .filter(|tile| grid.is_floor(*tile))
            .collect();
        let to = *neighbours.choose(rng)?;
        let rest = rng.gen_range(PATROL_REST_MIN..PATROL_REST_MAX);
        Some(EnemyDecision::Patrol { to, rest })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Heading {
    Toward,
    Away,
}

/// Single orthogonal step relative to the player along the dominant axis.
///
/// Columns win only when strictly further apart than rows; equal non-zero
/// offsets step along the row axis. Coincident tiles yield no step.
fn axis_step(from: TilePos, player: TilePos, heading: Heading) -> Option<TilePos> {
    let (dx, dy) = from.offset_to(player);
    let (step_x, step_y) = if dx.abs() > dy.abs() {
        (dx.signum(), 0)
    } else if dy != 0 {
        (0, dy.signum())
    } else {
        return None;
    };
    let (step_x, step_y) = match heading {
        Heading::Toward => (step_x, step_y),
        Heading::Away => (-step_x, -step_y),
    };
    from.offset(step_x as i32, step_y as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_offset_dominates_only_when_strictly_larger() {
        let enemy = TilePos::new(5, 5);
        assert_eq!(
            axis_step(enemy, TilePos::new(8, 6), Heading::Toward),
            Some(TilePos::new(6, 5))
        );
        assert_eq!(
            axis_step(enemy, TilePos::new(7, 7), Heading::Toward),
            Some(TilePos::new(5, 6))
        );
        assert_eq!(
            axis_step(enemy, TilePos::new(7, 7), Heading::Away),
            Some(TilePos::new(5, 4))
        );
    }

    #[test]
    fn coincident_tiles_produce_no_step() {
        let tile = TilePos::new(3, 3);
        assert_eq!(axis_step(tile, tile, Heading::Toward), None);
        assert_eq!(axis_step(tile, tile, Heading::Away), None);
    }

    #[test]
    fn fleeing_off_the_grid_edge_is_impossible() {
        assert_eq!(
            axis_step(TilePos::new(0, 4), TilePos::new(2, 4), Heading::Away),
            None
        );
    }
}
