#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns the player's attack action into combat commands.
//!
//! Both combat modes pick at most one target, scanning enemies in storage
//! order. Damage, projectile flight and scoring are resolved by the world.

use dungeon_crawl_core::{CombatMode, Command, EnemyId, EnemyView, TilePos, FIREBALL_RANGE};

/// Combat target selection for both combat modes.
#[derive(Debug, Default)]
pub struct Combat;

impl Combat {
    /// Creates a new combat system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Emits the command produced by one press of the attack action.
    ///
    /// Ranged mode emits nothing when no living enemy is within cast range.
    /// Melee mode always swings, with or without a target.
    pub fn handle(
        &self,
        mode: CombatMode,
        player: TilePos,
        enemies: &EnemyView,
        out: &mut Vec<Command>,
    ) {
        match mode {
            CombatMode::Ranged => {
                if let Some(target) = fireball_target(player, enemies) {
                    out.push(Command::LaunchFireball { target });
                }
            }
            CombatMode::Melee => out.push(Command::Swing {
                target: melee_target(player, enemies),
            }),
        }
    }
}

/// First living enemy within [`FIREBALL_RANGE`] tiles (Euclidean) of the player.
///
/// The scan stops at the first enemy in range; when that enemy shares the
/// player's tile there is no direction to aim, so nothing is cast.
#[must_use]
pub fn fireball_target(player: TilePos, enemies: &EnemyView) -> Option<EnemyId> {
    let (enemy, distance) = enemies
        .living()
        .map(|enemy| {
            let (dx, dy) = player.offset_to(enemy.tile);
            (enemy, ((dx * dx + dy * dy) as f32).sqrt())
        })
        .find(|(_, distance)| *distance <= FIREBALL_RANGE)?;
    (distance > 0.0).then_some(enemy.id)
}

/// First living enemy on one of the eight tiles around the player.
#[must_use]
pub fn melee_target(player: TilePos, enemies: &EnemyView) -> Option<EnemyId> {
    enemies
        .living()
        .find(|enemy| enemy.tile.chebyshev_distance(player) == 1)
        .map(|enemy| enemy.id)
}
