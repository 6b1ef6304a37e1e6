#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for Dungeon Crawl.
//!
//! The world owns the tile grid, the player, the enemy arena and the active
//! projectiles. It is mutated exclusively through [`apply`]; illegal commands
//! are ignored without emitting events.

mod enemy;
mod mood;
mod player;

use dungeon_crawl_core::{
    CombatMode, Command, EnemyDecision, EnemyId, Event, ExpiryReason, Outcome, ProjectileId,
    ScoreReason, TileGrid, TilePoint, TilePos, ATTACK_INDICATOR_FRAMES, CLEAR_BONUS,
    DEFAULT_COLUMNS, DEFAULT_ROWS, FIREBALL_HIT_EXTENT, FIREBALL_RANGE, FIREBALL_SPEED,
    KILL_SCORE, MIN_SPAWN_DISTANCE,
};

use crate::{enemy::Enemy, player::Player};

/// Represents the authoritative Dungeon Crawl session state.
#[derive(Debug)]
pub struct World {
    grid: TileGrid,
    combat: CombatMode,
    player: Player,
    enemies: Vec<Enemy>,
    projectiles: Vec<Projectile>,
    next_projectile: u32,
    score: u32,
    outcome: Option<Outcome>,
    attack_indicator: u32,
    clear_bonus_awarded: bool,
}

impl World {
    /// Creates a world holding an open default grid and no enemies.
    #[must_use]
    pub fn new() -> Self {
        Self::with_grid(TileGrid::open(DEFAULT_COLUMNS, DEFAULT_ROWS), CombatMode::default())
    }

    fn with_grid(grid: TileGrid, combat: CombatMode) -> Self {
        let player = Player::spawn(grid.start());
        Self {
            grid,
            combat,
            player,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            next_projectile: 0,
            score: 0,
            outcome: None,
            attack_indicator: 0,
            clear_bonus_awarded: false,
        }
    }

    fn enemy_mut(&mut self, enemy: EnemyId) -> Option<&mut Enemy> {
        usize::try_from(enemy.get())
            .ok()
            .and_then(|index| self.enemies.get_mut(index))
    }

    fn award(&mut self, amount: u32, reason: ScoreReason, out_events: &mut Vec<Event>) {
        if amount == 0 {
            return;
        }
        self.score = self.score.saturating_add(amount);
        out_events.push(Event::ScoreAwarded {
            amount,
            reason,
            total: self.score,
        });
    }

    fn heal_player(&mut self, amount: u32, out_events: &mut Vec<Event>) {
        self.player.heal(amount);
        out_events.push(Event::PlayerHealed {
            health: self.player.health().current(),
        });
    }

    fn finish(&mut self, outcome: Outcome, out_events: &mut Vec<Event>) {
        self.outcome = Some(outcome);
        self.projectiles.clear();
        out_events.push(Event::SessionEnded {
            outcome,
            score: self.score,
        });
    }

    fn defeated_count(&self) -> u32 {
        let defeated = self.enemies.iter().filter(|enemy| !enemy.is_alive()).count();
        u32::try_from(defeated).unwrap_or(u32::MAX)
    }

    /// Damages the enemy and reports whether the hit killed it.
    fn strike(&mut self, target: EnemyId, out_events: &mut Vec<Event>) -> bool {
        let Some(enemy) = self.enemy_mut(target) else {
            return false;
        };
        let killed = enemy.take_damage();
        out_events.push(Event::EnemyDamaged {
            enemy: target,
            health: enemy.health().current(),
        });
        if killed {
            out_events.push(Event::EnemyDefeated { enemy: target });
        }
        killed
    }

    fn spawn_enemy(&mut self, tile: TilePos, out_events: &mut Vec<Event>) {
        let start = self.grid.start();
        if !self.grid.is_floor(tile)
            || tile == start
            || tile.manhattan_distance(start) < MIN_SPAWN_DISTANCE
        {
            log::trace!("rejecting enemy spawn on {tile:?}");
            return;
        }
        let Ok(index) = u32::try_from(self.enemies.len()) else {
            return;
        };
        let enemy = EnemyId::new(index);
        self.enemies.push(Enemy::spawn(enemy, tile));
        out_events.push(Event::EnemySpawned { enemy, tile });
    }

    fn launch_fireball(&mut self, target: EnemyId, out_events: &mut Vec<Event>) {
        if self.combat != CombatMode::Ranged {
            log::trace!("ignoring fireball outside ranged combat");
            return;
        }
        let origin = self.player.tile();
        let Some(enemy) = self.enemy_mut(target).filter(|enemy| enemy.is_alive()) else {
            return;
        };
        let (dx, dy) = origin.offset_to(enemy.tile());
        let (dx, dy) = (dx as f32, dy as f32);
        let distance = (dx * dx + dy * dy).sqrt();
        if distance == 0.0 || distance > FIREBALL_RANGE {
            return;
        }

        let projectile = ProjectileId::new(self.next_projectile);
        self.next_projectile = self.next_projectile.wrapping_add(1);
        self.projectiles.push(Projectile {
            id: projectile,
            position: origin.center(),
            velocity: TilePoint::new(dx / distance * FIREBALL_SPEED, dy / distance * FIREBALL_SPEED),
            traveled: 0.0,
            range: FIREBALL_RANGE,
        });
        out_events.push(Event::ProjectileLaunched { projectile, target });
    }

    fn advance_projectiles(&mut self, out_events: &mut Vec<Event>) {
        let projectiles = std::mem::take(&mut self.projectiles);
        for mut projectile in projectiles {
            projectile.position.x += projectile.velocity.x;
            projectile.position.y += projectile.velocity.y;
            projectile.traveled += projectile.velocity.length();

            let reason = if !self
                .grid
                .get_at_point(projectile.position)
                .is_some_and(|tile| tile.is_walkable())
            {
                Some(ExpiryReason::Wall)
            } else if let Some(target) = self.enemy_hit_by(projectile.position) {
                if self.strike(target, out_events) {
                    self.award(KILL_SCORE, ScoreReason::Kill, out_events);
                    self.heal_player(1, out_events);
                }
                Some(ExpiryReason::Hit)
            } else if projectile.traveled >= projectile.range {
                Some(ExpiryReason::Range)
            } else {
                None
            };

            match reason {
                Some(reason) => {
                    log::trace!("projectile {:?} expired: {reason:?}", projectile.id);
                    out_events.push(Event::ProjectileExpired {
                        projectile: projectile.id,
                        reason,
                    });
                }
                None => self.projectiles.push(projectile),
            }
        }
    }

    fn enemy_hit_by(&self, position: TilePoint) -> Option<EnemyId> {
        self.enemies
            .iter()
            .filter(|enemy| enemy.is_alive())
            .find(|enemy| {
                let center = enemy.tile().center();
                (center.x - position.x).abs() < FIREBALL_HIT_EXTENT
                    && (center.y - position.y).abs() < FIREBALL_HIT_EXTENT
            })
            .map(Enemy::id)
    }

    fn swing(&mut self, target: Option<EnemyId>, out_events: &mut Vec<Event>) {
        if self.combat != CombatMode::Melee {
            log::trace!("ignoring swing outside melee combat");
            return;
        }
        self.player.attack();
        self.attack_indicator = ATTACK_INDICATOR_FRAMES;

        let player = self.player.tile();
        let target = target.filter(|target| {
            self.enemies
                .get(target.get() as usize)
                .is_some_and(|enemy| {
                    enemy.is_alive() && enemy.tile().chebyshev_distance(player) == 1
                })
        });
        out_events.push(Event::SwingPerformed { target });
        if let Some(target) = target {
            if self.strike(target, out_events) {
                self.award(KILL_SCORE, ScoreReason::Kill, out_events);
            }
        }
    }

    fn enemy_think(&mut self, id: EnemyId, decision: EnemyDecision, out_events: &mut Vec<Event>) {
        let grid = &self.grid;
        let Some(enemy) = usize::try_from(id.get())
            .ok()
            .and_then(|index| self.enemies.get_mut(index))
            .filter(|enemy| enemy.is_alive())
        else {
            return;
        };
        let from = enemy.tile();
        let adjacent = |to: TilePos| from.direction_to(to).is_some();

        enemy.age_flee_timer();
        let moved_to = match decision {
            EnemyDecision::CoolDown => {
                enemy.cool_down();
                None
            }
            EnemyDecision::Flee { to } if adjacent(to) && grid.is_floor(to) => {
                enemy.flee_to(to);
                Some(to)
            }
            EnemyDecision::Chase { to }
                if adjacent(to)
                    && (grid.is_floor(to)
                        || (grid.is_walkable(to) && enemy.move_cooldown() == 0)) =>
            {
                enemy.chase_to(to);
                Some(to)
            }
            EnemyDecision::Rest => {
                enemy.rest();
                None
            }
            EnemyDecision::Patrol { to, rest } if adjacent(to) && grid.is_floor(to) => {
                enemy.patrol_to(to, rest);
                Some(to)
            }
            rejected => {
                log::trace!("enemy {} rejected decision {rejected:?}", id.get());
                None
            }
        };

        if let Some(to) = moved_to {
            out_events.push(Event::EnemyMoved { enemy: id, from, to });
        }
    }

    fn resolve_contacts(&mut self, out_events: &mut Vec<Event>) {
        for index in 0..self.enemies.len() {
            let player_tile = self.player.tile();
            let enemy = &self.enemies[index];
            if !enemy.is_alive() || !enemy.is_touching(player_tile) {
                continue;
            }
            let id = enemy.id();

            self.player.take_damage();
            out_events.push(Event::PlayerDamaged {
                health: self.player.health().current(),
            });
            if self.player.health().is_depleted() {
                self.finish(Outcome::Lost, out_events);
                return;
            }

            let Some(push_to) = self
                .player
                .facing()
                .and_then(|facing| player_tile.step(facing))
                .filter(|tile| self.grid.is_floor(*tile))
            else {
                continue;
            };
            self.enemies[index].relocate(push_to);
            out_events.push(Event::EnemyMoved {
                enemy: id,
                from: player_tile,
                to: push_to,
            });
        }
    }

    fn check_goal(&mut self, out_events: &mut Vec<Event>) {
        if self.player.tile() != self.grid.goal() {
            return;
        }
        let bonus = self
            .combat
            .win_bonus(self.player.health().current(), self.defeated_count());
        self.award(bonus, ScoreReason::Escape, out_events);
        self.finish(Outcome::Won, out_events);
    }

    fn check_clear_bonus(&mut self, out_events: &mut Vec<Event>) {
        if self.combat != CombatMode::Melee
            || self.clear_bonus_awarded
            || self.enemies.is_empty()
            || self.enemies.iter().any(Enemy::is_alive)
        {
            return;
        }
        self.clear_bonus_awarded = true;
        self.award(CLEAR_BONUS, ScoreReason::Clear, out_events);
        self.heal_player(1, out_events);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug)]
struct Projectile {
    id: ProjectileId,
    position: TilePoint,
    velocity: TilePoint,
    traveled: f32,
    range: f32,
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if world.outcome.is_some()
        && !matches!(command, Command::ConfigureSession { .. } | Command::Tick { .. })
    {
        log::trace!("session over; ignoring {command:?}");
        return;
    }

    match command {
        Command::ConfigureSession { grid, combat } => {
            let (columns, rows) = (grid.columns(), grid.rows());
            *world = World::with_grid(grid, combat);
            out_events.push(Event::SessionConfigured {
                columns,
                rows,
                combat,
            });
        }
        Command::SpawnEnemy { tile } => world.spawn_enemy(tile, out_events),
        Command::Tick { dt } => {
            world.player.tick(dt);
            for enemy in &mut world.enemies {
                enemy.tick(dt);
            }
            world.attack_indicator = world.attack_indicator.saturating_sub(1);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::MovePlayer { direction } => {
            let from = world.player.tile();
            match world.player.try_move(direction, &world.grid) {
                Some(to) => out_events.push(Event::PlayerMoved { from, to }),
                None => log::trace!("player cannot move {direction:?} from {from:?}"),
            }
        }
        Command::LaunchFireball { target } => world.launch_fireball(target, out_events),
        Command::Swing { target } => world.swing(target, out_events),
        Command::AdvanceProjectiles => world.advance_projectiles(out_events),
        Command::EnemyThink { enemy, decision } => world.enemy_think(enemy, decision, out_events),
        Command::ResolveContacts => world.resolve_contacts(out_events),
        Command::CheckGoal => world.check_goal(out_events),
        Command::CheckClearBonus => world.check_clear_bonus(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use dungeon_crawl_core::{
        CombatMode, EnemyView, Outcome, PlayerSnapshot, ProjectileSnapshot, TileGrid,
    };

    use super::World;

    /// Provides read-only access to the session's tile grid.
    #[must_use]
    pub fn tile_grid(world: &World) -> &TileGrid {
        &world.grid
    }

    /// Combat rules active for the session.
    #[must_use]
    pub fn combat_mode(world: &World) -> CombatMode {
        world.combat
    }

    /// Captures the player's current state.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        world.player.snapshot()
    }

    /// Captures a read-only view of every enemy slot, dead or alive.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.iter().map(|enemy| enemy.snapshot()).collect())
    }

    /// Captures every projectile still in flight.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .iter()
            .map(|projectile| ProjectileSnapshot {
                id: projectile.id,
                position: projectile.position,
                velocity: projectile.velocity,
                traveled: projectile.traveled,
                range: projectile.range,
            })
            .collect()
    }

    /// Score accumulated so far.
    #[must_use]
    pub fn score(world: &World) -> u32 {
        world.score
    }

    /// Terminal outcome, once the session has ended.
    #[must_use]
    pub fn outcome(world: &World) -> Option<Outcome> {
        world.outcome
    }

    /// Frames left on the melee attack-range indicator.
    #[must_use]
    pub fn attack_indicator_frames(world: &World) -> u32 {
        world.attack_indicator
    }

    /// Reports whether the one-shot melee clear bonus was already paid.
    #[must_use]
    pub fn clear_bonus_awarded(world: &World) -> bool {
        world.clear_bonus_awarded
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use dungeon_crawl_core::{Direction, Expression, Tile};

    use super::*;

    fn configured(grid: TileGrid, combat: CombatMode) -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureSession { grid, combat },
            &mut events,
        );
        world
    }

    fn inject_projectile(world: &mut World, position: TilePoint, velocity: TilePoint) {
        world.projectiles.push(Projectile {
            id: ProjectileId::new(world.next_projectile),
            position,
            velocity,
            traveled: 0.0,
            range: 10.0,
        });
        world.next_projectile += 1;
    }

    fn fly_until_expired(world: &mut World) -> Vec<Event> {
        let mut events = Vec::new();
        for _ in 0..100 {
            apply(world, Command::AdvanceProjectiles, &mut events);
            if query::projectiles(world).is_empty() {
                return events;
            }
        }
        panic!("projectile never expired");
    }

    #[test]
    fn wall_stops_projectile_before_enemy_behind_it() {
        let grid = TileGrid::from_codes(&[
            &[1, 1, 1, 1, 1, 1, 1, 1],
            &[1, 0, 0, 1, 0, 0, 0, 1],
            &[1, 0, 0, 0, 0, 0, 2, 1],
            &[1, 1, 1, 1, 1, 1, 1, 1],
        ]);
        let mut world = configured(grid, CombatMode::Ranged);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnEnemy {
                tile: TilePos::new(5, 1),
            },
            &mut events,
        );
        assert_eq!(query::enemy_view(&world).living_count(), 1);

        inject_projectile(
            &mut world,
            TilePos::new(1, 1).center(),
            TilePoint::new(FIREBALL_SPEED, 0.0),
        );
        let events = fly_until_expired(&mut world);

        assert_eq!(
            events,
            vec![Event::ProjectileExpired {
                projectile: ProjectileId::new(0),
                reason: ExpiryReason::Wall,
            }]
        );
        let view = query::enemy_view(&world);
        let enemy = view.get(EnemyId::new(0)).expect("enemy slot");
        assert_eq!(enemy.health.current(), enemy.health.maximum());
        assert_eq!(query::score(&world), 0);
    }

    #[test]
    fn leaving_the_grid_counts_as_a_wall_hit() {
        let mut world = configured(TileGrid::open(6, 6), CombatMode::Ranged);
        inject_projectile(
            &mut world,
            TilePoint::new(0.5, 1.5),
            TilePoint::new(-FIREBALL_SPEED, 0.0),
        );
        inject_projectile(
            &mut world,
            TilePoint::new(5.5, 4.5),
            TilePoint::new(0.0, FIREBALL_SPEED),
        );

        let events = fly_until_expired(&mut world);

        let walls = events
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    Event::ProjectileExpired {
                        reason: ExpiryReason::Wall,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(walls, 2);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn configure_session_resets_state() {
        let mut world = configured(TileGrid::open(8, 6), CombatMode::Ranged);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnEnemy {
                tile: TilePos::new(5, 3),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::ConfigureSession {
                grid: TileGrid::open(12, 9),
                combat: CombatMode::Melee,
            },
            &mut events,
        );

        assert_eq!(query::tile_grid(&world).columns(), 12);
        assert_eq!(query::combat_mode(&world), CombatMode::Melee);
        assert!(query::enemy_view(&world).is_empty());
        assert_eq!(query::player(&world).tile, TilePos::new(1, 1));
        assert_eq!(
            events.last(),
            Some(&Event::SessionConfigured {
                columns: 12,
                rows: 9,
                combat: CombatMode::Melee,
            })
        );
    }

    #[test]
    fn spawn_rejects_tiles_near_the_start() {
        let mut world = configured(TileGrid::open(10, 10), CombatMode::Ranged);
        let mut events = Vec::new();
        for tile in [
            TilePos::new(1, 1),
            TilePos::new(2, 2),
            TilePos::new(3, 2),
            TilePos::new(8, 8),
        ] {
            apply(&mut world, Command::SpawnEnemy { tile }, &mut events);
        }
        assert!(events.is_empty());

        apply(
            &mut world,
            Command::SpawnEnemy {
                tile: TilePos::new(3, 3),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::EnemySpawned {
                enemy: EnemyId::new(0),
                tile: TilePos::new(3, 3),
            }]
        );
    }

    #[test]
    fn tick_counts_down_the_attack_indicator() {
        let mut world = configured(TileGrid::open(6, 6), CombatMode::Melee);
        let mut events = Vec::new();
        apply(&mut world, Command::Swing { target: None }, &mut events);
        assert_eq!(query::attack_indicator_frames(&world), ATTACK_INDICATOR_FRAMES);
        assert_eq!(query::player(&world).expression, Expression::Angry);

        for _ in 0..ATTACK_INDICATOR_FRAMES {
            apply(
                &mut world,
                Command::Tick {
                    dt: Duration::from_millis(16),
                },
                &mut events,
            );
        }
        assert_eq!(query::attack_indicator_frames(&world), 0);
    }

    #[test]
    fn commands_after_the_session_ended_are_ignored() {
        let mut grid = TileGrid::filled(4, 4, Tile::Wall);
        grid.set(TilePos::new(1, 1), Tile::Floor);
        grid.set(TilePos::new(2, 1), Tile::Floor);
        grid.set(TilePos::new(2, 2), Tile::Goal);
        let mut world = configured(grid, CombatMode::Ranged);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MovePlayer {
                direction: Direction::East,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::MovePlayer {
                direction: Direction::South,
            },
            &mut events,
        );
        apply(&mut world, Command::CheckGoal, &mut events);
        assert_eq!(query::outcome(&world), Some(Outcome::Won));

        events.clear();
        apply(
            &mut world,
            Command::MovePlayer {
                direction: Direction::North,
            },
            &mut events,
        );
        apply(&mut world, Command::CheckGoal, &mut events);
        assert!(events.is_empty());
        assert_eq!(query::player(&world).tile, TilePos::new(2, 2));
    }
}
