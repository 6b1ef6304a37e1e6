use dungeon_crawl_core::{
    CombatMode, Command, EnemyId, EnemyMode, EnemySnapshot, EnemyView, Expression, Health,
    PixelPoint, TileGrid, TilePos, ENEMY_MAX_HEALTH,
};
use dungeon_crawl_system_combat::{fireball_target, melee_target, Combat};
use dungeon_crawl_world::{self as world, query, World};

fn enemy(id: u32, column: u32, row: u32, alive: bool) -> EnemySnapshot {
    let tile = TilePos::new(column, row);
    EnemySnapshot {
        id: EnemyId::new(id),
        tile,
        render_position: PixelPoint::of_tile(tile),
        health: Health::new(u32::from(alive) * ENEMY_MAX_HEALTH, ENEMY_MAX_HEALTH),
        alive,
        mode: EnemyMode::Patrol,
        expression: Expression::Neutral,
        patrol_cooldown: 0,
        move_cooldown: 0,
        flee_timer: 0,
    }
}

#[test]
fn no_enemy_in_range_creates_no_projectile() {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureSession {
            grid: TileGrid::open(10, 10),
            combat: CombatMode::Ranged,
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::SpawnEnemy {
            tile: TilePos::new(3, 3),
        },
        &mut events,
    );

    let mut commands = Vec::new();
    Combat::new().handle(
        CombatMode::Ranged,
        query::player(&world).tile,
        &query::enemy_view(&world),
        &mut commands,
    );
    assert!(commands.is_empty());
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }
    assert!(query::projectiles(&world).is_empty());
}

#[test]
fn storage_order_beats_proximity() {
    let player = TilePos::new(5, 5);
    let view = EnemyView::from_snapshots(vec![
        enemy(0, 6, 6, true),
        enemy(1, 5, 4, true),
    ]);
    assert_eq!(fireball_target(player, &view), Some(EnemyId::new(0)));
}

#[test]
fn dead_enemies_are_never_targeted() {
    let player = TilePos::new(5, 5);
    let view = EnemyView::from_snapshots(vec![
        enemy(0, 5, 4, false),
        enemy(1, 4, 5, true),
    ]);
    assert_eq!(fireball_target(player, &view), Some(EnemyId::new(1)));
    assert_eq!(melee_target(player, &view), Some(EnemyId::new(1)));
}

#[test]
fn enemy_on_player_tile_blocks_the_cast() {
    let player = TilePos::new(5, 5);
    let view = EnemyView::from_snapshots(vec![
        enemy(0, 5, 5, true),
        enemy(1, 5, 6, true),
    ]);
    assert_eq!(fireball_target(player, &view), None);
}

#[test]
fn two_tiles_away_is_out_of_cast_range() {
    let player = TilePos::new(5, 5);
    let view = EnemyView::from_snapshots(vec![enemy(0, 7, 5, true)]);
    assert_eq!(fireball_target(player, &view), None);
}

#[test]
fn melee_reaches_diagonals_but_not_own_tile() {
    let player = TilePos::new(5, 5);
    let view = EnemyView::from_snapshots(vec![
        enemy(0, 5, 5, true),
        enemy(1, 7, 7, true),
        enemy(2, 6, 4, true),
    ]);
    assert_eq!(melee_target(player, &view), Some(EnemyId::new(2)));
}

#[test]
fn melee_swings_even_without_a_target() {
    let mut commands = Vec::new();
    Combat::new().handle(
        CombatMode::Melee,
        TilePos::new(1, 1),
        &EnemyView::default(),
        &mut commands,
    );
    assert_eq!(commands, vec![Command::Swing { target: None }]);
}
