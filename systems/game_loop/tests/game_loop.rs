use std::time::Duration;

use dungeon_crawl_core::{
    CombatMode, Difficulty, Event, Outcome, ScoreReason, TileGrid, TilePos,
};
use dungeon_crawl_system_game_loop::{Config, GameLoop, HeldKeys};
use dungeon_crawl_world::query;

const FRAME: Duration = Duration::from_millis(16);
const SLOW_FRAME: Duration = Duration::from_millis(250);

fn right() -> HeldKeys {
    HeldKeys {
        right: true,
        ..HeldKeys::default()
    }
}

fn down() -> HeldKeys {
    HeldKeys {
        down: true,
        ..HeldKeys::default()
    }
}

fn attack() -> HeldKeys {
    HeldKeys {
        attack: true,
        ..HeldKeys::default()
    }
}

fn quiet_session(columns: u32, rows: u32) -> GameLoop {
    let config = Config::new(Difficulty::Hard, CombatMode::Ranged, 11)
        .with_grid_size(columns, rows)
        .with_enemy_count(0);
    GameLoop::from_grid(config, TileGrid::open(columns, rows))
}

#[test]
fn held_keys_move_at_most_once_per_debounce_window() {
    let mut game = quiet_session(10, 10);

    let moves: usize = (0..30)
        .map(|_| {
            game.advance(FRAME, right())
                .iter()
                .filter(|event| matches!(event, Event::PlayerMoved { .. }))
                .count()
        })
        .sum();

    assert_eq!(moves, 3);
    assert_eq!(query::player(game.world()).tile, TilePos::new(4, 1));
}

#[test]
fn reaching_the_goal_wins_with_health_bonus() {
    let mut game = quiet_session(6, 6);
    for _ in 0..3 {
        let _ = game.advance(SLOW_FRAME, right());
    }
    for _ in 0..2 {
        assert!(!game.is_over());
        let _ = game.advance(SLOW_FRAME, down());
    }
    let events = game.advance(SLOW_FRAME, down()).to_vec();

    assert!(events.contains(&Event::ScoreAwarded {
        amount: 90,
        reason: ScoreReason::Escape,
        total: 90,
    }));
    assert_eq!(game.outcome(), Some(Outcome::Won));
    assert!(game.advance(SLOW_FRAME, down()).is_empty());
}

#[test]
fn restart_discards_the_finished_session() {
    let mut game = quiet_session(6, 6);
    for keys in [right(), right(), right(), down(), down(), down()] {
        let _ = game.advance(SLOW_FRAME, keys);
    }
    assert!(game.is_over());

    game.restart().expect("6x6 grids are valid");
    assert!(!game.is_over());
    assert_eq!(game.frame(), 0);
    assert_eq!(game.score(), 0);
    assert_eq!(query::player(game.world()).tile, TilePos::new(1, 1));
    assert_eq!(game.config().seed(), 11);
    assert_eq!(game.config().combat(), CombatMode::Ranged);
}

#[test]
fn attacking_with_nothing_in_range_launches_nothing() {
    let mut game = quiet_session(10, 10);
    let events = game.advance(FRAME, attack());
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::ProjectileLaunched { .. })));
    assert!(query::projectiles(game.world()).is_empty());
}

#[test]
fn enemies_only_think_on_cadence_frames() {
    let config = Config::new(Difficulty::Easy, CombatMode::Ranged, 5);
    let mut game = GameLoop::from_grid(config, TileGrid::open(20, 20));
    assert_eq!(query::enemy_view(game.world()).len(), 4);

    let mut moved_on = Vec::new();
    for _ in 0..105 {
        let frame = game.frame();
        let moved = game
            .advance(FRAME, HeldKeys::default())
            .iter()
            .any(|event| matches!(event, Event::EnemyMoved { .. }));
        if moved {
            moved_on.push(frame);
        }
    }

    assert_eq!(moved_on.first(), Some(&0));
    assert!(moved_on.iter().all(|frame| frame % 35 == 0), "{moved_on:?}");
}

#[test]
fn same_seed_replays_identically() {
    let script = [right(), down(), attack(), HeldKeys::default(), right(), down()];
    let replay = || {
        let config = Config::new(Difficulty::Medium, CombatMode::Melee, 0xdead_beef);
        let mut game = GameLoop::new(config).expect("default grid is valid");
        let mut log = Vec::new();
        for frame in 0..240 {
            let keys = script[frame % script.len()];
            log.extend_from_slice(game.advance(FRAME, keys));
        }
        (query::tile_grid(game.world()).clone(), log, game.score())
    };

    assert_eq!(replay(), replay());
}
