#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots a Dungeon Crawl session.
//!
//! Session parameters are layered from defaults, an optional TOML file, an
//! optional URL-style query string and individual flags, each source
//! overriding the previous one.

mod params;
mod scene;

use std::{fs, io::Write, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use dungeon_crawl_core::SessionParams;
use dungeon_crawl_rendering::{palette, FrameInput, Presentation, RenderingBackend};
use dungeon_crawl_rendering_macroquad::MacroquadBackend;
use dungeon_crawl_system_game_loop::{Config, GameLoop, HeldKeys};

use crate::params::ParamOverrides;

#[derive(Debug, Parser)]
#[command(name = "dungeon-crawl")]
#[command(about = "A tile-based dungeon crawler: reach the exit before the monsters reach you")]
#[command(version)]
struct Cli {
    /// TOML file holding session parameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// URL-style session query, e.g. "skin=f1c27d&clothes=0033cc&prop=none&difficulty=EASY"
    #[arg(short, long)]
    query: Option<String>,

    #[command(flatten)]
    overrides: ParamOverrides,

    /// Draw every entity as a flat rectangle instead of loading sprites
    #[arg(long)]
    no_sprites: bool,

    /// Sprite manifest location
    #[arg(long, default_value = "assets/manifest.toml")]
    manifest: PathBuf,

    /// Verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Entry point for the Dungeon Crawl command-line interface.
fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let params = load_params(&cli)?;
    let seed = params.seed.unwrap_or_else(rand::random);
    let config =
        Config::new(params.difficulty, params.combat, seed).with_enemy_count(params.enemy_count);
    let mut game = GameLoop::new(config).context("failed to generate the dungeon")?;
    log::info!(
        "starting {} session on {} with seed {}",
        game.config().combat(),
        game.config().difficulty(),
        game.config().seed()
    );
    let initial_scene =
        scene::build_scene(game.world(), &params).context("failed to describe the dungeon")?;

    let backend = MacroquadBackend::new()
        .with_vsync(true)
        .with_sprite_loading(!cli.no_sprites)
        .with_manifest_path(cli.manifest);
    let presentation = Presentation::new("Dungeon Crawl", palette::BACKGROUND, initial_scene);

    backend.run(presentation, move |dt, input, scene| {
        if input.restart && game.is_over() {
            if let Err(error) = game.restart() {
                log::error!("failed to restart session: {error}");
            }
        } else {
            let _ = game.advance(dt, held_keys(input));
        }

        match scene::build_scene(game.world(), &params) {
            Ok(next) => *scene = next,
            Err(error) => log::error!("failed to describe the dungeon: {error}"),
        }
    })
}

fn load_params(cli: &Cli) -> Result<SessionParams> {
    let config_file = cli
        .config
        .as_ref()
        .map(|path| {
            fs::read_to_string(path)
                .with_context(|| format!("failed to read session config at {}", path.display()))
        })
        .transpose()?;

    let (params, issues) = params::resolve(
        config_file.as_deref(),
        cli.query.as_deref(),
        &cli.overrides,
    )?;
    for issue in &issues {
        log::warn!("{}", params::describe(issue));
    }
    Ok(params)
}

fn held_keys(input: FrameInput) -> HeldKeys {
    HeldKeys {
        up: input.up,
        down: input.down,
        left: input.left,
        right: input.right,
        attack: input.attack,
    }
}

fn init_logging(verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    let base_level = match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let _ = builder.filter_level(base_level).parse_default_env().format(|fmt, record| {
        writeln!(
            fmt,
            "{} [{}] {}",
            fmt.timestamp_seconds(),
            record.level(),
            record.args()
        )
    });
    let _ = builder.try_init();
}
