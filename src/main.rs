//! tilebus main entry point.
//!
//! Runs the tile world headless for a fixed number of ticks. Every tick the
//! host drains the event dispatcher exactly once, then lets the camera and
//! world publish new events. At the end a summary of what was delivered is
//! printed.
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=debug cargo run -- --ticks 300 --width 16 --height 9
//! cargo run --release -- --config ./config.ini --json
//! ```

use clap::Parser;
use std::path::PathBuf;

use tilebus::game::Game;
use tilebus::resources::gameconfig::GameConfig;

/// Headless tile world driven by a priority event dispatcher.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// JSON tile map to build the world from. Overrides --width/--height.
    #[arg(long, value_name = "PATH")]
    map: Option<PathBuf>,

    /// Number of ticks to simulate.
    #[arg(long)]
    ticks: Option<u32>,

    /// Seed for tile randomization.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Print the run summary as JSON.
    #[arg(long)]
    json: bool,

    /// Write the effective configuration back to --config and exit.
    #[arg(long)]
    save_config: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = GameConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        log::warn!("{}; using defaults", e);
    }
    if let Some(map) = cli.map {
        config.map_path = Some(map);
    }
    if let Some(ticks) = cli.ticks {
        config.ticks = ticks;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(width) = cli.width {
        config.world_width = width;
    }
    if let Some(height) = cli.height {
        config.world_height = height;
    }

    if cli.save_config {
        if let Err(e) = config.save_to_file() {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        println!("Config written to {}", config.config_path.display());
        return;
    }

    let ticks = config.ticks;
    let mut game = match Game::setup(config) {
        Ok(game) => game,
        Err(e) => {
            eprintln!("Error setting up game: {e}");
            std::process::exit(1);
        }
    };

    log::info!("Running {} ticks", ticks);
    let summary = match game.run(ticks) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error at tick {}: {e}", game.tick());
            std::process::exit(1);
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error encoding summary: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let stats = summary.dispatch;
    log::info!(
        "Done after {} ticks: {} tiles, {} visualized, {} sprite updates",
        summary.ticks,
        summary.tiles,
        summary.visualized_tiles,
        summary.sprite_updates
    );
    log::info!(
        "Events: {} published ({} realtime), {} delivered, {} dropped, {} listener failures, {} drains",
        stats.published,
        stats.realtime,
        stats.delivered,
        stats.dropped,
        stats.failed,
        stats.drains
    );
    log::info!(
        "Camera at ({:.2}, {:.2}) after {} moves",
        summary.camera_position.0,
        summary.camera_position.1,
        summary.camera_moves_seen
    );
}
