#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays Ghost Trail stages from key scripts.

mod config;
mod progress;
mod script;

use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ghost_trail_core::{CompletedLevels, ProgressStore, FINAL_LEVEL};
use ghost_trail_rendering::{ascii, redraw, Frame, RenderConfig, RenderingBackend};
use ghost_trail_system_turns::Game;
use ghost_trail_system_wallmap::{WallMap, NO_TILE};
use ghost_trail_world::{load_level, query, Tilemap};
use glam::Vec2;

use crate::{config::Config, progress::FileProgressStore};

/// Ghost Trail puzzle simulator
#[derive(Parser, Debug)]
#[command(name = "ghost-trail")]
#[command(version, about = "Replay Ghost Trail stages from the terminal", long_about = None)]
struct Cli {
    /// Configuration file; defaults to ./ghost-trail.toml when present
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a stage by replaying a key script
    Play {
        /// One-based stage index
        #[arg(short, long, default_value_t = 1)]
        level: usize,

        /// Packed level string replacing the built-in stage layout
        #[arg(long, value_name = "PACKED")]
        data: Option<String>,

        /// Keys to replay; '.' lets a single frame pass
        #[arg(short, long, default_value = "")]
        script: String,

        /// Print the draw calls of the final frame
        #[arg(long)]
        draw_calls: bool,

        /// Seed for the screen shake of the final stage
        #[arg(long, default_value_t = 0)]
        shake_seed: u64,

        /// Virtual screen width in pixels
        #[arg(long, default_value_t = RenderConfig::DEFAULT_SCREEN.x)]
        width: f32,

        /// Virtual screen height in pixels
        #[arg(long, default_value_t = RenderConfig::DEFAULT_SCREEN.y)]
        height: f32,
    },
    /// List the stage catalogue with completion marks
    Levels,
    /// Print the derived wall border and shadow layers of a stage
    Wallmap {
        /// One-based stage index
        #[arg(short, long)]
        level: usize,
    },
    /// Show or reset stored progress
    Progress {
        /// Forget every completed stage
        #[arg(long)]
        reset: bool,
    },
}

/// Prints draw calls as text, one per line.
struct TextBackend<W> {
    out: W,
}

impl<W: Write> RenderingBackend for TextBackend<W> {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        for call in frame.calls() {
            writeln!(self.out, "{call:?}")?;
        }
        self.out.flush().context("failed to flush draw calls")
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let mut store = FileProgressStore::new(&config.progress_path);

    match cli.command {
        Command::Play {
            level,
            data,
            script,
            draw_calls,
            shake_seed,
            width,
            height,
        } => {
            let render = RenderConfig::new(Vec2::new(width, height), shake_seed)?;
            let bindings = config.keys.resolve()?;
            let mut events = Vec::new();
            let completed = store.load();
            let mut game = match data {
                Some(packed) => {
                    let tilemap = Tilemap::decode(&packed).context("invalid --data")?;
                    Game::from_tilemap(level, tilemap, config.rules, completed, &mut events)
                }
                None => Game::start(level, config.rules, completed, &mut events)
                    .with_context(|| format!("failed to start level {level}"))?,
            };

            let outcome = script::run_script(&mut game, &script, &bindings, &mut store, &mut events)?;

            print!("{}", ascii::render_state(game.state()));
            println!("level: {}", game.level());
            println!("turns left: {}", game.state().turns_left());
            println!("coins left: {}", query::coins_remaining(game.state()));
            println!("history: {}", game.history().len());
            println!("phase: {:?}", game.phase());
            println!("frames: {} turns: {}", outcome.frames, outcome.turns);
            if outcome.cleared {
                println!("cleared; progress kept in {}", store.path().display());
            }

            if draw_calls {
                let mut backend = TextBackend { out: io::stdout() };
                backend.present(&redraw(&game, &render))?;
            }
        }
        Command::Levels => {
            let completed = store.load();
            for level in 1..=FINAL_LEVEL {
                let tilemap = load_level(level)?;
                let mark = if level == FINAL_LEVEL {
                    "bonus"
                } else if completed.is_complete(level) {
                    "cleared"
                } else {
                    "-"
                };
                println!(
                    "{level:>2}  {:>2}x{:<2}  {mark}",
                    tilemap.width(),
                    tilemap.height()
                );
            }
        }
        Command::Wallmap { level } => {
            let tilemap = load_level(level)?;
            let wall_map = WallMap::generate(&tilemap);
            println!("borders:");
            print_layer(wall_map.borders(), wall_map.width());
            println!("shadows:");
            print_layer(wall_map.shadows(), wall_map.width());
        }
        Command::Progress { reset } => {
            if reset {
                store.store(&CompletedLevels::default());
            }
            println!(
                "{} ({})",
                progress::encode(&store.load()),
                store.path().display()
            );
        }
    }
    Ok(())
}

fn print_layer(values: &[i8], width: usize) {
    for row in values.chunks(width.max(1)) {
        let line: Vec<String> = row
            .iter()
            .map(|value| {
                if *value == NO_TILE {
                    " .".to_owned()
                } else {
                    format!("{value:>2}")
                }
            })
            .collect();
        println!("{}", line.join(" "));
    }
}
