use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::engine::{stdin_lines, VibeRuntime};
use crate::events::EventKind;
use crate::scenes::scene_infos;

#[derive(Parser)]
#[command(name = "vibebus")]
#[command(about = "🐴 Amish Brandon's vibe scenes, wired over a typed event bus")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start scenes and feeds, then chat with the mascot over stdin
    Run {
        /// JSON config file (defaults are used when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Stop after this many seconds (runs until stdin closes otherwise)
        #[arg(short, long)]
        seconds: Option<u64>,

        /// Scene to start; repeat for several (all scenes when omitted)
        #[arg(long = "scene")]
        scenes: Vec<String>,

        /// Seed for the simulated feeds
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List registered scenes
    Scenes,
    /// List event names
    Events,
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Scenes) {
        Commands::Run { config, seconds, scenes, seed } => {
            let config = match config {
                Some(path) => AppConfig::load(&path).with_context(|| format!("loading {}", path.display()))?,
                None => AppConfig::default(),
            };

            let mut runtime = VibeRuntime::new(config);
            runtime.start_scenes(&scenes)?;
            runtime.publish_config()?;
            runtime.spawn_feeds(seed);

            println!("🐴 Amish Brandon is listening. Type to chat, /sprite or /toggle <mode> to play.");
            let summary = runtime.run(stdin_lines(), seconds.map(Duration::from_secs)).await?;

            println!();
            println!("📋 {} chat line(s)", summary.chat_lines);
            for (scene, line) in summary.scenes {
                println!("  • {scene}: {line}");
            }
        }

        Commands::Scenes => {
            println!("🎬 Available scenes:");
            println!();
            for info in scene_infos() {
                println!("📦 {} ({})", info.name, info.key);
                println!("   {}", info.description);
                println!();
            }
        }

        Commands::Events => {
            for kind in EventKind::ALL {
                println!("{kind}");
            }
        }
    }

    Ok(())
}
