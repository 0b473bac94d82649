// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use depthview::config::Config;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "depthview")]
#[command(about = "Depth camera point cloud viewer")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Config file (default: ~/.config/depthview/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Orbit the point cloud in the terminal (default)
    View {
        #[command(flatten)]
        source: cli::SourceArgs,
    },

    /// Render one frame to a PNG file
    Snapshot {
        #[command(flatten)]
        source: cli::SourceArgs,

        /// Output file path (default: ~/Pictures/depthview/POINTS_TIMESTAMP.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Yaw in degrees (clamped to +/-120)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        yaw: f32,

        /// Pitch in degrees (clamped to +/-80)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        pitch: f32,
    },

    /// List supported cameras and their calibration
    Profiles,

    /// Unproject one depth pixel
    Project {
        /// Camera model or label
        #[arg(short, long, default_value = "SR300")]
        camera: String,

        /// Depth pixel column
        x: u32,

        /// Depth pixel row
        y: u32,

        /// Raw 16-bit depth value
        raw: u16,
    },

    /// Write the default config file
    InitConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=depthview=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load_or_default(cli.config.as_deref());

    match cli.command {
        None => depthview::terminal::run(config),
        Some(Commands::View { source }) => {
            cli::apply_source_args(&mut config, &source);
            depthview::terminal::run(config)
        }
        Some(Commands::Snapshot {
            source,
            output,
            yaw,
            pitch,
        }) => {
            cli::apply_source_args(&mut config, &source);
            cli::take_snapshot(config, output, yaw, pitch)
        }
        Some(Commands::Profiles) => cli::list_profiles(),
        Some(Commands::Project { camera, x, y, raw }) => cli::project_pixel(&camera, x, y, raw),
        Some(Commands::InitConfig) => {
            let path = cli
                .config
                .or_else(Config::default_path)
                .ok_or("No config directory available")?;
            Config::default().save_to(&path)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}
