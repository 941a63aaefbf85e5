mod config;
mod pose;
mod replay;

use anyhow::Result;
use clap::{Parser, Subcommand};
use glam::{Quat, Vec3};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracklink_transform::RenderRotation;

use crate::config::ConsoleConfig;

#[derive(Parser)]
#[command(name = "tracklink-console")]
#[command(about = "Tracking engine pose and command console", long_about = None)]
struct Cli {
    /// Worker name used in log output. Overrides TRACKLINK_WORKER_NAME
    #[arg(long, global = true)]
    worker_name: Option<String>,

    /// Latency of every simulated command. Overrides TRACKLINK_LATENCY_MS
    #[arg(long, global = true)]
    latency_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a host camera pose to the engine init pose
    Pose {
        /// Camera position as x,y,z
        #[arg(short, long, value_parser = pose::parse_vec3)]
        position: Vec3,

        /// Camera orientation as x,y,z,w
        #[arg(short, long, value_parser = pose::parse_quat, default_value = "0,0,0,1")]
        rotation: Quat,

        /// Screen rotation in degrees counter-clockwise: 0, 90, 180 or 270
        #[arg(long, value_parser = parse_render_rotation, default_value = "0")]
        render_rotation: RenderRotation,
    },
    /// Replay a TOML command script against the simulated engine
    Replay {
        /// Script with one [[step]] table per command
        script: PathBuf,
    },
}

fn parse_render_rotation(s: &str) -> Result<RenderRotation, String> {
    match s.trim() {
        "0" => Ok(RenderRotation::Ccw0),
        "90" => Ok(RenderRotation::Ccw90),
        "180" => Ok(RenderRotation::Ccw180),
        "270" => Ok(RenderRotation::Ccw270),
        other => Err(format!("'{other}' is not one of 0, 90, 180, 270")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = ConsoleConfig::from_env()?.with_overrides(cli.worker_name, cli.latency_ms);

    match cli.command {
        Commands::Pose {
            position,
            rotation,
            render_rotation,
        } => {
            let report = pose::convert(position, rotation, render_rotation);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Replay { script } => {
            let script = replay::Script::load(&script)?;
            let report = replay::run(&script, &config).await?;
            info!(worker = %config.worker_name, "Replay finished");
            println!(
                "{} succeeded, {} canceled, {} warnings",
                report.succeeded, report.canceled, report.warnings
            );
        }
    }

    Ok(())
}
