mod commands;
mod console;
mod render;
mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{ClientConfig, RobotClient};
use shared::{
    domain::{DanceId, SayingId, SongId},
    protocol::CameraFeed,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    commands::{LedsArgs, MoveArg, RobotCommand, RotateArg},
    render::GridStyle,
    settings::{load_settings, Overrides},
};

/// Dashboard and remote control for the mBuff robot.
#[derive(Parser, Debug)]
#[command(name = "mbuff", version)]
struct Cli {
    #[arg(long, global = true, default_value = "mbuff.toml")]
    config: PathBuf,
    /// Robot API base URL, e.g. http://172.16.68.73:5001
    #[arg(long, global = true, env = "MBUFF_ROBOT_API")]
    robot_api: Option<String>,
    /// Host the dashboard is served from; the API is assumed on port 5001.
    #[arg(long, global = true)]
    host: Option<String>,
    #[arg(long, global = true)]
    protocol: Option<String>,
    /// Render LED grids with plain characters instead of terminal colours.
    #[arg(long, global = true)]
    ascii: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the robot status once.
    Status,
    /// Poll the robot status and print every change.
    Watch {
        /// Stop after this many status changes.
        #[arg(long)]
        ticks: Option<usize>,
    },
    Move {
        #[arg(value_enum)]
        direction: MoveArg,
    },
    /// Send a sequence of moves, continuing past failures.
    Drive {
        #[arg(value_enum, required = true)]
        steps: Vec<MoveArg>,
    },
    Rotate {
        #[arg(value_enum)]
        direction: RotateArg,
    },
    Dance {
        id: u32,
    },
    Song {
        id: u32,
    },
    Say {
        id: u32,
    },
    /// Compose an 8x8 frame and push it to the Sense HAT.
    Leds(LedsArgs),
    /// Print the camera stream URL.
    CameraUrl {
        #[arg(long)]
        rechunk: bool,
    },
    /// List the known dances, songs and sayings.
    Catalog,
    /// Interactive dashboard on stdin.
    Console,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let overrides = Overrides {
        robot_api: cli.robot_api.clone(),
        host: cli.host.clone(),
        protocol: cli.protocol.clone(),
    };
    let settings = load_settings(&cli.config, &overrides)?;
    let config = ClientConfig::resolve(&settings.sources).context("invalid robot API address")?;
    info!(base_url = %config.base_url(), "robot api resolved");

    let client = Arc::new(RobotClient::new(config));
    let style = if cli.ascii {
        GridStyle::Ascii
    } else {
        GridStyle::Ansi
    };

    match cli.command {
        Command::Status => commands::status(&client).await?,
        Command::Watch { ticks } => {
            commands::watch(client, settings.poll_interval, ticks).await?
        }
        Command::Move { direction } => {
            commands::run_once(&client, RobotCommand::Move(direction.into())).await?
        }
        Command::Drive { steps } => commands::drive(&client, &steps).await?,
        Command::Rotate { direction } => {
            commands::run_once(&client, RobotCommand::Rotate(direction.into())).await?
        }
        Command::Dance { id } => {
            commands::run_once(&client, RobotCommand::Dance(DanceId(id))).await?
        }
        Command::Song { id } => {
            commands::run_once(&client, RobotCommand::Song(SongId(id))).await?
        }
        Command::Say { id } => {
            commands::run_once(&client, RobotCommand::Say(SayingId(id))).await?
        }
        Command::Leds(args) => commands::leds(&client, &args, style).await?,
        Command::CameraUrl { rechunk } => {
            let feed = if rechunk {
                CameraFeed::Rechunk
            } else {
                CameraFeed::Live
            };
            println!("{}", client.camera_feed_url(feed));
        }
        Command::Catalog => commands::print_catalog(),
        Command::Console => {
            console::Dashboard::new(client, settings.poll_interval, style)
                .run()
                .await?
        }
    }

    Ok(())
}
