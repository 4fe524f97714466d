use std::{fmt, str::FromStr, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Args, ValueEnum};
use client_core::{
    CommandResult, LedPainter, PointerEvent, RequestError, RobotClient, StatusPoller,
};
use shared::{
    catalog::{self, CatalogEntry},
    domain::{DanceId, Rgb, SayingId, SongId, PIXEL_COUNT},
    protocol::{MoveCommand, RobotStatus, RotateDirection},
};
use tracing::{info, warn};

use crate::render::{self, GridStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MoveArg {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
    SpeedUp,
    SpeedDown,
}

impl From<MoveArg> for MoveCommand {
    fn from(value: MoveArg) -> Self {
        match value {
            MoveArg::Forward => MoveCommand::Forward,
            MoveArg::Backward => MoveCommand::Backward,
            MoveArg::Left => MoveCommand::Left,
            MoveArg::Right => MoveCommand::Right,
            MoveArg::Stop => MoveCommand::Stop,
            MoveArg::SpeedUp => MoveCommand::SpeedUp,
            MoveArg::SpeedDown => MoveCommand::SpeedDown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RotateArg {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl From<RotateArg> for RotateDirection {
    fn from(value: RotateArg) -> Self {
        match value {
            RotateArg::TopLeft => RotateDirection::TopLeft,
            RotateArg::TopRight => RotateDirection::TopRight,
            RotateArg::BottomLeft => RotateDirection::BottomLeft,
            RotateArg::BottomRight => RotateDirection::BottomRight,
        }
    }
}

/// A fire-and-forget robot command, shared by the one-shot CLI and the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotCommand {
    Move(MoveCommand),
    Rotate(RotateDirection),
    Dance(DanceId),
    Song(SongId),
    Say(SayingId),
}

impl RobotCommand {
    pub async fn run(self, client: &RobotClient) -> Result<CommandResult, RequestError> {
        match self {
            RobotCommand::Move(command) => client.send_move(command).await,
            RobotCommand::Rotate(direction) => client.rotate(direction).await,
            RobotCommand::Dance(id) => client.dance(id).await,
            RobotCommand::Song(id) => client.play_song(id).await,
            RobotCommand::Say(id) => client.say(id).await,
        }
    }
}

impl fmt::Display for RobotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RobotCommand::Move(command) => write!(f, "move {}", command.segment()),
            RobotCommand::Rotate(direction) => write!(f, "rotate {}", direction.segment()),
            RobotCommand::Dance(id) => {
                labelled(f, "dance", id, catalog::label_for(&catalog::DANCES, *id))
            }
            RobotCommand::Song(id) => {
                labelled(f, "song", id, catalog::label_for(&catalog::SONGS, *id))
            }
            RobotCommand::Say(id) => {
                labelled(f, "say", id, catalog::label_for(&catalog::SAYINGS, *id))
            }
        }
    }
}

fn labelled(
    f: &mut fmt::Formatter<'_>,
    kind: &str,
    id: impl fmt::Display,
    label: Option<&str>,
) -> fmt::Result {
    match label {
        Some(label) => write!(f, "{kind} {id} ({label})"),
        None => write!(f, "{kind} {id}"),
    }
}

/// `COLOR@i,j,...`: paint the listed cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintSpec {
    pub color: Rgb,
    pub cells: Vec<usize>,
}

impl FromStr for PaintSpec {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (color, cells) = split_spec(raw)?;
        let cells = cells
            .split(',')
            .map(parse_cell)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { color, cells })
    }
}

/// `COLOR@from-to`: press on `from`, drag across to `to`, release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSpec {
    pub color: Rgb,
    pub from: usize,
    pub to: usize,
}

impl DragSpec {
    /// Ends beyond the grid are pulled back onto its last cell.
    pub fn pointer_events(&self) -> Vec<PointerEvent> {
        let from = self.from.min(PIXEL_COUNT - 1);
        let to = self.to.min(PIXEL_COUNT - 1);
        let path: Vec<usize> = if from <= to {
            (from..=to).collect()
        } else {
            (to..=from).rev().collect()
        };

        let mut events = Vec::with_capacity(path.len() + 1);
        for (step, cell) in path.into_iter().enumerate() {
            events.push(if step == 0 {
                PointerEvent::Down(cell)
            } else {
                PointerEvent::Enter(cell)
            });
        }
        events.push(PointerEvent::Up);
        events
    }
}

impl FromStr for DragSpec {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (color, range) = split_spec(raw)?;
        let (from, to) = range
            .split_once('-')
            .ok_or_else(|| format!("expected FROM-TO after '@' in '{raw}'"))?;
        Ok(Self {
            color,
            from: parse_grid_cell(from)?,
            to: parse_grid_cell(to)?,
        })
    }
}

fn split_spec(raw: &str) -> Result<(Rgb, &str), String> {
    let (color, rest) = raw
        .split_once('@')
        .ok_or_else(|| format!("expected COLOR@CELLS, got '{raw}'"))?;
    let color = color.parse::<Rgb>().map_err(|err| err.to_string())?;
    Ok((color, rest))
}

pub(crate) fn parse_cell(raw: &str) -> Result<usize, String> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| format!("invalid cell index '{raw}'"))
}

/// A drag walks every cell between its ends, so both must lie on the grid.
fn parse_grid_cell(raw: &str) -> Result<usize, String> {
    let cell = parse_cell(raw)?;
    if cell >= PIXEL_COUNT {
        return Err(format!(
            "cell index {cell} is off the grid (0-{})",
            PIXEL_COUNT - 1
        ));
    }
    Ok(cell)
}

#[derive(Debug, Clone, Default, Args)]
pub struct LedsArgs {
    /// Start from an all-black grid.
    #[arg(long)]
    pub clear: bool,
    /// Fill every cell with this colour.
    #[arg(long, value_name = "COLOR")]
    pub fill: Option<Rgb>,
    /// Paint cells, e.g. `pink@0,1,2`. Repeatable.
    #[arg(long, value_name = "COLOR@CELLS")]
    pub paint: Vec<PaintSpec>,
    /// Drag across a run of cells, e.g. `mint@8-15`. Repeatable.
    #[arg(long, value_name = "COLOR@FROM-TO")]
    pub drag: Vec<DragSpec>,
    /// Only print the grid, do not send it.
    #[arg(long)]
    pub dry_run: bool,
}

impl LedsArgs {
    pub fn compose(&self) -> LedPainter {
        let mut painter = LedPainter::new();
        if self.clear {
            painter.clear_all();
        }
        if let Some(color) = self.fill {
            painter.set_active_color(color);
            painter.fill_all();
        }
        for spec in &self.paint {
            for cell in &spec.cells {
                painter.paint_cell_with(*cell, spec.color);
            }
        }
        for drag in &self.drag {
            painter.set_active_color(drag.color);
            for event in drag.pointer_events() {
                painter.handle_pointer(event);
            }
        }
        painter
    }
}

pub async fn run_once(client: &RobotClient, command: RobotCommand) -> Result<()> {
    let result = command
        .run(client)
        .await
        .with_context(|| format!("{command} failed"))?;
    report(command, &result);
    Ok(())
}

/// Runs every step even when some fail; failures are logged and counted.
pub async fn drive(client: &RobotClient, steps: &[MoveArg]) -> Result<()> {
    let mut failures = 0usize;
    for step in steps {
        let command = RobotCommand::Move((*step).into());
        match command.run(client).await {
            Ok(result) => report(command, &result),
            Err(err) => {
                failures += 1;
                warn!(%command, "robot command failed: {err}");
            }
        }
    }
    if failures > 0 {
        bail!("{failures} of {} drive steps failed", steps.len());
    }
    Ok(())
}

pub async fn leds(client: &RobotClient, args: &LedsArgs, style: GridStyle) -> Result<()> {
    let mut painter = args.compose();
    print!("{}", render::grid(painter.pixels(), style));
    if args.dry_run {
        return Ok(());
    }

    let outcome = painter.send(client).await;
    if let Some(message) = painter.send_message() {
        println!("{message}");
    }
    outcome.context("failed to send led frame")?;
    Ok(())
}

pub async fn status(client: &RobotClient) -> Result<()> {
    let status = client.status().await.context("failed to fetch robot status")?;
    println!("{}", render::status_line(&status));
    if !status.extra.is_empty() {
        println!("{}", serde_json::to_string_pretty(&status.extra)?);
    }
    Ok(())
}

/// Prints every status change until ctrl-c, or until `ticks` changes were seen.
pub async fn watch(
    client: Arc<RobotClient>,
    interval: Duration,
    ticks: Option<usize>,
) -> Result<()> {
    let poller = StatusPoller::spawn_with_interval(client, interval);
    let mut updates = poller.subscribe();
    let mut seen = 0usize;
    print_stamped(&poller.current());

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = updates.borrow_and_update().clone();
                print_stamped(&status);
                seen += 1;
                if ticks.is_some_and(|limit| seen >= limit) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }
    Ok(())
}

fn print_stamped(status: &RobotStatus) {
    let now = Local::now().format("%H:%M:%S");
    println!("[{now}] {}", render::status_line(status));
}

pub fn print_catalog() {
    print_entries("dances", &catalog::DANCES);
    print_entries("songs", &catalog::SONGS);
    print_entries("sayings", &catalog::SAYINGS);
}

fn print_entries<Id: fmt::Display>(title: &str, entries: &[CatalogEntry<Id>]) {
    println!("{title}:");
    for entry in entries {
        println!("  {:>2}  {}", entry.id, entry.label);
    }
}

pub(crate) fn report(command: RobotCommand, result: &CommandResult) {
    match result.ack() {
        Some(ack) if !ack.success => warn!(
            %command,
            "robot bridge reported failure: {}",
            ack.error.as_deref().unwrap_or("unknown error")
        ),
        _ => info!(%command, "sent"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_paint_specs() {
        let spec: PaintSpec = "pink@0, 1,2".parse().expect("spec");
        assert_eq!(spec.color, Rgb::PINK);
        assert_eq!(spec.cells, vec![0, 1, 2]);

        assert!("pink".parse::<PaintSpec>().is_err());
        assert!("pink@x".parse::<PaintSpec>().is_err());
        assert!("teal@1".parse::<PaintSpec>().is_err());
    }

    #[test]
    fn drag_emits_down_enters_and_up() {
        let drag: DragSpec = "mint@2-0".parse().expect("drag");
        assert_eq!(
            drag.pointer_events(),
            vec![
                PointerEvent::Down(2),
                PointerEvent::Enter(1),
                PointerEvent::Enter(0),
                PointerEvent::Up,
            ]
        );
        assert!("mint@3".parse::<DragSpec>().is_err());
    }

    #[test]
    fn drag_ends_must_lie_on_the_grid() {
        let drag: DragSpec = "sky@0-63".parse().expect("full diagonal run");
        assert_eq!(drag.pointer_events().len(), 65);

        assert!("pink@0-64".parse::<DragSpec>().is_err());
        assert!("pink@64-0".parse::<DragSpec>().is_err());
        let err = "pink@0-18446744073709551615"
            .parse::<DragSpec>()
            .expect_err("huge index");
        assert!(err.contains("off the grid"), "unexpected error: {err}");

        let built = DragSpec {
            color: Rgb::PINK,
            from: 62,
            to: usize::MAX,
        };
        assert_eq!(
            built.pointer_events(),
            vec![PointerEvent::Down(62), PointerEvent::Enter(63), PointerEvent::Up]
        );
        let painter = LedsArgs {
            drag: vec![built],
            ..LedsArgs::default()
        }
        .compose();
        assert_eq!(painter.pixels().get(63), Some(Rgb::PINK));
    }

    #[test]
    fn compose_applies_fill_then_strokes() {
        let args = LedsArgs {
            fill: Some(Rgb::SKY),
            paint: vec!["white@63".parse().expect("paint")],
            drag: vec!["pink@0-2".parse().expect("drag")],
            ..LedsArgs::default()
        };
        let painter = args.compose();
        let pixels = painter.pixels();
        assert_eq!(pixels.get(0), Some(Rgb::PINK));
        assert_eq!(pixels.get(2), Some(Rgb::PINK));
        assert_eq!(pixels.get(3), Some(Rgb::SKY));
        assert_eq!(pixels.get(63), Some(Rgb::WHITE));
        assert!(!painter.is_painting());
    }

    #[test]
    fn command_labels_use_the_catalog() {
        assert_eq!(
            RobotCommand::Dance(DanceId(1)).to_string(),
            "dance 1 (Wiggle Dance)"
        );
        assert_eq!(RobotCommand::Say(SayingId(42)).to_string(), "say 42");
        assert_eq!(
            RobotCommand::Move(MoveCommand::SpeedUp).to_string(),
            "move speedup"
        );
    }
}
