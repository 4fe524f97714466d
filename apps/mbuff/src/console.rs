//! Line-driven dashboard: drive buttons, the LED painter and the status
//! header, all sharing one robot client.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use client_core::{
    CommandResult, LedPainter, PointerEvent, RequestError, RobotClient, SendError, StatusPoller,
};
use shared::{
    domain::{DanceId, Rgb, SayingId, SongId, SpeedLevel},
    protocol::{CameraFeed, MoveCommand, RotateDirection},
};
use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{debug, warn};

use crate::{
    commands::{self, parse_cell, RobotCommand},
    render::{self, GridStyle},
};

const HELP: &str = "\
drive     w a s d, x stop, + faster, - slower
rotate    q top-left, e top-right, z bottom-left, c bottom-right
actions   dance N, song N, say N, catalog
leds      color NAME, down N, enter N, up, cancel, paint N.., fill, clear, grid, send
other     status, camera, help, quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Robot(RobotCommand),
    Color(Rgb),
    Pointer(PointerEvent),
    Paint(Vec<usize>),
    Fill,
    Clear,
    Grid,
    Send,
    Status,
    Camera,
    Catalog,
    Help,
    Quit,
}

/// Parses one console line. Blank lines yield `Ok(None)`.
pub fn parse_console_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match head.to_ascii_lowercase().as_str() {
        "w" | "forward" => robot_move(MoveCommand::Forward),
        "s" | "backward" => robot_move(MoveCommand::Backward),
        "a" | "left" => robot_move(MoveCommand::Left),
        "d" | "right" => robot_move(MoveCommand::Right),
        "x" | "stop" => robot_move(MoveCommand::Stop),
        "+" | "faster" => robot_move(MoveCommand::SpeedUp),
        "-" | "slower" => robot_move(MoveCommand::SpeedDown),
        "q" => robot_rotate(RotateDirection::TopLeft),
        "e" => robot_rotate(RotateDirection::TopRight),
        "z" => robot_rotate(RotateDirection::BottomLeft),
        "c" => robot_rotate(RotateDirection::BottomRight),
        "dance" => ConsoleCommand::Robot(RobotCommand::Dance(DanceId(single_id(&rest)?))),
        "song" => ConsoleCommand::Robot(RobotCommand::Song(SongId(single_id(&rest)?))),
        "say" => ConsoleCommand::Robot(RobotCommand::Say(SayingId(single_id(&rest)?))),
        "color" | "colour" => {
            let [name] = rest.as_slice() else {
                return Err("usage: color NAME".to_string());
            };
            ConsoleCommand::Color(name.parse::<Rgb>().map_err(|err| err.to_string())?)
        }
        "down" => ConsoleCommand::Pointer(PointerEvent::Down(single_cell(&rest)?)),
        "enter" => ConsoleCommand::Pointer(PointerEvent::Enter(single_cell(&rest)?)),
        "up" => ConsoleCommand::Pointer(PointerEvent::Up),
        "cancel" => ConsoleCommand::Pointer(PointerEvent::Cancel),
        "paint" => {
            if rest.is_empty() {
                return Err("usage: paint N [N ...]".to_string());
            }
            let cells = rest
                .iter()
                .map(|cell| parse_cell(cell))
                .collect::<Result<Vec<_>, _>>()?;
            ConsoleCommand::Paint(cells)
        }
        "fill" => ConsoleCommand::Fill,
        "clear" => ConsoleCommand::Clear,
        "grid" => ConsoleCommand::Grid,
        "send" => ConsoleCommand::Send,
        "status" => ConsoleCommand::Status,
        "camera" => ConsoleCommand::Camera,
        "catalog" => ConsoleCommand::Catalog,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(format!("unknown command '{other}', try 'help'")),
    };
    Ok(Some(command))
}

fn robot_move(command: MoveCommand) -> ConsoleCommand {
    ConsoleCommand::Robot(RobotCommand::Move(command))
}

fn robot_rotate(direction: RotateDirection) -> ConsoleCommand {
    ConsoleCommand::Robot(RobotCommand::Rotate(direction))
}

fn single_id(rest: &[&str]) -> Result<u32, String> {
    match rest {
        [raw] => raw.parse::<u32>().map_err(|_| format!("invalid id '{raw}'")),
        _ => Err("expected exactly one numeric id".to_string()),
    }
}

fn single_cell(rest: &[&str]) -> Result<usize, String> {
    match rest {
        [raw] => parse_cell(raw),
        _ => Err("expected exactly one cell index".to_string()),
    }
}

/// Everything the dashboard owns for one session.
pub struct Dashboard {
    client: Arc<RobotClient>,
    poller: StatusPoller,
    painter: LedPainter,
    speed: SpeedLevel,
    style: GridStyle,
    send_tx: mpsc::Sender<Result<CommandResult, RequestError>>,
    send_rx: mpsc::Receiver<Result<CommandResult, RequestError>>,
}

impl Dashboard {
    pub fn new(client: Arc<RobotClient>, poll_interval: Duration, style: GridStyle) -> Self {
        let poller = StatusPoller::spawn_with_interval(client.clone(), poll_interval);
        let (send_tx, send_rx) = mpsc::channel(4);
        Self {
            client,
            poller,
            painter: LedPainter::new(),
            speed: SpeedLevel::default(),
            style,
            send_tx,
            send_rx,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        println!("{}", render::status_line(&self.poller.current()));
        println!("{}", render::speed_line(self.speed));
        println!("type 'help' for commands");

        let mut status_rx = self.poller.subscribe();
        let mut lines = BufReader::new(io::stdin()).lines();

        loop {
            tokio::select! {
                changed = status_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let status = status_rx.borrow_and_update().clone();
                    println!("{}", render::status_line(&status));
                }
                Some(result) = self.send_rx.recv() => {
                    // The error is already logged by the painter.
                    let _ = self.painter.finish_send(result);
                    if let Some(message) = self.painter.send_message() {
                        println!("{message}");
                    }
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match parse_console_command(&line) {
                        Ok(Some(ConsoleCommand::Quit)) => break,
                        Ok(Some(command)) => self.apply(command),
                        Ok(None) => {}
                        Err(err) => println!("{err}"),
                    }
                }
            }
        }

        self.poller.stop();
        Ok(())
    }

    fn apply(&mut self, command: ConsoleCommand) {
        match command {
            ConsoleCommand::Robot(robot) => self.dispatch(robot),
            ConsoleCommand::Color(color) => {
                self.painter.set_active_color(color);
                println!("brush {color}");
            }
            ConsoleCommand::Pointer(event) => {
                self.painter.handle_pointer(event);
            }
            ConsoleCommand::Paint(cells) => {
                for cell in cells {
                    if !self.painter.paint_cell(cell) {
                        debug!(cell, "paint left the grid unchanged");
                    }
                }
            }
            ConsoleCommand::Fill => self.painter.fill_all(),
            ConsoleCommand::Clear => self.painter.clear_all(),
            ConsoleCommand::Grid => {
                print!("{}", render::grid(self.painter.pixels(), self.style));
            }
            ConsoleCommand::Send => self.send_frame(),
            ConsoleCommand::Status => {
                println!("{}", render::status_line(&self.poller.current()));
            }
            ConsoleCommand::Camera => {
                println!("{}", self.client.camera_feed_url(CameraFeed::Live));
            }
            ConsoleCommand::Catalog => commands::print_catalog(),
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Quit => {}
        }
    }

    fn dispatch(&mut self, command: RobotCommand) {
        // The gauge only counts presses; the robot never reports its speed.
        let gauge_moved = match command {
            RobotCommand::Move(MoveCommand::SpeedUp) => {
                self.speed.increase();
                true
            }
            RobotCommand::Move(MoveCommand::SpeedDown) => {
                self.speed.decrease();
                true
            }
            _ => false,
        };
        if gauge_moved {
            println!("{}", render::speed_line(self.speed));
        }

        let client = Arc::clone(&self.client);
        tokio::spawn(async move {
            match command.run(&client).await {
                Ok(result) => commands::report(command, &result),
                Err(err) => warn!(%command, "robot command failed: {err}"),
            }
        });
    }

    fn send_frame(&mut self) {
        let frame = match self.painter.start_send() {
            Ok(frame) => frame,
            Err(SendError::Busy) => {
                println!("a send is already in progress");
                return;
            }
            Err(err) => {
                warn!("failed to start led send: {err}");
                return;
            }
        };

        let client = Arc::clone(&self.client);
        let send_tx = self.send_tx.clone();
        tokio::spawn(async move {
            let result = client.send_led_pixels(frame.as_slice()).await;
            if send_tx.send(result).await.is_err() {
                debug!("dashboard closed before the led send finished");
            }
        });
    }
}
