//! Plain-text rendering of the dashboard pieces.

use std::fmt::Write as _;

use shared::{
    domain::{PixelBuffer, Rgb, SpeedLevel},
    protocol::RobotStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridStyle {
    /// 24-bit background colours, for terminals.
    Ansi,
    /// One character per cell: palette initial, `.` for off, `#` otherwise.
    Ascii,
}

pub fn status_line(status: &RobotStatus) -> String {
    let connection = if status.connected {
        "Connected"
    } else {
        "Disconnected"
    };
    let mut line = format!("mBuff | {connection}");
    if let Some(battery) = status.battery {
        let _ = write!(line, " | battery {battery}%");
    }
    let _ = write!(line, " | {}", status.status);
    line
}

pub fn speed_line(speed: SpeedLevel) -> String {
    format!("speed {speed}")
}

pub fn grid(pixels: &PixelBuffer, style: GridStyle) -> String {
    let mut out = String::new();
    for row in pixels.rows() {
        for pixel in row {
            match style {
                GridStyle::Ansi => {
                    let _ = write!(out, "\x1b[48;2;{};{};{}m  \x1b[0m", pixel.r, pixel.g, pixel.b);
                }
                GridStyle::Ascii => out.push(ascii_cell(*pixel)),
            }
        }
        out.push('\n');
    }
    out
}

fn ascii_cell(pixel: Rgb) -> char {
    match pixel.palette_name() {
        Some("off") => '.',
        Some(name) => name.chars().next().unwrap_or('#'),
        None => '#',
    }
}
