use shared::domain::{PixelBuffer, Rgb};
use tracing::{debug, warn};

use crate::{
    client::{CommandResult, PixelSink},
    error::{RequestError, SendError},
};

pub const SENT_MESSAGE: &str = "Sent ✓";

/// Pointer input over the grid. Release and cancel carry no cell: they end
/// the gesture wherever they happen, including outside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Down(usize),
    Enter(usize),
    Up,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    Failed(String),
}

impl SendOutcome {
    pub fn message(&self) -> String {
        match self {
            SendOutcome::Sent => SENT_MESSAGE.to_string(),
            SendOutcome::Failed(reason) => format!("Failed: {reason}"),
        }
    }
}

/// State behind the 8x8 LED painter: the pixel buffer, the brush, the drag
/// flag and the status of the last send.
#[derive(Debug, Clone)]
pub struct LedPainter {
    pixels: PixelBuffer,
    active: Rgb,
    painting: bool,
    busy: bool,
    outcome: Option<SendOutcome>,
    revision: u64,
}

impl LedPainter {
    pub fn new() -> Self {
        Self {
            pixels: PixelBuffer::new(),
            active: Rgb::WHITE,
            painting: false,
            busy: false,
            outcome: None,
            revision: 0,
        }
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn active_color(&self) -> Rgb {
        self.active
    }

    pub fn is_painting(&self) -> bool {
        self.painting
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Bumped on every change a view would have to redraw.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_active_color(&mut self, color: Rgb) {
        if self.active != color {
            self.active = color;
            self.touch();
        }
    }

    pub fn paint_cell(&mut self, index: usize) -> bool {
        self.paint_cell_with(index, self.active)
    }

    /// Writing the colour a cell already holds, or an index off the grid,
    /// leaves the painter untouched.
    pub fn paint_cell_with(&mut self, index: usize, color: Rgb) -> bool {
        let changed = self.pixels.set(index, color);
        if changed {
            self.touch();
        }
        changed
    }

    pub fn begin_paint(&mut self, index: usize) -> bool {
        self.painting = true;
        self.paint_cell(index)
    }

    pub fn continue_paint(&mut self, index: usize) -> bool {
        self.painting && self.paint_cell(index)
    }

    pub fn end_paint(&mut self) {
        self.painting = false;
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        match event {
            PointerEvent::Down(index) => self.begin_paint(index),
            PointerEvent::Enter(index) => self.continue_paint(index),
            PointerEvent::Up | PointerEvent::Cancel => {
                self.end_paint();
                false
            }
        }
    }

    pub fn clear_all(&mut self) {
        self.replace_all(Rgb::OFF);
    }

    pub fn fill_all(&mut self) {
        self.replace_all(self.active);
    }

    fn replace_all(&mut self, color: Rgb) {
        if self.pixels != PixelBuffer::filled(color) {
            self.pixels.fill(color);
            self.touch();
        }
    }

    pub fn last_outcome(&self) -> Option<&SendOutcome> {
        self.outcome.as_ref()
    }

    pub fn send_message(&self) -> Option<String> {
        self.outcome.as_ref().map(SendOutcome::message)
    }

    pub fn dismiss_message(&mut self) {
        if self.outcome.take().is_some() {
            self.touch();
        }
    }

    /// Marks the painter busy and hands out the frame to submit. Only one
    /// send may be outstanding; a second one is refused until
    /// [`finish_send`](Self::finish_send) runs.
    pub fn start_send(&mut self) -> Result<PixelBuffer, SendError> {
        if self.busy {
            return Err(SendError::Busy);
        }
        self.busy = true;
        self.outcome = None;
        self.touch();
        Ok(self.pixels.clone())
    }

    pub fn finish_send(
        &mut self,
        result: Result<CommandResult, RequestError>,
    ) -> Result<CommandResult, SendError> {
        self.busy = false;
        self.touch();
        match result {
            Ok(result) => {
                debug!("led frame sent");
                self.outcome = Some(SendOutcome::Sent);
                Ok(result)
            }
            Err(err) => {
                warn!("failed to send led frame: {err}");
                self.outcome = Some(SendOutcome::Failed(err.to_string()));
                Err(SendError::Request(err))
            }
        }
    }

    pub async fn send<S>(&mut self, sink: &S) -> Result<CommandResult, SendError>
    where
        S: PixelSink + ?Sized,
    {
        let frame = self.start_send()?;
        let result = sink.send_pixels(frame.as_slice()).await;
        self.finish_send(result)
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

impl Default for LedPainter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/painter_tests.rs"]
mod tests;
