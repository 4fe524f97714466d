use super::*;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use shared::domain::PIXEL_COUNT;

/// Records every frame and answers with a fixed outcome.
struct RecordingSink {
    frames: Mutex<Vec<Vec<Rgb>>>,
    fail_with_status: Option<u16>,
}

impl RecordingSink {
    fn ok() -> Self {
        Self {
            frames: Mutex::new(Vec::new()),
            fail_with_status: None,
        }
    }

    fn failing(status: u16) -> Self {
        Self {
            frames: Mutex::new(Vec::new()),
            fail_with_status: Some(status),
        }
    }

    fn frames(&self) -> Vec<Vec<Rgb>> {
        self.frames.lock().expect("frames lock").clone()
    }
}

#[async_trait]
impl PixelSink for RecordingSink {
    async fn send_pixels(&self, pixels: &[Rgb]) -> Result<CommandResult, RequestError> {
        self.frames.lock().expect("frames lock").push(pixels.to_vec());
        match self.fail_with_status {
            Some(status) => Err(RequestError::Http {
                status,
                status_text: "Internal Server Error".to_string(),
                url: "http://robot.local:5001/api/sensehat/leds".to_string(),
                body: "sense hat missing".to_string(),
            }),
            None => Ok(CommandResult::Json(json!({ "success": true }))),
        }
    }
}

fn assert_all(painter: &LedPainter, color: Rgb) {
    assert_eq!(painter.pixels().as_slice().len(), PIXEL_COUNT);
    assert!(painter.pixels().as_slice().iter().all(|pixel| *pixel == color));
}

#[test]
fn starts_black_with_white_brush() {
    let painter = LedPainter::new();
    assert_all(&painter, Rgb::OFF);
    assert_eq!(painter.active_color(), Rgb::WHITE);
    assert!(!painter.is_painting());
    assert!(!painter.is_busy());
    assert_eq!(painter.send_message(), None);
}

#[test]
fn repainting_the_same_color_is_a_no_op_for_every_cell() {
    let mut painter = LedPainter::new();
    for index in 0..PIXEL_COUNT {
        assert!(painter.paint_cell_with(index, Rgb::MINT));
        let revision = painter.revision();
        assert!(!painter.paint_cell_with(index, Rgb::MINT));
        assert_eq!(painter.revision(), revision, "redundant write at {index}");
    }
}

#[test]
fn out_of_range_paint_is_ignored() {
    let mut painter = LedPainter::new();
    let before = painter.pixels().clone();
    assert!(!painter.paint_cell(PIXEL_COUNT));
    assert!(!painter.begin_paint(usize::MAX));
    assert_eq!(painter.pixels(), &before);
    assert_eq!(painter.revision(), 0);
}

#[test]
fn clear_and_fill_cover_the_whole_grid() {
    let mut painter = LedPainter::new();
    painter.set_active_color(Rgb::SKY);
    painter.paint_cell(10);
    painter.fill_all();
    assert_all(&painter, Rgb::SKY);

    painter.clear_all();
    assert_all(&painter, Rgb::OFF);

    let revision = painter.revision();
    painter.clear_all();
    assert_eq!(painter.revision(), revision);
}

#[test]
fn changing_the_brush_keeps_painted_cells() {
    let mut painter = LedPainter::new();
    painter.set_active_color(Rgb::PINK);
    painter.paint_cell(3);
    painter.set_active_color(Rgb::MINT);
    assert_eq!(painter.pixels().get(3), Some(Rgb::PINK));
    assert_eq!(painter.active_color(), Rgb::MINT);
}

#[test]
fn continue_paint_needs_an_active_gesture() {
    let mut painter = LedPainter::new();
    assert!(!painter.continue_paint(5));
    assert_eq!(painter.pixels().get(5), Some(Rgb::OFF));

    painter.begin_paint(4);
    assert!(painter.continue_paint(5));
    assert_eq!(painter.pixels().get(5), Some(Rgb::WHITE));

    painter.end_paint();
    assert!(!painter.continue_paint(6));
    assert_eq!(painter.pixels().get(6), Some(Rgb::OFF));
}

#[test]
fn end_paint_without_begin_is_safe() {
    let mut painter = LedPainter::new();
    painter.end_paint();
    assert!(!painter.is_painting());
    assert_eq!(painter.revision(), 0);
}

#[test]
fn drag_across_three_cells_paints_only_those() {
    let mut painter = LedPainter::new();
    painter.paint_cell_with(40, Rgb::SKY);
    painter.set_active_color(Rgb::PINK);

    painter.handle_pointer(PointerEvent::Down(0));
    painter.handle_pointer(PointerEvent::Enter(1));
    painter.handle_pointer(PointerEvent::Enter(2));
    painter.handle_pointer(PointerEvent::Up);
    painter.handle_pointer(PointerEvent::Enter(3));

    for index in 0..PIXEL_COUNT {
        let expected = match index {
            0..=2 => Rgb::PINK,
            40 => Rgb::SKY,
            _ => Rgb::OFF,
        };
        assert_eq!(painter.pixels().get(index), Some(expected), "cell {index}");
    }
}

#[test]
fn release_outside_the_grid_ends_the_gesture() {
    let mut painter = LedPainter::new();
    painter.handle_pointer(PointerEvent::Down(8));
    painter.handle_pointer(PointerEvent::Enter(64));
    assert!(painter.is_painting());

    painter.handle_pointer(PointerEvent::Cancel);
    assert!(!painter.is_painting());
}

#[test]
fn second_send_is_refused_while_busy() {
    let mut painter = LedPainter::new();
    let frame = painter.start_send().expect("first send");
    assert_eq!(frame.as_slice().len(), PIXEL_COUNT);
    assert!(painter.is_busy());

    assert!(matches!(painter.start_send(), Err(SendError::Busy)));

    painter
        .finish_send(Ok(CommandResult::NoContent))
        .expect("finish");
    assert!(!painter.is_busy());
    assert!(painter.start_send().is_ok());
}

#[test]
fn frame_is_a_snapshot_taken_at_send_time() {
    let mut painter = LedPainter::new();
    painter.paint_cell(0);
    let frame = painter.start_send().expect("send");
    painter.paint_cell(1);
    assert_eq!(frame.get(1), Some(Rgb::OFF));
    assert_eq!(painter.pixels().get(1), Some(Rgb::WHITE));
}

#[tokio::test]
async fn successful_send_reports_sent() {
    let sink = RecordingSink::ok();
    let mut painter = LedPainter::new();
    painter.set_active_color(Rgb::MINT);
    painter.fill_all();

    painter.send(&sink).await.expect("send");

    assert!(!painter.is_busy());
    assert_eq!(painter.last_outcome(), Some(&SendOutcome::Sent));
    assert_eq!(painter.send_message().as_deref(), Some("Sent ✓"));
    let frames = sink.frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0], vec![Rgb::MINT; PIXEL_COUNT]);

    painter.dismiss_message();
    assert_eq!(painter.send_message(), None);
}

#[tokio::test]
async fn failed_send_exposes_the_error_text() {
    let sink = RecordingSink::failing(500);
    let mut painter = LedPainter::new();

    let err = painter.send(&sink).await.expect_err("must fail");
    assert!(matches!(err, SendError::Request(ref inner) if inner.status_code() == Some(500)));

    assert!(!painter.is_busy());
    let message = painter.send_message().expect("message");
    assert!(message.starts_with("Failed: HTTP 500"), "unexpected message: {message}");
    assert!(message.ends_with("sense hat missing"));
}
