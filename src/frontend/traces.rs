//! Trace canvas - the render stage of the buffer pipeline
//!
//! Consumes the host's live buffer snapshot once per frame: monitor
//! events are routed into the owning group's readout labels, trace
//! buffers are drawn as full-width polylines that fade out with age.
//! All decoding and gating decisions come from [`crate::decode`]; this
//! module only turns classified buffers into draw calls.

use crate::decode::{self, Classified, FrameBuffer, KindMemory};
use crate::sync::WatcherSync;
use egui::{Color32, Pos2, Rect, Shape, Stroke};

/// Stroke colors cycled by channel index
pub const CHANNEL_COLORS: [[u8; 3]; 3] = [[255, 0, 0], [0, 255, 0], [0, 0, 255]];

/// Stroke width for trace polylines
const STROKE_WIDTH: f32 = 1.0;

/// Map payload samples onto the canvas rect.
///
/// `x = i / (len - 1)` spans the full width; `y = 1 - (v * scale + offset)`
/// with samples assumed pre-normalized to `[0, 1]` by the board.
fn polyline_points(rect: Rect, samples: &[f64], scale: f64, offset: f64) -> Vec<Pos2> {
    let last = (samples.len() - 1) as f64;
    samples
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let x = i as f64 / last;
            let y = 1.0 - (v * scale + offset);
            Pos2::new(
                rect.left() + (rect.width() as f64 * x) as f32,
                rect.top() + (rect.height() as f64 * y) as f32,
            )
        })
        .collect()
}

/// Decode and draw one frame's worth of buffers.
///
/// Buffers are visited in channel order. Monitor buffers update the
/// matching group's readout labels and draw nothing; trace buffers are
/// skipped when not yet refreshed since the watch was enabled, or when
/// stale, and otherwise drawn with an age-based fade.
pub fn draw_traces(
    painter: &egui::Painter,
    rect: Rect,
    buffers: &[FrameBuffer],
    sync: &mut WatcherSync,
    kinds: &mut KindMemory,
    now_ms: f64,
    scale: f64,
    offset: f64,
) {
    for (index, buffer) in buffers.iter().enumerate() {
        let Some(kind) = kinds.resolve(index, buffer.kind_code) else {
            continue;
        };
        let Some(classified) = decode::decode(kind, &buffer.samples) else {
            continue;
        };
        match classified {
            Classified::Monitor { timestamp, value } => {
                sync.record_monitor(index, timestamp, value);
            }
            Classified::Trace { samples, .. } => {
                if samples.len() < 2 {
                    continue;
                }
                // skip buffers not yet refreshed since the watch was enabled
                if let Some(started) = sync
                    .group_at(index)
                    .and_then(|g| g.last_started_watching_ms)
                {
                    if buffer.updated_at_ms < started {
                        continue;
                    }
                }
                let Some(alpha) = decode::fade_alpha(now_ms, buffer.updated_at_ms) else {
                    continue;
                };
                let [r, g, b] = CHANNEL_COLORS[index % CHANNEL_COLORS.len()];
                let color = Color32::from_rgba_unmultiplied(r, g, b, (alpha * 255.0) as u8);
                let points = polyline_points(rect, &samples, scale, offset);
                painter.add(Shape::line(points, Stroke::new(STROKE_WIDTH, color)));
            }
        }
    }
}
