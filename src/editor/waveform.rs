//! Waveform scope
//!
//! Draws the recent input envelope as a mirrored shape, tints the columns
//! where the de-esser is suppressing (red) or exciting (cyan), and shows the
//! adaptive detection frequency when auto mode is on.

use nih_plug_egui::egui::{
    epaint::{Mesh, Vertex, WHITE_UV},
    pos2, Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke,
};

use super::layout::RectExt;
use crate::analysis::{ScopeConsumer, ScopeFrame};
use crate::dsp::adaptive::{MAX_FREQ, MIN_FREQ};

/// Frames kept on screen
pub const BUFFER_SIZE: usize = 1024;
/// Frames popped per refresh at most
const CHUNK: usize = 512;
/// Activity below this is not drawn
const ACTIVITY_FLOOR: f32 = 0.01;
const TRACKER_STRIP_HEIGHT: f32 = 16.0;

const BACKGROUND: Color32 = Color32::from_rgb(10, 12, 20);
const FILL_TOP: Color32 = Color32::from_rgb(130, 100, 255);
const FILL_BOTTOM: Color32 = Color32::from_rgb(100, 80, 200);
const SUPPRESS: (u8, u8, u8) = (255, 100, 100);
const EXCITE: (u8, u8, u8) = (0, 255, 255);

pub struct WaveformView {
    /// Ring of the last `BUFFER_SIZE` frames
    history: Vec<ScopeFrame>,
    /// Next write index into `history`
    write_pos: usize,
    /// Frames in `history` that hold real data
    num_valid: usize,
    /// `num_valid` frames unrolled oldest first
    display: Vec<ScopeFrame>,
    chunk: Vec<ScopeFrame>,
}

impl Default for WaveformView {
    fn default() -> Self {
        Self {
            history: vec![ScopeFrame::default(); BUFFER_SIZE],
            write_pos: 0,
            num_valid: 0,
            display: vec![ScopeFrame::default(); BUFFER_SIZE],
            chunk: vec![ScopeFrame::default(); CHUNK],
        }
    }
}

impl WaveformView {
    /// Pull pending frames from the audio thread. Returns `true` if anything changed.
    pub fn pull(&mut self, fifo: &mut ScopeConsumer) -> bool {
        let popped = fifo.pop(&mut self.chunk);
        if popped == 0 {
            return false;
        }

        let chunk = std::mem::take(&mut self.chunk);
        self.push_frames(&chunk[..popped]);
        self.chunk = chunk;
        true
    }

    #[allow(dead_code)]
    pub fn num_valid(&self) -> usize {
        self.num_valid
    }

    /// Forget the on-screen history
    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.num_valid = 0;
    }

    /// Frames currently on screen, oldest first
    pub fn frames(&self) -> &[ScopeFrame] {
        &self.display[..self.num_valid]
    }

    fn push_frames(&mut self, frames: &[ScopeFrame]) {
        for frame in frames {
            self.history[self.write_pos] = *frame;
            self.write_pos = (self.write_pos + 1) % BUFFER_SIZE;
        }
        self.num_valid = (self.num_valid + frames.len()).min(BUFFER_SIZE);

        // Unroll the ring so the oldest valid frame comes first
        let count = self.num_valid;
        let start = (self.write_pos + BUFFER_SIZE - count) % BUFFER_SIZE;
        if start + count <= BUFFER_SIZE {
            self.display[..count].copy_from_slice(&self.history[start..start + count]);
        } else {
            let first = BUFFER_SIZE - start;
            self.display[..first].copy_from_slice(&self.history[start..]);
            self.display[first..count].copy_from_slice(&self.history[..count - first]);
        }
    }

    pub fn paint(&self, painter: &Painter, bounds: Rect, adaptive_freq: Option<f32>) {
        painter.rect_filled(bounds, 0.0, BACKGROUND);

        if self.num_valid <= 1 {
            return;
        }

        let frames = self.frames();
        let mid_y = bounds.center().y;
        let x_step = bounds.width() / (frames.len() - 1) as f32;
        let y_gain = 0.95 * (bounds.height() * 0.5);
        let x_at = |i: usize| bounds.min.x + x_step * i as f32;

        let levels: Vec<f32> = frames.iter().map(|f| display_value(f.wave)).collect();

        // Envelope fill, shaded top to bottom
        let top_y = mid_y - y_gain;
        let bottom_y = mid_y + y_gain;
        let gradient = |y: f32| {
            let t = if bottom_y > top_y {
                ((y - top_y) / (bottom_y - top_y)).clamp(0.0, 1.0)
            } else {
                0.0
            };
            lerp_color(FILL_TOP, FILL_BOTTOM, t)
        };
        let columns: Vec<(f32, f32, f32)> = levels
            .iter()
            .enumerate()
            .map(|(i, v)| (x_at(i), mid_y - v * y_gain, mid_y + v * y_gain))
            .collect();
        painter.add(strip_mesh(&columns, gradient));

        // Activity bands, confined to the envelope
        for i in 0..frames.len() - 1 {
            let s = display_value(frames[i].suppress);
            let e = display_value(frames[i].excite);
            if s <= ACTIVITY_FLOOR && e <= ACTIVITY_FLOOR {
                continue;
            }

            let color = if s > ACTIVITY_FLOOR {
                with_alpha(SUPPRESS, 0.7 * s)
            } else {
                with_alpha(EXCITE, 0.6 * e)
            };

            let x0 = x_at(i);
            let x1 = (x0 + x_step + 1.0).min(bounds.max.x);
            let (v0, v1) = (levels[i], levels[i + 1]);
            let band = [
                (x0, mid_y - v0 * y_gain, mid_y + v0 * y_gain),
                (x1, mid_y - v1 * y_gain, mid_y + v1 * y_gain),
            ];
            painter.add(strip_mesh(&band, |_| color));
        }

        // Outline: along the top left to right, back along the bottom
        let mut outline: Vec<Pos2> = Vec::with_capacity(columns.len() * 2);
        outline.extend(columns.iter().map(|&(x, top, _)| pos2(x, top)));
        outline.extend(columns.iter().rev().map(|&(x, _, bottom)| pos2(x, bottom)));
        painter.add(Shape::closed_line(
            outline,
            Stroke::new(1.0, Color32::from_white_alpha(77)),
        ));

        if let Some(freq) = adaptive_freq {
            paint_tracker(painter, bounds, freq);
        }
    }
}

/// Marker for the adaptive detection frequency in a strip along the top
fn paint_tracker(painter: &Painter, bounds: Rect, freq: f32) {
    let mut bounds = bounds;
    let strip = bounds.remove_from_top(TRACKER_STRIP_HEIGHT);
    painter.rect_filled(strip, 0.0, Color32::from_black_alpha(102));

    let x = strip.min.x + tracker_position(freq) * strip.width();
    painter.vline(
        x.floor(),
        strip.min.y..=strip.max.y,
        Stroke::new(1.0, Color32::from_rgb(0, 255, 255)),
    );

    let freq = if freq.is_finite() { freq } else { 0.0 };
    painter.text(
        pos2(x.floor() + 4.0, strip.center().y),
        Align2::LEFT_CENTER,
        format!("{}Hz", freq as i32),
        FontId::proportional(10.0),
        Color32::from_white_alpha(204),
    );
}

/// Log-scale position of `freq` between the tracker limits (0.0-1.0)
pub fn tracker_position(freq: f32) -> f32 {
    let position = (freq.ln() - MIN_FREQ.ln()) / (MAX_FREQ.ln() - MIN_FREQ.ln());
    if position.is_nan() {
        0.0
    } else {
        position.clamp(0.0, 1.0)
    }
}

/// Clamp to [0, 1] and treat NaN as silence
pub fn display_value(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Triangle strip between the top and bottom edge of each column `(x, top, bottom)`
pub(super) fn strip_mesh(columns: &[(f32, f32, f32)], color_at: impl Fn(f32) -> Color32) -> Mesh {
    let mut mesh = Mesh::default();
    if columns.len() < 2 {
        return mesh;
    }

    for &(x, top, bottom) in columns {
        for y in [top, bottom] {
            mesh.vertices.push(Vertex {
                pos: pos2(x, y),
                uv: WHITE_UV,
                color: color_at(y),
            });
        }
    }
    for i in 0..(columns.len() - 1) as u32 {
        let base = i * 2;
        mesh.indices.extend_from_slice(&[base, base + 1, base + 2]);
        mesh.indices.extend_from_slice(&[base + 1, base + 3, base + 2]);
    }
    mesh
}

pub(super) fn with_alpha((r, g, b): (u8, u8, u8), alpha: f32) -> Color32 {
    Color32::from_rgba_unmultiplied(r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn lerp_color(a: Color32, b: Color32, t: f32) -> Color32 {
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Color32::from_rgb(mix(a.r(), b.r()), mix(a.g(), b.g()), mix(a.b(), b.b()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(wave: f32) -> ScopeFrame {
        ScopeFrame {
            wave,
            suppress: 0.0,
            excite: 0.0,
        }
    }

    #[test]
    fn test_frames_unroll_oldest_first() {
        let mut view = WaveformView::default();
        let frames: Vec<ScopeFrame> = (0..10).map(|i| frame(i as f32)).collect();
        view.push_frames(&frames);

        assert_eq!(view.num_valid(), 10);
        let waves: Vec<f32> = view.frames().iter().map(|f| f.wave).collect();
        assert_eq!(waves, (0..10).map(|i| i as f32).collect::<Vec<_>>());
    }

    #[test]
    fn test_unroll_across_wrap_around() {
        let mut view = WaveformView::default();
        let total = BUFFER_SIZE + 100;
        let frames: Vec<ScopeFrame> = (0..total).map(|i| frame(i as f32)).collect();
        for chunk in frames.chunks(CHUNK) {
            view.push_frames(chunk);
        }

        // Saturates at the ring size and keeps only the newest frames
        assert_eq!(view.num_valid(), BUFFER_SIZE);
        let shown = view.frames();
        assert_eq!(shown[0].wave, 100.0);
        assert_eq!(shown[BUFFER_SIZE - 1].wave, (total - 1) as f32);
        assert!(shown.windows(2).all(|w| w[1].wave - w[0].wave == 1.0));
    }

    #[test]
    fn test_pull_reads_scope_fifo() {
        let (mut producer, mut consumer) = crate::analysis::scope::channel();
        let mut view = WaveformView::default();
        assert!(!view.pull(&mut consumer));

        for _ in 0..3 * crate::analysis::scope::SAMPLES_PER_FRAME {
            producer.push_sample(0.5, 0.2, 0.0);
        }
        assert!(view.pull(&mut consumer));
        assert_eq!(view.num_valid(), 3);
        assert!((view.frames()[2].suppress - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_resume_shows_only_fresh_frames() {
        let (mut producer, mut consumer) = crate::analysis::scope::channel();
        let mut view = WaveformView::default();

        // Audio keeps running while the window is closed
        for _ in 0..40 * crate::analysis::scope::SAMPLES_PER_FRAME {
            producer.push_sample(0.1, 0.0, 0.0);
        }
        view.push_frames(&[frame(0.1); 8]);

        consumer.discard();
        view.clear();
        assert_eq!(view.num_valid(), 0);
        assert!(view.frames().is_empty());

        for _ in 0..2 * crate::analysis::scope::SAMPLES_PER_FRAME {
            producer.push_sample(0.7, 0.0, 0.0);
        }
        assert!(view.pull(&mut consumer));
        assert_eq!(view.num_valid(), 2);
        assert!(view.frames().iter().all(|f| (f.wave - 0.7).abs() < 1e-6));
    }

    #[test]
    fn test_display_value_sanitizes() {
        assert_eq!(display_value(f32::NAN), 0.0);
        assert_eq!(display_value(-0.5), 0.0);
        assert_eq!(display_value(3.0), 1.0);
        assert_eq!(display_value(0.25), 0.25);
    }

    #[test]
    fn test_tracker_position() {
        assert_eq!(tracker_position(MIN_FREQ), 0.0);
        assert!((tracker_position(MAX_FREQ) - 1.0).abs() < 1e-6);
        // 6 kHz is one octave above 3 kHz, and 12 kHz two
        assert!((tracker_position(6000.0) - 0.5).abs() < 1e-4);
        assert_eq!(tracker_position(100.0), 0.0);
        assert_eq!(tracker_position(f32::NAN), 0.0);
    }

    #[test]
    fn test_strip_mesh_shape() {
        let mesh = strip_mesh(&[(0.0, 1.0, 3.0), (1.0, 0.0, 4.0), (2.0, 2.0, 2.0)], |_| {
            Color32::WHITE
        });
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.indices.len(), 12);
        assert!(strip_mesh(&[(0.0, 0.0, 1.0)], |_| Color32::WHITE).is_empty());
    }
}
