//! Spectrum strip: output spectrum plus the detector filter's response

use nih_plug::util;
use nih_plug_egui::egui::{pos2, Color32, Painter, Pos2, Rect, Stroke};

use super::waveform::{strip_mesh, with_alpha};
use crate::analysis::spectrum::{display_fraction, FLOOR_DB};
use crate::analysis::{AnalysisError, SpectrumAnalyzer, DISPLAY_POINTS};
use crate::dsp::biquad::BiquadCoeffs;

const BACKGROUND: Color32 = Color32::from_rgb(14, 16, 24);
const CYAN: (u8, u8, u8) = (0, 255, 255);
const YELLOW: (u8, u8, u8) = (255, 255, 0);
const FALLBACK_SAMPLE_RATE: f32 = 44100.0;
const LOWEST_FREQ: f32 = 20.0;

pub struct SpectrumView {
    fft_points: Vec<f32>,
    detector_curve: Vec<f32>,
}

impl Default for SpectrumView {
    fn default() -> Self {
        Self {
            fft_points: vec![FLOOR_DB; DISPLAY_POINTS],
            detector_curve: vec![FLOOR_DB; DISPLAY_POINTS],
        }
    }
}

impl SpectrumView {
    /// Copy in a new analyzer frame if one is ready
    pub fn pull(&mut self, analyzer: &mut SpectrumAnalyzer) -> Result<bool, AnalysisError> {
        analyzer.process(&mut self.fft_points)
    }

    #[allow(dead_code)]
    pub fn fft_points(&self) -> &[f32] {
        &self.fft_points
    }

    #[allow(dead_code)]
    pub fn detector_curve(&self) -> &[f32] {
        &self.detector_curve
    }

    /// Recompute the detector's magnitude response on the analyzer's frequency axis
    pub fn update_detector_curve(&mut self, cutoff: f32, q: f32, sample_rate: f32) {
        let sample_rate = if sample_rate > 0.0 {
            sample_rate
        } else {
            FALLBACK_SAMPLE_RATE
        };
        let nyquist = sample_rate * 0.5;
        let coeffs = BiquadCoeffs::band_pass(sample_rate, cutoff, q);

        let n = self.detector_curve.len();
        for (i, point) in self.detector_curve.iter_mut().enumerate() {
            let freq = (display_fraction(i, n) * nyquist).clamp(LOWEST_FREQ, nyquist);
            *point = util::gain_to_db(coeffs.magnitude_at(freq, sample_rate));
        }
    }

    pub fn paint(&self, painter: &Painter, bounds: Rect) {
        painter.rect_filled(bounds, 0.0, BACKGROUND);

        let grid = Stroke::new(1.0, Color32::from_white_alpha(13));
        painter.hline(bounds.x_range(), bounds.center().y.floor(), grid);
        painter.vline(bounds.center().x.floor(), bounds.y_range(), grid);

        let fft_path = curve_points(&self.fft_points, bounds);
        if fft_path.len() > 1 {
            // Subtle fill down to the bottom edge
            let columns: Vec<(f32, f32, f32)> =
                fft_path.iter().map(|p| (p.x, p.y, bounds.max.y)).collect();
            painter.add(strip_mesh(&columns, |_| with_alpha(CYAN, 0.1)));

            // Stroke fading in from the left
            for segment in fft_path.windows(2) {
                let t = ((segment[0].x - bounds.min.x) / bounds.width()).clamp(0.0, 1.0);
                painter.line_segment([segment[0], segment[1]], Stroke::new(1.5, with_alpha(CYAN, t)));
            }
        }

        let detector_path = curve_points(&self.detector_curve, bounds);
        if detector_path.len() > 1 {
            painter.line(detector_path, Stroke::new(2.0, with_alpha(YELLOW, 0.6)));
        }
    }
}

/// Vertical position of a level as a fraction of the height (0.0 = top)
pub fn db_to_norm_y(db: f32) -> f32 {
    let norm = 1.0 - (db - FLOOR_DB) / (0.0 - FLOOR_DB);
    if norm.is_nan() {
        1.0
    } else {
        norm.clamp(0.0, 1.0)
    }
}

fn curve_points(levels: &[f32], bounds: Rect) -> Vec<Pos2> {
    let n = levels.len() as f32;
    levels
        .iter()
        .enumerate()
        .map(|(i, &db)| {
            pos2(
                bounds.min.x + (i as f32 / n) * bounds.width(),
                bounds.min.y + db_to_norm_y(db) * bounds.height(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_to_norm_y() {
        assert_eq!(db_to_norm_y(0.0), 0.0);
        assert_eq!(db_to_norm_y(-100.0), 1.0);
        assert!((db_to_norm_y(-50.0) - 0.5).abs() < 1e-6);
        assert_eq!(db_to_norm_y(12.0), 0.0);
        assert_eq!(db_to_norm_y(-200.0), 1.0);
        assert_eq!(db_to_norm_y(f32::NAN), 1.0);
    }

    #[test]
    fn test_starts_silent() {
        let view = SpectrumView::default();
        assert_eq!(view.fft_points().len(), DISPLAY_POINTS);
        assert!(view.fft_points().iter().all(|&db| db == FLOOR_DB));
        assert!(view.detector_curve().iter().all(|&db| db == FLOOR_DB));
    }

    #[test]
    fn test_previous_frame_kept_without_new_audio() {
        use crate::analysis::spectrum::{channel, FFT_SIZE};
        use std::f32::consts::PI;

        let (mut feed, mut analyzer) = channel();
        let mut view = SpectrumView::default();

        for i in 0..FFT_SIZE {
            feed.push(0.5 * (2.0 * PI * 3000.0 * i as f32 / 48000.0).sin());
        }
        assert!(view.pull(&mut analyzer).unwrap());
        let frame = view.fft_points().to_vec();
        assert!(frame.iter().any(|&db| db > -20.0));

        // Nothing new arrived
        assert!(!view.pull(&mut analyzer).unwrap());
        assert_eq!(view.fft_points(), frame.as_slice());

        // Less than a hop is still not a frame
        for _ in 0..100 {
            feed.push(0.0);
        }
        assert!(!view.pull(&mut analyzer).unwrap());
        assert_eq!(view.fft_points(), frame.as_slice());
    }

    #[test]
    fn test_detector_curve_peaks_at_cutoff() {
        let mut view = SpectrumView::default();
        let sample_rate = 48000.0;
        view.update_detector_curve(6000.0, 2.0, sample_rate);

        let (peak_index, peak_db) = view
            .detector_curve()
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, db)| if db > best.1 { (i, db) } else { best });

        // 6 kHz is a quarter of nyquist, so it sits half way along the axis
        assert!((peak_index as i32 - (DISPLAY_POINTS / 2) as i32).abs() <= 2);
        assert!(peak_db.abs() < 0.1);
        assert!(view.detector_curve()[10] < -20.0);
    }

    #[test]
    fn test_detector_curve_without_sample_rate() {
        let mut view = SpectrumView::default();
        view.update_detector_curve(6000.0, 2.0, 0.0);
        assert!(view.detector_curve().iter().all(|db| db.is_finite()));
        assert!(view.detector_curve().iter().any(|&db| db > -1.0));
    }

    #[test]
    fn test_curve_points_span_bounds() {
        let bounds = Rect::from_min_max(pos2(10.0, 20.0), pos2(110.0, 70.0));
        let points = curve_points(&[0.0, -50.0, -100.0, f32::NAN], bounds);
        assert_eq!(points[0], pos2(10.0, 20.0));
        assert_eq!(points[1], pos2(35.0, 45.0));
        assert_eq!(points[2], pos2(60.0, 70.0));
        assert_eq!(points[3], pos2(85.0, 70.0));
    }
}
