//! Adaptive detection frequency
//!
//! Estimates the dominant sibilance frequency from the zero-crossing rate of
//! the high band. Estimates are only taken from windows that carry energy,
//! so the detector holds its last position through pauses.

use super::biquad::{BiquadCoeffs, BiquadState, BUTTERWORTH_Q};
use super::StereoSample;

/// Lowest frequency the tracker reports
pub const MIN_FREQ: f32 = 3000.0;
/// Highest frequency the tracker reports
pub const MAX_FREQ: f32 = 12000.0;

/// Samples per analysis window
const WINDOW_LEN: usize = 256;
/// Mean square level below which a window is ignored (-50 dBFS RMS)
const GATE_MEAN_SQUARE: f32 = 1e-5;
/// How far each new estimate moves the tracked frequency
const SMOOTHING: f32 = 0.25;

pub struct FrequencyTracker {
    high_pass: BiquadState,
    high_pass_coeffs: BiquadCoeffs,
    sample_rate: f32,

    previous: f32,
    crossings: u32,
    energy: f32,
    counted: usize,

    frequency: f32,
}

impl FrequencyTracker {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            high_pass: BiquadState::default(),
            high_pass_coeffs: BiquadCoeffs::high_pass(sample_rate, MIN_FREQ, BUTTERWORTH_Q),
            sample_rate,
            previous: 0.0,
            crossings: 0,
            energy: 0.0,
            counted: 0,
            frequency: 6500.0,
        }
    }

    /// Current estimate in Hz, always within [`MIN_FREQ`, `MAX_FREQ`]
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Start tracking from a known frequency (e.g. the manual detection frequency)
    pub fn seed(&mut self, frequency: f32) {
        self.frequency = frequency.clamp(MIN_FREQ, MAX_FREQ);
    }

    pub fn set_sample_rate(&mut self, rate: f32) {
        if (rate - self.sample_rate).abs() > 0.1 {
            self.sample_rate = rate;
            self.high_pass_coeffs = BiquadCoeffs::high_pass(rate, MIN_FREQ, BUTTERWORTH_Q);
            self.reset();
        }
    }

    pub fn reset(&mut self) {
        self.high_pass.reset();
        self.previous = 0.0;
        self.crossings = 0;
        self.energy = 0.0;
        self.counted = 0;
    }

    #[inline]
    pub fn process(&mut self, input: f32) {
        let high = self
            .high_pass
            .process(StereoSample::from_mono(input), &self.high_pass_coeffs)
            .left;

        if (high >= 0.0) != (self.previous >= 0.0) {
            self.crossings += 1;
        }
        self.previous = high;
        self.energy += high * high;
        self.counted += 1;

        if self.counted == WINDOW_LEN {
            self.finish_window();
        }
    }

    fn finish_window(&mut self) {
        let mean_square = self.energy / WINDOW_LEN as f32;
        if mean_square > GATE_MEAN_SQUARE && self.crossings > 0 {
            // Two crossings per period
            let estimate = self.crossings as f32 * self.sample_rate / (2.0 * WINDOW_LEN as f32);
            let estimate = estimate.clamp(MIN_FREQ, MAX_FREQ);
            self.frequency += SMOOTHING * (estimate - self.frequency);
        }

        self.crossings = 0;
        self.energy = 0.0;
        self.counted = 0;
    }
}
