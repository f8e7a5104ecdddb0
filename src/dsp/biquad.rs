//! Biquad filters
//!
//! RBJ cookbook coefficients for the band-pass, low-pass and high-pass shapes the
//! de-esser needs, a stereo direct-form state, and the magnitude response
//! used to draw the detector curve.

use super::StereoSample;
use std::f32::consts::PI;

/// Q of a second order Butterworth section
pub const BUTTERWORTH_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Normalized biquad filter coefficients (a0 == 1)
#[derive(Clone, Copy, Debug)]
pub struct BiquadCoeffs {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl Default for BiquadCoeffs {
    fn default() -> Self {
        // Unity gain passthrough
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }
}

impl BiquadCoeffs {
    /// Band-pass with a constant 0 dB peak gain at `freq`
    pub fn band_pass(sample_rate: f32, freq: f32, q: f32) -> Self {
        let (cos_w0, alpha) = prewarp(sample_rate, freq, q);
        let a0 = 1.0 + alpha;

        Self {
            b0: alpha / a0,
            b1: 0.0,
            b2: -alpha / a0,
            a1: (-2.0 * cos_w0) / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// Second order low-pass
    pub fn low_pass(sample_rate: f32, freq: f32, q: f32) -> Self {
        let (cos_w0, alpha) = prewarp(sample_rate, freq, q);
        let a0 = 1.0 + alpha;

        Self {
            b0: ((1.0 - cos_w0) / 2.0) / a0,
            b1: (1.0 - cos_w0) / a0,
            b2: ((1.0 - cos_w0) / 2.0) / a0,
            a1: (-2.0 * cos_w0) / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// Second order high-pass
    pub fn high_pass(sample_rate: f32, freq: f32, q: f32) -> Self {
        let (cos_w0, alpha) = prewarp(sample_rate, freq, q);
        let a0 = 1.0 + alpha;

        Self {
            b0: ((1.0 + cos_w0) / 2.0) / a0,
            b1: (-(1.0 + cos_w0)) / a0,
            b2: ((1.0 + cos_w0) / 2.0) / a0,
            a1: (-2.0 * cos_w0) / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// Linear magnitude of the frequency response at `freq`
    pub fn magnitude_at(&self, freq: f32, sample_rate: f32) -> f32 {
        let w = 2.0 * PI * freq / sample_rate;
        let (sin_w, cos_w) = w.sin_cos();
        let (sin_2w, cos_2w) = (2.0 * w).sin_cos();

        // H(e^jw) with z^-1 = cos(w) - j sin(w)
        let num_re = self.b0 + self.b1 * cos_w + self.b2 * cos_2w;
        let num_im = -(self.b1 * sin_w + self.b2 * sin_2w);
        let den_re = 1.0 + self.a1 * cos_w + self.a2 * cos_2w;
        let den_im = -(self.a1 * sin_w + self.a2 * sin_2w);

        let den = (den_re * den_re + den_im * den_im).sqrt();
        if den <= f32::EPSILON {
            return 0.0;
        }
        (num_re * num_re + num_im * num_im).sqrt() / den
    }
}

fn prewarp(sample_rate: f32, freq: f32, q: f32) -> (f32, f32) {
    let nyquist = sample_rate * 0.5;
    let freq = freq.clamp(10.0, nyquist * 0.99);
    let q = q.max(0.05);
    let w0 = 2.0 * PI * freq / sample_rate;
    let (sin_w0, cos_w0) = w0.sin_cos();
    (cos_w0, sin_w0 / (2.0 * q))
}

/// Stereo biquad filter state
#[derive(Default)]
pub struct BiquadState {
    // Left channel state
    x1_l: f32,
    x2_l: f32,
    y1_l: f32,
    y2_l: f32,
    // Right channel state
    x1_r: f32,
    x2_r: f32,
    y1_r: f32,
    y2_r: f32,
}

impl BiquadState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn process(&mut self, input: StereoSample, coeffs: &BiquadCoeffs) -> StereoSample {
        // Left channel
        let out_l = coeffs.b0 * input.left + coeffs.b1 * self.x1_l + coeffs.b2 * self.x2_l
            - coeffs.a1 * self.y1_l
            - coeffs.a2 * self.y2_l;

        self.x2_l = self.x1_l;
        self.x1_l = input.left;
        self.y2_l = self.y1_l;
        self.y1_l = out_l;

        // Right channel
        let out_r = coeffs.b0 * input.right + coeffs.b1 * self.x1_r + coeffs.b2 * self.x2_r
            - coeffs.a1 * self.y1_r
            - coeffs.a2 * self.y2_r;

        self.x2_r = self.x1_r;
        self.x1_r = input.right;
        self.y2_r = self.y1_r;
        self.y1_r = out_r;

        StereoSample::new(out_l, out_r)
    }
}
