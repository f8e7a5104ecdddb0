//! Sibilance detector filter
//!
//! A trapezoidal state-variable band-pass, one per channel. The band-pass
//! output is normalized to 0 dB at the cutoff so its level can be compared
//! directly against the threshold.

use std::f32::consts::PI;

pub struct DetectorFilter {
    cutoff: f32,
    resonance: f32,
    sample_rate: f32,

    // Coefficients
    k: f32,
    a1: f32,
    a2: f32,
    a3: f32,

    // Integrator state
    ic1eq: f32,
    ic2eq: f32,
}

impl DetectorFilter {
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            cutoff: 6500.0,
            resonance: 2.0,
            sample_rate,
            k: 0.5,
            a1: 0.0,
            a2: 0.0,
            a3: 0.0,
            ic1eq: 0.0,
            ic2eq: 0.0,
        };
        filter.update_coefficients();
        filter
    }

    pub fn cutoff_frequency(&self) -> f32 {
        self.cutoff
    }

    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Set cutoff (Hz) and resonance (Q). Coefficients are only recomputed on change.
    pub fn set_params(&mut self, cutoff: f32, resonance: f32) {
        let cutoff = cutoff.clamp(20.0, self.sample_rate * 0.49);
        let resonance = resonance.clamp(0.1, 20.0);
        if (self.cutoff - cutoff).abs() > 0.5 || (self.resonance - resonance).abs() > 0.001 {
            self.cutoff = cutoff;
            self.resonance = resonance;
            self.update_coefficients();
        }
    }

    pub fn set_sample_rate(&mut self, rate: f32) {
        if (rate - self.sample_rate).abs() > 0.1 {
            self.sample_rate = rate;
            self.cutoff = self.cutoff.min(rate * 0.49);
            self.update_coefficients();
            self.reset();
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    /// Band-pass one sample, 0 dB at the cutoff
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let v3 = input - self.ic2eq;
        let v1 = self.a1 * self.ic1eq + self.a2 * v3;
        let v2 = self.ic2eq + self.a2 * self.ic1eq + self.a3 * v3;
        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;
        self.k * v1
    }

    fn update_coefficients(&mut self) {
        let g = (PI * self.cutoff / self.sample_rate).tan();
        self.k = 1.0 / self.resonance;
        self.a1 = 1.0 / (1.0 + g * (g + self.k));
        self.a2 = g * self.a1;
        self.a3 = g * self.a2;
    }
}
