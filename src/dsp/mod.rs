//! De-essing DSP
//!
//! Provides the stereo sample type, the trait shared by the processing
//! modules, and the building blocks of the de-esser: biquads, the detector
//! filter, the envelope follower and the adaptive frequency tracker.

pub mod adaptive;
pub mod biquad;
pub mod deesser;
pub mod detector;
pub mod envelope;

/// Stereo audio sample
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct StereoSample {
    pub left: f32,
    pub right: f32,
}

impl StereoSample {
    pub fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    pub fn from_mono(value: f32) -> Self {
        Self {
            left: value,
            right: value,
        }
    }

    /// Average of both channels
    pub fn mid(&self) -> f32 {
        (self.left + self.right) * 0.5
    }

    /// Largest absolute value of both channels
    pub fn peak(&self) -> f32 {
        self.left.abs().max(self.right.abs())
    }

    pub fn scale(&self, gain: f32) -> StereoSample {
        StereoSample::new(self.left * gain, self.right * gain)
    }

    pub fn add(&self, other: StereoSample) -> StereoSample {
        StereoSample::new(self.left + other.left, self.right + other.right)
    }

    pub fn sub(&self, other: StereoSample) -> StereoSample {
        StereoSample::new(self.left - other.left, self.right - other.right)
    }

    pub fn mix(&self, other: StereoSample, wet: f32) -> StereoSample {
        let dry = 1.0 - wet;
        StereoSample {
            left: self.left * dry + other.left * wet,
            right: self.right * dry + other.right * wet,
        }
    }
}

/// Trait for stereo DSP processing modules
pub trait DspModule: Send {
    /// Process a single stereo sample
    fn process(&mut self, input: StereoSample) -> StereoSample;

    /// Set the sample rate (called when audio config changes)
    fn set_sample_rate(&mut self, rate: f32);

    /// Reset internal state (called on transport stop, etc.)
    fn reset(&mut self);
}
