//! Display boundary between the audio thread and the editor
//!
//! The audio thread owns the producing halves and never blocks. The editor
//! owns the consuming halves behind a mutex so it can be closed and reopened.

mod error;
pub mod scope;
pub mod spectrum;

use nih_plug::prelude::AtomicF32;
use std::sync::atomic::Ordering;

pub use error::AnalysisError;
pub use scope::{ScopeConsumer, ScopeFrame, ScopeProducer};
pub use spectrum::{SpectrumAnalyzer, SpectrumFeed, DISPLAY_POINTS};

/// Scalar values published by the audio thread for display
pub struct AnalysisShared {
    pub sample_rate: AtomicF32,
    pub adaptive_freq: AtomicF32,
    /// Channel 0 detector cutoff in Hz
    pub detector_cutoff: AtomicF32,
    /// Channel 0 detector Q
    pub detector_resonance: AtomicF32,
}

impl AnalysisShared {
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate.load(Ordering::Relaxed)
    }

    pub fn adaptive_freq(&self) -> f32 {
        self.adaptive_freq.load(Ordering::Relaxed)
    }

    pub fn detector(&self) -> (f32, f32) {
        (
            self.detector_cutoff.load(Ordering::Relaxed),
            self.detector_resonance.load(Ordering::Relaxed),
        )
    }

    pub fn publish_detector(&self, cutoff: f32, resonance: f32, adaptive_freq: f32) {
        self.detector_cutoff.store(cutoff, Ordering::Relaxed);
        self.detector_resonance.store(resonance, Ordering::Relaxed);
        self.adaptive_freq.store(adaptive_freq, Ordering::Relaxed);
    }
}

impl Default for AnalysisShared {
    fn default() -> Self {
        Self {
            // Unknown until the host initializes the plugin
            sample_rate: AtomicF32::new(0.0),
            adaptive_freq: AtomicF32::new(6500.0),
            detector_cutoff: AtomicF32::new(6500.0),
            detector_resonance: AtomicF32::new(2.0),
        }
    }
}
