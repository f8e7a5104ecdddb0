//! Spectrum analyzer for the editor
//!
//! The audio thread only pushes mono samples into a ring buffer. The FFT runs
//! on the editor side when it polls, so the audio thread never pays for it.

use nih_plug::util;
use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};
use ringbuf::{
    traits::{Consumer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};
use std::f32::consts::PI;
use std::sync::Arc;

use super::AnalysisError;

/// FFT length in samples
pub const FFT_SIZE: usize = 2048;
/// New samples required before another frame is analysed
pub const HOP_SIZE: usize = 512;
/// Number of points handed to the display
pub const DISPLAY_POINTS: usize = 512;
/// Level reported for empty bins
pub const FLOOR_DB: f32 = -100.0;

const RING_BUFFER_SIZE: usize = FFT_SIZE * 4;
const DRAIN_CHUNK: usize = 256;

/// Display point `index` of `count` maps to `(index / count)^2` of nyquist
pub fn display_fraction(index: usize, count: usize) -> f32 {
    let normalized = index as f32 / count as f32;
    normalized * normalized
}

/// Create a connected feed/analyzer pair
pub fn channel() -> (SpectrumFeed, SpectrumAnalyzer) {
    let (producer, consumer) = HeapRb::<f32>::new(RING_BUFFER_SIZE).split();

    let mut planner = RealFftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(FFT_SIZE);

    let window: Vec<f32> = (0..FFT_SIZE)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / FFT_SIZE as f32).cos())
        .collect();
    // Amplitude correction so a full scale sine reads 0 dB
    let norm = 2.0 / window.iter().sum::<f32>();

    let analyzer = SpectrumAnalyzer {
        consumer,
        history: vec![0.0; FFT_SIZE],
        fresh: 0,
        window,
        norm,
        input: fft.make_input_vec(),
        spectrum: fft.make_output_vec(),
        scratch: fft.make_scratch_vec(),
        magnitudes_db: vec![FLOOR_DB; FFT_SIZE / 2 + 1],
        chunk: [0.0; DRAIN_CHUNK],
        fft,
    };

    (SpectrumFeed { producer }, analyzer)
}

/// Audio-thread half
pub struct SpectrumFeed {
    producer: HeapProd<f32>,
}

impl SpectrumFeed {
    #[inline]
    pub fn push(&mut self, sample: f32) {
        // Drop samples if the editor is not draining
        let _ = self.producer.try_push(sample);
    }
}

/// Editor half: drains samples and produces display spectra
pub struct SpectrumAnalyzer {
    consumer: HeapCons<f32>,
    fft: Arc<dyn RealToComplex<f32>>,

    /// Last `FFT_SIZE` samples, oldest first
    history: Vec<f32>,
    /// Samples received since the last analysed frame
    fresh: usize,

    window: Vec<f32>,
    norm: f32,
    input: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    magnitudes_db: Vec<f32>,
    chunk: [f32; DRAIN_CHUNK],
}

impl SpectrumAnalyzer {
    /// Drain pending samples and, once a hop has arrived, write a new frame of
    /// `DISPLAY_POINTS` levels in dB into `out`.
    ///
    /// Returns `Ok(false)` when there was not enough new audio for a frame.
    pub fn process(&mut self, out: &mut [f32]) -> Result<bool, AnalysisError> {
        if out.len() != DISPLAY_POINTS {
            return Err(AnalysisError::DisplayLength {
                expected: DISPLAY_POINTS,
                actual: out.len(),
            });
        }

        self.drain();
        if self.fresh < HOP_SIZE {
            return Ok(false);
        }
        self.fresh = 0;

        for ((input, sample), window) in self
            .input
            .iter_mut()
            .zip(&self.history)
            .zip(&self.window)
        {
            *input = sample * window;
        }
        self.fft
            .process_with_scratch(&mut self.input, &mut self.spectrum, &mut self.scratch)?;

        for (db, bin) in self.magnitudes_db.iter_mut().zip(&self.spectrum) {
            let magnitude = bin.norm() * self.norm;
            *db = if magnitude.is_finite() {
                util::gain_to_db(magnitude).max(FLOOR_DB)
            } else {
                FLOOR_DB
            };
        }

        let last_bin = (self.magnitudes_db.len() - 1) as f32;
        for (i, point) in out.iter_mut().enumerate() {
            let position = display_fraction(i, DISPLAY_POINTS) * last_bin;
            let lower = position.floor() as usize;
            let upper = (lower + 1).min(self.magnitudes_db.len() - 1);
            let frac = position - lower as f32;
            *point = self.magnitudes_db[lower] * (1.0 - frac) + self.magnitudes_db[upper] * frac;
        }

        Ok(true)
    }

    fn drain(&mut self) {
        loop {
            let popped = self.consumer.pop_slice(&mut self.chunk);
            if popped == 0 {
                break;
            }

            // DRAIN_CHUNK < FFT_SIZE, so a chunk always fits behind the kept history
            self.history.copy_within(popped.., 0);
            self.history[FFT_SIZE - popped..].copy_from_slice(&self.chunk[..popped]);
            self.fresh = (self.fresh + popped).min(FFT_SIZE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    fn feed_sine(feed: &mut SpectrumFeed, freq: f32, amplitude: f32, samples: usize) {
        for i in 0..samples {
            feed.push(amplitude * (2.0 * PI * freq * i as f32 / SR).sin());
        }
    }

    #[test]
    fn test_waits_for_a_full_hop() {
        let (mut feed, mut analyzer) = channel();
        let mut out = [0.0f32; DISPLAY_POINTS];

        feed_sine(&mut feed, 1000.0, 0.5, HOP_SIZE - 1);
        assert!(!analyzer.process(&mut out).unwrap());

        feed_sine(&mut feed, 1000.0, 0.5, 1);
        assert!(analyzer.process(&mut out).unwrap());
        assert!(!analyzer.process(&mut out).unwrap());
    }

    #[test]
    fn test_sine_peaks_at_expected_point() {
        let (mut feed, mut analyzer) = channel();
        let mut out = [0.0f32; DISPLAY_POINTS];

        let freq = 6000.0;
        feed_sine(&mut feed, freq, 1.0, FFT_SIZE);
        assert!(analyzer.process(&mut out).unwrap());

        let (peak_index, peak_db) = out
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, db)| if db > best.1 { (i, db) } else { best });

        // f = (i/n)^2 * nyquist  =>  i = n * sqrt(f / nyquist)
        let expected = DISPLAY_POINTS as f32 * (freq / (SR / 2.0)).sqrt();
        assert!((peak_index as f32 - expected).abs() <= 2.0, "peak at {peak_index}");
        assert!(peak_db > -3.0 && peak_db < 1.0, "peak level {peak_db}");
    }

    #[test]
    fn test_silence_reads_floor() {
        let (mut feed, mut analyzer) = channel();
        let mut out = [0.0f32; DISPLAY_POINTS];

        for _ in 0..FFT_SIZE {
            feed.push(0.0);
        }
        assert!(analyzer.process(&mut out).unwrap());
        assert!(out.iter().all(|&db| (db - FLOOR_DB).abs() < 1e-3));
    }

    #[test]
    fn test_rejects_wrong_display_length() {
        let (_feed, mut analyzer) = channel();
        let mut out = [0.0f32; 16];
        assert!(matches!(
            analyzer.process(&mut out),
            Err(AnalysisError::DisplayLength { actual: 16, .. })
        ));
    }
}
