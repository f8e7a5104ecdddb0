//! De-esser module
//!
//! Detects sibilance with a band-pass detector per channel, turns the linked
//! detector envelope into gain reduction, and applies it in one of three
//! modes. An optional exciter adds harmonics back to the high band while no
//! reduction is happening.

use nih_plug::util;

use super::adaptive::FrequencyTracker;
use super::biquad::{BiquadCoeffs, BiquadState, BUTTERWORTH_Q};
use super::detector::DetectorFilter;
use super::envelope::EnvelopeFollower;
use super::{DspModule, StereoSample};
use crate::params::DetectionMode;

/// High band level below which the exciter is considered idle
const EXCITE_GATE: f32 = 1e-3;

/// Display values produced alongside every output sample
#[derive(Clone, Copy, Default, Debug)]
pub struct SampleActivity {
    /// Gain reduction as `1 - gain` (0.0 = none, 1.0 = muted)
    pub suppression: f32,
    /// Exciter weight (0.0 = idle)
    pub excitation: f32,
}

pub struct DeEsser {
    detectors: [DetectorFilter; 2],
    envelope: EnvelopeFollower,
    tracker: FrequencyTracker,

    // Complementary split: low = two cascaded low-passes, high = input - low
    split_low: [BiquadState; 2],
    split_coeffs: BiquadCoeffs,
    high_level: EnvelopeFollower,

    // Parameters
    threshold_db: f32,
    amount: f32,
    center_freq: f32,
    q: f32,
    split_freq: f32,
    mode: DetectionMode,
    suppress_mix: f32,
    excite_amount: f32,
    excite_mix: f32,
    auto_freq: bool,
    listen: bool,

    // State
    sample_rate: f32,
    activity: SampleActivity,
}

impl DeEsser {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            detectors: [
                DetectorFilter::new(sample_rate),
                DetectorFilter::new(sample_rate),
            ],
            envelope: EnvelopeFollower::new(sample_rate),
            tracker: FrequencyTracker::new(sample_rate),
            split_low: [BiquadState::default(), BiquadState::default()],
            split_coeffs: BiquadCoeffs::low_pass(sample_rate, 4500.0, BUTTERWORTH_Q),
            high_level: high_level_follower(sample_rate),
            threshold_db: -30.0,
            amount: 0.5,
            center_freq: 6500.0,
            q: 2.0,
            split_freq: 4500.0,
            mode: DetectionMode::SplitBand,
            suppress_mix: 1.0,
            excite_amount: 0.0,
            excite_mix: 0.5,
            auto_freq: false,
            listen: false,
            sample_rate,
            activity: SampleActivity::default(),
        }
    }

    /// Set threshold in dB (-60 to 0)
    pub fn set_threshold(&mut self, threshold_db: f32) {
        self.threshold_db = threshold_db.clamp(-60.0, 0.0);
    }

    /// Set the share of the overshoot to remove (0.0-1.0)
    pub fn set_amount(&mut self, amount: f32) {
        self.amount = amount.clamp(0.0, 1.0);
    }

    /// Set detector attack and release in milliseconds
    pub fn set_times(&mut self, attack_ms: f32, release_ms: f32) {
        self.envelope.set_times(attack_ms, release_ms);
    }

    /// Set the manual detection frequency and Q
    pub fn set_detection(&mut self, center_freq: f32, q: f32) {
        self.center_freq = center_freq;
        self.q = q;
    }

    /// Set the split-band crossover frequency (also the exciter band edge)
    pub fn set_split_freq(&mut self, freq: f32) {
        let freq = freq.clamp(1000.0, self.sample_rate * 0.45);
        if (self.split_freq - freq).abs() > 0.5 {
            self.split_freq = freq;
            self.split_coeffs = BiquadCoeffs::low_pass(self.sample_rate, freq, BUTTERWORTH_Q);
        }
    }

    pub fn set_mode(&mut self, mode: DetectionMode) {
        self.mode = mode;
    }

    pub fn set_suppress_mix(&mut self, mix: f32) {
        self.suppress_mix = mix.clamp(0.0, 1.0);
    }

    pub fn set_exciter(&mut self, amount: f32, mix: f32) {
        self.excite_amount = amount.clamp(0.0, 1.0);
        self.excite_mix = mix.clamp(0.0, 1.0);
    }

    pub fn set_auto_freq(&mut self, enabled: bool) {
        if enabled && !self.auto_freq {
            self.tracker.seed(self.center_freq);
        }
        self.auto_freq = enabled;
    }

    pub fn set_listen(&mut self, listen: bool) {
        self.listen = listen;
    }

    /// Frequency the detector is currently centred on
    pub fn detection_freq(&self) -> f32 {
        if self.auto_freq {
            self.tracker.frequency()
        } else {
            self.center_freq
        }
    }

    /// Adaptive tracker estimate, valid whether or not auto mode is on
    pub fn adaptive_freq(&self) -> f32 {
        self.tracker.frequency()
    }

    /// Detector filter for a channel (0 = left, 1 = right)
    pub fn detector(&self, channel: usize) -> &DetectorFilter {
        &self.detectors[channel.min(1)]
    }

    /// Suppression and excitation of the last processed sample
    pub fn activity(&self) -> SampleActivity {
        self.activity
    }

    fn gain_for_level(&self, level: f32) -> f32 {
        let over_db = util::gain_to_db(level) - self.threshold_db;
        if over_db > 0.0 {
            util::db_to_gain(-over_db * self.amount)
        } else {
            1.0
        }
    }
}

impl DspModule for DeEsser {
    fn process(&mut self, input: StereoSample) -> StereoSample {
        if self.auto_freq {
            self.tracker.process(input.mid());
        }

        let freq = self.detection_freq();
        for detector in &mut self.detectors {
            detector.set_params(freq, self.q);
        }

        let side = StereoSample::new(
            self.detectors[0].process(input.left),
            self.detectors[1].process(input.right),
        );

        let level = self.envelope.process(side.peak());
        let gain = self.gain_for_level(level);
        let suppression = 1.0 - gain;

        let low = self.split_low[0].process(input, &self.split_coeffs);
        let low = self.split_low[1].process(low, &self.split_coeffs);
        let high = input.sub(low);
        let high_level = self.high_level.process(high.peak());

        let suppressed = match self.mode {
            DetectionMode::SplitBand => low.add(high.scale(gain)),
            DetectionMode::Wideband => input.scale(gain),
            DetectionMode::Parametric => input.sub(side.scale(suppression)),
        };
        let mut output = input.mix(suppressed, self.suppress_mix);

        let mut excitation = 0.0;
        if self.excite_amount > 0.0 {
            // Saturation residual: zero for quiet input, grows with level and drive
            let drive = 1.0 + 9.0 * self.excite_amount;
            let residual = StereoSample::new(
                high.left - (drive * high.left).tanh() / drive,
                high.right - (drive * high.right).tanh() / drive,
            );
            let weight = self.excite_mix * (1.0 - suppression);
            output = output.add(residual.scale(weight));

            if high_level > EXCITE_GATE {
                excitation = self.excite_amount * (1.0 - suppression);
            }
        }

        if self.listen {
            output = side;
        }

        self.activity = SampleActivity {
            suppression,
            excitation,
        };
        output
    }

    fn set_sample_rate(&mut self, rate: f32) {
        if (rate - self.sample_rate).abs() > 0.1 {
            self.sample_rate = rate;
            for detector in &mut self.detectors {
                detector.set_sample_rate(rate);
            }
            self.envelope.set_sample_rate(rate);
            self.tracker.set_sample_rate(rate);
            self.split_freq = self.split_freq.min(rate * 0.45);
            self.split_coeffs = BiquadCoeffs::low_pass(rate, self.split_freq, BUTTERWORTH_Q);
            self.high_level.set_sample_rate(rate);
            self.reset();
        }
    }

    fn reset(&mut self) {
        for detector in &mut self.detectors {
            detector.reset();
        }
        self.envelope.reset();
        self.tracker.reset();
        for state in &mut self.split_low {
            state.reset();
        }
        self.high_level.reset();
        self.activity = SampleActivity::default();
    }
}

fn high_level_follower(sample_rate: f32) -> EnvelopeFollower {
    let mut follower = EnvelopeFollower::new(sample_rate);
    follower.set_times(1.0, 50.0);
    follower
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const SR: f32 = 44100.0;

    /// Run a sine through the de-esser and return (input peak, output peak,
    /// max suppression) over the second half
    fn run_sine(deesser: &mut DeEsser, freq: f32, amplitude: f32) -> (f32, f32, f32) {
        let mut out_peak = 0.0f32;
        let mut max_suppression = 0.0f32;
        for i in 0..22050 {
            let x = amplitude * (2.0 * PI * freq * i as f32 / SR).sin();
            let y = deesser.process(StereoSample::from_mono(x));
            assert!(y.left.is_finite() && y.right.is_finite());
            if i > 11025 {
                out_peak = out_peak.max(y.peak());
                max_suppression = max_suppression.max(deesser.activity().suppression);
            }
        }
        (amplitude, out_peak, max_suppression)
    }

    fn deesser() -> DeEsser {
        let mut deesser = DeEsser::new(SR);
        deesser.set_threshold(-30.0);
        deesser.set_amount(1.0);
        deesser.set_detection(7000.0, 2.0);
        deesser
    }

    #[test]
    fn test_quiet_signal_is_untouched() {
        for mode in [
            DetectionMode::SplitBand,
            DetectionMode::Wideband,
            DetectionMode::Parametric,
        ] {
            let mut deesser = deesser();
            deesser.set_mode(mode);
            let (input, output, suppression) = run_sine(&mut deesser, 7000.0, 0.005);
            assert!(suppression < 1e-3, "{mode:?}");
            assert!((output - input).abs() < input * 0.1, "{mode:?}");
        }
    }

    #[test]
    fn test_loud_sibilance_is_reduced() {
        for mode in [
            DetectionMode::SplitBand,
            DetectionMode::Wideband,
            DetectionMode::Parametric,
        ] {
            let mut deesser = deesser();
            deesser.set_mode(mode);
            let (input, output, suppression) = run_sine(&mut deesser, 7000.0, 0.5);
            assert!(suppression > 0.5, "{mode:?}: {suppression}");
            assert!(output < input * 0.5, "{mode:?}: {output}");
        }
    }

    #[test]
    fn test_split_band_keeps_low_end() {
        let mut deesser = deesser();
        deesser.set_mode(DetectionMode::SplitBand);
        deesser.set_split_freq(4500.0);

        // Loud sibilance drives reduction, then a low tone passes mostly intact
        run_sine(&mut deesser, 7000.0, 0.5);
        let mut out_peak = 0.0f32;
        for i in 0..256 {
            let t = i as f32 / SR;
            let x = 0.5 * (2.0 * PI * 7000.0 * t).sin() + 0.3 * (2.0 * PI * 200.0 * t).sin();
            let y = deesser.process(StereoSample::from_mono(x));
            out_peak = out_peak.max(y.peak());
        }
        assert!(out_peak > 0.2);
    }

    #[test]
    fn test_suppress_mix_zero_is_dry() {
        let mut deesser = deesser();
        deesser.set_mode(DetectionMode::Wideband);
        deesser.set_suppress_mix(0.0);
        let (input, output, suppression) = run_sine(&mut deesser, 7000.0, 0.5);
        assert!(suppression > 0.5);
        assert!((output - input).abs() < 0.01);
    }

    #[test]
    fn test_listen_outputs_detector_band() {
        let mut deesser = deesser();
        deesser.set_listen(true);
        let (_, output, _) = run_sine(&mut deesser, 300.0, 0.5);
        assert!(output < 0.05);
    }

    #[test]
    fn test_excitation_idle_without_amount() {
        let mut deesser = deesser();
        deesser.set_threshold(0.0);
        run_sine(&mut deesser, 9000.0, 0.3);
        assert_eq!(deesser.activity().excitation, 0.0);

        deesser.set_exciter(0.8, 1.0);
        run_sine(&mut deesser, 9000.0, 0.3);
        assert!(deesser.activity().excitation > 0.0);
    }

    #[test]
    fn test_auto_freq_moves_detector() {
        let mut deesser = deesser();
        deesser.set_detection(5000.0, 2.0);
        deesser.set_auto_freq(true);
        run_sine(&mut deesser, 9000.0, 0.5);
        assert!((deesser.detection_freq() - 9000.0).abs() < 500.0);
        assert!((deesser.detector(0).cutoff_frequency() - deesser.detection_freq()).abs() < 1.0);

        deesser.set_auto_freq(false);
        assert_eq!(deesser.detection_freq(), 5000.0);
    }
}
