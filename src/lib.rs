use nih_plug::prelude::*;
use parking_lot::Mutex;
use std::num::NonZeroU32;
use std::sync::Arc;

mod analysis;
mod dsp;
mod editor;
mod params;

use analysis::{AnalysisShared, ScopeConsumer, ScopeProducer, SpectrumAnalyzer, SpectrumFeed};
use dsp::deesser::DeEsser;
use dsp::{DspModule, StereoSample};
use editor::EditorData;
use params::DeEsserParams;

/// Adaptive De-Esser - sibilance suppression with waveform and spectrum display
pub struct AdaptiveDeEsser {
    params: Arc<DeEsserParams>,

    deesser: DeEsser,

    /// Audio side of the scope queue
    scope_producer: ScopeProducer,

    /// Audio side of the spectrum queue
    spectrum_feed: SpectrumFeed,

    /// Scalars the editor reads (sample rate, detector settings)
    shared: Arc<AnalysisShared>,

    /// UI side of the scope queue, handed to every editor instance
    scope_consumer: Arc<Mutex<ScopeConsumer>>,

    /// UI side of the spectrum queue
    spectrum_analyzer: Arc<Mutex<SpectrumAnalyzer>>,

    /// Sample rate from DAW
    sample_rate: f32,
}

impl Default for AdaptiveDeEsser {
    fn default() -> Self {
        let (scope_producer, scope_consumer) = analysis::scope::channel();
        let (spectrum_feed, spectrum_analyzer) = analysis::spectrum::channel();

        Self {
            params: Arc::new(DeEsserParams::default()),
            deesser: DeEsser::new(44100.0),
            scope_producer,
            spectrum_feed,
            shared: Arc::new(AnalysisShared::default()),
            scope_consumer: Arc::new(Mutex::new(scope_consumer)),
            spectrum_analyzer: Arc::new(Mutex::new(spectrum_analyzer)),
            sample_rate: 44100.0,
        }
    }
}

impl AdaptiveDeEsser {
    /// Update de-esser with current parameter values
    fn update_deesser_params(&mut self) {
        let params = &self.params;
        self.deesser.set_threshold(params.threshold.value());
        self.deesser.set_amount(params.amount.value());
        self.deesser
            .set_times(params.attack.value(), params.release.value());
        self.deesser
            .set_detection(params.center_freq.value(), params.q.value());
        self.deesser.set_split_freq(params.split_freq.value());
        self.deesser.set_mode(params.mode.value());
        self.deesser.set_suppress_mix(params.suppress_mix.value());
        self.deesser
            .set_exciter(params.excite_amount.value(), params.excite_mix.value());
        self.deesser.set_auto_freq(params.auto_freq.value());
        self.deesser.set_listen(params.listen.value());
    }

    /// Publish the values the spectrum view draws the detector curve from
    fn publish_detector(&self) {
        let detector = self.deesser.detector(0);
        self.shared.publish_detector(
            detector.cutoff_frequency(),
            detector.resonance(),
            self.deesser.adaptive_freq(),
        );
    }
}

impl Plugin for AdaptiveDeEsser {
    const NAME: &'static str = "Adaptive De-Esser";
    const VENDOR: &'static str = "Adaptive De-Esser";
    const URL: &'static str = "https://github.com/adaptive-deesser/adaptive-deesser";
    const EMAIL: &'static str = "info@adaptive-deesser.dev";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            ..AudioIOLayout::const_default()
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            ..AudioIOLayout::const_default()
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;
    const MIDI_OUTPUT: MidiConfig = MidiConfig::None;

    const SAMPLE_ACCURATE_AUTOMATION: bool = true;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    fn editor(&mut self, _async_executor: AsyncExecutor<Self>) -> Option<Box<dyn Editor>> {
        editor::create(EditorData {
            params: self.params.clone(),
            shared: self.shared.clone(),
            scope: self.scope_consumer.clone(),
            analyzer: self.spectrum_analyzer.clone(),
        })
    }

    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        self.sample_rate = buffer_config.sample_rate;

        self.deesser.set_sample_rate(buffer_config.sample_rate);
        self.update_deesser_params();

        self.shared
            .sample_rate
            .store(buffer_config.sample_rate, std::sync::atomic::Ordering::Relaxed);
        self.publish_detector();

        nih_log!(
            "initialized at {} Hz, {} channel(s), max block {}",
            buffer_config.sample_rate,
            audio_io_layout
                .main_output_channels
                .map(NonZeroU32::get)
                .unwrap_or(0),
            buffer_config.max_buffer_size
        );

        true
    }

    fn reset(&mut self) {
        // Clear filter and envelope state on transport stop/start
        self.deesser.reset();
        self.scope_producer.clear_pending();
    }

    fn deactivate(&mut self) {
        let dropped = self.scope_producer.dropped();
        if dropped > 0 {
            nih_debug!("scope dropped {} frame(s) while the editor was not draining", dropped);
        }
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        self.update_deesser_params();

        for mut channel_samples in buffer.iter_samples() {
            let output_gain = self.params.output_gain.smoothed.next();

            let input = {
                let mut channels = channel_samples.iter_mut();
                match (channels.next(), channels.next()) {
                    (Some(left), Some(right)) => StereoSample::new(*left, *right),
                    (Some(mono), None) => StereoSample::from_mono(*mono),
                    _ => continue,
                }
            };

            let output = self.deesser.process(input).scale(output_gain);
            let activity = self.deesser.activity();

            self.scope_producer
                .push_sample(input.peak(), activity.suppression, activity.excitation);
            self.spectrum_feed.push(output.mid());

            let mut channels = channel_samples.iter_mut();
            if let Some(left) = channels.next() {
                *left = output.left;
            }
            if let Some(right) = channels.next() {
                *right = output.right;
            }
        }

        self.publish_detector();

        ProcessStatus::Normal
    }
}

impl Vst3Plugin for AdaptiveDeEsser {
    const VST3_CLASS_ID: [u8; 16] = *b"AdaptDeEsser0001";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Dynamics];
}

nih_export_vst3!(AdaptiveDeEsser);
