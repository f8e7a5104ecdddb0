use nih_plug::prelude::*;
use nih_plug_egui::EguiState;
use std::sync::Arc;

/// How the detected sibilance is removed from the signal
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMode {
    /// Only the band above the split frequency is attenuated
    #[id = "split"]
    #[name = "Split-Band"]
    SplitBand,

    /// The whole signal is attenuated
    #[id = "wide"]
    #[name = "Wideband"]
    Wideband,

    /// Only the detected band is attenuated
    #[id = "parametric"]
    #[name = "Parametric"]
    Parametric,
}

/// Plugin parameters
#[derive(Params)]
pub struct DeEsserParams {
    /// Editor state (window size, etc.)
    #[persist = "editor-state"]
    pub editor_state: Arc<EguiState>,

    // === Dynamics ===
    /// Detector level above which reduction starts
    #[id = "threshold"]
    pub threshold: FloatParam,

    /// Share of the overshoot that is removed (0.0 = none, 1.0 = all)
    #[id = "amount"]
    pub amount: FloatParam,

    /// Detector attack time in milliseconds
    #[id = "attack"]
    pub attack: FloatParam,

    /// Detector release time in milliseconds
    #[id = "release"]
    pub release: FloatParam,

    /// Dry/suppressed blend
    #[id = "suppressMix"]
    pub suppress_mix: FloatParam,

    // === Filter ===
    /// Detection band centre frequency (ignored while auto is on)
    #[id = "centerFreq"]
    pub center_freq: FloatParam,

    /// Detection band Q
    #[id = "q"]
    pub q: FloatParam,

    /// Crossover frequency for split-band mode and the exciter
    #[id = "splitFreq"]
    pub split_freq: FloatParam,

    /// Suppression mode
    #[id = "mode"]
    pub mode: EnumParam<DetectionMode>,

    /// Follow the dominant sibilance frequency automatically
    #[id = "autoFreq"]
    pub auto_freq: BoolParam,

    /// Solo the detector band
    #[id = "listen"]
    pub listen: BoolParam,

    // === Tone ===
    /// Exciter drive
    #[id = "exciteAmount"]
    pub excite_amount: FloatParam,

    /// How much of the exciter harmonics are added back
    #[id = "exciteMix"]
    pub excite_mix: FloatParam,

    /// Output gain
    #[id = "outputGain"]
    pub output_gain: FloatParam,
}

impl Default for DeEsserParams {
    fn default() -> Self {
        Self {
            editor_state: EguiState::from_size(800, 600),

            threshold: FloatParam::new(
                "Threshold",
                -30.0,
                FloatRange::Linear {
                    min: -60.0,
                    max: 0.0,
                },
            )
            .with_unit(" dB")
            .with_value_to_string(formatters::v2s_f32_rounded(1)),

            amount: FloatParam::new("Ratio", 0.5, FloatRange::Linear { min: 0.0, max: 1.0 })
                .with_unit(" %")
                .with_value_to_string(formatters::v2s_f32_percentage(0))
                .with_string_to_value(formatters::s2v_f32_percentage()),

            attack: FloatParam::new(
                "Attack",
                2.0,
                FloatRange::Skewed {
                    min: 0.1,
                    max: 50.0,
                    factor: FloatRange::skew_factor(-2.0),
                },
            )
            .with_unit(" ms")
            .with_value_to_string(formatters::v2s_f32_rounded(1)),

            release: FloatParam::new(
                "Release",
                80.0,
                FloatRange::Skewed {
                    min: 5.0,
                    max: 500.0,
                    factor: FloatRange::skew_factor(-1.5),
                },
            )
            .with_unit(" ms")
            .with_value_to_string(formatters::v2s_f32_rounded(0)),

            suppress_mix: FloatParam::new(
                "Supp. Mix",
                1.0,
                FloatRange::Linear { min: 0.0, max: 1.0 },
            )
            .with_unit(" %")
            .with_value_to_string(formatters::v2s_f32_percentage(0))
            .with_string_to_value(formatters::s2v_f32_percentage()),

            center_freq: FloatParam::new(
                "Detection",
                6500.0,
                FloatRange::Skewed {
                    min: 2000.0,
                    max: 16000.0,
                    factor: FloatRange::skew_factor(-1.0),
                },
            )
            .with_unit(" Hz")
            .with_value_to_string(formatters::v2s_f32_rounded(0)),

            q: FloatParam::new(
                "Q Factor",
                2.0,
                FloatRange::Skewed {
                    min: 0.5,
                    max: 10.0,
                    factor: FloatRange::skew_factor(-1.0),
                },
            )
            .with_value_to_string(formatters::v2s_f32_rounded(2)),

            split_freq: FloatParam::new(
                "Split Freq",
                4500.0,
                FloatRange::Skewed {
                    min: 2000.0,
                    max: 12000.0,
                    factor: FloatRange::skew_factor(-1.0),
                },
            )
            .with_unit(" Hz")
            .with_value_to_string(formatters::v2s_f32_rounded(0)),

            mode: EnumParam::new("Mode", DetectionMode::SplitBand),
            auto_freq: BoolParam::new("Auto", false),
            listen: BoolParam::new("Listen", false),

            excite_amount: FloatParam::new(
                "Exciter",
                0.0,
                FloatRange::Linear { min: 0.0, max: 1.0 },
            )
            .with_unit(" %")
            .with_value_to_string(formatters::v2s_f32_percentage(0))
            .with_string_to_value(formatters::s2v_f32_percentage()),

            excite_mix: FloatParam::new(
                "Excite Mix",
                0.5,
                FloatRange::Linear { min: 0.0, max: 1.0 },
            )
            .with_unit(" %")
            .with_value_to_string(formatters::v2s_f32_percentage(0))
            .with_string_to_value(formatters::s2v_f32_percentage()),

            output_gain: FloatParam::new(
                "Output",
                util::db_to_gain(0.0),
                FloatRange::Skewed {
                    min: util::db_to_gain(-24.0),
                    max: util::db_to_gain(12.0),
                    factor: FloatRange::gain_skew_factor(-24.0, 12.0),
                },
            )
            .with_smoother(SmoothingStyle::Logarithmic(50.0))
            .with_unit(" dB")
            .with_value_to_string(formatters::v2s_f32_gain_to_db(1))
            .with_string_to_value(formatters::s2v_f32_gain_to_db()),
        }
    }
}
