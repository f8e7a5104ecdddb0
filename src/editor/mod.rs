use nih_plug::prelude::*;
use nih_plug_egui::egui::{self, pos2, Align, Align2, Color32, FontId, Layout, RichText};
use nih_plug_egui::create_egui_editor;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

mod knob;
mod layout;
mod spectrum;
mod waveform;

use crate::analysis::{AnalysisShared, ScopeConsumer, SpectrumAnalyzer};
use crate::params::{DeEsserParams, DetectionMode};
use knob::{toggle_button, ParamKnob, ValueEdit};
use layout::{separator_lines, EditorLayout, KnobSlot};
use spectrum::SpectrumView;
use waveform::WaveformView;

/// Display data refresh rate
pub const REFRESH_HZ: u32 = 60;
/// A refresh gap longer than this means the editor was closed or stalled
const RESUME_GAP: Duration = Duration::from_millis(250);

const BACKGROUND: Color32 = Color32::from_rgb(18, 20, 28);
const DYNAMICS: Color32 = Color32::from_rgb(255, 150, 150);
const FILTER: Color32 = Color32::from_rgb(200, 200, 200);
const TONE: Color32 = Color32::from_rgb(100, 240, 255);

/// Everything the editor reads from the audio side
pub struct EditorData {
    pub params: Arc<DeEsserParams>,
    pub shared: Arc<AnalysisShared>,
    pub scope: Arc<Mutex<ScopeConsumer>>,
    pub analyzer: Arc<Mutex<SpectrumAnalyzer>>,
}

/// Create the plugin editor GUI
pub fn create(data: EditorData) -> Option<Box<dyn Editor>> {
    let EditorData {
        params,
        shared,
        scope,
        analyzer,
    } = data;

    create_egui_editor(
        params.editor_state.clone(),
        EditorState::default(),
        |egui_ctx, _| apply_theme(egui_ctx),
        move |egui_ctx, setter, state| {
            if state.timer.tick(Instant::now()) {
                let mut scope = scope.lock();
                if state.timer.resumed() {
                    // Frames queued while the window was closed are stale
                    let skipped = scope.discard();
                    state.waveform.clear();
                    if skipped > 0 {
                        nih_debug!("skipped {} stale scope frame(s)", skipped);
                    }
                }
                state.waveform.pull(&mut scope);
                drop(scope);

                if let Err(err) = state.spectrum.pull(&mut analyzer.lock()) {
                    nih_debug!("spectrum analysis failed: {}", err);
                }
                let (cutoff, resonance) = shared.detector();
                state
                    .spectrum
                    .update_detector_curve(cutoff, resonance, shared.sample_rate());
            }
            egui_ctx.request_repaint_after(state.timer.interval());

            egui::CentralPanel::default()
                .frame(egui::Frame::default().fill(BACKGROUND))
                .show(egui_ctx, |ui| {
                    let bounds = ui.max_rect();
                    let layout = EditorLayout::new(bounds);
                    let painter = ui.painter().clone();

                    let separator = egui::Stroke::new(1.0, Color32::from_white_alpha(20));
                    for (x, top, bottom) in separator_lines(bounds) {
                        painter.vline(x, top..=bottom, separator);
                    }

                    // Header
                    ui.put(layout.title, |ui: &mut egui::Ui| {
                        ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
                            ui.label(title_text("Adaptive De-Esser"))
                        })
                        .inner
                    });
                    painter.text(
                        pos2(layout.mode_label.max.x - 4.0, layout.mode_label.center().y),
                        Align2::RIGHT_CENTER,
                        "Mode",
                        FontId::proportional(14.0),
                        Color32::from_white_alpha(128),
                    );
                    ui.put(layout.mode, |ui: &mut egui::Ui| {
                        mode_selector(ui, &params.mode, setter)
                    });
                    toggle_button(ui, layout.listen, "Listen", &params.listen, setter);

                    // Visualizers
                    let adaptive = params.auto_freq.value().then(|| shared.adaptive_freq());
                    state
                        .waveform
                        .paint(&painter.with_clip_rect(layout.scope), layout.scope, adaptive);
                    state
                        .spectrum
                        .paint(&painter.with_clip_rect(layout.spectrum), layout.spectrum);

                    let edit = &mut state.value_edit;

                    // Dynamics
                    knob(
                        ui,
                        layout.threshold,
                        "Threshold",
                        &params.threshold,
                        setter,
                        edit,
                        DYNAMICS,
                    );
                    knob(
                        ui,
                        layout.amount,
                        "Ratio",
                        &params.amount,
                        setter,
                        edit,
                        DYNAMICS,
                    );
                    knob(
                        ui,
                        layout.attack,
                        "Attack",
                        &params.attack,
                        setter,
                        edit,
                        DYNAMICS,
                    );
                    knob(
                        ui,
                        layout.release,
                        "Release",
                        &params.release,
                        setter,
                        edit,
                        DYNAMICS,
                    );

                    // Filter
                    knob(
                        ui,
                        layout.center,
                        "Detection",
                        &params.center_freq,
                        setter,
                        edit,
                        FILTER,
                    );
                    toggle_button(ui, layout.auto_freq, "Auto", &params.auto_freq, setter);
                    knob(
                        ui,
                        layout.q,
                        "Q Factor",
                        &params.q,
                        setter,
                        edit,
                        FILTER,
                    );
                    knob(
                        ui,
                        layout.split,
                        "Split Freq",
                        &params.split_freq,
                        setter,
                        edit,
                        FILTER,
                    );

                    // Tone
                    knob(
                        ui,
                        layout.excite_amount,
                        "Exciter",
                        &params.excite_amount,
                        setter,
                        edit,
                        TONE,
                    );
                    knob(
                        ui,
                        layout.excite_mix,
                        "Excite Mix",
                        &params.excite_mix,
                        setter,
                        edit,
                        TONE,
                    );
                    knob(
                        ui,
                        layout.suppress_mix,
                        "Supp. Mix",
                        &params.suppress_mix,
                        setter,
                        edit,
                        DYNAMICS,
                    );
                    knob(
                        ui,
                        layout.output,
                        "Output",
                        &params.output_gain,
                        setter,
                        edit,
                        Color32::WHITE,
                    );
                });
        },
    )
}

/// Editor state (not persisted)
#[derive(Default)]
struct EditorState {
    waveform: WaveformView,
    spectrum: SpectrumView,
    timer: RefreshTimer,
    value_edit: ValueEdit,
}

/// Fires at most once per interval
pub struct RefreshTimer {
    interval: Duration,
    last: Option<Instant>,
    resumed: bool,
}

impl RefreshTimer {
    pub fn new(hz: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / hz.max(1),
            last: None,
            resumed: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` if an interval has passed since the last tick that fired
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            last => {
                self.resumed = last
                    .map_or(true, |last| now.saturating_duration_since(last) > RESUME_GAP);
                self.last = Some(now);
                true
            }
        }
    }

    /// Whether the last tick that fired was the first one, or followed a long gap
    pub fn resumed(&self) -> bool {
        self.resumed
    }
}

impl Default for RefreshTimer {
    fn default() -> Self {
        Self::new(REFRESH_HZ)
    }
}

fn apply_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    style.visuals.dark_mode = true;
    style.visuals.panel_fill = BACKGROUND;
    style.visuals.window_fill = Color32::from_rgb(24, 27, 36);
    style.visuals.widgets.inactive.weak_bg_fill = Color32::from_rgb(36, 40, 52);
    style.visuals.widgets.hovered.weak_bg_fill = Color32::from_rgb(48, 53, 68);
    style.visuals.widgets.active.weak_bg_fill = Color32::from_rgb(64, 70, 90);
    style.visuals.selection.bg_fill = Color32::from_rgb(70, 110, 130);
    ctx.set_style(style);
}

fn title_text(text: &str) -> RichText {
    RichText::new(text)
        .size(20.0)
        .strong()
        .color(Color32::from_white_alpha(230))
}

/// Label above, knob below
fn knob<P: Param>(
    ui: &mut egui::Ui,
    slot: KnobSlot,
    name: &str,
    param: &P,
    setter: &ParamSetter,
    edit: &mut ValueEdit,
    color: Color32,
) {
    ui.put(
        slot.label,
        egui::Label::new(RichText::new(name).size(13.0).strong().color(Color32::WHITE)),
    );
    ui.put(slot.knob, ParamKnob::for_param(param, setter, edit, color));
}

fn mode_selector(
    ui: &mut egui::Ui,
    param: &EnumParam<DetectionMode>,
    setter: &ParamSetter,
) -> egui::Response {
    let current = param.value();
    let mut selected = current;

    let response = egui::ComboBox::from_id_salt("detection_mode")
        .width(ui.available_width())
        .selected_text(mode_name(current))
        .show_ui(ui, |ui| {
            for mode in [
                DetectionMode::SplitBand,
                DetectionMode::Wideband,
                DetectionMode::Parametric,
            ] {
                ui.selectable_value(&mut selected, mode, mode_name(mode));
            }
        })
        .response;

    if selected != current {
        setter.begin_set_parameter(param);
        setter.set_parameter(param, selected);
        setter.end_set_parameter(param);
    }
    response
}

fn mode_name(mode: DetectionMode) -> &'static str {
    match mode {
        DetectionMode::SplitBand => "Split-Band",
        DetectionMode::Wideband => "Wideband",
        DetectionMode::Parametric => "Parametric",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_timer_rate_limits() {
        let mut timer = RefreshTimer::new(60);
        let start = Instant::now();

        assert!(timer.tick(start));
        assert!(!timer.tick(start + Duration::from_millis(5)));
        assert!(timer.tick(start + Duration::from_millis(17)));
        assert!(!timer.tick(start + Duration::from_millis(20)));
        assert!(timer.tick(start + Duration::from_millis(40)));
    }

    #[test]
    fn test_refresh_timer_reports_resume() {
        let mut timer = RefreshTimer::new(60);
        let start = Instant::now();

        // First tick after opening
        assert!(timer.tick(start));
        assert!(timer.resumed());

        assert!(timer.tick(start + Duration::from_millis(17)));
        assert!(!timer.resumed());

        // Window closed for a while, then reopened
        assert!(timer.tick(start + Duration::from_secs(5)));
        assert!(timer.resumed());
        assert!(timer.tick(start + Duration::from_millis(5020)));
        assert!(!timer.resumed());
    }

    #[test]
    fn test_title_is_larger_than_body_text() {
        let ctx = egui::Context::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                let title = egui::WidgetText::from(title_text("Adaptive De-Esser")).into_galley(
                    ui,
                    None,
                    f32::INFINITY,
                    egui::TextStyle::Body,
                );
                let body = egui::WidgetText::from("Adaptive De-Esser").into_galley(
                    ui,
                    None,
                    f32::INFINITY,
                    egui::TextStyle::Body,
                );
                assert!(title.size().y > body.size().y);
                assert!(title.size().x > body.size().x);
            });
        });
    }

    #[test]
    fn test_refresh_interval() {
        let timer = RefreshTimer::default();
        assert_eq!(timer.interval(), Duration::from_secs(1) / 60);
        assert_eq!(RefreshTimer::new(0).interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(mode_name(DetectionMode::SplitBand), "Split-Band");
        assert_eq!(mode_name(DetectionMode::Wideband), "Wideband");
        assert_eq!(mode_name(DetectionMode::Parametric), "Parametric");
    }
}
