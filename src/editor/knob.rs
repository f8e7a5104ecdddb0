//! Rotary parameter knob
//!
//! Drag up or right to increase, double-click to reset. The formatted value
//! sits in a text box under the dial; click it to type a new value.

use nih_plug::prelude::{Param, ParamSetter};
use nih_plug_egui::egui::{
    self, pos2, vec2, Align, Align2, Color32, FontId, Key, Pos2, Rect, Response, Sense, Shape,
    Stroke, TextEdit, Ui, Widget,
};
use std::f32::consts::PI;

/// Start of the dial travel, radians clockwise from straight up
const START_ANGLE: f32 = -0.75 * PI;
/// End of the dial travel
const END_ANGLE: f32 = 0.75 * PI;
/// Normalized change per dragged pixel
const DRAG_SENSITIVITY: f32 = 0.005;
const TEXT_BOX: (f32, f32) = (70.0, 14.0);
const ARC_SEGMENTS: usize = 48;

/// Text entry state shared by all knobs. Only one value box is edited at a time.
#[derive(Default)]
pub struct ValueEdit {
    /// Name of the parameter being edited
    target: Option<String>,
    buffer: String,
    needs_focus: bool,
}

impl ValueEdit {
    fn is_editing(&self, name: &str) -> bool {
        self.target.as_deref() == Some(name)
    }

    fn start(&mut self, name: &str, text: String) {
        self.target = Some(name.to_owned());
        self.buffer = text;
        self.needs_focus = true;
    }

    fn stop(&mut self) {
        self.target = None;
        self.buffer.clear();
    }
}

pub struct ParamKnob<'a, P: Param> {
    param: &'a P,
    setter: &'a ParamSetter<'a>,
    edit: &'a mut ValueEdit,
    color: Color32,
}

impl<'a, P: Param> ParamKnob<'a, P> {
    pub fn for_param(
        param: &'a P,
        setter: &'a ParamSetter<'a>,
        edit: &'a mut ValueEdit,
        color: Color32,
    ) -> Self {
        Self {
            param,
            setter,
            edit,
            color,
        }
    }

    fn set_normalized(&self, normalized: f32) {
        let normalized = normalized.clamp(0.0, 1.0);
        if (normalized - self.param.unmodulated_normalized_value()).abs() > f32::EPSILON {
            self.setter.set_parameter_normalized(self.param, normalized);
        }
    }
}

impl<P: Param> Widget for ParamKnob<'_, P> {
    fn ui(mut self, ui: &mut Ui) -> Response {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());

        if response.double_clicked() {
            self.setter.begin_set_parameter(self.param);
            self.set_normalized(self.param.default_normalized_value());
            self.setter.end_set_parameter(self.param);
        } else {
            if response.drag_started() {
                self.setter.begin_set_parameter(self.param);
            }
            if response.dragged() {
                let delta = response.drag_delta();
                let change = (delta.x - delta.y) * DRAG_SENSITIVITY;
                if change != 0.0 {
                    self.set_normalized(self.param.unmodulated_normalized_value() + change);
                }
            }
            if response.drag_stopped() {
                self.setter.end_set_parameter(self.param);
            }
        }

        let (_, text_box) = split_text_box(rect);
        let name = self.param.name();
        let editing = self.edit.is_editing(name);

        if ui.is_rect_visible(rect) {
            paint(ui, rect, self.param, self.color, !editing);
        }

        if editing {
            let text_response = ui.put(
                text_box,
                TextEdit::singleline(&mut self.edit.buffer)
                    .font(FontId::proportional(11.0))
                    .horizontal_align(Align::Center)
                    .margin(vec2(2.0, 0.0)),
            );
            if self.edit.needs_focus {
                text_response.request_focus();
                self.edit.needs_focus = false;
            }
            if text_response.lost_focus() {
                if ui.input(|i| i.key_pressed(Key::Enter)) {
                    if let Some(normalized) = parse_value(self.param, &self.edit.buffer) {
                        self.setter.begin_set_parameter(self.param);
                        self.set_normalized(normalized);
                        self.setter.end_set_parameter(self.param);
                    }
                }
                self.edit.stop();
            }
        } else {
            let box_response = ui.interact(text_box, response.id.with("value"), Sense::click());
            if box_response.clicked() {
                let current = self
                    .param
                    .normalized_value_to_string(self.param.unmodulated_normalized_value(), false);
                self.edit.start(name, current);
            }
        }

        response
    }
}

/// Normalized value for typed text, using the parameter's own parser
pub fn parse_value<P: Param>(param: &P, text: &str) -> Option<f32> {
    param.string_to_normalized_value(text.trim())
}

fn paint<P: Param>(ui: &Ui, rect: Rect, param: &P, color: Color32, show_value: bool) {
    let painter = ui.painter_at(rect);
    let (dial, text_box) = split_text_box(rect);

    let radius = (dial.width().min(dial.height()) * 0.5 - 4.0).max(2.0);
    let center = dial.center();
    let normalized = param.unmodulated_normalized_value();
    let thickness = (radius * 0.15).clamp(2.0, 6.0);

    painter.add(Shape::line(
        arc_points(center, radius, START_ANGLE, END_ANGLE),
        Stroke::new(thickness, Color32::from_white_alpha(25)),
    ));
    let value_angle = value_to_angle(normalized);
    if normalized > 0.0 {
        painter.add(Shape::line(
            arc_points(center, radius, START_ANGLE, value_angle),
            Stroke::new(thickness, color),
        ));
    }

    let knob_radius = radius - thickness * 1.5;
    if knob_radius > 1.0 {
        painter.circle_filled(center, knob_radius, Color32::from_rgb(32, 35, 46));
        painter.line_segment(
            [
                point_on_circle(center, knob_radius * 0.3, value_angle),
                point_on_circle(center, knob_radius * 0.9, value_angle),
            ],
            Stroke::new(2.0, Color32::WHITE),
        );
    }

    painter.rect_filled(text_box, 2.0, Color32::from_black_alpha(90));
    if !show_value {
        return;
    }
    painter.text(
        text_box.center(),
        Align2::CENTER_CENTER,
        param.normalized_value_to_string(normalized, true),
        FontId::proportional(11.0),
        Color32::from_white_alpha(220),
    );
}

/// Dial area and the value text box centred below it
fn split_text_box(rect: Rect) -> (Rect, Rect) {
    let (width, height) = TEXT_BOX;
    let height = height.min(rect.height());
    let width = width.min(rect.width());
    let text_box = Rect::from_center_size(
        pos2(rect.center().x, rect.max.y - height * 0.5),
        vec2(width, height),
    );
    let dial = Rect::from_min_max(rect.min, pos2(rect.max.x, rect.max.y - height));
    (dial, text_box)
}

/// Dial angle for a normalized value
pub fn value_to_angle(normalized: f32) -> f32 {
    START_ANGLE + normalized.clamp(0.0, 1.0) * (END_ANGLE - START_ANGLE)
}

/// Angles are clockwise from straight up
fn point_on_circle(center: Pos2, radius: f32, angle: f32) -> Pos2 {
    pos2(center.x + radius * angle.sin(), center.y - radius * angle.cos())
}

fn arc_points(center: Pos2, radius: f32, from: f32, to: f32) -> Vec<Pos2> {
    (0..=ARC_SEGMENTS)
        .map(|i| {
            let t = i as f32 / ARC_SEGMENTS as f32;
            point_on_circle(center, radius, from + (to - from) * t)
        })
        .collect()
}

/// Toggle button bound to a [`nih_plug::prelude::BoolParam`]
pub fn toggle_button(
    ui: &mut Ui,
    rect: Rect,
    text: &str,
    param: &nih_plug::prelude::BoolParam,
    setter: &ParamSetter,
) {
    let on = param.value();
    let response = ui.put(rect, egui::Button::new(text).selected(on));
    if response.clicked() {
        setter.begin_set_parameter(param);
        setter.set_parameter(param, !on);
        setter.end_set_parameter(param);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_to_angle() {
        assert_eq!(value_to_angle(0.0), START_ANGLE);
        assert_eq!(value_to_angle(1.0), END_ANGLE);
        assert!(value_to_angle(0.5).abs() < 1e-6);
        assert_eq!(value_to_angle(2.0), END_ANGLE);
    }

    #[test]
    fn test_point_on_circle() {
        let center = pos2(10.0, 10.0);
        let top = point_on_circle(center, 5.0, 0.0);
        assert!((top.x - 10.0).abs() < 1e-5 && (top.y - 5.0).abs() < 1e-5);
        let right = point_on_circle(center, 5.0, PI / 2.0);
        assert!((right.x - 15.0).abs() < 1e-5 && (right.y - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_text_box_sits_below_dial() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(120.0, 160.0));
        let (dial, text_box) = split_text_box(rect);
        assert_eq!(dial, Rect::from_min_size(pos2(0.0, 0.0), vec2(120.0, 146.0)));
        assert_eq!(text_box, Rect::from_min_size(pos2(25.0, 146.0), vec2(70.0, 14.0)));
    }

    #[test]
    fn test_typed_values_use_param_parsers() {
        let params = crate::params::DeEsserParams::default();

        let ratio = parse_value(&params.amount, "50%").unwrap();
        assert!((ratio - 0.5).abs() < 1e-6);
        let ratio = parse_value(&params.amount, " 25 % ").unwrap();
        assert!((ratio - 0.25).abs() < 1e-6);

        // -60..0 dB linear, so -30 dB sits half way
        let threshold = parse_value(&params.threshold, "-30").unwrap();
        assert!((threshold - 0.5).abs() < 1e-4);

        let unity = parse_value(&params.output_gain, "0").unwrap();
        assert!((unity - params.output_gain.default_normalized_value()).abs() < 1e-4);

        assert!(parse_value(&params.amount, "loud").is_none());
    }

    #[test]
    fn test_value_edit_targets_one_param() {
        let mut edit = ValueEdit::default();
        assert!(!edit.is_editing("Ratio"));

        edit.start("Ratio", "50".to_owned());
        assert!(edit.is_editing("Ratio"));
        assert!(!edit.is_editing("Attack"));
        assert_eq!(edit.buffer, "50");

        edit.stop();
        assert!(!edit.is_editing("Ratio"));
        assert!(edit.buffer.is_empty());
    }

    #[test]
    fn test_arc_points_endpoints() {
        let points = arc_points(pos2(0.0, 0.0), 10.0, START_ANGLE, END_ANGLE);
        assert_eq!(points.len(), ARC_SEGMENTS + 1);
        // Symmetric about the vertical axis
        assert!((points[0].x + points[ARC_SEGMENTS].x).abs() < 1e-4);
        assert!((points[0].y - points[ARC_SEGMENTS].y).abs() < 1e-4);
    }
}
