//! Fixed pixel layout of the editor
//!
//! Rectangles are carved off the window bounds edge by edge. Divisions are
//! floored so every widget lands on whole pixels.

use nih_plug_egui::egui::{pos2, vec2, Rect};

/// Carving helpers for [`Rect`]
pub trait RectExt {
    /// Cut `amount` off the top, returning the removed strip
    fn remove_from_top(&mut self, amount: f32) -> Rect;
    #[allow(dead_code)]
    fn remove_from_bottom(&mut self, amount: f32) -> Rect;
    fn remove_from_left(&mut self, amount: f32) -> Rect;
    fn remove_from_right(&mut self, amount: f32) -> Rect;
    /// Shrink by `dx` on the left and right and `dy` on the top and bottom
    fn reduced(&self, dx: f32, dy: f32) -> Rect;
}

impl RectExt for Rect {
    fn remove_from_top(&mut self, amount: f32) -> Rect {
        let amount = amount.clamp(0.0, self.height());
        let strip = Rect::from_min_size(self.min, vec2(self.width(), amount));
        self.min.y += amount;
        strip
    }

    fn remove_from_bottom(&mut self, amount: f32) -> Rect {
        let amount = amount.clamp(0.0, self.height());
        self.max.y -= amount;
        Rect::from_min_size(pos2(self.min.x, self.max.y), vec2(self.width(), amount))
    }

    fn remove_from_left(&mut self, amount: f32) -> Rect {
        let amount = amount.clamp(0.0, self.width());
        let strip = Rect::from_min_size(self.min, vec2(amount, self.height()));
        self.min.x += amount;
        strip
    }

    fn remove_from_right(&mut self, amount: f32) -> Rect {
        let amount = amount.clamp(0.0, self.width());
        self.max.x -= amount;
        Rect::from_min_size(pos2(self.max.x, self.min.y), vec2(amount, self.height()))
    }

    fn reduced(&self, dx: f32, dy: f32) -> Rect {
        let dx = dx.min(self.width() / 2.0);
        let dy = dy.min(self.height() / 2.0);
        Rect::from_min_max(
            pos2(self.min.x + dx, self.min.y + dy),
            pos2(self.max.x - dx, self.max.y - dy),
        )
    }
}

/// Label strip above a knob
pub const LABEL_HEIGHT: f32 = 18.0;
/// Height of the scope strip above the separators
pub const SEPARATOR_TOP: f32 = 180.0;

/// Label and knob area for one parameter
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KnobSlot {
    pub label: Rect,
    pub knob: Rect,
}

impl KnobSlot {
    fn place(mut slot: Rect) -> Self {
        let label = slot.remove_from_top(LABEL_HEIGHT);
        Self { label, knob: slot }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EditorLayout {
    pub title: Rect,
    pub mode_label: Rect,
    pub mode: Rect,
    pub listen: Rect,
    pub scope: Rect,
    pub spectrum: Rect,
    pub auto_freq: Rect,

    // Dynamics
    pub threshold: KnobSlot,
    pub amount: KnobSlot,
    pub attack: KnobSlot,
    pub release: KnobSlot,

    // Filter
    pub center: KnobSlot,
    pub q: KnobSlot,
    pub split: KnobSlot,

    // Tone
    pub excite_amount: KnobSlot,
    pub excite_mix: KnobSlot,
    pub suppress_mix: KnobSlot,
    pub output: KnobSlot,
}

impl EditorLayout {
    pub fn new(bounds: Rect) -> Self {
        let mut area = bounds.reduced(15.0, 15.0);

        let mut header = area.remove_from_top(30.0);
        let mut mode_area = header.remove_from_right(220.0);
        let listen = mode_area.remove_from_right(60.0);
        mode_area.remove_from_right(10.0);
        let mode_label = mode_area.remove_from_left(50.0);
        let mode = mode_area;
        let title = header;

        let scope = area.remove_from_top(100.0);
        area.remove_from_top(5.0);
        let spectrum = area.remove_from_top(50.0);
        area.remove_from_top(15.0);

        let group_width = (area.width() / 3.0).floor();
        let dynamics = area.remove_from_left(group_width).reduced(5.0, 0.0);
        let filter = area.remove_from_left(group_width).reduced(5.0, 0.0);
        let tone = area.reduced(5.0, 0.0);

        let [threshold, amount, attack, release] = four_slots(dynamics);
        let [excite_amount, excite_mix, suppress_mix, output] = four_slots(tone);

        let mut filter = filter;
        let mut row1 = filter.remove_from_top((filter.height() / 2.0).floor());
        let auto_freq = row1.remove_from_right(50.0).reduced(0.0, 20.0);
        let center = KnobSlot::place(row1.reduced(10.0, 0.0));
        let q = KnobSlot::place(
            filter
                .remove_from_left((filter.width() / 2.0).floor())
                .reduced(2.0, 2.0),
        );
        let split = KnobSlot::place(filter.reduced(2.0, 2.0));

        Self {
            title,
            mode_label,
            mode,
            listen,
            scope,
            spectrum,
            auto_freq,
            threshold,
            amount,
            attack,
            release,
            center,
            q,
            split,
            excite_amount,
            excite_mix,
            suppress_mix,
            output,
        }
    }
}

/// Two rows of two slots each, left to right then top to bottom
fn four_slots(mut group: Rect) -> [KnobSlot; 4] {
    let mut row1 = group.remove_from_top((group.height() / 2.0).floor());
    let a = row1.remove_from_left((row1.width() / 2.0).floor()).reduced(2.0, 2.0);
    let b = row1.reduced(2.0, 2.0);
    let c = group.remove_from_left((group.width() / 2.0).floor()).reduced(2.0, 2.0);
    let d = group.reduced(2.0, 2.0);
    [a, b, c, d].map(KnobSlot::place)
}

/// X positions of the faint group separators drawn behind the controls
pub fn separator_lines(bounds: Rect) -> [(f32, f32, f32); 2] {
    let mut r = bounds;
    r.remove_from_top(SEPARATOR_TOP);
    let w = (r.width() / 3.0).floor();
    let top = r.min.y + 10.0;
    let bottom = r.max.y - 10.0;
    [(r.min.x + w, top, bottom), (r.min.x + w * 2.0, top, bottom)]
}
