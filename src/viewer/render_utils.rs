use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2, pos2};

use aop_layout::NodeKind;

/// Mapping between layout units and the pixels of the graph canvas.
#[derive(Clone, Copy, Debug)]
pub(super) struct Viewport {
    pub(super) rect: Rect,
    pub(super) pan: Vec2,
    pub(super) zoom: f32,
}

impl Viewport {
    fn origin(&self) -> Pos2 {
        self.rect.center() + self.pan
    }

    pub(super) fn to_screen(&self, world: Vec2) -> Pos2 {
        self.origin() + world * self.zoom
    }

    pub(super) fn to_world(&self, screen: Pos2) -> Vec2 {
        (screen - self.origin()) / self.zoom
    }

    pub(super) fn rect_to_screen(&self, world: Rect) -> Rect {
        Rect::from_min_max(
            self.to_screen(world.min.to_vec2()),
            self.to_screen(world.max.to_vec2()),
        )
    }

    pub(super) fn shows_circle(&self, center: Pos2, radius: f32) -> bool {
        self.rect.expand(radius).contains(center)
    }

    pub(super) fn shows_segment(&self, start: Pos2, end: Pos2, padding: f32) -> bool {
        self.rect
            .intersects(Rect::from_two_pos(start, end).expand(padding))
    }
}

/// Moves `base` towards `overlay` by `amount` (0 keeps `base`).
pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    base.lerp_to_gamma(overlay, amount.clamp(0.0, 1.0))
}

/// Darkens a color for faded elements; alpha drops more slowly than the
/// channels so faded shapes stay visible.
pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    let scale = |channel: u8, by: f32| (f32::from(channel) * by).round() as u8;
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    Color32::from_rgba_unmultiplied(
        scale(r, factor),
        scale(g, factor),
        scale(b, factor),
        scale(a, 0.35 + 0.65 * factor),
    )
}

pub(super) fn with_alpha(color: Color32, alpha: u8) -> Color32 {
    let [r, g, b, _] = color.to_srgba_unmultiplied();
    Color32::from_rgba_unmultiplied(r, g, b, alpha)
}

pub(super) fn kind_color(kind: NodeKind) -> Color32 {
    match kind {
        NodeKind::Mie => Color32::from_rgb(92, 184, 122),
        NodeKind::Ke => Color32::from_rgb(96, 156, 230),
        NodeKind::Ao => Color32::from_rgb(228, 102, 96),
        NodeKind::Chemical => Color32::from_rgb(186, 132, 224),
        NodeKind::WeightOfEvidence => Color32::from_rgb(222, 186, 86),
        NodeKind::Other => Color32::from_rgb(150, 156, 164),
    }
}

/// Canvas fill plus a grid that follows pan and zoom.
pub(super) fn draw_background(painter: &Painter, viewport: Viewport) {
    let rect = viewport.rect;
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let spacing = (56.0 * viewport.zoom.clamp(0.6, 1.8)).max(20.0);
    let anchor = viewport.to_screen(Vec2::ZERO);
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let first_column = rect.left() + (anchor.x - rect.left()).rem_euclid(spacing);
    let columns = ((rect.right() - first_column) / spacing).ceil().max(0.0) as usize;
    for column in 0..columns {
        let x = first_column + column as f32 * spacing;
        painter.line_segment([pos2(x, rect.top()), pos2(x, rect.bottom())], stroke);
    }

    let first_row = rect.top() + (anchor.y - rect.top()).rem_euclid(spacing);
    let rows = ((rect.bottom() - first_row) / spacing).ceil().max(0.0) as usize;
    for row in 0..rows {
        let y = first_row + row as f32 * spacing;
        painter.line_segment([pos2(rect.left(), y), pos2(rect.right(), y)], stroke);
    }
}
