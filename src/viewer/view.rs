use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Stroke, StrokeKind, Ui, Vec2, vec2};

use aop_layout::engine::hypernode_bounds;
use aop_layout::util::short_label;

use super::ViewModel;
use super::render_utils::{blend_color, dim_color, draw_background, kind_color, with_alpha};

impl ViewModel {
    pub(in crate::viewer) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.handle_graph_zoom(ui, &response);
        self.handle_graph_pan(&response);

        let viewport = self.viewport(rect);
        draw_background(&painter, viewport);

        let Some(layout) = self.layout.as_ref() else {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Nothing to lay out for the current settings.",
                FontId::proportional(15.0),
                Color32::from_gray(200),
            );
            return;
        };

        let zoom = viewport.zoom;
        let zoom_sqrt = zoom.sqrt();
        let result = &layout.result;
        let highlight = self.highlight.as_ref();
        let label_font = (self.config.geometry.label_font_size * zoom_sqrt).clamp(8.0, 22.0);

        for hypernode in &result.hypernodes {
            let screen = viewport.rect_to_screen(hypernode_bounds(hypernode));
            if !rect.intersects(screen) {
                continue;
            }

            let faded = highlight.is_some_and(|set| set.is_hypernode_faded(&hypernode.id));
            let lit = highlight.is_some_and(|set| set.hypernodes.contains(&hypernode.id));
            let base = kind_color(hypernode.kind);
            let (fill, stroke) = if faded {
                (with_alpha(dim_color(base, 0.4), 14), dim_color(base, 0.35))
            } else if lit {
                (with_alpha(base, 44), blend_color(base, Color32::WHITE, 0.35))
            } else {
                (with_alpha(base, 28), base)
            };

            let corner = 6.0 * zoom_sqrt;
            painter.rect_filled(screen, corner, fill);
            painter.rect_stroke(
                screen,
                corner,
                Stroke::new(if lit { 2.0 } else { 1.2 }, stroke),
                StrokeKind::Inside,
            );
            painter.text(
                screen.left_top() + vec2(8.0, 4.0),
                Align2::LEFT_TOP,
                hypernode.label.as_str(),
                FontId::proportional(label_font),
                if faded {
                    Color32::from_gray(110)
                } else {
                    Color32::from_gray(230)
                },
            );
        }

        let screen_nodes = layout
            .model
            .nodes()
            .iter()
            .map(|node| {
                let world = result.position(&node.id).map(Vec2::from).unwrap_or_default();
                let radius = result
                    .node_radii
                    .get(&node.id)
                    .copied()
                    .unwrap_or(self.config.geometry.node_radius);
                (
                    viewport.to_screen(world),
                    (radius * zoom).clamp(2.5, 46.0),
                )
            })
            .collect::<Vec<(Pos2, f32)>>();

        for (edge, &(from, to)) in layout.model.edges().iter().zip(layout.model.edge_endpoints()) {
            let start = screen_nodes[from].0;
            let end = screen_nodes[to].0;
            if !viewport.shows_segment(start, end, 2.5) {
                continue;
            }

            let (width, color) = match highlight {
                Some(set) if set.edges.contains(&edge.id) => (
                    (2.4 * zoom_sqrt).clamp(1.2, 4.4),
                    Color32::from_rgb(241, 146, 94),
                ),
                Some(_) => (
                    (0.8 * zoom_sqrt).clamp(0.45, 2.0),
                    Color32::from_rgba_unmultiplied(80, 90, 104, 90),
                ),
                None => (
                    (1.2 * zoom_sqrt).clamp(0.6, 3.4),
                    Color32::from_rgba_unmultiplied(150, 156, 164, 170),
                ),
            };
            painter.line_segment([start, end], Stroke::new(width, color));
            draw_arrow_head(&painter, start, end, screen_nodes[to].1, width, color);
        }

        let hovered = Self::hovered_node(&response, &screen_nodes);
        if hovered.is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        }

        let selected_color = Color32::from_rgb(245, 206, 93);
        for (index, node) in layout.model.nodes().iter().enumerate() {
            let (position, radius) = screen_nodes[index];
            if !viewport.shows_circle(position, radius) {
                continue;
            }

            let is_selected = self.selected.as_deref() == Some(node.id.as_str());
            let is_hovered = hovered == Some(index);
            let faded = highlight.is_some_and(|set| set.is_node_faded(&node.id));
            let base = kind_color(node.kind);
            let color = if is_selected {
                selected_color
            } else if is_hovered {
                blend_color(base, Color32::WHITE, 0.35)
            } else if faded {
                dim_color(base, 0.4)
            } else {
                base
            };

            painter.circle_filled(position, radius, color);
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(
                    if is_selected { 2.2 } else { 1.0 },
                    Color32::from_rgba_unmultiplied(15, 15, 15, 190),
                ),
            );

            if is_selected || is_hovered || (!faded && zoom > 0.8) {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    short_label(&node.label, 28),
                    FontId::proportional(12.0),
                    if faded {
                        Color32::from_gray(120)
                    } else {
                        Color32::from_gray(238)
                    },
                );
            }
        }

        if let Some(index) = hovered {
            let node = &layout.model.nodes()[index];
            let record = result.centrality.get(&node.id).copied().unwrap_or_default();
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!(
                    "{}  |  {}  |  degree {}  |  betweenness {:.2}",
                    short_label(&node.label, 48),
                    node.kind.short_label(),
                    record.degree,
                    record.betweenness
                ),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            let selection = hovered.map(|index| layout.model.nodes()[index].id.clone());
            self.set_selected(selection);
        }
    }
}

fn draw_arrow_head(
    painter: &egui::Painter,
    start: Pos2,
    end: Pos2,
    target_radius: f32,
    width: f32,
    color: Color32,
) {
    let delta = end - start;
    let length = delta.length();
    if length <= target_radius + 4.0 {
        return;
    }

    let direction = delta / length;
    let tip = end - direction * target_radius;
    let size = (width * 3.0).clamp(5.0, 12.0);
    let normal = vec2(-direction.y, direction.x);
    let base = tip - direction * size;
    painter.line_segment([tip, base + normal * size * 0.5], Stroke::new(width, color));
    painter.line_segment([tip, base - normal * size * 0.5], Stroke::new(width, color));
}
