use eframe::egui::{PointerButton, Pos2, Rect, Response, Ui};

use super::ViewModel;
use super::render_utils::Viewport;

const ZOOM_RANGE: (f32, f32) = (0.1, 6.0);

impl ViewModel {
    pub(in crate::viewer) fn viewport(&self, rect: Rect) -> Viewport {
        Viewport {
            rect,
            pan: self.pan,
            zoom: self.zoom,
        }
    }

    /// Wheel or pinch zoom anchored at the pointer: the layout point under
    /// the cursor stays put.
    pub(in crate::viewer) fn handle_graph_zoom(&mut self, ui: &Ui, response: &Response) {
        let Some(pointer) = response.hover_pos() else {
            return;
        };

        let (scroll, pinch) = ui.input(|input| (input.smooth_scroll_delta.y, input.zoom_delta()));
        let factor = if (pinch - 1.0).abs() > f32::EPSILON {
            pinch
        } else {
            (scroll * 0.0018).exp()
        };
        if (factor - 1.0).abs() <= f32::EPSILON {
            return;
        }

        let viewport = self.viewport(response.rect);
        let anchor = viewport.to_world(pointer);
        self.zoom = (self.zoom * factor.clamp(0.85, 1.15)).clamp(ZOOM_RANGE.0, ZOOM_RANGE.1);
        self.pan = pointer - response.rect.center() - anchor * self.zoom;
    }

    pub(in crate::viewer) fn handle_graph_pan(&mut self, response: &Response) {
        let panning = [PointerButton::Secondary, PointerButton::Middle]
            .into_iter()
            .any(|button| response.dragged_by(button));
        if panning {
            self.pan += response.drag_delta();
        }
    }

    /// Closest node under the pointer, as an index into `screen_nodes`.
    pub(in crate::viewer) fn hovered_node(response: &Response, screen_nodes: &[(Pos2, f32)]) -> Option<usize> {
        let pointer = response.hover_pos()?;
        let mut best: Option<(usize, f32)> = None;
        for (index, &(position, radius)) in screen_nodes.iter().enumerate() {
            let distance = position.distance(pointer);
            if distance <= radius && best.is_none_or(|(_, closest)| distance < closest) {
                best = Some((index, distance));
            }
        }
        best.map(|(index, _)| index)
    }
}
