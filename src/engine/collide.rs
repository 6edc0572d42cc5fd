use std::cmp::Ordering;

use eframe::egui::{Rect, Vec2, pos2, vec2};
use tracing::{debug, info, warn};

use crate::util::{Point, fallback_direction};

use super::config::LayoutConfig;
use super::grouping::Hypernode;

/// Width of one label glyph, as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.6;
const LABEL_LINE_HEIGHT: f32 = 1.8;

/// Center-to-center pitch of the child grid.
pub fn child_pitch(config: &LayoutConfig) -> f32 {
    let geometry = &config.geometry;
    (2.0 * geometry.max_node_radius() + geometry.node_gap).max(geometry.min_distance())
}

fn grid_shape(member_count: usize) -> (usize, usize) {
    let cols = (member_count.max(1) as f32).sqrt().ceil() as usize;
    (cols, member_count.max(1).div_ceil(cols))
}

/// Fills in `width`, `height` and `label_height` from the member count,
/// the available radius and the label text.
pub fn size_container(hypernode: &mut Hypernode, config: &LayoutConfig) {
    let geometry = &config.geometry;
    let pitch = child_pitch(config);
    let (cols, rows) = grid_shape(hypernode.member_count());
    let max_radius = geometry.max_node_radius();

    let grid_width = (cols as f32 - 1.0) * pitch + 2.0 * max_radius;
    let grid_height = (rows as f32 - 1.0) * pitch + 2.0 * max_radius;
    let label_width = hypernode.label.chars().count() as f32 * geometry.label_font_size * GLYPH_WIDTH;
    let label_height = geometry.label_font_size * LABEL_LINE_HEIGHT;
    let diameter = 2.0 * hypernode.available_radius;

    hypernode.width = (grid_width + 2.0 * geometry.hypernode_padding)
        .max(label_width + 2.0 * geometry.hypernode_padding)
        .max(diameter)
        .max(geometry.min_hypernode_size);
    hypernode.height = (grid_height + 2.0 * geometry.hypernode_padding)
        .max(diameter)
        .max(geometry.min_hypernode_size)
        + label_height;
    hypernode.label_height = label_height;
}

/// Container rectangle including the label band above the body.
pub fn hypernode_bounds(hypernode: &Hypernode) -> Rect {
    Rect::from_center_size(
        pos2(
            hypernode.center.x,
            hypernode.center.y - hypernode.label_height / 2.0,
        ),
        vec2(hypernode.width, hypernode.height),
    )
}

/// Outcome of [`resolve_collisions`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollisionReport {
    pub passes: usize,
    /// Index pairs still overlapping beyond the tolerance once the pass
    /// budget ran out.
    pub unresolved: Vec<(usize, usize)>,
}

/// Both-axis overlap of two containers, positive when they intersect.
fn box_overlap(a: &Hypernode, b: &Hypernode) -> (f32, f32) {
    let a = hypernode_bounds(a);
    let b = hypernode_bounds(b);
    let delta = b.center() - a.center();
    (
        (a.width() + b.width()) / 2.0 - delta.x.abs(),
        (a.height() + b.height()) / 2.0 - delta.y.abs(),
    )
}

/// Pushes overlapping containers apart within a fixed pass budget.
pub fn resolve_collisions(hypernodes: &mut [Hypernode], config: &LayoutConfig) -> CollisionReport {
    let collision = &config.collision;
    let count = hypernodes.len();
    let mut passes_run = 0;

    for pass in 0..collision.passes {
        passes_run = pass + 1;
        let mut moved = 0usize;

        for i in 0..count {
            for j in (i + 1)..count {
                let (overlap_x, overlap_y) = box_overlap(&hypernodes[i], &hypernodes[j]);
                if overlap_x <= collision.tolerance || overlap_y <= collision.tolerance {
                    continue;
                }

                let delta = Vec2::from(hypernodes[j].center) - Vec2::from(hypernodes[i].center);
                let length = delta.length();
                let direction = if length > f32::EPSILON {
                    delta / length
                } else {
                    fallback_direction(i, j)
                };

                let travel = axis_travel(overlap_x, direction.x).min(axis_travel(overlap_y, direction.y));
                if !travel.is_finite() {
                    continue;
                }

                let shift = direction * travel * collision.push_scale;
                shift_center(&mut hypernodes[i], -shift);
                shift_center(&mut hypernodes[j], shift);
                moved += 1;
            }
        }

        debug!(pass = passes_run, moved, "collision pass");
        if moved == 0 {
            break;
        }
    }

    let mut unresolved = Vec::new();
    for i in 0..count {
        for j in (i + 1)..count {
            let (overlap_x, overlap_y) = box_overlap(&hypernodes[i], &hypernodes[j]);
            if overlap_x > collision.tolerance && overlap_y > collision.tolerance {
                warn!(
                    first = hypernodes[i].id.as_str(),
                    second = hypernodes[j].id.as_str(),
                    overlap = overlap_x.min(overlap_y),
                    "containers still overlap after the last collision pass"
                );
                unresolved.push((i, j));
            }
        }
    }

    info!(
        hypernodes = count,
        passes = passes_run,
        unresolved = unresolved.len(),
        "resolved hypernode collisions"
    );
    CollisionReport {
        passes: passes_run,
        unresolved,
    }
}

/// Distance along a direction with component `component` that clears
/// `overlap` on that axis.
fn axis_travel(overlap: f32, component: f32) -> f32 {
    if component.abs() <= f32::EPSILON {
        f32::INFINITY
    } else {
        overlap / component.abs()
    }
}

fn shift_center(hypernode: &mut Hypernode, shift: Vec2) {
    hypernode.center = Point {
        x: hypernode.center.x + shift.x,
        y: hypernode.center.y + shift.y,
    };
}

/// Re-seats a hypernode's children on a uniform grid around its current
/// center. Rows are filled top to bottom, keeping the simulated
/// arrangement's rough order, and the last row is centered.
///
/// `positions` holds the simulated positions of the members, in member
/// order; it is overwritten with the final ones.
pub fn repack_children(hypernode: &Hypernode, positions: &mut [Vec2], config: &LayoutConfig) {
    let count = positions.len();
    if count == 0 {
        return;
    }

    let pitch = child_pitch(config);
    let (cols, rows) = grid_shape(count);
    let center = Vec2::from(hypernode.center);

    let mut order = (0..count).collect::<Vec<_>>();
    order.sort_by(|&a, &b| {
        compare(positions[a].y, positions[b].y)
            .then_with(|| compare(positions[a].x, positions[b].x))
            .then_with(|| a.cmp(&b))
    });

    let mut seated = vec![Vec2::ZERO; count];
    for (row, chunk) in order.chunks_mut(cols).enumerate() {
        chunk.sort_by(|&a, &b| compare(positions[a].x, positions[b].x).then_with(|| a.cmp(&b)));

        let row_offset = (row as f32 - (rows as f32 - 1.0) / 2.0) * pitch;
        let col_center = (chunk.len() as f32 - 1.0) / 2.0;
        for (col, &member) in chunk.iter().enumerate() {
            seated[member] = center + vec2((col as f32 - col_center) * pitch, row_offset);
        }
    }

    positions.copy_from_slice(&seated);
}

fn compare(a: f32, b: f32) -> Ordering {
    a.total_cmp(&b)
}
