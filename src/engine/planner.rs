use tracing::info;

use crate::util::Point;

use super::config::GeometryConfig;
use super::grouping::Hypernode;

/// Hypernode indices in placement order: pathway kind first, then id.
pub fn placement_order(hypernodes: &[Hypernode]) -> Vec<usize> {
    let mut order = (0..hypernodes.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| {
        let left = &hypernodes[a];
        let right = &hypernodes[b];
        left.kind
            .priority()
            .cmp(&right.kind.priority())
            .then_with(|| left.id.cmp(&right.id))
    });
    order
}

/// Places hypernode centers on a near-square grid centered on the origin.
pub fn plan_grid(hypernodes: &mut [Hypernode], geometry: &GeometryConfig) {
    let count = hypernodes.len();
    if count == 0 {
        return;
    }

    let cols = (count as f64).sqrt().ceil() as usize;
    let rows = count.div_ceil(cols);
    let col_offset = (cols as f32 - 1.0) / 2.0;
    let row_offset = (rows as f32 - 1.0) / 2.0;

    for (slot, index) in placement_order(hypernodes).into_iter().enumerate() {
        let col = (slot % cols) as f32;
        let row = (slot / cols) as f32;
        hypernodes[index].center = Point {
            x: (col - col_offset) * geometry.grid_x_pad,
            y: (row - row_offset) * geometry.grid_y_pad,
        };
    }

    info!(hypernodes = count, cols, rows, "planned macro grid");
}
