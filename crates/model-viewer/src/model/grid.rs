//! The fixed reference grid and axis indicators drawn under every model.

use super::geometry::LineBatch;

pub const CELL_SIZE: f32 = 100.0;
pub const CELLS_PER_SIDE: i32 = 1000;
pub const AXIS_HALF_LENGTH: f32 = 70_000.0;

pub const GRID_COLOR: [f32; 3] = [62.0 / 255.0, 63.0 / 255.0, 66.0 / 255.0];
pub const X_AXIS_COLOR: [f32; 3] = [232.0 / 255.0, 95.0 / 255.0, 55.0 / 255.0];
pub const Y_AXIS_COLOR: [f32; 3] = [118.0 / 255.0, 248.0 / 255.0, 39.0 / 255.0];
pub const Z_AXIS_COLOR: [f32; 3] = [37.0 / 255.0, 191.0 / 255.0, 250.0 / 255.0];
pub const CLEAR_COLOR: [f32; 3] = [55.0 / 255.0, 56.0 / 255.0, 59.0 / 255.0];

/// Index of the batch that ignores the axis mask.
pub const GRID_BATCH: usize = 3;

/// Batches in draw order: x axis, y axis, z axis, grid.
pub fn reference_grid() -> Vec<LineBatch> {
    let l = AXIS_HALF_LENGTH;
    let axis = |to: [f32; 3], color| {
        let mut batch = LineBatch::default();
        batch.push_line(to.map(|c| -c), to, color);
        batch
    };

    vec![
        axis([l, 0.0, 0.0], X_AXIS_COLOR),
        axis([0.0, l, 0.0], Y_AXIS_COLOR),
        axis([0.0, 0.0, l], Z_AXIS_COLOR),
        grid_lines(),
    ]
}

/// Lines of the XZ plane grid. The centre lines are left to the axes.
fn grid_lines() -> LineBatch {
    let half = CELLS_PER_SIDE / 2;
    let extent = half as f32 * CELL_SIZE;
    let mut batch = LineBatch::default();

    for i in (-half..=half).filter(|&i| i != 0) {
        let c = i as f32 * CELL_SIZE;
        batch.push_line([c, 0.0, -extent], [c, 0.0, extent], GRID_COLOR);
        batch.push_line([-extent, 0.0, c], [extent, 0.0, c], GRID_COLOR);
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_layout() {
        let batches = reference_grid();
        assert_eq!(batches.len(), 4);
        for axis in &batches[..GRID_BATCH] {
            assert_eq!(axis.indices, vec![0, 1]);
        }

        let grid = &batches[GRID_BATCH];
        // 1001 lines per direction minus the centre line
        assert_eq!(grid.indices.len(), 2 * 2 * 1000);
        assert!(grid.vertices.iter().all(|v| v.position[1] == 0.0));
        assert!(grid
            .vertices
            .iter()
            .all(|v| v.position[0].abs() <= 50_000.0 && v.position[2].abs() <= 50_000.0));
        assert!(!grid
            .vertices
            .chunks_exact(2)
            .any(|line| line[0].position[0] == 0.0 && line[1].position[0] == 0.0));
    }

    #[test]
    fn y_axis_is_vertical() {
        let batches = reference_grid();
        let y = &batches[1];
        assert_eq!(y.vertices[0].position, [0.0, -AXIS_HALF_LENGTH, 0.0]);
        assert_eq!(y.vertices[1].position, [0.0, AXIS_HALF_LENGTH, 0.0]);
        assert_eq!(y.vertices[0].color, Y_AXIS_COLOR);
    }
}
