//! Uniform grid over scene item bounds for hit-testing.

use std::collections::HashMap;

use dotlens_core::{geometry::Point, graph::ChangeTarget};

use super::SceneItem;

/// Side length of one cell in scene units.
pub const DEFAULT_CELL_SIZE: f32 = 100.0;

/// Items covering more cells than this are kept in one list that every
/// lookup scans.
pub const MAX_CELLS_PER_ITEM: i64 = 4096;

/// Maps grid cells to the items whose bounds overlap them.
///
/// Derived entirely from item bounds and rebuilt after every sync. The graph
/// background item is never indexed.
#[derive(Debug, Clone)]
pub struct CellIndex {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<ChangeTarget>>,
    oversized: Vec<ChangeTarget>,
}

impl Default for CellIndex {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl CellIndex {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            cells: HashMap::new(),
            oversized: Vec::new(),
        }
    }

    pub fn rebuild<'a>(&mut self, items: impl IntoIterator<Item = &'a SceneItem>) {
        self.cells.clear();
        self.oversized.clear();
        for item in items {
            if item.key() == ChangeTarget::Graph {
                continue;
            }
            let Some(bounds) = item.bounds() else {
                continue;
            };
            let (x0, y0) = self.cell_of(Point::new(bounds.min_x(), bounds.min_y()));
            let (x1, y1) = self.cell_of(Point::new(bounds.max_x(), bounds.max_y()));
            let covered = (i64::from(x1) - i64::from(x0) + 1) * (i64::from(y1) - i64::from(y0) + 1);
            if covered > MAX_CELLS_PER_ITEM {
                self.oversized.push(item.key());
                continue;
            }
            for cx in x0..=x1 {
                for cy in y0..=y1 {
                    self.cells.entry((cx, cy)).or_default().push(item.key());
                }
            }
        }
    }

    /// Items whose bounds may contain `point`, oversized items included.
    pub fn candidates(&self, point: Point) -> impl Iterator<Item = ChangeTarget> + '_ {
        self.cells
            .get(&self.cell_of(point))
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .chain(&self.oversized)
            .copied()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn cell_of(&self, point: Point) -> (i32, i32) {
        (
            (point.x() / self.cell_size).floor() as i32,
            (point.y() / self.cell_size).floor() as i32,
        )
    }
}
