use std::collections::HashMap;

use crate::model::GeoBounds;

/// Spatial index over feature bounding boxes.
///
/// Each feature is inserted into every cell its bbox overlaps, so a point
/// query never misses a feature whose bbox covers the point. Candidates may
/// still lie outside the actual shape; callers do the exact test.
#[derive(Debug, Clone)]
pub struct FeatureGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl FeatureGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            cell_size,
        }
    }

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon / self.cell_size).floor() as i32;
        let y = (lat / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Build from feature bounding boxes, indexed by position in the iterator
    pub fn build(bboxes: impl Iterator<Item = GeoBounds>, cell_size: f64) -> Self {
        let mut grid = Self::new(cell_size);
        for (idx, b) in bboxes.enumerate() {
            let min_cell = grid.to_cell(b.west, b.south);
            let max_cell = grid.to_cell(b.east, b.north);
            for y in min_cell.1..=max_cell.1 {
                for x in min_cell.0..=max_cell.0 {
                    grid.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        grid
    }

    /// Features whose bbox may contain the point
    pub fn query_point(&self, lon: f64, lat: f64) -> &[usize] {
        self.cells
            .get(&self.to_cell(lon, lat))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Append candidate features overlapping `bounds` into `results`.
    /// May contain duplicates.
    pub fn query_into(&self, bounds: &GeoBounds, results: &mut Vec<usize>) {
        let min_cell = self.to_cell(bounds.west, bounds.south);
        let max_cell = self.to_cell(bounds.east, bounds.north);
        for y in min_cell.1..=max_cell.1 {
            for x in min_cell.0..=max_cell.0 {
                if let Some(indices) = self.cells.get(&(x, y)) {
                    results.extend_from_slice(indices);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_query_finds_overlapping_boxes() {
        let boxes = [
            GeoBounds::new(0.0, 0.0, 10.0, 10.0),
            GeoBounds::new(5.0, 5.0, 30.0, 30.0),
            GeoBounds::new(-40.0, -60.0, -30.0, -50.0),
        ];
        let grid = FeatureGrid::build(boxes.into_iter(), 5.0);
        let hits = grid.query_point(7.0, 7.0);
        assert!(hits.contains(&0) && hits.contains(&1));
        assert_eq!(grid.query_point(-55.0, -35.0), &[2]);
        assert!(grid.query_point(100.0, 60.0).is_empty());
    }

    #[test]
    fn test_bbox_query() {
        let boxes = [GeoBounds::new(0.0, 0.0, 1.0, 1.0), GeoBounds::new(50.0, 50.0, 51.0, 51.0)];
        let grid = FeatureGrid::build(boxes.into_iter(), 10.0);
        let mut found = Vec::new();
        grid.query_into(&GeoBounds::new(-5.0, -5.0, 5.0, 5.0), &mut found);
        found.dedup();
        assert_eq!(found, vec![0]);
    }
}
