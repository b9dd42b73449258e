use crate::geometry::{Point, Size};

/// Impassable world cells. Out-of-range coordinates read as walkable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockGrid {
    size: Size,
    blocked: Vec<bool>,
}

impl BlockGrid {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            blocked: vec![false; size.area()],
        }
    }

    /// Grid with the given coordinates blocked; out-of-range ones are dropped.
    pub fn from_points(size: Size, points: impl IntoIterator<Item = Point>) -> Self {
        let mut grid = Self::new(size);
        for point in points {
            grid.block(point);
        }
        grid
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn is_blocked(&self, coordinate: Point) -> bool {
        self.size
            .index_of(coordinate)
            .is_some_and(|index| self.blocked[index])
    }

    /// Returns `false` when `coordinate` is outside the grid.
    pub fn set(&mut self, coordinate: Point, blocked: bool) -> bool {
        match self.size.index_of(coordinate) {
            Some(index) => {
                self.blocked[index] = blocked;
                true
            }
            None => false,
        }
    }

    pub fn block(&mut self, coordinate: Point) -> bool {
        self.set(coordinate, true)
    }

    /// ORs `other` into this grid over the overlapping area.
    pub fn union_with(&mut self, other: &BlockGrid) {
        for (index, &blocked) in other.blocked.iter().enumerate() {
            if !blocked {
                continue;
            }
            if let Some(coordinate) = other.size.coordinate_of(index) {
                self.block(coordinate);
            }
        }
    }

    pub fn clear(&mut self) {
        self.blocked.fill(false);
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked.iter().filter(|blocked| **blocked).count()
    }
}
