use thiserror::Error;
use tracing::debug;

use super::{Composite, Drawable, Layer};
use crate::geometry::{Point, Rect, Size};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("grid needs at least one column and one row, got {width}x{height}")]
    EmptyGrid { width: u32, height: u32 },
    #[error("cells must be at least 1x1 pixels, got {width}x{height}")]
    EmptyCell { width: u32, height: u32 },
    #[error("grid of {grid:?} cells of {cell:?} pixels does not fit a layer")]
    TooLarge { grid: Size, cell: Size },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    coordinate: Point,
    content: Option<Drawable>,
}

impl Cell {
    pub fn coordinate(&self) -> Point {
        self.coordinate
    }

    pub fn content(&self) -> Option<&Drawable> {
        self.content.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }
}

/// A layer divided into equal cells, repainted lazily.
///
/// Cell updates only mark the cell dirty; pixels change on the next
/// [`render`](GridLayer::render), which repaints exactly the dirty cells in
/// the order they were marked. A freshly built or re-attached layer paints
/// every cell once.
#[derive(Debug, Clone)]
pub struct GridLayer {
    layer: Layer,
    grid_size: Size,
    cell_size: Size,
    cells: Vec<Cell>,
    dirty_indices: Vec<usize>,
    needs_full_render: bool,
}

impl GridLayer {
    pub fn new(grid_size: Size, cell_size: Size) -> Result<Self, GridError> {
        if grid_size.is_empty() {
            return Err(GridError::EmptyGrid {
                width: grid_size.width,
                height: grid_size.height,
            });
        }
        if cell_size.is_empty() {
            return Err(GridError::EmptyCell {
                width: cell_size.width,
                height: cell_size.height,
            });
        }
        let pixel_size = grid_size
            .width
            .checked_mul(cell_size.width)
            .zip(grid_size.height.checked_mul(cell_size.height))
            .filter(|(w, h)| *w <= i32::MAX as u32 && *h <= i32::MAX as u32)
            .map(|(w, h)| Size::new(w, h))
            .ok_or(GridError::TooLarge {
                grid: grid_size,
                cell: cell_size,
            })?;

        let cells = (0..grid_size.area())
            .filter_map(|index| grid_size.coordinate_of(index))
            .map(|coordinate| Cell {
                coordinate,
                content: None,
            })
            .collect();

        Ok(Self {
            layer: Layer::new(pixel_size),
            grid_size,
            cell_size,
            cells,
            dirty_indices: Vec::new(),
            needs_full_render: true,
        })
    }

    pub fn grid_size(&self) -> Size {
        self.grid_size
    }

    pub fn cell_size(&self) -> Size {
        self.cell_size
    }

    pub fn pixel_size(&self) -> Size {
        self.layer.size()
    }

    /// Sets a cell's content and marks it dirty. Returns `false` (and changes
    /// nothing) when `coordinate` is outside the grid.
    pub fn update_cell(&mut self, coordinate: Point, content: impl Into<Option<Drawable>>) -> bool {
        let Some(index) = self.grid_size.index_of(coordinate) else {
            debug!(
                x = coordinate.x,
                y = coordinate.y,
                "grid_update_out_of_range_ignored"
            );
            return false;
        };
        self.cells[index].content = content.into();
        if self.needs_full_render {
            return true;
        }
        self.dirty_indices.push(index);
        // A detached layer keeps collecting updates; past one entry per
        // cell a full repaint is cheaper than replaying the queue.
        if self.dirty_indices.len() > self.cells.len() {
            self.dirty_indices.clear();
            self.needs_full_render = true;
        }
        true
    }

    pub fn clear_cell(&mut self, coordinate: Point) -> bool {
        self.update_cell(coordinate, None)
    }

    pub fn get_cell(&self, coordinate: Point) -> Option<&Cell> {
        self.grid_size
            .index_of(coordinate)
            .map(|index| &self.cells[index])
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Sets every cell to `content`; the next render repaints everything.
    pub fn fill(&mut self, content: impl Into<Option<Drawable>>) {
        let content = content.into();
        for cell in &mut self.cells {
            cell.content = content.clone();
        }
        self.dirty_indices.clear();
        self.needs_full_render = true;
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty_indices.len()
    }

    pub fn needs_full_render(&self) -> bool {
        self.needs_full_render
    }

    /// Repaints dirty cells (or all cells after an invalidation) and clears
    /// the dirty list. Returns the number of cell repaints performed.
    pub fn render(&mut self) -> usize {
        if self.needs_full_render {
            return self.render_all();
        }
        let dirty = std::mem::take(&mut self.dirty_indices);
        for &index in &dirty {
            self.paint_cell(index);
        }
        let repainted = dirty.len();
        // Hand the allocation back for the next frame.
        self.dirty_indices = dirty;
        self.dirty_indices.clear();
        repainted
    }

    pub fn render_all(&mut self) -> usize {
        for index in 0..self.cells.len() {
            self.paint_cell(index);
        }
        self.dirty_indices.clear();
        self.needs_full_render = false;
        self.cells.len()
    }

    pub fn cell_rect(&self, coordinate: Point) -> Rect {
        Rect::new(
            coordinate.x * self.cell_size.width as i32,
            coordinate.y * self.cell_size.height as i32,
            self.cell_size.width,
            self.cell_size.height,
        )
    }

    fn paint_cell(&mut self, index: usize) {
        let cell = &self.cells[index];
        let rect = self.cell_rect(cell.coordinate);
        self.layer.clear_rect(rect);
        if let Some(content) = &cell.content {
            let image = content.current_frame().image();
            self.layer.blit(image, rect.origin());
        }
    }
}

impl Composite for GridLayer {
    fn layer(&self) -> &Layer {
        &self.layer
    }

    fn layer_mut(&mut self) -> &mut Layer {
        &mut self.layer
    }

    fn refresh(&mut self) {
        GridLayer::render(self);
    }

    fn invalidate(&mut self) {
        self.needs_full_render = true;
    }
}
