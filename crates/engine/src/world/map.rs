use std::cell::RefCell;
use std::rc::Rc;

use crate::compositor::{GridError, GridLayer};
use crate::geometry::{Point, Size};

use super::BlockGrid;

pub type GridLayerRef = Rc<RefCell<GridLayer>>;

/// A world: named grid layers in paint order plus cells that block
/// movement without drawing anything.
#[derive(Debug)]
pub struct Map {
    key: String,
    grid_size: Size,
    cell_size: Size,
    layers: Vec<(String, GridLayerRef)>,
    invisible_blocks: Option<BlockGrid>,
}

impl Map {
    pub fn new(
        key: impl Into<String>,
        grid_size: Size,
        cell_size: Size,
        layer_names: &[&str],
    ) -> Result<Self, GridError> {
        let mut map = Self {
            key: key.into(),
            grid_size,
            cell_size,
            layers: Vec::with_capacity(layer_names.len()),
            invisible_blocks: None,
        };
        for name in layer_names {
            map.add_layer(name)?;
        }
        Ok(map)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn grid_size(&self) -> Size {
        self.grid_size
    }

    pub fn cell_size(&self) -> Size {
        self.cell_size
    }

    pub fn pixel_size(&self) -> Size {
        self.grid_size.scaled_by(self.cell_size)
    }

    /// Adds an empty layer on top, or returns the existing one of that name.
    pub fn add_layer(&mut self, name: &str) -> Result<GridLayerRef, GridError> {
        if let Some(existing) = self.layer(name) {
            return Ok(existing);
        }
        let layer = GridLayer::new(self.grid_size, self.cell_size)?;
        let layer = Rc::new(RefCell::new(layer));
        self.layers.push((name.to_string(), Rc::clone(&layer)));
        Ok(layer)
    }

    pub fn layer(&self, name: &str) -> Option<GridLayerRef> {
        self.layers
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, layer)| Rc::clone(layer))
    }

    /// Bottom to top.
    pub fn layers(&self) -> impl Iterator<Item = (&str, &GridLayerRef)> {
        self.layers
            .iter()
            .map(|(name, layer)| (name.as_str(), layer))
    }

    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|(name, _)| name.as_str())
    }

    pub fn invisible_blocks(&self) -> Option<&BlockGrid> {
        self.invisible_blocks.as_ref()
    }

    pub fn add_invisible_block(&mut self, coordinate: Point) -> bool {
        let grid_size = self.grid_size;
        self.invisible_blocks
            .get_or_insert_with(|| BlockGrid::new(grid_size))
            .block(coordinate)
    }

    pub fn set_invisible_blocks(&mut self, blocks: BlockGrid) {
        self.invisible_blocks = Some(blocks);
    }
}
