//! Layered compositing: RGBA images, plain layers, dirty-tracked grid
//! layers and the display that stacks them.

mod display;
mod drawable;
mod grid_layer;
mod image;
mod layer;

pub use display::Display;
pub use drawable::{Drawable, Tile, TileId};
pub use grid_layer::{Cell, GridError, GridLayer};
pub use image::{Image, Rgba, TRANSPARENT};
pub use layer::{Composite, Layer, LayerRef};
