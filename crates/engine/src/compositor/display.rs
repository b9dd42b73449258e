use std::rc::Rc;

use tracing::{debug, warn};

use super::image::Rgba;
use super::{Image, LayerRef};
use crate::geometry::Size;

/// Ordered, named stack of layers composited into one output frame.
///
/// Index 0 is painted first (bottom). Names are unique: attaching a layer
/// under a name already in the stack moves that entry.
pub struct Display {
    background: Rgba,
    layers: Vec<(String, LayerRef)>,
    output: Image,
}

impl Display {
    pub fn new(size: Size, background: Rgba) -> Self {
        Self {
            background,
            layers: Vec::new(),
            output: Image::filled(size, background),
        }
    }

    pub fn size(&self) -> Size {
        self.output.size()
    }

    pub fn background(&self) -> Rgba {
        self.background
    }

    pub fn set_background(&mut self, background: Rgba) {
        self.background = background;
    }

    /// Puts `layer` on top of the stack.
    pub fn append_layer(&mut self, name: impl Into<String>, layer: LayerRef) {
        let name = name.into();
        self.detach(&name);
        layer.borrow_mut().invalidate();
        debug!(layer = %name, position = self.layers.len(), "display_layer_appended");
        self.layers.push((name, layer));
    }

    /// Puts `layer` at the bottom of the stack.
    pub fn unshift_layer(&mut self, name: impl Into<String>, layer: LayerRef) {
        let name = name.into();
        self.detach(&name);
        layer.borrow_mut().invalidate();
        debug!(layer = %name, "display_layer_unshifted");
        self.layers.insert(0, (name, layer));
    }

    /// Replaces the layer stored under `name` in place, or appends it when
    /// the name is new. Returns the replaced layer.
    pub fn set_layer(&mut self, name: impl Into<String>, layer: LayerRef) -> Option<LayerRef> {
        let name = name.into();
        layer.borrow_mut().invalidate();
        match self.position(&name) {
            Some(index) => Some(std::mem::replace(&mut self.layers[index].1, layer)),
            None => {
                self.layers.push((name, layer));
                None
            }
        }
    }

    pub fn get_layer(&self, name: &str) -> Option<LayerRef> {
        self.position(name)
            .map(|index| Rc::clone(&self.layers[index].1))
    }

    pub fn remove_layer(&mut self, name: &str) -> Option<LayerRef> {
        let removed = self.detach(name);
        if removed.is_some() {
            debug!(layer = name, "display_layer_removed");
        }
        removed
    }

    pub fn contains_layer(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Names bottom to top.
    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|(name, _)| name.as_str())
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Fills the background, then lets every layer draw itself bottom to top.
    pub fn render(&mut self) -> &Image {
        self.output.fill(self.background);
        for (name, layer) in &self.layers {
            let Ok(mut layer) = layer.try_borrow_mut() else {
                warn!(layer = %name, "display_layer_busy_skipped");
                continue;
            };
            layer.display(&mut self.output);
        }
        &self.output
    }

    /// The most recently rendered frame.
    pub fn frame(&self) -> &Image {
        &self.output
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.layers
            .iter()
            .position(|(existing, _)| existing == name)
    }

    fn detach(&mut self, name: &str) -> Option<LayerRef> {
        let index = self.position(name)?;
        Some(self.layers.remove(index).1)
    }
}

impl std::fmt::Debug for Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Display")
            .field("size", &self.size())
            .field("layers", &self.layer_names().collect::<Vec<_>>())
            .finish()
    }
}
