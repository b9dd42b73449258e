use std::cell::RefCell;
use std::rc::Rc;

use super::image::{Rgba, TRANSPARENT};
use super::Image;
use crate::geometry::{Point, Rect, Size};

/// A drawable surface composited onto a [`Display`](super::Display).
#[derive(Debug, Clone)]
pub struct Layer {
    buffer: Image,
    offset: Point,
    crop: Option<Rect>,
    hidden: bool,
}

impl Layer {
    pub fn new(size: Size) -> Self {
        Self {
            buffer: Image::new(size),
            offset: Point::ORIGIN,
            crop: None,
            hidden: false,
        }
    }

    pub fn size(&self) -> Size {
        self.buffer.size()
    }

    pub fn image(&self) -> &Image {
        &self.buffer
    }

    pub fn blit(&mut self, image: &Image, at: Point) {
        self.buffer.blit(image, at);
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn fill(&mut self, color: Rgba) {
        self.buffer.fill(color);
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.buffer.fill_rect(rect, color);
    }

    pub fn clear_rect(&mut self, rect: Rect) {
        self.buffer.fill_rect(rect, TRANSPARENT);
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    /// Where the layer's top-left lands on the display.
    pub fn set_offset(&mut self, offset: Point) {
        self.offset = offset;
    }

    pub fn crop(&self) -> Option<Rect> {
        self.crop
    }

    /// Restricts which part of the buffer is drawn; `None` draws all of it.
    pub fn set_crop(&mut self, crop: Option<Rect>) {
        self.crop = crop;
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn show(&mut self) {
        self.hidden = false;
    }

    pub fn hide(&mut self) {
        self.hidden = true;
    }

    /// Draws the (cropped) buffer onto `target` at the layer offset.
    pub fn draw_onto(&self, target: &mut Image) {
        if self.hidden {
            return;
        }
        let region = self.crop.unwrap_or_else(|| self.buffer.bounds());
        target.blit_region(&self.buffer, region, self.offset);
    }
}

/// Anything the display can stack.
///
/// `refresh` is the render hook: it runs right before the layer is drawn,
/// letting a layer bring its buffer up to date lazily.
pub trait Composite {
    fn layer(&self) -> &Layer;

    fn layer_mut(&mut self) -> &mut Layer;

    fn refresh(&mut self) {}

    /// Called when the layer is (re)attached to a display.
    fn invalidate(&mut self) {}

    fn display(&mut self, onto: &mut Image) {
        if self.layer().is_hidden() {
            return;
        }
        self.refresh();
        self.layer().draw_onto(onto);
    }
}

impl Composite for Layer {
    fn layer(&self) -> &Layer {
        self
    }

    fn layer_mut(&mut self) -> &mut Layer {
        self
    }
}

pub type LayerRef = Rc<RefCell<dyn Composite>>;

#[cfg(test)]
mod tests {
    use super::*;

    const GREEN: Rgba = [0, 200, 0, 255];

    #[test]
    fn draw_onto_honours_offset() {
        let mut layer = Layer::new(Size::new(2, 2));
        layer.fill(GREEN);
        layer.set_offset(Point::new(3, 1));
        let mut target = Image::new(Size::new(6, 4));

        layer.draw_onto(&mut target);

        assert_eq!(target.pixel(Point::new(3, 1)), Some(GREEN));
        assert_eq!(target.pixel(Point::new(4, 2)), Some(GREEN));
        assert_eq!(target.pixel(Point::new(2, 1)), Some(TRANSPARENT));
    }

    #[test]
    fn crop_selects_region_drawn_at_offset() {
        let mut layer = Layer::new(Size::new(8, 8));
        layer.fill_rect(Rect::new(4, 4, 1, 1), GREEN);
        layer.set_crop(Some(Rect::new(4, 4, 2, 2)));
        let mut target = Image::new(Size::new(2, 2));

        layer.draw_onto(&mut target);

        assert_eq!(target.pixel(Point::new(0, 0)), Some(GREEN));
        assert_eq!(target.pixel(Point::new(1, 1)), Some(TRANSPARENT));
    }

    #[test]
    fn hidden_layer_draws_nothing() {
        let mut layer = Layer::new(Size::new(1, 1));
        layer.fill(GREEN);
        layer.hide();
        let mut target = Image::new(Size::new(1, 1));

        Composite::display(&mut layer, &mut target);

        assert_eq!(target.pixel(Point::ORIGIN), Some(TRANSPARENT));
    }

    #[test]
    fn clear_resets_to_transparent() {
        let mut layer = Layer::new(Size::new(2, 1));
        layer.fill(GREEN);
        layer.clear();
        assert_eq!(layer.image().pixel(Point::new(1, 0)), Some(TRANSPARENT));
    }
}
