use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture, TextureError};
use tracing::warn;
use winit::window::Window;

use crate::compositor::Image;
use crate::geometry::Size;

/// Presents composited frames in a window. The pixel buffer stays at the
/// display size and `pixels` scales it onto the window surface.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    buffer_size: Size,
    size_mismatch_warned: bool,
}

impl Renderer {
    pub fn new(window: Arc<Window>, buffer_size: Size) -> Result<Self, Error> {
        let surface = window.inner_size();
        let pixels = Self::build_pixels(
            Arc::clone(&window),
            buffer_size,
            surface.width,
            surface.height,
        )?;
        Ok(Self {
            window,
            pixels,
            buffer_size,
            size_mismatch_warned: false,
        })
    }

    pub fn buffer_size(&self) -> Size {
        self.buffer_size
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), TextureError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels.resize_surface(width, height)
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Copies `frame` into the pixel buffer and presents it. A frame whose
    /// size differs from the buffer is skipped with a one-time warning.
    pub fn present(&mut self, frame: &Image) -> Result<(), Error> {
        if frame.size() != self.buffer_size {
            if !self.size_mismatch_warned {
                self.size_mismatch_warned = true;
                warn!(
                    frame_width = frame.width(),
                    frame_height = frame.height(),
                    buffer_width = self.buffer_size.width,
                    buffer_height = self.buffer_size.height,
                    "renderer_frame_size_mismatch"
                );
            }
        } else {
            copy_frame(self.pixels.frame_mut(), frame);
        }
        self.pixels.render()
    }

    fn build_pixels(
        window: Arc<Window>,
        buffer_size: Size,
        surface_width: u32,
        surface_height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(surface_width, surface_height, window);
        Pixels::new(buffer_size.width, buffer_size.height, surface)
    }
}

fn copy_frame(target: &mut [u8], frame: &Image) -> bool {
    let source = frame.as_bytes();
    if target.len() != source.len() {
        return false;
    }
    target.copy_from_slice(source);
    true
}
