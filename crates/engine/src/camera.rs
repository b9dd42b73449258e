use crate::geometry::{Point, Rect, Size, Vec2};

/// Viewport over a pixel-sized world.
///
/// The stored offset is free to wander past the world edges; every read
/// through [`viewport_rect`](Camera::viewport_rect) clamps it so the
/// viewport never shows space outside the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    viewport_size: Size,
    world_size: Size,
    offset: Vec2,
}

impl Camera {
    pub fn new(viewport_size: Size, world_size: Size) -> Self {
        Self {
            viewport_size,
            world_size,
            offset: Vec2::ZERO,
        }
    }

    pub fn viewport_size(&self) -> Size {
        self.viewport_size
    }

    pub fn world_size(&self) -> Size {
        self.world_size
    }

    pub fn set_world_size(&mut self, world_size: Size) {
        self.world_size = world_size;
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    /// Unclamped.
    pub fn move_by(&mut self, displacement: Vec2) {
        self.offset += displacement;
    }

    pub fn viewport_rect(&self) -> Rect {
        Rect::new(
            clamp_axis(
                self.offset.x,
                self.viewport_size.width,
                self.world_size.width,
            ),
            clamp_axis(
                self.offset.y,
                self.viewport_size.height,
                self.world_size.height,
            ),
            self.viewport_size.width,
            self.viewport_size.height,
        )
    }

    /// Midpoint between the raw offset and the far viewport corner, used
    /// as the follow target when steering the camera towards the player.
    pub fn virtual_center(&self) -> Vec2 {
        Vec2::new(
            (self.offset.x + self.viewport_size.width as f32) / 2.0,
            (self.offset.y + self.viewport_size.height as f32) / 2.0,
        )
    }

    /// Screen offset that centres a world smaller than the viewport.
    /// Zero on any axis where the world fills the viewport.
    pub fn letterbox_offset(&self) -> Point {
        Point::new(
            letterbox_axis(self.viewport_size.width, self.world_size.width),
            letterbox_axis(self.viewport_size.height, self.world_size.height),
        )
    }
}

fn clamp_axis(offset: f32, viewport: u32, world: u32) -> i32 {
    if world <= viewport || !offset.is_finite() {
        return 0;
    }
    let max = (world - viewport) as f32;
    offset.clamp(0.0, max) as i32
}

fn letterbox_axis(viewport: u32, world: u32) -> i32 {
    if world >= viewport {
        return 0;
    }
    ((viewport - world) / 2) as i32
}
