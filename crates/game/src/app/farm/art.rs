//! Generated placeholder art, used for any tile without a PNG on disk.

use farmstead_engine::{Image, Point, Rect, Rgba, Size};

use super::character::Direction;

const GRASS: Rgba = [86, 152, 70, 255];
const GRASS_DARK: Rgba = [64, 122, 52, 255];
const DIRT: Rgba = [150, 108, 70, 255];
const DIRT_DARK: Rgba = [124, 86, 54, 255];
const PATH: Rgba = [196, 170, 120, 255];
const PATH_DARK: Rgba = [176, 150, 104, 255];
const WOOD: Rgba = [120, 78, 44, 255];
const WOOD_LIGHT: Rgba = [180, 140, 90, 255];
const WOOD_SEAM: Rgba = [150, 112, 70, 255];
const LEAVES: Rgba = [46, 110, 50, 255];
const LEAVES_LIGHT: Rgba = [70, 140, 64, 255];
const WATER: Rgba = [64, 120, 200, 255];
const WATER_LIGHT: Rgba = [140, 190, 240, 255];
const WALL: Rgba = [170, 140, 110, 255];
const MORTAR: Rgba = [140, 112, 86, 255];
const ROOF: Rgba = [150, 60, 50, 255];
const ROOF_EDGE: Rgba = [112, 42, 36, 255];
const DOORWAY: Rgba = [30, 20, 15, 255];
const BLANKET: Rgba = [70, 100, 190, 255];
const PILLOW: Rgba = [240, 240, 235, 255];
const SPROUT: Rgba = [100, 190, 80, 255];
const PUMPKIN: Rgba = [230, 130, 40, 255];
const SHIRT: Rgba = [60, 90, 160, 255];
const TROUSERS: Rgba = [60, 50, 40, 255];
const SKIN: Rgba = [240, 200, 160, 255];
const HAIR: Rgba = [90, 60, 30, 255];
const EYE: Rgba = [20, 20, 30, 255];

pub(crate) type Painter = fn(Size) -> Image;
pub(crate) type FramePainter = fn(Size, u32, u32) -> Image;

fn rect(size: Size, x: f32, y: f32, w: f32, h: f32) -> Rect {
    let sx = |v: f32| (v * size.width as f32).round() as i32;
    let sy = |v: f32| (v * size.height as f32).round() as i32;
    let width = (sx(x + w) - sx(x)).max(1) as u32;
    let height = (sy(y + h) - sy(y)).max(1) as u32;
    Rect::new(sx(x), sy(y), width, height)
}

fn speckled(size: Size, base: Rgba, speck: Rgba, modulus: u32, phase: u32) -> Image {
    let mut image = Image::filled(size, base);
    for point in image.bounds().points() {
        let hash = (point.x as u32).wrapping_mul(7) + (point.y as u32).wrapping_mul(13) + phase;
        if hash % modulus == 0 {
            image.put_pixel(point, speck);
        }
    }
    image
}

pub(crate) fn grass(size: Size) -> Image {
    speckled(size, GRASS, GRASS_DARK, 11, 0)
}

pub(crate) fn dirt(size: Size) -> Image {
    speckled(size, DIRT, DIRT_DARK, 9, 0)
}

pub(crate) fn tilled(size: Size) -> Image {
    let mut image = dirt(size);
    let step = (size.height / 4).max(2);
    for y in (step / 2..size.height).step_by(step as usize) {
        image.fill_rect(Rect::new(0, y as i32, size.width, 1), DIRT_DARK);
    }
    image
}

pub(crate) fn path(size: Size) -> Image {
    speckled(size, PATH, PATH_DARK, 5, 2)
}

pub(crate) fn fence(size: Size) -> Image {
    let mut image = Image::new(size);
    image.fill_rect(rect(size, 0.0, 0.3, 1.0, 0.12), WOOD);
    image.fill_rect(rect(size, 0.0, 0.62, 1.0, 0.12), WOOD);
    image.fill_rect(rect(size, 0.1, 0.1, 0.18, 0.85), WOOD);
    image.fill_rect(rect(size, 0.72, 0.1, 0.18, 0.85), WOOD);
    image
}

pub(crate) fn tree(size: Size) -> Image {
    let mut image = Image::new(size);
    image.fill_rect(rect(size, 0.4, 0.6, 0.2, 0.4), WOOD);
    image.fill_rect(rect(size, 0.1, 0.05, 0.8, 0.6), LEAVES);
    image.fill_rect(rect(size, 0.25, 0.15, 0.3, 0.2), LEAVES_LIGHT);
    image
}

pub(crate) fn water(size: Size, frame: u32, frames: u32) -> Image {
    let phase = frame * 8 / frames.max(1);
    speckled(size, WATER, WATER_LIGHT, 8, phase)
}

pub(crate) fn wall(size: Size) -> Image {
    let mut image = Image::filled(size, WALL);
    let course = (size.height / 4).max(2);
    for (row, y) in (0..size.height).step_by(course as usize).enumerate() {
        image.fill_rect(Rect::new(0, y as i32, size.width, 1), MORTAR);
        let shift = if row % 2 == 0 { 0 } else { size.width / 2 };
        for x in (shift..size.width).step_by((size.width / 2).max(1) as usize) {
            image.fill_rect(Rect::new(x as i32, y as i32, 1, course), MORTAR);
        }
    }
    image
}

pub(crate) fn roof(size: Size) -> Image {
    let mut image = Image::filled(size, ROOF);
    let step = (size.height / 3).max(2);
    for y in (step - 1..size.height).step_by(step as usize) {
        image.fill_rect(Rect::new(0, y as i32, size.width, 1), ROOF_EDGE);
    }
    image
}

pub(crate) fn wood_floor(size: Size) -> Image {
    let mut image = Image::filled(size, WOOD_LIGHT);
    let plank = (size.width / 4).max(2);
    for x in (0..size.width).step_by(plank as usize) {
        image.fill_rect(Rect::new(x as i32, 0, 1, size.height), WOOD_SEAM);
    }
    image
}

pub(crate) fn bed(size: Size) -> Image {
    let mut image = Image::new(size);
    image.fill_rect(rect(size, 0.05, 0.0, 0.9, 1.0), WOOD);
    image.fill_rect(rect(size, 0.12, 0.05, 0.76, 0.9), BLANKET);
    image.fill_rect(rect(size, 0.2, 0.08, 0.6, 0.25), PILLOW);
    image
}

pub(crate) fn table(size: Size) -> Image {
    let mut image = Image::new(size);
    image.fill_rect(rect(size, 0.0, 0.2, 1.0, 0.45), WOOD);
    image.fill_rect(rect(size, 0.08, 0.65, 0.12, 0.35), WOOD);
    image.fill_rect(rect(size, 0.8, 0.65, 0.12, 0.35), WOOD);
    image
}

/// Frame 0 is shut; the last frame is fully open.
pub(crate) fn door(size: Size, frame: u32, frames: u32) -> Image {
    let mut image = wall(size);
    let opening = rect(size, 0.15, 0.1, 0.7, 0.9);
    image.fill_rect(opening, DOORWAY);
    let open_fraction = frame as f32 / frames.saturating_sub(1).max(1) as f32;
    let panel_width = ((opening.width as f32) * (1.0 - open_fraction)).round() as u32;
    if panel_width > 0 {
        image.fill_rect(
            Rect::new(opening.x, opening.y, panel_width, opening.height),
            WOOD,
        );
    }
    image
}

pub(crate) fn sprout(size: Size) -> Image {
    let mut image = Image::new(size);
    image.fill_rect(rect(size, 0.45, 0.45, 0.1, 0.35), SPROUT);
    image.fill_rect(rect(size, 0.3, 0.4, 0.15, 0.1), SPROUT);
    image.fill_rect(rect(size, 0.55, 0.35, 0.15, 0.1), SPROUT);
    image
}

pub(crate) fn crop(size: Size) -> Image {
    let mut image = Image::new(size);
    image.fill_rect(rect(size, 0.45, 0.1, 0.1, 0.5), LEAVES);
    image.fill_rect(rect(size, 0.2, 0.5, 0.6, 0.4), PUMPKIN);
    image
}

/// Character sprite facing `facing`; `step` alternates the legs while
/// walking.
pub(crate) fn character(size: Size, facing: Direction, step: u32) -> Image {
    let mut image = Image::new(size);
    image.fill_rect(rect(size, 0.3, 0.05, 0.4, 0.3), SKIN);
    image.fill_rect(rect(size, 0.3, 0.05, 0.4, 0.1), HAIR);
    image.fill_rect(rect(size, 0.25, 0.35, 0.5, 0.35), SHIRT);

    let (left_leg, right_leg) = if step % 2 == 0 {
        (0.95, 0.95)
    } else {
        (0.85, 1.0)
    };
    image.fill_rect(rect(size, 0.3, 0.7, 0.15, left_leg - 0.7), TROUSERS);
    image.fill_rect(rect(size, 0.55, 0.7, 0.15, right_leg - 0.7), TROUSERS);

    let eye_y = 0.2;
    let eyes: &[f32] = match facing {
        Direction::Up => &[],
        Direction::Down => &[0.38, 0.56],
        Direction::Left => &[0.33],
        Direction::Right => &[0.6],
    };
    for &x in eyes {
        let eye = rect(size, x, eye_y, 0.07, 0.07);
        image.put_pixel(Point::new(eye.x, eye.y), EYE);
    }
    if facing == Direction::Up {
        image.fill_rect(rect(size, 0.3, 0.05, 0.4, 0.25), HAIR);
    }
    image
}
