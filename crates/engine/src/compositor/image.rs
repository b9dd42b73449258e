use crate::geometry::{Point, Rect, Size};

pub type Rgba = [u8; 4];

pub const TRANSPARENT: Rgba = [0, 0, 0, 0];

/// Owned RGBA8 pixel buffer, row-major, straight alpha.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    size: Size,
    rgba: Vec<u8>,
}

impl Image {
    /// Fully transparent image.
    pub fn new(size: Size) -> Self {
        Self {
            size,
            rgba: vec![0; size.area() * 4],
        }
    }

    pub fn filled(size: Size, color: Rgba) -> Self {
        let mut image = Self::new(size);
        image.fill(color);
        image
    }

    /// Wraps raw RGBA bytes. Returns `None` when the length does not match.
    pub fn from_rgba(size: Size, rgba: Vec<u8>) -> Option<Self> {
        if rgba.len() != size.area() * 4 {
            return None;
        }
        Some(Self { size, rgba })
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.size)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.rgba
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.rgba
    }

    pub fn pixel(&self, at: Point) -> Option<Rgba> {
        let offset = self.size.index_of(at)? * 4;
        let mut color = TRANSPARENT;
        color.copy_from_slice(&self.rgba[offset..offset + 4]);
        Some(color)
    }

    /// Overwrites one pixel. Out-of-bounds writes are dropped.
    pub fn put_pixel(&mut self, at: Point, color: Rgba) {
        if let Some(index) = self.size.index_of(at) {
            let offset = index * 4;
            self.rgba[offset..offset + 4].copy_from_slice(&color);
        }
    }

    pub fn clear(&mut self) {
        self.rgba.fill(0);
    }

    pub fn fill(&mut self, color: Rgba) {
        for pixel in self.rgba.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    /// Overwrites (no blending) the part of `rect` inside the image.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let Some(clipped) = rect.intersection(self.bounds()) else {
            return;
        };
        let stride = self.size.width as usize * 4;
        for y in clipped.y..clipped.bottom() {
            let row = y as usize * stride;
            let start = row + clipped.x as usize * 4;
            let end = row + clipped.right() as usize * 4;
            for pixel in self.rgba[start..end].chunks_exact_mut(4) {
                pixel.copy_from_slice(&color);
            }
        }
    }

    /// Source-over composite of all of `source` with its top-left at `at`.
    pub fn blit(&mut self, source: &Image, at: Point) {
        self.blit_region(source, source.bounds(), at);
    }

    /// Source-over composite of `region` of `source` with its top-left at `at`.
    /// Both the source region and the destination are clipped.
    pub fn blit_region(&mut self, source: &Image, region: Rect, at: Point) {
        let Some(src) = region.intersection(source.bounds()) else {
            return;
        };
        // Shift the destination by however much of the region was clipped away.
        let dest = Rect::new(
            at.x + (src.x - region.x),
            at.y + (src.y - region.y),
            src.width,
            src.height,
        );
        let Some(visible) = dest.intersection(self.bounds()) else {
            return;
        };

        let src_stride = source.size.width as usize * 4;
        let dst_stride = self.size.width as usize * 4;
        let src_x0 = src.x + (visible.x - dest.x);
        let src_y0 = src.y + (visible.y - dest.y);

        for row in 0..visible.height as usize {
            let src_row = (src_y0 as usize + row) * src_stride + src_x0 as usize * 4;
            let dst_row = (visible.y as usize + row) * dst_stride + visible.x as usize * 4;
            let len = visible.width as usize * 4;
            let src_pixels = &source.rgba[src_row..src_row + len];
            let dst_pixels = &mut self.rgba[dst_row..dst_row + len];
            for (dst, src) in dst_pixels
                .chunks_exact_mut(4)
                .zip(src_pixels.chunks_exact(4))
            {
                blend_source_over(dst, src);
            }
        }
    }

    /// Copy of the part of `rect` inside the image, or `None` if they do not overlap.
    pub fn sub_image(&self, rect: Rect) -> Option<Image> {
        let clipped = rect.intersection(self.bounds())?;
        let mut out = Image::new(clipped.size());
        let src_stride = self.size.width as usize * 4;
        let dst_stride = clipped.width as usize * 4;
        for row in 0..clipped.height as usize {
            let src = (clipped.y as usize + row) * src_stride + clipped.x as usize * 4;
            let dst = row * dst_stride;
            let source = &self.rgba[src..src + dst_stride];
            out.rgba[dst..dst + dst_stride].copy_from_slice(source);
        }
        Some(out)
    }

    /// Nearest-neighbour integer upscale. A factor of 0 is treated as 1.
    pub fn scaled(&self, factor: u32) -> Image {
        let factor = factor.max(1);
        if factor == 1 {
            return self.clone();
        }
        let size = Size::new(self.size.width * factor, self.size.height * factor);
        let mut out = Image::new(size);
        for point in Rect::from_size(size).points() {
            let source = Point::new(point.x / factor as i32, point.y / factor as i32);
            if let Some(color) = self.pixel(source) {
                out.put_pixel(point, color);
            }
        }
        out
    }

    /// Multiplies every pixel's alpha by `alpha / 255`.
    pub fn apply_alpha(&mut self, alpha: u8) {
        for pixel in self.rgba.chunks_exact_mut(4) {
            pixel[3] = ((u16::from(pixel[3]) * u16::from(alpha) + 127) / 255) as u8;
        }
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image").field("size", &self.size).finish()
    }
}

fn blend_source_over(dst: &mut [u8], src: &[u8]) {
    let src_alpha = u32::from(src[3]);
    if src_alpha == 0 {
        return;
    }
    if src_alpha == 255 {
        dst.copy_from_slice(src);
        return;
    }

    let dst_alpha = u32::from(dst[3]);
    let inverse = 255 - src_alpha;
    // Both sides scaled by 255 to stay in integers.
    let out_alpha = src_alpha * 255 + dst_alpha * inverse;
    if out_alpha == 0 {
        dst.copy_from_slice(&TRANSPARENT);
        return;
    }
    for channel in 0..3 {
        let src_c = u32::from(src[channel]) * src_alpha * 255;
        let dst_c = u32::from(dst[channel]) * dst_alpha * inverse;
        dst[channel] = ((src_c + dst_c + out_alpha / 2) / out_alpha) as u8;
    }
    dst[3] = ((out_alpha + 127) / 255) as u8;
}
