use std::rc::Rc;

use super::Image;

/// Content identity of a tile; the key for tag lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub u32);

/// A registered image plus its identity. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Tile {
    id: TileId,
    image: Rc<Image>,
}

impl Tile {
    pub fn new(id: TileId, image: Rc<Image>) -> Self {
        Self { id, image }
    }

    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn image(&self) -> &Image {
        &self.image
    }
}

impl PartialEq for Tile {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Tile {}

/// What a grid cell can hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drawable {
    Static(Tile),
    Animated {
        frames: Rc<[Tile]>,
        frame_index: usize,
    },
}

impl Drawable {
    /// Animated drawable starting at frame 0. `None` when `frames` is empty.
    pub fn animated(frames: Rc<[Tile]>) -> Option<Self> {
        if frames.is_empty() {
            return None;
        }
        Some(Drawable::Animated {
            frames,
            frame_index: 0,
        })
    }

    /// The same animation showing another frame (wrapping).
    pub fn with_frame(&self, index: usize) -> Self {
        match self {
            Drawable::Static(tile) => Drawable::Static(tile.clone()),
            Drawable::Animated { frames, .. } => Drawable::Animated {
                frames: Rc::clone(frames),
                frame_index: index % frames.len(),
            },
        }
    }

    pub fn current_frame(&self) -> &Tile {
        match self {
            Drawable::Static(tile) => tile,
            Drawable::Animated {
                frames,
                frame_index,
            } => &frames[*frame_index % frames.len()],
        }
    }

    pub fn frame_count(&self) -> usize {
        match self {
            Drawable::Static(_) => 1,
            Drawable::Animated { frames, .. } => frames.len(),
        }
    }

    /// Identity used for tag lookups.
    pub fn tile_id(&self) -> TileId {
        self.current_frame().id()
    }
}

impl From<Tile> for Drawable {
    fn from(tile: Tile) -> Self {
        Drawable::Static(tile)
    }
}
