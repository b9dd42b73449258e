use std::collections::HashSet;
use std::path::{Path, PathBuf};

use image::ImageReader;
use thiserror::Error;
use tracing::warn;

use super::keys::{validate_asset_key, AssetKeyError};
use crate::compositor::{Image, Rgba};
use crate::geometry::{Point, Rect, Size};

pub const PLACEHOLDER_COLOR: Rgba = [220, 60, 200, 255];

#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("image key `{key}` is invalid: {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: AssetKeyError,
    },
    #[error("failed to open image {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("decoded image {path} has an inconsistent pixel buffer")]
    Malformed { path: PathBuf },
}

pub fn resolve_image_path(root: &Path, key: &str) -> Result<PathBuf, ImageLoadError> {
    validate_asset_key(key).map_err(|source| ImageLoadError::InvalidKey {
        key: key.to_string(),
        source,
    })?;
    Ok(root.join(format!("{key}.png")))
}

pub fn load_png(path: &Path) -> Result<Image, ImageLoadError> {
    let reader = ImageReader::open(path).map_err(|source| ImageLoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = reader.decode().map_err(|source| ImageLoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let rgba = decoded.to_rgba8();
    let size = Size::new(rgba.width(), rgba.height());
    Image::from_rgba(size, rgba.into_raw()).ok_or_else(|| ImageLoadError::Malformed {
        path: path.to_path_buf(),
    })
}

/// Cuts the `size` tile at pixel `origin` out of a tileset and upscales it.
/// `None` when the tile lies entirely outside the sheet.
pub fn crop_tile(sheet: &Image, origin: Point, size: Size, scale: u32) -> Option<Image> {
    sheet
        .sub_image(Rect::new(origin.x, origin.y, size.width, size.height))
        .map(|tile| tile.scaled(scale))
}

/// Loads images by key under one asset root, substituting a solid
/// placeholder (and warning once per key) when a file is missing or broken.
#[derive(Debug)]
pub struct ImageLoader {
    root: PathBuf,
    placeholder: Rgba,
    warned_keys: HashSet<String>,
}

impl ImageLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            placeholder: PLACEHOLDER_COLOR,
            warned_keys: HashSet::new(),
        }
    }

    pub fn with_placeholder(mut self, color: Rgba) -> Self {
        self.placeholder = color;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load(&self, key: &str) -> Result<Image, ImageLoadError> {
        let path = resolve_image_path(&self.root, key)?;
        load_png(&path)
    }

    pub fn load_or_placeholder(&mut self, key: &str, fallback_size: Size) -> Image {
        match self.load(key) {
            Ok(image) => image,
            Err(error) => {
                self.warn_once(key, &error);
                Image::filled(fallback_size, self.placeholder)
            }
        }
    }

    fn warn_once(&mut self, key: &str, error: &ImageLoadError) {
        if !self.warned_keys.insert(key.to_string()) {
            return;
        }
        warn!(
            image_key = key,
            root = %self.root.display(),
            error = %error,
            "image_load_failed_using_placeholder"
        );
    }
}
