mod images;
mod keys;
mod registry;

pub use images::{
    crop_tile, load_png, resolve_image_path, ImageLoadError, ImageLoader, PLACEHOLDER_COLOR,
};
pub use keys::{validate_asset_key, AssetKeyError};
pub use registry::{RegistryError, Tag, TagLookup, TileRegistry};
