use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetKeyError {
    #[error("asset key must not be empty")]
    Empty,
    #[error("asset key must not start or end with '/'")]
    DanglingSlash,
    #[error("asset key must not contain '\\\\'")]
    Backslash,
    #[error("asset key must not contain '..'")]
    ParentTraversal,
    #[error("asset key must not contain empty segments ('//')")]
    EmptySegment,
    #[error("asset key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Keys name both registry entries and asset paths (`tilesets/grass` maps
/// to `<root>/tilesets/grass.png`), so they are restricted to a portable
/// lowercase subset.
pub fn validate_asset_key(key: &str) -> Result<(), AssetKeyError> {
    if key.is_empty() {
        return Err(AssetKeyError::Empty);
    }
    if key.starts_with('/') || key.ends_with('/') {
        return Err(AssetKeyError::DanglingSlash);
    }
    if key.contains('\\') {
        return Err(AssetKeyError::Backslash);
    }
    if key.contains("..") {
        return Err(AssetKeyError::ParentTraversal);
    }
    if key.contains("//") {
        return Err(AssetKeyError::EmptySegment);
    }
    if let Some(character) = key.chars().find(|ch| !is_key_char(*ch)) {
        return Err(AssetKeyError::InvalidCharacter { character });
    }
    Ok(())
}

fn is_key_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_tileset_and_tile_keys() {
        for key in ["grass", "grass_square/15", "tilled-dirt/3", "water/0"] {
            assert!(validate_asset_key(key).is_ok(), "key={key}");
        }
    }

    #[test]
    fn rejects_unsafe_or_non_portable_keys() {
        let cases = [
            ("", AssetKeyError::Empty),
            ("/abs", AssetKeyError::DanglingSlash),
            ("trailing/", AssetKeyError::DanglingSlash),
            (r"a\b", AssetKeyError::Backslash),
            ("a/../b", AssetKeyError::ParentTraversal),
            ("a//b", AssetKeyError::EmptySegment),
            ("Grass", AssetKeyError::InvalidCharacter { character: 'G' }),
            ("a.png", AssetKeyError::InvalidCharacter { character: '.' }),
        ];
        for (key, expected) in cases {
            assert_eq!(validate_asset_key(key), Err(expected), "key={key}");
        }
    }
}
