use std::path::{Component, Path};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("sprite key must not be empty")]
    Empty,
    #[error("asset path must not start with '/'")]
    LeadingSlash,
    #[error("asset path must not contain '\\\\'")]
    Backslash,
    #[error("asset path must not contain '..'")]
    ParentTraversal,
    #[error("sprite key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Atlas sprite names double as animation-state names (`run_left_3`), so
/// they are restricted to lowercase ascii, digits and underscores.
pub(crate) fn validate_sprite_name(name: &str) -> Result<(), SpriteKeyError> {
    if name.is_empty() {
        return Err(SpriteKeyError::Empty);
    }
    for ch in name.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
            continue;
        }
        return Err(SpriteKeyError::InvalidCharacter { character: ch });
    }
    Ok(())
}

/// Image keys are forward-slash paths relative to the assets directory.
pub(crate) fn validate_asset_path(key: &str) -> Result<(), SpriteKeyError> {
    if key.is_empty() {
        return Err(SpriteKeyError::Empty);
    }
    if key.starts_with('/') {
        return Err(SpriteKeyError::LeadingSlash);
    }
    if key.contains('\\') {
        return Err(SpriteKeyError::Backslash);
    }
    if key.split('/').any(|segment| segment == "..") {
        return Err(SpriteKeyError::ParentTraversal);
    }
    for ch in key.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '/' | '-' | '.') {
            continue;
        }
        return Err(SpriteKeyError::InvalidCharacter { character: ch });
    }
    Ok(())
}

/// Lexically resolves `relative` against `base_dir` and expresses the result
/// as an asset key under `assets_dir`. Returns `None` when the path escapes
/// the assets directory.
pub(crate) fn asset_key_for(assets_dir: &Path, base_dir: &Path, relative: &str) -> Option<String> {
    let base = base_dir.strip_prefix(assets_dir).ok()?;
    let mut segments = Vec::<String>::new();
    for component in base.components().chain(Path::new(relative).components()) {
        match component {
            Component::Normal(part) => segments.push(part.to_str()?.to_string()),
            Component::CurDir => {}
            Component::ParentDir => {
                segments.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}
