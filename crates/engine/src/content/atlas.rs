use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use super::{parent_dir, read_json, ContentError};
use crate::sprite_keys::{asset_key_for, validate_asset_path, validate_sprite_name};
use crate::world::{SpriteAtlas, SpriteRegion};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct AtlasDocument {
    image: String,
    #[serde(default)]
    sprites: Vec<SpriteEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpriteEntry {
    name: String,
    x: u32,
    y: u32,
    #[serde(alias = "w")]
    width: u32,
    #[serde(alias = "h")]
    height: u32,
}

/// Reads a sprite atlas. The image path is resolved against the atlas
/// document and stored as an assets-relative key.
pub(crate) fn load_atlas(assets_dir: &Path, path: &Path) -> Result<SpriteAtlas, ContentError> {
    let document: AtlasDocument = read_json(path)?;
    let invalid = |message: String| ContentError::InvalidValue {
        path: path.to_path_buf(),
        message,
    };

    let image = asset_key_for(assets_dir, parent_dir(path), &document.image).ok_or_else(|| {
        invalid(format!(
            "atlas image '{}' resolves outside the assets directory",
            document.image
        ))
    })?;
    validate_asset_path(&image)
        .map_err(|error| invalid(format!("atlas image '{image}': {error}")))?;

    let mut atlas = SpriteAtlas::new(image);
    for entry in document.sprites {
        validate_sprite_name(&entry.name)
            .map_err(|error| invalid(format!("sprite name '{}': {error}", entry.name)))?;
        if entry.width == 0 || entry.height == 0 {
            return Err(invalid(format!(
                "sprite '{}' has zero size {}x{}",
                entry.name, entry.width, entry.height
            )));
        }
        let replaced = atlas.insert(SpriteRegion {
            name: entry.name,
            x: entry.x,
            y: entry.y,
            width: entry.width,
            height: entry.height,
        });
        if let Some(previous) = replaced {
            warn!(
                sprite = %previous.name,
                path = %path.display(),
                "duplicate_sprite_name_last_wins"
            );
        }
    }
    Ok(atlas)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::content::test_support::{write, ATLAS_JSON};

    #[test]
    fn resolves_image_relative_to_document() {
        let temp = TempDir::new().expect("temp");
        write(temp.path(), "sprites/atlas.json", ATLAS_JSON);

        let atlas =
            load_atlas(temp.path(), &temp.path().join("sprites/atlas.json")).expect("atlas");
        assert_eq!(atlas.image(), "sprites/sprites.png");
        assert_eq!(atlas.len(), 2);
        let fire = atlas.get("fire").expect("fire region");
        assert_eq!((fire.x, fire.width, fire.height), (32, 16, 16));
    }

    #[test]
    fn duplicate_names_keep_the_last_entry() {
        let temp = TempDir::new().expect("temp");
        write(
            temp.path(),
            "atlas.json",
            r#"{ "image": "s.png", "sprites": [
                { "name": "fire", "x": 0, "y": 0, "w": 8, "h": 8 },
                { "name": "fire", "x": 16, "y": 0, "w": 8, "h": 8 }
            ] }"#,
        );

        let atlas = load_atlas(temp.path(), &temp.path().join("atlas.json")).expect("atlas");
        assert_eq!(atlas.len(), 1);
        assert_eq!(atlas.get("fire").map(|region| region.x), Some(16));
    }

    #[test]
    fn rejects_invalid_sprite_names() {
        let temp = TempDir::new().expect("temp");
        write(
            temp.path(),
            "atlas.json",
            r#"{ "image": "s.png", "sprites": [ { "name": "Run Left", "x": 0, "y": 0, "w": 8, "h": 8 } ] }"#,
        );

        let error = load_atlas(temp.path(), &temp.path().join("atlas.json")).expect_err("bad name");
        assert!(matches!(error, ContentError::InvalidValue { .. }));
    }

    #[test]
    fn rejects_image_outside_assets() {
        let temp = TempDir::new().expect("temp");
        write(temp.path(), "atlas.json", r#"{ "image": "../outside.png", "sprites": [] }"#);

        let error = load_atlas(temp.path(), &temp.path().join("atlas.json")).expect_err("escape");
        assert!(matches!(error, ContentError::InvalidValue { .. }));
    }
}
