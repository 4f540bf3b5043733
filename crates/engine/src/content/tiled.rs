//! Tiled map and tileset documents.
//!
//! Maps are read from Tiled's JSON export. Tilesets may be embedded in the
//! map or live in an external `.json`/`.tsj` or `.tsx` document; image paths
//! are resolved relative to whichever document names them.

use std::path::Path;

use roxmltree::{Document, Node};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::{parent_dir, parse_json, read_text, ContentError};
use crate::sprite_keys::{asset_key_for, validate_asset_path};
use crate::world::{sheet_offset, strip_flip_flags, TileMap, TileProperties, Tileset};

const TILE_LAYER_TYPE: &str = "tilelayer";
const COLLIDES_PROPERTY: &str = "collides";

#[derive(Debug, Clone, Deserialize)]
struct MapDocument {
    width: u32,
    height: u32,
    tilewidth: u32,
    tileheight: u32,
    #[serde(default)]
    layers: Vec<LayerDocument>,
    #[serde(default)]
    tilesets: Vec<TilesetReference>,
}

#[derive(Debug, Clone, Deserialize)]
struct LayerDocument {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    data: Option<Vec<u32>>,
}

#[derive(Debug, Clone, Deserialize)]
struct TilesetReference {
    firstgid: u32,
    #[serde(default)]
    source: Option<String>,
    #[serde(flatten)]
    embedded: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct TilesetDocument {
    image: String,
    imagewidth: u32,
    imageheight: u32,
    tilewidth: u32,
    tileheight: u32,
    columns: u32,
    #[serde(default)]
    tilecount: Option<u32>,
    #[serde(default)]
    margin: u32,
    #[serde(default)]
    spacing: u32,
    #[serde(default)]
    tiles: Vec<TileDocument>,
}

#[derive(Debug, Clone, Deserialize)]
struct TileDocument {
    id: u32,
    #[serde(default)]
    properties: Vec<PropertyDocument>,
}

#[derive(Debug, Clone, Deserialize)]
struct PropertyDocument {
    name: String,
    #[serde(default)]
    value: Value,
}

/// Tileset fields common to every document format, before gids are assigned.
#[derive(Debug, Clone)]
struct TilesetDescriptor {
    image: String,
    image_width: u32,
    image_height: u32,
    tile_width: u32,
    tile_height: u32,
    columns: u32,
    tile_count: Option<u32>,
    margin: u32,
    spacing: u32,
    /// `(local id, collides)` overrides.
    collides: Vec<(u32, bool)>,
}

/// Loads a map document and its tilesets. `base` supplies the decorative
/// tile ids; per-tile `collides` properties override it.
pub(crate) fn load_tile_map(
    assets_dir: &Path,
    path: &Path,
    base: &TileProperties,
) -> Result<TileMap, ContentError> {
    let raw = read_text(path)?;
    let document: MapDocument = parse_json(path, &raw)?;

    let mut grid = None;
    for layer in document.layers {
        if grid.is_none() && layer.kind == TILE_LAYER_TYPE {
            let data = layer.data.ok_or_else(|| ContentError::InvalidValue {
                path: path.to_path_buf(),
                message: format!(
                    "tile layer '{}' has no inline data array; export the map uncompressed",
                    layer.name
                ),
            })?;
            grid = Some(data);
        } else {
            debug!(layer = %layer.name, kind = %layer.kind, "tiled_layer_ignored");
        }
    }
    let grid = grid.ok_or_else(|| ContentError::InvalidValue {
        path: path.to_path_buf(),
        message: "map has no tile layer".to_string(),
    })?;
    let tiles = grid.into_iter().map(strip_flip_flags).collect::<Vec<_>>();

    let mut properties = base.clone();
    let mut tilesets = Vec::with_capacity(document.tilesets.len());
    for (index, reference) in document.tilesets.into_iter().enumerate() {
        let first_gid = reference.firstgid;
        let (descriptor, document_path) = match &reference.source {
            Some(source) => {
                let external = parent_dir(path).join(source);
                (read_external_tileset(&external)?, external)
            }
            None => (
                parse_embedded_tileset(path, index, reference.embedded)?,
                path.to_path_buf(),
            ),
        };
        for (local_id, collides) in &descriptor.collides {
            properties.set_collides(first_gid.saturating_add(*local_id), *collides);
        }
        tilesets.push(build_tileset(
            assets_dir,
            &document_path,
            first_gid,
            descriptor,
        )?);
    }

    let map = TileMap::new(
        document.width,
        document.height,
        document.tilewidth,
        document.tileheight,
        tiles,
        tilesets,
    )
    .map_err(|source| ContentError::Tilemap {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        path = %path.display(),
        columns = map.columns(),
        rows = map.rows(),
        tilesets = map.tilesets().len(),
        "tile_map_loaded"
    );
    Ok(map.with_properties(properties))
}

fn parse_embedded_tileset(
    map_path: &Path,
    index: usize,
    fields: Map<String, Value>,
) -> Result<TilesetDescriptor, ContentError> {
    let document = serde_path_to_error::deserialize::<_, TilesetDocument>(Value::Object(fields))
        .map_err(|error| {
            let field_path = format!("tilesets[{index}].{}", error.path());
            let source = error.into_inner();
            ContentError::Json {
                path: map_path.to_path_buf(),
                field_path,
                message: source.to_string(),
            }
        })?;
    descriptor_from_json(map_path, document)
}

fn read_external_tileset(path: &Path) -> Result<TilesetDescriptor, ContentError> {
    let raw = read_text(path)?;
    let is_xml = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("tsx"));
    if is_xml {
        parse_tsx(path, &raw)
    } else {
        let document: TilesetDocument = parse_json(path, &raw)?;
        descriptor_from_json(path, document)
    }
}

fn descriptor_from_json(
    path: &Path,
    document: TilesetDocument,
) -> Result<TilesetDescriptor, ContentError> {
    let mut collides = Vec::new();
    for tile in &document.tiles {
        for property in &tile.properties {
            if property.name != COLLIDES_PROPERTY {
                continue;
            }
            let value = property
                .value
                .as_bool()
                .ok_or_else(|| ContentError::InvalidValue {
                    path: path.to_path_buf(),
                    message: format!(
                        "tile {} property '{COLLIDES_PROPERTY}' must be a bool, got {}",
                        tile.id, property.value
                    ),
                })?;
            collides.push((tile.id, value));
        }
    }
    Ok(TilesetDescriptor {
        image: document.image,
        image_width: document.imagewidth,
        image_height: document.imageheight,
        tile_width: document.tilewidth,
        tile_height: document.tileheight,
        columns: document.columns,
        tile_count: document.tilecount,
        margin: document.margin,
        spacing: document.spacing,
        collides,
    })
}

fn parse_tsx(path: &Path, raw: &str) -> Result<TilesetDescriptor, ContentError> {
    let doc = Document::parse(raw).map_err(|error| ContentError::Xml {
        path: path.to_path_buf(),
        line: error.pos().row,
        column: error.pos().col,
        message: error.to_string(),
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "tileset" {
        return Err(error_at_node(
            path,
            &doc,
            root,
            format!("root element must be <tileset>, found <{}>", root.tag_name().name()),
        ));
    }

    let image = root
        .children()
        .find(|node| node.has_tag_name("image"))
        .ok_or_else(|| error_at_node(path, &doc, root, "<tileset> has no <image>".to_string()))?;

    let mut collides = Vec::new();
    for tile in root.children().filter(|node| node.has_tag_name("tile")) {
        let id = numeric_attribute(path, &doc, tile, "id")?;
        let properties = tile
            .descendants()
            .filter(|node| node.has_tag_name("property"));
        for property in properties {
            if property.attribute("name") != Some(COLLIDES_PROPERTY) {
                continue;
            }
            let value = property.attribute("value").unwrap_or_default();
            let value = value.parse::<bool>().map_err(|_| {
                error_at_node(
                    path,
                    &doc,
                    property,
                    format!("property '{COLLIDES_PROPERTY}' must be true or false, got '{value}'"),
                )
            })?;
            collides.push((id, value));
        }
    }

    Ok(TilesetDescriptor {
        image: required_attribute(path, &doc, image, "source")?.to_string(),
        image_width: numeric_attribute(path, &doc, image, "width")?,
        image_height: numeric_attribute(path, &doc, image, "height")?,
        tile_width: numeric_attribute(path, &doc, root, "tilewidth")?,
        tile_height: numeric_attribute(path, &doc, root, "tileheight")?,
        columns: numeric_attribute(path, &doc, root, "columns")?,
        tile_count: optional_numeric_attribute(path, &doc, root, "tilecount")?,
        margin: optional_numeric_attribute(path, &doc, root, "margin")?.unwrap_or(0),
        spacing: optional_numeric_attribute(path, &doc, root, "spacing")?.unwrap_or(0),
        collides,
    })
}

fn required_attribute<'a>(
    path: &Path,
    doc: &Document<'_>,
    node: Node<'a, '_>,
    name: &str,
) -> Result<&'a str, ContentError> {
    node.attribute(name).ok_or_else(|| {
        error_at_node(
            path,
            doc,
            node,
            format!("<{}> is missing attribute '{name}'", node.tag_name().name()),
        )
    })
}

fn numeric_attribute(
    path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
    name: &str,
) -> Result<u32, ContentError> {
    let value = required_attribute(path, doc, node, name)?;
    parse_u32(path, doc, node, name, value)
}

fn optional_numeric_attribute(
    path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
    name: &str,
) -> Result<Option<u32>, ContentError> {
    node.attribute(name)
        .map(|value| parse_u32(path, doc, node, name, value))
        .transpose()
}

fn parse_u32(
    path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
    name: &str,
    value: &str,
) -> Result<u32, ContentError> {
    value.trim().parse::<u32>().map_err(|_| {
        error_at_node(
            path,
            doc,
            node,
            format!("attribute '{name}' must be a non-negative integer, got '{value}'"),
        )
    })
}

fn error_at_node(path: &Path, doc: &Document<'_>, node: Node<'_, '_>, message: String) -> ContentError {
    let pos = doc.text_pos_at(node.range().start);
    ContentError::Xml {
        path: path.to_path_buf(),
        line: pos.row,
        column: pos.col,
        message,
    }
}

fn build_tileset(
    assets_dir: &Path,
    document_path: &Path,
    first_gid: u32,
    descriptor: TilesetDescriptor,
) -> Result<Tileset, ContentError> {
    let invalid = |message: String| ContentError::InvalidValue {
        path: document_path.to_path_buf(),
        message,
    };
    if descriptor.columns == 0 || descriptor.tile_width == 0 || descriptor.tile_height == 0 {
        return Err(invalid(format!(
            "tileset must have non-zero columns and tile size, got {} columns of {}x{}",
            descriptor.columns, descriptor.tile_width, descriptor.tile_height
        )));
    }

    let image = asset_key_for(assets_dir, parent_dir(document_path), &descriptor.image)
        .ok_or_else(|| {
            invalid(format!(
                "tileset image '{}' resolves outside the assets directory",
                descriptor.image
            ))
        })?;
    validate_asset_path(&image)
        .map_err(|error| invalid(format!("tileset image '{image}': {error}")))?;

    let (margin, spacing) = (descriptor.margin, descriptor.spacing);
    let overflow = || {
        invalid(format!(
            "tileset layout out of range: margin {margin}, spacing {spacing}, tiles {}x{}",
            descriptor.tile_width, descriptor.tile_height
        ))
    };
    let rows = match descriptor.tile_count {
        Some(count) => count.div_ceil(descriptor.columns),
        None => {
            let stride = descriptor
                .tile_height
                .checked_add(spacing)
                .ok_or_else(overflow)?;
            let margins = margin.checked_mul(2).ok_or_else(overflow)?;
            let usable = descriptor
                .image_height
                .saturating_sub(margins)
                .checked_add(spacing)
                .ok_or_else(overflow)?;
            usable / stride
        }
    };
    // Far edge of the sheet; every tile's source rect then fits in i32.
    if sheet_offset(margin, descriptor.columns, descriptor.tile_width, spacing).is_none()
        || sheet_offset(margin, rows, descriptor.tile_height, spacing).is_none()
    {
        return Err(overflow());
    }

    Ok(Tileset {
        first_gid,
        image,
        image_width: descriptor.image_width,
        image_height: descriptor.image_height,
        tile_width: descriptor.tile_width,
        tile_height: descriptor.tile_height,
        columns: descriptor.columns,
        rows,
        margin: descriptor.margin,
        spacing: descriptor.spacing,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::app::PixelRect;
    use crate::content::test_support::{write, MAP_JSON, TILESET_JSON};
    use crate::world::TilemapError;

    fn load(root: &Path, relative: &str) -> Result<TileMap, ContentError> {
        load_tile_map(root, &root.join(relative), &TileProperties::default())
    }

    #[test]
    fn loads_map_with_external_json_tileset() {
        let temp = TempDir::new().expect("temp");
        write(temp.path(), "maps/terrain.json", TILESET_JSON);
        write(temp.path(), "maps/level.json", MAP_JSON);

        let map = load(temp.path(), "maps/level.json").expect("map");
        assert_eq!((map.columns(), map.rows()), (3, 2));
        assert_eq!(map.tile_at(1, 0), Some(46));
        assert!(!map.properties().is_solid(46));
        assert!(map.is_solid_at(70.0, 40.0));

        let tileset = map.tileset_for(2).expect("tileset");
        assert_eq!(tileset.image, "maps/tiles.png");
        assert_eq!(tileset.rows, 1);
        assert_eq!(
            tileset.source_rect(2),
            Some(PixelRect::new(32, 0, 32, 32))
        );
    }

    #[test]
    fn embedded_tileset_with_collides_property_overrides_default() {
        let temp = TempDir::new().expect("temp");
        write(
            temp.path(),
            "level.json",
            r#"{
                "width": 2, "height": 1, "tilewidth": 16, "tileheight": 16,
                "layers": [ { "type": "tilelayer", "name": "g", "data": [1, 2] } ],
                "tilesets": [ {
                    "firstgid": 1, "image": "art/t.png", "imagewidth": 32, "imageheight": 16,
                    "tilewidth": 16, "tileheight": 16, "columns": 2,
                    "tiles": [ { "id": 1, "properties": [ { "name": "collides", "type": "bool", "value": false } ] } ]
                } ]
            }"#,
        );

        let map = load(temp.path(), "level.json").expect("map");
        assert!(map.is_solid_at(4.0, 4.0));
        assert!(!map.is_solid_at(20.0, 4.0));
        assert_eq!(map.tilesets()[0].image, "art/t.png");
    }

    #[test]
    fn flip_flags_are_masked_off() {
        let temp = TempDir::new().expect("temp");
        write(temp.path(), "terrain.json", TILESET_JSON);
        write(
            temp.path(),
            "level.json",
            r#"{
                "width": 1, "height": 1, "tilewidth": 32, "tileheight": 32,
                "layers": [ { "type": "tilelayer", "name": "g", "data": [2147483649] } ],
                "tilesets": [ { "firstgid": 1, "source": "terrain.json" } ]
            }"#,
        );

        let map = load(temp.path(), "level.json").expect("map");
        assert_eq!(map.tile_at(0, 0), Some(1));
    }

    #[test]
    fn loads_tsx_tileset_with_properties() {
        let temp = TempDir::new().expect("temp");
        write(
            temp.path(),
            "maps/terrain.tsx",
            r#"<?xml version="1.0" encoding="UTF-8"?>
<tileset version="1.10" name="terrain" tilewidth="32" tileheight="32" tilecount="4" columns="2">
 <image source="../art/terrain.png" width="64" height="64"/>
 <tile id="3">
  <properties>
   <property name="collides" type="bool" value="false"/>
  </properties>
 </tile>
</tileset>"#,
        );
        write(
            temp.path(),
            "maps/level.json",
            r#"{
                "width": 2, "height": 1, "tilewidth": 32, "tileheight": 32,
                "layers": [ { "type": "tilelayer", "name": "g", "data": [1, 4] } ],
                "tilesets": [ { "firstgid": 1, "source": "terrain.tsx" } ]
            }"#,
        );

        let map = load(temp.path(), "maps/level.json").expect("map");
        assert_eq!(map.tilesets()[0].image, "art/terrain.png");
        assert_eq!(map.tilesets()[0].rows, 2);
        assert!(map.is_solid_at(10.0, 10.0));
        assert!(!map.is_solid_at(40.0, 10.0));
    }

    #[test]
    fn malformed_tsx_reports_line_and_column() {
        let temp = TempDir::new().expect("temp");
        write(temp.path(), "terrain.tsx", "<tileset tilewidth=\"32\">\n  <image source=\"a.png\"\n</tileset>");
        write(
            temp.path(),
            "level.json",
            r#"{
                "width": 1, "height": 1, "tilewidth": 32, "tileheight": 32,
                "layers": [ { "type": "tilelayer", "name": "g", "data": [1] } ],
                "tilesets": [ { "firstgid": 1, "source": "terrain.tsx" } ]
            }"#,
        );

        let error = load(temp.path(), "level.json").expect_err("malformed xml");
        match error {
            ContentError::Xml { line, .. } => assert!(line >= 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn tsx_missing_attribute_is_located() {
        let temp = TempDir::new().expect("temp");
        write(
            temp.path(),
            "terrain.tsx",
            "<tileset tilewidth=\"32\" tileheight=\"32\">\n <image source=\"a.png\" width=\"32\" height=\"32\"/>\n</tileset>",
        );
        write(
            temp.path(),
            "level.json",
            r#"{
                "width": 1, "height": 1, "tilewidth": 32, "tileheight": 32,
                "layers": [ { "type": "tilelayer", "name": "g", "data": [1] } ],
                "tilesets": [ { "firstgid": 1, "source": "terrain.tsx" } ]
            }"#,
        );

        let error = load(temp.path(), "level.json").expect_err("missing columns");
        match error {
            ContentError::Xml { line, message, .. } => {
                assert_eq!(line, 1);
                assert!(message.contains("columns"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn grid_size_mismatch_is_a_tilemap_error() {
        let temp = TempDir::new().expect("temp");
        write(
            temp.path(),
            "level.json",
            r#"{
                "width": 3, "height": 2, "tilewidth": 32, "tileheight": 32,
                "layers": [ { "type": "tilelayer", "name": "g", "data": [1, 1] } ],
                "tilesets": []
            }"#,
        );

        let error = load(temp.path(), "level.json").expect_err("short grid");
        assert!(matches!(error, ContentError::Tilemap { .. }));
    }

    #[test]
    fn oversized_map_fails_to_load() {
        let temp = TempDir::new().expect("temp");
        write(
            temp.path(),
            "level.json",
            r#"{
                "width": 2, "height": 1, "tilewidth": 3000000000, "tileheight": 16,
                "layers": [ { "type": "tilelayer", "name": "g", "data": [1, 1] } ],
                "tilesets": []
            }"#,
        );

        let error = load(temp.path(), "level.json").expect_err("oversized map");
        assert!(matches!(
            error,
            ContentError::Tilemap {
                source: TilemapError::MapTooLarge { .. },
                ..
            }
        ));
    }

    #[test]
    fn tileset_with_overflowing_layout_is_rejected() {
        let temp = TempDir::new().expect("temp");
        write(
            temp.path(),
            "level.json",
            r#"{
                "width": 1, "height": 1, "tilewidth": 16, "tileheight": 16,
                "layers": [ { "type": "tilelayer", "name": "g", "data": [1] } ],
                "tilesets": [ {
                    "firstgid": 1, "image": "t.png", "imagewidth": 32, "imageheight": 32,
                    "tilewidth": 16, "tileheight": 16, "columns": 2,
                    "margin": 3000000000, "spacing": 4294967295
                } ]
            }"#,
        );

        let error = load(temp.path(), "level.json").expect_err("overflowing layout");
        match error {
            ContentError::InvalidValue { message, .. } => {
                assert!(message.contains("layout out of range"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn map_without_tile_layer_is_rejected() {
        let temp = TempDir::new().expect("temp");
        write(
            temp.path(),
            "level.json",
            r#"{ "width": 1, "height": 1, "tilewidth": 32, "tileheight": 32, "layers": [] }"#,
        );

        let error = load(temp.path(), "level.json").expect_err("no layer");
        assert!(matches!(error, ContentError::InvalidValue { .. }));
    }
}
