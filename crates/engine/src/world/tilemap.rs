use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use crate::app::{DrawList, PixelRect};

pub const EMPTY_TILE: u32 = 0;
pub const DEFAULT_DECORATIVE_TILE_IDS: [u32; 3] = [46, 55, 56];

// Tiled stores flip/rotation flags in the top four bits of a global tile id.
const TILE_ID_MASK: u32 = 0x0FFF_FFFF;

// Screen and sheet coordinates are i32, so no pixel extent may exceed this.
pub const MAX_PIXEL_EXTENT: u32 = i32::MAX as u32;

pub fn strip_flip_flags(gid: u32) -> u32 {
    gid & TILE_ID_MASK
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tileset {
    pub first_gid: u32,
    pub image: String,
    pub image_width: u32,
    pub image_height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub columns: u32,
    pub rows: u32,
    pub margin: u32,
    pub spacing: u32,
}

impl Tileset {
    pub fn tile_count(&self) -> u32 {
        self.columns.saturating_mul(self.rows)
    }

    /// Sub-rectangle of the tileset image holding `gid`, or `None` when the id
    /// lies past the end of the sheet.
    pub fn source_rect(&self, gid: u32) -> Option<PixelRect> {
        let gid = strip_flip_flags(gid);
        let local = gid.checked_sub(self.first_gid)?;
        if self.columns == 0 || local >= self.tile_count() {
            return None;
        }
        let column = local % self.columns;
        let row = local / self.columns;
        Some(PixelRect {
            x: sheet_offset(self.margin, column, self.tile_width, self.spacing)?,
            y: sheet_offset(self.margin, row, self.tile_height, self.spacing)?,
            width: self.tile_width,
            height: self.tile_height,
        })
    }
}

/// `margin + index * (tile + spacing)`, or `None` if it leaves the i32 range.
pub fn sheet_offset(margin: u32, index: u32, tile: u32, spacing: u32) -> Option<i32> {
    let stride = tile.checked_add(spacing)?;
    let offset = index.checked_mul(stride)?.checked_add(margin)?;
    i32::try_from(offset).ok()
}

/// Solidity table. A tile blocks movement unless it is empty, listed as
/// decorative, or carries an explicit `collides = false` property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileProperties {
    decorative: BTreeSet<u32>,
    collides: HashMap<u32, bool>,
}

impl Default for TileProperties {
    fn default() -> Self {
        Self::with_decorative(DEFAULT_DECORATIVE_TILE_IDS)
    }
}

impl TileProperties {
    pub fn with_decorative(ids: impl IntoIterator<Item = u32>) -> Self {
        Self {
            decorative: ids.into_iter().map(strip_flip_flags).collect(),
            collides: HashMap::new(),
        }
    }

    pub fn set_collides(&mut self, gid: u32, collides: bool) {
        self.collides.insert(strip_flip_flags(gid), collides);
    }

    pub fn decorative_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.decorative.iter().copied()
    }

    pub fn is_solid(&self, gid: u32) -> bool {
        let gid = strip_flip_flags(gid);
        if gid == EMPTY_TILE {
            return false;
        }
        if let Some(collides) = self.collides.get(&gid) {
            return *collides;
        }
        !self.decorative.contains(&gid)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TilemapError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("tile size must be non-zero, got {width}x{height}")]
    ZeroTileSize { width: u32, height: u32 },
    #[error("map of {columns}x{rows} tiles at {tile_width}x{tile_height} px exceeds {max} px per axis")]
    MapTooLarge {
        columns: u32,
        rows: u32,
        tile_width: u32,
        tile_height: u32,
        max: u32,
    },
}

/// Pixel convention:
/// - pixel (0,0) is the top-left corner of tile (0,0), y grows downward.
/// - tile (col,row) covers `[col*tw, (col+1)*tw) x [row*th, (row+1)*th)`.
/// - anything outside the grid reads as [`EMPTY_TILE`].
#[derive(Debug, Clone, PartialEq)]
pub struct TileMap {
    columns: u32,
    rows: u32,
    tile_width: u32,
    tile_height: u32,
    pixel_size: (u32, u32),
    tiles: Vec<u32>,
    tilesets: Vec<Tileset>,
    properties: TileProperties,
    view: ViewRect,
}

impl TileMap {
    pub fn new(
        columns: u32,
        rows: u32,
        tile_width: u32,
        tile_height: u32,
        tiles: Vec<u32>,
        mut tilesets: Vec<Tileset>,
    ) -> Result<Self, TilemapError> {
        if tile_width == 0 || tile_height == 0 {
            return Err(TilemapError::ZeroTileSize {
                width: tile_width,
                height: tile_height,
            });
        }
        let extent = |count: u32, tile: u32| {
            count
                .checked_mul(tile)
                .filter(|pixels| *pixels <= MAX_PIXEL_EXTENT)
        };
        let (Some(pixel_width), Some(pixel_height)) =
            (extent(columns, tile_width), extent(rows, tile_height))
        else {
            return Err(TilemapError::MapTooLarge {
                columns,
                rows,
                tile_width,
                tile_height,
                max: MAX_PIXEL_EXTENT,
            });
        };
        let expected = columns as usize * rows as usize;
        let actual = tiles.len();
        if expected != actual {
            return Err(TilemapError::TileCountMismatch { expected, actual });
        }
        tilesets.sort_by_key(|tileset| tileset.first_gid);
        Ok(Self {
            columns,
            rows,
            tile_width,
            tile_height,
            pixel_size: (pixel_width, pixel_height),
            tiles,
            tilesets,
            properties: TileProperties::default(),
            view: ViewRect::default(),
        })
    }

    pub fn with_properties(mut self, properties: TileProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    pub fn pixel_width(&self) -> f32 {
        self.pixel_size.0 as f32
    }

    pub fn pixel_height(&self) -> f32 {
        self.pixel_size.1 as f32
    }

    pub fn tilesets(&self) -> &[Tileset] {
        &self.tilesets
    }

    pub fn properties(&self) -> &TileProperties {
        &self.properties
    }

    pub fn view(&self) -> ViewRect {
        self.view
    }

    pub fn tile_at(&self, column: u32, row: u32) -> Option<u32> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.tiles
            .get(row as usize * self.columns as usize + column as usize)
            .copied()
    }

    pub fn tile_id_at_pixel(&self, x: f32, y: f32) -> u32 {
        if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
            return EMPTY_TILE;
        }
        let column = (x / self.tile_width as f32).floor();
        let row = (y / self.tile_height as f32).floor();
        if column >= self.columns as f32 || row >= self.rows as f32 {
            return EMPTY_TILE;
        }
        self.tile_at(column as u32, row as u32)
            .map(strip_flip_flags)
            .unwrap_or(EMPTY_TILE)
    }

    pub fn is_solid_at(&self, x: f32, y: f32) -> bool {
        self.properties.is_solid(self.tile_id_at_pixel(x, y))
    }

    /// The tileset with the greatest `first_gid` not above `gid`.
    pub fn tileset_for(&self, gid: u32) -> Option<&Tileset> {
        let gid = strip_flip_flags(gid);
        if gid == EMPTY_TILE {
            return None;
        }
        self.tilesets
            .iter()
            .rev()
            .find(|tileset| tileset.first_gid <= gid)
    }

    pub fn tile_source_rect(&self, gid: u32) -> Option<(&Tileset, PixelRect)> {
        let tileset = self.tileset_for(gid)?;
        let rect = tileset.source_rect(gid)?;
        Some((tileset, rect))
    }

    pub fn set_view_size(&mut self, width: f32, height: f32) {
        self.view.width = width.max(0.0);
        self.view.height = height.max(0.0);
        self.view.x = clamp_view_axis(self.view.x, self.view.width, self.pixel_width());
        self.view.y = clamp_view_axis(self.view.y, self.view.height, self.pixel_height());
    }

    pub fn center_view_on(&mut self, x: f32, y: f32) {
        let target_x = x - self.view.width * 0.5;
        let target_y = y - self.view.height * 0.5;
        self.view.x = clamp_view_axis(target_x, self.view.width, self.pixel_width());
        self.view.y = clamp_view_axis(target_y, self.view.height, self.pixel_height());
    }

    /// Non-empty tiles intersecting the view as `(column, row, gid)`.
    pub fn visible_tiles(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        let tw = self.tile_width as f32;
        let th = self.tile_height as f32;
        let col_min = (self.view.x / tw).floor().max(0.0) as u32;
        let row_min = (self.view.y / th).floor().max(0.0) as u32;
        let col_end = (((self.view.x + self.view.width) / tw).ceil().max(0.0) as u32).min(self.columns);
        let row_end = (((self.view.y + self.view.height) / th).ceil().max(0.0) as u32).min(self.rows);

        (row_min..row_end).flat_map(move |row| {
            (col_min..col_end).filter_map(move |column| {
                let gid = self.tile_at(column, row)?;
                (strip_flip_flags(gid) != EMPTY_TILE).then_some((column, row, gid))
            })
        })
    }

    pub fn draw_tiles(&self, draw: &mut DrawList) {
        let view_x = self.view.x.round() as i32;
        let view_y = self.view.y.round() as i32;
        for (column, row, gid) in self.visible_tiles() {
            let Some((tileset, src)) = self.tile_source_rect(gid) else {
                continue;
            };
            // Bounded by the pixel extent checked in `new`.
            let dst = PixelRect {
                x: (column * self.tile_width) as i32 - view_x,
                y: (row * self.tile_height) as i32 - view_y,
                width: self.tile_width,
                height: self.tile_height,
            };
            draw.blit(&tileset.image, src, dst);
        }
    }
}

fn clamp_view_axis(start: f32, view_extent: f32, map_extent: f32) -> f32 {
    let max_start = (map_extent - view_extent).max(0.0);
    if !start.is_finite() {
        return 0.0;
    }
    start.clamp(0.0, max_start)
}
