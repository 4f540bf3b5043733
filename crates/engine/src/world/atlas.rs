use std::collections::HashMap;

use crate::app::{DrawList, PixelRect};

/// Edge length of the placeholder box drawn for zero-sized targets.
pub const PLACEHOLDER_SIZE_PX: u32 = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteRegion {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SpriteRegion {
    pub fn source_rect(&self) -> PixelRect {
        PixelRect {
            x: self.x as i32,
            y: self.y as i32,
            width: self.width,
            height: self.height,
        }
    }
}

/// Named regions over a single sprite sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpriteAtlas {
    image: String,
    regions: HashMap<String, SpriteRegion>,
}

impl SpriteAtlas {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            regions: HashMap::new(),
        }
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    /// Registers a region, returning the one it replaced.
    pub fn insert(&mut self, region: SpriteRegion) -> Option<SpriteRegion> {
        self.regions.insert(region.name.clone(), region)
    }

    pub fn get(&self, name: &str) -> Option<&SpriteRegion> {
        self.regions.get(name)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Draws `name` with its bottom edge centred on the bottom edge of
    /// `target`. Unknown names become a labelled placeholder covering
    /// `target` so a missing sprite is visible without failing the frame.
    pub fn draw_sprite(&self, draw: &mut DrawList, name: &str, target: PixelRect) {
        let Some(region) = self.get(name) else {
            draw.placeholder(placeholder_rect(target), name);
            return;
        };
        let bottom = target.y + target.height as i32;
        let center_x = target.x + target.width as i32 / 2;
        let dst = PixelRect {
            x: center_x - region.width as i32 / 2,
            y: bottom - region.height as i32,
            width: region.width,
            height: region.height,
        };
        draw.blit(&self.image, region.source_rect(), dst);
    }
}

fn placeholder_rect(target: PixelRect) -> PixelRect {
    if target.width > 0 && target.height > 0 {
        return target;
    }
    PixelRect {
        x: target.x,
        y: target.y,
        width: PLACEHOLDER_SIZE_PX,
        height: PLACEHOLDER_SIZE_PX,
    }
}
