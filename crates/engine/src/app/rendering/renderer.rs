use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture, TextureError};
use tracing::warn;
use winit::window::Window;

use crate::sprite_keys::validate_asset_path;

use super::draw_list::{DrawCommand, DrawList, PixelRect, Rgba};
use super::font::{glyph, GLYPH_ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH, LINE_ADVANCE};

const PLACEHOLDER_FILL: Rgba = [200, 40, 200, 255];
const PLACEHOLDER_BORDER: Rgba = [255, 255, 255, 255];
const PLACEHOLDER_LABEL: Rgba = [255, 255, 255, 255];

pub(crate) struct LoadedImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

/// Lazily decoded images keyed by asset path. Failed loads are cached as
/// `None` and warned about once.
pub(crate) struct ImageCache {
    assets_dir: PathBuf,
    images: HashMap<String, Option<LoadedImage>>,
    warned_keys: HashSet<String>,
}

impl ImageCache {
    pub(crate) fn new(assets_dir: PathBuf) -> Self {
        Self {
            assets_dir,
            images: HashMap::new(),
            warned_keys: HashSet::new(),
        }
    }

    pub(crate) fn get(&mut self, key: &str) -> Option<&LoadedImage> {
        if !self.images.contains_key(key) {
            let loaded = match load_image(&self.assets_dir, key) {
                Ok(image) => Some(image),
                Err(reason) => {
                    if self.warned_keys.insert(key.to_string()) {
                        warn!(image = key, reason = %reason, "renderer_image_load_failed");
                    }
                    None
                }
            };
            self.images.insert(key.to_string(), loaded);
        }
        self.images.get(key).and_then(Option::as_ref)
    }
}

fn load_image(assets_dir: &Path, key: &str) -> Result<LoadedImage, String> {
    validate_asset_path(key).map_err(|error| format!("invalid_key:{error}"))?;
    let path = assets_dir.join(key);
    let reader = ImageReader::open(&path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedImage {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

/// Executes draw lists into a `pixels` frame at the logical view size. The
/// surface scales that frame to the window.
pub struct Renderer {
    pixels: Pixels<'static>,
    width: u32,
    height: u32,
    images: ImageCache,
    warned_placeholders: HashSet<String>,
}

impl Renderer {
    pub fn new(
        window: Arc<Window>,
        width: u32,
        height: u32,
        assets_dir: PathBuf,
    ) -> Result<Self, Error> {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width.max(1), size.height.max(1), window);
        let pixels = Pixels::new(width.max(1), height.max(1), surface)?;
        Ok(Self {
            pixels,
            width: width.max(1),
            height: height.max(1),
            images: ImageCache::new(assets_dir),
            warned_placeholders: HashSet::new(),
        })
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn resize_surface(&mut self, width: u32, height: u32) -> Result<(), TextureError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels.resize_surface(width, height)
    }

    pub fn render(&mut self, draw: &DrawList) -> Result<(), Error> {
        let (width, height) = (self.width, self.height);
        let mut canvas = Canvas::new(self.pixels.frame_mut(), width, height);
        execute(&mut canvas, draw, &mut self.images, &mut self.warned_placeholders);
        self.pixels.render()
    }
}

pub(crate) fn execute(
    canvas: &mut Canvas<'_>,
    draw: &DrawList,
    images: &mut ImageCache,
    warned_placeholders: &mut HashSet<String>,
) {
    for command in draw.commands() {
        match command {
            DrawCommand::Clear(color) => canvas.clear(*color),
            DrawCommand::FillRect { rect, color } => canvas.fill_rect(*rect, *color),
            DrawCommand::Blit { image, src, dst } => match images.get(image) {
                Some(loaded) => canvas.blit(loaded, *src, *dst),
                None => canvas.placeholder(*dst, image),
            },
            DrawCommand::Text { x, y, text, color } => canvas.text(*x, *y, text, *color),
            DrawCommand::Placeholder { rect, label } => {
                if warned_placeholders.insert(label.clone()) {
                    warn!(sprite = label.as_str(), "renderer_sprite_missing_using_placeholder");
                }
                canvas.placeholder(*rect, label);
            }
        }
    }
}

/// Clipped RGBA8 drawing over a borrowed frame buffer.
pub(crate) struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub(crate) fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    fn clear(&mut self, color: Rgba) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    fn put_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        if let Some(pixel) = self.frame.get_mut(offset..offset + 4) {
            blend_into(pixel, color);
        }
    }

    fn fill_rect(&mut self, rect: PixelRect, color: Rgba) {
        let left = rect.x.max(0);
        let top = rect.y.max(0);
        let right = rect.right().min(self.width as i32);
        let bottom = rect.bottom().min(self.height as i32);
        for y in top..bottom {
            for x in left..right {
                self.put_pixel(x, y, color);
            }
        }
    }

    fn outline_rect(&mut self, rect: PixelRect, color: Rgba) {
        if rect.is_empty() {
            return;
        }
        let right = rect.right() - 1;
        let bottom = rect.bottom() - 1;
        for x in rect.x..=right {
            self.put_pixel(x, rect.y, color);
            self.put_pixel(x, bottom, color);
        }
        for y in rect.y..=bottom {
            self.put_pixel(rect.x, y, color);
            self.put_pixel(right, y, color);
        }
    }

    fn blit(&mut self, image: &LoadedImage, src: PixelRect, dst: PixelRect) {
        let expected_len = image.width as usize * image.height as usize * 4;
        if image.rgba.len() < expected_len {
            return;
        }
        let copy_width = src.width.min(dst.width) as i32;
        let copy_height = src.height.min(dst.height) as i32;
        for dy in 0..copy_height {
            let src_y = src.y + dy;
            if src_y < 0 || src_y >= image.height as i32 {
                continue;
            }
            for dx in 0..copy_width {
                let src_x = src.x + dx;
                if src_x < 0 || src_x >= image.width as i32 {
                    continue;
                }
                let offset = (src_y as usize * image.width as usize + src_x as usize) * 4;
                let color = [
                    image.rgba[offset],
                    image.rgba[offset + 1],
                    image.rgba[offset + 2],
                    image.rgba[offset + 3],
                ];
                self.put_pixel(dst.x + dx, dst.y + dy, color);
            }
        }
    }

    fn text(&mut self, x: i32, y: i32, text: &str, color: Rgba) {
        for (line_index, line) in text.lines().enumerate() {
            let line_y = y + (line_index as u32 * LINE_ADVANCE) as i32;
            for (char_index, ch) in line.chars().enumerate() {
                let glyph_x = x + (char_index as u32 * GLYPH_ADVANCE) as i32;
                let rows = glyph(ch);
                for (row, bits) in rows.iter().enumerate().take(GLYPH_HEIGHT as usize) {
                    for column in 0..GLYPH_WIDTH {
                        if bits & (1 << (GLYPH_WIDTH - 1 - column)) != 0 {
                            self.put_pixel(glyph_x + column as i32, line_y + row as i32, color);
                        }
                    }
                }
            }
        }
    }

    fn placeholder(&mut self, rect: PixelRect, label: &str) {
        self.fill_rect(rect, PLACEHOLDER_FILL);
        self.outline_rect(rect, PLACEHOLDER_BORDER);
        self.text(rect.x + 2, rect.y + 2, label, PLACEHOLDER_LABEL);
    }
}

fn blend_into(pixel: &mut [u8], color: Rgba) {
    match color[3] {
        0 => {}
        255 => pixel.copy_from_slice(&color),
        alpha => {
            let alpha = alpha as u16;
            let inverse = 255 - alpha;
            for channel in 0..3 {
                let mixed = (color[channel] as u16 * alpha + pixel[channel] as u16 * inverse) / 255;
                pixel[channel] = mixed as u8;
            }
            pixel[3] = 255;
        }
    }
}
