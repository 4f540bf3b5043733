mod draw_list;
mod font;
mod renderer;

pub use draw_list::{DrawCommand, DrawList, PixelRect, Rgba};
pub use font::{text_width_px, GLYPH_HEIGHT, LINE_ADVANCE};
pub use renderer::Renderer;
