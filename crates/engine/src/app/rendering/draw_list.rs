pub type Rgba = [u8; 4];

/// Integer rectangle in logical frame pixels. `x`/`y` may be negative for
/// partially off-screen targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width as i32)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height as i32)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Rgba),
    FillRect {
        rect: PixelRect,
        color: Rgba,
    },
    /// Copies `src` out of the image stored under asset key `image` into
    /// `dst`. Sizes are expected to match; the renderer does not scale.
    Blit {
        image: String,
        src: PixelRect,
        dst: PixelRect,
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        color: Rgba,
    },
    /// Stand-in for a sprite or image that could not be resolved.
    Placeholder {
        rect: PixelRect,
        label: String,
    },
}

/// Ordered drawing commands for one frame. Later commands paint over
/// earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drops recorded commands but keeps the allocation for the next frame.
    pub fn reset(&mut self) {
        self.commands.clear();
    }

    pub fn clear(&mut self, color: Rgba) {
        self.commands.push(DrawCommand::Clear(color));
    }

    pub fn fill_rect(&mut self, rect: PixelRect, color: Rgba) {
        if rect.is_empty() {
            return;
        }
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    pub fn blit(&mut self, image: &str, src: PixelRect, dst: PixelRect) {
        if dst.is_empty() {
            return;
        }
        self.commands.push(DrawCommand::Blit {
            image: image.to_string(),
            src,
            dst,
        });
    }

    pub fn text(&mut self, x: i32, y: i32, text: impl Into<String>, color: Rgba) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        self.commands.push(DrawCommand::Text { x, y, text, color });
    }

    pub fn placeholder(&mut self, rect: PixelRect, label: impl Into<String>) {
        self.commands.push(DrawCommand::Placeholder {
            rect,
            label: label.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_keep_submission_order() {
        let mut draw = DrawList::new(10, 10);
        draw.clear([0, 0, 0, 255]);
        draw.fill_rect(PixelRect::new(1, 1, 2, 2), [255, 0, 0, 255]);
        draw.text(0, 0, "HI", [255; 4]);
        assert_eq!(draw.len(), 3);
        assert!(matches!(draw.commands()[0], DrawCommand::Clear(_)));
        assert!(matches!(draw.commands()[2], DrawCommand::Text { .. }));

        draw.reset();
        assert!(draw.is_empty());
        assert_eq!((draw.width(), draw.height()), (10, 10));
    }

    #[test]
    fn empty_shapes_are_skipped() {
        let mut draw = DrawList::new(10, 10);
        draw.fill_rect(PixelRect::new(1, 1, 0, 2), [255; 4]);
        draw.blit("a.png", PixelRect::new(0, 0, 1, 1), PixelRect::new(0, 0, 1, 0));
        draw.text(0, 0, "", [255; 4]);
        assert!(draw.is_empty());
    }

    #[test]
    fn rect_edges_handle_negative_origin() {
        let rect = PixelRect::new(-4, -2, 10, 6);
        assert_eq!(rect.right(), 6);
        assert_eq!(rect.bottom(), 4);
    }
}
