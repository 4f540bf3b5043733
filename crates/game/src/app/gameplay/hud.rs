use platformer_engine::{draw_centered_text, text_width_px, DrawList, PixelRect, LINE_ADVANCE};

const HUD_MARGIN_PX: i32 = 4;
const HUD_PANEL_COLOR: [u8; 4] = [0, 0, 0, 140];
const HUD_TEXT_COLOR: [u8; 4] = [255, 255, 255, 255];
const BANNER_PANEL_COLOR: [u8; 4] = [0, 0, 0, 180];
const BANNER_TEXT_COLOR: [u8; 4] = [255, 220, 90, 255];

pub(crate) fn status_line(level_name: &str, score: u32, dash_charges: u32) -> String {
    format!("{level_name}  SCORE {score}  DASH {dash_charges}").to_ascii_uppercase()
}

/// Level name, score and dash charges in the top-left corner.
pub(crate) fn draw_status(draw: &mut DrawList, level_name: &str, score: u32, dash_charges: u32) {
    let text = status_line(level_name, score, dash_charges);
    let width = text_width_px(&text);
    draw.fill_rect(
        PixelRect::new(
            HUD_MARGIN_PX - 2,
            HUD_MARGIN_PX - 2,
            width + 4,
            LINE_ADVANCE + 2,
        ),
        HUD_PANEL_COLOR,
    );
    draw.text(HUD_MARGIN_PX, HUD_MARGIN_PX, text, HUD_TEXT_COLOR);
}

/// Full-width strip across the middle of the frame with centred text.
pub(crate) fn draw_banner(draw: &mut DrawList, text: &str) {
    let lines = text.lines().count().max(1) as u32;
    let height = lines * LINE_ADVANCE + 8;
    let top = (draw.height() as i32 - height as i32) / 2;
    draw.fill_rect(
        PixelRect::new(0, top, draw.width(), height),
        BANNER_PANEL_COLOR,
    );
    draw_centered_text(draw, text, BANNER_TEXT_COLOR);
}
