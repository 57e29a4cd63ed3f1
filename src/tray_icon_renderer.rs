use tiny_skia::{Color, Paint, Pixmap, Rect, Transform};

use crate::badge::BadgeState;
use crate::error::RenderError;

/// Scale factor for Retina displays (2x for crisp rendering)
const SCALE_FACTOR: u32 = 2;
const GLYPH_WIDTH: u32 = 3;
const GLYPH_HEIGHT: u32 = 5;
const GLYPH_SPACING: u32 = 1;

#[derive(Clone, Debug)]
pub struct TrayImage {
    rgba: Vec<u8>,
    width: u32,
    height: u32,
}

impl TrayImage {
    pub fn new(rgba: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            rgba,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        Some([self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]])
    }

    pub fn into_tauri_image(self) -> tauri::image::Image<'static> {
        tauri::image::Image::new_owned(self.rgba, self.width, self.height)
    }
}

/// A 3x5 one-bit glyph; each row uses its low three bits, leftmost pixel
/// in bit 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphBitmap {
    rows: [u8; GLYPH_HEIGHT as usize],
}

impl GlyphBitmap {
    pub const fn new(rows: [u8; GLYPH_HEIGHT as usize]) -> Self {
        Self { rows }
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        x < GLYPH_WIDTH
            && y < GLYPH_HEIGHT
            && self.rows[y as usize] & (1 << (GLYPH_WIDTH - 1 - x)) != 0
    }
}

/// Glyphs for everything a badge can say: digits and `?`.
#[derive(Clone, Debug)]
pub struct DigitAtlas {
    digits: [GlyphBitmap; 10],
    question: GlyphBitmap,
}

impl Default for DigitAtlas {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DigitAtlas {
    pub fn builtin() -> Self {
        Self {
            digits: [
                GlyphBitmap::new([0b111, 0b101, 0b101, 0b101, 0b111]),
                GlyphBitmap::new([0b010, 0b110, 0b010, 0b010, 0b111]),
                GlyphBitmap::new([0b111, 0b001, 0b111, 0b100, 0b111]),
                GlyphBitmap::new([0b111, 0b001, 0b111, 0b001, 0b111]),
                GlyphBitmap::new([0b101, 0b101, 0b111, 0b001, 0b001]),
                GlyphBitmap::new([0b111, 0b100, 0b111, 0b001, 0b111]),
                GlyphBitmap::new([0b111, 0b100, 0b111, 0b101, 0b111]),
                GlyphBitmap::new([0b111, 0b001, 0b001, 0b001, 0b001]),
                GlyphBitmap::new([0b111, 0b101, 0b111, 0b101, 0b111]),
                GlyphBitmap::new([0b111, 0b101, 0b111, 0b001, 0b111]),
            ],
            question: GlyphBitmap::new([0b111, 0b001, 0b011, 0b000, 0b010]),
        }
    }

    pub fn from_glyphs(digits: [GlyphBitmap; 10], question: GlyphBitmap) -> Self {
        Self { digits, question }
    }

    pub fn glyph(&self, ch: char) -> Option<&GlyphBitmap> {
        match ch {
            '?' => Some(&self.question),
            _ => ch
                .to_digit(10)
                .and_then(|d| self.digits.get(d as usize)),
        }
    }
}

pub struct TrayIconRenderer {
    atlas: DigitAtlas,
}

impl Default for TrayIconRenderer {
    fn default() -> Self {
        Self::new(DigitAtlas::builtin())
    }
}

impl TrayIconRenderer {
    pub fn new(atlas: DigitAtlas) -> Self {
        Self { atlas }
    }

    /// Draw `badge` as a square icon of `size_px` logical pixels: badge
    /// color background with white glyphs centered on it. Characters the
    /// atlas does not know are skipped.
    pub fn render_badge(&self, badge: &BadgeState, size_px: u32) -> Result<TrayImage, RenderError> {
        let size = size_px * SCALE_FACTOR;
        let mut pixmap = Pixmap::new(size, size).ok_or(RenderError::EmptyCanvas)?;

        let (r, g, b) = badge.color.rgb();
        pixmap.fill(Color::from_rgba8(r, g, b, 255));

        let glyphs: Vec<&GlyphBitmap> = badge
            .text
            .chars()
            .filter_map(|ch| self.atlas.glyph(ch))
            .collect();
        if glyphs.is_empty() {
            return Ok(TrayImage::new(pixmap.take(), size, size));
        }

        let count = glyphs.len() as u32;
        let text_units_w = count * GLYPH_WIDTH + (count - 1) * GLYPH_SPACING;
        let padding = size / 8;
        let inner = size.saturating_sub(padding * 2);
        let unit = (inner / text_units_w).min(inner / GLYPH_HEIGHT).max(1);

        let origin_x = size.saturating_sub(text_units_w * unit) / 2;
        let origin_y = size.saturating_sub(GLYPH_HEIGHT * unit) / 2;

        let mut paint = Paint::default();
        paint.set_color_rgba8(255, 255, 255, 255);
        paint.anti_alias = false;

        for (i, glyph) in glyphs.iter().enumerate() {
            let glyph_x = origin_x + i as u32 * (GLYPH_WIDTH + GLYPH_SPACING) * unit;
            for y in 0..GLYPH_HEIGHT {
                for x in 0..GLYPH_WIDTH {
                    if !glyph.is_set(x, y) {
                        continue;
                    }
                    let rect = Rect::from_xywh(
                        (glyph_x + x * unit) as f32,
                        (origin_y + y * unit) as f32,
                        unit as f32,
                        unit as f32,
                    );
                    if let Some(rect) = rect {
                        pixmap.fill_rect(rect, &paint, Transform::identity(), None);
                    }
                }
            }
        }

        Ok(TrayImage::new(pixmap.take(), size, size))
    }
}
