//! Glyph rasterization boundary.
//!
//! The interpreter only ever talks to a [`GlyphSource`]: give it a scale and
//! a codepoint, get back a coverage bitmap with placement metrics. The
//! production implementation is [`TrueTypeFont`] over `ab_glyph`; tests
//! substitute a deterministic stub.

use std::path::Path;

use ab_glyph::{point, Font, FontArc, PxScale, ScaleFont};
use font_kit::family_name::FamilyName;
use font_kit::properties::Properties;
use font_kit::source::SystemSource;

use crate::canvas::{Canvas, ImagePosition};
use crate::{Color, RenderError};

/// Anti-aliased coverage bitmap for one glyph.
///
/// `origin_x`/`origin_y` locate the bitmap's top-left corner relative to the
/// pen position on the baseline (Y grows downward, so `origin_y` is negative
/// for glyphs that rise above the baseline). `advance` is the horizontal pen
/// advance for the glyph.
#[derive(Debug, Clone)]
pub struct GlyphBitmap {
    pub width: u32,
    pub height: u32,
    pub origin_x: i32,
    pub origin_y: i32,
    pub advance: f32,
    pub coverage: Vec<u8>,
}

/// Something that can produce glyph bitmaps at a given pixel scale.
/// `None` means the face has no glyph for the codepoint.
pub trait GlyphSource: Send + Sync {
    fn request_glyph(&self, scale: f32, codepoint: char) -> Option<GlyphBitmap>;
}

/// A loaded TrueType/OpenType face backed by `ab_glyph`.
pub struct TrueTypeFont {
    font: FontArc,
}

impl TrueTypeFont {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RenderError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, RenderError> {
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| RenderError::FontLoad(e.to_string()))?;
        Ok(TrueTypeFont { font })
    }

    /// Picks a sans-serif face from the host system.
    pub fn from_system() -> Result<Self, RenderError> {
        let handle = SystemSource::new()
            .select_best_match(&[FamilyName::SansSerif], &Properties::new())
            .map_err(|e| RenderError::FontLoad(e.to_string()))?;
        let font = handle
            .load()
            .map_err(|e| RenderError::FontLoad(e.to_string()))?;
        let data = font
            .copy_font_data()
            .ok_or_else(|| RenderError::FontLoad("font data unavailable".to_string()))?;
        Self::from_bytes(data.as_ref().clone())
    }
}

impl GlyphSource for TrueTypeFont {
    fn request_glyph(&self, scale: f32, codepoint: char) -> Option<GlyphBitmap> {
        let id = self.font.glyph_id(codepoint);
        if id.0 == 0 {
            return None;
        }

        let px = PxScale::from(scale);
        let advance = self.font.as_scaled(px).h_advance(id);
        let glyph = id.with_scale_and_position(px, point(0.0, 0.0));

        match self.font.outline_glyph(glyph) {
            Some(outlined) => {
                let bounds = outlined.px_bounds();
                let width = bounds.width().ceil() as u32;
                let height = bounds.height().ceil() as u32;
                let mut coverage = vec![0u8; width as usize * height as usize];
                outlined.draw(|x, y, c| {
                    if x < width && y < height {
                        coverage[(x + y * width) as usize] = (c * 255.0) as u8;
                    }
                });
                Some(GlyphBitmap {
                    width,
                    height,
                    origin_x: bounds.min.x.round() as i32,
                    origin_y: bounds.min.y.round() as i32,
                    advance,
                    coverage,
                })
            }
            // Whitespace glyphs carry an advance but no outline.
            None => Some(GlyphBitmap {
                width: 0,
                height: 0,
                origin_x: 0,
                origin_y: 0,
                advance,
                coverage: Vec::new(),
            }),
        }
    }
}

/// Rasterizes one character onto its own baseline-tagged canvas.
///
/// The canvas is widened to cover the pen advance when it exceeds the ink
/// extent; the baseline is derived from the glyph origin and clamped into
/// the canvas, with the leftover below it recorded as `advance_height`.
/// Missing glyphs and zero-height glyphs (spaces) yield the empty sentinel.
pub fn rasterize_character(
    source: &dyn GlyphSource,
    size: f32,
    codepoint: char,
    color: Color,
) -> Canvas {
    let bitmap = match source.request_glyph(size, codepoint) {
        Some(b) => b,
        None => {
            log::warn!("no glyph for {codepoint:?} (U+{:04X}), skipping", codepoint as u32);
            return Canvas::empty();
        }
    };

    if bitmap.height == 0 {
        return Canvas::empty();
    }

    let advance = bitmap.advance.round() as i64;
    let width = bitmap.width + (advance - bitmap.width as i64).max(0) as u32;
    let height = bitmap.height;

    let mut canvas = Canvas::new(width, height, 4);
    canvas.baseline = (bitmap.origin_y - 1).abs().min(height as i32);
    canvas.advance_height = (height as i32 - canvas.baseline).max(0);

    for sy in 0..bitmap.height {
        for sx in 0..bitmap.width {
            let cov = bitmap.coverage[(sx + sy * bitmap.width) as usize];
            if cov == 0 {
                continue;
            }
            let dx = sx as i32 + bitmap.origin_x;
            if dx < 0 || dx >= width as i32 {
                continue;
            }
            let alpha = cov as f32 / 255.0 * color.a as f32 / 255.0;
            canvas.blend_pixel(dx as u32, sy, color, alpha);
        }
    }

    canvas
}

/// Rasterizes a plain run of characters with baseline-aligned concatenation.
pub fn rasterize_text(source: &dyn GlyphSource, size: f32, text: &str, color: Color) -> Canvas {
    let mut acc = Canvas::empty();
    for ch in text.chars() {
        let glyph = rasterize_character(source, size, ch, color);
        acc.concat(glyph, ImagePosition::Right, 0);
    }
    acc
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Deterministic stub face: every printable glyph at scale `s` is a
    /// solid block `s/2` wide and `s` tall sitting on the baseline, `'?'`
    /// is missing and `' '` is advance-only.
    pub(crate) struct BlockFace;

    impl GlyphSource for BlockFace {
        fn request_glyph(&self, scale: f32, codepoint: char) -> Option<GlyphBitmap> {
            if codepoint == '?' {
                return None;
            }
            let h = scale.round() as u32;
            if codepoint == ' ' {
                return Some(GlyphBitmap {
                    width: 0,
                    height: 0,
                    origin_x: 0,
                    origin_y: 0,
                    advance: (h / 2 + 1) as f32,
                    coverage: Vec::new(),
                });
            }
            let w = h / 2;
            Some(GlyphBitmap {
                width: w,
                height: h,
                origin_x: 0,
                origin_y: -(h as i32) + 1,
                advance: (w + 1) as f32,
                coverage: vec![255; (w * h) as usize],
            })
        }
    }

    #[test]
    fn character_canvas_geometry() {
        let c = rasterize_character(&BlockFace, 10.0, 'x', Color::WHITE);
        // Ink is 5 wide, advance 6: canvas widened to the advance.
        assert_eq!((c.width, c.height), (6, 10));
        assert_eq!(c.baseline, 10);
        assert_eq!(c.advance_height, 0);
        assert_eq!(c.pixel(0, 0), [255, 255, 255, 255]);
        // The advance gutter stays blank.
        assert_eq!(c.pixel(5, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn missing_glyph_is_empty() {
        assert!(rasterize_character(&BlockFace, 10.0, '?', Color::WHITE).is_empty());
    }

    #[test]
    fn space_is_empty() {
        assert!(rasterize_character(&BlockFace, 10.0, ' ', Color::WHITE).is_empty());
    }

    #[test]
    fn text_run_concatenates_on_baseline() {
        let c = rasterize_text(&BlockFace, 10.0, "ab", Color::WHITE);
        assert_eq!((c.width, c.height), (12, 10));
        assert_eq!(c.baseline, 10);
        assert_eq!(c.pixel(6, 9), [255, 255, 255, 255]);
    }

    #[test]
    fn color_alpha_scales_coverage() {
        let c = rasterize_character(
            &BlockFace,
            10.0,
            'x',
            Color { r: 255, g: 0, b: 0, a: 128 },
        );
        let px = c.pixel(0, 0);
        assert_eq!(px[0], 255);
        assert!(px[3] > 120 && px[3] < 136);
    }
}
