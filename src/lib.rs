//! Rasterization of LaTeX-like markup expressions to raster images.
//!
//! A recursive-descent interpreter ([`parser::Renderer`]) consumes an
//! expression string left-to-right, dispatches backslash directives through
//! a static table ([`directives`]) and composites the results into a single
//! [`canvas::Canvas`] with baseline-aligned concatenation. Image origin is
//! the top-left corner; the Y axis grows downwards.

pub mod canvas;
pub mod directives;
pub mod eval;
pub mod glyph;
pub mod handlers;
pub mod parser;

use thiserror::Error;

pub use canvas::Canvas;
pub use parser::Renderer;

/// RGBA color, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };

    /// Builds a color from a packed `0xRRGGBB` value and an explicit alpha.
    pub fn from_rgb(rgb: u32, a: u8) -> Self {
        Color {
            r: ((rgb >> 16) & 0xff) as u8,
            g: ((rgb >> 8) & 0xff) as u8,
            b: (rgb & 0xff) as u8,
            a,
        }
    }

    /// Parses a hexadecimal color string like `"ff00aa"`. Returns `None` on
    /// anything that is not a valid hex number.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let rgb = u32::from_str_radix(hex.trim(), 16).ok()?;
        Some(Color::from_rgb(rgb, 255))
    }

    /// Channel access by index, `[r, g, b, a]` order.
    pub fn channel(&self, index: usize) -> u8 {
        match index {
            0 => self.r,
            1 => self.g,
            2 => self.b,
            3 => self.a,
            _ => 0,
        }
    }
}

/// Selectable font faces of the render environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal = 0,
    Italic = 1,
    Bold = 2,
    BoldItalic = 3,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("there's nothing to rasterize")]
    EmptyExpression,

    #[error("markup nesting exceeds the depth limit of {0}")]
    RecursionLimit(usize),

    #[error("failed to load font: {0}")]
    FontLoad(String),

    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Encode(#[from] image::ImageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_from_hex() {
        assert_eq!(
            Color::from_hex("ff0000"),
            Some(Color { r: 255, g: 0, b: 0, a: 255 })
        );
        assert_eq!(
            Color::from_hex("00FFaa"),
            Some(Color { r: 0, g: 255, b: 170, a: 255 })
        );
        assert_eq!(Color::from_hex("not hex"), None);
    }

    #[test]
    fn color_from_packed_rgb() {
        let c = Color::from_rgb(0x123456, 128);
        assert_eq!((c.r, c.g, c.b, c.a), (0x12, 0x34, 0x56, 128));
    }

    #[test]
    fn color_channel_indexing() {
        let c = Color { r: 1, g: 2, b: 3, a: 4 };
        assert_eq!(
            (0..4).map(|i| c.channel(i)).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert_eq!(c.channel(9), 0);
    }
}
