//! The raster compositing engine.
//!
//! A [`Canvas`] owns a contiguous `width * height * channels` pixel buffer
//! plus the two pieces of layout metadata every markup handler relies on:
//! the `baseline` (the row glyph bottoms sit on) and the `advance_height`
//! (reserved descender space below the baseline). All compositing
//! primitives live here; the canvas knows nothing about text or markup.

use std::path::Path;

use image::{ColorType, ImageFormat};

use crate::{Color, RenderError};

/// Placement of the second operand relative to the first in [`Canvas::concat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePosition {
    Left,
    Right,
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// An owned pixel buffer with baseline metadata.
///
/// A canvas with `width * height == 0` is the empty sentinel; compositing
/// operations treat it as a no-op operand. Canvases are deep-cloned, never
/// aliased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub channels: usize,
    pub baseline: i32,
    pub advance_height: i32,
    pub pixels: Vec<u8>,
}

impl Canvas {
    /// Allocates a zeroed canvas. The baseline starts at the bottom edge.
    pub fn new(width: u32, height: u32, channels: usize) -> Self {
        Canvas {
            width,
            height,
            channels,
            baseline: height as i32,
            advance_height: 0,
            pixels: vec![0; width as usize * height as usize * channels],
        }
    }

    /// The empty sentinel consumed by handlers as "no output".
    pub fn empty() -> Self {
        Canvas::new(0, 0, 0)
    }

    pub fn is_empty(&self) -> bool {
        self.width * self.height == 0
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (x as usize + y as usize * self.width as usize) * self.channels
    }

    /// Bounds-checked view of one pixel's channel group.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        assert!(x < self.width && y < self.height);
        let i = self.index(x, y);
        &self.pixels[i..i + self.channels]
    }

    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [u8] {
        assert!(x < self.width && y < self.height);
        let i = self.index(x, y);
        let channels = self.channels;
        &mut self.pixels[i..i + channels]
    }

    /// Writes `color` into one pixel, truncated to the canvas channel count.
    pub fn put_pixel(&mut self, x: u32, y: u32, color: Color) {
        let channels = self.channels;
        let px = self.pixel_mut(x, y);
        for c in 0..channels {
            px[c] = color.channel(c);
        }
    }

    /// Alpha-composites `source` onto `self` with its top-left corner at
    /// `(x, y)` using the standard "over" operator. Source pixels that fall
    /// outside the destination are clipped, not an error. Opaque-on-opaque
    /// takes a copy fast path; a narrower source (e.g. grayscale onto RGBA)
    /// is fanned out across the destination channels.
    pub fn overlay(&mut self, source: &Canvas, x: i32, y: i32) {
        if source.is_empty() || self.is_empty() {
            return;
        }

        for sy in 0..source.height as i32 {
            let dy = sy + y;
            if dy < 0 {
                continue;
            }
            if dy >= self.height as i32 {
                break;
            }
            for sx in 0..source.width as i32 {
                let dx = sx + x;
                if dx < 0 {
                    continue;
                }
                if dx >= self.width as i32 {
                    break;
                }

                let si = source.index(sx as u32, sy as u32);
                let di = self.index(dx as u32, dy as u32);

                let src_alpha = if source.channels < 4 {
                    1.0
                } else {
                    source.pixels[si + 3] as f32 / 255.0
                };
                let dst_alpha = if self.channels < 4 {
                    1.0
                } else {
                    self.pixels[di + 3] as f32 / 255.0
                };

                if src_alpha > 0.99 && dst_alpha > 0.99 {
                    if source.channels >= self.channels {
                        for c in 0..self.channels {
                            self.pixels[di + c] = source.pixels[si + c];
                        }
                    } else {
                        for c in 0..self.channels {
                            self.pixels[di + c] = source.pixels[si];
                        }
                    }
                } else {
                    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
                    if out_alpha < 0.01 {
                        for c in 0..self.channels {
                            self.pixels[di + c] = 0;
                        }
                    } else {
                        for c in 0..self.channels {
                            let s = source.pixels[si + c.min(source.channels - 1)] as f32 / 255.0;
                            let d = self.pixels[di + c] as f32 / 255.0;
                            let v = (s * src_alpha + d * dst_alpha * (1.0 - src_alpha)) / out_alpha;
                            self.pixels[di + c] = (v * 255.0).round().clamp(0.0, 255.0) as u8;
                        }
                        if self.channels > 3 {
                            self.pixels[di + 3] =
                                (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
                        }
                    }
                }
            }
        }
    }

    /// Blends a single solid-color pixel with a precomputed source alpha.
    /// Same math as [`Canvas::overlay`]; used by the glyph blitter where the
    /// alpha comes from coverage rather than a source buffer.
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: Color, src_alpha: f32) {
        let di = self.index(x, y);
        let dst_alpha = if self.channels < 4 {
            1.0
        } else {
            self.pixels[di + 3] as f32 / 255.0
        };

        if src_alpha > 0.99 && dst_alpha > 0.99 {
            for c in 0..self.channels {
                self.pixels[di + c] = color.channel(c);
            }
            return;
        }

        let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
        if out_alpha < 0.01 {
            for c in 0..self.channels {
                self.pixels[di + c] = 0;
            }
            return;
        }
        for c in 0..self.channels.min(3) {
            let s = color.channel(c) as f32 / 255.0;
            let d = self.pixels[di + c] as f32 / 255.0;
            let v = (s * src_alpha + d * dst_alpha * (1.0 - src_alpha)) / out_alpha;
            self.pixels[di + c] = (v * 255.0).round().clamp(0.0, 255.0) as u8;
        }
        if self.channels > 3 {
            self.pixels[di + 3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }

    /// Concatenates `other` onto `self` in place. An empty operand
    /// short-circuits: this is the mechanism by which no-op directives
    /// propagate without special-casing in every caller.
    pub fn concat(&mut self, other: Canvas, position: ImagePosition, spacing: u32) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = other;
            return;
        }
        *self = Canvas::concat_pair(self, &other, position, spacing);
    }

    /// Joins two canvases into a new one.
    ///
    /// Horizontal positions align both operands on a shared baseline:
    /// `baseline = max(baselines)`, `advance_height = max(advances)`, and
    /// the height grows until every baseline-shifted operand fits and
    /// `height >= baseline + advance_height`. Vertical positions stack the
    /// operands and reset the baseline to the full new height.
    pub fn concat_pair(
        left: &Canvas,
        right: &Canvas,
        position: ImagePosition,
        spacing: u32,
    ) -> Canvas {
        if left.is_empty() {
            return right.clone();
        }
        if right.is_empty() {
            return left.clone();
        }

        let channels = left.channels.max(right.channels);

        match position {
            ImagePosition::Left | ImagePosition::Right => {
                let new_w = left.width + right.width + spacing;
                let new_baseline = left.baseline.max(right.baseline);
                let new_advance = left.advance_height.max(right.advance_height);
                let new_h = (left.height.max(right.height) as i32)
                    .max(new_baseline - left.baseline + left.height as i32)
                    .max(new_baseline - right.baseline + right.height as i32)
                    .max(new_baseline + new_advance);

                let mut out = Canvas::new(new_w, new_h.max(0) as u32, channels);
                out.baseline = new_baseline;
                out.advance_height = new_advance;

                let (first, second) = match position {
                    ImagePosition::Right => (left, right),
                    _ => (right, left),
                };
                out.overlay(first, 0, new_baseline - first.baseline);
                out.overlay(
                    second,
                    first.width as i32 + spacing as i32,
                    new_baseline - second.baseline,
                );
                out
            }
            ImagePosition::Top | ImagePosition::Bottom => {
                let new_w = left.width.max(right.width);
                let new_h = left.height + right.height + spacing;

                let mut out = Canvas::new(new_w, new_h, channels);
                out.baseline = new_h as i32;
                out.advance_height = 0;

                let (first, second) = match position {
                    ImagePosition::Bottom => (left, right),
                    _ => (right, left),
                };
                out.overlay(first, 0, 0);
                out.overlay(second, 0, first.height as i32 + spacing as i32);
                out
            }
        }
    }

    /// Crops in place to the `cw * ch` window at `(cx, cy)`. Regions outside
    /// the source stay zeroed.
    pub fn crop(&mut self, cx: u32, cy: u32, cw: u32, ch: u32) {
        let mut out = Canvas::new(cw, ch, self.channels);
        out.baseline = self.baseline;
        out.advance_height = self.advance_height;

        for y in 0..ch {
            if y + cy >= self.height {
                break;
            }
            for x in 0..cw {
                if x + cx >= self.width {
                    break;
                }
                let si = self.index(x + cx, y + cy);
                let di = out.index(x, y);
                out.pixels[di..di + self.channels]
                    .copy_from_slice(&self.pixels[si..si + self.channels]);
            }
        }

        *self = out;
    }

    /// Cropped copy, leaving `self` untouched.
    pub fn cropped(&self, cx: u32, cy: u32, cw: u32, ch: u32) -> Canvas {
        let mut copy = self.clone();
        copy.crop(cx, cy, cw, ch);
        copy
    }

    /// Nearest-neighbor resize to an arbitrary resolution.
    pub fn resize_nn(&mut self, nw: u32, nh: u32) {
        if self.is_empty() || nw == 0 || nh == 0 {
            return;
        }
        let mut out = Canvas::new(nw, nh, self.channels);
        out.baseline = self.baseline;
        out.advance_height = self.advance_height;

        let scale_x = nw as f32 / self.width as f32;
        let scale_y = nh as f32 / self.height as f32;

        for y in 0..nh {
            let sy = ((y as f32 / scale_y) as u32).min(self.height - 1);
            for x in 0..nw {
                let sx = ((x as f32 / scale_x) as u32).min(self.width - 1);
                let si = self.index(sx, sy);
                let di = out.index(x, y);
                out.pixels[di..di + self.channels]
                    .copy_from_slice(&self.pixels[si..si + self.channels]);
            }
        }

        *self = out;
    }

    /// Integer upscale by pixel replication. Baseline metadata scales along
    /// so magnified sub-expressions stay aligned when concatenated.
    pub fn scale_up(&mut self, times: u32) {
        if self.is_empty() || times < 2 {
            return;
        }
        let mut out = Canvas::new(self.width * times, self.height * times, self.channels);
        out.baseline = self.baseline * times as i32;
        out.advance_height = self.advance_height * times as i32;

        for y in 0..out.height {
            let sy = y / times;
            for x in 0..out.width {
                let sx = x / times;
                let si = self.index(sx, sy);
                let di = out.index(x, y);
                out.pixels[di..di + self.channels]
                    .copy_from_slice(&self.pixels[si..si + self.channels]);
            }
        }

        *self = out;
    }

    /// Integer downscale by `times * times` box averaging.
    pub fn scale_down(&mut self, times: u32) {
        if self.is_empty() || times < 2 {
            return;
        }
        let nw = self.width / times;
        let nh = self.height / times;
        if nw == 0 || nh == 0 {
            return;
        }

        let mut out = Canvas::new(nw, nh, self.channels);
        out.baseline = self.baseline / times as i32;
        out.advance_height = self.advance_height / times as i32;

        let area = (times * times) as u32;
        for y in 0..nh {
            for x in 0..nw {
                let di = out.index(x, y);
                for c in 0..self.channels {
                    let mut sum = 0u32;
                    for by in 0..times {
                        for bx in 0..times {
                            let si = self.index(x * times + bx, y * times + by);
                            sum += self.pixels[si + c] as u32;
                        }
                    }
                    out.pixels[di + c] = (sum / area) as u8;
                }
            }
        }

        *self = out;
    }

    /// In-place mirror across the given axis.
    pub fn flip(&mut self, axis: Axis) {
        let channels = self.channels;
        match axis {
            Axis::X => {
                for y in 0..self.height {
                    for x in 0..self.width / 2 {
                        let a = self.index(x, y);
                        let b = self.index(self.width - 1 - x, y);
                        for c in 0..channels {
                            self.pixels.swap(a + c, b + c);
                        }
                    }
                }
            }
            Axis::Y => {
                for x in 0..self.width {
                    for y in 0..self.height / 2 {
                        let a = self.index(x, y);
                        let b = self.index(x, self.height - 1 - y);
                        for c in 0..channels {
                            self.pixels.swap(a + c, b + c);
                        }
                    }
                }
            }
        }
    }

    /// Rotates around the canvas center by an arbitrary angle (degrees,
    /// clockwise, normalized into `[0, 360)`; near-zero angles no-op).
    ///
    /// Forward mapping: the canvas is supersampled 2x, every source pixel is
    /// projected to its rotated position, then the result is box-filtered
    /// back down. Destination pixels no source pixel lands on stay blank, so
    /// non-axis-aligned angles show resampling holes.
    pub fn rotate(&mut self, degrees: f64) {
        let degrees = degrees.rem_euclid(360.0);
        if degrees < 0.5 || degrees > 359.5 || self.is_empty() {
            return;
        }

        self.scale_up(2);

        let (sin, cos) = degrees.to_radians().sin_cos();
        let cx = (self.width as f64 - 1.0) / 2.0;
        let cy = (self.height as f64 - 1.0) / 2.0;

        let mut out = Canvas::new(self.width, self.height, self.channels);
        out.baseline = self.baseline;
        out.advance_height = self.advance_height;

        for y in 0..self.height {
            for x in 0..self.width {
                let fx = x as f64 - cx;
                let fy = y as f64 - cy;
                let rx = (cos * fx - sin * fy + cx).round();
                let ry = (sin * fx + cos * fy + cy).round();
                if rx < 0.0 || ry < 0.0 || rx >= self.width as f64 || ry >= self.height as f64 {
                    continue;
                }
                let si = self.index(x, y);
                let di = out.index(rx as u32, ry as u32);
                for c in 0..self.channels {
                    out.pixels[di + c] = self.pixels[si + c];
                }
            }
        }

        *self = out;
        self.scale_down(2);
    }

    /// Integer Bresenham line with octant normalization; points outside the
    /// canvas are clipped.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        if self.is_empty() {
            return;
        }

        let mut x = x0;
        let mut y = y0;
        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx - dy;

        loop {
            if x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32 {
                self.put_pixel(x as u32, y as u32, color);
            }
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Recolors the canvas with a linear horizontal gradient; every row gets
    /// the same ramp. Alpha is left untouched. Requires RGB channels.
    pub fn gradient(&mut self, start: Color, stop: Color) {
        if self.channels < 3 {
            log::warn!("gradient requires at least 3 channels, got {}", self.channels);
            return;
        }

        for x in 0..self.width {
            let n = if self.width > 1 {
                x as f32 / (self.width - 1) as f32
            } else {
                0.0
            };
            let r = (start.r as f32 * (1.0 - n) + stop.r as f32 * n) as u8;
            let g = (start.g as f32 * (1.0 - n) + stop.g as f32 * n) as u8;
            let b = (start.b as f32 * (1.0 - n) + stop.b as f32 * n) as u8;
            for y in 0..self.height {
                let i = self.index(x, y);
                self.pixels[i] = r;
                self.pixels[i + 1] = g;
                self.pixels[i + 2] = b;
            }
        }
    }

    fn color_type(&self) -> Result<ColorType, RenderError> {
        match self.channels {
            1 => Ok(ColorType::L8),
            3 => Ok(ColorType::Rgb8),
            4 => Ok(ColorType::Rgba8),
            n => Err(RenderError::UnsupportedFormat(format!(
                "{n}-channel pixel buffer"
            ))),
        }
    }

    /// Writes the canvas to a file, picking the codec from the extension.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), RenderError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("png") => self.to_png(path),
            Some("jpg") | Some("jpeg") => self.to_jpg(path),
            Some("bmp") => self.to_bmp(path),
            Some("tga") => self.to_tga(path),
            other => Err(RenderError::UnsupportedFormat(
                other.unwrap_or("<no extension>").to_string(),
            )),
        }
    }

    pub fn to_png<P: AsRef<Path>>(&self, path: P) -> Result<(), RenderError> {
        self.save(path, ImageFormat::Png)
    }

    /// JPEG has no alpha channel; an RGBA canvas is flattened onto black.
    pub fn to_jpg<P: AsRef<Path>>(&self, path: P) -> Result<(), RenderError> {
        if self.channels == 4 {
            let mut rgb = Vec::with_capacity(self.width as usize * self.height as usize * 3);
            for px in self.pixels.chunks_exact(4) {
                let a = px[3] as u32;
                rgb.push((px[0] as u32 * a / 255) as u8);
                rgb.push((px[1] as u32 * a / 255) as u8);
                rgb.push((px[2] as u32 * a / 255) as u8);
            }
            image::save_buffer_with_format(
                path,
                &rgb,
                self.width,
                self.height,
                ColorType::Rgb8,
                ImageFormat::Jpeg,
            )?;
            return Ok(());
        }
        self.save(path, ImageFormat::Jpeg)
    }

    pub fn to_bmp<P: AsRef<Path>>(&self, path: P) -> Result<(), RenderError> {
        self.save(path, ImageFormat::Bmp)
    }

    pub fn to_tga<P: AsRef<Path>>(&self, path: P) -> Result<(), RenderError> {
        self.save(path, ImageFormat::Tga)
    }

    fn save<P: AsRef<Path>>(&self, path: P, format: ImageFormat) -> Result<(), RenderError> {
        image::save_buffer_with_format(
            path,
            &self.pixels,
            self.width,
            self.height,
            self.color_type()?,
            format,
        )?;
        Ok(())
    }
}
