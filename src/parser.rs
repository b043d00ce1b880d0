//! The markup interpreter.
//!
//! [`Renderer`] owns the font faces and render defaults; [`Renderer::parse`]
//! consumes an expression buffer from the front, dispatching directives
//! through the table in [`crate::directives`] and compositing everything
//! into one canvas. Rendering state (`RenderEnv`) is an immutable value
//! passed down each recursive call; scoped directives hand a modified copy
//! to their sub-expression and nothing ever needs restoring.

use std::path::Path;
use std::sync::Arc;

use crate::canvas::{Canvas, ImagePosition};
use crate::directives;
use crate::glyph::{rasterize_character, GlyphSource, TrueTypeFont};
use crate::handlers;
use crate::{Color, FontStyle, RenderError};

/// Ambient rendering state for one sub-expression.
#[derive(Debug, Clone, Copy)]
pub struct RenderEnv {
    pub style: FontStyle,
    pub size: f32,
    pub color: Color,
}

impl RenderEnv {
    pub fn with_color(self, color: Color) -> Self {
        RenderEnv { color, ..self }
    }

    pub fn with_style(self, style: FontStyle) -> Self {
        RenderEnv { style, ..self }
    }

    pub fn with_size(self, size: f32) -> Self {
        RenderEnv { size, ..self }
    }
}

/// Sub- and superscript sources split off an expression by [`tex_scripts`].
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Scripts {
    pub sub: String,
    pub sup: String,
}

pub struct Renderer {
    faces: [Arc<dyn GlyphSource>; 4],
    base_size: f32,
    color: Color,
    max_depth: usize,
}

impl Renderer {
    /// One face serves all four style slots.
    pub fn new(face: Arc<dyn GlyphSource>) -> Self {
        Renderer {
            faces: [face.clone(), face.clone(), face.clone(), face],
            base_size: 50.0,
            color: Color::WHITE,
            max_depth: 64,
        }
    }

    pub fn with_faces(
        normal: Arc<dyn GlyphSource>,
        italic: Arc<dyn GlyphSource>,
        bold: Arc<dyn GlyphSource>,
        bold_italic: Arc<dyn GlyphSource>,
    ) -> Self {
        Renderer {
            faces: [normal, italic, bold, bold_italic],
            base_size: 50.0,
            color: Color::WHITE,
            max_depth: 64,
        }
    }

    /// Loads faces from font files; styles without a file reuse the normal
    /// face.
    pub fn from_font_files(
        normal: &str,
        italic: Option<&str>,
        bold: Option<&str>,
        bold_italic: Option<&str>,
    ) -> Result<Self, RenderError> {
        let normal: Arc<dyn GlyphSource> = Arc::new(TrueTypeFont::load(normal)?);
        let load = |path: Option<&str>| -> Result<Arc<dyn GlyphSource>, RenderError> {
            match path {
                Some(p) => Ok(Arc::new(TrueTypeFont::load(p)?)),
                None => Ok(normal.clone()),
            }
        };
        let italic = load(italic)?;
        let bold = load(bold)?;
        let bold_italic = load(bold_italic)?;
        Ok(Renderer::with_faces(normal, italic, bold, bold_italic))
    }

    pub fn from_system_font() -> Result<Self, RenderError> {
        Ok(Renderer::new(Arc::new(TrueTypeFont::from_system()?)))
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_font_size(&mut self, size: f32) {
        self.base_size = size;
    }

    pub fn set_max_depth(&mut self, depth: usize) {
        self.max_depth = depth;
    }

    pub(crate) fn face(&self, style: FontStyle) -> &dyn GlyphSource {
        self.faces[style as usize].as_ref()
    }

    /// Renders an expression into a canvas. An empty input is the only
    /// failure markup itself can produce; everything below degrades locally.
    pub fn render_to_image(&self, expression: &str) -> Result<Canvas, RenderError> {
        if expression.is_empty() {
            return Err(RenderError::EmptyExpression);
        }

        let mut expr = expression.to_string();
        preprocess(&mut expr);
        log::debug!("rendering expression: {expr:?}");

        let env = RenderEnv {
            style: FontStyle::Normal,
            size: self.base_size,
            color: self.color,
        };
        self.parse(&mut expr, &env, 0)
    }

    /// Renders and writes in one step; the codec comes from the extension.
    pub fn render<P: AsRef<Path>>(&self, expression: &str, path: P) -> Result<(), RenderError> {
        self.render_to_image(expression)?.write(path)
    }

    /// The consume loop. Every branch removes at least one byte from the
    /// buffer, so termination is unconditional.
    pub(crate) fn parse(
        &self,
        expr: &mut String,
        env: &RenderEnv,
        depth: usize,
    ) -> Result<Canvas, RenderError> {
        if depth > self.max_depth {
            return Err(RenderError::RecursionLimit(self.max_depth));
        }

        let mut acc = Canvas::empty();

        while let Some(head) = expr.chars().next() {
            match head {
                // Scripts on whatever has been composited so far.
                '_' | '^' => handlers::rast_scripts(self, expr, &mut acc, env, depth)?,
                '{' => {
                    let mut sub = scan_delimited(expr, '{', '}', false);
                    let image = self.parse(&mut sub, env, depth + 1)?;
                    acc.concat(image, ImagePosition::Right, 0);
                }
                '\\' => match directives::lookup(expr) {
                    Some(entry) => {
                        expr.replace_range(..entry.token.len(), "");
                        handlers::dispatch(self, entry.kind, expr, &mut acc, env, depth)?;
                    }
                    None => {
                        // Unknown directive: skip ahead to the next thing
                        // that could start an argument, or give up on the
                        // rest of the buffer.
                        log::debug!("unknown directive at {expr:?}, skipping");
                        let stop = expr
                            .char_indices()
                            .skip(1)
                            .find(|&(_, c)| c == '{' || c == '~' || c.is_ascii_digit())
                            .map(|(i, _)| i);
                        match stop {
                            Some(i) => expr.replace_range(..i, ""),
                            None => expr.clear(),
                        }
                    }
                },
                ch => {
                    let mut glyph = rasterize_character(self.face(env.style), env.size, ch, env.color);
                    expr.remove(0);
                    // Scripts directly after a glyph attach to that glyph,
                    // not to the whole line.
                    if expr.starts_with('_') || expr.starts_with('^') {
                        handlers::rast_scripts(self, expr, &mut glyph, env, depth)?;
                    }
                    acc.concat(glyph, ImagePosition::Right, 0);
                }
            }
        }

        Ok(acc)
    }
}

/// One-time cleanup before parsing: strips a `%%comment%%` (unterminated
/// comments swallow the rest) and balances braces by dropping stray closers
/// and appending missing ones.
pub(crate) fn preprocess(expr: &mut String) {
    if let Some(start) = expr.find("%%") {
        match expr[start + 2..].find("%%") {
            Some(offset) => expr.replace_range(start..start + offset + 4, ""),
            None => expr.truncate(start),
        }
    }

    let mut depth = 0usize;
    let mut balanced = String::with_capacity(expr.len());
    for ch in expr.chars() {
        match ch {
            '{' => depth += 1,
            '}' => {
                if depth == 0 {
                    continue;
                }
                depth -= 1;
            }
            _ => {}
        }
        balanced.push(ch);
    }
    for _ in 0..depth {
        balanced.push('}');
    }
    *expr = balanced;
}

/// Splits a balanced `left ... right` group off the front of `expr`.
///
/// If the buffer does not start with `left`, its first character is removed
/// and returned instead, so a single-character argument needs no braces.
/// Backslash-escaped delimiters do not count toward nesting. An unterminated
/// group consumes the rest of the buffer as its content; either way the
/// buffer always shrinks.
pub(crate) fn scan_delimited(
    expr: &mut String,
    left: char,
    right: char,
    include_delims: bool,
) -> String {
    let first = match expr.chars().next() {
        Some(c) => c,
        None => return String::new(),
    };

    if first != left {
        expr.remove(0);
        return first.to_string();
    }

    let mut depth = 0usize;
    let mut prev = '\0';
    let mut end = None;
    for (i, ch) in expr.char_indices() {
        if ch == left && prev != '\\' {
            depth += 1;
        } else if ch == right && prev != '\\' {
            depth -= 1;
            if depth == 0 {
                end = Some(i);
                break;
            }
        }
        prev = ch;
    }

    match end {
        Some(i) => {
            let result = if include_delims {
                expr[..i + right.len_utf8()].to_string()
            } else {
                expr[left.len_utf8()..i].to_string()
            };
            expr.replace_range(..i + right.len_utf8(), "");
            result
        }
        None => {
            let result = if include_delims {
                expr.clone()
            } else {
                expr[left.len_utf8()..].to_string()
            };
            expr.clear();
            result
        }
    }
}

/// Collects at most one subscript and one superscript group off the front
/// of the expression, in either order.
pub(crate) fn tex_scripts(expr: &mut String) -> Scripts {
    let mut scripts = Scripts::default();
    let mut got_sub = false;
    let mut got_sup = false;

    loop {
        if expr.starts_with('_') && !got_sub {
            expr.remove(0);
            got_sub = true;
            scripts.sub = scan_delimited(expr, '{', '}', false);
        } else if expr.starts_with('^') && !got_sup {
            expr.remove(0);
            got_sup = true;
            scripts.sup = scan_delimited(expr, '{', '}', false);
        } else {
            return scripts;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::tests::BlockFace;
    use crate::RenderError;

    fn renderer() -> Renderer {
        // BlockFace at size 10: every glyph is a 5x10 block with a 6px
        // advance, so glyph canvases come out 6 wide and 10 tall.
        let mut r = Renderer::new(Arc::new(BlockFace));
        r.set_font_size(10.0);
        r
    }

    #[test]
    fn scan_delimited_balanced_group() {
        let mut e = String::from("{a{b}c}REST");
        assert_eq!(scan_delimited(&mut e, '{', '}', false), "a{b}c");
        assert_eq!(e, "REST");
    }

    #[test]
    fn scan_delimited_keeps_delims_on_request() {
        let mut e = String::from("{ab}c");
        assert_eq!(scan_delimited(&mut e, '{', '}', true), "{ab}");
        assert_eq!(e, "c");
    }

    #[test]
    fn scan_delimited_escaped_delimiter() {
        let mut e = String::from("{a\\}b}X");
        assert_eq!(scan_delimited(&mut e, '{', '}', false), "a\\}b");
        assert_eq!(e, "X");
    }

    #[test]
    fn scan_delimited_bare_char() {
        let mut e = String::from("xyz");
        assert_eq!(scan_delimited(&mut e, '{', '}', false), "x");
        assert_eq!(e, "yz");
    }

    #[test]
    fn scan_delimited_unterminated_consumes_rest() {
        let mut e = String::from("{abc");
        assert_eq!(scan_delimited(&mut e, '{', '}', false), "abc");
        assert_eq!(e, "");
    }

    #[test]
    fn preprocess_strips_comment() {
        let mut e = String::from("a%%note%%b");
        preprocess(&mut e);
        assert_eq!(e, "ab");

        let mut e = String::from("a%%dangling");
        preprocess(&mut e);
        assert_eq!(e, "a");
    }

    #[test]
    fn preprocess_balances_braces() {
        let mut e = String::from("}a{b");
        preprocess(&mut e);
        assert_eq!(e, "a{b}");
    }

    #[test]
    fn tex_scripts_both_orders() {
        let mut e = String::from("_{a}^{b}rest");
        assert_eq!(
            tex_scripts(&mut e),
            Scripts { sub: "a".into(), sup: "b".into() }
        );
        assert_eq!(e, "rest");

        let mut e = String::from("^{b}_{a}_{c}");
        assert_eq!(
            tex_scripts(&mut e),
            Scripts { sub: "a".into(), sup: "b".into() }
        );
        // Only one of each; the second subscript stays put.
        assert_eq!(e, "_{c}");
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            renderer().render_to_image(""),
            Err(RenderError::EmptyExpression)
        ));
    }

    #[test]
    fn plain_text_run() {
        let img = renderer().render_to_image("ab").unwrap();
        assert_eq!((img.width, img.height), (12, 10));
        assert_eq!(img.baseline, 10);
    }

    #[test]
    fn braced_group_renders_like_bare_text() {
        let r = renderer();
        let grouped = r.render_to_image("{ab}").unwrap();
        let bare = r.render_to_image("ab").unwrap();
        assert_eq!(grouped, bare);
    }

    #[test]
    fn subscript_geometry() {
        // Base glyph 6x10 on baseline 10; subscript at 0.6 scale is 6 tall.
        let img = renderer().render_to_image("x_{2}").unwrap();
        assert_eq!(img.height, 16);
        assert_eq!(img.baseline, 10);
        assert_eq!(img.advance_height, 6);
    }

    #[test]
    fn color_scope_ends_at_brace() {
        let img = renderer().render_to_image("\\red{a}b").unwrap();
        assert_eq!((img.width, img.height), (12, 10));
        assert_eq!(img.pixel(0, 0)[..3], [255, 0, 0]);
        assert_eq!(img.pixel(6, 0)[..3], [255, 255, 255]);
    }

    #[test]
    fn color_tilde_applies_to_rest() {
        let img = renderer().render_to_image("\\red~ab").unwrap();
        assert_eq!(img.pixel(0, 0)[..3], [255, 0, 0]);
        assert_eq!(img.pixel(6, 0)[..3], [255, 0, 0]);
    }

    #[test]
    fn invalid_rotate_angle_renders_unrotated() {
        let r = renderer();
        let rotated = r.render_to_image("\\rotatebox{abc}{a}").unwrap();
        let plain = r.render_to_image("a").unwrap();
        assert_eq!(rotated, plain);
    }

    #[test]
    fn eval_inserts_result() {
        let r = renderer();
        assert_eq!(
            r.render_to_image("\\eval(2+3)").unwrap(),
            r.render_to_image("5").unwrap()
        );
    }

    #[test]
    fn unknown_directive_skips_to_argument() {
        let r = renderer();
        assert_eq!(
            r.render_to_image("\\unknowndirective{a}").unwrap(),
            r.render_to_image("a").unwrap()
        );
    }

    #[test]
    fn unknown_directive_without_argument_clears() {
        let img = renderer().render_to_image("\\zzz").unwrap();
        assert!(img.is_empty());
    }

    #[test]
    fn missing_glyph_is_skipped() {
        // BlockFace has no '?' glyph.
        let r = renderer();
        assert_eq!(
            r.render_to_image("a?b").unwrap(),
            r.render_to_image("ab").unwrap()
        );
    }

    #[test]
    fn recursion_limit_is_an_error() {
        let mut r = renderer();
        r.set_max_depth(2);
        assert!(matches!(
            r.render_to_image("{{{a}}}"),
            Err(RenderError::RecursionLimit(2))
        ));
        assert!(r.render_to_image("{{a}}").is_ok());
    }

    #[test]
    fn newline_stacks_lines() {
        let img = renderer().render_to_image("a\\nb").unwrap();
        assert_eq!((img.width, img.height), (6, 20));
        assert_eq!(img.baseline, 20);
    }

    #[test]
    fn newline_with_spacing() {
        let img = renderer().render_to_image("a\\n[3]b").unwrap();
        assert_eq!(img.height, 23);
    }
}
