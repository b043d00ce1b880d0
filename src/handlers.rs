//! Directive handlers.
//!
//! One function per directive family, dispatched by an exhaustive `match`
//! over [`DirectiveKind`]. Handlers consume their arguments off the front
//! of the expression buffer; anything malformed degrades into a no-op
//! rather than an error, so one bad directive never takes down the whole
//! expression.

use chrono::{Datelike, Local, NaiveDate};

use crate::canvas::{Axis, Canvas, ImagePosition};
use crate::directives::{
    find_letter, Alphabet, ArrayStyle, BezierOrder, ColorSpec, DirectiveKind, FracStyle,
    OverlayStyle, CYRILLIC, GREEK,
};
use crate::eval;
use crate::glyph::rasterize_character;
use crate::parser::{self, RenderEnv, Renderer};
use crate::{Color, FontStyle, RenderError};

pub(crate) fn dispatch(
    r: &Renderer,
    kind: DirectiveKind,
    expr: &mut String,
    acc: &mut Canvas,
    env: &RenderEnv,
    depth: usize,
) -> Result<(), RenderError> {
    match kind {
        DirectiveKind::Frac(style) => rast_frac(r, style, expr, acc, env, depth),
        DirectiveKind::Overlay(style) => rast_overlay(r, style, expr, acc, env, depth),
        DirectiveKind::Array(style) => rast_array(r, style, expr, acc, env, depth),
        DirectiveKind::Picture => rast_picture(r, expr, acc, env, depth),
        DirectiveKind::Line => rast_line(expr, acc, env),
        DirectiveKind::Bezier(order) => rast_bezier(order, expr, acc, env),
        DirectiveKind::Raise => rast_raise(r, expr, acc, env, depth),
        DirectiveKind::Rotate => rast_rotate(r, expr, acc, env, depth),
        DirectiveKind::Magnify => rast_magnify(r, expr, acc, env, depth),
        DirectiveKind::Reflect => rast_reflect(r, expr, acc, env, depth),
        DirectiveKind::Eval => rast_eval(expr),
        DirectiveKind::Today => rast_today(r, acc, env, depth),
        DirectiveKind::Newline => rast_newline(r, expr, acc, env, depth),
        DirectiveKind::Translit(alphabet) => rast_translit(r, alphabet, expr, acc, env),
        DirectiveKind::Weight(style) => rast_weight(r, style, expr, acc, env, depth),
        DirectiveKind::Color(spec) => rast_color(r, spec, expr, acc, env, depth),
        DirectiveKind::MathFunc(name) => {
            expr.insert_str(0, name);
            Ok(())
        }
        DirectiveKind::GreekLetter(code) => rast_grchar(r, code, expr, acc, env, depth),
        DirectiveKind::Reserved => Ok(()),
    }
}

fn brace_arg(expr: &mut String) -> String {
    parser::scan_delimited(expr, '{', '}', false)
}

fn paren_arg(expr: &mut String) -> String {
    parser::scan_delimited(expr, '(', ')', false)
}

fn all_in(s: &str, set: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| set.contains(c))
}

fn parse_point(s: &str) -> Option<(i32, i32)> {
    let (x, y) = s.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

/// Stacks numerator over denominator with one row of spacing; `\frac` and
/// `\over` draw the separator line through that row.
fn rast_frac(
    r: &Renderer,
    style: FracStyle,
    expr: &mut String,
    acc: &mut Canvas,
    env: &RenderEnv,
    depth: usize,
) -> Result<(), RenderError> {
    let mut numer = brace_arg(expr);
    if numer.is_empty() {
        return Ok(());
    }
    let mut denom = brace_arg(expr);
    if denom.is_empty() {
        return Ok(());
    }

    let numer_img = r.parse(&mut numer, env, depth + 1)?;
    let denom_img = r.parse(&mut denom, env, depth + 1)?;
    if numer_img.is_empty() || denom_img.is_empty() {
        return Ok(());
    }

    let numer_height = numer_img.height as i32;
    let mut stacked = Canvas::concat_pair(&numer_img, &denom_img, ImagePosition::Bottom, 1);

    match style {
        FracStyle::Normal | FracStyle::Over => {
            stacked.draw_line(
                0,
                numer_height - 1,
                stacked.width as i32,
                numer_height - 1,
                env.color,
            );
        }
        FracStyle::Atop | FracStyle::Choose => {}
    }

    acc.concat(stacked, ImagePosition::Right, 0);
    Ok(())
}

fn rast_overlay(
    r: &Renderer,
    style: OverlayStyle,
    expr: &mut String,
    acc: &mut Canvas,
    env: &RenderEnv,
    depth: usize,
) -> Result<(), RenderError> {
    match style {
        OverlayStyle::Slash | OverlayStyle::DiagLine | OverlayStyle::HorLine => {
            let mut sub = brace_arg(expr);
            if sub.is_empty() {
                return Ok(());
            }
            let mut image = r.parse(&mut sub, env, depth + 1)?;

            let (w, h) = (image.width as i32, image.height as i32);
            match style {
                OverlayStyle::DiagLine => image.draw_line(0, h - 1, w - 1, 0, env.color),
                OverlayStyle::HorLine => image.draw_line(0, h / 2, w, h / 2, env.color),
                // The slash overlay is an unfinished extension point; the
                // operand renders bare.
                _ => {}
            }

            acc.concat(image, ImagePosition::Right, 0);
        }
        OverlayStyle::Compose => {
            let mut first = brace_arg(expr);
            if first.is_empty() {
                return Ok(());
            }
            let mut second = brace_arg(expr);
            if second.is_empty() {
                return Ok(());
            }

            let a = r.parse(&mut first, env, depth + 1)?;
            let b = r.parse(&mut second, env, depth + 1)?;

            let baseline = a.baseline.max(b.baseline);
            let mut combined = Canvas::new(
                a.width.max(b.width),
                a.height.max(b.height),
                a.channels.max(b.channels),
            );
            combined.baseline = baseline;
            combined.overlay(&a, 0, baseline - a.baseline);
            combined.overlay(&b, 0, baseline - b.baseline);

            acc.concat(combined, ImagePosition::Right, 0);
        }
    }
    Ok(())
}

/// Wraps the content in `{}` or `[]` delimiters rasterized large enough to
/// span its height; `\tabular` leaves it bare.
fn rast_array(
    r: &Renderer,
    style: ArrayStyle,
    expr: &mut String,
    acc: &mut Canvas,
    env: &RenderEnv,
    depth: usize,
) -> Result<(), RenderError> {
    let mut sub = brace_arg(expr);
    let content = r.parse(&mut sub, env, depth + 1)?;

    let (open, close) = match style {
        ArrayStyle::Braced => ('{', '}'),
        ArrayStyle::Bracketed => ('[', ']'),
        ArrayStyle::Plain => {
            acc.concat(content, ImagePosition::Right, 0);
            return Ok(());
        }
    };

    let face = r.face(env.style);
    let mut scale = env.size;
    let mut left = rasterize_character(face, scale, open, env.color);
    let mut tries = 0;
    while !left.is_empty() && left.height < content.height && tries < 8 {
        scale *= content.height as f32 / left.height as f32;
        left = rasterize_character(face, scale, open, env.color);
        tries += 1;
    }
    let right = rasterize_character(face, scale, close, env.color);

    let mut wrapped = Canvas::concat_pair(&left, &content, ImagePosition::Right, 0);
    wrapped.concat(right, ImagePosition::Right, 0);
    acc.concat(wrapped, ImagePosition::Right, 0);
    Ok(())
}

/// `\picture(w,h){(x,y){...}(x,y){...}}`: sub-expressions placed at fixed
/// offsets on a fresh canvas.
fn rast_picture(
    r: &Renderer,
    expr: &mut String,
    acc: &mut Canvas,
    env: &RenderEnv,
    depth: usize,
) -> Result<(), RenderError> {
    let dims = paren_arg(expr);
    if !all_in(&dims, "-0123456789,") {
        return Ok(());
    }
    let (width, height) = match parse_point(&dims) {
        Some(p) => p,
        None => return Ok(()),
    };

    let mut canvas = Canvas::new(width.max(0) as u32, height.max(0) as u32, 4);
    let mut body = brace_arg(expr);

    while let Some(i) = body.find('(') {
        body.replace_range(..i, "");
        let pos = parser::scan_delimited(&mut body, '(', ')', false);
        if !all_in(&pos, "-0123456789,") {
            return Ok(());
        }
        let (x, y) = match parse_point(&pos) {
            Some(p) => p,
            None => return Ok(()),
        };
        let mut sub = parser::scan_delimited(&mut body, '{', '}', false);
        let image = r.parse(&mut sub, env, depth + 1)?;
        canvas.overlay(&image, x, y);
    }

    acc.concat(canvas, ImagePosition::Right, 0);
    Ok(())
}

/// `\line(x0,y0)(x1,y1)` on a canvas just big enough for both endpoints.
fn rast_line(expr: &mut String, acc: &mut Canvas, env: &RenderEnv) -> Result<(), RenderError> {
    let first = paren_arg(expr);
    if !all_in(&first, ",0123456789") {
        return Ok(());
    }
    let second = paren_arg(expr);
    if !all_in(&second, ",0123456789") {
        return Ok(());
    }

    let ((x0, y0), (x1, y1)) = match (parse_point(&first), parse_point(&second)) {
        (Some(a), Some(b)) => (a, b),
        _ => return Ok(()),
    };

    let mut canvas = Canvas::new((x0.max(x1) + 1) as u32, (y0.max(y1) + 1) as u32, 4);
    canvas.draw_line(x0, y0, x1, y1, env.color);
    acc.concat(canvas, ImagePosition::Right, 0);
    Ok(())
}

fn lerp_point(n1: i32, n2: i32, t: f32) -> i32 {
    n1 + ((n2 - n1) as f32 * t) as i32
}

/// De Casteljau sampling at a fixed 0.01 step. Quadratic takes three
/// control points, cubic four.
fn rast_bezier(
    order: BezierOrder,
    expr: &mut String,
    acc: &mut Canvas,
    env: &RenderEnv,
) -> Result<(), RenderError> {
    let (count, charset) = match order {
        BezierOrder::Quadratic => (3, "-0123456789,"),
        BezierOrder::Cubic => (4, "0123456789,"),
    };

    let mut points = Vec::with_capacity(count);
    for _ in 0..count {
        let coord = paren_arg(expr);
        if !all_in(&coord, charset) {
            return Ok(());
        }
        match parse_point(&coord) {
            Some(p) => points.push(p),
            None => return Ok(()),
        }
    }

    let width = points.iter().map(|p| p.0).max().unwrap_or(0);
    let height = points.iter().map(|p| p.1).max().unwrap_or(0);
    let mut canvas = Canvas::new(width.max(0) as u32, height.max(0) as u32, 4);

    let mut t = 0.0f32;
    while t < 1.0 {
        let mut layer = points.clone();
        while layer.len() > 1 {
            layer = layer
                .windows(2)
                .map(|w| (lerp_point(w[0].0, w[1].0, t), lerp_point(w[0].1, w[1].1, t)))
                .collect();
        }
        let (x, y) = layer[0];
        if x >= 0 && y >= 0 && (x as u32) < canvas.width && (y as u32) < canvas.height {
            canvas.put_pixel(x as u32, y as u32, env.color);
        }
        t += 0.01;
    }

    acc.concat(canvas, ImagePosition::Right, 0);
    Ok(())
}

/// `\raisebox{n}{...}`: shifts the content's baseline by `n` rows (positive
/// lifts it).
fn rast_raise(
    r: &Renderer,
    expr: &mut String,
    acc: &mut Canvas,
    env: &RenderEnv,
    depth: usize,
) -> Result<(), RenderError> {
    let lift = brace_arg(expr);
    if lift.is_empty() {
        return Ok(());
    }
    let mut sub = brace_arg(expr);
    if sub.is_empty() {
        return Ok(());
    }
    if !all_in(&lift, "-0123456789") {
        return Ok(());
    }
    let lift: i32 = match lift.parse() {
        Ok(n) => n,
        Err(_) => return Ok(()),
    };

    let mut image = r.parse(&mut sub, env, depth + 1)?;
    if !image.is_empty() {
        image.baseline += lift;
        image.advance_height = (image.advance_height - lift.abs()).max(0);
        acc.concat(image, ImagePosition::Right, 0);
    }
    Ok(())
}

/// `\rotatebox{deg}{...}`. A non-numeric angle renders the content
/// unrotated rather than dropping it.
fn rast_rotate(
    r: &Renderer,
    expr: &mut String,
    acc: &mut Canvas,
    env: &RenderEnv,
    depth: usize,
) -> Result<(), RenderError> {
    let degrees = brace_arg(expr);
    if degrees.is_empty() {
        return Ok(());
    }
    let mut sub = brace_arg(expr);
    if sub.is_empty() {
        return Ok(());
    }

    let angle: Option<i32> = if all_in(&degrees, "-0123456789") {
        degrees.parse().ok()
    } else {
        None
    };

    let mut image = r.parse(&mut sub, env, depth + 1)?;
    if !image.is_empty() {
        if let Some(deg) = angle {
            image.rotate((deg % 360) as f64);
        }
        acc.concat(image, ImagePosition::Right, 0);
    }
    Ok(())
}

/// `\magnify{k}{...}`: integer upscale by pixel replication.
fn rast_magnify(
    r: &Renderer,
    expr: &mut String,
    acc: &mut Canvas,
    env: &RenderEnv,
    depth: usize,
) -> Result<(), RenderError> {
    let factor = brace_arg(expr);
    if !all_in(&factor, "0123456789") {
        return Ok(());
    }
    let mut sub = brace_arg(expr);
    if sub.is_empty() {
        return Ok(());
    }
    let factor: u32 = match factor.parse() {
        Ok(n) => n,
        Err(_) => return Ok(()),
    };

    let mut image = r.parse(&mut sub, env, depth + 1)?;
    image.scale_up(factor);
    acc.concat(image, ImagePosition::Right, 0);
    Ok(())
}

/// `\reflectbox[x|y]{...}`: mirrors the content; the axis defaults to
/// horizontal when the optional argument is absent or unrecognized.
fn rast_reflect(
    r: &Renderer,
    expr: &mut String,
    acc: &mut Canvas,
    env: &RenderEnv,
    depth: usize,
) -> Result<(), RenderError> {
    let axis = if expr.starts_with('[') {
        parser::scan_delimited(expr, '[', ']', false)
    } else {
        String::new()
    };
    let mut sub = brace_arg(expr);
    if sub.is_empty() {
        return Ok(());
    }

    let mut image = r.parse(&mut sub, env, depth + 1)?;
    match axis.chars().next() {
        Some('y') => image.flip(Axis::Y),
        _ => image.flip(Axis::X),
    }
    acc.concat(image, ImagePosition::Right, 0);
    Ok(())
}

/// `\eval(...)`: the integer result is spliced back into the expression
/// stream and rendered as ordinary text.
fn rast_eval(expr: &mut String) -> Result<(), RenderError> {
    let sub = paren_arg(expr);
    if sub.is_empty() {
        return Ok(());
    }
    expr.insert_str(0, &eval::evaluate(&sub).to_string());
    Ok(())
}

const DAY_NAMES: [&str; 7] = [
    "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
];

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

pub(crate) fn format_date(date: NaiveDate) -> String {
    format!(
        "{}, {} {}, {}",
        DAY_NAMES[date.weekday().num_days_from_sunday() as usize],
        MONTH_NAMES[date.month0() as usize],
        date.day(),
        date.year()
    )
}

fn rast_today(
    r: &Renderer,
    acc: &mut Canvas,
    env: &RenderEnv,
    depth: usize,
) -> Result<(), RenderError> {
    let mut text = format_date(Local::now().date_naive());
    let image = r.parse(&mut text, env, depth + 1)?;
    acc.concat(image, ImagePosition::Right, 0);
    Ok(())
}

/// `\n` / `\\` with an optional `[spacing]`: everything after the break
/// renders as its own line concatenated below.
fn rast_newline(
    r: &Renderer,
    expr: &mut String,
    acc: &mut Canvas,
    env: &RenderEnv,
    depth: usize,
) -> Result<(), RenderError> {
    if acc.is_empty() || expr.is_empty() {
        return Ok(());
    }

    let mut spacing = 0u32;
    if expr.starts_with('[') {
        let arg = parser::scan_delimited(expr, '[', ']', false);
        if all_in(&arg, "0123456789") {
            if let Ok(n) = arg.parse() {
                spacing = n;
            }
        }
    }

    let rest = r.parse(expr, env, depth + 1)?;
    acc.concat(rest, ImagePosition::Bottom, spacing);
    Ok(())
}

/// `\cyr{...}` / `\greek{...}`: Latin text transliterated glyph by glyph,
/// longest sequence first. Unmapped characters are dropped.
fn rast_translit(
    r: &Renderer,
    alphabet: Alphabet,
    expr: &mut String,
    acc: &mut Canvas,
    env: &RenderEnv,
) -> Result<(), RenderError> {
    let table = match alphabet {
        Alphabet::Cyrillic => CYRILLIC,
        Alphabet::Greek => GREEK,
    };

    let mut sub = brace_arg(expr);
    if sub.is_empty() {
        return Ok(());
    }

    let mut text = Canvas::empty();
    while !sub.is_empty() {
        match find_letter(table, &sub) {
            Some((seq, code)) => {
                sub.replace_range(..seq.len(), "");
                if let Some(ch) = char::from_u32(code) {
                    let glyph = rasterize_character(r.face(env.style), env.size, ch, env.color);
                    text.concat(glyph, ImagePosition::Right, 0);
                }
            }
            None => {
                sub.remove(0);
            }
        }
    }

    acc.concat(text, ImagePosition::Right, 0);
    Ok(())
}

fn rast_weight(
    r: &Renderer,
    style: FontStyle,
    expr: &mut String,
    acc: &mut Canvas,
    env: &RenderEnv,
    depth: usize,
) -> Result<(), RenderError> {
    let mut sub = brace_arg(expr);
    if sub.is_empty() {
        return Ok(());
    }
    let image = r.parse(&mut sub, &env.with_style(style), depth + 1)?;
    acc.concat(image, ImagePosition::Right, 0);
    Ok(())
}

/// Color directives: a brace argument scopes the color to its content, a
/// `~` applies it to the rest of the expression. `\gradient` recolors the
/// rendered content with a horizontal ramp instead.
fn rast_color(
    r: &Renderer,
    spec: ColorSpec,
    expr: &mut String,
    acc: &mut Canvas,
    env: &RenderEnv,
    depth: usize,
) -> Result<(), RenderError> {
    if spec == ColorSpec::Gradient {
        let start = brace_arg(expr);
        if start.is_empty() {
            return Ok(());
        }
        let stop = brace_arg(expr);
        if stop.is_empty() {
            return Ok(());
        }
        let (start, stop) = match (Color::from_hex(&start), Color::from_hex(&stop)) {
            (Some(a), Some(b)) => (a, b),
            _ => return Ok(()),
        };

        let mut arg = if expr.starts_with('~') {
            let rest = expr[1..].to_string();
            expr.clear();
            rest
        } else {
            let arg = brace_arg(expr);
            if arg.is_empty() {
                return Ok(());
            }
            arg
        };

        let mut image = r.parse(&mut arg, env, depth + 1)?;
        image.gradient(start, stop);
        acc.concat(image, ImagePosition::Right, 0);
        return Ok(());
    }

    let color = match spec {
        ColorSpec::Custom => {
            let hex = brace_arg(expr);
            if hex.is_empty() {
                return Ok(());
            }
            match Color::from_hex(&hex) {
                Some(c) => c,
                None => return Ok(()),
            }
        }
        ColorSpec::Named(rgb) => Color::from_rgb(rgb, 255),
        ColorSpec::Gradient => return Ok(()),
    };

    let mut arg = if expr.starts_with('~') {
        let rest = expr[1..].to_string();
        expr.clear();
        rest
    } else {
        let arg = brace_arg(expr);
        if arg.is_empty() {
            return Ok(());
        }
        arg
    };

    let image = r.parse(&mut arg, &env.with_color(color), depth + 1)?;
    acc.concat(image, ImagePosition::Right, 0);
    Ok(())
}

/// A single Greek codepoint glyph; a script group right after it attaches
/// to the glyph, not the line.
fn rast_grchar(
    r: &Renderer,
    code: u32,
    expr: &mut String,
    acc: &mut Canvas,
    env: &RenderEnv,
    depth: usize,
) -> Result<(), RenderError> {
    let ch = match char::from_u32(code) {
        Some(c) => c,
        None => return Ok(()),
    };

    let mut glyph = rasterize_character(r.face(env.style), env.size, ch, env.color);
    if expr.starts_with('_') || expr.starts_with('^') {
        rast_scripts(r, expr, &mut glyph, env, depth)?;
    }
    acc.concat(glyph, ImagePosition::Right, 0);
    Ok(())
}

/// Script composition. Sub- and superscript render at 0.6 of the ambient
/// size; the combined canvas puts the superscript flush with the top, the
/// subscript flush with the bottom, and sets its baseline so that
/// concatenation onto the base leaves the base's own baseline where it was.
pub(crate) fn rast_scripts(
    r: &Renderer,
    expr: &mut String,
    base: &mut Canvas,
    env: &RenderEnv,
    depth: usize,
) -> Result<(), RenderError> {
    if expr.is_empty() {
        return Ok(());
    }

    let scripts = parser::tex_scripts(expr);
    if scripts.sub.is_empty() && scripts.sup.is_empty() {
        return Ok(());
    }

    let script_env = env.with_size(env.size * 0.6);

    let mut sub_img = Canvas::empty();
    if !scripts.sub.is_empty() {
        let mut source = scripts.sub;
        sub_img = r.parse(&mut source, &script_env, depth + 1)?;
    }
    let mut sup_img = Canvas::empty();
    if !scripts.sup.is_empty() {
        let mut source = scripts.sup;
        sup_img = r.parse(&mut source, &script_env, depth + 1)?;
    }

    let width = sub_img.width.max(sup_img.width);
    let height = (base.height as i32 - base.advance_height)
        + sub_img.height as i32
        + sup_img.height as i32;

    let mut combined = Canvas::new(width, height.max(0) as u32, 4);
    combined.baseline = height - sub_img.height as i32;
    if sub_img.height > 0 {
        combined.advance_height += sub_img.height as i32;
    }

    combined.overlay(&sup_img, 0, 0);
    combined.overlay(&sub_img, 0, height - sub_img.height as i32);

    base.concat(combined, ImagePosition::Right, 0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::tests::BlockFace;
    use std::sync::Arc;

    fn renderer() -> Renderer {
        let mut r = Renderer::new(Arc::new(BlockFace));
        r.set_font_size(10.0);
        r
    }

    #[test]
    fn frac_stacks_with_separator_row() {
        // Numerator and denominator are each 6x10; one spacing row between.
        let img = renderer().render_to_image("\\frac{1}{2}").unwrap();
        assert_eq!((img.width, img.height), (6, 21));
        assert_eq!(img.baseline, 21);
    }

    #[test]
    fn atop_matches_frac_geometry() {
        let r = renderer();
        let frac = r.render_to_image("\\frac{1}{2}").unwrap();
        let atop = r.render_to_image("\\atop{1}{2}").unwrap();
        assert_eq!((frac.width, frac.height), (atop.width, atop.height));
    }

    #[test]
    fn frac_missing_argument_is_noop() {
        let img = renderer().render_to_image("\\frac{1}{}").unwrap();
        assert!(img.is_empty());
    }

    #[test]
    fn strikeout_keeps_operand_dimensions() {
        let r = renderer();
        let struck = r.render_to_image("\\sout{ab}").unwrap();
        let plain = r.render_to_image("ab").unwrap();
        assert_eq!((struck.width, struck.height), (plain.width, plain.height));
    }

    #[test]
    fn compose_overlays_on_shared_baseline() {
        let img = renderer().render_to_image("\\compose{a}{b}").unwrap();
        assert_eq!((img.width, img.height), (6, 10));
        assert_eq!(img.baseline, 10);
    }

    #[test]
    fn array_wraps_in_scaled_delimiters() {
        // Content 12x10 plus a 6-wide bracket on each side.
        let img = renderer().render_to_image("\\array{ab}").unwrap();
        assert_eq!((img.width, img.height), (24, 10));
    }

    #[test]
    fn picture_places_at_offsets() {
        let img = renderer()
            .render_to_image("\\picture(20,12){(2,2){a}}")
            .unwrap();
        assert_eq!((img.width, img.height), (20, 12));
        assert_eq!(img.pixel(2, 2)[..3], [255, 255, 255]);
        assert_eq!(img.pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn line_draws_on_fitted_canvas() {
        let img = renderer().render_to_image("\\line(0,0)(5,5)").unwrap();
        assert_eq!((img.width, img.height), (6, 6));
        assert_eq!(img.pixel(0, 0)[..3], [255, 255, 255]);
        assert_eq!(img.pixel(5, 5)[..3], [255, 255, 255]);
    }

    #[test]
    fn qbezier_plots_curve_start() {
        let img = renderer()
            .render_to_image("\\qbezier(0,0)(5,10)(10,0)")
            .unwrap();
        assert_eq!((img.width, img.height), (10, 10));
        assert_eq!(img.pixel(0, 0)[..3], [255, 255, 255]);
    }

    #[test]
    fn bezier_rejects_malformed_points() {
        // The directive degrades to nothing; the unconsumed points render
        // as ordinary text.
        let r = renderer();
        let img = r.render_to_image("\\bezier(0,0)(x,1)(2,2)(3,3)").unwrap();
        assert_eq!(img, r.render_to_image("(2,2)(3,3)").unwrap());
    }

    #[test]
    fn raisebox_lifts_baseline() {
        let img = renderer().render_to_image("\\raisebox{3}{a}").unwrap();
        assert_eq!(img.baseline, 13);
    }

    #[test]
    fn magnify_replicates_pixels() {
        let r = renderer();
        let img = r.render_to_image("\\magnify{2}{a}").unwrap();
        assert_eq!((img.width, img.height), (12, 20));
        assert_eq!(img.baseline, 20);
    }

    #[test]
    fn reflect_mirrors_content() {
        // Red block then white block; mirrored across X the order flips.
        let img = renderer()
            .render_to_image("\\reflectbox[x]{\\red{a}b}")
            .unwrap();
        // Column 10 held white ink, column 0 red ink; both flip across.
        assert_eq!(img.pixel(1, 0)[..3], [255, 255, 255]);
        assert_eq!(img.pixel(11, 0)[..3], [255, 0, 0]);
    }

    #[test]
    fn gradient_recolors_endpoints() {
        let img = renderer()
            .render_to_image("\\gradient{ff0000}{0000ff}{ab}")
            .unwrap();
        assert_eq!(img.pixel(0, 0)[..3], [255, 0, 0]);
        assert_eq!(img.pixel(11, 0)[..3], [0, 0, 255]);
    }

    #[test]
    fn translit_renders_longest_sequences() {
        let r = renderer();
        // "shch" collapses to one glyph, "ab" to two.
        let one = r.render_to_image("\\cyr{shch}").unwrap();
        assert_eq!((one.width, one.height), (6, 10));
        let two = r.render_to_image("\\greek{ab}").unwrap();
        assert_eq!((two.width, two.height), (12, 10));
    }

    #[test]
    fn mathfunc_inserts_name_as_text() {
        let r = renderer();
        assert_eq!(
            r.render_to_image("\\sin").unwrap(),
            r.render_to_image("sin").unwrap()
        );
        // \sinh matches \sin first; the trailing h renders right after.
        assert_eq!(
            r.render_to_image("\\sinh").unwrap(),
            r.render_to_image("sinh").unwrap()
        );
    }

    #[test]
    fn greek_letter_takes_scripts() {
        let img = renderer().render_to_image("\\alpha_{2}").unwrap();
        assert_eq!(img.height, 16);
        assert_eq!(img.baseline, 10);
    }

    #[test]
    fn superscript_geometry() {
        let img = renderer().render_to_image("x^{2}").unwrap();
        assert_eq!(img.height, 16);
        assert_eq!(img.baseline, 16);
        assert_eq!(img.advance_height, 0);
    }

    #[test]
    fn both_scripts_geometry() {
        let img = renderer().render_to_image("x_{a}^{b}").unwrap();
        // 10 base + 6 sub + 6 sup.
        assert_eq!(img.height, 22);
        assert_eq!(img.baseline, 16);
        assert_eq!(img.advance_height, 6);
    }

    #[test]
    fn date_formatting() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(format_date(date), "Monday, January 15, 2024");
        let date = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        assert_eq!(format_date(date), "Sunday, August 30, 2026");
    }
}
