//! Procedural hand-drawn underlines: pencil, marker and brush.
//!
//! Stroke jitter comes from a ChaCha generator seeded with the stroke's coordinates, so the same
//! phrase position always produces the same stroke regardless of call order.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::assets::color::ColorRgba8;
use crate::foundation::core::{BezPath, Canvas, Point, Rect};
use crate::foundation::error::StoryResult;
use crate::foundation::math::seed_from_coords;
use crate::render::layer::{VectorLayer, bezpath_to_cpu};
use crate::template::model::{UnderlineConfig, UnderlineStyle};
use crate::text::wrap::strip_punct;

/// Position of one drawn word, in whole canvas pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordBox {
    pub word: String,
    pub x: i64,
    /// Top of the text line.
    pub y: i64,
    pub width: i64,
    /// Font size of the line.
    pub height: i64,
}

/// Horizontal extent and baseline of a located phrase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhraseSpan {
    pub x_start: i64,
    pub x_end: i64,
    pub y_baseline: i64,
}

/// First run of consecutive words that equals `phrase`, ignoring case and surrounding
/// punctuation. Later occurrences on the same line are not reported.
pub fn locate_phrase(words: &[WordBox], phrase: &str) -> Option<PhraseSpan> {
    let wanted: Vec<String> = phrase
        .split_whitespace()
        .map(|w| strip_punct(&w.to_lowercase()).to_owned())
        .collect();
    if wanted.is_empty() || wanted.len() > words.len() {
        return None;
    }

    let start = words.windows(wanted.len()).position(|window| {
        window
            .iter()
            .zip(&wanted)
            .all(|(wb, w)| strip_punct(&wb.word.to_lowercase()) == w.as_str())
    })?;

    let first = &words[start];
    let last = &words[start + wanted.len() - 1];
    Some(PhraseSpan {
        x_start: first.x,
        x_end: last.x + last.width,
        y_baseline: first.y + first.height,
    })
}

/// One straight piece of a polyline stroke.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeSegment {
    pub from: Point,
    pub to: Point,
    pub width: f64,
}

/// Resolved underline geometry in canvas coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum UnderlineShape {
    Strokes(Vec<StrokeSegment>),
    RoundedBox { rect: Rect, radius: f64 },
}

impl UnderlineShape {
    /// Conservative bounds including stroke width.
    pub fn bounds(&self) -> Rect {
        match self {
            Self::RoundedBox { rect, .. } => *rect,
            Self::Strokes(segments) => {
                let mut out: Option<Rect> = None;
                for s in segments {
                    let r = Rect::from_points(s.from, s.to).inflate(s.width, s.width);
                    out = Some(out.map_or(r, |o| o.union(r)));
                }
                out.unwrap_or(Rect::ZERO)
            }
        }
    }
}

/// Geometry for `style` under `span`. `font_size` sizes the marker box.
pub fn underline_shape(
    style: UnderlineStyle,
    span: PhraseSpan,
    cfg: &UnderlineConfig,
    font_size: i64,
) -> UnderlineShape {
    match style {
        UnderlineStyle::Pencil => UnderlineShape::Strokes(pencil_segments(span, cfg)),
        UnderlineStyle::Marker => marker_box(span, cfg, font_size),
        UnderlineStyle::Brush => UnderlineShape::Strokes(brush_segments(span, cfg)),
    }
}

fn pencil_segments(span: PhraseSpan, cfg: &UnderlineConfig) -> Vec<StrokeSegment> {
    let y_base = (span.y_baseline + 6) as f64;
    let passes = i64::from(cfg.passes);
    let width = f64::from(cfg.thickness);
    let mut out = Vec::new();

    for p in 0..passes {
        let y_off = (p * 2 - (passes - 1)) as f64;
        let mut rng = ChaCha8Rng::seed_from_u64(seed_from_coords(&[span.x_start, span.y_baseline, p]));

        let mut points = Vec::new();
        let mut x = span.x_start - 4;
        while x <= span.x_end + 4 {
            let xf = x as f64;
            let wave = (xf * cfg.wave_frequency).sin() * cfg.wave_amplitude;
            let jitter = rng.gen_range(-1.2..=1.2);
            points.push(Point::new(xf, y_base + wave + jitter + y_off));
            x += 3;
        }
        out.extend(
            points
                .windows(2)
                .map(|w| StrokeSegment { from: w[0], to: w[1], width }),
        );
    }
    out
}

fn brush_segments(span: PhraseSpan, cfg: &UnderlineConfig) -> Vec<StrokeSegment> {
    let y_base = (span.y_baseline + 4) as f64;
    let passes = i64::from(cfg.passes);
    let thickness = f64::from(cfg.thickness);
    // One generator for the whole stroke; passes continue its sequence.
    let mut rng = ChaCha8Rng::seed_from_u64(seed_from_coords(&[span.x_start, span.y_baseline]));
    let mut out = Vec::new();

    for p in 0..passes {
        let y_off = ((p - passes / 2) * 3) as f64;
        let mut points = Vec::new();
        let mut x = span.x_start - 8;
        while x <= span.x_end + 8 {
            let xf = x as f64;
            let wave = (xf * cfg.wave_frequency * 0.7).sin() * (cfg.wave_amplitude * 1.5);
            let jitter = rng.gen_range(-2.0..=2.0);
            points.push(Point::new(xf, y_base + wave + jitter + y_off));
            x += 4;
        }

        let last = points.len().saturating_sub(1).max(1) as f64;
        out.extend(points.windows(2).enumerate().map(|(i, w)| {
            let t = i as f64 / last;
            let factor = 1.0 - 0.4 * (t - 0.5).abs() * 2.0;
            StrokeSegment {
                from: w[0],
                to: w[1],
                width: (thickness * factor).trunc().max(2.0),
            }
        }));
    }
    out
}

fn marker_box(span: PhraseSpan, cfg: &UnderlineConfig, font_size: i64) -> UnderlineShape {
    let mut rng = ChaCha8Rng::seed_from_u64(seed_from_coords(&[span.x_start, span.y_baseline]));
    let j1: i64 = rng.gen_range(2..=6);
    let j3: i64 = rng.gen_range(2..=6);
    let j2: i64 = rng.gen_range(-2..=2);
    let j4: i64 = rng.gen_range(-2..=2);

    let y_top = span.y_baseline - font_size + cfg.marker_y_offset;
    let y_bottom = y_top + font_size + cfg.marker_height;
    UnderlineShape::RoundedBox {
        rect: Rect::new(
            (span.x_start - j1) as f64,
            (y_top + j2) as f64,
            (span.x_end + j3) as f64,
            (y_bottom + j4) as f64,
        ),
        radius: 4.0,
    }
}

/// Draw `shape` in `color` onto the canvas through an isolated overlay.
///
/// The shape is painted opaque and the color's alpha is applied once at composite time, so
/// overlapping segments of the same stroke do not darken each other.
pub fn draw_underline(
    canvas_px: &mut [u8],
    canvas: Canvas,
    shape: &UnderlineShape,
    color: ColorRgba8,
) -> StoryResult<()> {
    if color.a == 0 {
        return Ok(());
    }
    let Some(mut layer) = VectorLayer::covering(shape.bounds().inflate(2.0, 2.0), canvas)? else {
        return Ok(());
    };
    layer.reset_transform();

    let ctx = layer.ctx();
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(color.r, color.g, color.b, 255));
    match shape {
        UnderlineShape::RoundedBox { rect, radius } => {
            let rr = kurbo::RoundedRect::from_rect(*rect, *radius);
            ctx.fill_path(&bezpath_to_cpu(&kurbo::Shape::to_path(&rr, 0.1)));
        }
        UnderlineShape::Strokes(segments) => {
            for s in segments {
                let mut path = BezPath::new();
                path.move_to(s.from);
                path.line_to(s.to);
                ctx.set_stroke(vello_cpu::kurbo::Stroke::new(s.width));
                ctx.stroke_path(&bezpath_to_cpu(&path));
            }
        }
    }

    layer.composite_onto(canvas_px, canvas, f32::from(color.a) / 255.0)
}

#[cfg(test)]
#[path = "../../tests/unit/render/underline.rs"]
mod tests;
