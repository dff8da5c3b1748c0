use std::collections::HashMap;

use crate::assets::color::ColorRgba8;
use crate::foundation::error::{StoryError, StoryResult};
use crate::text::font::{FontFace, ResolvedFont};

/// Advance of a non-space character in the built-in face, relative to the font size.
pub const BUILTIN_ADVANCE: f32 = 0.55;
/// Advance of a whitespace character in the built-in face, relative to the font size.
pub const BUILTIN_SPACE_ADVANCE: f32 = 0.3;

/// Pixel width of a string in a given font.
pub trait MeasureText {
    fn measure(&mut self, text: &str, font: &ResolvedFont) -> f32;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl From<ColorRgba8> for TextBrushRgba8 {
    fn from(c: ColorRgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Width of `text` in the built-in face.
pub fn builtin_width(text: &str, size_px: f32) -> f32 {
    text.chars()
        .map(|c| {
            if c.is_whitespace() {
                BUILTIN_SPACE_ADVANCE
            } else {
                BUILTIN_ADVANCE
            }
        })
        .sum::<f32>()
        * size_px
}

/// Stateful helper for shaping, measuring and drawing single-line text runs.
///
/// Fonts are registered with Parley once per face; vello font handles are cached the same way.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    families: HashMap<u64, String>,
    vello_fonts: HashMap<u64, vello_cpu::peniko::FontData>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TextLayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextLayoutEngine")
            .field("registered_faces", &self.families.len())
            .finish()
    }
}

impl TextLayoutEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
            vello_fonts: HashMap::new(),
        }
    }

    fn family_for(&mut self, data: &[u8], fingerprint: u64) -> StoryResult<String> {
        if let Some(name) = self.families.get(&fingerprint) {
            return Ok(name.clone());
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(data.to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| StoryError::render("no font families registered from font bytes"))?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| StoryError::render("registered font family has no name"))?
            .to_string();

        self.families.insert(fingerprint, name.clone());
        Ok(name)
    }

    /// Shape `text` on a single unbounded line.
    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        data: &[u8],
        fingerprint: u64,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> StoryResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(StoryError::render("text size must be finite and > 0"));
        }
        let family = self.family_for(data, fingerprint)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }

    /// Draw one run of text with its top-left corner at `(x, y_top)`.
    pub fn draw_text(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &str,
        font: &ResolvedFont,
        x: f64,
        y_top: f64,
        color: ColorRgba8,
    ) -> StoryResult<()> {
        let size = font.size_px();
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));

        let FontFace::Loaded {
            data, fingerprint, index, ..
        } = &font.face
        else {
            draw_builtin_boxes(ctx, text, size, x, y_top);
            return Ok(());
        };

        let layout = self.layout_line(text, data, *fingerprint, size, color.into())?;
        let vello_font = self
            .vello_fonts
            .entry(*fingerprint)
            .or_insert_with(|| {
                vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(data.to_vec()),
                    *index,
                )
            })
            .clone();

        ctx.set_transform(vello_cpu::kurbo::Affine::translate((x, y_top)));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let mut pen_x = run.offset();
                let pen_y = run.baseline();
                let glyphs: Vec<vello_cpu::Glyph> = run
                    .glyphs()
                    .map(|g| {
                        let out = vello_cpu::Glyph {
                            id: g.id,
                            x: pen_x + g.x,
                            y: pen_y - g.y,
                        };
                        pen_x += g.advance;
                        out
                    })
                    .collect();
                ctx.glyph_run(&vello_font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs.into_iter());
            }
        }
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(())
    }
}

impl MeasureText for TextLayoutEngine {
    fn measure(&mut self, text: &str, font: &ResolvedFont) -> f32 {
        let size = font.size_px();
        let FontFace::Loaded {
            data, fingerprint, ..
        } = &font.face
        else {
            return builtin_width(text, size);
        };

        match self.layout_line(text, data, *fingerprint, size, TextBrushRgba8::default()) {
            Ok(layout) => layout.full_width(),
            Err(e) => {
                tracing::warn!(error = %e, family = %font.key.family, "measuring with built-in metrics");
                builtin_width(text, size)
            }
        }
    }
}

/// Built-in face: one filled box per visible character.
fn draw_builtin_boxes(ctx: &mut vello_cpu::RenderContext, text: &str, size: f32, x: f64, y_top: f64) {
    let s = f64::from(size);
    let mut pen = x;
    for c in text.chars() {
        if c.is_whitespace() {
            pen += f64::from(BUILTIN_SPACE_ADVANCE) * s;
            continue;
        }
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            pen + 0.06 * s,
            y_top + 0.2 * s,
            pen + 0.49 * s,
            y_top + 0.9 * s,
        ));
        pen += f64::from(BUILTIN_ADVANCE) * s;
    }
}
