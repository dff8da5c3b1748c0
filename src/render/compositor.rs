//! Frame compositing: background, overlay, then every resolved slot in z-order.

use std::io::Cursor;
use std::sync::Arc;

use crate::assets::color::ColorRgba8;
use crate::assets::decode::{PreparedImage, PreparedSvg, unpremultiply_rgba8_in_place};
use crate::assets::svg_raster::{
    MAX_RASTER_DIM, SvgRegion, rasterize_svg_region_to_premul_rgba8,
};
use crate::foundation::core::{Canvas, PixelRect, Rect};
use crate::foundation::error::{StoryError, StoryResult};
use crate::layout::grid::{ContentMetrics, GridConfig, HAlign, ImageMode, LayoutSlot, SlotType, VAlign};
use crate::layout::resolve::{ResolvedSlot, paint_order, resolve_layout};
use crate::render::blur::blur_sigma;
use crate::render::composite::{over, over_at, over_in_place, scale_alpha_in_place};
use crate::render::layer::VectorLayer;
use crate::render::raster::{
    SHADOW_PAD, contain_size, cover_crop, drop_shadow, fit_within, round_corners,
};
use crate::render::underline::{WordBox, draw_underline, locate_phrase, underline_shape};
use crate::template::model::{GradientDirection, StoryTemplate};
use crate::text::engine::{MeasureText, TextLayoutEngine};
use crate::text::font::{FontResolver, ResolvedFont, WEIGHT_BOLD, WEIGHT_REGULAR};
use crate::text::wrap::{WrappedLine, wrap_text};

/// Gaussian sigma of the full-canvas background blur.
pub const BACKGROUND_BLUR: f32 = 25.0;

/// Secondary decorative element.
#[derive(Clone, Debug)]
pub enum GraphicSource {
    Raster(PreparedImage),
    /// Rasterized at the fitted slot size.
    Svg(PreparedSvg),
}

/// Everything one frame needs besides the template.
#[derive(Clone, Copy, Debug)]
pub struct RenderInputs<'a> {
    /// Primary image: blurred background and the content of image slots.
    pub image: &'a PreparedImage,
    pub body: &'a [WrappedLine],
    pub title: Option<&'a [WrappedLine]>,
    pub graphic: Option<&'a GraphicSource>,
}

/// A rendered frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRgba {
    /// Straight-alpha copy of the pixels.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut out);
        }
        out
    }

    /// Lossless PNG encoding with the alpha channel retained.
    pub fn encode_png(&self) -> StoryResult<Vec<u8>> {
        let img = image::RgbaImage::from_raw(self.width, self.height, self.to_straight_rgba())
            .ok_or_else(|| StoryError::render("frame buffer does not match its dimensions"))?;
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png)
            .map_err(|e| StoryError::render(format!("encode png: {e}")))?;
        Ok(out.into_inner())
    }
}

/// Text styling for one slot after template defaults are applied.
#[derive(Clone, Debug)]
pub struct SlotTextStyle {
    pub font: ResolvedFont,
    pub color: ColorRgba8,
    pub line_spacing: f32,
}

impl SlotTextStyle {
    /// `floor(size * line_spacing)`, at least one pixel.
    pub fn line_height(&self) -> i64 {
        ((self.font.size_px() * self.line_spacing).floor() as i64).max(1)
    }
}

/// Renders frames for one template.
///
/// The grid is fixed at construction; every call derives its own slot set from the content it
/// is given, so a composer can render any number of frames in sequence.
pub struct StoryComposer {
    template: StoryTemplate,
    grid: GridConfig,
    fonts: Arc<FontResolver>,
    text: TextLayoutEngine,
}

impl std::fmt::Debug for StoryComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryComposer")
            .field("template", &self.template.name)
            .field("format", &self.grid.format)
            .finish()
    }
}

impl StoryComposer {
    /// Composer with a default font resolver.
    pub fn new(template: StoryTemplate) -> StoryResult<Self> {
        Self::with_fonts(template, Arc::new(FontResolver::default()))
    }

    /// Composer sharing an existing font cache.
    pub fn with_fonts(template: StoryTemplate, fonts: Arc<FontResolver>) -> StoryResult<Self> {
        template.validate()?;
        let grid = template.effective_grid().into_owned();
        Ok(Self {
            template,
            grid,
            fonts,
            text: TextLayoutEngine::new(),
        })
    }

    pub fn template(&self) -> &StoryTemplate {
        &self.template
    }

    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    pub fn canvas(&self) -> Canvas {
        self.grid.canvas()
    }

    /// Font, color and spacing for a text slot, falling back to template defaults.
    pub fn text_style(&self, slot: &LayoutSlot) -> SlotTextStyle {
        let font_cfg = &self.template.font;
        let is_title = slot.slot_type == SlotType::Title;
        let size = slot
            .font_size
            .unwrap_or(if is_title { font_cfg.bold_size } else { font_cfg.size });
        let weight = slot
            .font_weight
            .unwrap_or(if is_title { WEIGHT_BOLD } else { WEIGHT_REGULAR });
        let family = slot.font_family.as_deref().unwrap_or(&font_cfg.family);

        SlotTextStyle {
            font: self.fonts.resolve(family, size, weight),
            color: slot.font_color.unwrap_or(font_cfg.color),
            line_spacing: slot.line_spacing.unwrap_or(font_cfg.line_spacing),
        }
    }

    /// Wrap body text at the template's text width using the body font.
    pub fn wrap_body(&mut self, text: &str, highlights: &[String]) -> Vec<WrappedLine> {
        let font = self.fonts.resolve(
            &self.template.font.family,
            self.template.font.size,
            WEIGHT_REGULAR,
        );
        let width = self.template.layout.text_width(self.canvas().width) as f32;
        wrap_text(text, highlights, width, &font, &mut self.text)
    }

    /// Wrap `text` against the base pixel width of the named slot, using that slot's font.
    /// `None` when the grid has no such slot.
    pub fn wrap_for_slot(
        &mut self,
        slot_name: &str,
        text: &str,
        highlights: &[String],
    ) -> Option<Vec<WrappedLine>> {
        let slot = self.grid.get_slot(slot_name)?.clone();
        let rect = self.grid.slot_pixel_rect(&slot);
        let style = self.text_style(&slot);
        Some(wrap_text(
            text,
            highlights,
            rect.width as f32,
            &style.font,
            &mut self.text,
        ))
    }

    /// Line counts per slot name for the content of one frame.
    pub fn content_metrics(&self, inputs: &RenderInputs<'_>) -> ContentMetrics {
        let mut metrics = ContentMetrics::new();
        for slot in &self.grid.slots {
            let count = match slot.slot_type {
                SlotType::Title => inputs.title.map_or(0, <[WrappedLine]>::len),
                SlotType::Body => inputs.body.len(),
                SlotType::Image => 1,
                SlotType::Graphic => usize::from(inputs.graphic.is_some()),
                SlotType::Spacer => 0,
            };
            metrics.set(slot.name.clone(), count);
        }
        metrics
    }

    /// Render one frame.
    #[tracing::instrument(skip(self, inputs), fields(template = %self.template.name, format = %self.grid.format))]
    pub fn render(&mut self, inputs: &RenderInputs<'_>) -> StoryResult<FrameRgba> {
        let canvas = self.canvas();
        let mut px = [0u8, 0, 0, 255].repeat(canvas.width as usize * canvas.height as usize);

        self.paint_background(&mut px, canvas, inputs.image)?;
        self.paint_overlay(&mut px, canvas);

        let metrics = self.content_metrics(inputs);
        let mut slots = resolve_layout(&self.grid, &metrics);
        paint_order(&mut slots);
        tracing::debug!(
            slots = ?slots.iter().map(|r| (&r.slot.name, r.rect)).collect::<Vec<_>>(),
            "resolved layout"
        );

        for resolved in &slots {
            match resolved.slot.slot_type {
                SlotType::Image => self.paint_image(&mut px, canvas, resolved, inputs.image)?,
                SlotType::Graphic => {
                    if let Some(graphic) = inputs.graphic {
                        self.paint_graphic(&mut px, canvas, resolved, graphic)?;
                    }
                }
                SlotType::Title => {
                    if let Some(lines) = inputs.title {
                        self.paint_text(&mut px, canvas, resolved, lines)?;
                    }
                }
                SlotType::Body => self.paint_text(&mut px, canvas, resolved, inputs.body)?,
                SlotType::Spacer => {}
            }
        }

        Ok(FrameRgba {
            width: canvas.width,
            height: canvas.height,
            data: px,
            premultiplied: true,
        })
    }

    /// Render pre-wrapped body lines as carousel slides.
    ///
    /// Lines are sliced into contiguous chunks of `max_lines_per_slide`; no text reflows
    /// across slides. The title and the graphic appear on the first slide only, and the title
    /// only when the grid asks for it there.
    #[tracing::instrument(skip_all, fields(template = %self.template.name, lines = body.len()))]
    pub fn render_carousel(
        &mut self,
        image: &PreparedImage,
        body: &[WrappedLine],
        title: Option<&[WrappedLine]>,
        graphic: Option<&GraphicSource>,
    ) -> StoryResult<Vec<FrameRgba>> {
        let per_slide = self.grid.max_lines_per_slide.max(1);
        let mut chunks: Vec<&[WrappedLine]> = body.chunks(per_slide).collect();
        if chunks.is_empty() {
            chunks.push(body);
        }
        let title_on_first = self.grid.carousel_title_on_first;

        let mut frames = Vec::with_capacity(chunks.len());
        for (idx, chunk) in chunks.into_iter().enumerate() {
            let first = idx == 0;
            let inputs = RenderInputs {
                image,
                body: chunk,
                title: title.filter(|_| first && title_on_first),
                graphic: graphic.filter(|_| first),
            };
            frames.push(self.render(&inputs)?);
        }
        tracing::debug!(slides = frames.len(), "rendered carousel");
        Ok(frames)
    }

    /// Wrap raw text and render one frame.
    pub fn compose(
        &mut self,
        image: &PreparedImage,
        text: &str,
        title: Option<&str>,
        highlights: &[String],
        graphic: Option<&GraphicSource>,
    ) -> StoryResult<FrameRgba> {
        let body = self.wrap_body(text, highlights);
        let title_lines = title.and_then(|t| self.wrap_for_slot("title", t, &[]));
        self.render(&RenderInputs {
            image,
            body: &body,
            title: title_lines.as_deref(),
            graphic,
        })
    }

    /// Wrap raw text and render it as carousel slides.
    pub fn compose_carousel(
        &mut self,
        image: &PreparedImage,
        text: &str,
        title: Option<&str>,
        highlights: &[String],
        graphic: Option<&GraphicSource>,
    ) -> StoryResult<Vec<FrameRgba>> {
        let body = self.wrap_body(text, highlights);
        let title_lines = title.and_then(|t| self.wrap_for_slot("title", t, &[]));
        self.render_carousel(image, &body, title_lines.as_deref(), graphic)
    }

    fn paint_background(
        &self,
        px: &mut [u8],
        canvas: Canvas,
        image: &PreparedImage,
    ) -> StoryResult<()> {
        let cover = cover_crop(
            image,
            canvas.width,
            canvas.height,
            image::imageops::FilterType::Triangle,
        )?;
        let blurred = blur_sigma(&cover.rgba8_premul, canvas.width, canvas.height, BACKGROUND_BLUR)?;
        over_in_place(px, &blurred, 1.0)
    }

    fn paint_overlay(&self, px: &mut [u8], canvas: Canvas) {
        let bg = &self.template.background;
        let row_bytes = canvas.width as usize * 4;
        let height = f64::from(canvas.height.max(1));

        for (y, row) in px.chunks_exact_mut(row_bytes).enumerate() {
            let color = if bg.gradient {
                let t = y as f64 / height;
                let t = match bg.gradient_direction {
                    GradientDirection::Bottom => t,
                    GradientDirection::Top => 1.0 - t,
                };
                let start = f64::from(bg.gradient_start_opacity);
                let end = f64::from(bg.gradient_end_opacity);
                let alpha = (255.0 * (start + (end - start) * t)).clamp(0.0, 255.0) as u8;
                ColorRgba8 {
                    a: alpha,
                    ..bg.overlay_color
                }
            } else {
                bg.overlay_color.with_opacity(bg.overlay_opacity)
            };
            if color.a == 0 {
                continue;
            }
            let src = color.to_premul();
            for d in row.chunks_exact_mut(4) {
                let out = over([d[0], d[1], d[2], d[3]], src, 1.0);
                d.copy_from_slice(&out);
            }
        }
    }

    fn paint_image(
        &self,
        px: &mut [u8],
        canvas: Canvas,
        resolved: &ResolvedSlot,
        image: &PreparedImage,
    ) -> StoryResult<()> {
        let slot = &resolved.slot;
        let rect = resolved.rect;

        let (placed, x, y) = match slot.image_mode {
            ImageMode::Background => return Ok(()),
            ImageMode::FillSlot => {
                let filled = cover_crop(
                    image,
                    rect.width,
                    rect.height,
                    image::imageops::FilterType::Lanczos3,
                )?;
                (filled, i64::from(rect.x), i64::from(rect.y))
            }
            ImageMode::Slot | ImageMode::Overlay => {
                let fitted = fit_within(image, rect.width, rect.height)?;
                let (x, y) = centered_in(rect, fitted.width, fitted.height);
                (fitted, x, y)
            }
        };
        let placed = round_corners(&placed, slot.border_radius)?;

        let img_cfg = &self.template.image;
        if img_cfg.shadow || slot.shadow_color.is_some() {
            let color = slot.shadow_color.unwrap_or(img_cfg.shadow_color);
            let blur = slot.shadow_blur.unwrap_or(img_cfg.shadow_blur);
            if color.a > 0 {
                let shadow =
                    drop_shadow(placed.width, placed.height, slot.border_radius, color, blur)?;
                let pad = i64::from(SHADOW_PAD);
                over_at(
                    px,
                    canvas.width,
                    canvas.height,
                    &shadow.rgba8_premul,
                    shadow.width,
                    shadow.height,
                    x - pad,
                    y - pad,
                    slot.opacity,
                )?;
            }
        }

        over_at(
            px,
            canvas.width,
            canvas.height,
            &placed.rgba8_premul,
            placed.width,
            placed.height,
            x,
            y,
            slot.opacity,
        )
    }

    fn paint_graphic(
        &self,
        px: &mut [u8],
        canvas: Canvas,
        resolved: &ResolvedSlot,
        graphic: &GraphicSource,
    ) -> StoryResult<()> {
        let slot = &resolved.slot;
        let rect = resolved.rect;
        let scale = if slot.scale.is_finite() && slot.scale > 0.0 {
            f64::from(slot.scale)
        } else {
            1.0
        };
        let box_w = ((f64::from(rect.width) * scale) as u32).max(1);
        let box_h = ((f64::from(rect.height) * scale) as u32).max(1);

        match graphic {
            GraphicSource::Raster(img) => {
                let fitted = fit_within(
                    img,
                    box_w.min(MAX_RASTER_DIM),
                    box_h.min(MAX_RASTER_DIM),
                )?;
                let mut bytes = fitted.rgba8_premul.to_vec();
                scale_alpha_in_place(&mut bytes, slot.opacity);
                let (x, y) = centered_in(rect, fitted.width, fitted.height);
                over_at(
                    px,
                    canvas.width,
                    canvas.height,
                    &bytes,
                    fitted.width,
                    fitted.height,
                    x,
                    y,
                    1.0,
                )
            }
            GraphicSource::Svg(svg) => {
                let (iw, ih) = svg.intrinsic_size();
                let (w, h) = contain_size(iw, ih, box_w, box_h);
                let (x, y) = centered_in(rect, w, h);
                // Only the on-canvas window is rasterized.
                let Some(region) = visible_region(canvas, x, y, w, h) else {
                    return Ok(());
                };
                let mut bytes = rasterize_svg_region_to_premul_rgba8(&svg.tree, w, h, region)?;
                scale_alpha_in_place(&mut bytes, slot.opacity);
                over_at(
                    px,
                    canvas.width,
                    canvas.height,
                    &bytes,
                    region.width,
                    region.height,
                    x + i64::from(region.x),
                    y + i64::from(region.y),
                    1.0,
                )
            }
        }
    }

    fn paint_text(
        &mut self,
        px: &mut [u8],
        canvas: Canvas,
        resolved: &ResolvedSlot,
        lines: &[WrappedLine],
    ) -> StoryResult<()> {
        if lines.is_empty() {
            return Ok(());
        }
        let slot = &resolved.slot;
        let rect = resolved.rect;
        let style = self.text_style(slot);
        let size = i64::from(style.font.key.size);
        let line_h = style.line_height();

        let block_h: i64 = lines
            .iter()
            .map(|l| if l.is_blank() { line_h / 2 } else { line_h })
            .sum();
        let (top, height) = (i64::from(rect.y), i64::from(rect.height));
        let mut y = match slot.v_align {
            VAlign::Top => top,
            VAlign::Center => top + (height - block_h) / 2,
            VAlign::Bottom => top + height - block_h,
        };

        let shadow = self.template.font.shadow_color.filter(|c| c.a > 0);
        let (sx, sy) = self.template.font.shadow_offset;
        let underline = self.template.underline.clone();
        let underline_color = underline.color.with_opacity(underline.opacity);
        let space_w = self.text.measure(" ", &style.font).round() as i64;

        for line in lines {
            if line.is_blank() {
                y += line_h / 2;
                continue;
            }

            let words = self.word_boxes(line, &style.font, space_w, rect, slot.h_align, y, size);

            let band = Rect::new(
                0.0,
                (y - size) as f64,
                f64::from(canvas.width),
                (y + 2 * size + i64::from(sy.abs())) as f64,
            );
            if let Some(mut layer) = VectorLayer::covering(band, canvas)? {
                let (ox, oy) = layer.origin();
                for word in &words {
                    let wx = word.x as f64 - ox;
                    let wy = word.y as f64 - oy;
                    if let Some(shadow) = shadow {
                        self.text.draw_text(
                            layer.ctx(),
                            &word.word,
                            &style.font,
                            wx + f64::from(sx),
                            wy + f64::from(sy),
                            shadow,
                        )?;
                    }
                    self.text
                        .draw_text(layer.ctx(), &word.word, &style.font, wx, wy, style.color)?;
                }
                layer.composite_onto(px, canvas, 1.0)?;
            }

            for phrase in &line.highlights {
                let Some(span) = locate_phrase(&words, phrase) else {
                    continue;
                };
                let shape = underline_shape(underline.style, span, &underline, size);
                draw_underline(px, canvas, &shape, underline_color)?;
            }

            y += line_h;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn word_boxes(
        &mut self,
        line: &WrappedLine,
        font: &ResolvedFont,
        space_w: i64,
        rect: PixelRect,
        align: HAlign,
        y: i64,
        size: i64,
    ) -> Vec<WordBox> {
        let measured: Vec<(&str, i64)> = line
            .text
            .split_whitespace()
            .map(|w| (w, self.text.measure(w, font).round() as i64))
            .collect();
        let line_w: i64 = measured.iter().map(|(_, w)| w).sum::<i64>()
            + space_w * (measured.len() as i64 - 1).max(0);

        let (left, width) = (i64::from(rect.x), i64::from(rect.width));
        let mut x = match align {
            HAlign::Left => left,
            HAlign::Center => left + (width - line_w) / 2,
            HAlign::Right => left + width - line_w,
        };

        measured
            .into_iter()
            .map(|(word, w)| {
                let b = WordBox {
                    word: word.to_owned(),
                    x,
                    y,
                    width: w,
                    height: size,
                };
                x += w + space_w;
                b
            })
            .collect()
    }
}

/// Top-left corner that centers a `w x h` box inside `rect`. May lie outside `rect` when the box
/// is larger.
fn centered_in(rect: PixelRect, w: u32, h: u32) -> (i64, i64) {
    (
        i64::from(rect.x) + (i64::from(rect.width) - i64::from(w)) / 2,
        i64::from(rect.y) + (i64::from(rect.height) - i64::from(h)) / 2,
    )
}

/// Part of a `w x h` buffer placed at (`x`, `y`) that lands on the canvas.
fn visible_region(canvas: Canvas, x: i64, y: i64, w: u32, h: u32) -> Option<SvgRegion> {
    let x0 = (-x).clamp(0, i64::from(w));
    let y0 = (-y).clamp(0, i64::from(h));
    let x1 = (i64::from(canvas.width) - x).clamp(0, i64::from(w));
    let y1 = (i64::from(canvas.height) - y).clamp(0, i64::from(h));
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(SvgRegion {
        x: u32::try_from(x0).ok()?,
        y: u32::try_from(y0).ok()?,
        width: u32::try_from(x1 - x0).ok()?,
        height: u32::try_from(y1 - y0).ok()?,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
