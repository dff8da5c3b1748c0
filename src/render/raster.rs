//! Raster helpers for placing images: cover/contain scaling, rounded corners, drop shadows.

use vello_cpu::kurbo::Shape;

use crate::assets::color::ColorRgba8;
use crate::assets::decode::PreparedImage;
use crate::foundation::error::{StoryError, StoryResult};
use crate::render::blur::blur_sigma;

/// Space around a drop shadow's rounded rect, so the blur has room to spread.
pub const SHADOW_PAD: u32 = 20;

/// Resample a premultiplied image to exactly `width x height`.
pub fn resize(
    img: &PreparedImage,
    width: u32,
    height: u32,
    filter: image::imageops::FilterType,
) -> StoryResult<PreparedImage> {
    if img.width == width && img.height == height {
        return Ok(img.clone());
    }
    let out = image::imageops::resize(&img.to_buffer(), width.max(1), height.max(1), filter);
    let (w, h) = out.dimensions();
    let mut bytes = out.into_raw();
    clamp_premul_in_place(&mut bytes);
    PreparedImage::from_premul(w, h, bytes)
}

/// Scale so that the image covers `width x height`, then center-crop the excess.
pub fn cover_crop(
    img: &PreparedImage,
    width: u32,
    height: u32,
    filter: image::imageops::FilterType,
) -> StoryResult<PreparedImage> {
    let scale = (f64::from(width) / f64::from(img.width))
        .max(f64::from(height) / f64::from(img.height));
    let new_w = ((f64::from(img.width) * scale) as u32).max(width);
    let new_h = ((f64::from(img.height) * scale) as u32).max(height);

    let scaled = resize(img, new_w, new_h, filter)?;
    if new_w == width && new_h == height {
        return Ok(scaled);
    }

    let left = (new_w - width) / 2;
    let top = (new_h - height) / 2;
    let buf = scaled.to_buffer();
    let cropped = image::imageops::crop_imm(&buf, left, top, width, height).to_image();
    PreparedImage::from_premul(width, height, cropped.into_raw())
}

/// Largest size with the image's aspect ratio that fits inside `max_w x max_h`.
pub fn contain_size(img_w: u32, img_h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    let scale = (f64::from(max_w) / f64::from(img_w.max(1)))
        .min(f64::from(max_h) / f64::from(img_h.max(1)));
    (
        ((f64::from(img_w) * scale) as u32).max(1),
        ((f64::from(img_h) * scale) as u32).max(1),
    )
}

/// Scale to fit inside `max_w x max_h`, preserving aspect ratio.
pub fn fit_within(img: &PreparedImage, max_w: u32, max_h: u32) -> StoryResult<PreparedImage> {
    let (w, h) = contain_size(img.width, img.height, max_w, max_h);
    resize(img, w, h, image::imageops::FilterType::Lanczos3)
}

/// Coverage mask (0..=255 per pixel) of a rounded rectangle filling `width x height`.
pub fn rounded_rect_mask(width: u32, height: u32, radius: f64) -> StoryResult<Vec<u8>> {
    let pixels = fill_rounded_rect(
        width,
        height,
        vello_cpu::kurbo::Rect::new(0.0, 0.0, f64::from(width), f64::from(height)),
        radius,
        ColorRgba8::WHITE,
    )?;
    Ok(pixels.chunks_exact(4).map(|px| px[3]).collect())
}

/// Clip the image to a rounded rectangle. A radius of zero returns the image unchanged.
pub fn round_corners(img: &PreparedImage, radius: u32) -> StoryResult<PreparedImage> {
    if radius == 0 {
        return Ok(img.clone());
    }
    let mask = rounded_rect_mask(img.width, img.height, f64::from(radius))?;
    let mut bytes = img.rgba8_premul.as_ref().clone();
    for (px, &m) in bytes.chunks_exact_mut(4).zip(&mask) {
        if m == 255 {
            continue;
        }
        for c in px.iter_mut() {
            *c = crate::foundation::math::mul_div255_u8(u16::from(*c), u16::from(m));
        }
    }
    PreparedImage::from_premul(img.width, img.height, bytes)
}

/// Blurred rounded-rect shadow for a `width x height` image.
///
/// The result is `SHADOW_PAD` pixels larger on each side; paste it at the image position minus
/// `SHADOW_PAD` to center it behind the image.
pub fn drop_shadow(
    width: u32,
    height: u32,
    radius: u32,
    color: ColorRgba8,
    blur: u32,
) -> StoryResult<PreparedImage> {
    let pad = f64::from(SHADOW_PAD);
    let out_w = width + 2 * SHADOW_PAD;
    let out_h = height + 2 * SHADOW_PAD;
    let shape = fill_rounded_rect(
        out_w,
        out_h,
        vello_cpu::kurbo::Rect::new(pad, pad, pad + f64::from(width), pad + f64::from(height)),
        f64::from(radius),
        color,
    )?;
    let blurred = blur_sigma(&shape, out_w, out_h, blur as f32)?;
    PreparedImage::from_premul(out_w, out_h, blurred)
}

/// Render a filled rounded rect into a fresh premultiplied buffer.
fn fill_rounded_rect(
    width: u32,
    height: u32,
    rect: vello_cpu::kurbo::Rect,
    radius: f64,
    color: ColorRgba8,
) -> StoryResult<Vec<u8>> {
    let w: u16 = width
        .try_into()
        .map_err(|_| StoryError::render("raster width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| StoryError::render("raster height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(StoryError::render("raster must be at least 1x1"));
    }

    let mut ctx = vello_cpu::RenderContext::new(w, h);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        color.r, color.g, color.b, color.a,
    ));
    let max_radius = (rect.width().min(rect.height()) / 2.0).max(0.0);
    let shape = vello_cpu::kurbo::RoundedRect::from_rect(rect, radius.clamp(0.0, max_radius));
    ctx.fill_path(&shape.to_path(0.1));

    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);
    Ok(pixmap.data_as_u8_slice().to_vec())
}

/// Keep color channels at or below alpha after filters that can overshoot.
fn clamp_premul_in_place(bytes: &mut [u8]) {
    for px in bytes.chunks_exact_mut(4) {
        let a = px[3];
        for c in &mut px[..3] {
            *c = (*c).min(a);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
