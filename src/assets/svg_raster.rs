use crate::foundation::error::{StoryError, StoryResult};

/// Largest buffer edge the rasterizers allocate.
pub(crate) const MAX_RASTER_DIM: u32 = 8_192;

/// Rasterize `tree` into a `width x height` premultiplied RGBA8 buffer, stretching the SVG
/// viewport to the target size.
pub fn rasterize_svg_to_premul_rgba8(
    tree: &usvg::Tree,
    width: u32,
    height: u32,
) -> StoryResult<Vec<u8>> {
    rasterize_svg_region_to_premul_rgba8(tree, width, height, SvgRegion::full(width, height))
}

/// Sub-rectangle of a virtual raster, in that raster's pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SvgRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SvgRegion {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Rasterize only `region` of `tree` as it would appear stretched to `width x height`.
///
/// The virtual size may exceed [`MAX_RASTER_DIM`]; only the region is allocated.
pub fn rasterize_svg_region_to_premul_rgba8(
    tree: &usvg::Tree,
    width: u32,
    height: u32,
    region: SvgRegion,
) -> StoryResult<Vec<u8>> {
    if width == 0
        || height == 0
        || region.width == 0
        || region.height == 0
        || region.width > MAX_RASTER_DIM
        || region.height > MAX_RASTER_DIM
    {
        return Err(StoryError::render(format!(
            "svg raster size out of range: {}x{} region of {width}x{height} (max {MAX_RASTER_DIM}x{MAX_RASTER_DIM})",
            region.width, region.height
        )));
    }
    let mut pixmap = resvg::tiny_skia::Pixmap::new(region.width, region.height)
        .ok_or_else(|| StoryError::render("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_row(
        sx,
        0.0,
        0.0,
        sy,
        -(region.x as f32),
        -(region.y as f32),
    );

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Ok(pixmap.data().to_vec())
}
