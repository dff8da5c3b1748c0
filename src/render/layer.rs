use crate::foundation::core::{Canvas, Rect};
use crate::foundation::error::{StoryError, StoryResult};
use crate::render::composite::over_at;

/// A vello_cpu drawing surface covering part of the canvas.
///
/// Content is rendered in isolation and then alpha-composited onto the canvas, so strokes and
/// text blend against the pixels underneath exactly once.
pub(crate) struct VectorLayer {
    ctx: vello_cpu::RenderContext,
    x: i64,
    y: i64,
    width: u16,
    height: u16,
}

impl VectorLayer {
    /// Layer over `bounds` (canvas coordinates), clipped to the canvas. `None` when nothing of
    /// `bounds` is visible.
    pub(crate) fn covering(bounds: Rect, canvas: Canvas) -> StoryResult<Option<Self>> {
        let x0 = bounds.x0.floor().max(0.0);
        let y0 = bounds.y0.floor().max(0.0);
        let x1 = bounds.x1.ceil().min(f64::from(canvas.width));
        let y1 = bounds.y1.ceil().min(f64::from(canvas.height));
        if !(x1 > x0 && y1 > y0) {
            return Ok(None);
        }
        let (width, height) = dims_u16((x1 - x0) as u32, (y1 - y0) as u32)?;
        let mut layer = Self {
            ctx: vello_cpu::RenderContext::new(width, height),
            x: x0 as i64,
            y: y0 as i64,
            width,
            height,
        };
        layer.reset_transform();
        Ok(Some(layer))
    }

    /// Top-left corner of the layer in canvas coordinates.
    pub(crate) fn origin(&self) -> (f64, f64) {
        (self.x as f64, self.y as f64)
    }

    pub(crate) fn ctx(&mut self) -> &mut vello_cpu::RenderContext {
        &mut self.ctx
    }

    /// Map canvas coordinates onto the layer.
    pub(crate) fn reset_transform(&mut self) {
        self.ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            -(self.x as f64),
            -(self.y as f64),
        )));
    }

    /// Rasterize and composite onto `dst` (premultiplied RGBA8, canvas-sized).
    pub(crate) fn composite_onto(mut self, dst: &mut [u8], canvas: Canvas, opacity: f32) -> StoryResult<()> {
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        over_at(
            dst,
            canvas.width,
            canvas.height,
            pixmap.data_as_u8_slice(),
            u32::from(self.width),
            u32::from(self.height),
            self.x,
            self.y,
            opacity,
        )
    }
}

fn dims_u16(width: u32, height: u32) -> StoryResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| StoryError::render("layer width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| StoryError::render("layer height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(StoryError::render("layer must be at least 1x1"));
    }
    Ok((w, h))
}

/// Convert a `kurbo` path into the version re-exported by vello_cpu.
pub(crate) fn bezpath_to_cpu(path: &crate::foundation::core::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
