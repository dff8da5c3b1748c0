//! Storygrid lays out and composites social-media frames: 9:16 stories, 4:5 posts and
//! multi-slide carousels.
//!
//! # Pipeline overview
//!
//! 1. **Template**: a [`StoryTemplate`] document supplies styling defaults and a 12x12
//!    [`GridConfig`] of named slots (title, body, image, graphic, spacer).
//! 2. **Wrap**: text is greedily wrapped to pixel widths ([`wrap_text`]), tagging the highlight
//!    phrases that land on each line.
//! 3. **Resolve**: line counts feed [`apply_adaptive_rules`], which shifts, resizes, restyles or
//!    hides slots; [`resolve_layout`] turns the result into pixel rectangles.
//! 4. **Composite**: [`StoryComposer`] paints the blurred background, the overlay and every slot
//!    in z-order, with hand-drawn underlines under highlighted phrases.
//!
//! Frames are premultiplied RGBA8 end-to-end. Rendering is deterministic: underline jitter is
//! seeded from stroke coordinates, and the built-in fallback face has fixed metrics.
#![forbid(unsafe_code)]

mod assets;
mod foundation;
mod layout;
mod render;
mod template;
mod text;

pub use assets::color::ColorRgba8;
pub use assets::decode::{PreparedImage, PreparedSvg, decode_image, parse_svg};
pub use assets::svg_raster::{
    SvgRegion, rasterize_svg_region_to_premul_rgba8, rasterize_svg_to_premul_rgba8,
};
pub use foundation::core::{Canvas, PixelRect};
pub use foundation::error::{StoryError, StoryResult};
pub use layout::grid::{
    AdaptiveRule, ContentFormat, ContentMetrics, GRID_CELLS, GridConfig, HAlign, ImageMode,
    LayoutSlot, Padding, RuleAction, RuleCondition, SlotType, VAlign,
};
pub use layout::resolve::{ResolvedSlot, paint_order, resolve_layout};
pub use layout::rules::{DEFAULT_RULE_FONT_SIZE, MIN_RULE_FONT_SIZE, apply_adaptive_rules};
pub use render::compositor::{
    BACKGROUND_BLUR, FrameRgba, GraphicSource, RenderInputs, SlotTextStyle, StoryComposer,
};
pub use render::underline::{
    PhraseSpan, StrokeSegment, UnderlineShape, WordBox, draw_underline, locate_phrase,
    underline_shape,
};
pub use template::model::{
    BackgroundConfig, FontConfig, GradientDirection, ImageConfig, ImagePosition,
    LegacyLayoutConfig, StoryTemplate, StyleHints, TextArea, UnderlineConfig, UnderlineStyle,
};
pub use text::engine::{MeasureText, TextLayoutEngine, builtin_width};
pub use text::font::{
    FontFace, FontKey, FontResolver, FontResolverOpts, FontSource, ResolvedFont, WEIGHT_BOLD,
    WEIGHT_REGULAR, weight_name,
};
pub use text::wrap::{WrappedLine, highlights_in_line, wrap_text};
