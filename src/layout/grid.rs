//! 12x12 grid model: content formats, slots, adaptive rules and slot-to-pixel conversion.
//!
//! Grid coordinates are 0-based cell indices. Each cell is `canvas_width / 12` by
//! `canvas_height / 12` pixels (real-valued); pixel rectangles are floored and clamped so
//! that every slot stays drawable.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::assets::color::ColorRgba8;
use crate::foundation::core::{Canvas, PixelRect};
use crate::foundation::error::{StoryError, StoryResult};

/// Grid cardinality along both axes. Not templatable.
pub const GRID_CELLS: u32 = 12;

/// Output format with fixed pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ContentFormat {
    /// Vertical 1080x1920 frame.
    #[default]
    Story,
    /// 1080x1350 frame.
    Post,
    /// One 1080x1350 slide of a multi-frame set.
    Carousel,
}

impl ContentFormat {
    pub const ALL: [ContentFormat; 3] = [Self::Story, Self::Post, Self::Carousel];

    /// Lowercase name used in documents and on the command line.
    pub fn label(self) -> &'static str {
        match self {
            Self::Story => "story",
            Self::Post => "post",
            Self::Carousel => "carousel",
        }
    }

    /// Fixed pixel dimensions of a frame in this format.
    pub fn canvas(self) -> Canvas {
        let (width, height) = match self {
            Self::Story => (1080, 1920),
            Self::Post | Self::Carousel => (1080, 1350),
        };
        Canvas { width, height }
    }
}

impl fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ContentFormat {
    type Err = StoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.label() == wanted)
            .ok_or_else(|| {
                let available: Vec<_> = Self::ALL.iter().map(|f| f.label()).collect();
                StoryError::config(format!(
                    "unknown format '{s}', available: {}",
                    available.join(", ")
                ))
            })
    }
}

impl TryFrom<String> for ContentFormat {
    type Error = StoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContentFormat> for &'static str {
    fn from(value: ContentFormat) -> Self {
        value.label()
    }
}

/// What a slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    Title,
    Body,
    Image,
    /// Decorative element: icon, logo, badge.
    Graphic,
    /// Reserved empty space.
    Spacer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HAlign {
    /// Text starts at the slot's left edge.
    #[default]
    Left,
    /// Lines are centred in the slot.
    Center,
    /// Lines end at the slot's right edge.
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VAlign {
    /// Block starts at the slot's top edge.
    #[default]
    Top,
    /// Block is centred vertically.
    Center,
    /// Block ends at the slot's bottom edge.
    Bottom,
}

/// How an image slot places its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageMode {
    /// The image is only used as the blurred full-canvas background; the slot draws nothing.
    Background,
    /// Fit inside the slot, preserving aspect ratio.
    #[default]
    Slot,
    /// Same placement as `Slot`; paint order comes from `z_index`.
    Overlay,
    /// Cover the whole slot, center-cropping the excess.
    FillSlot,
}

/// Inner padding of a slot, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Padding {
    #[serde(default)]
    pub top: i32,
    #[serde(default)]
    pub bottom: i32,
    #[serde(default)]
    pub left: i32,
    #[serde(default)]
    pub right: i32,
}

impl Padding {
    pub fn uniform(px: i32) -> Self {
        Self {
            top: px,
            bottom: px,
            left: px,
            right: px,
        }
    }

    pub fn horizontal(px: i32) -> Self {
        Self {
            left: px,
            right: px,
            ..Self::default()
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// A named rectangular region of the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LayoutSlotRepr")]
pub struct LayoutSlot {
    /// Unique within a template.
    pub name: String,
    pub slot_type: SlotType,
    pub col_start: i32,
    pub row_start: i32,
    pub col_span: i32,
    pub row_span: i32,
    pub h_align: HAlign,
    pub v_align: VAlign,
    #[serde(skip_serializing_if = "Padding::is_zero")]
    pub padding: Padding,
    /// Paint order, ascending.
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub z_index: i32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_color: Option<ColorRgba8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_spacing: Option<f32>,

    pub image_mode: ImageMode,
    pub border_radius: u32,
    pub opacity: f32,
    /// Graphic slots: content size relative to the slot rect.
    pub scale: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_color: Option<ColorRgba8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_blur: Option<u32>,
}

fn is_zero_i32(v: &i32) -> bool {
    *v == 0
}

impl LayoutSlot {
    /// A full-width, three-row slot at the origin with neutral styling.
    pub fn new(name: impl Into<String>, slot_type: SlotType) -> Self {
        Self {
            name: name.into(),
            slot_type,
            col_start: 0,
            row_start: 0,
            col_span: GRID_CELLS as i32,
            row_span: 3,
            h_align: HAlign::Left,
            v_align: VAlign::Top,
            padding: Padding::default(),
            z_index: 0,
            font_size: None,
            font_color: None,
            font_family: None,
            font_weight: None,
            line_spacing: None,
            image_mode: ImageMode::Slot,
            border_radius: 0,
            opacity: 1.0,
            scale: 1.0,
            shadow_color: None,
            shadow_blur: None,
        }
    }

    /// Set grid position and span.
    pub fn at(mut self, col_start: i32, row_start: i32, col_span: i32, row_span: i32) -> Self {
        self.col_start = col_start;
        self.row_start = row_start;
        self.col_span = col_span;
        self.row_span = row_span;
        self
    }

    /// True when position and span match `other`, ignoring styling.
    pub fn same_geometry(&self, other: &Self) -> bool {
        self.name == other.name
            && self.col_start == other.col_start
            && self.row_start == other.row_start
            && self.col_span == other.col_span
            && self.row_span == other.row_span
            && self.padding == other.padding
    }
}

/// Accepts both the nested `padding` object and flat `padding_*` keys.
#[derive(Deserialize)]
struct LayoutSlotRepr {
    name: String,
    slot_type: SlotType,
    #[serde(default)]
    col_start: i32,
    #[serde(default)]
    row_start: i32,
    #[serde(default = "default_col_span")]
    col_span: i32,
    #[serde(default = "default_row_span")]
    row_span: i32,
    #[serde(default)]
    h_align: HAlign,
    #[serde(default)]
    v_align: VAlign,
    #[serde(default)]
    padding: Option<Padding>,
    #[serde(default)]
    padding_top: i32,
    #[serde(default)]
    padding_bottom: i32,
    #[serde(default)]
    padding_left: i32,
    #[serde(default)]
    padding_right: i32,
    #[serde(default)]
    z_index: i32,
    #[serde(default)]
    font_size: Option<u32>,
    #[serde(default)]
    font_color: Option<ColorRgba8>,
    #[serde(default)]
    font_family: Option<String>,
    #[serde(default)]
    font_weight: Option<u16>,
    #[serde(default)]
    line_spacing: Option<f32>,
    #[serde(default)]
    image_mode: ImageMode,
    #[serde(default)]
    border_radius: u32,
    #[serde(default = "one_f32")]
    opacity: f32,
    #[serde(default = "one_f32")]
    scale: f32,
    #[serde(default)]
    shadow_color: Option<ColorRgba8>,
    #[serde(default)]
    shadow_blur: Option<u32>,
}

fn default_col_span() -> i32 {
    GRID_CELLS as i32
}

fn default_row_span() -> i32 {
    3
}

fn one_f32() -> f32 {
    1.0
}

impl From<LayoutSlotRepr> for LayoutSlot {
    fn from(r: LayoutSlotRepr) -> Self {
        let padding = r.padding.unwrap_or(Padding {
            top: r.padding_top,
            bottom: r.padding_bottom,
            left: r.padding_left,
            right: r.padding_right,
        });
        Self {
            name: r.name,
            slot_type: r.slot_type,
            col_start: r.col_start,
            row_start: r.row_start,
            col_span: r.col_span,
            row_span: r.row_span,
            h_align: r.h_align,
            v_align: r.v_align,
            padding,
            z_index: r.z_index,
            font_size: r.font_size,
            font_color: r.font_color,
            font_family: r.font_family,
            font_weight: r.font_weight,
            line_spacing: r.line_spacing,
            image_mode: r.image_mode,
            border_radius: r.border_radius,
            opacity: r.opacity,
            scale: r.scale,
            shadow_color: r.shadow_color,
            shadow_blur: r.shadow_blur,
        }
    }
}

/// Condition evaluated against the observed slot's line count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCondition {
    /// Line count strictly greater than the rule value.
    LinesGt,
    /// Line count strictly less than the rule value.
    LinesLt,
    /// At least one line.
    HasContent,
    /// Zero lines.
    NoContent,
}

/// Adjustment applied to the target slot when the condition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// Move the target's row by the rule value, clamped to the grid.
    ShiftRow,
    /// Move the target's column by the rule value, clamped to the grid.
    ShiftCol,
    /// Add the rule value to the row span, minimum one cell.
    ResizeRow,
    /// Add the rule value to the column span, minimum one cell.
    ResizeCol,
    /// Add the rule value to the font size, floored at the minimum size.
    ChangeFontSize,
    /// Drop the target from the frame.
    Hide,
}

/// "When `slot_name` satisfies `condition`, apply `action` with `value` to `target_slot`."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptiveRule {
    pub slot_name: String,
    pub condition: RuleCondition,
    #[serde(default)]
    pub threshold: i64,
    #[serde(default)]
    pub target_slot: String,
    #[serde(default = "default_action")]
    pub action: RuleAction,
    #[serde(default)]
    pub value: i32,
}

fn default_action() -> RuleAction {
    RuleAction::ShiftRow
}

impl AdaptiveRule {
    pub fn new(
        slot_name: impl Into<String>,
        condition: RuleCondition,
        threshold: i64,
        target_slot: impl Into<String>,
        action: RuleAction,
        value: i32,
    ) -> Self {
        Self {
            slot_name: slot_name.into(),
            condition,
            threshold,
            target_slot: target_slot.into(),
            action,
            value,
        }
    }
}

/// Rendered line count per slot name, measured once per render call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentMetrics {
    counts: HashMap<String, usize>,
}

impl ContentMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, slot: impl Into<String>, lines: usize) -> Self {
        self.set(slot, lines);
        self
    }

    pub fn set(&mut self, slot: impl Into<String>, lines: usize) {
        self.counts.insert(slot.into(), lines);
    }

    /// Missing slots count as zero lines.
    pub fn get(&self, slot: &str) -> usize {
        self.counts.get(slot).copied().unwrap_or(0)
    }
}

/// Complete grid layout: format, slots, adaptive rules and carousel settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default)]
    pub format: ContentFormat,
    #[serde(default = "default_cells")]
    pub cols: u32,
    #[serde(default = "default_cells")]
    pub rows: u32,
    /// Declaration order matters for rule application and z-order ties.
    #[serde(default)]
    pub slots: Vec<LayoutSlot>,
    /// Applied in declaration order; the last writer wins.
    #[serde(default)]
    pub adaptive_rules: Vec<AdaptiveRule>,
    #[serde(default = "default_max_lines_per_slide")]
    pub max_lines_per_slide: usize,
    #[serde(default = "default_true")]
    pub carousel_title_on_first: bool,
}

fn default_cells() -> u32 {
    GRID_CELLS
}

fn default_max_lines_per_slide() -> usize {
    8
}

fn default_true() -> bool {
    true
}

impl GridConfig {
    /// Empty grid for `format`.
    pub fn new(format: ContentFormat) -> Self {
        Self {
            format,
            cols: GRID_CELLS,
            rows: GRID_CELLS,
            slots: Vec::new(),
            adaptive_rules: Vec::new(),
            max_lines_per_slide: default_max_lines_per_slide(),
            carousel_title_on_first: true,
        }
    }

    /// Reject grids that break the fixed 12x12 cardinality or reuse slot names.
    pub fn validate(&self) -> StoryResult<()> {
        if self.cols != GRID_CELLS || self.rows != GRID_CELLS {
            return Err(StoryError::config(format!(
                "grid must be {GRID_CELLS}x{GRID_CELLS}, got {}x{}",
                self.cols, self.rows
            )));
        }
        for (i, slot) in self.slots.iter().enumerate() {
            if self.slots[..i].iter().any(|s| s.name == slot.name) {
                return Err(StoryError::config(format!(
                    "duplicate slot name '{}'",
                    slot.name
                )));
            }
        }
        Ok(())
    }

    pub fn canvas(&self) -> Canvas {
        self.format.canvas()
    }

    pub fn cell_width(&self) -> f64 {
        f64::from(self.canvas().width) / f64::from(self.cols.max(1))
    }

    pub fn cell_height(&self) -> f64 {
        f64::from(self.canvas().height) / f64::from(self.rows.max(1))
    }

    pub fn get_slot(&self, name: &str) -> Option<&LayoutSlot> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// Pixel rectangle of `slot`, padding subtracted.
    ///
    /// Out-of-range grid coordinates are clamped, never rejected: `x, y >= 0`, `w, h >= 1`.
    pub fn slot_pixel_rect(&self, slot: &LayoutSlot) -> PixelRect {
        let cw = self.cell_width();
        let ch = self.cell_height();
        let p = slot.padding;

        let x = (f64::from(slot.col_start) * cw).floor() as i64 + i64::from(p.left);
        let y = (f64::from(slot.row_start) * ch).floor() as i64 + i64::from(p.top);
        let w = (f64::from(slot.col_span) * cw).floor() as i64
            - i64::from(p.left)
            - i64::from(p.right);
        let h = (f64::from(slot.row_span) * ch).floor() as i64
            - i64::from(p.top)
            - i64::from(p.bottom);

        PixelRect::new(
            clamp_to_u32(x, 0),
            clamp_to_u32(y, 0),
            clamp_to_u32(w, 1),
            clamp_to_u32(h, 1),
        )
    }

    /// Default story layout: image on top, title and body below.
    pub fn default_story() -> Self {
        Self {
            slots: vec![
                LayoutSlot {
                    h_align: HAlign::Center,
                    v_align: VAlign::Center,
                    padding: Padding::uniform(20),
                    border_radius: 24,
                    ..LayoutSlot::new("image", SlotType::Image).at(1, 1, 10, 5)
                },
                LayoutSlot {
                    v_align: VAlign::Bottom,
                    padding: Padding::horizontal(24),
                    font_size: Some(66),
                    font_weight: Some(700),
                    line_spacing: Some(1.3),
                    ..LayoutSlot::new("title", SlotType::Title).at(1, 7, 10, 2)
                },
                LayoutSlot {
                    padding: Padding {
                        top: 10,
                        ..Padding::horizontal(24)
                    },
                    font_size: Some(44),
                    line_spacing: Some(1.5),
                    ..LayoutSlot::new("body", SlotType::Body).at(1, 9, 10, 3)
                },
            ],
            adaptive_rules: vec![
                AdaptiveRule::new("body", RuleCondition::LinesGt, 4, "title", RuleAction::ShiftRow, -1),
                AdaptiveRule::new("body", RuleCondition::LinesGt, 4, "body", RuleAction::ShiftRow, -1),
                AdaptiveRule::new("body", RuleCondition::LinesGt, 4, "body", RuleAction::ResizeRow, 1),
                AdaptiveRule::new("body", RuleCondition::LinesGt, 6, "body", RuleAction::ChangeFontSize, -6),
            ],
            ..Self::new(ContentFormat::Story)
        }
    }

    /// Default post layout: image on the top half, text on the bottom half.
    pub fn default_post() -> Self {
        Self {
            slots: vec![
                LayoutSlot {
                    h_align: HAlign::Center,
                    v_align: VAlign::Center,
                    padding: Padding {
                        bottom: 20,
                        ..Padding::uniform(40)
                    },
                    border_radius: 20,
                    ..LayoutSlot::new("image", SlotType::Image).at(0, 0, 12, 6)
                },
                LayoutSlot {
                    v_align: VAlign::Bottom,
                    padding: Padding::horizontal(20),
                    font_size: Some(56),
                    font_weight: Some(700),
                    line_spacing: Some(1.3),
                    ..LayoutSlot::new("title", SlotType::Title).at(1, 7, 10, 2)
                },
                LayoutSlot {
                    padding: Padding {
                        top: 8,
                        ..Padding::horizontal(20)
                    },
                    font_size: Some(38),
                    line_spacing: Some(1.5),
                    ..LayoutSlot::new("body", SlotType::Body).at(1, 9, 10, 3)
                },
            ],
            adaptive_rules: vec![
                AdaptiveRule::new("body", RuleCondition::LinesGt, 4, "title", RuleAction::ShiftRow, -1),
                AdaptiveRule::new("body", RuleCondition::LinesGt, 4, "body", RuleAction::ShiftRow, -1),
                AdaptiveRule::new("body", RuleCondition::LinesGt, 4, "body", RuleAction::ResizeRow, 1),
            ],
            ..Self::new(ContentFormat::Post)
        }
    }

    /// Default carousel layout: title on the first slide, body continues on later slides.
    pub fn default_carousel() -> Self {
        Self {
            slots: vec![
                LayoutSlot {
                    h_align: HAlign::Center,
                    v_align: VAlign::Center,
                    padding: Padding {
                        bottom: 20,
                        ..Padding::uniform(40)
                    },
                    border_radius: 20,
                    ..LayoutSlot::new("image", SlotType::Image).at(0, 0, 12, 5)
                },
                LayoutSlot {
                    v_align: VAlign::Bottom,
                    padding: Padding::horizontal(20),
                    font_size: Some(54),
                    font_weight: Some(700),
                    line_spacing: Some(1.3),
                    ..LayoutSlot::new("title", SlotType::Title).at(1, 6, 10, 2)
                },
                LayoutSlot {
                    padding: Padding {
                        top: 8,
                        ..Padding::horizontal(20)
                    },
                    font_size: Some(38),
                    line_spacing: Some(1.5),
                    ..LayoutSlot::new("body", SlotType::Body).at(1, 8, 10, 4)
                },
            ],
            max_lines_per_slide: 6,
            carousel_title_on_first: true,
            ..Self::new(ContentFormat::Carousel)
        }
    }

    /// Preset layout for `format`.
    pub fn default_for(format: ContentFormat) -> Self {
        match format {
            ContentFormat::Story => Self::default_story(),
            ContentFormat::Post => Self::default_post(),
            ContentFormat::Carousel => Self::default_carousel(),
        }
    }
}

fn clamp_to_u32(v: i64, min: i64) -> u32 {
    v.clamp(min, i64::from(u32::MAX)) as u32
}

#[cfg(test)]
#[path = "../../tests/unit/layout/grid.rs"]
mod tests;
