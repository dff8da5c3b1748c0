//! Template documents: styling defaults plus an optional grid layout.
//!
//! Every section carries `#[serde(default)]`, so a document only needs the fields it changes.

use std::borrow::Cow;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::assets::color::ColorRgba8;
use crate::foundation::error::{StoryError, StoryResult};
use crate::layout::grid::{ContentFormat, GridConfig};

/// Complete template document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryTemplate {
    pub name: String,
    pub format: ContentFormat,
    pub width: u32,
    pub height: u32,
    pub font: FontConfig,
    pub underline: UnderlineConfig,
    pub image: ImageConfig,
    /// Pre-grid text placement; still decides the body wrap width.
    pub layout: LegacyLayoutConfig,
    pub background: BackgroundConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridConfig>,
}

impl Default for StoryTemplate {
    fn default() -> Self {
        let canvas = ContentFormat::Story.canvas();
        Self {
            name: "default".to_owned(),
            format: ContentFormat::Story,
            width: canvas.width,
            height: canvas.height,
            font: FontConfig::default(),
            underline: UnderlineConfig::default(),
            image: ImageConfig::default(),
            layout: LegacyLayoutConfig::default(),
            background: BackgroundConfig::default(),
            grid: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub family: String,
    /// Body text size.
    pub size: u32,
    /// Title text size.
    pub bold_size: u32,
    pub line_spacing: f32,
    pub color: ColorRgba8,
    pub shadow_color: Option<ColorRgba8>,
    pub shadow_offset: (i32, i32),
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: "Arial".to_owned(),
            size: 64,
            bold_size: 72,
            line_spacing: 1.4,
            color: ColorRgba8::WHITE,
            shadow_color: Some(ColorRgba8::rgba(0, 0, 0, 0x80)),
            shadow_offset: (3, 3),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnderlineStyle {
    /// Thin wavy multi-pass line.
    #[default]
    Pencil,
    /// Translucent highlighter box behind the words.
    Marker,
    /// Thick tapered stroke.
    Brush,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnderlineConfig {
    pub style: UnderlineStyle,
    pub color: ColorRgba8,
    pub thickness: u32,
    pub opacity: f32,
    pub wave_amplitude: f64,
    pub wave_frequency: f64,
    pub marker_height: i64,
    pub marker_y_offset: i64,
    pub passes: u32,
}

impl Default for UnderlineConfig {
    fn default() -> Self {
        Self {
            style: UnderlineStyle::Pencil,
            color: ColorRgba8::rgb(0xFF, 0x6B, 0x35),
            thickness: 4,
            opacity: 0.85,
            wave_amplitude: 3.0,
            wave_frequency: 0.15,
            marker_height: 16,
            marker_y_offset: 4,
            passes: 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImagePosition {
    #[default]
    Top,
    Center,
    Bottom,
    Fill,
}

/// Image styling; grid slots override radius and shadow per slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub position: ImagePosition,
    pub max_width_ratio: f32,
    pub max_height_ratio: f32,
    pub border_radius: u32,
    pub y_offset: i32,
    pub shadow: bool,
    pub shadow_blur: u32,
    pub shadow_color: ColorRgba8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            position: ImagePosition::Top,
            max_width_ratio: 0.9,
            max_height_ratio: 0.45,
            border_radius: 20,
            y_offset: 120,
            shadow: true,
            shadow_blur: 15,
            shadow_color: ColorRgba8::rgba(0, 0, 0, 0x60),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextArea {
    Top,
    #[default]
    Bottom,
    Center,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyLayoutConfig {
    pub padding_left: u32,
    pub padding_right: u32,
    pub padding_top: u32,
    pub padding_bottom: u32,
    pub text_area: TextArea,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_y_start: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_max_width: Option<u32>,
}

impl Default for LegacyLayoutConfig {
    fn default() -> Self {
        Self {
            padding_left: 60,
            padding_right: 60,
            padding_top: 80,
            padding_bottom: 100,
            text_area: TextArea::Bottom,
            text_y_start: None,
            text_max_width: None,
        }
    }
}

impl LegacyLayoutConfig {
    /// Body wrap width: `text_max_width`, or the canvas width minus side padding.
    pub fn text_width(&self, canvas_width: u32) -> u32 {
        self.text_max_width.unwrap_or_else(|| {
            canvas_width
                .saturating_sub(self.padding_left)
                .saturating_sub(self.padding_right)
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientDirection {
    /// Transparent at the top, darkest at the bottom.
    #[default]
    Bottom,
    Top,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    pub overlay_color: ColorRgba8,
    /// Flat overlay only; gradients use the start/end opacities.
    pub overlay_opacity: f32,
    pub gradient: bool,
    pub gradient_direction: GradientDirection,
    pub gradient_start_opacity: f32,
    pub gradient_end_opacity: f32,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            overlay_color: ColorRgba8::BLACK,
            overlay_opacity: 0.45,
            gradient: true,
            gradient_direction: GradientDirection::Bottom,
            gradient_start_opacity: 0.0,
            gradient_end_opacity: 0.75,
        }
    }
}

/// Style suggestions from an image-analysis step. Every present hint replaces the matching
/// template default.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleHints {
    pub font_color: Option<ColorRgba8>,
    pub accent_color: Option<ColorRgba8>,
    pub underline_style: Option<UnderlineStyle>,
    pub overlay_color: Option<ColorRgba8>,
    pub overlay_opacity: Option<f32>,
    pub gradient_direction: Option<GradientDirection>,
}

impl StoryTemplate {
    /// Template for `format` with its preset grid and matching canvas size.
    pub fn for_format(format: ContentFormat) -> Self {
        let canvas = format.canvas();
        Self {
            name: format.label().to_owned(),
            format,
            width: canvas.width,
            height: canvas.height,
            grid: Some(GridConfig::default_for(format)),
            ..Self::default()
        }
    }

    /// The template's grid, or the preset for its format when none is set.
    pub fn effective_grid(&self) -> Cow<'_, GridConfig> {
        match &self.grid {
            Some(grid) => Cow::Borrowed(grid),
            None => Cow::Owned(GridConfig::default_for(self.format)),
        }
    }

    pub fn validate(&self) -> StoryResult<()> {
        let grid = self.effective_grid();
        grid.validate()?;
        let canvas = grid.canvas();
        if (self.width, self.height) != (canvas.width, canvas.height) {
            tracing::warn!(
                template = %self.name,
                width = self.width,
                height = self.height,
                canvas_width = canvas.width,
                canvas_height = canvas.height,
                "template size differs from grid format; rendering at the format size"
            );
        }
        Ok(())
    }

    pub fn apply_style_hints(&mut self, hints: &StyleHints) {
        if let Some(c) = hints.font_color {
            self.font.color = c;
        }
        if let Some(c) = hints.accent_color {
            self.underline.color = c;
        }
        if let Some(s) = hints.underline_style {
            self.underline.style = s;
        }
        if let Some(c) = hints.overlay_color {
            self.background.overlay_color = c;
        }
        if let Some(o) = hints.overlay_opacity {
            self.background.overlay_opacity = o.clamp(0.0, 1.0);
        }
        if let Some(d) = hints.gradient_direction {
            self.background.gradient_direction = d;
        }
    }

    pub fn from_json_str(s: &str) -> StoryResult<Self> {
        serde_json::from_str(s).map_err(|e| StoryError::config(format!("parse template JSON: {e}")))
    }

    pub fn from_reader<R: std::io::Read>(r: R) -> StoryResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| StoryError::config(format!("parse template JSON: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> StoryResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            StoryError::config(format!("open template JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn to_json_pretty(&self) -> StoryResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| StoryError::serde(format!("serialize template JSON: {e}")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/template/model.rs"]
mod tests;
