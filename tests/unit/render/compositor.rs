use super::*;
use crate::assets::decode::parse_svg;
use crate::layout::grid::{AdaptiveRule, ContentFormat, RuleAction, RuleCondition};
use crate::template::model::{
    BackgroundConfig, FontConfig, ImageConfig, UnderlineConfig, UnderlineStyle,
};
use crate::text::font::FontResolverOpts;

fn composer(template: StoryTemplate) -> StoryComposer {
    let fonts = Arc::new(FontResolver::new(FontResolverOpts::builtin_only()));
    StoryComposer::with_fonts(template, fonts).unwrap()
}

fn solid(w: u32, h: u32, rgba: [u8; 4]) -> PreparedImage {
    PreparedImage::from_straight_rgba8(w, h, rgba.repeat((w * h) as usize)).unwrap()
}

/// Template whose background ends up flat black, with no text or image shadows.
fn plain_template(grid: GridConfig) -> StoryTemplate {
    let canvas = grid.format.canvas();
    StoryTemplate {
        format: grid.format,
        width: canvas.width,
        height: canvas.height,
        font: FontConfig {
            shadow_color: None,
            ..FontConfig::default()
        },
        image: ImageConfig {
            shadow: false,
            ..ImageConfig::default()
        },
        background: BackgroundConfig {
            gradient: false,
            overlay_opacity: 1.0,
            ..BackgroundConfig::default()
        },
        grid: Some(grid),
        ..StoryTemplate::default()
    }
}

fn body_slot() -> LayoutSlot {
    LayoutSlot {
        font_size: Some(40),
        ..LayoutSlot::new("body", SlotType::Body).at(1, 1, 10, 3)
    }
}

fn pixel(frame: &FrameRgba, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [frame.data[i], frame.data[i + 1], frame.data[i + 2], frame.data[i + 3]]
}

fn render_body(c: &mut StoryComposer, lines: &[WrappedLine]) -> FrameRgba {
    let image = solid(4, 4, [0, 0, 0, 255]);
    c.render(&RenderInputs {
        image: &image,
        body: lines,
        title: None,
        graphic: None,
    })
    .unwrap()
}

#[test]
fn text_style_falls_back_to_template_font() {
    let c = composer(StoryTemplate::for_format(ContentFormat::Story));

    let title = c.text_style(&LayoutSlot::new("t", SlotType::Title));
    assert_eq!(title.font.key.size, 72);
    assert_eq!(title.font.key.weight, WEIGHT_BOLD);
    assert_eq!(title.color, ColorRgba8::WHITE);
    assert_eq!(title.line_spacing, 1.4);

    let body = c.text_style(&LayoutSlot::new("b", SlotType::Body));
    assert_eq!(body.font.key.size, 64);
    assert_eq!(body.font.key.weight, WEIGHT_REGULAR);
    assert_eq!(body.line_height(), 89);

    let preset_title = c.text_style(c.grid().get_slot("title").unwrap());
    assert_eq!(preset_title.font.key.size, 66);
    assert_eq!(preset_title.line_height(), 85);
}

#[test]
fn invalid_grid_is_rejected_up_front() {
    let mut grid = GridConfig::new(ContentFormat::Story);
    grid.slots = vec![body_slot(), body_slot()];
    let fonts = Arc::new(FontResolver::new(FontResolverOpts::builtin_only()));
    let err = StoryComposer::with_fonts(plain_template(grid), fonts).unwrap_err();
    assert!(matches!(err, StoryError::Config(_)));
}

#[test]
fn metrics_count_lines_per_slot_type() {
    let c = composer(StoryTemplate::for_format(ContentFormat::Story));
    let image = solid(2, 2, [0, 0, 0, 255]);
    let body = vec![WrappedLine::new("one"), WrappedLine::new("two")];
    let title = vec![WrappedLine::new("head")];

    let m = c.content_metrics(&RenderInputs {
        image: &image,
        body: &body,
        title: Some(&title),
        graphic: None,
    });
    assert_eq!(m.get("body"), 2);
    assert_eq!(m.get("title"), 1);
    assert_eq!(m.get("image"), 1);

    let m = c.content_metrics(&RenderInputs {
        image: &image,
        body: &[],
        title: None,
        graphic: None,
    });
    assert_eq!(m.get("body"), 0);
    assert_eq!(m.get("title"), 0);
}

#[test]
fn render_is_deterministic_and_opaque() {
    let mut c = composer(StoryTemplate::for_format(ContentFormat::Post));
    let image = solid(16, 9, [30, 120, 200, 255]);
    let body = c.wrap_body("Quantum computing is here at last", &["quantum computing".to_owned()]);
    let title = c.wrap_for_slot("title", "Big news", &[]).unwrap();
    let inputs = RenderInputs {
        image: &image,
        body: &body,
        title: Some(&title),
        graphic: None,
    };

    let a = c.render(&inputs).unwrap();
    let b = c.render(&inputs).unwrap();
    assert_eq!((a.width, a.height), (1080, 1350));
    assert_eq!(a.data.len(), 1080 * 1350 * 4);
    assert!(a.premultiplied);
    assert!(a.data.chunks_exact(4).all(|p| p[3] == 255));
    assert_eq!(a, b);
}

#[test]
fn gradient_overlay_darkens_toward_its_direction() {
    let mut grid = GridConfig::new(ContentFormat::Story);
    grid.slots = vec![LayoutSlot::new("gap", SlotType::Spacer)];
    let mut template = plain_template(grid);
    template.background.gradient = true;
    let image = solid(8, 8, [255, 255, 255, 255]);

    let mut c = composer(template.clone());
    let frame = c
        .render(&RenderInputs {
            image: &image,
            body: &[],
            title: None,
            graphic: None,
        })
        .unwrap();
    assert!(pixel(&frame, 540, 0)[0] >= 250);
    let bottom = pixel(&frame, 540, 1919)[0];
    assert!((55..=75).contains(&bottom), "{bottom}");

    template.background.gradient_direction = GradientDirection::Top;
    let mut c = composer(template);
    let frame = c
        .render(&RenderInputs {
            image: &image,
            body: &[],
            title: None,
            graphic: None,
        })
        .unwrap();
    assert!(pixel(&frame, 540, 1919)[0] >= 250);
    assert!(pixel(&frame, 540, 0)[0] <= 75);
}

#[test]
fn flat_overlay_uses_overlay_opacity() {
    let mut grid = GridConfig::new(ContentFormat::Story);
    grid.slots = vec![LayoutSlot::new("gap", SlotType::Spacer)];
    let mut template = plain_template(grid);
    template.background.overlay_opacity = 0.45;
    let image = solid(8, 8, [255, 255, 255, 255]);

    let mut c = composer(template);
    let frame = c
        .render(&RenderInputs {
            image: &image,
            body: &[],
            title: None,
            graphic: None,
        })
        .unwrap();
    // alpha 114 over white leaves 141.
    for (x, y) in [(0, 0), (540, 960), (1079, 1919)] {
        let r = pixel(&frame, x, y)[0];
        assert!((139..=143).contains(&r), "({x}, {y}) = {r}");
    }
}

#[test]
fn body_text_is_placed_by_alignment() {
    let mut grid = GridConfig::new(ContentFormat::Story);
    grid.slots = vec![body_slot()];
    let lines = [WrappedLine::new("ab")];

    // Slot rect (90, 160, 900, 480); built-in glyph boxes span 0.06..0.49 of the size
    // horizontally and 0.2..0.9 vertically.
    let mut c = composer(plain_template(grid.clone()));
    let frame = render_body(&mut c, &lines);
    assert!(pixel(&frame, 100, 180)[0] > 200);
    assert_eq!(pixel(&frame, 112, 180), [0, 0, 0, 255]);
    assert_eq!(pixel(&frame, 100, 162), [0, 0, 0, 255]);

    // Line width 44 centred in 900: starts at 518.
    grid.slots[0].h_align = HAlign::Center;
    let mut c = composer(plain_template(grid.clone()));
    let frame = render_body(&mut c, &lines);
    assert!(pixel(&frame, 525, 180)[0] > 200);
    assert_eq!(pixel(&frame, 100, 180), [0, 0, 0, 255]);

    // Line height floor(40 * 1.4) = 56 sits on the bottom edge at 640.
    grid.slots[0].h_align = HAlign::Left;
    grid.slots[0].v_align = VAlign::Bottom;
    let mut c = composer(plain_template(grid));
    let frame = render_body(&mut c, &lines);
    assert!(pixel(&frame, 100, 600)[0] > 200);
    assert_eq!(pixel(&frame, 100, 180), [0, 0, 0, 255]);
}

#[test]
fn highlighted_phrase_gets_a_marker_box() {
    let mut grid = GridConfig::new(ContentFormat::Story);
    grid.slots = vec![body_slot()];
    let mut template = plain_template(grid);
    template.underline = UnderlineConfig {
        style: UnderlineStyle::Marker,
        color: ColorRgba8::rgb(255, 0, 0),
        opacity: 1.0,
        ..UnderlineConfig::default()
    };
    let mut c = composer(template);

    let plain = render_body(&mut c, &[WrappedLine::new("ab")]);
    assert_eq!(pixel(&plain, 112, 190), [0, 0, 0, 255]);

    let marked = WrappedLine {
        text: "ab".to_owned(),
        highlights: vec!["ab".to_owned()],
    };
    let frame = render_body(&mut c, &[marked]);
    assert_eq!(pixel(&frame, 112, 190), [255, 0, 0, 255]);
    // The box ends a few pixels past the last word.
    assert_eq!(pixel(&frame, 160, 190), [0, 0, 0, 255]);
}

fn image_grid() -> GridConfig {
    let mut grid = GridConfig::new(ContentFormat::Story);
    grid.slots = vec![
        LayoutSlot {
            image_mode: ImageMode::FillSlot,
            ..LayoutSlot::new("image", SlotType::Image).at(0, 0, 6, 6)
        },
        LayoutSlot::new("body", SlotType::Body).at(0, 8, 12, 3),
    ];
    grid
}

fn render_image(grid: GridConfig, body: &[WrappedLine]) -> FrameRgba {
    let mut c = composer(plain_template(grid));
    let image = solid(10, 10, [255, 0, 0, 255]);
    c.render(&RenderInputs {
        image: &image,
        body,
        title: None,
        graphic: None,
    })
    .unwrap()
}

#[test]
fn fill_slot_image_covers_its_rect() {
    let frame = render_image(image_grid(), &[]);
    let inside = pixel(&frame, 100, 100);
    assert!(inside[0] >= 250 && inside[1] <= 5, "{inside:?}");
    assert_eq!(pixel(&frame, 700, 100), [0, 0, 0, 255]);
    assert_eq!(pixel(&frame, 100, 1000), [0, 0, 0, 255]);
}

#[test]
fn slot_opacity_scales_the_image() {
    let mut grid = image_grid();
    grid.slots[0].opacity = 0.5;
    let frame = render_image(grid, &[]);
    let r = pixel(&frame, 100, 100)[0];
    assert!((120..=136).contains(&r), "{r}");
}

#[test]
fn background_mode_image_slot_draws_nothing() {
    let mut grid = image_grid();
    grid.slots[0].image_mode = ImageMode::Background;
    let frame = render_image(grid, &[]);
    assert_eq!(pixel(&frame, 100, 100), [0, 0, 0, 255]);
}

#[test]
fn hide_rule_removes_the_slot_from_the_frame() {
    let mut grid = image_grid();
    grid.adaptive_rules = vec![AdaptiveRule::new(
        "body",
        RuleCondition::LinesGt,
        0,
        "image",
        RuleAction::Hide,
        0,
    )];
    let shown = render_image(grid.clone(), &[]);
    assert!(pixel(&shown, 100, 100)[0] >= 250);

    let hidden = render_image(grid, &[WrappedLine::new("x")]);
    assert_eq!(pixel(&hidden, 100, 100), [0, 0, 0, 255]);
}

#[test]
fn svg_graphic_is_fitted_and_centred() {
    let svg = parse_svg(
        br##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
            <rect x="0" y="0" width="10" height="10" fill="#0000ff"/>
        </svg>"##,
    )
    .unwrap();
    let graphic = GraphicSource::Svg(svg);

    let mut grid = GridConfig::new(ContentFormat::Story);
    grid.slots = vec![LayoutSlot::new("graphic", SlotType::Graphic).at(6, 0, 6, 6)];
    let image = solid(4, 4, [0, 0, 0, 255]);

    let render = |grid: GridConfig, graphic: Option<&GraphicSource>| {
        let mut c = composer(plain_template(grid));
        c.render(&RenderInputs {
            image: &image,
            body: &[],
            title: None,
            graphic,
        })
        .unwrap()
    };

    // Rect (540, 0, 540, 960): the square lands at y 210..750.
    let frame = render(grid.clone(), Some(&graphic));
    assert_eq!(pixel(&frame, 810, 480), [0, 0, 255, 255]);
    assert_eq!(pixel(&frame, 810, 100), [0, 0, 0, 255]);
    assert_eq!(pixel(&frame, 600, 480), [0, 0, 255, 255]);

    let frame = render(grid.clone(), None);
    assert_eq!(pixel(&frame, 810, 480), [0, 0, 0, 255]);

    // Half scale: 270x270 at x 675..945.
    grid.slots[0].scale = 0.5;
    let frame = render(grid, Some(&graphic));
    assert_eq!(pixel(&frame, 810, 480), [0, 0, 255, 255]);
    assert_eq!(pixel(&frame, 600, 480), [0, 0, 0, 255]);
}

#[test]
fn oversized_graphic_scale_is_clipped_to_canvas() {
    let svg = parse_svg(
        br##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
            <rect x="0" y="0" width="10" height="10" fill="#0000ff"/>
        </svg>"##,
    )
    .unwrap();
    let graphic = GraphicSource::Svg(svg);

    // Rect (270, 480, 540, 960) at scale 20: a 10800 px square centred on the canvas.
    let mut grid = GridConfig::new(ContentFormat::Story);
    grid.slots = vec![LayoutSlot::new("graphic", SlotType::Graphic).at(3, 3, 6, 6)];
    grid.slots[0].scale = 20.0;
    let image = solid(4, 4, [0, 0, 0, 255]);

    let mut c = composer(plain_template(grid));
    let frame = c
        .render(&RenderInputs {
            image: &image,
            body: &[],
            title: None,
            graphic: Some(&graphic),
        })
        .unwrap();
    assert_eq!(pixel(&frame, 10, 10), [0, 0, 255, 255]);
    assert_eq!(pixel(&frame, 540, 960), [0, 0, 255, 255]);
    assert_eq!(pixel(&frame, 1070, 1910), [0, 0, 255, 255]);
}

fn carousel_grid(title_on_first: bool) -> GridConfig {
    let mut grid = GridConfig::new(ContentFormat::Carousel);
    grid.slots = vec![
        LayoutSlot {
            font_size: Some(40),
            ..LayoutSlot::new("title", SlotType::Title).at(0, 0, 12, 1)
        },
        LayoutSlot {
            font_size: Some(40),
            ..LayoutSlot::new("body", SlotType::Body).at(0, 6, 12, 6)
        },
    ];
    grid.max_lines_per_slide = 2;
    grid.carousel_title_on_first = title_on_first;
    grid
}

#[test]
fn carousel_chunks_body_lines() {
    let mut c = composer(plain_template(carousel_grid(true)));
    let image = solid(4, 4, [0, 0, 0, 255]);
    let lines: Vec<_> = (0..5).map(|i| WrappedLine::new(format!("l{i}"))).collect();

    assert_eq!(c.render_carousel(&image, &lines, None, None).unwrap().len(), 3);
    assert_eq!(c.render_carousel(&image, &lines[..4], None, None).unwrap().len(), 2);
    assert_eq!(c.render_carousel(&image, &[], None, None).unwrap().len(), 1);
}

#[test]
fn carousel_title_only_on_first_slide() {
    let image = solid(4, 4, [0, 0, 0, 255]);
    let lines: Vec<_> = (0..3).map(|i| WrappedLine::new(format!("l{i}"))).collect();
    let title = vec![WrappedLine::new("ab")];

    let mut c = composer(plain_template(carousel_grid(true)));
    let frames = c
        .render_carousel(&image, &lines, Some(&title), None)
        .unwrap();
    assert_eq!(frames.len(), 2);
    assert!(pixel(&frames[0], 10, 20)[0] > 200);
    assert_eq!(pixel(&frames[1], 10, 20), [0, 0, 0, 255]);

    let mut c = composer(plain_template(carousel_grid(false)));
    let frames = c
        .render_carousel(&image, &lines, Some(&title), None)
        .unwrap();
    assert!(frames.iter().all(|f| pixel(f, 10, 20) == [0, 0, 0, 255]));
}

#[test]
fn wrap_for_slot_uses_slot_width_and_font() {
    let mut c = composer(StoryTemplate::for_format(ContentFormat::Story));
    assert!(c.wrap_for_slot("missing", "text", &[]).is_none());

    // Title rect is 852 px wide at 66 px: 36.3 px per character.
    let lines = c
        .wrap_for_slot("title", "breaking news from the quantum lab today", &[])
        .unwrap();
    assert!(lines.len() > 1);
    for line in &lines {
        assert!(crate::text::engine::builtin_width(&line.text, 66.0) <= 852.0, "{line:?}");
    }
}

#[test]
fn png_encoding_keeps_straight_alpha() {
    let frame = FrameRgba {
        width: 2,
        height: 1,
        data: vec![128, 0, 0, 128, 0, 0, 255, 255],
        premultiplied: true,
    };
    assert_eq!(frame.to_straight_rgba(), vec![255, 0, 0, 128, 0, 0, 255, 255]);

    let png = frame.encode_png().unwrap();
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (2, 1));
    assert_eq!(decoded.into_raw(), frame.to_straight_rgba());
}
