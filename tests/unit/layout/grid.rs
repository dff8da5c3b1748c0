use super::*;

#[test]
fn format_dimensions_are_fixed() {
    assert_eq!(ContentFormat::Story.canvas(), Canvas { width: 1080, height: 1920 });
    assert_eq!(ContentFormat::Post.canvas(), Canvas { width: 1080, height: 1350 });
    assert_eq!(ContentFormat::Carousel.canvas(), Canvas { width: 1080, height: 1350 });
}

#[test]
fn format_labels_parse_case_insensitively() {
    assert_eq!("Story".parse::<ContentFormat>().unwrap(), ContentFormat::Story);
    assert_eq!(" carousel ".parse::<ContentFormat>().unwrap(), ContentFormat::Carousel);

    let err = "reel".parse::<ContentFormat>().unwrap_err();
    assert!(err.to_string().contains("config error:"));
    assert!(err.to_string().contains("reel"));
}

#[test]
fn unknown_format_in_document_is_rejected() {
    let err = serde_json::from_value::<GridConfig>(serde_json::json!({
        "format": "billboard",
        "slots": []
    }))
    .unwrap_err();
    assert!(err.to_string().contains("billboard"));
}

#[test]
fn story_cells_are_90_by_160() {
    let grid = GridConfig::new(ContentFormat::Story);
    assert_eq!(grid.cell_width(), 90.0);
    assert_eq!(grid.cell_height(), 160.0);
}

#[test]
fn title_rect_matches_cell_math() {
    let grid = GridConfig::new(ContentFormat::Story);
    let slot = LayoutSlot {
        padding: Padding::horizontal(24),
        ..LayoutSlot::new("title", SlotType::Title).at(1, 7, 10, 2)
    };
    assert_eq!(grid.slot_pixel_rect(&slot), PixelRect::new(114, 1120, 852, 320));
}

#[test]
fn post_rect_floors_fractional_cells() {
    // 1350 / 12 = 112.5
    let grid = GridConfig::new(ContentFormat::Post);
    let slot = LayoutSlot::new("body", SlotType::Body).at(0, 1, 12, 3);
    assert_eq!(grid.slot_pixel_rect(&slot), PixelRect::new(0, 112, 1080, 337));
}

#[test]
fn degenerate_geometry_is_clamped_not_rejected() {
    let grid = GridConfig::new(ContentFormat::Story);
    for col_start in -20..20 {
        for span in -4..16 {
            for pad in [0, 50, 900, 4000] {
                let slot = LayoutSlot {
                    padding: Padding {
                        top: pad,
                        bottom: pad,
                        left: -pad,
                        right: pad,
                    },
                    ..LayoutSlot::new("s", SlotType::Spacer).at(col_start, col_start, span, span)
                };
                let r = grid.slot_pixel_rect(&slot);
                assert!(r.width >= 1, "{col_start} {span} {pad}: {r:?}");
                assert!(r.height >= 1, "{col_start} {span} {pad}: {r:?}");
            }
        }
    }
}

#[test]
fn negative_offsets_clamp_to_zero() {
    let grid = GridConfig::new(ContentFormat::Post);
    let slot = LayoutSlot {
        padding: Padding {
            left: -300,
            top: -300,
            ..Padding::default()
        },
        ..LayoutSlot::new("s", SlotType::Graphic).at(0, 0, 2, 2)
    };
    let r = grid.slot_pixel_rect(&slot);
    assert_eq!((r.x, r.y), (0, 0));
}

#[test]
fn validate_rejects_non_twelve_grid_and_duplicate_names() {
    let mut grid = GridConfig::default_post();
    assert!(grid.validate().is_ok());

    grid.cols = 10;
    assert!(grid.validate().is_err());

    let mut grid = GridConfig::default_post();
    grid.slots.push(LayoutSlot::new("body", SlotType::Body));
    let err = grid.validate().unwrap_err();
    assert!(err.to_string().contains("duplicate slot name 'body'"));
}

#[test]
fn presets_carry_expected_geometry() {
    let story = GridConfig::default_for(ContentFormat::Story);
    assert_eq!(story.format, ContentFormat::Story);
    assert_eq!(story.adaptive_rules.len(), 4);
    let title = story.get_slot("title").unwrap();
    assert_eq!((title.col_start, title.row_start, title.col_span, title.row_span), (1, 7, 10, 2));
    assert_eq!(title.font_size, Some(66));

    let post = GridConfig::default_for(ContentFormat::Post);
    assert_eq!(post.adaptive_rules.len(), 3);
    assert_eq!(post.get_slot("image").unwrap().row_span, 6);

    let carousel = GridConfig::default_for(ContentFormat::Carousel);
    assert!(carousel.adaptive_rules.is_empty());
    assert_eq!(carousel.max_lines_per_slide, 6);
    assert!(carousel.carousel_title_on_first);
    assert!(carousel.get_slot("missing").is_none());
}

#[test]
fn grid_document_round_trips() {
    for format in ContentFormat::ALL {
        let mut grid = GridConfig::default_for(format);
        grid.slots.push(LayoutSlot {
            z_index: 3,
            font_color: Some(ColorRgba8::rgba(10, 20, 30, 128)),
            font_family: Some("Inter".to_owned()),
            image_mode: ImageMode::FillSlot,
            opacity: 0.5,
            scale: 0.8,
            shadow_color: Some(ColorRgba8::BLACK),
            shadow_blur: Some(12),
            ..LayoutSlot::new("badge", SlotType::Graphic).at(9, 0, 3, 2)
        });

        let json = serde_json::to_string(&grid).unwrap();
        let back: GridConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);
    }
}

#[test]
fn slot_accepts_flat_padding_keys_and_defaults() {
    let slot: LayoutSlot = serde_json::from_value(serde_json::json!({
        "name": "title",
        "slot_type": "title",
        "col_start": 1,
        "row_start": 7,
        "padding_left": 24,
        "padding_right": 24
    }))
    .unwrap();

    assert_eq!(slot.padding, Padding::horizontal(24));
    assert_eq!(slot.col_span, 12);
    assert_eq!(slot.row_span, 3);
    assert_eq!(slot.opacity, 1.0);
    assert_eq!(slot.image_mode, ImageMode::Slot);
    assert_eq!(slot.h_align, HAlign::Left);
    assert_eq!(slot.v_align, VAlign::Top);
}

#[test]
fn rule_document_uses_snake_case_names() {
    let rule: AdaptiveRule = serde_json::from_value(serde_json::json!({
        "slot_name": "body",
        "condition": "lines_gt",
        "threshold": 4,
        "target_slot": "title",
        "action": "change_font_size",
        "value": -6
    }))
    .unwrap();
    assert_eq!(
        rule,
        AdaptiveRule::new("body", RuleCondition::LinesGt, 4, "title", RuleAction::ChangeFontSize, -6)
    );
}

#[test]
fn metrics_default_missing_slots_to_zero() {
    let m = ContentMetrics::new().with("body", 7);
    assert_eq!(m.get("body"), 7);
    assert_eq!(m.get("title"), 0);
}
