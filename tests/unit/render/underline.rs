use super::*;

fn boxes(line: &str, char_w: i64, y: i64, size: i64) -> Vec<WordBox> {
    let mut x = 100;
    line.split_whitespace()
        .map(|w| {
            let width = w.chars().count() as i64 * char_w;
            let b = WordBox {
                word: w.to_owned(),
                x,
                y,
                width,
                height: size,
            };
            x += width + char_w;
            b
        })
        .collect()
}

#[test]
fn phrase_spans_first_through_last_word() {
    let words = boxes("Quantum computing breakthrough today", 10, 500, 40);
    let span = locate_phrase(&words, "quantum computing").unwrap();
    assert_eq!(span.x_start, words[0].x);
    assert_eq!(span.x_end, words[1].x + words[1].width);
    assert_eq!(span.y_baseline, 540);
}

#[test]
fn phrase_match_ignores_case_and_punctuation() {
    let words = boxes("The \"Big-Data\" era, finally!", 10, 0, 20);
    let span = locate_phrase(&words, "big-data").unwrap();
    assert_eq!(span.x_start, words[1].x);
    assert!(locate_phrase(&words, "FINALLY").is_some());
    assert!(locate_phrase(&words, "era finally today").is_none());
    assert!(locate_phrase(&words, "   ").is_none());
}

#[test]
fn only_first_occurrence_is_located() {
    let words = boxes("go team go", 10, 0, 20);
    let span = locate_phrase(&words, "go").unwrap();
    assert_eq!(span.x_start, words[0].x);
}

fn span() -> PhraseSpan {
    PhraseSpan {
        x_start: 120,
        x_end: 300,
        y_baseline: 800,
    }
}

#[test]
fn strokes_are_deterministic_per_position() {
    let cfg = UnderlineConfig::default();
    for style in [UnderlineStyle::Pencil, UnderlineStyle::Marker, UnderlineStyle::Brush] {
        let a = underline_shape(style, span(), &cfg, 64);
        let b = underline_shape(style, span(), &cfg, 64);
        assert_eq!(a, b, "{style:?}");

        let moved = PhraseSpan {
            y_baseline: 801,
            ..span()
        };
        assert_ne!(a, underline_shape(style, moved, &cfg, 64), "{style:?}");
    }
}

#[test]
fn pencil_samples_every_three_pixels_per_pass() {
    let cfg = UnderlineConfig::default();
    let UnderlineShape::Strokes(segs) = underline_shape(UnderlineStyle::Pencil, span(), &cfg, 64)
    else {
        panic!("pencil draws strokes");
    };
    // x from 116 to 304 step 3: 63 points, 62 segments, per pass.
    assert_eq!(segs.len(), 62 * 2);
    assert_eq!(segs[0].from.x, 116.0);
    assert!(segs.iter().all(|s| s.width == 4.0));
    for s in &segs {
        // baseline + 6, wave <= 3, jitter <= 1.2, pass offset <= 1
        assert!((s.from.y - 806.0).abs() <= 5.2 + 1e-9, "{s:?}");
    }
}

#[test]
fn brush_tapers_toward_the_ends() {
    let cfg = UnderlineConfig {
        thickness: 10,
        passes: 1,
        ..UnderlineConfig::default()
    };
    let UnderlineShape::Strokes(segs) = underline_shape(UnderlineStyle::Brush, span(), &cfg, 64)
    else {
        panic!("brush draws strokes");
    };
    assert_eq!(segs[0].from.x, 112.0);
    let mid = segs[segs.len() / 2].width;
    assert_eq!(segs[0].width, 6.0);
    assert!(mid > segs[0].width && mid <= 10.0, "{mid}");
    assert!(segs.iter().all(|s| s.width >= 2.0));
}

#[test]
fn marker_box_jitter_stays_in_range() {
    let cfg = UnderlineConfig::default();
    for x_start in 0..40 {
        let s = PhraseSpan {
            x_start,
            x_end: x_start + 200,
            y_baseline: 500,
        };
        let UnderlineShape::RoundedBox { rect, radius } =
            underline_shape(UnderlineStyle::Marker, s, &cfg, 64)
        else {
            panic!("marker draws a box");
        };
        assert_eq!(radius, 4.0);
        let j1 = x_start as f64 - rect.x0;
        let j3 = rect.x1 - (x_start + 200) as f64;
        assert!((2.0..=6.0).contains(&j1) && (2.0..=6.0).contains(&j3));
        // y_top = 500 - 64 + 4 = 440; y_bottom = 440 + 64 + 16 = 520
        assert!((rect.y0 - 440.0).abs() <= 2.0);
        assert!((rect.y1 - 520.0).abs() <= 2.0);
    }
}

#[test]
fn drawing_blends_only_under_the_phrase() {
    let canvas = Canvas {
        width: 400,
        height: 120,
    };
    let mut px = [0u8, 0, 0, 255].repeat((canvas.width * canvas.height) as usize);
    let cfg = UnderlineConfig::default();
    let s = PhraseSpan {
        x_start: 100,
        x_end: 300,
        y_baseline: 60,
    };
    let shape = underline_shape(UnderlineStyle::Pencil, s, &cfg, 40);
    let color = cfg.color.with_opacity(cfg.opacity);
    draw_underline(&mut px, canvas, &shape, color).unwrap();

    let at = |x: u32, y: u32| {
        let i = ((y * canvas.width + x) * 4) as usize;
        [px[i], px[i + 1], px[i + 2], px[i + 3]]
    };
    let touched: Vec<_> = (0..canvas.height)
        .map(|y| at(200, y))
        .filter(|p| p[0] > 0)
        .collect();
    assert!(!touched.is_empty());
    // Overlapping passes do not exceed the single-layer color.
    assert!(touched.iter().all(|p| p[0] <= 217 && p[3] == 255));
    assert_eq!(at(20, 66), [0, 0, 0, 255]);
    assert_eq!(at(200, 10), [0, 0, 0, 255]);
}

#[test]
fn transparent_color_draws_nothing() {
    let canvas = Canvas {
        width: 50,
        height: 50,
    };
    let mut px = vec![0u8; canvas.rgba_len()];
    let shape = UnderlineShape::RoundedBox {
        rect: Rect::new(5.0, 5.0, 40.0, 40.0),
        radius: 4.0,
    };
    draw_underline(&mut px, canvas, &shape, ColorRgba8::rgba(255, 0, 0, 0)).unwrap();
    assert!(px.iter().all(|&b| b == 0));
}
