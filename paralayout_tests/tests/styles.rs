// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spans and options that change the shape of lines.

use paralayout::spannable::SpanFlags;
use paralayout::{Alignment, Layout, StaticLayout};
use paralayout_dev::{AlignSpan, Indent, SizeSpan, TabStop};

use crate::util::{Text, assert_line_table_invariants, paint, span, tall_paint};

#[test]
fn styles_fallback_spacing_makes_room_for_tall_glyphs() {
    let text = "a\u{6587}";
    let p = tall_paint(4);
    let roomy = StaticLayout::builder(&text, 0..text.len(), &p, 200)
        .unwrap()
        .include_pad(false)
        .build();
    assert_eq!(roomy.line_ascent(0), -12);
    assert_eq!(roomy.line_descent(0), 6);
    assert_eq!(roomy.height(), 18);

    let tight = StaticLayout::builder(&text, 0..text.len(), &p, 200)
        .unwrap()
        .include_pad(false)
        .fallback_line_spacing(false)
        .build();
    assert_eq!(tight.line_ascent(0), -8);
    assert_eq!(tight.height(), 10, "font metrics only");
}

#[test]
fn styles_size_span_raises_its_line() {
    let mut text = Text::from_text("small BIG");
    text.set_span(span(SizeSpan(2.0)), 6..9, SpanFlags::EXCLUSIVE_EXCLUSIVE)
        .unwrap();
    let layout = StaticLayout::builder(&text, 0..9, &paint(), 1000)
        .unwrap()
        .include_pad(false)
        .build();
    assert_eq!(layout.line_count(), 1);
    assert_eq!(layout.line_ascent(0), -16);
    assert_eq!(layout.line_descent(0), 4);
    assert_eq!(layout.height(), 20);
    assert_eq!(layout.primary_horizontal(&text, 6), 60.0);
    assert_eq!(layout.primary_horizontal(&text, 9), 120.0, "double width");
}

#[test]
fn styles_indent_covers_its_first_lines() {
    for (first_lines, expected_lines) in [(1, 2), (2, 3)] {
        let mut text = Text::from_text("aaa bbb ccc");
        let indent = Indent {
            first: 20,
            rest: 0,
            first_lines,
        };
        text.set_span(span(indent), 0..11, SpanFlags::PARAGRAPH)
            .unwrap();
        let layout = StaticLayout::builder(&text, 0..11, &paint(), 75)
            .unwrap()
            .build();
        let case = format!("first_lines = {first_lines}");
        assert_line_table_invariants(&layout, 0..11, &case);
        assert_eq!(layout.line_count(), expected_lines, "{case}");
        assert_eq!(layout.line_start(1), 4, "{case}");
        for line in 0..expected_lines {
            let margin = if line < first_lines { 20 } else { 0 };
            assert_eq!(
                layout.paragraph_leading_margin(&text, line),
                margin,
                "{case}, line {line}"
            );
        }
        assert_eq!(layout.primary_horizontal(&text, 0), 20.0, "{case}");
    }
}

#[test]
fn styles_tab_stop_span_moves_the_tab() {
    let mut text = Text::from_text("a\tb");
    let plain = StaticLayout::builder(&text, 0..3, &paint(), 200)
        .unwrap()
        .build();
    assert!(plain.line_contains_tab(0));
    assert_eq!(plain.primary_horizontal(&text, 2), 20.0, "implicit stop");

    text.set_span(span(TabStop(35.0)), 0..3, SpanFlags::PARAGRAPH)
        .unwrap();
    let stopped = StaticLayout::builder(&text, 0..3, &paint(), 200)
        .unwrap()
        .build();
    assert_eq!(stopped.primary_horizontal(&text, 2), 35.0);
    assert_eq!(stopped.line_max(&text, 0), 45.0);
}

#[test]
fn styles_alignment_span_wins_over_the_base_alignment() {
    let mut text = Text::from_text("abc\ndef");
    text.set_span(span(AlignSpan(Alignment::Center)), 4..7, SpanFlags::PARAGRAPH)
        .unwrap();
    let layout = StaticLayout::builder(&text, 0..7, &paint(), 100)
        .unwrap()
        .alignment(Alignment::Opposite)
        .build();
    assert_eq!(layout.paragraph_alignment(&text, 0), Alignment::Opposite);
    assert_eq!(layout.line_left(&text, 0), 70.0);
    assert_eq!(layout.paragraph_alignment(&text, 1), Alignment::Center);
    assert_eq!(layout.line_left(&text, 1), 35.0);
    assert_eq!(layout.line_right(&text, 1), 65.0);
}
