// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line breaking and geometry of static layouts.

use paralayout::{Alignment, Direction, Directions, Layout, LayoutContext, StaticLayout};
use paralayout_dev::TextSamples;

use crate::util::{assert_line_table_invariants, paint};

#[test]
fn lines_fitting_text_stays_on_one_line() {
    let text = "Hello world";
    let layout = StaticLayout::builder(&text, 0..text.len(), &paint(), 200)
        .unwrap()
        .build();
    assert_eq!(layout.line_count(), 1);
    assert_eq!(layout.line_start(0), 0);
    assert_eq!(layout.line_start(1), 11);
}

#[test]
fn lines_break_after_the_space() {
    let text = "Hello world wrapped";
    // Room for "Hello world" but not for the next word.
    let layout = StaticLayout::builder(&text, 0..text.len(), &paint(), 115)
        .unwrap()
        .build();
    assert_eq!(layout.line_count(), 2);
    assert_eq!(layout.line_start(1), 12);
    assert_eq!(
        layout.line_visible_end(&text, 0),
        11,
        "the trailing space is not visible"
    );
    assert_eq!(layout.line_visible_end(&text, 1), text.len());
}

#[test]
fn lines_partition_every_sample() {
    let samples = TextSamples::new();
    let mut lcx = LayoutContext::new();
    for sample in [&samples.latin, &samples.hebrew, &samples.mixed] {
        let text = sample.text;
        for width in [25, 80, 200, 1000] {
            let layout = StaticLayout::builder(&text, 0..text.len(), &paint(), width)
                .unwrap()
                .build_in(&mut lcx);
            let case = format!("{} at {width}", sample.name);
            assert_line_table_invariants(&layout, 0..text.len(), &case);
        }
    }
}

#[test]
fn lines_of_a_sub_range_cover_only_that_range() {
    let text = "skip this\nlay out this\nand not this";
    let range = 10..23;
    let layout = StaticLayout::builder(&text, range.clone(), &paint(), 1000)
        .unwrap()
        .build();
    assert_line_table_invariants(&layout, range, "sub range");
    // The range ends in a newline, which opens an empty last line.
    assert_eq!(layout.line_count(), 2);
    assert_eq!(layout.line_start(1), 23);
    assert_eq!(layout.line_end(1), 23);
}

#[test]
fn lines_of_pure_ltr_text_are_uniform() {
    let text = TextSamples::new().latin.text;
    let layout = StaticLayout::builder(&text, 0..text.len(), &paint(), 120)
        .unwrap()
        .build();
    assert!(layout.line_count() > 3);
    for line in 0..layout.line_count() {
        assert_eq!(
            layout.line_directions(line),
            &Directions::AllLeftToRight,
            "line {line}"
        );
        assert_eq!(layout.paragraph_direction(line), Direction::Ltr, "line {line}");
    }
}

#[test]
fn lines_empty_text_has_one_line() {
    let text = "";
    let layout = StaticLayout::builder(&text, 0..0, &paint(), 100)
        .unwrap()
        .build();
    assert_eq!(layout.line_count(), 1);
    assert_eq!(layout.line_end(0), 0);
    assert_eq!(layout.height(), 13, "padded from top to bottom");
}

#[test]
fn lines_trailing_newline_opens_an_empty_line() {
    let text = "ab\n";
    let layout = StaticLayout::builder(&text, 0..text.len(), &paint(), 100)
        .unwrap()
        .build();
    assert_eq!(layout.line_count(), 2);
    assert_eq!(layout.line_start(1), 3);
    assert_eq!(layout.line_end(1), 3);
}

#[test]
fn lines_invalid_range_is_rejected() {
    let text = "\u{e9}t\u{e9}";
    assert!(StaticLayout::builder(&text, 0..10, &paint(), 100).is_err(), "out of bounds");
    assert!(StaticLayout::builder(&text, 1..3, &paint(), 100).is_err(), "inside a char");
    let reversed = core::ops::Range { start: 3, end: 2 };
    assert!(StaticLayout::builder(&text, reversed, &paint(), 100).is_err(), "reversed");
}

#[test]
fn geometry_padding_applies_to_first_and_last_lines() {
    let text = "aa bb cc";
    let padded = StaticLayout::builder(&text, 0..text.len(), &paint(), 55)
        .unwrap()
        .build();
    assert_eq!(padded.line_count(), 2);
    assert_eq!((padded.top_padding(), padded.bottom_padding()), (-2, 1));
    // -10..2 for the first line and -8..3 for the last one.
    assert_eq!(padded.height(), 23);
    assert_eq!(padded.line_baseline(0), 10);

    let tight = StaticLayout::builder(&text, 0..text.len(), &paint(), 55)
        .unwrap()
        .include_pad(false)
        .build();
    assert_eq!(tight.height(), 20);
    assert_eq!(tight.line_baseline(0), 8);
    assert_eq!(tight.line_ascent(1), -8);
}

#[test]
fn geometry_offset_and_vertical_queries_agree() {
    let text = "aa bb cc";
    let layout = StaticLayout::builder(&text, 0..text.len(), &paint(), 55)
        .unwrap()
        .include_pad(false)
        .build();
    assert_eq!(layout.line_for_offset(0), 0);
    assert_eq!(layout.line_for_offset(7), 1);
    assert_eq!(layout.line_for_offset(text.len()), 1);
    assert_eq!(layout.line_for_vertical(0), 0);
    assert_eq!(layout.line_for_vertical(15), 1);
    assert_eq!(layout.line_for_vertical(1000), 1);
    assert_eq!(layout.primary_horizontal(&text, 7), 10.0);
    assert_eq!(layout.offset_for_horizontal(&text, 1, 12.0), 7);
}

#[test]
fn geometry_line_spacing_adds_leading_between_lines() {
    let text = "aa bb cc";
    let layout = StaticLayout::builder(&text, 0..text.len(), &paint(), 55)
        .unwrap()
        .include_pad(false)
        .line_spacing(4.0, 1.5)
        .build();
    // Each line is 10 high: 10 * 0.5 + 4 rounds to 9.
    assert_eq!(layout.line_extra(0), 9);
    assert_eq!(layout.line_top(1), 19);
    assert_eq!(layout.line_extra(1), 0, "the last line gets no extra leading");
    assert_eq!(layout.height(), 29);
}

#[test]
fn geometry_alignment_moves_lines() {
    let text = "abc";
    let build = |alignment| {
        StaticLayout::builder(&text, 0..text.len(), &paint(), 100)
            .unwrap()
            .alignment(alignment)
            .build()
    };
    let normal = build(Alignment::Normal);
    assert_eq!((normal.line_left(&text, 0), normal.line_right(&text, 0)), (0.0, 30.0));
    let opposite = build(Alignment::Opposite);
    assert_eq!(opposite.line_left(&text, 0), 70.0);
    let center = build(Alignment::Center);
    assert_eq!(center.line_left(&text, 0), 35.0);
    assert_eq!(center.line_right(&text, 0), 65.0);
}

#[test]
fn geometry_indents_narrow_their_lines() {
    let text = "aaaa bbbb cccc";
    let layout = StaticLayout::builder(&text, 0..text.len(), &paint(), 100)
        .unwrap()
        .indents(Some(vec![50]), None)
        .build();
    // Only one word fits in the remaining 50 px.
    assert_eq!(layout.line_count(), 3);
    assert_eq!(layout.line_start(1), 5);
    assert_eq!(layout.line_start(2), 10);
}

#[test]
fn geometry_max_lines_caps_the_height() {
    let text = "aa\nbb\ncc";
    let layout = StaticLayout::builder(&text, 0..text.len(), &paint(), 100)
        .unwrap()
        .include_pad(false)
        .max_lines(2)
        .build();
    assert_eq!(layout.max_lines(), 2);
    assert_eq!(layout.line_count(), 3, "lines past the cap are still laid out");
    assert_eq!(layout.height_capped(true), 20);
    assert_eq!(layout.height_capped(false), 30);
}
