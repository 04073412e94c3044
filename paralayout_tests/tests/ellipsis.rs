// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Elision of text that does not fit.

use paralayout::{ELLIPSIS, ELLIPSIS_FILLER, Layout, StaticLayout, TruncateAt, ellipsize};

use crate::util::paint;

#[test]
fn ellipsis_end_on_single_line_layout() {
    let text = "This is a very long line";
    let layout = StaticLayout::builder(&text, 0..text.len(), &paint(), 100)
        .unwrap()
        .ellipsize(Some(TruncateAt::End))
        .max_lines(1)
        .build();
    assert_eq!(layout.line_count(), 1);
    assert!(layout.is_ellipsized());
    let (start, count) = (layout.ellipsis_start(0), layout.ellipsis_count(0));
    assert!(count > 0);
    assert!(start + count <= text.len(), "elided {start} + {count}");
    assert_eq!((start, count), (9, 15), "keeps \"This is a\"");
    assert!(
        layout.line_max(&text, 0) <= layout.ellipsized_width() as f32,
        "the substituted line fits"
    );
}

#[test]
fn ellipsis_narrower_width_than_layout() {
    let text = "abcdefghij";
    let layout = StaticLayout::builder(&text, 0..text.len(), &paint(), 200)
        .unwrap()
        .ellipsize(Some(TruncateAt::End))
        .ellipsized_width(55)
        .max_lines(1)
        .build();
    assert_eq!((layout.ellipsis_start(0), layout.ellipsis_count(0)), (4, 6));
    assert_eq!(layout.line_max(&text, 0), 50.0);
}

#[test]
fn ellipsis_start_and_middle_on_one_line() {
    let text = "abcdefghij";
    let build = |at| {
        StaticLayout::builder(&text, 0..text.len(), &paint(), 55)
            .unwrap()
            .ellipsize(Some(at))
            .max_lines(1)
            .build()
    };
    let start = build(TruncateAt::Start);
    assert_eq!((start.ellipsis_start(0), start.ellipsis_count(0)), (0, 6));
    let middle = build(TruncateAt::Middle);
    assert_eq!((middle.ellipsis_start(0), middle.ellipsis_count(0)), (2, 6));
}

#[test]
fn ellipsis_start_needs_a_single_line() {
    let text = "aaaa bbbb cccc";
    let layout = StaticLayout::builder(&text, 0..text.len(), &paint(), 55)
        .unwrap()
        .ellipsize(Some(TruncateAt::Start))
        .max_lines(2)
        .build();
    for line in 0..layout.line_count() {
        assert_eq!(layout.ellipsis_count(line), 0, "line {line} is left alone");
    }
}

#[test]
fn ellipsis_end_on_the_last_visible_line() {
    let text = "aaaa bbbb cccc dddd";
    let layout = StaticLayout::builder(&text, 0..text.len(), &paint(), 55)
        .unwrap()
        .ellipsize(Some(TruncateAt::End))
        .max_lines(2)
        .build();
    assert_eq!(layout.line_count(), 2, "the overflow joins the last line");
    assert_eq!(layout.ellipsis_count(0), 0);
    assert!(layout.ellipsis_count(1) > 0);
    assert_eq!(layout.line_end(1), text.len());
    assert!(layout.line_max(&text, 1) <= 55.0);
}

#[test]
fn ellipsis_fitting_text_is_a_no_op() {
    let text = "short";
    let layout = StaticLayout::builder(&text, 0..text.len(), &paint(), 100)
        .unwrap()
        .ellipsize(Some(TruncateAt::End))
        .max_lines(1)
        .build();
    assert_eq!(layout.ellipsis_count(0), 0);

    let mut dropped = None;
    let out = ellipsize(
        text,
        &paint(),
        100.0,
        TruncateAt::End,
        false,
        Some(&mut |range| dropped = Some(range)),
    );
    assert_eq!(out, text);
    assert_eq!(dropped, Some(0..0));
}

#[test]
fn ellipsis_utility_is_idempotent() {
    let text = "The quick brown fox jumps over the lazy dog";
    let p = paint();
    for at in [TruncateAt::Start, TruncateAt::Middle, TruncateAt::End] {
        for preserve in [false, true] {
            let once = ellipsize(text, &p, 120.0, at, preserve, None);
            assert!(once.contains(ELLIPSIS), "{at:?} {preserve}: {once:?}");
            let twice = ellipsize(&once, &p, 120.0, at, preserve, None);
            assert_eq!(once, twice, "{at:?} {preserve}");
        }
    }
}

#[test]
fn ellipsis_preserving_length_keeps_char_count() {
    let text = "na\u{ef}ve caf\u{e9} cr\u{e8}me br\u{fb}l\u{e9}e";
    let p = paint();
    for at in [TruncateAt::Start, TruncateAt::Middle, TruncateAt::End] {
        let out = ellipsize(text, &p, 80.0, at, true, None);
        assert_eq!(
            out.chars().count(),
            text.chars().count(),
            "{at:?}: {out:?}"
        );
        assert!(out.contains(ELLIPSIS_FILLER), "{at:?}: {out:?}");
    }
}

#[test]
fn ellipsis_without_preserving_length_shortens() {
    let text = "abcdefghij";
    let mut dropped = 0..0;
    let out = ellipsize(
        text,
        &paint(),
        55.0,
        TruncateAt::Middle,
        false,
        Some(&mut |range| dropped = range),
    );
    assert_eq!(out, "ab\u{2026}ij");
    assert_eq!(dropped, 2..8);
}
