// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Span storage as seen by layouts.

use std::cell::RefCell;
use std::rc::Rc;

use paralayout::spannable::{
    ErrorKind, InputFilter, LengthFilter, SpanFlags, SpannableStringBuilder, Spanned, SpannedString,
    TextStorage,
};
use paralayout::{DynamicLayout, Layout, StaticLayout, TextSpan};
use paralayout_dev::SizeSpan;

use crate::util::{Text, assert_matches_static, paint, span};

/// A span identified by its number.
#[derive(Debug)]
struct Tag(usize);

/// Whether a span over `start..end` is reported by a query over `s..e`.
fn overlaps(start: usize, end: usize, s: usize, e: usize) -> bool {
    start <= e && end >= s && (start == end || s == e || (start != e && end != s))
}

/// Compare every possible query against a linear scan of the attached spans.
fn assert_queries_match_scan(text: &SpannableStringBuilder<Tag>, attached: &[Rc<Tag>], case: &str) {
    let len = text.len();
    for s in 0..=len {
        for e in s..=len {
            let mut found: Vec<usize> =
                text.get_spans(s..e, &|_| true).iter().map(|t| t.0).collect();
            found.sort_unstable();
            let mut expected: Vec<usize> = attached
                .iter()
                .filter(|tag| {
                    let range = text.span_range(tag).unwrap();
                    overlaps(range.start, range.end, s, e)
                })
                .map(|tag| tag.0)
                .collect();
            expected.sort_unstable();
            assert_eq!(found, expected, "query {s}..{e} after {case}");
        }
    }
}

#[test]
fn spans_queries_after_mixed_edits() {
    let flags = [
        SpanFlags::INCLUSIVE_EXCLUSIVE,
        SpanFlags::INCLUSIVE_INCLUSIVE,
        SpanFlags::EXCLUSIVE_EXCLUSIVE,
        SpanFlags::EXCLUSIVE_INCLUSIVE,
    ];
    let mut text = SpannableStringBuilder::<Tag>::from_text("interval trees hide in arrays");
    let mut attached: Vec<Rc<Tag>> = Vec::new();
    let mut seed = 0x2545_f491_u32;
    let mut next = move |bound: usize| {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        seed as usize % bound.max(1)
    };

    for round in 0..90 {
        let len = text.len();
        let case = match round % 5 {
            0 | 1 => {
                let start = next(len + 1);
                let end = (start + next(6)).min(len);
                let tag = Rc::new(Tag(round));
                text.set_span(tag.clone(), start..end, flags[next(4)]).unwrap();
                attached.push(tag);
                format!("set_span {start}..{end}")
            }
            2 => {
                let at = next(len + 1);
                text.insert(at, "xyz").unwrap();
                format!("insert at {at}")
            }
            3 if len > 0 => {
                let start = next(len);
                let end = (start + next(5)).min(len);
                text.delete(start..end).unwrap();
                format!("delete {start}..{end}")
            }
            _ if !attached.is_empty() => {
                let tag = attached.swap_remove(next(attached.len()));
                text.remove_span(&tag);
                assert_eq!(text.span_start(&tag), None);
                format!("remove_span {}", tag.0)
            }
            _ => continue,
        };
        // Refused and collapsed exclusive spans are no longer attached.
        attached.retain(|tag| text.span_start(tag).is_some());
        assert_eq!(text.span_count(), attached.len(), "span count after {case}");
        if round % 3 == 0 {
            assert_queries_match_scan(&text, &attached, &case);
        }
    }
    assert_queries_match_scan(&text, &attached, "the last round");
}

#[test]
fn spans_endpoints_follow_their_flags() {
    let cases = [
        (SpanFlags::INCLUSIVE_EXCLUSIVE, 1..4, 1..3),
        (SpanFlags::INCLUSIVE_INCLUSIVE, 1..4, 1..4),
        (SpanFlags::EXCLUSIVE_EXCLUSIVE, 2..4, 1..3),
        (SpanFlags::EXCLUSIVE_INCLUSIVE, 2..4, 1..4),
    ];
    for (flags, after_start_insert, after_end_insert) in cases {
        let mut at_start = SpannableStringBuilder::<Tag>::from_text("abcd");
        let tag = Rc::new(Tag(0));
        at_start.set_span(tag.clone(), 1..3, flags).unwrap();
        at_start.insert(1, "X").unwrap();
        assert_eq!(at_start.span_range(&tag), Some(after_start_insert), "{flags:?} at start");

        let mut at_end = SpannableStringBuilder::<Tag>::from_text("abcd");
        at_end.set_span(tag.clone(), 1..3, flags).unwrap();
        at_end.insert(3, "X").unwrap();
        assert_eq!(at_end.span_range(&tag), Some(after_end_insert), "{flags:?} at end");
    }
}

#[test]
fn spans_bad_ranges_are_refused() {
    let mut text = SpannableStringBuilder::<Tag>::from_text("ab\ncd");
    let err = text
        .set_span(Rc::new(Tag(0)), 1..3, SpanFlags::PARAGRAPH)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParagraph);
    let err = text
        .set_span(Rc::new(Tag(1)), 0..9, SpanFlags::INCLUSIVE_EXCLUSIVE)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidBounds);
    assert!(text.insert(9, "x").is_err());
    assert_eq!(text.to_string(), "ab\ncd", "failed calls change nothing");

    let empty = Rc::new(Tag(2));
    text.set_span(empty.clone(), 2..2, SpanFlags::EXCLUSIVE_EXCLUSIVE)
        .unwrap();
    assert_eq!(text.span_start(&empty), None, "zero-length exclusive spans are dropped");
    assert_eq!(text.span_count(), 0);
}

#[test]
fn spans_snapshot_keeps_layout_spans() {
    let mut text = Text::from_text("small BIG small");
    text.set_span(span(SizeSpan(2.0)), 6..9, SpanFlags::EXCLUSIVE_EXCLUSIVE)
        .unwrap();
    let snapshot: SpannedString<_> = text.to_spanned_string();
    text.clear();
    assert_eq!(snapshot.as_str(), "small BIG small");

    let from_builder = StaticLayout::builder(&snapshot, 0..snapshot.len(), &paint(), 1000)
        .unwrap()
        .include_pad(false)
        .build();
    assert_eq!(from_builder.line_ascent(0), -16, "the copied span still applies");

    let part = Text::from_spanned(&snapshot, 4..11).unwrap();
    assert_eq!(part.to_string(), "l BIG s");
    let sizes = part.get_spans(0..part.len(), &|s| s.metric_affecting().is_some());
    assert_eq!(sizes.len(), 1);
    assert_eq!(part.span_range(&*sizes[0]), Some(2..5));
}

#[test]
fn spans_filtered_input_reaches_the_layout() {
    let p = paint();
    let mut text = Text::from_text("abc");
    let filter: Box<dyn InputFilter<dyn TextSpan>> = Box::new(LengthFilter::new(8));
    text.set_filters(vec![filter]);
    let layout = Rc::new(RefCell::new(DynamicLayout::builder(&text, &p, 55).build()));
    DynamicLayout::attach(&layout, &mut text);

    text.append(" defghijk").unwrap();
    assert_eq!(text.to_string(), "abc defg");
    assert_matches_static(&layout.borrow(), &text, &p, 55, 0.0, "filtered append");
    assert_eq!(layout.borrow().line_count(), 2);
}

#[test]
fn spans_selection_moves_with_edits() {
    let mut text = Text::from_text("select me");
    text.set_selection(0, 6).unwrap();
    text.insert(0, ">> ").unwrap();
    assert_eq!((text.selection_start(), text.selection_end()), (Some(3), Some(9)));
    assert!(
        text.get_spans(0..text.len(), &|_| true).is_empty(),
        "selection markers are not spans"
    );
    text.remove_selection();
    assert_eq!(text.selection_start(), None);
}
