// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Various helper functions to assert truths during testing.

use std::ops::Range;

use paralayout::{DynamicLayout, Layout, StaticLayout, StyledText, TextPaint};

/// Assert the structural properties every line table has.
///
/// Lines partition `range` without gaps, tops never decrease and end at the height, and
/// the visual runs of each line add up to its length.
pub(crate) fn assert_line_table_invariants<L: Layout + ?Sized>(
    layout: &L,
    range: Range<usize>,
    case: &str,
) {
    let count = layout.line_count();
    assert!(count > 0, "no lines with {case}");
    assert_eq!(layout.line_start(0), range.start, "first line start with {case}");
    assert_eq!(layout.line_start(count), range.end, "last line end with {case}");

    for line in 0..count {
        let start = layout.line_start(line);
        let end = layout.line_end(line);
        assert!(start <= end, "line {line} is reversed with {case}");
        assert!(
            layout.line_top(line) <= layout.line_top(line + 1),
            "line {line} top decreases with {case}"
        );
        let run_total: usize = layout
            .line_directions(line)
            .runs(end - start)
            .map(|run| run.len)
            .sum();
        assert_eq!(run_total, end - start, "line {line} runs with {case}");
    }
    assert_eq!(layout.line_top(count), layout.height(), "height with {case}");
}

/// Assert that `layout` has the line table a fresh static layout of `text` would have.
///
/// The static layout gets the same `width` and `spacing_add`, and defaults otherwise.
pub(crate) fn assert_matches_static(
    layout: &DynamicLayout,
    text: &StyledText<'_>,
    paint: &TextPaint,
    width: i32,
    spacing_add: f32,
    case: &str,
) {
    let fresh = StaticLayout::builder(text, 0..text.len(), paint, width)
        .unwrap()
        .line_spacing(spacing_add, 1.0)
        .build();
    assert_eq!(
        layout.line_count(),
        fresh.line_count(),
        "line count mismatch with {case}"
    );
    for (i, (a, b)) in layout.lines().iter().zip(fresh.lines()).enumerate() {
        assert_eq!(a, b, "row {i} mismatch with {case}");
    }
    assert_eq!(layout.top_padding(), fresh.top_padding(), "top padding with {case}");
    assert_eq!(
        layout.bottom_padding(),
        fresh.bottom_padding(),
        "bottom padding with {case}"
    );
}
