// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout of single-line, unstyled, left-to-right text.

use alloc::string::String;
use alloc::vec;

use text_primitives::{Alignment, Direction, TextDirectionHeuristic, TruncateAt};

use crate::bidi::needs_bidi;
use crate::ellipsize::{elided_range, fill_elided};
use crate::text_line::ELLIPSIS;
use crate::{Directions, FontMetrics, Layout, MeasuredParagraph, StyledText, TextPaint};

/// Font metrics of a text, along with its width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoringMetrics {
    /// Vertical metrics, widened by fallback fonts when requested.
    pub metrics: FontMetrics,
    /// The advance of the text rounded up.
    pub width: i32,
}

/// Returns the metrics of `text` if it can be laid out as a [`BoringLayout`].
///
/// Text qualifies when it has no newline, no tab, no span, and needs no bidi analysis.
pub fn is_boring(
    text: &StyledText<'_>,
    paint: &TextPaint,
    heuristic: TextDirectionHeuristic,
    fallback_line_spacing: bool,
) -> Option<BoringMetrics> {
    let len = text.len();
    if !text.get_spans(0..len, &|_| true).is_empty() {
        return None;
    }
    let mut chars = String::with_capacity(len);
    text.get_chars(0..len, &mut chars);
    if chars.contains(['\n', '\t']) || needs_bidi(heuristic, &chars) {
        return None;
    }

    let mut metrics = paint.font_metrics();
    let mut advances = vec![0.0; len];
    let run = paint.measure(&chars, false, &mut advances);
    if fallback_line_spacing {
        metrics.ascent = metrics.ascent.min(run.ascent);
        metrics.descent = metrics.descent.max(run.descent);
        metrics.top = metrics.top.min(metrics.ascent);
        metrics.bottom = metrics.bottom.max(metrics.descent);
    }
    #[expect(
        clippy::cast_possible_truncation,
        reason = "text widths are far inside the i32 range"
    )]
    let width = run.advance.ceil() as i32;
    Some(BoringMetrics { metrics, width })
}

/// A layout of one line of text qualifying under [`is_boring`].
///
/// Offsets reported by this layout refer to the text it was made from. When the text was
/// elided, [`ellipsized_text`](Self::ellipsized_text) holds a copy of the same char length
/// with the elided range filled in.
#[derive(Clone, Debug)]
pub struct BoringLayout {
    paint: TextPaint,
    width: i32,
    alignment: Alignment,
    len: usize,
    bottom: i32,
    descent: i32,
    max: f32,
    ellipsized_width: i32,
    ellipsis_start: usize,
    ellipsis_count: usize,
    ellipsized_text: Option<String>,
    directions: Directions,
}

impl BoringLayout {
    /// Lays out `text`, which `metrics` were computed for.
    ///
    /// When `ellipsize` is set, text wider than `ellipsized_width` is elided. `include_pad` is
    /// accepted for symmetry with the other layouts but does not change the line height.
    pub fn make(
        text: &StyledText<'_>,
        paint: &TextPaint,
        width: i32,
        alignment: Alignment,
        metrics: &BoringMetrics,
        include_pad: bool,
        ellipsize: Option<TruncateAt>,
        ellipsized_width: i32,
    ) -> Self {
        let _ = include_pad;
        let mut layout = Self {
            paint: paint.clone(),
            width,
            alignment,
            len: text.len(),
            bottom: metrics.metrics.descent - metrics.metrics.ascent,
            descent: metrics.metrics.descent,
            max: metrics.width as f32,
            ellipsized_width: width,
            ellipsis_start: 0,
            ellipsis_count: 0,
            ellipsized_text: None,
            directions: Directions::AllLeftToRight,
        };
        if let Some(at) = ellipsize {
            layout.ellipsized_width = ellipsized_width;
            layout.ellipsize(text, metrics, at);
        }
        layout
    }

    fn ellipsize(&mut self, text: &StyledText<'_>, metrics: &BoringMetrics, at: TruncateAt) {
        if metrics.width <= self.ellipsized_width {
            return;
        }
        let mp = MeasuredParagraph::analyze_and_measure(
            &self.paint,
            text,
            0..self.len,
            TextDirectionHeuristic::Ltr,
            None,
        );
        let avail = self.ellipsized_width as f32 - self.paint.measure_text(ELLIPSIS);
        let dropped = elided_range(&mp, avail, at);
        self.ellipsis_start = dropped.start;
        self.ellipsis_count = dropped.len();
        self.ellipsized_text = Some(fill_elided(mp.chars(), dropped));
        // The visible width is now that of the kept text plus the ellipsis, as drawn.
        self.max = self.text_line(text, 0, false).width().ceil();
    }

    /// The display text with the elided range replaced, if anything was elided.
    pub fn ellipsized_text(&self) -> Option<&str> {
        self.ellipsized_text.as_deref()
    }
}

impl Layout for BoringLayout {
    fn width(&self) -> i32 {
        self.width
    }

    fn paint(&self) -> &TextPaint {
        &self.paint
    }

    fn alignment(&self) -> Alignment {
        self.alignment
    }

    fn line_count(&self) -> usize {
        1
    }

    fn line_top(&self, line: usize) -> i32 {
        if line == 0 { 0 } else { self.bottom }
    }

    fn line_descent(&self, _line: usize) -> i32 {
        self.descent
    }

    fn line_start(&self, line: usize) -> usize {
        if line == 0 { 0 } else { self.len }
    }

    fn paragraph_direction(&self, _line: usize) -> Direction {
        Direction::Ltr
    }

    fn line_contains_tab(&self, _line: usize) -> bool {
        false
    }

    fn line_directions(&self, _line: usize) -> &Directions {
        &self.directions
    }

    fn top_padding(&self) -> i32 {
        0
    }

    fn bottom_padding(&self) -> i32 {
        0
    }

    fn ellipsis_start(&self, _line: usize) -> usize {
        self.ellipsis_start
    }

    fn ellipsis_count(&self, _line: usize) -> usize {
        self.ellipsis_count
    }

    fn ellipsized_width(&self) -> i32 {
        self.ellipsized_width
    }

    fn line_width(&self, _text: &StyledText<'_>, line: usize) -> f32 {
        if line == 0 { self.max } else { 0.0 }
    }

    fn line_max(&self, _text: &StyledText<'_>, _line: usize) -> f32 {
        self.max
    }
}
