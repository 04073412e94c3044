// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-paragraph measurement.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Range;

use spannable::{Error, TextRange};
use text_primitives::{Direction, TextDirectionHeuristic};

use crate::bidi::resolve_levels;
use crate::measured_text::{MeasuredRun, MeasuredText, RunKind};
use crate::{Directions, FontMetrics, StyledText, TextPaint, TextSpan};

/// Buffers above this many elements are dropped rather than kept for reuse.
const LARGE_BUFFER: usize = 1024;

/// The measurement of a single paragraph.
///
/// A paragraph is copied out of its source text. Ranges covered by replacement spans are
/// overwritten with placeholder characters of the same UTF-8 length, so offsets into the copy
/// match offsets into the source. Offsets taken and returned by the methods on this type are
/// relative to [`text_start`](Self::text_start) unless stated otherwise.
#[derive(Clone, Debug, Default)]
pub struct MeasuredParagraph {
    text_start: usize,
    text: String,
    levels: Vec<u8>,
    direction: Direction,
    span_end_cache: Vec<usize>,
    font_metrics: Vec<FontMetrics>,
    measured: Option<MeasuredText>,
}

impl MeasuredParagraph {
    /// Analyzes bidi for `range` of `text` without measuring.
    ///
    /// `recycle` is an instance to reuse. Its previous contents are discarded.
    pub fn build_for_bidi(
        text: &StyledText<'_>,
        range: Range<usize>,
        heuristic: TextDirectionHeuristic,
        recycle: Option<Self>,
    ) -> Result<Self, Error> {
        let range = TextRange::new(text, range)?;
        Ok(Self::analyze(text, range.as_range(), heuristic, recycle))
    }

    /// Analyzes bidi for `range` of `text` and measures it with `paint`.
    pub fn build_for_static_layout(
        paint: &TextPaint,
        text: &StyledText<'_>,
        range: Range<usize>,
        heuristic: TextDirectionHeuristic,
        recycle: Option<Self>,
    ) -> Result<Self, Error> {
        let range = TextRange::new(text, range)?;
        Ok(Self::analyze_and_measure(
            paint,
            text,
            range.as_range(),
            heuristic,
            recycle,
        ))
    }

    /// Bidi analysis over a range already known to be valid.
    pub(crate) fn analyze(
        text: &StyledText<'_>,
        range: Range<usize>,
        heuristic: TextDirectionHeuristic,
        recycle: Option<Self>,
    ) -> Self {
        let mut mp = recycle.unwrap_or_default();
        mp.reset_and_analyze_bidi(text, range, heuristic);
        mp
    }

    /// Bidi analysis and measurement over a range already known to be valid.
    pub(crate) fn analyze_and_measure(
        paint: &TextPaint,
        text: &StyledText<'_>,
        range: Range<usize>,
        heuristic: TextDirectionHeuristic,
        recycle: Option<Self>,
    ) -> Self {
        let mut mp = Self::analyze(text, range, heuristic, recycle);
        mp.measure(paint, text);
        mp
    }

    fn reset(&mut self) {
        self.text_start = 0;
        self.text.clear();
        self.levels.clear();
        self.direction = Direction::Ltr;
        self.span_end_cache.clear();
        self.font_metrics.clear();
        if let Some(measured) = &mut self.measured {
            measured.reset(0);
        }
    }

    /// Drops large buffers so that a pooled instance does not pin memory.
    pub fn release(&mut self) {
        self.reset();
        if self.text.capacity() > LARGE_BUFFER {
            self.text = String::new();
        }
        if self.levels.capacity() > LARGE_BUFFER {
            self.levels = Vec::new();
        }
        if self.span_end_cache.capacity() > LARGE_BUFFER {
            self.span_end_cache = Vec::new();
            self.font_metrics = Vec::new();
        }
        if let Some(measured) = &mut self.measured {
            if measured.advances().len() > LARGE_BUFFER {
                measured.release();
            }
        }
    }

    fn reset_and_analyze_bidi(
        &mut self,
        text: &StyledText<'_>,
        range: Range<usize>,
        heuristic: TextDirectionHeuristic,
    ) {
        self.reset();
        self.text_start = range.start;
        text.get_chars(range.clone(), &mut self.text);

        let replacements = text.get_spans(range.clone(), &|span| span.replacement().is_some());
        if !replacements.is_empty() {
            let mut covered = Vec::new();
            for span in &replacements {
                if let Some(r) = text.span_range(span.as_ref()) {
                    let start = r.start.max(range.start) - range.start;
                    let end = r.end.min(range.end).max(r.start.max(range.start)) - range.start;
                    if start < end {
                        covered.push(start..end);
                    }
                }
            }
            self.text = substitute_placeholders(&self.text, &covered);
        }

        self.direction = resolve_levels(heuristic, &self.text, &mut self.levels);
    }

    fn measure(&mut self, paint: &TextPaint, text: &StyledText<'_>) {
        let len = self.text.len();
        let mut measured = self.measured.take().unwrap_or_default();
        measured.reset(len);
        let start = self.text_start;
        let end = start + len;

        let mut span_start = start;
        while span_start < end {
            let span_end = text.next_span_transition(span_start, end, &|span| span.affects_metrics());
            let spans: Vec<Rc<dyn TextSpan>> = text
                .get_spans(span_start..span_end, &|span| span.affects_metrics())
                .into_iter()
                .filter(|span| {
                    text.span_range(span.as_ref())
                        .is_some_and(|r| r.start != r.end)
                })
                .collect();
            let fm =
                self.apply_metric_affecting_spans(paint, text, &spans, span_start..span_end, &mut measured);
            self.font_metrics.push(fm);
            self.span_end_cache.push(span_end);
            span_start = span_end;
        }
        self.measured = Some(measured);
    }

    fn apply_metric_affecting_spans(
        &self,
        paint: &TextPaint,
        text: &StyledText<'_>,
        spans: &[Rc<dyn TextSpan>],
        range: Range<usize>,
        measured: &mut MeasuredText,
    ) -> FontMetrics {
        let mut working = paint.clone();
        working.baseline_shift = 0;
        let mut replacement = None;
        for span in spans {
            if span.replacement().is_some() {
                replacement = Some(span);
            } else if let Some(style) = span.metric_affecting() {
                style.update_measure_state(&mut working);
            }
        }

        let mut fm = working.font_metrics();
        let local = range.start - self.text_start..range.end - self.text_start;
        if let Some(replacement) = replacement.and_then(|span| span.replacement()) {
            let width = replacement.size(&working, text, range.clone(), Some(&mut fm));
            let advances = measured.advances_mut(local.clone());
            if let Some(first) = advances.first_mut() {
                *first = width;
            }
            measured.push_run(MeasuredRun {
                range: local,
                kind: RunKind::Replacement { width },
            });
        } else {
            self.append_style_runs(&working, local, measured);
        }

        if working.baseline_shift < 0 {
            fm.ascent += working.baseline_shift;
            fm.top += working.baseline_shift;
        } else {
            fm.descent += working.baseline_shift;
            fm.bottom += working.baseline_shift;
        }
        fm
    }

    fn append_style_runs(&self, paint: &TextPaint, range: Range<usize>, measured: &mut MeasuredText) {
        if self.levels.is_empty() {
            self.append_style_run(paint, range, false, measured);
            return;
        }
        let mut run_start = range.start;
        for i in range.start + 1..=range.end {
            if i == range.end || self.levels[i] != self.levels[run_start] {
                let rtl = self.levels[run_start] & 1 != 0;
                self.append_style_run(paint, run_start..i, rtl, measured);
                run_start = i;
            }
        }
    }

    fn append_style_run(
        &self,
        paint: &TextPaint,
        range: Range<usize>,
        rtl: bool,
        measured: &mut MeasuredText,
    ) {
        if range.is_empty() {
            return;
        }
        let metrics = paint.measure(&self.text[range.clone()], rtl, measured.advances_mut(range.clone()));
        measured.push_run(MeasuredRun {
            range,
            kind: RunKind::Style {
                rtl,
                ascent: metrics.ascent,
                descent: metrics.descent,
            },
        });
    }

    /// The offset of this paragraph in its source text.
    pub fn text_start(&self) -> usize {
        self.text_start
    }

    /// The copied paragraph text, with placeholders substituted.
    pub fn chars(&self) -> &str {
        &self.text
    }

    /// The length of the paragraph in bytes.
    pub fn text_len(&self) -> usize {
        self.text.len()
    }

    /// The resolved paragraph direction.
    pub fn paragraph_direction(&self) -> Direction {
        self.direction
    }

    /// The per-byte embedding levels, or `None` when the paragraph needed no bidi.
    pub fn levels(&self) -> Option<&[u8]> {
        (!self.levels.is_empty()).then_some(&self.levels[..])
    }

    /// Absolute end offsets of the metric-affecting segments, ascending.
    pub fn span_end_cache(&self) -> &[usize] {
        &self.span_end_cache
    }

    /// Font metrics of each metric-affecting segment, parallel to
    /// [`span_end_cache`](Self::span_end_cache).
    pub fn font_metrics(&self) -> &[FontMetrics] {
        &self.font_metrics
    }

    /// The measurement, present once built for layout.
    pub fn measured_text(&self) -> Option<&MeasuredText> {
        self.measured.as_ref()
    }

    /// Returns the visual runs of `range`.
    pub fn get_directions(&self, range: Range<usize>) -> Directions {
        if self.levels.is_empty() || range.is_empty() {
            return Directions::AllLeftToRight;
        }
        let end = range.end.min(self.levels.len());
        let start = range.start.min(end);
        Directions::from_levels(&self.levels[start..end], &self.text[start..end], self.direction)
    }

    /// The advance of the cluster starting at byte `offset`.
    pub fn advance(&self, offset: usize) -> f32 {
        self.measured.as_ref().map_or(0.0, |m| m.advance(offset))
    }

    /// The summed advance over `range`.
    pub fn advance_range(&self, range: Range<usize>) -> f32 {
        self.measured.as_ref().map_or(0.0, |m| m.advance_range(range))
    }

    /// Counts how many leading bytes of `0..limit` fit into `width`.
    ///
    /// Measuring forwards, trailing spaces are excluded from the count. Measuring backwards,
    /// the count is taken from the end of `0..limit` and zero-width bytes are never split off
    /// the cluster they belong to.
    pub fn break_text(&self, limit: usize, forwards: bool, width: f32) -> usize {
        let Some(measured) = &self.measured else {
            return 0;
        };
        let w = measured.advances();
        let bytes = self.text.as_bytes();
        let limit = limit.min(w.len());
        let mut width = width;
        if forwards {
            let mut i = 0;
            while i < limit {
                width -= w[i];
                if width < 0.0 {
                    break;
                }
                i += 1;
            }
            while i > 0 && bytes[i - 1] == b' ' {
                i -= 1;
            }
            i
        } else {
            let mut i = limit;
            while i > 0 {
                width -= w[i - 1];
                if width < 0.0 {
                    break;
                }
                i -= 1;
            }
            // `i` is one past the first byte that did not fit.
            while i < limit && (bytes[i] == b' ' || w[i] == 0.0) {
                i += 1;
            }
            limit - i
        }
    }
}

/// Overwrites every char inside `covered` with a placeholder of the same UTF-8 length.
fn substitute_placeholders(text: &str, covered: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        if covered.iter().any(|r| r.contains(&i)) {
            out.push(placeholder(c.len_utf8()));
        } else {
            out.push(c);
        }
    }
    out
}

fn placeholder(len: usize) -> char {
    match len {
        1 => '\u{1}',
        2 => '\u{80}',
        3 => '\u{FFFC}',
        _ => '\u{E0001}',
    }
}
