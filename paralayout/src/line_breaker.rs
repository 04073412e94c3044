// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Greedy line breaking.

use alloc::vec::Vec;
use core::fmt;

use icu_segmenter::options::LineBreakOptions;
use icu_segmenter::{LineSegmenter, LineSegmenterBorrowed};

use crate::{FontMetrics, MeasuredParagraph, TabStops};

/// Returns `true` for chars that never widen a line when they end it.
pub fn is_line_end_space(c: char) -> bool {
    matches!(
        c,
        '\n' | ' ' | '\u{1680}' | '\u{2000}'..='\u{2006}' | '\u{2008}'..='\u{200A}' | '\u{205F}'
            | '\u{3000}'
    )
}

/// Width limits for breaking one paragraph.
#[derive(Clone, Debug, PartialEq)]
pub struct ParagraphConstraints {
    /// Width available to lines after the first ones.
    pub width: f32,
    /// Width available to the first lines.
    pub first_width: f32,
    /// How many lines use `first_width`.
    pub first_width_line_count: usize,
    /// Where tabs advance to.
    pub tab_stops: TabStops,
}

impl ParagraphConstraints {
    /// Constraints giving every line `width`.
    pub fn new(width: f32) -> Self {
        Self {
            width,
            first_width: width,
            first_width_line_count: 1,
            tab_stops: TabStops::default(),
        }
    }
}

/// One line produced by the breaker.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BrokenLine {
    /// The end of the line, relative to the paragraph start.
    pub end: usize,
    /// The advance of the line, not counting trailing spaces.
    pub width: f32,
    /// Most negative ascent of the text runs on the line.
    pub ascent: f32,
    /// Largest descent of the text runs on the line.
    pub descent: f32,
    /// The line contains a tab.
    pub has_tab: bool,
}

/// The lines of one paragraph, in order. The last line always ends at the paragraph end.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineBreakResult {
    /// The lines.
    pub lines: Vec<BrokenLine>,
}

impl LineBreakResult {
    /// The number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Per-line width limits.
struct LineWidth<'a> {
    first_width: f32,
    first_count: usize,
    rest_width: f32,
    indents: Option<&'a [i32]>,
    offset: usize,
}

impl LineWidth<'_> {
    fn at(&self, line: usize) -> f32 {
        let width = if line < self.first_count {
            self.first_width
        } else {
            self.rest_width
        };
        (width - self.indent(line)).max(0.0)
    }

    fn indent(&self, line: usize) -> f32 {
        match self.indents {
            Some(indents) if !indents.is_empty() => {
                let idx = (line + self.offset).min(indents.len() - 1);
                indents[idx] as f32
            }
            _ => 0.0,
        }
    }
}

/// A break that has been committed.
#[derive(Clone, Copy, Debug)]
struct BreakPoint {
    offset: usize,
    width: f32,
}

/// The greedy line breaker.
///
/// Break opportunities come from the Unicode line breaking algorithm. Lines are filled as
/// far as they fit and broken at the last opportunity that still fits. A run of text without
/// any fitting opportunity is split at cluster boundaries instead.
pub struct LineBreaker {
    segmenter: LineSegmenterBorrowed<'static>,
    boundaries: Vec<usize>,
    break_points: Vec<BreakPoint>,
}

impl LineBreaker {
    /// Creates a breaker using the compiled line break data.
    pub fn new() -> Self {
        Self {
            segmenter: LineSegmenter::new_auto(LineBreakOptions::default()),
            boundaries: Vec::new(),
            break_points: Vec::new(),
        }
    }

    /// Breaks a measured paragraph into lines.
    ///
    /// `indents` are per-line widths to subtract, indexed from `line_number`, the index of the
    /// paragraph's first line in the whole layout. The last entry applies to all later lines.
    pub fn compute_line_breaks(
        &mut self,
        paragraph: &MeasuredParagraph,
        constraints: &ParagraphConstraints,
        indents: Option<&[i32]>,
        line_number: usize,
    ) -> LineBreakResult {
        let text = paragraph.chars();
        let Some(measured) = paragraph.measured_text() else {
            return LineBreakResult::default();
        };
        if text.is_empty() {
            return LineBreakResult::default();
        }

        self.boundaries.clear();
        self.boundaries
            .extend(self.segmenter.segment_str(text).filter(|&b| b > 0));
        self.break_points.clear();

        let widths = LineWidth {
            first_width: constraints.first_width,
            first_count: constraints.first_width_line_count,
            rest_width: constraints.width,
            indents,
            offset: line_number,
        };
        let mut state = BreakState {
            advances: measured.advances(),
            widths: &widths,
            tab_stops: &constraints.tab_stops,
            break_points: &mut self.break_points,
            line_num: 0,
            line_width: 0.0,
            chars_advance: 0.0,
            line_width_limit: widths.at(0),
            prev_boundary: None,
        };

        let mut boundaries = self.boundaries.iter().copied().peekable();
        for run in measured.runs() {
            let run_text = &text[run.range.clone()];
            for (i, c) in run_text.char_indices() {
                let offset = run.range.start + i;
                state.update_line_width(c, measured.advance(offset));
                let next = offset + c.len_utf8();
                while boundaries.next_if(|&b| b < next).is_some() {}
                if boundaries.peek() == Some(&next) {
                    boundaries.next();
                    if run.can_break() || next == run.range.end {
                        state.process_line_break(next);
                    }
                }
            }
        }
        if state.break_points.last().map(|bp| bp.offset) != Some(text.len()) {
            let width = state.line_width;
            state.break_line_at(text.len(), width, 0.0, 0.0);
        }

        let mut result = LineBreakResult::default();
        let mut start = 0;
        for bp in self.break_points.iter() {
            let mut fm = FontMetrics::default();
            measured.extent(start..bp.offset, &mut fm);
            result.lines.push(BrokenLine {
                end: bp.offset,
                width: bp.width,
                ascent: fm.ascent as f32,
                descent: fm.descent as f32,
                has_tab: text[start..bp.offset].contains('\t'),
            });
            start = bp.offset;
        }
        result
    }
}

impl Default for LineBreaker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LineBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineBreaker")
            .field("boundaries", &self.boundaries.len())
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy)]
struct PrevBoundary {
    offset: usize,
    line_width: f32,
    chars_advance: f32,
}

struct BreakState<'a> {
    advances: &'a [f32],
    widths: &'a LineWidth<'a>,
    tab_stops: &'a TabStops,
    break_points: &'a mut Vec<BreakPoint>,
    line_num: usize,
    /// Width of the current line, excluding trailing spaces.
    line_width: f32,
    /// Width of the current line, including trailing spaces.
    chars_advance: f32,
    line_width_limit: f32,
    prev_boundary: Option<PrevBoundary>,
}

impl BreakState<'_> {
    fn update_line_width(&mut self, c: char, advance: f32) {
        if c == '\t' {
            self.chars_advance = self.tab_stops.next_tab(self.chars_advance);
            self.line_width = self.chars_advance;
        } else {
            self.chars_advance += advance;
            if !is_line_end_space(c) {
                self.line_width = self.chars_advance;
            }
        }
    }

    fn process_line_break(&mut self, offset: usize) {
        while self.line_width > self.line_width_limit {
            let start = self.break_points.last().map_or(0, |bp| bp.offset);
            if !self.try_line_break() && self.break_at_clusters(start, offset) {
                return;
            }
        }
        self.prev_boundary = Some(PrevBoundary {
            offset,
            line_width: self.line_width,
            chars_advance: self.chars_advance,
        });
    }

    fn try_line_break(&mut self) -> bool {
        let Some(prev) = self.prev_boundary else {
            return false;
        };
        self.break_line_at(
            prev.offset,
            prev.line_width,
            self.line_width - prev.chars_advance,
            self.chars_advance - prev.chars_advance,
        );
        true
    }

    /// Breaks `start..end` at cluster boundaries. Returns `true` if the whole range was consumed.
    fn break_at_clusters(&mut self, start: usize, end: usize) -> bool {
        let mut width = self.advances.get(start).copied().unwrap_or(0.0);
        for i in start + 1..end {
            let w = self.advances[i];
            if w == 0.0 {
                // Not a cluster boundary.
                continue;
            }
            if width + w > self.line_width_limit {
                let line_width = self.line_width;
                let chars_advance = self.chars_advance;
                self.break_line_at(i, width, line_width - width, chars_advance - width);
                return false;
            }
            width += w;
        }
        let line_width = self.line_width;
        self.break_line_at(end, line_width, 0.0, 0.0);
        true
    }

    fn break_line_at(
        &mut self,
        offset: usize,
        line_width: f32,
        remaining_line_width: f32,
        remaining_chars_advance: f32,
    ) {
        self.break_points.push(BreakPoint {
            offset,
            width: line_width,
        });
        self.line_num += 1;
        self.line_width_limit = self.widths.at(self.line_num);
        self.line_width = remaining_line_width;
        self.chars_advance = remaining_chars_advance;
        self.prev_boundary = None;
    }
}
