// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The queryable result of laying out text.

mod line;

pub use line::LineEntry;

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::ops::Range;

use text_primitives::{Alignment, Direction};

use crate::line_breaker::is_line_end_space;
use crate::{Canvas, Directions, Rect, StyledText, TabStops, TextLine, TextPaint, TextSpan};

/// Text laid out into lines.
///
/// Implementations provide the line table. Everything else, from hit testing to drawing, is
/// derived from it. Layouts do not own their text: methods that need the characters or spans
/// take the text the layout was built from.
pub trait Layout {
    /// The wrapping width.
    fn width(&self) -> i32;

    /// The base paint.
    fn paint(&self) -> &TextPaint;

    /// The base alignment.
    fn alignment(&self) -> Alignment;

    /// The number of lines.
    fn line_count(&self) -> usize;

    /// The top of `line`. At `line_count()` this is the height of the layout.
    fn line_top(&self, line: usize) -> i32;

    /// The distance from the baseline of `line` to its bottom.
    fn line_descent(&self, line: usize) -> i32;

    /// The offset of the first character of `line`. At `line_count()` this is the text length.
    fn line_start(&self, line: usize) -> usize;

    /// Direction of the paragraph containing `line`.
    fn paragraph_direction(&self, line: usize) -> Direction;

    /// Returns `true` if `line` contains a tab.
    fn line_contains_tab(&self, line: usize) -> bool;

    /// The visual runs of `line`.
    fn line_directions(&self, line: usize) -> &Directions;

    /// Space above the first line reserved for glyphs taller than the ascent.
    fn top_padding(&self) -> i32;

    /// Space below the last line reserved for glyphs deeper than the descent.
    fn bottom_padding(&self) -> i32;

    /// Start of the elided range of `line`, relative to its start.
    fn ellipsis_start(&self, line: usize) -> usize;

    /// Length of the elided range of `line`. Zero when nothing was elided.
    fn ellipsis_count(&self, line: usize) -> usize;

    /// The width the ellipsis was fitted to.
    fn ellipsized_width(&self) -> i32 {
        self.width()
    }

    /// Extra leading below `line`.
    fn line_extra(&self, line: usize) -> i32 {
        let _ = line;
        0
    }

    /// Horizontal shift of `line` from indents, for an alignment of `Left`, `Right` or `Center`.
    fn indent_adjust(&self, line: usize, align: Alignment) -> i32 {
        let _ = (line, align);
        0
    }

    /// The height, optionally capped at the last visible line.
    fn height_capped(&self, cap: bool) -> i32 {
        let _ = cap;
        self.height()
    }

    /// The total height.
    fn height(&self) -> i32 {
        self.line_top(self.line_count())
    }

    /// The offset just past the last character of `line`.
    fn line_end(&self, line: usize) -> usize {
        self.line_start(line + 1)
    }

    /// The baseline of `line`.
    fn line_baseline(&self, line: usize) -> i32 {
        self.line_top(line + 1) - self.line_descent(line)
    }

    /// The bottom of `line`.
    fn line_bottom(&self, line: usize) -> i32 {
        self.line_top(line + 1)
    }

    /// The distance from the baseline of `line` to its top, as a negative number.
    fn line_ascent(&self, line: usize) -> i32 {
        self.line_top(line) - self.line_baseline(line)
    }

    /// The end of `line` without trailing whitespace and newline.
    ///
    /// The last line keeps its whitespace.
    fn line_visible_end(&self, text: &StyledText<'_>, line: usize) -> usize {
        let start = self.line_start(line);
        let mut end = self.line_end(line);
        if line + 1 == self.line_count() {
            return end;
        }
        while end > start {
            let Some(ch) = text.char_before(end) else {
                break;
            };
            if ch == '\n' {
                return end - 1;
            }
            if !is_line_end_space(ch) {
                break;
            }
            end -= ch.len_utf8();
        }
        end
    }

    /// The line at vertical position `vertical`.
    fn line_for_vertical(&self, vertical: i32) -> usize {
        let mut high = self.line_count();
        let mut low = 0;
        while low < high {
            let mid = low + (high - low) / 2;
            if self.line_top(mid) > vertical {
                high = mid;
            } else {
                low = mid + 1;
            }
        }
        low.saturating_sub(1)
    }

    /// The line containing `offset`.
    fn line_for_offset(&self, offset: usize) -> usize {
        let mut high = self.line_count();
        let mut low = 0;
        while low < high {
            let mid = low + (high - low) / 2;
            if self.line_start(mid) > offset {
                high = mid;
            } else {
                low = mid + 1;
            }
        }
        low.saturating_sub(1)
    }

    /// The alignment of the paragraph containing `line`.
    ///
    /// The last alignment span over the line wins over the base alignment.
    fn paragraph_alignment(&self, text: &StyledText<'_>, line: usize) -> Alignment {
        paragraph_spans(text, self.line_start(line)..self.line_end(line), &|span| {
            span.alignment().is_some()
        })
        .iter()
        .rev()
        .find_map(|span| span.alignment())
        .unwrap_or_else(|| self.alignment())
    }

    /// The total leading margin of `line`.
    fn paragraph_leading_margin(&self, text: &StyledText<'_>, line: usize) -> i32 {
        let start = self.line_start(line);
        let end = self.line_end(line);
        let span_end = text.next_span_transition(start, end, &|span| span.leading_margin().is_some());
        let spans = paragraph_spans(text, start..span_end, &|span| span.leading_margin().is_some());
        if spans.is_empty() {
            return 0;
        }
        let mut first = is_paragraph_start(text, start);
        for span in &spans {
            if let Some(margin) = span.leading_margin() {
                first |= uses_first_line_margin(self, text, span, margin.leading_margin_line_count(), line);
            }
        }
        spans
            .iter()
            .filter_map(|span| span.leading_margin())
            .map(|margin| margin.leading_margin(first))
            .sum()
    }

    /// The left edge of the paragraph area of `line`.
    fn paragraph_left(&self, text: &StyledText<'_>, line: usize) -> i32 {
        if self.paragraph_direction(line).is_rtl() {
            return 0;
        }
        self.paragraph_leading_margin(text, line)
    }

    /// The right edge of the paragraph area of `line`.
    fn paragraph_right(&self, text: &StyledText<'_>, line: usize) -> i32 {
        let right = self.width();
        if !self.paragraph_direction(line).is_rtl() {
            return right;
        }
        right - self.paragraph_leading_margin(text, line)
    }

    /// Lays out `line` for measuring or drawing.
    ///
    /// Trailing whitespace is excluded unless `full` is set. An elided range is never cut.
    fn text_line<'a>(&self, text: &'a StyledText<'a>, line: usize, full: bool) -> TextLine<'a> {
        let start = self.line_start(line);
        let ellipsis_start = self.ellipsis_start(line);
        let ellipsis_count = self.ellipsis_count(line);
        let mut end = if full {
            self.line_end(line)
        } else {
            self.line_visible_end(text, line)
        };
        if ellipsis_count > 0 {
            end = end.max(start + ellipsis_start + ellipsis_count);
        }
        let tab_stops = if self.line_contains_tab(line) {
            paragraph_tab_stops(text, start..self.line_end(line))
        } else {
            None
        };
        TextLine::new(
            self.paint(),
            text,
            start..end,
            self.paragraph_direction(line),
            self.line_directions(line),
            tab_stops.as_ref(),
            ellipsis_start..ellipsis_start + ellipsis_count,
        )
    }

    /// The width of `line` including trailing whitespace and leading margin.
    fn line_width(&self, text: &StyledText<'_>, line: usize) -> f32 {
        self.paragraph_leading_margin(text, line) as f32 + self.text_line(text, line, true).width()
    }

    /// The width of `line` without trailing whitespace, leading margin included.
    fn line_max(&self, text: &StyledText<'_>, line: usize) -> f32 {
        self.paragraph_leading_margin(text, line) as f32 + self.text_line(text, line, false).width()
    }

    /// The left edge of the text of `line`.
    fn line_left(&self, text: &StyledText<'_>, line: usize) -> f32 {
        let dir = self.paragraph_direction(line);
        match normalize_alignment(self.paragraph_alignment(text, line), dir) {
            Alignment::Center => {
                let left = self.paragraph_left(text, line) as f32;
                let right = self.paragraph_right(text, line) as f32;
                (left + ((right - left) - self.line_max(text, line)) / 2.0).floor()
            }
            Alignment::Opposite if !dir.is_rtl() => self.width() as f32 - self.line_max(text, line),
            Alignment::Normal if dir.is_rtl() => {
                self.paragraph_right(text, line) as f32 - self.line_max(text, line)
            }
            _ => 0.0,
        }
    }

    /// The right edge of the text of `line`.
    fn line_right(&self, text: &StyledText<'_>, line: usize) -> f32 {
        let dir = self.paragraph_direction(line);
        match normalize_alignment(self.paragraph_alignment(text, line), dir) {
            Alignment::Center => {
                let left = self.paragraph_left(text, line) as f32;
                let right = self.paragraph_right(text, line) as f32;
                (right - ((right - left) - self.line_max(text, line)) / 2.0).ceil()
            }
            Alignment::Normal if !dir.is_rtl() => {
                self.paragraph_left(text, line) as f32 + self.line_max(text, line)
            }
            Alignment::Opposite if dir.is_rtl() => self.line_max(text, line),
            _ => self.width() as f32,
        }
    }

    /// The horizontal position of the caret before `offset`.
    fn primary_horizontal(&self, text: &StyledText<'_>, offset: usize) -> f32 {
        let line = self.line_for_offset(offset);
        let tl = self.text_line(text, line, false);
        let (left, right) = line_bounds(self, text, line);
        line_origin(self, text, line, left, right, tl.width()) + tl.measure(offset)
    }

    /// The offset on `line` whose caret is closest to `horizontal`.
    fn offset_for_horizontal(&self, text: &StyledText<'_>, line: usize, horizontal: f32) -> usize {
        let start = self.line_start(line);
        let end = self.line_visible_end(text, line);
        let tl = self.text_line(text, line, false);
        let (left, right) = line_bounds(self, text, line);
        let origin = line_origin(self, text, line, left, right, tl.width());
        let mut best = start;
        let mut best_distance = f32::INFINITY;
        let mut offset = start;
        loop {
            let distance = (origin + tl.measure(offset) - horizontal).abs();
            if distance < best_distance {
                best = offset;
                best_distance = distance;
            }
            if offset >= end {
                break;
            }
            offset += text.char_at(offset).map_or(1, char::len_utf8);
        }
        best
    }

    /// The lines that intersect the visible area of `canvas`, or `None` if none do.
    fn line_range_for_draw(&self, canvas: &dyn Canvas) -> Option<Range<usize>> {
        let width = self.width() as f32;
        let mut first = None;
        let mut last = 0;
        for line in 0..self.line_count() {
            let band = Rect::new(0.0, self.line_top(line) as f32, width, self.line_bottom(line) as f32);
            let rejected = canvas.quick_reject(band);
            match first {
                None if !rejected => {
                    first = Some(line);
                    last = line;
                }
                None => {}
                Some(_) if rejected => break,
                Some(_) => last = line,
            }
        }
        first.map(|first| first..last + 1)
    }

    /// Draws the visible lines of the layout onto `canvas`.
    fn draw(&self, canvas: &mut dyn Canvas, text: &StyledText<'_>) {
        let Some(lines) = self.line_range_for_draw(canvas) else {
            return;
        };
        self.draw_background(canvas, text, lines.clone());
        self.draw_text(canvas, text, lines);
    }

    /// Paints line backgrounds of `lines`.
    fn draw_background(&self, canvas: &mut dyn Canvas, text: &StyledText<'_>, lines: Range<usize>) {
        if text
            .get_spans(0..text.len(), &|span| span.line_background().is_some())
            .is_empty()
        {
            return;
        }
        let width = self.width();
        for line in lines {
            let start = self.line_start(line);
            let end = self.line_end(line);
            let top = self.line_top(line);
            let bottom = self.line_bottom(line);
            let baseline = self.line_baseline(line);
            for span in paragraph_spans(text, start..end, &|span| span.line_background().is_some()) {
                if let Some(background) = span.line_background() {
                    background.draw_background(
                        canvas,
                        self.paint(),
                        0,
                        width,
                        top,
                        baseline,
                        bottom,
                        text,
                        start..end,
                        line,
                    );
                }
            }
        }
    }

    /// Draws leading margins and text of `lines`.
    fn draw_text(&self, canvas: &mut dyn Canvas, text: &StyledText<'_>, lines: Range<usize>) {
        for line in lines {
            let start = self.line_start(line);
            let end = self.line_end(line);
            let top = self.line_top(line);
            let bottom = self.line_bottom(line);
            let baseline = self.line_baseline(line);
            let dir = self.paragraph_direction(line);
            let first = is_paragraph_start(text, start);

            let mut left = 0;
            let mut right = self.width();
            let margins = paragraph_spans(text, start..end, &|span| span.leading_margin().is_some());
            for span in &margins {
                let Some(margin) = span.leading_margin() else {
                    continue;
                };
                let use_first = first
                    || uses_first_line_margin(self, text, span, margin.leading_margin_line_count(), line);
                if dir.is_rtl() {
                    margin.draw_leading_margin(
                        canvas,
                        self.paint(),
                        right,
                        dir,
                        top,
                        baseline,
                        bottom,
                        text,
                        start..end,
                        first,
                    );
                    right -= margin.leading_margin(use_first);
                } else {
                    margin.draw_leading_margin(
                        canvas,
                        self.paint(),
                        left,
                        dir,
                        top,
                        baseline,
                        bottom,
                        text,
                        start..end,
                        first,
                    );
                    left += margin.leading_margin(use_first);
                }
            }

            let tl = self.text_line(text, line, false);
            let x = line_origin(self, text, line, left, right, tl.width());
            tl.draw(canvas, x, top, baseline, bottom);
        }
    }
}

/// Returns the paragraph style spans over `range`, in query order.
///
/// An empty range past the start of the text has no paragraph spans.
pub(crate) fn paragraph_spans(
    text: &StyledText<'_>,
    range: Range<usize>,
    filter: &dyn Fn(&(dyn TextSpan + 'static)) -> bool,
) -> Vec<Rc<dyn TextSpan>> {
    if range.is_empty() && range.start > 0 {
        return Vec::new();
    }
    text.get_spans(range, filter)
}

/// Collects the tab stops defined by spans over a paragraph.
pub(crate) fn paragraph_tab_stops(text: &StyledText<'_>, range: Range<usize>) -> Option<TabStops> {
    let stops: Vec<f32> = paragraph_spans(text, range, &|span| span.tab_stop().is_some())
        .iter()
        .filter_map(|span| span.tab_stop())
        .collect();
    (!stops.is_empty()).then(|| TabStops::new(stops, crate::TAB_INCREMENT))
}

fn is_paragraph_start(text: &StyledText<'_>, offset: usize) -> bool {
    offset == 0 || text.char_before(offset) == Some('\n')
}

fn uses_first_line_margin<L: Layout + ?Sized>(
    layout: &L,
    text: &StyledText<'_>,
    span: &Rc<dyn TextSpan>,
    count: usize,
    line: usize,
) -> bool {
    text.span_start(span.as_ref())
        .is_some_and(|start| line < layout.line_for_offset(start) + count)
}

/// Maps `Left` and `Right` onto the paragraph direction.
fn normalize_alignment(align: Alignment, dir: Direction) -> Alignment {
    match (align, dir) {
        (Alignment::Left, Direction::Ltr) | (Alignment::Right, Direction::Rtl) => Alignment::Normal,
        (Alignment::Left, Direction::Rtl) | (Alignment::Right, Direction::Ltr) => Alignment::Opposite,
        (other, _) => other,
    }
}

/// The paragraph edges of `line` with leading margins removed.
fn line_bounds<L: Layout + ?Sized>(layout: &L, text: &StyledText<'_>, line: usize) -> (i32, i32) {
    let margin = layout.paragraph_leading_margin(text, line);
    if layout.paragraph_direction(line).is_rtl() {
        (0, layout.width() - margin)
    } else {
        (margin, layout.width())
    }
}

/// Rounds an extent down to an even pixel count for centering.
fn even_extent(extent: f32) -> i32 {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "line extents are far below i32::MAX"
    )]
    let extent = extent as i32;
    extent & !1
}

/// The left edge of the text of `line` within `left..right`, given its `extent`.
fn line_origin<L: Layout + ?Sized>(
    layout: &L,
    text: &StyledText<'_>,
    line: usize,
    left: i32,
    right: i32,
    extent: f32,
) -> f32 {
    let dir = layout.paragraph_direction(line);
    let align = normalize_alignment(layout.paragraph_alignment(text, line), dir);
    match (align, dir) {
        (Alignment::Normal, Direction::Ltr) | (Alignment::Opposite, Direction::Rtl) => {
            (left + layout.indent_adjust(line, Alignment::Left)) as f32
        }
        (Alignment::Normal, Direction::Rtl) | (Alignment::Opposite, Direction::Ltr) => {
            (right + layout.indent_adjust(line, Alignment::Right)) as f32 - extent
        }
        _ => {
            let max = even_extent(extent);
            (((right + left - max) >> 1) + layout.indent_adjust(line, Alignment::Center)) as f32
        }
    }
}
