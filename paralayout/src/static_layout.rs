// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout of text that does not change after construction.

use alloc::vec::Vec;
use core::ops::Range;

use spannable::{Error, TextRange};
use text_primitives::{Alignment, Direction, TextDirectionHeuristic, TruncateAt};

use crate::layout::{paragraph_spans, paragraph_tab_stops};
use crate::text_line::ELLIPSIS;
use crate::{
    Directions, Layout, LayoutContext, LineEntry, MeasuredParagraph, ParagraphConstraints,
    StyledText, TextPaint,
};

/// Parameters shared by the static and the dynamic layouts.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LayoutParams {
    pub(crate) width: i32,
    pub(crate) alignment: Alignment,
    pub(crate) text_direction: TextDirectionHeuristic,
    pub(crate) spacing_add: f32,
    pub(crate) spacing_mult: f32,
    pub(crate) include_pad: bool,
    pub(crate) fallback_line_spacing: bool,
    pub(crate) ellipsized_width: i32,
    pub(crate) ellipsize: Option<TruncateAt>,
    pub(crate) max_lines: usize,
    pub(crate) left_indents: Option<Vec<i32>>,
    pub(crate) right_indents: Option<Vec<i32>>,
    pub(crate) add_last_line_spacing: bool,
}

impl LayoutParams {
    pub(crate) fn new(width: i32) -> Self {
        let width = if width < 0 {
            log::warn!("layout width {width} is negative, using 0");
            0
        } else {
            width
        };
        Self {
            width,
            alignment: Alignment::Normal,
            text_direction: TextDirectionHeuristic::FirstStrongLtr,
            spacing_add: 0.0,
            spacing_mult: 1.0,
            include_pad: true,
            fallback_line_spacing: true,
            ellipsized_width: width,
            ellipsize: None,
            max_lines: usize::MAX,
            left_indents: None,
            right_indents: None,
            add_last_line_spacing: false,
        }
    }

    pub(crate) fn indent_adjust(&self, line: usize, align: Alignment) -> i32 {
        let left = indent_at(self.left_indents.as_deref(), line);
        let right = indent_at(self.right_indents.as_deref(), line);
        match align {
            Alignment::Left => left,
            Alignment::Right => -right,
            _ => (left - right) >> 1,
        }
    }
}

fn indent_at(indents: Option<&[i32]>, line: usize) -> i32 {
    match indents {
        Some(indents) if !indents.is_empty() => indents[line.min(indents.len() - 1)],
        _ => 0,
    }
}

/// Rounds half up, the way line metrics are rounded.
fn round(value: f32) -> i32 {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "font metrics are far below i32::MAX"
    )]
    let rounded = (value + 0.5).floor() as i32;
    rounded
}

/// Extra leading for a line of height `height`, rounded half away from zero.
fn line_spacing_extra(height: i32, mult: f32, add: f32) -> i32 {
    let extra = f64::from(height) * (f64::from(mult) - 1.0) + f64::from(add);
    #[expect(
        clippy::cast_possible_truncation,
        reason = "line spacing is far below i32::MAX"
    )]
    let rounded = if extra >= 0.0 {
        (extra + 0.5) as i32
    } else {
        -((-extra + 0.5) as i32)
    };
    rounded
}

/// Configures and builds a [`StaticLayout`].
#[derive(Clone)]
pub struct StaticBuilder<'a> {
    text: &'a StyledText<'a>,
    range: Range<usize>,
    paint: TextPaint,
    params: LayoutParams,
}

impl<'a> StaticBuilder<'a> {
    /// Sets the base alignment. Defaults to [`Alignment::Normal`].
    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.params.alignment = alignment;
        self
    }

    /// Sets how paragraph directions are decided. Defaults to first strong, left to right.
    pub fn text_direction(mut self, heuristic: TextDirectionHeuristic) -> Self {
        self.params.text_direction = heuristic;
        self
    }

    /// Sets line spacing: every line but the last grows by `add` plus `mult - 1` times its
    /// height. Defaults to `(0, 1)`.
    pub fn line_spacing(mut self, add: f32, mult: f32) -> Self {
        self.params.spacing_add = add;
        self.params.spacing_mult = mult;
        self
    }

    /// Sets whether the first and last lines reserve room for the font's full extents.
    /// Defaults to `true`.
    pub fn include_pad(mut self, include_pad: bool) -> Self {
        self.params.include_pad = include_pad;
        self
    }

    /// Sets whether lines grow to fit glyphs from fallback fonts. Defaults to `true`.
    pub fn fallback_line_spacing(mut self, enabled: bool) -> Self {
        self.params.fallback_line_spacing = enabled;
        self
    }

    /// Sets the width the ellipsis is fitted to. Defaults to the layout width.
    pub fn ellipsized_width(mut self, width: i32) -> Self {
        self.params.ellipsized_width = width;
        self
    }

    /// Sets where text that does not fit is elided. Defaults to no elision.
    pub fn ellipsize(mut self, ellipsize: Option<TruncateAt>) -> Self {
        self.params.ellipsize = ellipsize;
        self
    }

    /// Sets the number of visible lines. Defaults to no limit.
    pub fn max_lines(mut self, max_lines: usize) -> Self {
        self.params.max_lines = max_lines;
        self
    }

    /// Sets per-line indents. The last entry of each array applies to all later lines.
    pub fn indents(mut self, left: Option<Vec<i32>>, right: Option<Vec<i32>>) -> Self {
        self.params.left_indents = left;
        self.params.right_indents = right;
        self
    }

    /// Builds the layout with fresh scratch state.
    pub fn build(self) -> StaticLayout {
        let mut lcx = LayoutContext::new();
        self.build_in(&mut lcx)
    }

    /// Builds the layout reusing the scratch state in `lcx`.
    pub fn build_in(self, lcx: &mut LayoutContext) -> StaticLayout {
        let include_pad = self.params.include_pad;
        let mut layout = StaticLayout::empty(self.paint, self.params);
        layout.generate(lcx, self.text, self.range, include_pad, include_pad);
        layout
    }
}

impl core::fmt::Debug for StaticBuilder<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StaticBuilder")
            .field("range", &self.range)
            .field("paint", &self.paint)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// One line handed to the line table.
struct PendingLine<'m> {
    start: usize,
    end: usize,
    above: i32,
    below: i32,
    top: i32,
    bottom: i32,
    has_tab: bool,
    text_width: f32,
    more_chars: bool,
    paragraph: &'m MeasuredParagraph,
    paragraph_start: usize,
}

/// Lines of a layout being generated.
#[derive(Clone, Debug, Default)]
struct LineTable {
    lines: Vec<LineEntry>,
    top_padding: i32,
    bottom_padding: i32,
    ellipsized: bool,
    max_line_height: Option<i32>,
}

impl LineTable {
    fn line_count(&self) -> usize {
        self.lines.len() - 1
    }

    fn reset(&mut self, start: usize, max_lines: usize) {
        self.lines.clear();
        self.lines.push(LineEntry::sentinel(start, 0));
        self.top_padding = 0;
        self.bottom_padding = 0;
        self.ellipsized = false;
        self.max_line_height = (max_lines < 1).then_some(0);
    }

    /// Commits one line and returns the top of the next.
    fn out(
        &mut self,
        params: &LayoutParams,
        paint: &TextPaint,
        line: PendingLine<'_>,
        v: i32,
        buf_end: usize,
        last_char_is_newline: bool,
        include_pad: bool,
        track_pad: bool,
    ) -> i32 {
        let j = self.line_count();
        let first_line = j == 0;
        let last_visible = j + 1 == params.max_lines;
        let mut above = line.above;
        let mut below = line.below;

        let mut ellipsis = (0, 0);
        if let Some(mode) = params.ellipsize {
            let force = line.more_chars && last_visible;
            let do_ellipsis = (params.max_lines == 1 && line.more_chars)
                || (first_line && !line.more_chars)
                || (!first_line
                    && (last_visible || !line.more_chars)
                    && mode == TruncateAt::End);
            if do_ellipsis {
                ellipsis = self.calculate_ellipsis(params, paint, &line, mode, j, force);
            }
        }

        let last_line = self.ellipsized
            || (line.end == buf_end && !(line.paragraph_start != buf_end && last_char_is_newline))
            || (line.start == buf_end && line.paragraph_start != buf_end && last_char_is_newline);

        if first_line {
            if track_pad {
                self.top_padding = line.top - above;
            }
            if include_pad {
                above = line.top;
            }
        }
        if last_line {
            if track_pad {
                self.bottom_padding = line.bottom - below;
            }
            if include_pad {
                below = line.bottom;
            }
        }

        let need_multiply = params.spacing_mult != 1.0 || params.spacing_add != 0.0;
        let extra = if need_multiply && (params.add_last_line_spacing || !last_line) {
            line_spacing_extra(below - above, params.spacing_mult, params.spacing_add)
        } else {
            0
        };

        if !self.ellipsized && last_visible {
            let max_line_below = if include_pad { line.bottom } else { below };
            self.max_line_height = Some(v + (max_line_below - above));
        }

        let next_v = v + (below - above) + extra;
        let offset = line.paragraph_start;
        self.lines[j] = LineEntry {
            start: line.start,
            top: v,
            descent: below + extra,
            extra,
            direction: line.paragraph.paragraph_direction(),
            has_tab: line.has_tab,
            ellipsis_start: ellipsis.0,
            ellipsis_count: ellipsis.1,
            directions: line
                .paragraph
                .get_directions(line.start - offset..line.end - offset),
        };
        self.lines.push(LineEntry::sentinel(line.end, next_v));
        next_v
    }

    /// Decides the elided range of a line, as `(start, count)` relative to the line start.
    fn calculate_ellipsis(
        &mut self,
        params: &LayoutParams,
        paint: &TextPaint,
        line: &PendingLine<'_>,
        mode: TruncateAt,
        j: usize,
        force: bool,
    ) -> (usize, usize) {
        let avail = (params.ellipsized_width
            - indent_at(params.left_indents.as_deref(), j)
            - indent_at(params.right_indents.as_deref(), j)) as f32;
        if line.text_width <= avail && !force {
            return (0, 0);
        }

        let ellipsis_width = paint.measure_text(ELLIPSIS);
        let mp = line.paragraph;
        let offset = line.start - line.paragraph_start;
        let len = line.end - line.start;
        let width = |i: usize| mp.advance(offset + i);

        let mut result = (0, 0);
        match mode {
            TruncateAt::Start => {
                if params.max_lines == 1 {
                    let mut sum = 0.0;
                    let mut i = len;
                    while i > 0 {
                        let w = width(i - 1);
                        if w + sum + ellipsis_width > avail {
                            while i < len && width(i) == 0.0 {
                                i += 1;
                            }
                            break;
                        }
                        sum += w;
                        i -= 1;
                    }
                    result = (0, i);
                } else {
                    log::warn!("start ellipsis is only supported on a single line");
                }
            }
            TruncateAt::End => {
                let mut sum = 0.0;
                let mut i = 0;
                while i < len {
                    let w = width(i);
                    if w + sum + ellipsis_width > avail {
                        break;
                    }
                    sum += w;
                    i += 1;
                }
                result = (i, len - i);
                if force && result.1 == 0 && len > 0 {
                    let chars = &mp.chars()[offset..offset + len];
                    let last = chars.char_indices().next_back().map_or(0, |(i, _)| i);
                    result = (last, len - last);
                }
            }
            TruncateAt::Middle => {
                if params.max_lines == 1 {
                    let mut rsum = 0.0;
                    let mut right = len;
                    let ravail = (avail - ellipsis_width) / 2.0;
                    while right > 0 {
                        let w = width(right - 1);
                        if w + rsum > ravail {
                            while right < len && width(right) == 0.0 {
                                right += 1;
                            }
                            break;
                        }
                        rsum += w;
                        right -= 1;
                    }

                    let lavail = avail - ellipsis_width - rsum;
                    let mut lsum = 0.0;
                    let mut left = 0;
                    while left < right {
                        let w = width(left);
                        if w + lsum > lavail {
                            break;
                        }
                        lsum += w;
                        left += 1;
                    }
                    result = (left, right - left);
                } else {
                    log::warn!("middle ellipsis is only supported on a single line");
                }
            }
        }
        self.ellipsized = true;
        result
    }
}

/// A layout of text that will not change.
///
/// The text is split into paragraphs at each `'\n'`. Each paragraph is measured, broken into
/// lines with the greedy [`LineBreaker`](crate::LineBreaker), and its lines are committed to
/// a line table along with their vertical metrics and visual runs. A layout built from text
/// that is empty or ends with a newline carries a trailing empty line, so that the caret
/// always has a line to sit on.
#[derive(Clone, Debug)]
pub struct StaticLayout {
    paint: TextPaint,
    params: LayoutParams,
    table: LineTable,
}

impl StaticLayout {
    /// Starts configuring a layout of `range` of `text`, `width` pixels wide.
    ///
    /// Fails if `range` is reversed, out of bounds or not on char boundaries.
    pub fn builder<'a>(
        text: &'a StyledText<'a>,
        range: Range<usize>,
        paint: &TextPaint,
        width: i32,
    ) -> Result<StaticBuilder<'a>, Error> {
        let range = TextRange::new(text, range)?.as_range();
        Ok(StaticBuilder {
            text,
            range,
            paint: paint.clone(),
            params: LayoutParams::new(width),
        })
    }

    pub(crate) fn empty(paint: TextPaint, params: LayoutParams) -> Self {
        Self {
            paint,
            params,
            table: LineTable::default(),
        }
    }

    pub(crate) fn params(&self) -> &LayoutParams {
        &self.params
    }

    pub(crate) fn params_mut(&mut self) -> &mut LayoutParams {
        &mut self.params
    }

    /// Every row of the line table, the closing row included.
    pub fn lines(&self) -> &[LineEntry] {
        &self.table.lines
    }

    /// The configured number of visible lines.
    pub fn max_lines(&self) -> usize {
        self.params.max_lines
    }

    /// Returns `true` if any line was elided.
    pub fn is_ellipsized(&self) -> bool {
        self.table.ellipsized
    }

    /// Lays out `range` of `text` into the line table.
    pub(crate) fn generate(
        &mut self,
        lcx: &mut LayoutContext,
        text: &StyledText<'_>,
        range: Range<usize>,
        include_pad: bool,
        track_pad: bool,
    ) {
        let Self {
            paint,
            params,
            table,
        } = self;
        let buf_start = range.start;
        let buf_end = range.end;
        table.reset(buf_start, params.max_lines);

        let outer_width = params.width;
        let indents = match (&params.left_indents, &params.right_indents) {
            (None, None) => None,
            (left, right) => {
                let left = left.as_deref().unwrap_or_default();
                let right = right.as_deref().unwrap_or_default();
                let len = left.len().max(right.len());
                Some(
                    (0..len)
                        .map(|i| {
                            left.get(i).copied().unwrap_or(0) + right.get(i).copied().unwrap_or(0)
                        })
                        .collect::<Vec<_>>(),
                )
            }
        };
        let last_char_is_newline = buf_end > 0 && text.char_before(buf_end) == Some('\n');
        let ellipsis_may_apply = params.ellipsize == Some(TruncateAt::End)
            || (params.max_lines == 1 && params.ellipsize.is_some());

        let mut v = 0;
        let mut para_start = buf_start;
        while para_start < buf_end {
            let para_end = text
                .index_of('\n', para_start..buf_end)
                .map_or(buf_end, |i| i + 1);

            let mut first_width_line_count = 1;
            let mut first_width = outer_width;
            let mut rest_width = outer_width;
            for span in paragraph_spans(text, para_start..para_end, &|span| {
                span.leading_margin().is_some()
            }) {
                if let Some(margin) = span.leading_margin() {
                    first_width -= margin.leading_margin(true);
                    rest_width -= margin.leading_margin(false);
                    first_width_line_count =
                        first_width_line_count.max(margin.leading_margin_line_count());
                }
            }

            let mp = MeasuredParagraph::analyze_and_measure(
                paint,
                text,
                para_start..para_end,
                params.text_direction,
                lcx.obtain_measured(),
            );
            let constraints = ParagraphConstraints {
                width: rest_width as f32,
                first_width: first_width as f32,
                first_width_line_count,
                tab_stops: paragraph_tab_stops(text, para_start..para_end).unwrap_or_default(),
            };
            let mut breaks = lcx
                .breaker
                .compute_line_breaks(&mp, &constraints, indents.as_deref(), table.line_count())
                .lines;

            let remaining = params.max_lines.saturating_sub(table.line_count());
            if 0 < remaining && remaining < breaks.len() && ellipsis_may_apply {
                // The overflow lines collapse into the last visible one.
                let mut width = 0.0;
                let mut has_tab = false;
                for i in remaining - 1..breaks.len() {
                    if i == breaks.len() - 1 {
                        width += breaks[i].width;
                    } else {
                        let from = if i == 0 { 0 } else { breaks[i - 1].end };
                        width += mp.advance_range(from..breaks[i].end);
                    }
                    has_tab |= breaks[i].has_tab;
                }
                let end = breaks[breaks.len() - 1].end;
                let merged = &mut breaks[remaining - 1];
                merged.end = end;
                merged.width = width;
                merged.has_tab = has_tab;
                breaks.truncate(remaining);
            }

            let mut here = para_start;
            let (mut fm_top, mut fm_bottom, mut fm_ascent, mut fm_descent) = (0, 0, 0, 0);
            let mut break_index = 0;
            let mut span_start = para_start;
            for (&span_end, fm) in mp.span_end_cache().iter().zip(mp.font_metrics()) {
                fm_top = fm_top.min(fm.top);
                fm_ascent = fm_ascent.min(fm.ascent);
                fm_descent = fm_descent.max(fm.descent);
                fm_bottom = fm_bottom.max(fm.bottom);

                while break_index < breaks.len() && para_start + breaks[break_index].end < span_start {
                    break_index += 1;
                }
                while break_index < breaks.len() && para_start + breaks[break_index].end <= span_end {
                    let broken = breaks[break_index];
                    let end_pos = para_start + broken.end;
                    let (ascent, descent) = if params.fallback_line_spacing {
                        (
                            fm_ascent.min(round(broken.ascent)),
                            fm_descent.max(round(broken.descent)),
                        )
                    } else {
                        (fm_ascent, fm_descent)
                    };
                    let pending = PendingLine {
                        start: here,
                        end: end_pos,
                        above: ascent,
                        below: descent,
                        top: fm_top,
                        bottom: fm_bottom,
                        has_tab: broken.has_tab,
                        text_width: broken.width,
                        more_chars: end_pos < buf_end,
                        paragraph: &mp,
                        paragraph_start: para_start,
                    };
                    v = table.out(
                        params,
                        paint,
                        pending,
                        v,
                        buf_end,
                        last_char_is_newline,
                        include_pad,
                        track_pad,
                    );
                    if end_pos < span_end {
                        fm_top = fm.top;
                        fm_bottom = fm.bottom;
                        fm_ascent = fm.ascent;
                        fm_descent = fm.descent;
                    } else {
                        (fm_top, fm_bottom, fm_ascent, fm_descent) = (0, 0, 0, 0);
                    }
                    here = end_pos;
                    break_index += 1;

                    if table.line_count() >= params.max_lines && table.ellipsized {
                        lcx.recycle_measured(mp);
                        return;
                    }
                }
                span_start = span_end;
            }
            lcx.recycle_measured(mp);
            para_start = para_end;
        }

        if (buf_end == buf_start || last_char_is_newline) && table.line_count() < params.max_lines {
            let mp = MeasuredParagraph::analyze(
                text,
                buf_end..buf_end,
                params.text_direction,
                lcx.obtain_measured(),
            );
            let fm = paint.font_metrics();
            let pending = PendingLine {
                start: buf_end,
                end: buf_end,
                above: fm.ascent,
                below: fm.descent,
                top: fm.top,
                bottom: fm.bottom,
                has_tab: false,
                text_width: 0.0,
                more_chars: false,
                paragraph: &mp,
                paragraph_start: buf_start,
            };
            table.out(
                params,
                paint,
                pending,
                v,
                buf_end,
                last_char_is_newline,
                include_pad,
                track_pad,
            );
            lcx.recycle_measured(mp);
        }
    }
}

impl Layout for StaticLayout {
    fn width(&self) -> i32 {
        self.params.width
    }

    fn paint(&self) -> &TextPaint {
        &self.paint
    }

    fn alignment(&self) -> Alignment {
        self.params.alignment
    }

    fn line_count(&self) -> usize {
        self.table.line_count()
    }

    fn line_top(&self, line: usize) -> i32 {
        self.table.lines[line].top
    }

    fn line_descent(&self, line: usize) -> i32 {
        self.table.lines[line].descent
    }

    fn line_start(&self, line: usize) -> usize {
        self.table.lines[line].start
    }

    fn paragraph_direction(&self, line: usize) -> Direction {
        self.table.lines[line].direction
    }

    fn line_contains_tab(&self, line: usize) -> bool {
        self.table.lines[line].has_tab
    }

    fn line_directions(&self, line: usize) -> &Directions {
        &self.table.lines[line].directions
    }

    fn top_padding(&self) -> i32 {
        self.table.top_padding
    }

    fn bottom_padding(&self) -> i32 {
        self.table.bottom_padding
    }

    fn ellipsis_start(&self, line: usize) -> usize {
        self.table.lines[line].ellipsis_start
    }

    fn ellipsis_count(&self, line: usize) -> usize {
        self.table.lines[line].ellipsis_count
    }

    fn ellipsized_width(&self) -> i32 {
        if self.params.ellipsize.is_some() {
            self.params.ellipsized_width
        } else {
            self.params.width
        }
    }

    fn line_extra(&self, line: usize) -> i32 {
        self.table.lines[line].extra
    }

    fn indent_adjust(&self, line: usize, align: Alignment) -> i32 {
        self.params.indent_adjust(line, align)
    }

    fn height_capped(&self, cap: bool) -> i32 {
        match self.table.max_line_height {
            Some(height) if cap && self.line_count() > self.params.max_lines => height,
            _ => self.height(),
        }
    }
}
