// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Measuring and drawing a single line in visual order.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::ops::Range;

use smallvec::SmallVec;
use text_primitives::Direction;

use crate::{Canvas, Directions, FontMetrics, Rect, StyledText, TabStops, TextPaint, TextSpan};

/// The glyph drawn in place of elided text.
pub const ELLIPSIS: &str = "\u{2026}";

#[derive(Clone)]
enum PieceKind {
    Text { paint: TextPaint, advances: Vec<f32> },
    Replacement { span: Rc<dyn TextSpan>, paint: TextPaint, range: Range<usize> },
    Tab,
    Ellipsis { paint: TextPaint },
}

/// A positioned piece of the line. `range` is relative to the line start.
#[derive(Clone)]
struct Piece {
    range: Range<usize>,
    x: f32,
    width: f32,
    rtl: bool,
    kind: PieceKind,
}

/// One line of text, split into pieces of uniform style and direction and laid out from the
/// left edge of the line.
///
/// Pieces follow the visual order of the line's runs. Inside a right-to-left run they are
/// placed in reverse logical order. Tabs advance to the next tab stop measured from the left
/// edge of the line. An elided range is skipped and a single ellipsis glyph takes the place
/// of its first piece.
pub struct TextLine<'a> {
    text: &'a StyledText<'a>,
    start: usize,
    line_text: String,
    direction: Direction,
    pieces: Vec<Piece>,
    width: f32,
}

impl<'a> TextLine<'a> {
    /// Lays out `range` of `text`.
    ///
    /// `directions` describes the visual runs of the line starting at `range.start`. Runs
    /// are clipped to the range. `ellipsis` is relative to `range.start`; an empty range means
    /// nothing is elided.
    pub fn new(
        paint: &TextPaint,
        text: &'a StyledText<'a>,
        range: Range<usize>,
        direction: Direction,
        directions: &Directions,
        tab_stops: Option<&TabStops>,
        ellipsis: Range<usize>,
    ) -> Self {
        let mut line_text = String::new();
        text.get_chars(range.clone(), &mut line_text);
        let mut line = Self {
            text,
            start: range.start,
            line_text,
            direction,
            pieces: Vec::new(),
            width: 0.0,
        };
        let default_tabs;
        let tab_stops = match tab_stops {
            Some(stops) => stops,
            None => {
                default_tabs = TabStops::default();
                &default_tabs
            }
        };
        line.layout(paint, directions, tab_stops, ellipsis);
        line
    }

    fn layout(
        &mut self,
        paint: &TextPaint,
        directions: &Directions,
        tab_stops: &TabStops,
        ellipsis: Range<usize>,
    ) {
        let len = self.line_text.len();
        let ellipsis = ellipsis.start.min(len)..ellipsis.end.min(len);
        let mut h = 0.0;
        let mut bounds: SmallVec<[usize; 8]> = SmallVec::new();

        for run in directions.runs(len) {
            let run_start = run.start.min(len);
            let run_end = (run.start + run.len).min(len);
            if run_start >= run_end {
                continue;
            }
            bounds.clear();
            bounds.push(run_start);
            let mut pos = run_start;
            while pos < run_end {
                let next = self.next_piece_boundary(pos, run_end, &ellipsis);
                bounds.push(next);
                pos = next;
            }

            let rtl = run.is_rtl();
            let count = bounds.len() - 1;
            for k in 0..count {
                let idx = if rtl { count - 1 - k } else { k };
                let piece = bounds[idx]..bounds[idx + 1];
                if !ellipsis.is_empty() && piece.start >= ellipsis.start && piece.end <= ellipsis.end {
                    if piece.start == ellipsis.start {
                        let paint = self.working_paint(paint, piece.clone());
                        let mut advances = vec![0.0; ELLIPSIS.len()];
                        let width = paint.measure(ELLIPSIS, false, &mut advances).advance;
                        self.push(&mut h, piece, width, false, PieceKind::Ellipsis { paint });
                    }
                    continue;
                }
                if &self.line_text[piece.clone()] == "\t" {
                    let width = tab_stops.next_tab(h) - h;
                    self.push(&mut h, piece, width, rtl, PieceKind::Tab);
                    continue;
                }
                self.push_styled(paint, &mut h, piece, rtl);
            }
        }
        self.width = h;
    }

    /// The end of the piece starting at `pos`, at most `limit`.
    fn next_piece_boundary(&self, pos: usize, limit: usize, ellipsis: &Range<usize>) -> usize {
        let bytes = self.line_text.as_bytes();
        if bytes[pos] == b'\t' {
            return pos + 1;
        }
        let mut next = self.text.next_span_transition(
            self.start + pos,
            self.start + limit,
            &|span| span.affects_drawing(),
        ) - self.start;
        if let Some(tab) = bytes[pos..next].iter().position(|&b| b == b'\t') {
            next = pos + tab;
        }
        for edge in [ellipsis.start, ellipsis.end] {
            if pos < edge && edge < next {
                next = edge;
            }
        }
        next
    }

    fn spans_over(&self, piece: Range<usize>) -> Vec<Rc<dyn TextSpan>> {
        let range = self.start + piece.start..self.start + piece.end;
        self.text
            .get_spans(range, &|span| span.affects_drawing())
            .into_iter()
            .filter(|span| {
                self.text
                    .span_range(span.as_ref())
                    .is_some_and(|r| r.start != r.end)
            })
            .collect()
    }

    fn working_paint(&self, paint: &TextPaint, piece: Range<usize>) -> TextPaint {
        let mut working = paint.clone();
        for span in self.spans_over(piece) {
            if let Some(style) = span.metric_affecting() {
                style.update_measure_state(&mut working);
            }
            if let Some(style) = span.character_style() {
                style.update_draw_state(&mut working);
            }
        }
        working
    }

    fn push_styled(&mut self, paint: &TextPaint, h: &mut f32, piece: Range<usize>, rtl: bool) {
        let spans = self.spans_over(piece.clone());
        let mut working = paint.clone();
        let mut replacement = None;
        for span in &spans {
            if span.replacement().is_some() {
                replacement = Some(span.clone());
            } else {
                if let Some(style) = span.metric_affecting() {
                    style.update_measure_state(&mut working);
                }
                if let Some(style) = span.character_style() {
                    style.update_draw_state(&mut working);
                }
            }
        }

        if let Some(span) = replacement {
            let line_range = self.start..self.start + self.line_text.len();
            let Some(full) = self.text.span_range(span.as_ref()) else {
                return;
            };
            let range = full.start.max(line_range.start)..full.end.min(line_range.end);
            if self.start + piece.start != range.start {
                // Only the first piece of a replacement is drawn.
                self.push(h, piece, 0.0, rtl, PieceKind::Tab);
                return;
            }
            let width = span
                .replacement()
                .map_or(0.0, |r| r.size(&working, self.text, range.clone(), None));
            self.push(
                h,
                piece,
                width,
                rtl,
                PieceKind::Replacement {
                    span,
                    paint: working,
                    range,
                },
            );
            return;
        }

        let mut advances = vec![0.0; piece.len()];
        let width = working
            .measure(&self.line_text[piece.clone()], rtl, &mut advances)
            .advance;
        self.push(
            h,
            piece,
            width,
            rtl,
            PieceKind::Text {
                paint: working,
                advances,
            },
        );
    }

    fn push(&mut self, h: &mut f32, range: Range<usize>, width: f32, rtl: bool, kind: PieceKind) {
        self.pieces.push(Piece {
            range,
            x: *h,
            width,
            rtl,
            kind,
        });
        *h += width;
    }

    /// The total advance of the line.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Returns the advance of the line, widening `metrics` by every piece when provided.
    pub fn metrics(&self, metrics: Option<&mut FontMetrics>) -> f32 {
        if let Some(fm) = metrics {
            for piece in &self.pieces {
                match &piece.kind {
                    PieceKind::Text { paint, .. } | PieceKind::Ellipsis { paint } => {
                        fm.extend(&paint.font_metrics());
                    }
                    PieceKind::Replacement { span, paint, range } => {
                        if let Some(r) = span.replacement() {
                            r.size(paint, self.text, range.clone(), Some(fm));
                        }
                    }
                    PieceKind::Tab => {}
                }
            }
        }
        self.width
    }

    /// Returns the distance from the left edge of the line to the caret before `offset`.
    ///
    /// `offset` is absolute. Offsets at or past the end of the line map to the trailing edge
    /// of the paragraph direction.
    pub fn measure(&self, offset: usize) -> f32 {
        let rel = offset.saturating_sub(self.start);
        if rel >= self.line_text.len() {
            return if self.direction.is_rtl() { 0.0 } else { self.width };
        }
        for piece in &self.pieces {
            if !piece.range.contains(&rel) {
                continue;
            }
            return match &piece.kind {
                PieceKind::Text { advances, .. } => {
                    let before: f32 = advances[..rel - piece.range.start].iter().sum();
                    if piece.rtl {
                        piece.x + piece.width - before
                    } else {
                        piece.x + before
                    }
                }
                PieceKind::Tab | PieceKind::Replacement { .. } | PieceKind::Ellipsis { .. } => {
                    if piece.rtl {
                        piece.x + piece.width
                    } else {
                        piece.x
                    }
                }
            };
        }
        // Inside an elided range.
        self.pieces
            .iter()
            .find(|piece| matches!(piece.kind, PieceKind::Ellipsis { .. }))
            .map_or(0.0, |piece| piece.x)
    }

    /// Draws the line with its left edge at `x`.
    pub fn draw(&self, canvas: &mut dyn Canvas, x: f32, top: i32, baseline: i32, bottom: i32) {
        for piece in &self.pieces {
            let left = x + piece.x;
            match &piece.kind {
                PieceKind::Text { paint, .. } => {
                    let text = &self.line_text[piece.range.clone()];
                    draw_styled_run(canvas, text, left, piece.width, top, baseline, bottom, piece.rtl, paint);
                }
                PieceKind::Ellipsis { paint } => {
                    draw_styled_run(canvas, ELLIPSIS, left, piece.width, top, baseline, bottom, false, paint);
                }
                PieceKind::Replacement { span, paint, range } => {
                    if let Some(r) = span.replacement() {
                        r.draw(canvas, self.text, range.clone(), left, top, baseline, bottom, paint);
                    }
                }
                PieceKind::Tab => {}
            }
        }
    }
}

impl core::fmt::Debug for TextLine<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TextLine")
            .field("start", &self.start)
            .field("line_text", &self.line_text)
            .field("direction", &self.direction)
            .field("pieces", &self.pieces.len())
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

fn draw_styled_run(
    canvas: &mut dyn Canvas,
    text: &str,
    x: f32,
    width: f32,
    top: i32,
    baseline: i32,
    bottom: i32,
    rtl: bool,
    paint: &TextPaint,
) {
    if paint.background != 0 {
        canvas.draw_rect(Rect::new(x, top as f32, x + width, bottom as f32), paint.background);
    }
    let baseline = (baseline + paint.baseline_shift) as f32;
    canvas.draw_text_run(text, x, baseline, rtl, paint);
    if paint.underline || paint.strikethrough {
        let deco = paint.decoration_metrics();
        if paint.underline {
            let y = baseline + deco.underline_offset;
            canvas.draw_rect(Rect::new(x, y, x + width, y + deco.underline_thickness), paint.color);
        }
        if paint.strikethrough {
            let y = baseline + deco.strikethrough_offset;
            canvas.draw_rect(
                Rect::new(x, y, x + width, y + deco.strikethrough_thickness),
                paint.color,
            );
        }
    }
}
