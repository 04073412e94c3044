// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Styles that can be attached to text.
//!
//! Every span attached to layout text is a [`TextSpan`]. A span takes part in layout through
//! the capability accessors it overrides, so one span object can, for example, both change the
//! font size and paint a line background.

use core::ops::Range;

use spannable::Spanned;
use text_primitives::{Alignment, Direction};

use crate::{Canvas, FontMetrics, TextPaint};

/// Styled text as seen by the layout engine.
pub type StyledText<'a> = dyn Spanned<dyn TextSpan> + 'a;

/// A style attached to a range of layout text.
pub trait TextSpan {
    /// This span changes how text is measured.
    fn metric_affecting(&self) -> Option<&dyn MetricAffectingSpan> {
        None
    }

    /// This span changes how text is drawn, but not its size.
    fn character_style(&self) -> Option<&dyn CharacterStyle> {
        None
    }

    /// This span replaces its text with a custom drawn object.
    fn replacement(&self) -> Option<&dyn ReplacementSpan> {
        None
    }

    /// This span indents the paragraphs it covers.
    fn leading_margin(&self) -> Option<&dyn LeadingMarginSpan> {
        None
    }

    /// The explicit tab stop this span adds to its paragraphs, in pixels.
    fn tab_stop(&self) -> Option<f32> {
        None
    }

    /// This span paints behind the lines it covers.
    fn line_background(&self) -> Option<&dyn LineBackgroundSpan> {
        None
    }

    /// The alignment this span imposes on its paragraphs.
    fn alignment(&self) -> Option<Alignment> {
        None
    }

    /// Returns `true` if attaching or detaching this span requires a reflow.
    fn updates_layout(&self) -> bool {
        self.metric_affecting().is_some() || self.replacement().is_some()
    }

    /// Returns `true` if this span matters to measurement.
    fn affects_metrics(&self) -> bool {
        self.metric_affecting().is_some() || self.replacement().is_some()
    }

    /// Returns `true` if this span matters to drawing a text run.
    fn affects_drawing(&self) -> bool {
        self.affects_metrics() || self.character_style().is_some()
    }
}

/// A style that changes the size of text.
pub trait MetricAffectingSpan {
    /// Applies this style to a paint used for measuring.
    fn update_measure_state(&self, paint: &mut TextPaint);
}

/// A style that changes the appearance of text.
pub trait CharacterStyle {
    /// Applies this style to a paint used for drawing.
    fn update_draw_state(&self, paint: &mut TextPaint);
}

/// An object drawn in place of the text it covers, such as an inline image.
pub trait ReplacementSpan {
    /// The width of the object. Implementations may widen `metrics` to request a taller line.
    fn size(
        &self,
        paint: &TextPaint,
        text: &StyledText<'_>,
        range: Range<usize>,
        metrics: Option<&mut FontMetrics>,
    ) -> f32;

    /// Draws the object with its left edge at `x`.
    fn draw(
        &self,
        canvas: &mut dyn Canvas,
        text: &StyledText<'_>,
        range: Range<usize>,
        x: f32,
        top: i32,
        baseline: i32,
        bottom: i32,
        paint: &TextPaint,
    );
}

/// A paragraph style that reserves space on the leading side of lines.
pub trait LeadingMarginSpan {
    /// The margin for the first lines of a paragraph when `first` is set, else for the rest.
    fn leading_margin(&self, first: bool) -> i32;

    /// How many lines, counted from the start of the span, use the first-line margin.
    fn leading_margin_line_count(&self) -> usize {
        1
    }

    /// Draws into the margin. `x` is the edge of the margin on the paragraph's leading side.
    fn draw_leading_margin(
        &self,
        canvas: &mut dyn Canvas,
        paint: &TextPaint,
        x: i32,
        dir: Direction,
        top: i32,
        baseline: i32,
        bottom: i32,
        text: &StyledText<'_>,
        line: Range<usize>,
        first: bool,
    ) {
        let _ = (canvas, paint, x, dir, top, baseline, bottom, text, line, first);
    }
}

/// A paragraph style that paints behind each line it covers.
pub trait LineBackgroundSpan {
    /// Paints the background of one line.
    fn draw_background(
        &self,
        canvas: &mut dyn Canvas,
        paint: &TextPaint,
        left: i32,
        right: i32,
        top: i32,
        baseline: i32,
        bottom: i32,
        text: &StyledText<'_>,
        line_range: Range<usize>,
        line: usize,
    );
}
