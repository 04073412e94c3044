// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal span styles covering each capability of [`TextSpan`].

use std::ops::Range;

use paralayout::{
    Alignment, Canvas, CharacterStyle, FontMetrics, LeadingMarginSpan, LineBackgroundSpan,
    MetricAffectingSpan, Rect, ReplacementSpan, StyledText, TextPaint, TextSpan,
};

/// Scales the font size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizeSpan(pub f32);

impl MetricAffectingSpan for SizeSpan {
    fn update_measure_state(&self, paint: &mut TextPaint) {
        paint.size *= self.0;
    }
}

impl TextSpan for SizeSpan {
    fn metric_affecting(&self) -> Option<&dyn MetricAffectingSpan> {
        Some(self)
    }
}

/// Paints a background behind the covered characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackgroundColor(pub u32);

impl CharacterStyle for BackgroundColor {
    fn update_draw_state(&self, paint: &mut TextPaint) {
        paint.background = self.0;
    }
}

impl TextSpan for BackgroundColor {
    fn character_style(&self) -> Option<&dyn CharacterStyle> {
        Some(self)
    }
}

/// Underlines the covered characters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Underline;

impl CharacterStyle for Underline {
    fn update_draw_state(&self, paint: &mut TextPaint) {
        paint.underline = true;
    }
}

impl TextSpan for Underline {
    fn character_style(&self) -> Option<&dyn CharacterStyle> {
        Some(self)
    }
}

/// A box drawn in place of the covered characters.
///
/// A box taller than the font grows its line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InlineBox {
    /// Width of the box.
    pub width: f32,
    /// Distance from the baseline to the top of the box, as a negative number.
    pub ascent: i32,
    /// Distance from the baseline to the bottom of the box.
    pub descent: i32,
    /// Fill color of the box.
    pub color: u32,
}

impl ReplacementSpan for InlineBox {
    fn size(
        &self,
        _paint: &TextPaint,
        _text: &StyledText<'_>,
        _range: Range<usize>,
        metrics: Option<&mut FontMetrics>,
    ) -> f32 {
        if let Some(fm) = metrics {
            fm.ascent = fm.ascent.min(self.ascent);
            fm.top = fm.top.min(self.ascent);
            fm.descent = fm.descent.max(self.descent);
            fm.bottom = fm.bottom.max(self.descent);
        }
        self.width
    }

    fn draw(
        &self,
        canvas: &mut dyn Canvas,
        _text: &StyledText<'_>,
        _range: Range<usize>,
        x: f32,
        _top: i32,
        baseline: i32,
        _bottom: i32,
        _paint: &TextPaint,
    ) {
        let rect = Rect::new(
            x,
            (baseline + self.ascent) as f32,
            x + self.width,
            (baseline + self.descent) as f32,
        );
        canvas.draw_rect(rect, self.color);
    }
}

impl TextSpan for InlineBox {
    fn replacement(&self) -> Option<&dyn ReplacementSpan> {
        Some(self)
    }
}

/// Indents paragraphs, with a distinct indent for their first lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Indent {
    /// Indent of the first lines.
    pub first: i32,
    /// Indent of the remaining lines.
    pub rest: i32,
    /// How many lines use the first indent.
    pub first_lines: usize,
}

impl LeadingMarginSpan for Indent {
    fn leading_margin(&self, first: bool) -> i32 {
        if first { self.first } else { self.rest }
    }

    fn leading_margin_line_count(&self) -> usize {
        self.first_lines
    }
}

impl TextSpan for Indent {
    fn leading_margin(&self) -> Option<&dyn LeadingMarginSpan> {
        Some(self)
    }
}

/// Adds a tab stop to the paragraphs it covers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TabStop(pub f32);

impl TextSpan for TabStop {
    fn tab_stop(&self) -> Option<f32> {
        Some(self.0)
    }
}

/// Overrides the alignment of the paragraphs it covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlignSpan(pub Alignment);

impl TextSpan for AlignSpan {
    fn alignment(&self) -> Option<Alignment> {
        Some(self.0)
    }
}

/// Fills the full width of every line it covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineBackground(pub u32);

impl LineBackgroundSpan for LineBackground {
    fn draw_background(
        &self,
        canvas: &mut dyn Canvas,
        _paint: &TextPaint,
        left: i32,
        right: i32,
        top: i32,
        _baseline: i32,
        bottom: i32,
        _text: &StyledText<'_>,
        _line_range: Range<usize>,
        _line: usize,
    ) {
        let rect = Rect::new(left as f32, top as f32, right as f32, bottom as f32);
        canvas.draw_rect(rect, self.0);
    }
}

impl TextSpan for LineBackground {
    fn line_background(&self) -> Option<&dyn LineBackgroundSpan> {
        Some(self)
    }
}
