// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style state used for measuring and drawing text.

use alloc::sync::Arc;
use core::fmt;

use text_primitives::{FontStyle, FontWeight};

/// Vertical font metrics in whole pixels.
///
/// Values are offsets from the baseline, with positive values pointing down. `ascent` and
/// `top` are therefore negative for ordinary fonts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FontMetrics {
    /// Highest extent of any glyph in the font.
    pub top: i32,
    /// Recommended distance above the baseline.
    pub ascent: i32,
    /// Recommended distance below the baseline.
    pub descent: i32,
    /// Lowest extent of any glyph in the font.
    pub bottom: i32,
    /// Recommended extra space between lines.
    pub leading: i32,
}

impl FontMetrics {
    /// Widens these metrics so that they also cover `other`.
    pub fn extend(&mut self, other: &Self) {
        self.top = self.top.min(other.top);
        self.ascent = self.ascent.min(other.ascent);
        self.descent = self.descent.max(other.descent);
        self.bottom = self.bottom.max(other.bottom);
    }
}

/// The result of measuring a single run of text.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunMetrics {
    /// Total advance of the run.
    pub advance: f32,
    /// Most negative ascent over the glyphs actually used, fallback fonts included.
    pub ascent: i32,
    /// Largest descent over the glyphs actually used, fallback fonts included.
    pub descent: i32,
}

/// Position and thickness of underline and strike-through decorations.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DecorationMetrics {
    /// Offset of the underline from the baseline.
    pub underline_offset: f32,
    /// Thickness of the underline.
    pub underline_thickness: f32,
    /// Offset of the strike-through from the baseline.
    pub strikethrough_offset: f32,
    /// Thickness of the strike-through.
    pub strikethrough_thickness: f32,
}

/// The shaping and measuring collaborator.
///
/// Implementations turn a run of text in a single direction and style into advances.
/// `advances` has one slot per byte of `text`; the advance of each cluster is written to the
/// slot of its first byte and all other slots are set to zero.
pub trait TextShaper {
    /// Vertical metrics of the primary font selected by `paint`.
    fn font_metrics(&self, paint: &TextPaint) -> FontMetrics;

    /// Measures `text` as one run, filling `advances` with per-byte advances.
    fn measure(&self, text: &str, rtl: bool, paint: &TextPaint, advances: &mut [f32])
    -> RunMetrics;

    /// Metrics for text decorations drawn with `paint`.
    fn decoration_metrics(&self, paint: &TextPaint) -> DecorationMetrics {
        let thickness = (paint.size / 18.0).max(1.0);
        DecorationMetrics {
            underline_offset: paint.size / 9.0,
            underline_thickness: thickness,
            strikethrough_offset: -paint.size * 0.3,
            strikethrough_thickness: thickness,
        }
    }
}

/// The style state that text is measured and drawn with.
///
/// A paint carries the shaper that measures text with it, so that spans can derive a modified
/// paint without knowing where fonts come from.
#[derive(Clone)]
pub struct TextPaint {
    shaper: Arc<dyn TextShaper>,
    /// Font size in pixels.
    pub size: f32,
    /// Font weight.
    pub weight: FontWeight,
    /// Font style.
    pub style: FontStyle,
    /// Foreground color as `0xAARRGGBB`.
    pub color: u32,
    /// Background color as `0xAARRGGBB`. Zero means no background.
    pub background: u32,
    /// Draw an underline.
    pub underline: bool,
    /// Draw a strike-through.
    pub strikethrough: bool,
    /// Vertical shift applied to the baseline when drawing.
    pub baseline_shift: i32,
}

impl TextPaint {
    /// Creates a paint measuring with `shaper` at `size` pixels.
    pub fn new(shaper: Arc<dyn TextShaper>, size: f32) -> Self {
        Self {
            shaper,
            size,
            weight: FontWeight::NORMAL,
            style: FontStyle::Normal,
            color: 0xFF00_0000,
            background: 0,
            underline: false,
            strikethrough: false,
            baseline_shift: 0,
        }
    }

    /// Copies every attribute of `other` into this paint.
    pub fn set(&mut self, other: &Self) {
        self.clone_from(other);
    }

    /// The shaper this paint measures with.
    pub fn shaper(&self) -> &Arc<dyn TextShaper> {
        &self.shaper
    }

    /// Vertical metrics of the font this paint selects.
    pub fn font_metrics(&self) -> FontMetrics {
        self.shaper.font_metrics(self)
    }

    /// Measures `text` as a single run, filling per-byte `advances`.
    pub fn measure(&self, text: &str, rtl: bool, advances: &mut [f32]) -> RunMetrics {
        self.shaper.measure(text, rtl, self, advances)
    }

    /// Returns the advance of `text` as a single left-to-right run.
    pub fn measure_text(&self, text: &str) -> f32 {
        let mut advances = alloc::vec![0.0; text.len()];
        self.measure(text, false, &mut advances).advance
    }

    /// Decoration metrics for this paint.
    pub fn decoration_metrics(&self) -> DecorationMetrics {
        self.shaper.decoration_metrics(self)
    }
}

impl fmt::Debug for TextPaint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextPaint")
            .field("size", &self.size)
            .field("weight", &self.weight)
            .field("style", &self.style)
            .field("color", &format_args!("{:#010x}", self.color))
            .field("background", &format_args!("{:#010x}", self.background))
            .field("underline", &self.underline)
            .field("strikethrough", &self.strikethrough)
            .field("baseline_shift", &self.baseline_shift)
            .finish_non_exhaustive()
    }
}
