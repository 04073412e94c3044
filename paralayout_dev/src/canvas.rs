// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use paralayout::{Canvas, Rect, TextPaint};

/// One call made on a [`RecordingCanvas`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// A text run.
    Text {
        /// The characters of the run.
        text: String,
        /// Left edge of the run.
        x: f32,
        /// Baseline of the run.
        baseline: f32,
        /// The run was drawn right to left.
        rtl: bool,
        /// Font size of the paint.
        size: f32,
        /// Foreground color of the paint.
        color: u32,
    },
    /// A filled rectangle.
    Rect {
        /// The filled area.
        rect: Rect,
        /// The fill color.
        color: u32,
    },
}

/// A canvas that records draw calls instead of rasterizing them.
#[derive(Clone, Debug, Default)]
pub struct RecordingCanvas {
    ops: Vec<DrawOp>,
    visible: Option<Rect>,
}

impl RecordingCanvas {
    /// A canvas on which everything is visible.
    pub fn new() -> Self {
        Self::default()
    }

    /// A canvas that only shows `visible`.
    pub fn with_visible(visible: Rect) -> Self {
        Self {
            ops: Vec::new(),
            visible: Some(visible),
        }
    }

    /// Every recorded call, in order.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// The text of every recorded run, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                DrawOp::Rect { .. } => None,
            })
            .collect()
    }

    /// Every recorded rectangle, in order.
    pub fn rects(&self) -> Vec<(Rect, u32)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Rect { rect, color } => Some((*rect, *color)),
                DrawOp::Text { .. } => None,
            })
            .collect()
    }

    /// Forgets every recorded call.
    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl Canvas for RecordingCanvas {
    fn draw_text_run(&mut self, text: &str, x: f32, baseline: f32, rtl: bool, paint: &TextPaint) {
        self.ops.push(DrawOp::Text {
            text: text.to_owned(),
            x,
            baseline,
            rtl,
            size: paint.size,
            color: paint.color,
        });
    }

    fn draw_rect(&mut self, rect: Rect, color: u32) {
        self.ops.push(DrawOp::Rect { rect, color });
    }

    fn quick_reject(&self, rect: Rect) -> bool {
        self.visible.is_some_and(|visible| {
            rect.bottom <= visible.top
                || rect.top >= visible.bottom
                || rect.right <= visible.left
                || rect.left >= visible.right
        })
    }
}
