// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawing collaborator.

use crate::TextPaint;

/// An axis aligned rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub left: f32,
    /// Top edge.
    pub top: f32,
    /// Right edge.
    pub right: f32,
    /// Bottom edge.
    pub bottom: f32,
}

impl Rect {
    /// Creates a rectangle from its edges.
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Returns `true` if the rectangle has no area.
    pub fn is_empty(&self) -> bool {
        !(self.left < self.right && self.top < self.bottom)
    }
}

/// A surface that layouts draw onto.
pub trait Canvas {
    /// Draws `text` as one shaped run with its leftmost edge at `x`.
    fn draw_text_run(&mut self, text: &str, x: f32, baseline: f32, rtl: bool, paint: &TextPaint);

    /// Fills `rect` with `color`, given as `0xAARRGGBB`.
    fn draw_rect(&mut self, rect: Rect, color: u32);

    /// Returns `true` if nothing drawn inside `rect` could be visible.
    fn quick_reject(&self, rect: Rect) -> bool {
        let _ = rect;
        false
    }
}
