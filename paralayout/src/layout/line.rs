// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use text_primitives::Direction;

use crate::Directions;

/// One row of a line table.
///
/// A table with `n` lines holds `n + 1` rows. The last row only carries the end offset of
/// the text and the total height in `start` and `top`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineEntry {
    /// Offset of the first character of the line.
    pub start: usize,
    /// Distance from the top of the layout to the top of the line.
    pub top: i32,
    /// Distance from the baseline to the bottom of the line, extra leading included.
    pub descent: i32,
    /// Extra leading added below the line by line spacing.
    pub extra: i32,
    /// Direction of the paragraph containing the line.
    pub direction: Direction,
    /// The line contains a tab.
    pub has_tab: bool,
    /// Start of the elided range, relative to the line start.
    pub ellipsis_start: usize,
    /// Length of the elided range in bytes.
    pub ellipsis_count: usize,
    /// The visual runs of the line.
    pub directions: Directions,
}

impl LineEntry {
    /// The closing row of a table.
    pub(crate) fn sentinel(start: usize, top: i32) -> Self {
        Self {
            start,
            top,
            ..Self::default()
        }
    }
}
