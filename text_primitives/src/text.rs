// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::Direction;

/// Horizontal alignment of the lines of a paragraph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Alignment {
    /// Align to the paragraph's start edge: left for LTR paragraphs, right for
    /// RTL paragraphs.
    #[default]
    Normal,
    /// Align to the paragraph's end edge.
    Opposite,
    /// Center each line within the layout width.
    Center,
    /// Always align to the left edge.
    Left,
    /// Always align to the right edge.
    Right,
}

impl Alignment {
    /// Resolves `Left`/`Right` into `Normal`/`Opposite` for a paragraph
    /// direction, and `Normal`/`Opposite` into `Left`/`Right`.
    ///
    /// `Center` is unchanged.
    pub const fn resolve(self, direction: Direction) -> Self {
        match (self, direction) {
            (Self::Normal, Direction::Ltr) | (Self::Opposite, Direction::Rtl) => Self::Left,
            (Self::Normal, Direction::Rtl) | (Self::Opposite, Direction::Ltr) => Self::Right,
            (Self::Left, Direction::Ltr) | (Self::Right, Direction::Rtl) => Self::Normal,
            (Self::Left, Direction::Rtl) | (Self::Right, Direction::Ltr) => Self::Opposite,
            (Self::Center, _) => Self::Center,
        }
    }
}

/// Where the ellipsis goes when text is truncated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TruncateAt {
    /// Drop text from the start of the line. Single-line only.
    Start,
    /// Drop text from the middle of the line. Single-line only.
    Middle,
    /// Drop text from the end of the line.
    End,
}
