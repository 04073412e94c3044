// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visual run decomposition of a line.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ops::Range;

use text_primitives::Direction;

/// A maximal sub-range of a line at a single embedding level.
///
/// Offsets are relative to the start of the line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BidiRun {
    /// Offset of the first byte of the run.
    pub start: usize,
    /// Length of the run in bytes.
    pub len: usize,
    /// Resolved embedding level.
    pub level: u8,
}

impl BidiRun {
    /// The byte range covered by this run.
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }

    /// Returns `true` if the run is laid out right to left.
    pub fn is_rtl(&self) -> bool {
        self.level & 1 != 0
    }
}

/// The runs of a line in visual order, left to right on screen.
///
/// The two uniform cases carry no allocation. Every other line stores its runs explicitly and
/// the runs always partition the line exactly once.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Directions {
    /// The whole line is a single left-to-right run at level 0.
    #[default]
    AllLeftToRight,
    /// The whole line is a single right-to-left run at level 1.
    AllRightToLeft,
    /// Explicit runs in visual order.
    Runs(Arc<[BidiRun]>),
}

impl Directions {
    /// Builds the visual runs of a line from its per-byte embedding levels.
    ///
    /// `levels` and `text` describe the same line and must have the same length. A trailing
    /// stretch of spaces and tabs whose level is counter-directional to `base` becomes a run of
    /// its own at the base level, so that it stays at the trailing edge of the line.
    pub fn from_levels(levels: &[u8], text: &str, base: Direction) -> Self {
        let len = levels.len().min(text.len());
        if len == 0 {
            return Self::AllLeftToRight;
        }
        let base_level = base.level();
        let bytes = text.as_bytes();

        let mut run_count = 1;
        let mut cur_level = levels[0];
        for &level in &levels[1..len] {
            if level != cur_level {
                cur_level = level;
                run_count += 1;
            }
        }

        let mut visible_len = len;
        if (cur_level & 1) != (base_level & 1) {
            while visible_len > 0 {
                let b = bytes[visible_len - 1];
                if b == b'\n' {
                    visible_len -= 1;
                    break;
                }
                if b != b' ' && b != b'\t' {
                    break;
                }
                visible_len -= 1;
            }
            if visible_len != len {
                run_count += 1;
            }
        }

        if run_count == 1 && levels[0] == base_level {
            return if base_level & 1 != 0 {
                Self::AllRightToLeft
            } else {
                Self::AllLeftToRight
            };
        }

        let mut runs = Vec::with_capacity(run_count);
        let mut run_start = 0;
        for i in 1..visible_len {
            if levels[i] != levels[run_start] {
                runs.push(BidiRun {
                    start: run_start,
                    len: i - run_start,
                    level: levels[run_start],
                });
                run_start = i;
            }
        }
        if visible_len > 0 {
            runs.push(BidiRun {
                start: run_start,
                len: visible_len - run_start,
                level: levels[run_start],
            });
        }
        if visible_len < len {
            runs.push(BidiRun {
                start: visible_len,
                len: len - visible_len,
                level: base_level,
            });
        }
        if runs.len() == 1 && runs[0].level == base_level {
            return if base_level & 1 != 0 {
                Self::AllRightToLeft
            } else {
                Self::AllLeftToRight
            };
        }

        reorder_runs(&mut runs);
        Self::Runs(runs.into())
    }

    /// Returns `true` for the uniform left-to-right line.
    pub fn is_all_left_to_right(&self) -> bool {
        matches!(self, Self::AllLeftToRight)
    }

    /// Returns `true` for the uniform right-to-left line.
    pub fn is_all_right_to_left(&self) -> bool {
        matches!(self, Self::AllRightToLeft)
    }

    /// The number of visual runs.
    pub fn run_count(&self) -> usize {
        match self {
            Self::AllLeftToRight | Self::AllRightToLeft => 1,
            Self::Runs(runs) => runs.len(),
        }
    }

    /// Iterates the runs in visual order for a line of `line_len` bytes.
    pub fn runs(&self, line_len: usize) -> RunIter<'_> {
        match self {
            Self::AllLeftToRight => RunIter::uniform(line_len, 0),
            Self::AllRightToLeft => RunIter::uniform(line_len, 1),
            Self::Runs(runs) => RunIter {
                single: None,
                rest: runs.iter(),
            },
        }
    }
}

/// Iterator over the runs of [`Directions`], in visual order.
#[derive(Clone, Debug)]
pub struct RunIter<'a> {
    single: Option<BidiRun>,
    rest: core::slice::Iter<'a, BidiRun>,
}

impl RunIter<'_> {
    fn uniform(len: usize, level: u8) -> Self {
        Self {
            single: Some(BidiRun {
                start: 0,
                len,
                level,
            }),
            rest: [].iter(),
        }
    }
}

impl Iterator for RunIter<'_> {
    type Item = BidiRun;

    fn next(&mut self) -> Option<Self::Item> {
        self.single.take().or_else(|| self.rest.next().copied())
    }
}

/// Reorder runs from logical to visual order according to their bidi levels.
fn reorder_runs(runs: &mut [BidiRun]) {
    let run_count = runs.len();

    // Find the max level and the min *odd* level
    let mut max_level = 0;
    let mut lowest_odd_level = u8::MAX;
    for run in runs.iter() {
        let level = run.level;
        if level > max_level {
            max_level = level;
        }
        if level & 1 != 0 && level < lowest_odd_level {
            lowest_odd_level = level;
        }
    }
    if lowest_odd_level > max_level {
        return;
    }

    for level in (lowest_odd_level..=max_level).rev() {
        let mut i = 0;
        while i < run_count {
            if runs[i].level >= level {
                let mut end = i + 1;
                while end < run_count && runs[end].level >= level {
                    end += 1;
                }
                runs[i..end].reverse();
                i = end;
            }
            i += 1;
        }
    }
}
