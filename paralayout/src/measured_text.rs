// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;
use core::ops::Range;

use crate::FontMetrics;

/// What a measured run holds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RunKind {
    /// Text shaped in one style and direction.
    Style {
        /// The run is right to left.
        rtl: bool,
        /// Ascent reported by the shaper for the run.
        ascent: i32,
        /// Descent reported by the shaper for the run.
        descent: i32,
    },
    /// An object drawn by a replacement span. The run never breaks internally.
    Replacement {
        /// The width of the object.
        width: f32,
    },
}

/// A run of a measured paragraph.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasuredRun {
    /// Byte range relative to the paragraph start.
    pub range: Range<usize>,
    /// What the run holds.
    pub kind: RunKind,
}

impl MeasuredRun {
    /// Returns `true` if a line may break inside this run.
    pub fn can_break(&self) -> bool {
        matches!(self.kind, RunKind::Style { .. })
    }
}

/// Per-byte advances and runs of one paragraph.
///
/// The advance of a cluster sits on its first byte. Every other byte carries zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeasuredText {
    advances: Vec<f32>,
    runs: Vec<MeasuredRun>,
}

impl MeasuredText {
    pub(crate) fn reset(&mut self, len: usize) {
        self.advances.clear();
        self.advances.resize(len, 0.0);
        self.runs.clear();
    }

    pub(crate) fn advances_mut(&mut self, range: Range<usize>) -> &mut [f32] {
        &mut self.advances[range]
    }

    pub(crate) fn push_run(&mut self, run: MeasuredRun) {
        self.runs.push(run);
    }

    pub(crate) fn release(&mut self) {
        self.advances = Vec::new();
        self.runs = Vec::new();
    }

    /// The per-byte advances.
    pub fn advances(&self) -> &[f32] {
        &self.advances
    }

    /// The runs, in logical order.
    pub fn runs(&self) -> &[MeasuredRun] {
        &self.runs
    }

    /// The advance stored on byte `offset`.
    pub fn advance(&self, offset: usize) -> f32 {
        self.advances.get(offset).copied().unwrap_or(0.0)
    }

    /// The summed advance over `range`.
    pub fn advance_range(&self, range: Range<usize>) -> f32 {
        let end = range.end.min(self.advances.len());
        let start = range.start.min(end);
        self.advances[start..end].iter().sum()
    }

    /// Returns the index of the run containing `offset`.
    pub fn search_run(&self, offset: usize) -> Option<usize> {
        let idx = self.runs.partition_point(|run| run.range.end <= offset);
        (idx < self.runs.len() && self.runs[idx].range.start <= offset).then_some(idx)
    }

    /// Widens the ascent and descent of `metrics` by every text run overlapping `range`.
    pub fn extent(&self, range: Range<usize>, metrics: &mut FontMetrics) {
        if range.is_empty() {
            return;
        }
        let first = self.runs.partition_point(|run| run.range.end <= range.start);
        for run in &self.runs[first..] {
            if run.range.start >= range.end {
                break;
            }
            if let RunKind::Style {
                ascent, descent, ..
            } = run.kind
            {
                metrics.ascent = metrics.ascent.min(ascent);
                metrics.descent = metrics.descent.max(descent);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::{MeasuredRun, MeasuredText, RunKind};
    use crate::FontMetrics;

    fn sample() -> MeasuredText {
        let mut mt = MeasuredText::default();
        mt.reset(6);
        mt.advances_mut(0..6)
            .copy_from_slice(&[10.0, 10.0, 10.0, 24.0, 0.0, 0.0]);
        mt.push_run(MeasuredRun {
            range: 0..3,
            kind: RunKind::Style {
                rtl: false,
                ascent: -8,
                descent: 2,
            },
        });
        mt.push_run(MeasuredRun {
            range: 3..6,
            kind: RunKind::Replacement { width: 24.0 },
        });
        mt
    }

    #[test]
    fn runs_are_found_by_offset() {
        let mt = sample();
        assert_eq!(mt.search_run(0), Some(0));
        assert_eq!(mt.search_run(3), Some(1));
        assert_eq!(mt.search_run(6), None);
        assert!(!mt.runs()[1].can_break(), "replacements never break");
    }

    #[test]
    fn extent_ignores_replacements() {
        let mt = sample();
        let mut fm = FontMetrics::default();
        mt.extent(3..6, &mut fm);
        assert_eq!((fm.ascent, fm.descent), (0, 0));
        mt.extent(2..4, &mut fm);
        assert_eq!((fm.ascent, fm.descent), (-8, 2));
        assert_eq!(mt.advance_range(0..6), 54.0);
        assert_eq!(mt.advances(), &vec![10.0, 10.0, 10.0, 24.0, 0.0, 0.0][..]);
    }
}
