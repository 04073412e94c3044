// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reusable scratch state for layout.

use alloc::vec::Vec;

use crate::{LineBreaker, MeasuredParagraph};

/// The number of measured paragraphs kept for reuse.
const POOL_SIZE: usize = 4;

/// Scratch buffers shared by successive layouts.
///
/// Building a layout needs a line breaker and one measured paragraph per paragraph. Keeping a
/// context around avoids reallocating them. A context is not tied to any text and can be used
/// for any number of layouts, one at a time.
#[derive(Debug, Default)]
pub struct LayoutContext {
    pub(crate) breaker: LineBreaker,
    pool: Vec<MeasuredParagraph>,
}

impl LayoutContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a measured paragraph from the pool. Its contents are unspecified.
    pub(crate) fn obtain_measured(&mut self) -> Option<MeasuredParagraph> {
        self.pool.pop()
    }

    /// Returns a measured paragraph to the pool.
    pub(crate) fn recycle_measured(&mut self, mut paragraph: MeasuredParagraph) {
        if self.pool.len() < POOL_SIZE {
            paragraph.release();
            self.pool.push(paragraph);
        }
    }

    /// The number of measured paragraphs waiting for reuse.
    pub fn pooled(&self) -> usize {
        self.pool.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{LayoutContext, POOL_SIZE};
    use crate::MeasuredParagraph;

    #[test]
    fn pool_is_bounded() {
        let mut lcx = LayoutContext::new();
        for _ in 0..POOL_SIZE + 2 {
            lcx.recycle_measured(MeasuredParagraph::default());
        }
        assert_eq!(lcx.pooled(), POOL_SIZE);
        assert!(lcx.obtain_measured().is_some(), "pooled paragraphs are handed out");
        assert_eq!(lcx.pooled(), POOL_SIZE - 1);
    }
}
