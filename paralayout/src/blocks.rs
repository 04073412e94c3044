// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Partition of a dynamic layout's lines into independently redrawn blocks.

use alloc::vec::Vec;

use hashbrown::HashSet;

/// Marks a block whose cached rendering must be rebuilt.
pub const INVALID_BLOCK_INDEX: usize = usize::MAX;

/// Blocks are at least this many bytes long, the last one excepted.
pub const BLOCK_MINIMUM_CHARACTER_LENGTH: usize = 400;

/// Consecutive line ranges, each identified by the index of its last line.
///
/// Block boundaries sit on paragraph ends, so an edit inside one paragraph only touches the
/// block containing it. Blocks that the edit did not reach keep their renderer-assigned index.
#[derive(Clone, Debug, Default)]
pub(crate) struct Blocks {
    created: bool,
    end_lines: Vec<usize>,
    indices: Vec<usize>,
    always_redrawn: HashSet<usize>,
    first_changed: usize,
}

impl Blocks {
    pub(crate) fn is_created(&self) -> bool {
        self.created
    }

    /// Forgets every block before a partition is built from scratch.
    pub(crate) fn start_creation(&mut self) {
        self.created = true;
        self.end_lines.clear();
        self.indices.clear();
        self.always_redrawn.clear();
    }

    /// Appends the block ending at `line`, skipping it if the previous block already ends there.
    pub(crate) fn push_block_ending_at(&mut self, line: usize, protrudes: &dyn Fn(usize) -> bool) {
        if self.end_lines.last() == Some(&line) {
            return;
        }
        self.end_lines.push(line);
        self.indices.push(INVALID_BLOCK_INDEX);
        let block = self.end_lines.len() - 1;
        self.update_always_redrawn(block, protrudes);
    }

    /// Re-partitions after lines `start_line..=end_line` were replaced by `new_line_count` lines.
    ///
    /// `end_line` is `start_line - 1` when no line was replaced.
    pub(crate) fn update(
        &mut self,
        start_line: usize,
        end_line: isize,
        new_line_count: usize,
        protrudes: &dyn Fn(usize) -> bool,
    ) {
        let start = start_line as isize;
        let Some(first_block) = self.end_lines.iter().position(|&end| end as isize >= start)
        else {
            return;
        };
        let Some(last_block) = (first_block..self.end_lines.len())
            .find(|&block| self.end_lines[block] as isize >= end_line)
        else {
            return;
        };
        let last_block_end_line = self.end_lines[last_block];

        let first_block_start = if first_block == 0 {
            0
        } else {
            self.end_lines[first_block - 1] + 1
        };
        let create_before = start_line > first_block_start;
        let create_block = new_line_count > 0;
        let create_after = end_line < last_block_end_line as isize;

        let added =
            usize::from(create_before) + usize::from(create_block) + usize::from(create_after);
        let removed = last_block - first_block + 1;

        if self.end_lines.len() + added - removed == 0 {
            // Every line is gone: keep a single empty block.
            self.end_lines.clear();
            self.end_lines.push(0);
            self.indices.clear();
            self.indices.push(INVALID_BLOCK_INDEX);
            self.always_redrawn.clear();
            return;
        }

        let shift = added as isize - removed as isize;
        self.always_redrawn = self
            .always_redrawn
            .iter()
            .filter_map(|&block| {
                if block < first_block {
                    Some(block)
                } else if block > last_block {
                    Some(block.saturating_add_signed(shift))
                } else {
                    None
                }
            })
            .collect();

        let placeholders = core::iter::repeat_n(INVALID_BLOCK_INDEX, added);
        self.end_lines.splice(first_block..=last_block, placeholders.clone());
        self.indices.splice(first_block..=last_block, placeholders);

        let delta_lines = new_line_count as isize - (end_line - start + 1);
        let first_changed = if delta_lines != 0 {
            let first_shifted = first_block + added;
            for end in &mut self.end_lines[first_shifted..] {
                *end = end.saturating_add_signed(delta_lines);
            }
            first_shifted
        } else {
            self.end_lines.len()
        };
        self.first_changed = self.first_changed.min(first_changed);

        let mut block = first_block;
        if create_before {
            self.end_lines[block] = start_line - 1;
            self.update_always_redrawn(block, protrudes);
            block += 1;
        }
        if create_block {
            self.end_lines[block] = start_line + new_line_count - 1;
            self.update_always_redrawn(block, protrudes);
            block += 1;
        }
        if create_after {
            self.end_lines[block] = last_block_end_line.saturating_add_signed(delta_lines);
            self.update_always_redrawn(block, protrudes);
        }
    }

    fn update_always_redrawn(&mut self, block: usize, protrudes: &dyn Fn(usize) -> bool) {
        let start = if block == 0 {
            0
        } else {
            self.end_lines[block - 1] + 1
        };
        let end = self.end_lines[block];
        if (start..=end).any(protrudes) {
            self.always_redrawn.insert(block);
        } else {
            self.always_redrawn.remove(&block);
        }
    }

    pub(crate) fn end_lines(&self) -> &[usize] {
        &self.end_lines
    }

    pub(crate) fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub(crate) fn set_index(&mut self, block: usize, index: usize) {
        if let Some(slot) = self.indices.get_mut(block) {
            *slot = index;
        }
    }

    pub(crate) fn always_redrawn(&self) -> &HashSet<usize> {
        &self.always_redrawn
    }

    pub(crate) fn first_changed(&self) -> usize {
        self.first_changed
    }

    pub(crate) fn set_first_changed(&mut self, block: usize) {
        self.first_changed = block;
    }
}
