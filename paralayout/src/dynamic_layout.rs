// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout of editable text, updated one paragraph range at a time.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::ops::Range;

use hashbrown::HashSet;
use spannable::{Error, SpanRef, SpanWatcher, SpannableStringBuilder, TextRange, TextWatcher};
use text_primitives::{Alignment, Direction, TextDirectionHeuristic, TruncateAt};

use crate::blocks::{BLOCK_MINIMUM_CHARACTER_LENGTH, Blocks};
use crate::static_layout::LayoutParams;
use crate::{
    Directions, Layout, LayoutContext, LineEntry, StaticLayout, StyledText, TextPaint, TextSpan,
};

/// Priority of the layout among the observers of a text.
const WATCHER_PRIORITY: u8 = 128;

/// Configures and builds a [`DynamicLayout`].
#[derive(Clone)]
pub struct DynamicBuilder<'a> {
    base: &'a StyledText<'a>,
    paint: TextPaint,
    params: LayoutParams,
}

impl DynamicBuilder<'_> {
    /// Sets the base alignment. Defaults to [`Alignment::Normal`].
    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.params.alignment = alignment;
        self
    }

    /// Sets how paragraph directions are decided. Defaults to first strong, left to right.
    pub fn text_direction(mut self, heuristic: TextDirectionHeuristic) -> Self {
        self.params.text_direction = heuristic;
        self
    }

    /// Sets line spacing. Defaults to `(0, 1)`.
    pub fn line_spacing(mut self, add: f32, mult: f32) -> Self {
        self.params.spacing_add = add;
        self.params.spacing_mult = mult;
        self
    }

    /// Sets whether the first and last lines reserve room for the font's full extents.
    /// Defaults to `true`.
    pub fn include_pad(mut self, include_pad: bool) -> Self {
        self.params.include_pad = include_pad;
        self
    }

    /// Sets whether lines grow to fit glyphs from fallback fonts. Defaults to `true`.
    pub fn fallback_line_spacing(mut self, enabled: bool) -> Self {
        self.params.fallback_line_spacing = enabled;
        self
    }

    /// Sets where text that does not fit is elided, and the width it is fitted to.
    pub fn ellipsize(mut self, ellipsize: Option<TruncateAt>, ellipsized_width: i32) -> Self {
        self.params.ellipsize = ellipsize;
        self.params.ellipsized_width = ellipsized_width;
        self
    }

    /// Lays out the whole text.
    pub fn build(self) -> DynamicLayout {
        let fm = self.paint.font_metrics();
        let first = LineEntry {
            descent: fm.descent,
            ..LineEntry::default()
        };
        let mut layout = DynamicLayout {
            scratch: StaticLayout::empty(self.paint, self.params),
            lcx: LayoutContext::new(),
            lines: alloc::vec![first, LineEntry::sentinel(0, fm.descent - fm.ascent)],
            top_padding: 0,
            bottom_padding: 0,
            blocks: Blocks::default(),
        };
        let len = self.base.len();
        if let Err(err) = layout.reflow(self.base, 0, 0, len) {
            log::error!("initial layout failed: {err}");
        }
        layout
    }
}

impl core::fmt::Debug for DynamicBuilder<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DynamicBuilder")
            .field("paint", &self.paint)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A layout that follows edits to its text.
///
/// Each edit is widened to whole paragraphs, the affected paragraphs are laid out again with
/// a scratch [`StaticLayout`], and the resulting lines are spliced into the line table. Lines
/// outside the edited paragraphs only have their offsets and tops shifted.
///
/// The lines are also grouped into blocks that end on paragraph boundaries, so that a renderer
/// caching one drawing per block only needs to redraw the blocks an edit touched.
///
/// Attach the layout to a [`SpannableStringBuilder`] with [`attach`](Self::attach) to have it
/// reflow on every change, or call [`reflow`](Self::reflow) directly.
#[derive(Debug)]
pub struct DynamicLayout {
    scratch: StaticLayout,
    lcx: LayoutContext,
    lines: Vec<LineEntry>,
    top_padding: i32,
    bottom_padding: i32,
    blocks: Blocks,
}

impl DynamicLayout {
    /// Starts configuring a layout of `base`, `width` pixels wide.
    pub fn builder<'a>(
        base: &'a StyledText<'a>,
        paint: &TextPaint,
        width: i32,
    ) -> DynamicBuilder<'a> {
        DynamicBuilder {
            base,
            paint: paint.clone(),
            params: LayoutParams::new(width),
        }
    }

    /// Registers the layout as a text and span observer of `text`.
    ///
    /// The registration is weak: once the layout is dropped, `text` forgets it.
    pub fn attach(this: &Rc<RefCell<Self>>, text: &mut SpannableStringBuilder<dyn TextSpan>) {
        let (text_watcher, span_watcher) = Self::watchers(this);
        text.add_text_watcher(text_watcher, WATCHER_PRIORITY);
        text.add_span_watcher(span_watcher, WATCHER_PRIORITY);
    }

    /// Undoes [`attach`](Self::attach).
    pub fn detach(this: &Rc<RefCell<Self>>, text: &mut SpannableStringBuilder<dyn TextSpan>) {
        let (text_watcher, span_watcher) = Self::watchers(this);
        text.remove_text_watcher(&text_watcher);
        text.remove_span_watcher(&span_watcher);
    }

    fn watchers(
        this: &Rc<RefCell<Self>>,
    ) -> (
        Weak<RefCell<dyn TextWatcher<dyn TextSpan>>>,
        Weak<RefCell<dyn SpanWatcher<dyn TextSpan>>>,
    ) {
        let text_watcher: Rc<RefCell<dyn TextWatcher<dyn TextSpan>>> = this.clone();
        let span_watcher: Rc<RefCell<dyn SpanWatcher<dyn TextSpan>>> = this.clone();
        (Rc::downgrade(&text_watcher), Rc::downgrade(&span_watcher))
    }

    /// Every row of the line table, the closing row included.
    pub fn lines(&self) -> &[LineEntry] {
        &self.lines
    }

    /// Updates the layout after `before` bytes at `where_` were replaced by `after` bytes.
    ///
    /// `text` is the text after the change. Fails if `where_..where_ + after` is not a valid
    /// range of it, in which case the layout is left untouched.
    pub fn reflow(
        &mut self,
        text: &StyledText<'_>,
        where_: usize,
        before: usize,
        after: usize,
    ) -> Result<(), Error> {
        let changed = TextRange::new(text, where_..where_.saturating_add(after))?;
        let len = text.len();

        // Widen the change to whole paragraphs.
        let paragraphs = changed.to_paragraphs(text);
        let diff = changed.start() - paragraphs.start();
        let change = paragraphs.end() - changed.end();
        let where_ = paragraphs.start();
        let before = before + diff + change;
        let after = after + diff + change;

        let start_line = self.line_for_offset(where_);
        let start_v = self.line_top(start_line);
        let end_line = if where_ + after == len {
            self.line_count()
        } else {
            self.line_for_offset(where_ + before)
        };
        let end_v = self.line_top(end_line);
        let is_last = end_line == self.line_count();

        self.scratch.params_mut().add_last_line_spacing = !is_last;
        self.scratch
            .generate(&mut self.lcx, text, where_..where_ + after, false, true);
        let reflowed = &self.scratch;

        // A paragraph ending in a newline yields a trailing empty line, which belongs to the
        // next paragraph unless the change reaches the end of the text.
        let mut n = reflowed.line_count();
        if where_ + after != len && n > 0 && reflowed.line_start(n - 1) == where_ + after {
            n -= 1;
        }

        let include_pad = self.scratch.params().include_pad;
        let mut height = reflowed.line_top(n);
        let mut top_pad = 0;
        let mut bottom_pad = 0;
        if include_pad && start_line == 0 {
            top_pad = reflowed.top_padding();
            self.top_padding = top_pad;
            height -= top_pad;
        }
        if include_pad && is_last {
            bottom_pad = reflowed.bottom_padding();
            self.bottom_padding = bottom_pad;
            height += bottom_pad;
        }

        let start_delta = after as isize - before as isize;
        let top_delta = start_v - end_v + height;
        for entry in &mut self.lines[end_line..] {
            entry.start = entry.start.saturating_add_signed(start_delta);
            entry.top += top_delta;
        }

        let rows = reflowed.lines()[..n].iter().enumerate().map(|(i, row)| {
            let mut row = row.clone();
            row.top += start_v;
            if i > 0 {
                row.top -= top_pad;
            }
            if i + 1 == n {
                row.descent += bottom_pad;
            }
            row
        });
        self.lines.splice(start_line..end_line, rows);

        self.update_blocks(text, start_line, end_line as isize - 1, n);
        Ok(())
    }

    fn update_blocks(
        &mut self,
        text: &StyledText<'_>,
        start_line: usize,
        end_line: isize,
        new_line_count: usize,
    ) {
        let lines = &self.lines;
        let blocks = &mut self.blocks;
        let protrudes = |line: usize| content_may_protrude(lines, text, line);
        if !blocks.is_created() {
            blocks.start_creation();
            let len = text.len();
            let line_for_offset = |offset: usize| {
                let count = lines.len() - 1;
                lines[..count]
                    .partition_point(|row| row.start <= offset)
                    .saturating_sub(1)
            };
            let mut offset = BLOCK_MINIMUM_CHARACTER_LENGTH;
            while offset < len {
                while !text.is_char_boundary(offset) {
                    offset += 1;
                }
                let Some(newline) = text.index_of('\n', offset..len) else {
                    break;
                };
                blocks.push_block_ending_at(line_for_offset(newline), &protrudes);
                offset = newline + 1 + BLOCK_MINIMUM_CHARACTER_LENGTH;
            }
            blocks.push_block_ending_at(line_for_offset(len), &protrudes);
            return;
        }
        blocks.update(start_line, end_line, new_line_count, &protrudes);
    }

    /// The index of the last line of each block.
    pub fn block_end_lines(&self) -> &[usize] {
        self.blocks.end_lines()
    }

    /// The renderer-assigned index of each block, or
    /// [`INVALID_BLOCK_INDEX`](crate::INVALID_BLOCK_INDEX) for blocks that need redrawing.
    pub fn block_indices(&self) -> &[usize] {
        self.blocks.indices()
    }

    /// Records the renderer's index for `block`.
    pub fn set_block_index(&mut self, block: usize, index: usize) {
        self.blocks.set_index(block, index);
    }

    /// The number of blocks.
    pub fn number_of_blocks(&self) -> usize {
        self.blocks.end_lines().len()
    }

    /// The first block whose lines moved since the renderer last reset this.
    pub fn index_first_changed_block(&self) -> usize {
        self.blocks.first_changed()
    }

    /// Resets the first changed block, normally to the number of blocks once all are drawn.
    pub fn set_index_first_changed_block(&mut self, block: usize) {
        self.blocks.set_first_changed(block);
    }

    /// Blocks holding content that may draw outside its lines and so are always redrawn.
    pub fn blocks_always_need_to_be_redrawn(&self) -> &HashSet<usize> {
        self.blocks.always_redrawn()
    }

    fn reflow_notified(
        &mut self,
        text: &StyledText<'_>,
        where_: usize,
        before: usize,
        after: usize,
    ) {
        if let Err(err) = self.reflow(text, where_, before, after) {
            log::warn!("ignoring a change notification outside the text: {err}");
        }
    }

    fn reflow_span(
        &mut self,
        text: &StyledText<'_>,
        span: SpanRef<'_, dyn TextSpan>,
        range: Range<usize>,
    ) {
        if span.span().is_some_and(|span| span.updates_layout()) {
            let len = range.len();
            self.reflow_notified(text, range.start, len, len);
        }
    }
}

/// Returns `true` if `line` holds an object that may draw beyond the line's bounds.
fn content_may_protrude(lines: &[LineEntry], text: &StyledText<'_>, line: usize) -> bool {
    let (Some(start), Some(end)) = (lines.get(line), lines.get(line + 1)) else {
        return false;
    };
    !text
        .get_spans(start.start..end.start, &|span| span.replacement().is_some())
        .is_empty()
}

impl TextWatcher<dyn TextSpan> for DynamicLayout {
    fn on_text_changed(
        &mut self,
        text: &SpannableStringBuilder<dyn TextSpan>,
        start: usize,
        before: usize,
        count: usize,
    ) {
        self.reflow_notified(text, start, before, count);
    }
}

impl SpanWatcher<dyn TextSpan> for DynamicLayout {
    fn on_span_added(
        &mut self,
        text: &SpannableStringBuilder<dyn TextSpan>,
        span: SpanRef<'_, dyn TextSpan>,
        start: usize,
        end: usize,
    ) {
        self.reflow_span(text, span, start..end);
    }

    fn on_span_removed(
        &mut self,
        text: &SpannableStringBuilder<dyn TextSpan>,
        span: SpanRef<'_, dyn TextSpan>,
        start: usize,
        end: usize,
    ) {
        self.reflow_span(text, span, start..end);
    }

    fn on_span_changed(
        &mut self,
        text: &SpannableStringBuilder<dyn TextSpan>,
        span: SpanRef<'_, dyn TextSpan>,
        old_start: usize,
        old_end: usize,
        new_start: usize,
        new_end: usize,
    ) {
        self.reflow_span(text, span, old_start.min(old_end)..old_end);
        self.reflow_span(text, span, new_start.min(new_end)..new_end);
    }
}

impl Layout for DynamicLayout {
    fn width(&self) -> i32 {
        self.scratch.width()
    }

    fn paint(&self) -> &TextPaint {
        self.scratch.paint()
    }

    fn alignment(&self) -> Alignment {
        self.scratch.alignment()
    }

    fn line_count(&self) -> usize {
        self.lines.len() - 1
    }

    fn line_top(&self, line: usize) -> i32 {
        self.lines[line].top
    }

    fn line_descent(&self, line: usize) -> i32 {
        self.lines[line].descent
    }

    fn line_start(&self, line: usize) -> usize {
        self.lines[line].start
    }

    fn paragraph_direction(&self, line: usize) -> Direction {
        self.lines[line].direction
    }

    fn line_contains_tab(&self, line: usize) -> bool {
        self.lines[line].has_tab
    }

    fn line_directions(&self, line: usize) -> &Directions {
        &self.lines[line].directions
    }

    fn top_padding(&self) -> i32 {
        self.top_padding
    }

    fn bottom_padding(&self) -> i32 {
        self.bottom_padding
    }

    fn ellipsis_start(&self, line: usize) -> usize {
        self.lines[line].ellipsis_start
    }

    fn ellipsis_count(&self, line: usize) -> usize {
        self.lines[line].ellipsis_count
    }

    fn ellipsized_width(&self) -> i32 {
        self.scratch.ellipsized_width()
    }

    fn line_extra(&self, line: usize) -> i32 {
        self.lines[line].extra
    }
}
