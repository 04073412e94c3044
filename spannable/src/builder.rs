// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::ops::Range;

use hashbrown::HashMap;

use crate::flags::{
    END_MASK, MARK, PARAGRAPH, POINT, SPAN_ADDED, SPAN_END_AT_END, SPAN_END_AT_START,
    SPAN_START_AT_END, SPAN_START_AT_START, SPAN_START_END_MASK, START_MASK, START_SHIFT,
};
use crate::spanned::{span_address, span_overlaps};
use crate::text_range::{is_paragraph_boundary, validate_range};
use crate::watcher::{WatcherList, dispatch};
use crate::{
    Endpoint, Error, InputFilter, SpanFlags, SpanRef, SpanWatcher, Spanned, SpannedString,
    TextStorage, TextWatcher,
};

type SpanWatchers<S> = Vec<Rc<RefCell<dyn SpanWatcher<S>>>>;
type TextWatchers<S> = Vec<Rc<RefCell<dyn TextWatcher<S>>>>;

enum SpanObject<S: ?Sized> {
    Span(Rc<S>),
    SelectionStart,
    SelectionEnd,
}

impl<S: ?Sized> SpanObject<S> {
    fn key(&self) -> SpanKey {
        match self {
            Self::Span(span) => SpanKey::Span(span_address::<S>(span)),
            Self::SelectionStart => SpanKey::SelectionStart,
            Self::SelectionEnd => SpanKey::SelectionEnd,
        }
    }

    fn as_span_ref(&self) -> SpanRef<'_, S> {
        match self {
            Self::Span(span) => SpanRef::Span(span),
            Self::SelectionStart => SpanRef::SelectionStart,
            Self::SelectionEnd => SpanRef::SelectionEnd,
        }
    }

    fn span(&self) -> Option<&Rc<S>> {
        match self {
            Self::Span(span) => Some(span),
            Self::SelectionStart | Self::SelectionEnd => None,
        }
    }
}

impl<S: ?Sized> Clone for SpanObject<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Span(span) => Self::Span(span.clone()),
            Self::SelectionStart => Self::SelectionStart,
            Self::SelectionEnd => Self::SelectionEnd,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum SpanKey {
    Span(usize),
    SelectionStart,
    SelectionEnd,
}

const SPAN_PARAGRAPH: u32 = SpanFlags::PARAGRAPH.bits();
const SPAN_EXCLUSIVE_EXCLUSIVE: u32 = SpanFlags::EXCLUSIVE_EXCLUSIVE.bits();

const GAP_FILL: &str = "\0";

fn grow_size(size: usize) -> usize {
    if size <= 4 { 8 } else { size * 2 }
}

fn left_child(i: usize) -> usize {
    i - (((i + 1) & !i) >> 1)
}

fn right_child(i: usize) -> usize {
    i + (((i + 1) & !i) >> 1)
}

/// Mutable text with spans, stored as a gap buffer.
///
/// Span endpoints are kept in "gap space": an offset past the gap is stored shifted by the gap
/// length, so moving the gap only touches the endpoints it crosses. The span arrays are sorted
/// by start offset and read as an implicit binary tree, where node `i` is a leaf when `i` is
/// even, the root is the largest `2^k - 1` below the span count, and every node caches the
/// maximum end offset of its subtree. That cache lets overlap queries skip whole subtrees.
///
/// Real text offsets are always byte offsets on char boundaries. The gap is kept filled with
/// `'\0'`, so both halves around it are always valid string slices.
pub struct SpannableStringBuilder<S: ?Sized> {
    text: String,
    gap_start: usize,
    gap_len: usize,

    spans: Vec<SpanObject<S>>,
    span_starts: Vec<usize>,
    span_ends: Vec<usize>,
    // Subtree maxima, indexed by tree node.
    span_max: Vec<usize>,
    span_flags: Vec<u32>,
    span_order: Vec<usize>,
    span_insert_count: usize,
    index_of_span: HashMap<SpanKey, usize>,
    // Smallest array index whose `index_of_span` entry may be stale.
    low_water_mark: usize,

    text_watcher_depth: usize,
    filters: Vec<Box<dyn InputFilter<S>>>,
    text_watchers: WatcherList<dyn TextWatcher<S>>,
    span_watchers: WatcherList<dyn SpanWatcher<S>>,
}

impl<S: ?Sized> SpannableStringBuilder<S> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::from_text("")
    }

    /// Creates a builder holding `text` without spans.
    pub fn from_text(text: &str) -> Self {
        let src_len = text.len();
        let gap_len = grow_size(src_len) - src_len;
        let mut buf = String::with_capacity(src_len + gap_len);
        buf.push_str(text);
        buf.push_str(&GAP_FILL.repeat(gap_len));
        Self {
            text: buf,
            gap_start: src_len,
            gap_len,
            spans: Vec::new(),
            span_starts: Vec::new(),
            span_ends: Vec::new(),
            span_max: Vec::new(),
            span_flags: Vec::new(),
            span_order: Vec::new(),
            span_insert_count: 0,
            index_of_span: HashMap::new(),
            low_water_mark: usize::MAX,
            text_watcher_depth: 0,
            filters: Vec::new(),
            text_watchers: WatcherList::new(),
            span_watchers: WatcherList::new(),
        }
    }

    /// Copies `range` of `source` together with the spans overlapping it.
    ///
    /// Spans are clipped to the range. Paragraph spans whose clipped ends no longer sit on
    /// paragraph boundaries are dropped.
    pub fn from_spanned(source: &dyn Spanned<S>, range: Range<usize>) -> Result<Self, Error> {
        validate_range(source, &range)?;
        let mut text = String::with_capacity(range.len());
        source.get_chars(range.clone(), &mut text);
        let mut this = Self::from_text(&text);
        for span in source.get_spans(range.clone(), &|_| true) {
            let (Some(st), Some(en)) = (source.span_start(&span), source.span_end(&span)) else {
                continue;
            };
            let st = st.clamp(range.start, range.end) - range.start;
            let en = en.clamp(range.start, range.end) - range.start;
            let flags = source.span_flags(&span).bits();
            this.set_span_internal(false, SpanObject::Span(span), st, en, flags, false)?;
        }
        this.restore_invariants();
        Ok(this)
    }

    /// Returns a new builder holding a copy of `range`, as [`from_spanned`](Self::from_spanned).
    pub fn sub_sequence(&self, range: Range<usize>) -> Result<Self, Error> {
        Self::from_spanned(self, range)
    }

    /// Returns an immutable snapshot of the whole text and its spans.
    pub fn to_spanned_string(&self) -> SpannedString<S> {
        SpannedString::copy_of(self, 0..self.len())
    }

    /// The number of attached spans, selection markers included.
    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    /// How many text watcher notifications are currently being dispatched.
    pub fn text_watcher_depth(&self) -> usize {
        self.text_watcher_depth
    }

    /// Replaces the input filter chain.
    pub fn set_filters(&mut self, filters: Vec<Box<dyn InputFilter<S>>>) {
        self.filters = filters;
    }

    /// The input filter chain.
    pub fn filters(&self) -> &[Box<dyn InputFilter<S>>] {
        &self.filters
    }

    /// Registers a text watcher. Higher priorities are notified first.
    pub fn add_text_watcher(&mut self, watcher: Weak<RefCell<dyn TextWatcher<S>>>, priority: u8) {
        self.text_watchers.add(watcher, priority);
    }

    /// Unregisters a text watcher.
    pub fn remove_text_watcher(&mut self, watcher: &Weak<RefCell<dyn TextWatcher<S>>>) {
        self.text_watchers.remove(watcher);
    }

    /// Registers a span watcher. Higher priorities are notified first.
    pub fn add_span_watcher(&mut self, watcher: Weak<RefCell<dyn SpanWatcher<S>>>, priority: u8) {
        self.span_watchers.add(watcher, priority);
    }

    /// Unregisters a span watcher.
    pub fn remove_span_watcher(&mut self, watcher: &Weak<RefCell<dyn SpanWatcher<S>>>) {
        self.span_watchers.remove(watcher);
    }

    /// Inserts `text` at `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<&mut Self, Error> {
        self.replace(offset..offset, &text, 0..text.len())
    }

    /// Inserts `source` with its spans at `offset`.
    pub fn insert_spanned(
        &mut self,
        offset: usize,
        source: &dyn Spanned<S>,
    ) -> Result<&mut Self, Error> {
        self.replace(offset..offset, source, 0..source.len())
    }

    /// Appends `text`.
    pub fn append(&mut self, text: &str) -> Result<&mut Self, Error> {
        let len = self.len();
        self.replace(len..len, &text, 0..text.len())
    }

    /// Appends `source` with its spans.
    pub fn append_spanned(&mut self, source: &dyn Spanned<S>) -> Result<&mut Self, Error> {
        let len = self.len();
        self.replace(len..len, source, 0..source.len())
    }

    /// Appends `text` and attaches `span` over it.
    pub fn append_with_span(
        &mut self,
        text: &str,
        span: Rc<S>,
        flags: SpanFlags,
    ) -> Result<&mut Self, Error> {
        let start = self.len();
        self.append(text)?;
        let end = self.len();
        self.set_span(span, start..end, flags)?;
        Ok(self)
    }

    /// Deletes `range`.
    pub fn delete(&mut self, range: Range<usize>) -> Result<&mut Self, Error> {
        self.replace(range, &"", 0..0)?;
        let len = self.len();
        if self.gap_len > 2 * len {
            let target = grow_size(len);
            if target < self.text.len() {
                self.reallocate(target);
            }
        }
        Ok(self)
    }

    /// Deletes all text. Spans that survive the deletion stay attached.
    pub fn clear(&mut self) {
        let len = self.len();
        let cleared = self.replace(0..len, &"", 0..0).map(|_| ());
        debug_assert!(cleared.is_ok(), "the whole text is always a valid range");
        self.span_insert_count = 0;
    }

    /// Detaches every span, notifying span watchers for each.
    pub fn clear_spans(&mut self) {
        while let Some(what) = self.spans.pop() {
            let ostart = self.span_starts.pop().map_or(0, |s| self.resolve_gap(s));
            let oend = self.span_ends.pop().map_or(0, |e| self.resolve_gap(e));
            self.span_flags.pop();
            self.span_order.pop();
            self.index_of_span.remove(&what.key());
            let watchers = self.span_watchers.live();
            self.notify_span_removed(&watchers, what.as_span_ref(), ostart, oend);
        }
        self.index_of_span.clear();
        self.span_insert_count = 0;
    }

    /// Replaces `range` with `text`.
    pub fn replace_str(&mut self, range: Range<usize>, text: &str) -> Result<&mut Self, Error> {
        self.replace(range, &text, 0..text.len())
    }

    /// Replaces `range` with `source[source_range]`, copying the source's spans.
    ///
    /// The replacement first runs through the input filters. Text watchers are told before and
    /// after the change, then span watchers hear about every span that moved and every span
    /// that was copied in.
    pub fn replace(
        &mut self,
        range: Range<usize>,
        source: &dyn Spanned<S>,
        source_range: Range<usize>,
    ) -> Result<&mut Self, Error> {
        validate_range(self, &range)?;
        validate_range(source, &source_range)?;
        let (start, end) = (range.start, range.end);

        let mut filtered: Option<SpannedString<S>> = None;
        let mut source_range = source_range;
        for filter in &self.filters {
            let current: &dyn Spanned<S> = match &filtered {
                Some(replacement) => replacement,
                None => source,
            };
            if let Some(replacement) = filter.filter(current, source_range.clone(), self, start..end)
            {
                source_range = 0..replacement.len();
                filtered = Some(replacement);
            }
        }
        let source: &dyn Spanned<S> = match &filtered {
            Some(replacement) => replacement,
            None => source,
        };
        let (tb_start, tb_end) = (source_range.start, source_range.end);

        let orig_len = end - start;
        let new_len = tb_end - tb_start;
        if orig_len == 0 && new_len == 0 && !has_non_exclusive_exclusive_span_at(source, tb_start)
        {
            return Ok(self);
        }

        let text_watchers = self.text_watchers.live();
        if !text_watchers.is_empty() {
            self.send_before_text_changed(&text_watchers, start, orig_len, new_len);
        }

        if orig_len != 0 && new_len != 0 {
            let selection_start = self.selection_start();
            let selection_end = self.selection_end();

            self.change(start, end, source, tb_start, tb_end)?;

            let mut changed = false;
            if let Some(selection) = selection_start {
                if selection > start && selection < end {
                    let offset = (selection - start) * new_len / orig_len;
                    let selection = self.floor_char_boundary(start + offset);
                    changed = true;
                    self.set_span_internal(
                        false,
                        SpanObject::SelectionStart,
                        selection,
                        selection,
                        SpanFlags::POINT_POINT.bits(),
                        true,
                    )?;
                }
            }
            if let Some(selection) = selection_end {
                if selection > start && selection < end {
                    let offset = (selection - start) * new_len / orig_len;
                    let selection = self.floor_char_boundary(start + offset);
                    changed = true;
                    self.set_span_internal(
                        false,
                        SpanObject::SelectionEnd,
                        selection,
                        selection,
                        SpanFlags::POINT_POINT.bits(),
                        true,
                    )?;
                }
            }
            if changed {
                self.restore_invariants();
            }
        } else {
            self.change(start, end, source, tb_start, tb_end)?;
        }

        if !text_watchers.is_empty() {
            self.send_text_changed(&text_watchers, start, orig_len, new_len);
            self.send_after_text_changed(&text_watchers);
        }

        self.send_to_span_watchers(start, end, new_len as isize - orig_len as isize);
        Ok(self)
    }

    /// Attaches `span` over `range`, or moves it there if it is already attached.
    ///
    /// Fails if the range is invalid, or if `flags` ask for a paragraph endpoint that does not
    /// follow a `'\n'`. A zero-length [`SpanFlags::EXCLUSIVE_EXCLUSIVE`] span is refused with
    /// an error log and `Ok(())`, since nothing could ever be inserted into it.
    pub fn set_span(
        &mut self,
        span: Rc<S>,
        range: Range<usize>,
        flags: SpanFlags,
    ) -> Result<(), Error> {
        self.set_span_internal(
            true,
            SpanObject::Span(span),
            range.start,
            range.end,
            flags.bits(),
            true,
        )
    }

    /// Detaches `span`, notifying span watchers.
    pub fn remove_span(&mut self, span: &S) {
        self.remove_span_with_flags(span, SpanFlags::empty());
    }

    /// Detaches `span`. With [`SpanFlags::INTERMEDIATE`] no notification is sent.
    pub fn remove_span_with_flags(&mut self, span: &S, flags: SpanFlags) {
        if let Some(i) = self.index_of_span.remove(&SpanKey::Span(span_address(span))) {
            if i < self.spans.len() {
                self.remove_span_at(i, flags.bits());
            }
        }
    }

    /// The offset of the selection start marker, if a selection is set.
    pub fn selection_start(&self) -> Option<usize> {
        self.lookup(SpanKey::SelectionStart)
            .map(|i| self.resolve_gap(self.span_starts[i]))
    }

    /// The offset of the selection end marker, if a selection is set.
    pub fn selection_end(&self) -> Option<usize> {
        self.lookup(SpanKey::SelectionEnd)
            .map(|i| self.resolve_gap(self.span_starts[i]))
    }

    /// Sets the selection to `start..stop`; `stop` may precede `start`.
    pub fn set_selection(&mut self, start: usize, stop: usize) -> Result<(), Error> {
        if self.selection_start() != Some(start) || self.selection_end() != Some(stop) {
            self.set_span_internal(
                true,
                SpanObject::SelectionStart,
                start,
                start,
                (SpanFlags::POINT_POINT | SpanFlags::INTERMEDIATE).bits(),
                true,
            )?;
            self.set_span_internal(
                true,
                SpanObject::SelectionEnd,
                stop,
                stop,
                SpanFlags::POINT_POINT.bits(),
                true,
            )?;
        }
        Ok(())
    }

    /// Collapses the selection to a cursor at `offset`.
    pub fn set_cursor(&mut self, offset: usize) -> Result<(), Error> {
        self.set_selection(offset, offset)
    }

    /// Removes both selection markers.
    pub fn remove_selection(&mut self) {
        for key in [SpanKey::SelectionStart, SpanKey::SelectionEnd] {
            if let Some(i) = self.index_of_span.remove(&key) {
                if i < self.spans.len() {
                    self.remove_span_at(i, 0);
                }
            }
        }
    }

    fn lookup(&self, key: SpanKey) -> Option<usize> {
        self.index_of_span
            .get(&key)
            .copied()
            .filter(|&i| i < self.spans.len())
    }

    fn resolve_gap(&self, i: usize) -> usize {
        if i > self.gap_start { i - self.gap_len } else { i }
    }

    fn byte_at(&self, offset: usize) -> u8 {
        let i = if offset >= self.gap_start {
            offset + self.gap_len
        } else {
            offset
        };
        self.text.as_bytes().get(i).copied().unwrap_or(0)
    }

    fn floor_char_boundary(&self, mut offset: usize) -> usize {
        while offset > 0 && !self.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }

    fn resize_for(&mut self, size: usize) {
        if size < self.text.len() {
            return;
        }
        self.reallocate(grow_size(size));
    }

    fn reallocate(&mut self, new_len: usize) {
        let old_len = self.text.len();
        let after = old_len - (self.gap_start + self.gap_len);
        let new_gap_len = new_len - self.gap_start - after;
        let mut new_text = String::with_capacity(new_len);
        new_text.push_str(&self.text[..self.gap_start]);
        new_text.push_str(&GAP_FILL.repeat(new_gap_len));
        new_text.push_str(&self.text[old_len - after..]);
        self.text = new_text;

        if !self.spans.is_empty() {
            for i in 0..self.spans.len() {
                if self.span_starts[i] > self.gap_start {
                    self.span_starts[i] = self.span_starts[i] - self.gap_len + new_gap_len;
                }
                if self.span_ends[i] > self.gap_start {
                    self.span_ends[i] = self.span_ends[i] - self.gap_len + new_gap_len;
                }
            }
            self.gap_len = new_gap_len;
            self.calc_max(self.tree_root());
        } else {
            self.gap_len = new_gap_len;
        }
    }

    fn move_gap_to(&mut self, offset: usize) {
        if offset == self.gap_start {
            return;
        }
        let at_end = offset == self.len();
        let gap_end = self.gap_start + self.gap_len;
        if offset < self.gap_start {
            let mut shifted = GAP_FILL.repeat(self.gap_len);
            shifted.push_str(&self.text[offset..self.gap_start]);
            self.text.replace_range(offset..gap_end, &shifted);
        } else {
            let overlap = offset - self.gap_start;
            let mut shifted = String::with_capacity(overlap + self.gap_len);
            shifted.push_str(&self.text[gap_end..gap_end + overlap]);
            shifted.push_str(&GAP_FILL.repeat(self.gap_len));
            self.text
                .replace_range(self.gap_start..gap_end + overlap, &shifted);
        }

        if !self.spans.is_empty() {
            for i in 0..self.spans.len() {
                let flags = self.span_flags[i];

                let mut start = self.span_starts[i];
                if start > self.gap_start {
                    start -= self.gap_len;
                }
                if start > offset {
                    start += self.gap_len;
                } else if start == offset {
                    let flag = (flags & START_MASK) >> START_SHIFT;
                    if flag == POINT || (at_end && flag == PARAGRAPH) {
                        start += self.gap_len;
                    }
                }

                let mut end = self.span_ends[i];
                if end > self.gap_start {
                    end -= self.gap_len;
                }
                if end > offset {
                    end += self.gap_len;
                } else if end == offset {
                    let flag = flags & END_MASK;
                    if flag == POINT || (at_end && flag == PARAGRAPH) {
                        end += self.gap_len;
                    }
                }

                self.span_starts[i] = start;
                self.span_ends[i] = end;
            }
            self.calc_max(self.tree_root());
        }
        self.gap_start = offset;
    }

    fn remove_spans_for_change(
        &mut self,
        start: usize,
        end: usize,
        text_is_removed: bool,
        i: usize,
    ) -> bool {
        if (i & 1) != 0
            && self.resolve_gap(self.span_max[i]) >= start
            && self.remove_spans_for_change(start, end, text_is_removed, left_child(i))
        {
            return true;
        }
        if i < self.spans.len() {
            let gap_end = self.gap_start + self.gap_len;
            let span_start = self.span_starts[i];
            let span_end = self.span_ends[i];
            if (self.span_flags[i] & SPAN_EXCLUSIVE_EXCLUSIVE) == SPAN_EXCLUSIVE_EXCLUSIVE
                && span_start >= start
                && span_start < gap_end
                && span_end >= start
                && span_end < gap_end
                && (text_is_removed || span_start > start || span_end < self.gap_start)
            {
                let key = self.spans[i].key();
                self.index_of_span.remove(&key);
                self.remove_span_at(i, 0);
                return true;
            }
            return self.resolve_gap(self.span_starts[i]) <= end
                && (i & 1) != 0
                && self.remove_spans_for_change(start, end, text_is_removed, right_child(i));
        }
        false
    }

    fn change(
        &mut self,
        start: usize,
        end: usize,
        cs: &dyn Spanned<S>,
        cs_start: usize,
        cs_end: usize,
    ) -> Result<(), Error> {
        let replaced_len = end - start;
        let replacement_len = cs_end - cs_start;
        // Where `end` lands once the replacement is in.
        let new_end = start + replacement_len;

        let mut changed = false;
        for i in (0..self.spans.len()).rev() {
            let mut span_start = self.resolve_gap(self.span_starts[i]);
            let mut span_end = self.resolve_gap(self.span_ends[i]);

            if (self.span_flags[i] & SPAN_PARAGRAPH) == SPAN_PARAGRAPH {
                let (ost, oen) = (span_start, span_end);
                let clen = self.len();

                if span_start > start && span_start <= end {
                    span_start = end;
                    while span_start < clen {
                        if span_start > end && self.byte_at(span_start - 1) == b'\n' {
                            break;
                        }
                        span_start += 1;
                    }
                }

                if span_end > start && span_end <= end {
                    span_end = end;
                    while span_end < clen {
                        if span_end > end && self.byte_at(span_end - 1) == b'\n' {
                            break;
                        }
                        span_end += 1;
                    }
                }

                if span_start != ost || span_end != oen {
                    let what = self.spans[i].clone();
                    let flags = self.span_flags[i];
                    self.set_span_internal(false, what, span_start, span_end, flags, true)?;
                    changed = true;
                }
            }

            let mut flags = 0;
            if span_start == start {
                flags |= SPAN_START_AT_START;
            } else if span_start == new_end {
                flags |= SPAN_START_AT_END;
            }
            if span_end == start {
                flags |= SPAN_END_AT_START;
            } else if span_end == new_end {
                flags |= SPAN_END_AT_END;
            }
            self.span_flags[i] |= flags;
        }
        if changed {
            self.restore_invariants();
        }

        self.move_gap_to(end);

        let growth = replacement_len.saturating_sub(replaced_len);
        if growth >= self.gap_len {
            self.resize_for(self.text.len() + growth - self.gap_len);
        }

        let text_is_removed = replacement_len == 0;
        // The removal pass needs the gap at `end`, before it absorbs the replaced text.
        if replaced_len > 0 {
            while !self.spans.is_empty()
                && self.remove_spans_for_change(start, end, text_is_removed, self.tree_root())
            {}
        }

        // The replaced text joins the gap.
        self.text.replace_range(start..end, &GAP_FILL.repeat(replaced_len));
        self.gap_start = new_end;
        self.gap_len = self.gap_len + replaced_len - replacement_len;

        let (a, b) = cs.slices(cs_start..cs_end);
        self.text.replace_range(start..start + a.len(), a);
        self.text
            .replace_range(start + a.len()..start + a.len() + b.len(), b);

        if replaced_len > 0 {
            let at_end = self.gap_start + self.gap_len == self.text.len();
            for i in 0..self.spans.len() {
                let start_flag = (self.span_flags[i] & START_MASK) >> START_SHIFT;
                self.span_starts[i] = self.updated_interval_bound(
                    self.span_starts[i],
                    start,
                    end,
                    start_flag,
                    at_end,
                    text_is_removed,
                );
                let end_flag = self.span_flags[i] & END_MASK;
                self.span_ends[i] = self.updated_interval_bound(
                    self.span_ends[i],
                    start,
                    end,
                    end_flag,
                    at_end,
                    text_is_removed,
                );
            }
            self.restore_invariants();
        }

        let copied = cs.get_spans(cs_start..cs_end, &|_| true);
        if !copied.is_empty() {
            for span in copied {
                let (Some(st), Some(en)) = (cs.span_start(&span), cs.span_end(&span)) else {
                    continue;
                };
                let st = st.max(cs_start);
                let en = en.min(cs_end);
                if self.span_start(&span).is_none() {
                    let copy_start = st - cs_start + start;
                    let copy_end = en - cs_start + start;
                    let copy_flags = cs.span_flags(&span).bits() | SPAN_ADDED;
                    self.set_span_internal(
                        false,
                        SpanObject::Span(span),
                        copy_start,
                        copy_end,
                        copy_flags,
                        false,
                    )?;
                }
            }
            self.restore_invariants();
        }
        Ok(())
    }

    /// Moves a gap-space endpoint that fell inside the replaced region.
    ///
    /// Must be called after the gap has absorbed the replacement; `old_end` is the end of the
    /// replaced range in pre-edit offsets.
    fn updated_interval_bound(
        &self,
        offset: usize,
        start: usize,
        old_end: usize,
        flag: u32,
        at_end: bool,
        text_is_removed: bool,
    ) -> usize {
        let gap_end = self.gap_start + self.gap_len;
        if offset >= start && offset < gap_end {
            if flag == POINT {
                if text_is_removed || offset > start {
                    return gap_end;
                }
            } else if flag == PARAGRAPH {
                if at_end {
                    return gap_end;
                }
            } else if text_is_removed || offset < old_end {
                return start;
            } else {
                return self.gap_start;
            }
        }
        offset
    }

    fn remove_span_at(&mut self, i: usize, flags: u32) {
        let object = self.spans.remove(i);
        let raw_start = self.span_starts.remove(i);
        let raw_end = self.span_ends.remove(i);
        let start = self.resolve_gap(raw_start);
        let end = self.resolve_gap(raw_end);
        self.span_flags.remove(i);
        self.span_order.remove(i);

        self.invalidate_index(i);
        self.restore_invariants();

        if (flags & SpanFlags::INTERMEDIATE.bits()) == 0 {
            let watchers = self.span_watchers.live();
            self.notify_span_removed(&watchers, object.as_span_ref(), start, end);
        }
    }

    fn send_to_span_watchers(&mut self, replace_start: usize, replace_end: usize, delta: isize) {
        let watchers = self.span_watchers.live();
        let new_replace_end = replace_end.saturating_add_signed(delta);
        for i in 0..self.spans.len() {
            let span_flags = self.span_flags[i];
            if (span_flags & SPAN_ADDED) != 0 {
                continue;
            }
            let span_start = self.resolve_gap(self.span_starts[i]);
            let span_end = self.resolve_gap(self.span_ends[i]);

            let mut span_changed = false;
            let mut previous_start = span_start;
            if span_start > new_replace_end {
                if delta != 0 {
                    previous_start = span_start.saturating_add_signed(-delta);
                    span_changed = true;
                }
            } else if span_start >= replace_start
                && (span_start != replace_start
                    || (span_flags & SPAN_START_AT_START) != SPAN_START_AT_START)
                && (span_start != new_replace_end
                    || (span_flags & SPAN_START_AT_END) != SPAN_START_AT_END)
            {
                span_changed = true;
            }

            let mut previous_end = span_end;
            if span_end > new_replace_end {
                if delta != 0 {
                    previous_end = span_end.saturating_add_signed(-delta);
                    span_changed = true;
                }
            } else if span_end >= replace_start
                && (span_end != replace_start
                    || (span_flags & SPAN_END_AT_START) != SPAN_END_AT_START)
                && (span_end != new_replace_end
                    || (span_flags & SPAN_END_AT_END) != SPAN_END_AT_END)
            {
                span_changed = true;
            }

            if span_changed {
                self.notify_span_changed(
                    &watchers,
                    self.spans[i].as_span_ref(),
                    previous_start,
                    previous_end,
                    span_start,
                    span_end,
                );
            }
            self.span_flags[i] &= !SPAN_START_END_MASK;
        }

        for i in 0..self.spans.len() {
            if (self.span_flags[i] & SPAN_ADDED) != 0 {
                self.span_flags[i] &= !SPAN_ADDED;
                let span_start = self.resolve_gap(self.span_starts[i]);
                let span_end = self.resolve_gap(self.span_ends[i]);
                self.notify_span_added(
                    &watchers,
                    self.spans[i].as_span_ref(),
                    span_start,
                    span_end,
                );
            }
        }
    }

    fn set_span_internal(
        &mut self,
        send: bool,
        what: SpanObject<S>,
        start: usize,
        end: usize,
        flags: u32,
        enforce_paragraph: bool,
    ) -> Result<(), Error> {
        validate_range(self, &(start..end))?;

        let flags_start = (flags & START_MASK) >> START_SHIFT;
        if self.is_invalid_paragraph(start, flags_start) {
            if !enforce_paragraph {
                return Ok(());
            }
            return Err(Error::invalid_paragraph(
                self,
                start,
                end,
                Endpoint::Start,
                start,
            ));
        }

        let flags_end = flags & END_MASK;
        if self.is_invalid_paragraph(end, flags_end) {
            if !enforce_paragraph {
                return Ok(());
            }
            return Err(Error::invalid_paragraph(self, start, end, Endpoint::End, end));
        }

        if flags_start == POINT && flags_end == MARK && start == end {
            if send {
                log::error!("EXCLUSIVE_EXCLUSIVE spans cannot have a zero length");
            }
            return Ok(());
        }

        let (nstart, nend) = (start, end);
        let mut start = start;
        let mut end = end;
        if start > self.gap_start
            || (start == self.gap_start
                && (flags_start == POINT || (flags_start == PARAGRAPH && start == self.len())))
        {
            start += self.gap_len;
        }
        if end > self.gap_start
            || (end == self.gap_start
                && (flags_end == POINT || (flags_end == PARAGRAPH && end == self.len())))
        {
            end += self.gap_len;
        }

        if let Some(i) = self.lookup(what.key()) {
            let ostart = self.resolve_gap(self.span_starts[i]);
            let oend = self.resolve_gap(self.span_ends[i]);
            self.span_starts[i] = start;
            self.span_ends[i] = end;
            self.span_flags[i] = flags;
            if send {
                self.restore_invariants();
                let watchers = self.span_watchers.live();
                self.notify_span_changed(
                    &watchers,
                    what.as_span_ref(),
                    ostart,
                    oend,
                    nstart,
                    nend,
                );
            }
            return Ok(());
        }

        let reported = send.then(|| what.clone());
        self.spans.push(what);
        self.span_starts.push(start);
        self.span_ends.push(end);
        self.span_flags.push(flags);
        self.span_order.push(self.span_insert_count);
        self.invalidate_index(self.spans.len() - 1);
        self.span_insert_count += 1;

        let size_of_max = 2 * self.tree_root() + 1;
        if self.span_max.len() < size_of_max {
            self.span_max.resize(size_of_max, 0);
        }

        if let Some(what) = reported {
            self.restore_invariants();
            let watchers = self.span_watchers.live();
            self.notify_span_added(&watchers, what.as_span_ref(), nstart, nend);
        }
        Ok(())
    }

    fn is_invalid_paragraph(&self, index: usize, flag: u32) -> bool {
        flag == PARAGRAPH && !is_paragraph_boundary(self, index)
    }

    fn send_before_text_changed(
        &mut self,
        watchers: &TextWatchers<S>,
        start: usize,
        before: usize,
        after: usize,
    ) {
        self.text_watcher_depth += 1;
        let text = &*self;
        dispatch(watchers, |w| w.before_text_changed(text, start, before, after));
        self.text_watcher_depth -= 1;
    }

    fn send_text_changed(
        &mut self,
        watchers: &TextWatchers<S>,
        start: usize,
        before: usize,
        after: usize,
    ) {
        self.text_watcher_depth += 1;
        let text = &*self;
        dispatch(watchers, |w| w.on_text_changed(text, start, before, after));
        self.text_watcher_depth -= 1;
    }

    fn send_after_text_changed(&mut self, watchers: &TextWatchers<S>) {
        self.text_watcher_depth += 1;
        let text = &*self;
        dispatch(watchers, |w| w.after_text_changed(text));
        self.text_watcher_depth -= 1;
    }

    fn notify_span_added(
        &self,
        watchers: &SpanWatchers<S>,
        what: SpanRef<'_, S>,
        start: usize,
        end: usize,
    ) {
        dispatch(watchers, |w| w.on_span_added(self, what, start, end));
    }

    fn notify_span_removed(
        &self,
        watchers: &SpanWatchers<S>,
        what: SpanRef<'_, S>,
        start: usize,
        end: usize,
    ) {
        dispatch(watchers, |w| w.on_span_removed(self, what, start, end));
    }

    fn notify_span_changed(
        &self,
        watchers: &SpanWatchers<S>,
        what: SpanRef<'_, S>,
        old_start: usize,
        old_end: usize,
        start: usize,
        end: usize,
    ) {
        dispatch(watchers, |w| {
            w.on_span_changed(self, what, old_start, old_end, start, end);
        });
    }

    fn tree_root(&self) -> usize {
        let count = self.spans.len();
        if count == 0 {
            return 0;
        }
        (1 << (usize::BITS - 1 - count.leading_zeros())) - 1
    }

    fn calc_max(&mut self, i: usize) -> usize {
        let mut max = 0;
        if (i & 1) != 0 {
            max = self.calc_max(left_child(i));
        }
        if i < self.spans.len() {
            max = max.max(self.span_ends[i]);
            if (i & 1) != 0 {
                max = max.max(self.calc_max(right_child(i)));
            }
        }
        self.span_max[i] = max;
        max
    }

    /// Re-sorts the span arrays by start, then refreshes the subtree maxima and the index map.
    fn restore_invariants(&mut self) {
        let count = self.spans.len();
        if count == 0 {
            return;
        }

        // Insertion sort: at most a handful of spans are out of place after any edit.
        for i in 1..count {
            if self.span_starts[i] < self.span_starts[i - 1] {
                let start = self.span_starts[i];
                let mut j = i - 1;
                while j > 0 && start < self.span_starts[j - 1] {
                    j -= 1;
                }
                self.spans[j..=i].rotate_right(1);
                self.span_starts[j..=i].rotate_right(1);
                self.span_ends[j..=i].rotate_right(1);
                self.span_flags[j..=i].rotate_right(1);
                self.span_order[j..=i].rotate_right(1);
                self.invalidate_index(j);
            }
        }

        self.calc_max(self.tree_root());

        for i in self.low_water_mark.min(count)..count {
            let key = self.spans[i].key();
            if self.index_of_span.get(&key) != Some(&i) {
                self.index_of_span.insert(key, i);
            }
        }
        self.low_water_mark = usize::MAX;
    }

    fn invalidate_index(&mut self, i: usize) {
        self.low_water_mark = self.low_water_mark.min(i);
    }

    fn get_spans_rec(
        &self,
        query_start: usize,
        query_end: usize,
        filter: &dyn Fn(&S) -> bool,
        i: usize,
        found: &mut Vec<usize>,
    ) {
        if (i & 1) != 0 {
            let left = left_child(i);
            if self.resolve_gap(self.span_max[left]) >= query_start {
                self.get_spans_rec(query_start, query_end, filter, left, found);
            }
        }
        if i >= self.spans.len() {
            return;
        }
        let span_start = self.resolve_gap(self.span_starts[i]);
        if span_start <= query_end {
            let span_end = self.resolve_gap(self.span_ends[i]);
            if span_overlaps(span_start, span_end, query_start, query_end) {
                if let Some(span) = self.spans[i].span() {
                    if filter(span) {
                        found.push(i);
                    }
                }
            }
            if (i & 1) != 0 {
                self.get_spans_rec(query_start, query_end, filter, right_child(i), found);
            }
        }
    }

    fn next_span_transition_rec(
        &self,
        start: usize,
        mut limit: usize,
        filter: &dyn Fn(&S) -> bool,
        i: usize,
    ) -> usize {
        if (i & 1) != 0 {
            let left = left_child(i);
            if self.resolve_gap(self.span_max[left]) > start {
                limit = self.next_span_transition_rec(start, limit, filter, left);
            }
        }
        if i < self.spans.len() {
            let st = self.resolve_gap(self.span_starts[i]);
            let en = self.resolve_gap(self.span_ends[i]);
            let accepted = self.spans[i].span().is_some_and(|span| filter(span));
            if accepted && st > start && st < limit {
                limit = st;
            }
            if accepted && en > start && en < limit {
                limit = en;
            }
            if st < limit && (i & 1) != 0 {
                limit = self.next_span_transition_rec(start, limit, filter, right_child(i));
            }
        }
        limit
    }
}

fn has_non_exclusive_exclusive_span_at<S: ?Sized>(text: &dyn Spanned<S>, offset: usize) -> bool {
    text.get_spans(offset..offset, &|_| true)
        .iter()
        .any(|span| text.span_flags(span) != SpanFlags::EXCLUSIVE_EXCLUSIVE)
}

impl<S: ?Sized> Default for SpannableStringBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized> TextStorage for SpannableStringBuilder<S> {
    fn len(&self) -> usize {
        self.text.len() - self.gap_len
    }

    fn is_char_boundary(&self, index: usize) -> bool {
        let len = self.len();
        index == len || (index < len && (self.byte_at(index) & 0xC0) != 0x80)
    }

    fn slices(&self, range: Range<usize>) -> (&str, &str) {
        let Range { start, end } = range;
        if start > end || !self.is_char_boundary(start) || !self.is_char_boundary(end) {
            return ("", "");
        }
        let half = |r: Range<usize>| self.text.get(r).unwrap_or_default();
        let gap_end = self.gap_start + self.gap_len;
        if end <= self.gap_start {
            (half(start..end), "")
        } else if start >= self.gap_start {
            (half(start + self.gap_len..end + self.gap_len), "")
        } else {
            (half(start..self.gap_start), half(gap_end..end + self.gap_len))
        }
    }
}

impl<S: ?Sized> Spanned<S> for SpannableStringBuilder<S> {
    fn get_spans(&self, range: Range<usize>, filter: &dyn Fn(&S) -> bool) -> Vec<Rc<S>> {
        if self.spans.is_empty() {
            return Vec::new();
        }
        let mut found = Vec::new();
        self.get_spans_rec(range.start, range.end, filter, self.tree_root(), &mut found);
        let priority = |i: usize| self.span_flags[i] & SpanFlags::PRIORITY.bits();
        found.sort_unstable_by(|&a, &b| {
            priority(b)
                .cmp(&priority(a))
                .then(self.span_order[a].cmp(&self.span_order[b]))
        });
        found
            .into_iter()
            .filter_map(|i| self.spans[i].span().cloned())
            .collect()
    }

    fn span_start(&self, span: &S) -> Option<usize> {
        self.lookup(SpanKey::Span(span_address(span)))
            .map(|i| self.resolve_gap(self.span_starts[i]))
    }

    fn span_end(&self, span: &S) -> Option<usize> {
        self.lookup(SpanKey::Span(span_address(span)))
            .map(|i| self.resolve_gap(self.span_ends[i]))
    }

    fn span_flags(&self, span: &S) -> SpanFlags {
        self.lookup(SpanKey::Span(span_address(span)))
            .map_or(SpanFlags::empty(), |i| {
                SpanFlags::from_bits(self.span_flags[i])
            })
    }

    fn next_span_transition(
        &self,
        start: usize,
        limit: usize,
        filter: &dyn Fn(&S) -> bool,
    ) -> usize {
        if self.spans.is_empty() {
            return limit;
        }
        self.next_span_transition_rec(start, limit, filter, self.tree_root())
    }
}

impl<S: ?Sized> fmt::Display for SpannableStringBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = self.slices(0..self.len());
        f.write_str(a)?;
        f.write_str(b)
    }
}

impl<S: ?Sized> fmt::Debug for SpannableStringBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = self.slices(0..self.len());
        f.debug_struct("SpannableStringBuilder")
            .field("text", &format_args!("{a}{b}"))
            .field("spans", &self.spans.len())
            .field("gap_start", &self.gap_start)
            .field("gap_len", &self.gap_len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::string::{String, ToString};
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use super::{SpannableStringBuilder, left_child, right_child};
    use crate::{ErrorKind, SpanFlags, SpanRef, SpanWatcher, Spanned, TextStorage, TextWatcher};

    type Builder = SpannableStringBuilder<str>;

    fn span(name: &str) -> Rc<str> {
        Rc::from(name)
    }

    /// Checks sort order and every cached subtree maximum.
    fn assert_tree_invariants(b: &Builder) {
        let count = b.spans.len();
        for i in 1..count {
            assert!(
                b.span_starts[i - 1] <= b.span_starts[i],
                "starts out of order at {i}"
            );
        }
        fn check(b: &Builder, i: usize) -> usize {
            let mut max = 0;
            if i & 1 != 0 {
                max = check(b, left_child(i));
            }
            if i < b.spans.len() {
                max = max.max(b.span_ends[i]);
                if i & 1 != 0 {
                    max = max.max(check(b, right_child(i)));
                }
            }
            assert_eq!(b.span_max[i], max, "stale subtree max at node {i}");
            max
        }
        if count > 0 {
            check(b, b.tree_root());
        }
        for (i, object) in b.spans.iter().enumerate() {
            assert_eq!(b.index_of_span.get(&object.key()), Some(&i), "stale index");
        }
    }

    #[test]
    fn tree_navigation() {
        assert_eq!((left_child(1), right_child(1)), (0, 2));
        assert_eq!((left_child(3), right_child(3)), (1, 5));
        assert_eq!((left_child(7), right_child(7)), (3, 11));
        let mut b = Builder::from_text("abcdef");
        for i in 0..5 {
            b.set_span(span("s"), i..i + 1, SpanFlags::MARK_MARK).unwrap();
        }
        assert_eq!(b.tree_root(), 3);
    }

    #[test]
    fn edits_match_a_plain_string() {
        let mut b = Builder::new();
        let mut model = String::new();
        let mut seed = 0x2545_f491_u32;
        let mut next = |bound: usize| {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            (seed >> 8) as usize % bound.max(1)
        };
        let pieces = ["a", "βγ", "\n", "€uro", "", "zz"];
        for _ in 0..200 {
            let len = model.len();
            let mut start = next(len + 1);
            while !model.is_char_boundary(start) {
                start -= 1;
            }
            let mut end = start + next(len - start + 1).min(6);
            while !model.is_char_boundary(end) {
                end -= 1;
            }
            let piece = pieces[next(pieces.len())];
            b.replace_str(start..end, piece).unwrap();
            model.replace_range(start..end, piece);
            assert_eq!(b.to_string(), model);
        }
        b.delete(0..b.len()).unwrap();
        assert!(b.is_empty());
        assert!(b.text.len() <= 8, "buffer shrinks after a large delete");
    }

    #[test]
    fn slices_split_at_the_gap() {
        let mut b = Builder::from_text("a€b€c");
        b.insert(5, "ü").unwrap();
        assert_eq!(b.gap_start, 7);
        assert_eq!(b.to_string(), "a€bü€c");
        assert_eq!(b.slices(1..10), ("€bü", "€"));
        assert_eq!(b.slices(7..11), ("€c", ""));
        assert_eq!(b.slices(2..7), ("", ""), "start inside a char");
        assert_eq!(b.slices(0..12), ("", ""), "past the end");
        assert_eq!(b.char_at(7), Some('€'));
        assert_eq!(b.char_before(7), Some('ü'));
        assert_eq!(b.index_of('c', 0..b.len()), Some(10));

        b.delete(1..4).unwrap();
        assert_eq!(b.to_string(), "abü€c");
        assert!(
            b.text[b.gap_start..b.gap_start + b.gap_len]
                .bytes()
                .all(|byte| byte == 0),
            "deleted text is cleared from the gap"
        );
    }

    #[test]
    fn insertion_respects_endpoint_kinds() {
        let mut b = Builder::from_text("0123456789");
        let mark_mark = span("mm");
        let mark_point = span("mp");
        let point_mark = span("pm");
        let point_point = span("pp");
        b.set_span(mark_mark.clone(), 2..4, SpanFlags::MARK_MARK).unwrap();
        b.set_span(mark_point.clone(), 2..4, SpanFlags::MARK_POINT).unwrap();
        b.set_span(point_mark.clone(), 2..4, SpanFlags::POINT_MARK).unwrap();
        b.set_span(point_point.clone(), 2..4, SpanFlags::POINT_POINT).unwrap();

        b.insert(4, "xx").unwrap();
        b.insert(2, "yy").unwrap();

        assert_eq!(b.span_range(&mark_mark), Some(2..6));
        assert_eq!(b.span_range(&mark_point), Some(2..8));
        assert_eq!(b.span_range(&point_mark), Some(4..6));
        assert_eq!(b.span_range(&point_point), Some(4..8));
        assert_tree_invariants(&b);
    }

    #[test]
    fn deleting_covered_exclusive_span_removes_it() {
        let mut b = Builder::from_text("keep drop keep");
        let dropped = span("drop");
        let kept = span("keep");
        b.set_span(dropped.clone(), 5..9, SpanFlags::EXCLUSIVE_EXCLUSIVE)
            .unwrap();
        b.set_span(kept.clone(), 5..9, SpanFlags::INCLUSIVE_INCLUSIVE)
            .unwrap();
        b.delete(5..9).unwrap();
        assert_eq!(b.span_start(&dropped), None);
        assert_eq!(b.span_range(&kept), Some(5..5));
        assert_eq!(b.to_string(), "keep  keep");
        assert_tree_invariants(&b);
    }

    #[test]
    fn zero_length_exclusive_span_is_refused() {
        let mut b = Builder::from_text("abc");
        let s = span("s");
        assert!(b.set_span(s.clone(), 1..1, SpanFlags::EXCLUSIVE_EXCLUSIVE).is_ok());
        assert_eq!(b.span_start(&s), None);
        assert_eq!(b.span_count(), 0);
    }

    #[test]
    fn paragraph_spans_must_sit_on_paragraph_boundaries() {
        let mut b = Builder::from_text("one\ntwo\nthree");
        let err = b
            .set_span(span("p"), 1..4, SpanFlags::PARAGRAPH)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParagraph);
        let err = b
            .set_span(span("p"), 4..6, SpanFlags::PARAGRAPH)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParagraph);

        let p = span("p");
        b.set_span(p.clone(), 4..8, SpanFlags::PARAGRAPH).unwrap();
        // Removing the newline that ends the paragraph extends it to the next one.
        b.delete(7..8).unwrap();
        assert_eq!(b.to_string(), "one\ntwothree");
        assert_eq!(b.span_range(&p), Some(4..12));
        assert_tree_invariants(&b);
    }

    #[test]
    fn queries_order_by_priority_then_insertion() {
        let mut b = Builder::from_text("abcdefghij");
        let low_first = span("low first");
        let high = span("high");
        let low_second = span("low second");
        let outside = span("outside");
        b.set_span(low_first.clone(), 0..5, SpanFlags::MARK_MARK).unwrap();
        b.set_span(high.clone(), 3..9, SpanFlags::MARK_MARK.with_priority(10))
            .unwrap();
        b.set_span(low_second.clone(), 1..2, SpanFlags::MARK_MARK).unwrap();
        b.set_span(outside.clone(), 8..10, SpanFlags::MARK_MARK).unwrap();

        let found = b.get_spans(1..5, &|_| true);
        let names: Vec<&str> = found.iter().map(|s| &**s).collect();
        assert_eq!(names, ["high", "low first", "low second"]);

        let only_low = b.get_spans(0..10, &|s: &str| s.starts_with("low"));
        assert_eq!(only_low.len(), 2);

        assert!(b.get_spans(5..5, &|_| true).iter().any(|s| Rc::ptr_eq(s, &high)));
        assert!(
            !b.get_spans(5..8, &|_| true).iter().any(|s| Rc::ptr_eq(s, &low_first)),
            "spans that merely touch the query do not overlap"
        );
    }

    #[test]
    fn transitions_honour_the_filter() {
        let mut b = Builder::from_text("abcdefghij");
        b.set_span(span("a"), 2..6, SpanFlags::MARK_MARK).unwrap();
        b.set_span(span("b"), 4..8, SpanFlags::MARK_MARK).unwrap();
        assert_eq!(b.next_span_transition(0, 10, &|_| true), 2);
        assert_eq!(b.next_span_transition(2, 10, &|_| true), 4);
        assert_eq!(b.next_span_transition(4, 10, &|s: &str| s == "a"), 6);
        assert_eq!(b.next_span_transition(8, 10, &|_| true), 10);
    }

    #[test]
    fn random_span_edits_keep_the_tree_consistent() {
        let mut b = Builder::from_text("the quick brown fox jumps over the lazy dog");
        let flags = [
            SpanFlags::MARK_MARK,
            SpanFlags::MARK_POINT,
            SpanFlags::POINT_MARK,
            SpanFlags::POINT_POINT,
        ];
        let mut spans: Vec<Rc<str>> = Vec::new();
        let mut seed = 7_u32;
        let mut next = |bound: usize| {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (seed >> 8) as usize % bound.max(1)
        };
        for round in 0..120 {
            let len = b.len();
            match round % 3 {
                0 => {
                    let start = next(len);
                    let end = (start + next(8) + 1).min(len);
                    let s = span("s");
                    b.set_span(s.clone(), start..end, flags[next(4)]).unwrap();
                    spans.push(s);
                }
                1 => {
                    let at = next(len + 1);
                    b.insert(at, "ab").unwrap();
                }
                _ => {
                    let start = next(len);
                    let end = (start + next(4)).min(len);
                    b.delete(start..end).unwrap();
                }
            }
            assert_tree_invariants(&b);
            for s in &spans {
                if let Some(range) = b.span_range(s) {
                    assert!(range.start <= range.end && range.end <= b.len());
                    let hits = b.get_spans(range.clone(), &|_| true);
                    assert!(hits.iter().any(|h| Rc::ptr_eq(h, s)), "span finds itself");
                }
            }
        }
    }

    #[test]
    fn selection_moves_proportionally_inside_replacement() {
        let mut b = Builder::from_text("0123456789");
        b.set_selection(2, 8).unwrap();
        b.replace_str(0..10, "abcde").unwrap();
        assert_eq!(b.selection_start(), Some(1));
        assert_eq!(b.selection_end(), Some(4));

        b.set_cursor(5).unwrap();
        b.insert(5, "xy").unwrap();
        assert_eq!(b.selection_start(), Some(7), "cursors are points");
        assert!(b.get_spans(0..b.len(), &|_| true).is_empty());
    }

    #[test]
    fn sub_sequence_copies_clipped_spans() {
        let mut b = Builder::from_text("hello brave new world");
        let s = span("s");
        b.set_span(s.clone(), 3..14, SpanFlags::EXCLUSIVE_EXCLUSIVE)
            .unwrap();
        let sub = b.sub_sequence(6..21).unwrap();
        assert_eq!(sub.to_string(), "brave new world");
        assert_eq!(sub.span_range(&s), Some(0..8));
    }

    #[test]
    fn inserting_spanned_text_copies_its_spans() {
        let mut source = Builder::from_text("XY");
        let s = span("s");
        source.set_span(s.clone(), 0..2, SpanFlags::EXCLUSIVE_EXCLUSIVE).unwrap();
        let mut b = Builder::from_text("ab");
        b.insert_spanned(1, &source).unwrap();
        assert_eq!(b.to_string(), "aXYb");
        assert_eq!(b.span_range(&s), Some(1..3));
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    fn describe(span: SpanRef<'_, str>) -> String {
        match span {
            SpanRef::Span(s) => s.to_string(),
            SpanRef::SelectionStart => "sel-start".to_string(),
            SpanRef::SelectionEnd => "sel-end".to_string(),
        }
    }

    impl TextWatcher<str> for Recorder {
        fn before_text_changed(&mut self, text: &Builder, start: usize, count: usize, after: usize) {
            assert_eq!(text.text_watcher_depth(), 1);
            self.events.push(alloc::format!("before {start} {count} {after}"));
        }

        fn on_text_changed(&mut self, text: &Builder, start: usize, before: usize, count: usize) {
            self.events
                .push(alloc::format!("on {start} {before} {count} {text}"));
        }

        fn after_text_changed(&mut self, _text: &Builder) {
            self.events.push("after".to_string());
        }
    }

    impl SpanWatcher<str> for Recorder {
        fn on_span_added(&mut self, _text: &Builder, span: SpanRef<'_, str>, start: usize, end: usize) {
            self.events
                .push(alloc::format!("added {} {start}..{end}", describe(span)));
        }

        fn on_span_removed(&mut self, _text: &Builder, span: SpanRef<'_, str>, start: usize, end: usize) {
            self.events
                .push(alloc::format!("removed {} {start}..{end}", describe(span)));
        }

        fn on_span_changed(
            &mut self,
            _text: &Builder,
            span: SpanRef<'_, str>,
            old_start: usize,
            old_end: usize,
            new_start: usize,
            new_end: usize,
        ) {
            self.events.push(alloc::format!(
                "changed {} {old_start}..{old_end} -> {new_start}..{new_end}",
                describe(span)
            ));
        }
    }

    #[test]
    fn watchers_hear_every_phase() {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let mut b = Builder::from_text("hello world");
        let as_text: Rc<RefCell<dyn TextWatcher<str>>> = recorder.clone();
        let as_span: Rc<RefCell<dyn SpanWatcher<str>>> = recorder.clone();
        b.add_text_watcher(Rc::downgrade(&as_text), 0);
        b.add_span_watcher(Rc::downgrade(&as_span), 0);

        let s = span("w");
        b.set_span(s.clone(), 6..11, SpanFlags::EXCLUSIVE_EXCLUSIVE).unwrap();
        b.insert(0, ">").unwrap();
        b.remove_span_with_flags(&s, SpanFlags::INTERMEDIATE);

        let events = recorder.borrow().events.clone();
        assert_eq!(
            events,
            [
                "added w 6..11",
                "before 0 0 1",
                "on 0 0 1 >hello world",
                "after",
                "changed w 6..11 -> 7..12",
            ]
        );
    }

    #[test]
    fn dropped_watchers_are_pruned() {
        let mut b = Builder::from_text("abc");
        {
            let recorder: Rc<RefCell<dyn TextWatcher<str>>> =
                Rc::new(RefCell::new(Recorder::default()));
            b.add_text_watcher(Rc::downgrade(&recorder), 0);
            assert!(!b.text_watchers.is_empty());
        }
        b.append("d").unwrap();
        assert!(b.text_watchers.is_empty());
    }
}
