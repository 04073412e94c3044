// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::SpannableStringBuilder;

/// A span as reported to a [`SpanWatcher`].
#[derive(Debug)]
pub enum SpanRef<'a, S: ?Sized> {
    /// A span attached with [`SpannableStringBuilder::set_span`].
    Span(&'a Rc<S>),
    /// The selection start marker.
    SelectionStart,
    /// The selection end marker.
    SelectionEnd,
}

impl<'a, S: ?Sized> SpanRef<'a, S> {
    /// Returns the span, or `None` for a selection marker.
    pub fn span(&self) -> Option<&'a Rc<S>> {
        match self {
            Self::Span(span) => Some(span),
            Self::SelectionStart | Self::SelectionEnd => None,
        }
    }

    /// Returns `true` for either selection marker.
    pub fn is_selection(&self) -> bool {
        !matches!(self, Self::Span(_))
    }
}

impl<S: ?Sized> Clone for SpanRef<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized> Copy for SpanRef<'_, S> {}

/// Observes text replacement in a [`SpannableStringBuilder`].
///
/// All offsets are byte offsets. `before` and `after` are byte lengths of the replaced and
/// replacement text.
pub trait TextWatcher<S: ?Sized> {
    /// Called before `count` bytes at `start` are replaced with `after` bytes.
    fn before_text_changed(
        &mut self,
        _text: &SpannableStringBuilder<S>,
        _start: usize,
        _count: usize,
        _after: usize,
    ) {
    }

    /// Called once `before` bytes at `start` have been replaced with `count` bytes.
    fn on_text_changed(
        &mut self,
        _text: &SpannableStringBuilder<S>,
        _start: usize,
        _before: usize,
        _count: usize,
    ) {
    }

    /// Called after [`on_text_changed`](Self::on_text_changed) for the same edit.
    fn after_text_changed(&mut self, _text: &SpannableStringBuilder<S>) {}
}

/// Observes spans being attached, detached and moved in a [`SpannableStringBuilder`].
pub trait SpanWatcher<S: ?Sized> {
    /// Called when `span` is attached over `start..end`.
    fn on_span_added(
        &mut self,
        _text: &SpannableStringBuilder<S>,
        _span: SpanRef<'_, S>,
        _start: usize,
        _end: usize,
    ) {
    }

    /// Called when `span` is detached from `start..end`.
    fn on_span_removed(
        &mut self,
        _text: &SpannableStringBuilder<S>,
        _span: SpanRef<'_, S>,
        _start: usize,
        _end: usize,
    ) {
    }

    /// Called when `span` moves from `old_start..old_end` to `new_start..new_end`.
    fn on_span_changed(
        &mut self,
        _text: &SpannableStringBuilder<S>,
        _span: SpanRef<'_, S>,
        _old_start: usize,
        _old_end: usize,
        _new_start: usize,
        _new_end: usize,
    ) {
    }
}

struct WatcherEntry<W: ?Sized> {
    watcher: Weak<RefCell<W>>,
    priority: u8,
    order: usize,
}

/// Weakly held observers, ordered by descending priority then registration order.
pub(crate) struct WatcherList<W: ?Sized> {
    entries: Vec<WatcherEntry<W>>,
    next_order: usize,
}

impl<W: ?Sized> WatcherList<W> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_order: 0,
        }
    }

    pub(crate) fn add(&mut self, watcher: Weak<RefCell<W>>, priority: u8) {
        self.entries.push(WatcherEntry {
            watcher,
            priority,
            order: self.next_order,
        });
        self.next_order += 1;
        self.entries
            .sort_by(|a, b| b.priority.cmp(&a.priority).then(a.order.cmp(&b.order)));
    }

    pub(crate) fn remove(&mut self, watcher: &Weak<RefCell<W>>) {
        self.entries.retain(|e| !Weak::ptr_eq(&e.watcher, watcher));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Upgrades every live watcher, forgetting the dead ones.
    pub(crate) fn live(&mut self) -> Vec<Rc<RefCell<W>>> {
        self.entries.retain(|e| e.watcher.strong_count() > 0);
        self.entries
            .iter()
            .filter_map(|e| e.watcher.upgrade())
            .collect()
    }
}

impl<W: ?Sized> fmt::Debug for WatcherList<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatcherList")
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}

/// Invokes `f` on each watcher that is not already mutably borrowed.
pub(crate) fn dispatch<W: ?Sized>(watchers: &[Rc<RefCell<W>>], mut f: impl FnMut(&mut W)) {
    for watcher in watchers {
        match watcher.try_borrow_mut() {
            Ok(mut watcher) => f(&mut *watcher),
            Err(_) => log::warn!("skipping a watcher that is busy handling another notification"),
        }
    }
}
