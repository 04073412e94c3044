// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Utility functions and types shared across tests.

mod asserts;

use std::rc::Rc;
use std::sync::Arc;

use paralayout::spannable::SpannableStringBuilder;
use paralayout::{TextPaint, TextSpan};
use paralayout_dev::MonospaceShaper;

pub(crate) use asserts::{assert_line_table_invariants, assert_matches_static};

/// Editable text carrying layout spans.
pub(crate) type Text = SpannableStringBuilder<dyn TextSpan>;

/// The paint every test measures with: 10 px per char, ascent -8 and descent 2.
pub(crate) fn paint() -> TextPaint {
    TextPaint::new(Arc::new(MonospaceShaper::new()), 10.0)
}

/// A paint whose CJK glyphs reach `extent` px beyond the font's ascent and descent.
pub(crate) fn tall_paint(extent: i32) -> TextPaint {
    TextPaint::new(Arc::new(MonospaceShaper::with_tall_glyphs(extent)), 10.0)
}

/// Type-erases a span for attaching it to [`Text`].
pub(crate) fn span(span: impl TextSpan + 'static) -> Rc<dyn TextSpan> {
    Rc::new(span)
}
