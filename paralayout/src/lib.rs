// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paragraph layout for styled, bidirectional and editable text.
//!
//! Text is laid out into a table of lines by one of three layouts:
//!
//! - [`StaticLayout`] breaks text that will not change, paragraph by paragraph.
//! - [`DynamicLayout`] follows edits to a [`SpannableStringBuilder`](spannable::SpannableStringBuilder)
//!   and only lays out again the paragraphs an edit touched.
//! - [`BoringLayout`] is a fast path for a single line of plain left-to-right text.
//!
//! All three implement [`Layout`], which answers geometry queries from the line table and
//! draws onto a [`Canvas`]. Measuring is delegated to a [`TextShaper`] carried by the
//! [`TextPaint`]. Styles are attached to the text as [`TextSpan`]s.
//!
//! All offsets are UTF-8 byte offsets into the laid out text.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use paralayout::{FontMetrics, Layout, RunMetrics, StaticLayout, TextPaint, TextShaper};
//!
//! /// Every character is as wide as the font size.
//! struct Mono;
//!
//! impl TextShaper for Mono {
//!     fn font_metrics(&self, _paint: &TextPaint) -> FontMetrics {
//!         FontMetrics { top: -10, ascent: -8, descent: 2, bottom: 3, leading: 0 }
//!     }
//!
//!     fn measure(&self, text: &str, _rtl: bool, paint: &TextPaint, advances: &mut [f32]) -> RunMetrics {
//!         advances.fill(0.0);
//!         for (i, _) in text.char_indices() {
//!             advances[i] = paint.size;
//!         }
//!         RunMetrics { advance: advances.iter().sum(), ascent: -8, descent: 2 }
//!     }
//! }
//!
//! let paint = TextPaint::new(Arc::new(Mono), 10.0);
//! let text = "hello world";
//! let layout = StaticLayout::builder(&text, 0..text.len(), &paint, 60)
//!     .unwrap()
//!     .include_pad(false)
//!     .build();
//! assert_eq!(layout.line_count(), 2);
//! assert_eq!(layout.line_start(1), 6);
//! assert_eq!(layout.height(), 20);
//! ```
// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

pub use spannable;
pub use text_primitives;

mod bidi;
mod blocks;
mod boring;
mod canvas;
mod context;
mod directions;
mod dynamic_layout;
mod ellipsize;
mod layout;
mod line_breaker;
mod measured_paragraph;
mod measured_text;
mod paint;
mod span;
mod static_layout;
mod tab_stops;
mod text_line;

pub use bidi::{could_affect_rtl, needs_bidi, resolve_direction, text_could_affect_rtl};
pub use blocks::{BLOCK_MINIMUM_CHARACTER_LENGTH, INVALID_BLOCK_INDEX};
pub use boring::{BoringLayout, BoringMetrics, is_boring};
pub use canvas::{Canvas, Rect};
pub use context::LayoutContext;
pub use directions::{BidiRun, Directions, RunIter};
pub use dynamic_layout::{DynamicBuilder, DynamicLayout};
pub use ellipsize::{ELLIPSIS_FILLER, ellipsize};
pub use layout::{Layout, LineEntry};
pub use line_breaker::{
    BrokenLine, LineBreakResult, LineBreaker, ParagraphConstraints, is_line_end_space,
};
pub use measured_paragraph::MeasuredParagraph;
pub use measured_text::{MeasuredRun, MeasuredText, RunKind};
pub use paint::{DecorationMetrics, FontMetrics, RunMetrics, TextPaint, TextShaper};
pub use span::{
    CharacterStyle, LeadingMarginSpan, LineBackgroundSpan, MetricAffectingSpan, ReplacementSpan,
    StyledText, TextSpan,
};
pub use static_layout::{StaticBuilder, StaticLayout};
pub use tab_stops::{TAB_INCREMENT, TabStops};
pub use text_line::{ELLIPSIS, TextLine};

pub use spannable::Error;
pub use text_primitives::{Alignment, Direction, TextDirectionHeuristic, TruncateAt};
