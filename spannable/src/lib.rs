// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mutable text with attached spans.
//!
//! [`SpannableStringBuilder`] stores its characters in a gap buffer and its spans in parallel
//! arrays sorted by start offset, which double as an implicit, array-backed interval tree.
//! Overlap queries, transition searches and edits all stay logarithmic-ish in the span count
//! while keeping span endpoints consistent under insertion and deletion according to each
//! span's [`SpanFlags`].
//!
//! Spans are reference counted objects of type `S` (often a trait object). A span is identified
//! by the address of its allocation, so the same `Rc` can be moved around freely with
//! [`SpannableStringBuilder::set_span`], while two equal but distinct spans never alias.
//!
//! Observers are registered as weak references: [`TextWatcher`]s hear about text replacement and
//! [`SpanWatcher`]s about spans being added, removed or moved. A watcher that has been dropped is
//! pruned on the next notification.
//!
//! ## Features
//!
//! - `std` (enabled by default): This is currently unused and is provided for forward compatibility.
//!
//! ## Example
//!
//! ```
//! use std::rc::Rc;
//! use spannable::{SpanFlags, Spanned, SpannableStringBuilder, TextStorage};
//!
//! let mut text = SpannableStringBuilder::<str>::from_text("Hello world");
//! let bold: Rc<str> = Rc::from("bold");
//! text.set_span(bold.clone(), 6..11, SpanFlags::EXCLUSIVE_EXCLUSIVE).unwrap();
//!
//! text.insert(0, ">> ").unwrap();
//! assert_eq!(text.span_start(&bold), Some(9));
//! assert_eq!(text.span_end(&bold), Some(14));
//! assert_eq!(text.to_string(), ">> Hello world");
//! assert_eq!(text.char_at(3), Some('H'));
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
#![no_std]

extern crate alloc;

mod builder;
mod error;
mod filter;
mod flags;
mod spanned;
mod spanned_string;
mod text_range;
mod text_storage;
mod watcher;

pub use crate::builder::SpannableStringBuilder;
pub use crate::error::{BoundaryInfo, Endpoint, Error, ErrorKind};
pub use crate::filter::{InputFilter, LengthFilter};
pub use crate::flags::SpanFlags;
pub use crate::spanned::Spanned;
pub use crate::spanned_string::SpannedString;
pub use crate::text_range::{TextRange, is_paragraph_boundary};
pub use crate::text_storage::TextStorage;
pub use crate::watcher::{SpanRef, SpanWatcher, TextWatcher};
