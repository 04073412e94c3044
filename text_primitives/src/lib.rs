// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fundamental text layout property types.
//!
//! This crate is a lightweight, `no_std` vocabulary layer shared by the span storage and the
//! paragraph layout crates: resolved directions, paragraph direction heuristics, alignment,
//! truncation modes and the few font attributes a paint carries.
//!
//! ## Features
//!
//! - `std` (enabled by default): This is currently unused and is provided for forward compatibility.
//!
//! ## Example
//!
//! ```
//! use text_primitives::{Alignment, Direction, TextDirectionHeuristic};
//!
//! assert_eq!(TextDirectionHeuristic::default(), TextDirectionHeuristic::FirstStrongLtr);
//! assert!(TextDirectionHeuristic::FirstStrongLtr.is_ltr_biased());
//! assert_eq!(Alignment::Normal.resolve(Direction::Rtl), Alignment::Right);
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

mod bidi;
mod font;
mod text;

pub use bidi::{Direction, TextDirectionHeuristic};
pub use font::{FontStyle, FontWeight};
pub use text::{Alignment, TruncateAt};
