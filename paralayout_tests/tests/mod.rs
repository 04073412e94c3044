// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This crate contains the integration test suite for `paralayout`.
//!
//! - The `util` module contains shared utility functions that are needed by different
//!   test methods.
//! - We do not use the default Rust test harness, but instead use this `mod.rs` file as the
//!   entry point to run all other tests. This makes it easier to share utility functions
//!   between test modules.
//! - If you want to add new tests, try to follow these guidelines:
//!   - If your test can be classified to a clear "topic" (e.g. ellipsis, dynamic, etc.), put
//!     it into the corresponding module, or create a new one in case it doesn't exist yet.
//!   - If it cannot be classified cleanly, put it into `basic.rs`.
//!   - For test naming, put the "topic" of the test at the start of the name instead of
//!     the end. For example, `ellipsis_start_keeps_tail` is better than
//!     `keeps_tail_with_start_ellipsis`.

#![allow(missing_docs, reason = "we don't need docs for testing")]
#![allow(clippy::cast_possible_truncation, reason = "not critical for testing")]

mod basic;
mod dynamic;
mod ellipsis;
mod span_storage;
mod styles;
mod util;
