// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Paralayout Dev
//!
//! This crate provides utilities for developing Paralayout: a deterministic shaper, a canvas
//! that records what is drawn, simple span styles and text samples.

mod canvas;
mod samples;
mod shaper;
mod spans;

pub use canvas::{DrawOp, RecordingCanvas};
pub use samples::{Sample, TextSamples};
pub use shaper::MonospaceShaper;
pub use spans::{
    AlignSpan, BackgroundColor, Indent, InlineBox, LineBackground, SizeSpan, TabStop, Underline,
};
