// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// A sample to be used for development.
#[derive(Debug)]
pub struct Sample {
    /// The name of the sample.
    pub name: &'static str,
    /// The text of the sample.
    pub text: &'static str,
}

/// A collection of text samples.
#[derive(Debug)]
pub struct TextSamples {
    /// Several paragraphs of left-to-right text.
    pub latin: Sample,
    /// Right-to-left paragraphs with embedded numbers.
    pub hebrew: Sample,
    /// A left-to-right paragraph with embedded right-to-left words.
    pub mixed: Sample,
}

impl TextSamples {
    /// Creates a new collection of text samples.
    pub const fn new() -> Self {
        let latin = include_str!("../assets/text_samples/latin.txt");
        let hebrew = include_str!("../assets/text_samples/hebrew.txt");
        let mixed = include_str!("../assets/text_samples/mixed.txt");
        Self {
            latin: Sample {
                name: "latin",
                text: latin,
            },
            hebrew: Sample {
                name: "hebrew",
                text: hebrew,
            },
            mixed: Sample {
                name: "mixed",
                text: mixed,
            },
        }
    }
}

impl Default for TextSamples {
    fn default() -> Self {
        Self::new()
    }
}
