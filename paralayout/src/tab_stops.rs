// Copyright 2026 the Paralayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

/// The default distance between implicit tab stops, in pixels.
pub const TAB_INCREMENT: f32 = 20.0;

/// Explicit tab stops followed by evenly spaced implicit ones.
#[derive(Clone, Debug, PartialEq)]
pub struct TabStops {
    stops: Vec<f32>,
    increment: f32,
}

impl TabStops {
    /// Creates tab stops at `stops`, then every `increment` pixels past the last one.
    pub fn new(mut stops: Vec<f32>, increment: f32) -> Self {
        stops.sort_by(f32::total_cmp);
        Self {
            stops,
            increment: if increment > 0.0 {
                increment
            } else {
                TAB_INCREMENT
            },
        }
    }

    /// Returns the first tab stop strictly after `h`.
    pub fn next_tab(&self, h: f32) -> f32 {
        if let Some(&stop) = self.stops.iter().find(|&&stop| stop > h) {
            return stop;
        }
        ((h + self.increment) / self.increment).floor() * self.increment
    }

    /// The explicit stops, ascending.
    pub fn stops(&self) -> &[f32] {
        &self.stops
    }
}

impl Default for TabStops {
    fn default() -> Self {
        Self::new(Vec::new(), TAB_INCREMENT)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::TabStops;

    #[test]
    fn explicit_stops_come_first() {
        let stops = TabStops::new(vec![45.0, 15.0], 20.0);
        assert_eq!(stops.stops(), &[15.0, 45.0]);
        assert_eq!(stops.next_tab(0.0), 15.0);
        assert_eq!(stops.next_tab(15.0), 45.0);
        assert_eq!(stops.next_tab(45.0), 60.0, "past the explicit stops");
    }

    #[test]
    fn implicit_stops_are_strictly_after() {
        let stops = TabStops::default();
        assert_eq!(stops.next_tab(0.0), 20.0);
        assert_eq!(stops.next_tab(19.5), 20.0);
        assert_eq!(stops.next_tab(20.0), 40.0);
    }
}
