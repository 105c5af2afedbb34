//! Test utilities and fixtures for ARW development.
//!
//! Provides a [`RecordingObserver`] that keeps every progress event,
//! small graph fixtures, and deliberately broken firing rules in
//! [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use arw_core::{Progress, ProgressObserver};

/// Observer that records every event it receives.
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver {
    pub events: Vec<Progress>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exploration events only.
    pub fn exploring(&self) -> impl Iterator<Item = &Progress> {
        self.events
            .iter()
            .filter(|p| matches!(p, Progress::Exploring { .. }))
    }

    /// Solver events only.
    pub fn solving(&self) -> impl Iterator<Item = &Progress> {
        self.events
            .iter()
            .filter(|p| matches!(p, Progress::Solving { .. }))
    }
}

impl ProgressObserver for RecordingObserver {
    fn notify(&mut self, progress: Progress) {
        self.events.push(progress);
    }
}

/// Largest absolute difference between two equally long vectors.
///
/// # Panics
///
/// Panics if the lengths differ.
pub fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "length mismatch");
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}
