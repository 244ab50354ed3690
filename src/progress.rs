//! Progress reporting.

use std::panic::{catch_unwind, AssertUnwindSafe};

/// A step of the generation workflow, reported to a [`ProgressSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The job was accepted by the service.
    Submitted,
    /// The job is still running; `check` counts from 1.
    Checking {
        /// Number of this status check.
        check: u32,
    },
    /// The job finished and the video is being downloaded.
    Downloading,
}

impl std::fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submitted => write!(f, "Request sent. Generating video, this can take a few minutes..."),
            Self::Checking { check } => write!(f, "Still generating... (check #{check})"),
            Self::Downloading => write!(f, "Generation complete, downloading video..."),
        }
    }
}

/// Receives progress events. Purely observational.
pub trait ProgressSink: Send + Sync {
    /// Called once per event.
    fn report(&self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn report(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// A sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _event: &ProgressEvent) {}
}

/// Forwards `event` to `sink`, containing any panic so it cannot abort the caller.
pub(crate) fn report_isolated(sink: &dyn ProgressSink, event: ProgressEvent) {
    if catch_unwind(AssertUnwindSafe(|| sink.report(&event))).is_err() {
        tracing::warn!(?event, "progress sink panicked, event dropped");
    }
}
