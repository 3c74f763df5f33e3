//! Run state machine

use serde::Serialize;
use std::fmt;

/// Stage of a pipeline run
///
/// A run walks the stages in declaration order up to `Done`. Any failure
/// moves it to `Error`, which it never leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Extracting,
    PreservingRaw,
    Cleaning,
    PublishingCurated,
    PublishingAnalytics,
    RecordingMetadata,
    Done,
    Error,
}

impl PipelineState {
    /// The stage every run starts in
    pub const INITIAL: PipelineState = PipelineState::Extracting;

    /// Successor on success; `None` for terminal states
    pub fn next(self) -> Option<Self> {
        use PipelineState::*;
        match self {
            Extracting => Some(PreservingRaw),
            PreservingRaw => Some(Cleaning),
            Cleaning => Some(PublishingCurated),
            PublishingCurated => Some(PublishingAnalytics),
            PublishingAnalytics => Some(RecordingMetadata),
            RecordingMetadata => Some(Done),
            Done | Error => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Extracting => "EXTRACTING",
            PipelineState::PreservingRaw => "PRESERVING_RAW",
            PipelineState::Cleaning => "CLEANING",
            PipelineState::PublishingCurated => "PUBLISHING_CURATED",
            PipelineState::PublishingAnalytics => "PUBLISHING_ANALYTICS",
            PipelineState::RecordingMetadata => "RECORDING_METADATA",
            PipelineState::Done => "DONE",
            PipelineState::Error => "ERROR",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
