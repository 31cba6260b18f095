//! Pipeline orchestration.
//!
//! This module provides:
//! - Per-URL outcome and batch statistics types
//! - The orchestrator composing resolve → fetch → assemble

pub mod outcome;
pub mod runner;

pub use outcome::{BatchStats, PipelineOutcome, Stage, StageFailure};
pub use runner::{Pipeline, PipelineOptions};
