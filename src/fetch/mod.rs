//! Segment fetching.
//!
//! This module provides:
//! - The `Transport` capability trait and its reqwest-backed implementation
//! - Concurrent, retry-bounded segment downloading

pub mod client;
pub mod segments;

pub use client::{HttpClient, Transport};
pub use segments::{fetch_all, FetchOptions, FetchedSegment, SegmentFailure};
