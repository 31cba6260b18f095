//! Manifest resolution.
//!
//! This module provides:
//! - Manifest and segment data types
//! - Master-to-media playlist resolution with variant selection

pub mod resolver;
pub mod types;

pub use resolver::{resolve, VariantPolicy};
pub use types::{ManifestRef, MediaManifest, SegmentRef};
