//! Manifest and segment data types.

use url::Url;

/// A manifest URL submitted to the pipeline.
#[derive(Debug, Clone)]
pub struct ManifestRef {
    /// Absolute HTTP(S) URL of the top-level manifest.
    pub url: Url,

    /// Optional caller-supplied name for the output file. When absent the
    /// output name is derived from the URL.
    pub label: Option<String>,
}

impl ManifestRef {
    /// Create a manifest reference with no label.
    pub fn new(url: Url) -> Self {
        Self { url, label: None }
    }

    /// Create a manifest reference with a caller-supplied output label.
    pub fn with_label(url: Url, label: impl Into<String>) -> Self {
        Self {
            url,
            label: Some(label.into()),
        }
    }
}

/// One media segment referenced by a media playlist.
#[derive(Debug, Clone)]
pub struct SegmentRef {
    /// 0-based position in the playlist. Defines playback and
    /// concatenation order; preserved through every pipeline stage.
    pub index: usize,

    /// Absolute segment URL, already resolved against the media
    /// playlist's own base URL.
    pub url: Url,
}

/// A resolved media playlist with absolute segment URLs.
#[derive(Debug, Clone)]
pub struct MediaManifest {
    /// URL the media playlist was fetched from.
    pub url: Url,

    /// Segments in playlist order. Non-empty; indices are contiguous
    /// starting at 0.
    pub segments: Vec<SegmentRef>,
}

impl MediaManifest {
    /// Number of segments declared by the playlist.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}
