//! Master-to-media playlist resolution.

use std::fmt;
use std::str::FromStr;

use m3u8_rs::{MasterPlaylist, Playlist, VariantStream};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ManifestError;
use crate::fetch::Transport;
use crate::manifest::types::{MediaManifest, SegmentRef};

/// Deterministic variant selection policy for master playlists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariantPolicy {
    /// Take the first listed variant (default).
    #[default]
    FirstListed,
    /// Take the variant with the highest declared bandwidth.
    HighestBandwidth,
}

impl fmt::Display for VariantPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantPolicy::FirstListed => write!(f, "first-listed"),
            VariantPolicy::HighestBandwidth => write!(f, "highest-bandwidth"),
        }
    }
}

impl FromStr for VariantPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first-listed" => Ok(VariantPolicy::FirstListed),
            "highest-bandwidth" => Ok(VariantPolicy::HighestBandwidth),
            _ => Err(format!("Unknown variant policy: {}", s)),
        }
    }
}

/// Resolve a manifest URL to a media playlist with absolute segment URLs.
///
/// A master playlist is followed through exactly one level of indirection:
/// one variant is selected per `policy`, its URI resolved against the master
/// URL, and the target fetched. A variant that itself turns out to be a
/// master playlist fails with [`ManifestError::NestedVariant`] rather than
/// recursing.
///
/// No retries here; retry policy belongs to the fetch stage and the caller.
pub async fn resolve(
    transport: &dyn Transport,
    url: &Url,
    policy: VariantPolicy,
) -> std::result::Result<MediaManifest, ManifestError> {
    match fetch_playlist(transport, url).await? {
        Playlist::MediaPlaylist(media) => build_media_manifest(url, &media),
        Playlist::MasterPlaylist(master) => {
            let variant = select_variant(&master, policy)?;
            let variant_url = resolve_uri(url, &variant.uri)?;
            tracing::debug!(
                "master playlist with {} variant(s), following {}",
                master.variants.len(),
                variant_url
            );

            match fetch_playlist(transport, &variant_url).await? {
                Playlist::MediaPlaylist(media) => build_media_manifest(&variant_url, &media),
                Playlist::MasterPlaylist(_) => Err(ManifestError::NestedVariant),
            }
        }
    }
}

/// Fetch and parse playlist text at `url`.
async fn fetch_playlist(
    transport: &dyn Transport,
    url: &Url,
) -> std::result::Result<Playlist, ManifestError> {
    let bytes = transport.get(url).await?;
    m3u8_rs::parse_playlist_res(&bytes).map_err(|e| ManifestError::ParseFailure(format!("{:?}", e)))
}

/// Pick one variant per policy. Both policies are deterministic.
fn select_variant(
    master: &MasterPlaylist,
    policy: VariantPolicy,
) -> std::result::Result<&VariantStream, ManifestError> {
    let selected = match policy {
        VariantPolicy::FirstListed => master.variants.first(),
        VariantPolicy::HighestBandwidth => master.variants.iter().max_by_key(|v| v.bandwidth),
    };
    selected.ok_or(ManifestError::NoVariants)
}

/// Absolutize every segment URI against the media playlist's own URL.
fn build_media_manifest(
    url: &Url,
    playlist: &m3u8_rs::MediaPlaylist,
) -> std::result::Result<MediaManifest, ManifestError> {
    if playlist.segments.is_empty() {
        return Err(ManifestError::NoSegments);
    }

    let mut segments = Vec::with_capacity(playlist.segments.len());
    for (index, segment) in playlist.segments.iter().enumerate() {
        segments.push(SegmentRef {
            index,
            url: resolve_uri(url, &segment.uri)?,
        });
    }

    Ok(MediaManifest {
        url: url.clone(),
        segments,
    })
}

/// Resolve a potentially relative URI against a base URL.
fn resolve_uri(base: &Url, uri: &str) -> std::result::Result<Url, ManifestError> {
    base.join(uri)
        .map_err(|e| ManifestError::ParseFailure(format!("bad URI '{}': {}", uri, e)))
}
