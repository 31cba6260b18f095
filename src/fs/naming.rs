//! Filename generation and manipulation.

use md5::{Digest, Md5};
use url::Url;

use crate::error::{Error, Result};
use crate::manifest::ManifestRef;

/// Validate and sanitize a filename by removing or replacing invalid characters.
///
/// Returns an error if the filename contains path traversal patterns.
pub fn sanitize_filename(name: &str) -> Result<String> {
    // Reject path traversal attempts
    if name.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(Error::InvalidFilename(format!(
            "Path separators not allowed in filename: '{}'",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed in filename: '{}'",
            name
        )));
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Err(Error::InvalidFilename(
            "Filename cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(sanitized)
}

/// Output file name for a manifest reference.
///
/// A caller-supplied label (already validated at the CLI boundary) is used
/// verbatim. Otherwise the name derives deterministically from the URL: its
/// last path segment minus the playlist extension, plus a short digest of
/// the full URL so distinct manifests sharing a stem never collide. The same
/// URL always maps to the same name, which is what makes re-runs land on the
/// same output file.
pub fn output_file_name(manifest_ref: &ManifestRef) -> String {
    match &manifest_ref.label {
        Some(label) => format!("{}.mp4", label),
        None => format!(
            "{}_{}.mp4",
            url_stem(&manifest_ref.url),
            url_digest(&manifest_ref.url)
        ),
    }
}

/// Best-effort stem from the URL's last path segment.
fn url_stem(url: &Url) -> String {
    let stem = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| s.trim_end_matches(".m3u8"))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| url.host_str().map(str::to_string))
        .unwrap_or_else(|| "stream".to_string());

    stem.chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' => c,
            _ => '_',
        })
        .collect()
}

/// First 8 hex chars of the URL's md5.
fn url_digest(url: &Url) -> String {
    let mut hasher = Md5::new();
    hasher.update(url.as_str().as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest_ref(url: &str) -> ManifestRef {
        ManifestRef::new(Url::parse(url).unwrap())
    }

    #[test]
    fn test_sanitize_filename_valid() {
        assert_eq!(sanitize_filename("normal.mp4").unwrap(), "normal.mp4");
        assert_eq!(sanitize_filename("file:name.mp4").unwrap(), "file_name.mp4");
    }

    #[test]
    fn test_sanitize_filename_path_traversal() {
        assert!(sanitize_filename("../etc/passwd").is_err());
        assert!(sanitize_filename("foo/../bar").is_err());
    }

    #[test]
    fn test_sanitize_filename_path_separators() {
        assert!(sanitize_filename("path/to/file.mp4").is_err());
        assert!(sanitize_filename("path\\to\\file.mp4").is_err());
    }

    #[test]
    fn test_sanitize_filename_empty() {
        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("   ").is_err());
    }

    #[test]
    fn test_output_name_is_deterministic() {
        let a = output_file_name(&manifest_ref("https://cdn.example.com/vod/playlist.m3u8"));
        let b = output_file_name(&manifest_ref("https://cdn.example.com/vod/playlist.m3u8"));
        assert_eq!(a, b);
        assert!(a.starts_with("playlist_"));
        assert!(a.ends_with(".mp4"));
    }

    #[test]
    fn test_output_name_distinguishes_urls_with_same_stem() {
        let a = output_file_name(&manifest_ref("https://one.example.com/vod/playlist.m3u8"));
        let b = output_file_name(&manifest_ref("https://two.example.com/vod/playlist.m3u8"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_output_name_uses_label_verbatim() {
        let r = ManifestRef::with_label(
            Url::parse("https://cdn.example.com/vod/playlist.m3u8").unwrap(),
            "sintel",
        );
        assert_eq!(output_file_name(&r), "sintel.mp4");
    }

    #[test]
    fn test_url_stem_falls_back_to_host() {
        let name = output_file_name(&manifest_ref("https://cdn.example.com/"));
        assert!(name.starts_with("cdn.example.com_"));
    }
}
