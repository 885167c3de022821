//! Manifest fragment extraction.
//!
//! Scans manifest text for fragment markers and returns their identifiers in
//! order of appearance. Duplicates are kept; nothing is sorted.

mod pattern;

pub use pattern::{FragmentPattern, MarkerPattern};

use crate::error::PipelineError;

/// Identifier of one fragment in the origin's addressing scheme (a timestamp
/// token). Not contiguous, not zero-based, not necessarily unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId(u64);

impl FragmentId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Parses a run of ASCII digits.
    pub fn from_digits(digits: &str) -> Result<Self, PipelineError> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PipelineError::FragmentIdOverflow(digits.to_string()));
        }
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| PipelineError::FragmentIdOverflow(digits.to_string()))
    }
}

impl std::fmt::Display for FragmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decodes raw manifest bytes as UTF-8. Undecodable input is fatal.
pub fn decode(bytes: &[u8]) -> Result<&str, PipelineError> {
    std::str::from_utf8(bytes).map_err(PipelineError::ManifestDecode)
}

/// Extracts fragment identifiers from manifest text using `pattern`.
///
/// An empty result is `PipelineError::NoFragments`: the manifest was fetched
/// but is malformed or of an unknown dialect.
pub fn extract_fragments(
    text: &str,
    pattern: &dyn FragmentPattern,
) -> Result<Vec<FragmentId>, PipelineError> {
    let ids = pattern
        .scan(text)
        .into_iter()
        .map(FragmentId::from_digits)
        .collect::<Result<Vec<_>, _>>()?;
    if ids.is_empty() {
        return Err(PipelineError::NoFragments);
    }
    tracing::debug!(count = ids.len(), pattern = pattern.name(), "extracted fragment identifiers");
    Ok(ids)
}

/// Decode + extract in one step with the Smooth Streaming marker rule.
pub fn extract_from_bytes(bytes: &[u8]) -> Result<Vec<FragmentId>, PipelineError> {
    extract_fragments(decode(bytes)?, &MarkerPattern::smooth_streaming())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[u64]) -> Vec<FragmentId> {
        v.iter().copied().map(FragmentId::new).collect()
    }

    #[test]
    fn preserves_order_and_duplicates() {
        let text = "\
#EXTM3U
#EXTINF:2.000000,
QualityLevels(3449984)/Fragments(video=10,format=m3u8-aapl-v3,audiotrack=english)
#EXTINF:2.000000,
QualityLevels(3449984)/Fragments(video=7,format=m3u8-aapl-v3,audiotrack=english)
#EXT-X-DISCONTINUITY
QualityLevels(3449984)/Fragments(video=10,format=m3u8-aapl-v3,audiotrack=english)
#EXT-X-ENDLIST
";
        let got = extract_from_bytes(text.as_bytes()).unwrap();
        assert_eq!(got, ids(&[10, 7, 10]));
    }

    #[test]
    fn non_contiguous_large_timestamps() {
        let text = "Fragments(video=0,format=x)\nFragments(video=20020000,format=x)\nFragments(video=40040000,format=x)";
        let got = extract_from_bytes(text.as_bytes()).unwrap();
        assert_eq!(got, ids(&[0, 20_020_000, 40_040_000]));
    }

    #[test]
    fn markers_on_one_line() {
        let text = "video=3,format=a video=1,format=b video=2,format=c";
        assert_eq!(extract_from_bytes(text.as_bytes()).unwrap(), ids(&[3, 1, 2]));
    }

    #[test]
    fn no_markers_is_distinct_error() {
        let text = "#EXTM3U\n#EXT-X-ENDLIST\n";
        assert!(matches!(
            extract_from_bytes(text.as_bytes()),
            Err(PipelineError::NoFragments)
        ));
        assert!(matches!(extract_from_bytes(b""), Err(PipelineError::NoFragments)));
    }

    #[test]
    fn marker_without_format_suffix_is_ignored() {
        let text = "video=5,bitrate=1 video=6,format=x";
        assert_eq!(extract_from_bytes(text.as_bytes()).unwrap(), ids(&[6]));
    }

    #[test]
    fn undecodable_bytes_fail() {
        let bytes = [0x76, 0x69, 0xff, 0xfe];
        assert!(matches!(
            extract_from_bytes(&bytes),
            Err(PipelineError::ManifestDecode(_))
        ));
    }

    #[test]
    fn overflowing_identifier_fails() {
        let text = "video=99999999999999999999999,format=x";
        assert!(matches!(
            extract_from_bytes(text.as_bytes()),
            Err(PipelineError::FragmentIdOverflow(_))
        ));
    }

    #[test]
    fn from_digits_rejects_non_digits() {
        assert!(FragmentId::from_digits("").is_err());
        assert!(FragmentId::from_digits("12a").is_err());
        assert_eq!(FragmentId::from_digits("42").unwrap(), FragmentId::new(42));
    }
}
