//! Error types: per-request fetch failures and run-level pipeline failures.

use thiserror::Error;

use crate::manifest::FragmentId;

/// Error returned by a single HTTP GET (manifest or fragment).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error("{0}")]
    Curl(#[source] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Writing the response body to disk failed.
    #[error("storage: {0}")]
    Storage(#[source] std::io::Error),
    /// A repeated plan entry whose first occurrence failed.
    #[error("earlier occurrence failed: {0}")]
    EarlierFailure(String),
    /// The transfer was stopped by the abort token.
    #[error("transfer aborted")]
    Aborted,
}

/// Run-level failures. Anything here stops the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("manifest URL must be an http(s) URL ending in .ism: {0}")]
    InvalidManifestUrl(String),

    #[error("manifest fetch failed: {0}")]
    ManifestFetch(#[source] FetchError),

    #[error("manifest is not valid UTF-8 text")]
    ManifestDecode(#[source] std::str::Utf8Error),

    #[error("manifest contains no fragment references")]
    NoFragments,

    #[error("fragment identifier out of range: {0}")]
    FragmentIdOverflow(String),

    #[error("concatenation list is malformed at line {line}: {reason}")]
    MalformedList { line: usize, reason: String },

    #[error("{failed} of {total} fragments failed to download (first: fragment {first_id}: {first_error})")]
    FragmentsFailed {
        failed: usize,
        total: usize,
        first_id: FragmentId,
        first_error: String,
    },

    #[error("could not start muxer {program}: {source}")]
    MuxerSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("muxer exited with {}", .code.map(|c| format!("status {}", c)).unwrap_or_else(|| "a signal".to_string()))]
    MuxerFailed { code: Option<i32> },

    #[error("run cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn muxer_failed_display_with_code() {
        let e = PipelineError::MuxerFailed { code: Some(1) };
        assert_eq!(e.to_string(), "muxer exited with status 1");
    }

    #[test]
    fn muxer_failed_display_without_code() {
        let e = PipelineError::MuxerFailed { code: None };
        assert_eq!(e.to_string(), "muxer exited with a signal");
    }

    #[test]
    fn fetch_error_http_display() {
        assert_eq!(FetchError::Http(404).to_string(), "HTTP 404");
    }

    #[test]
    fn cancelled_downcasts_through_anyhow() {
        let err = anyhow::Error::new(PipelineError::Cancelled).context("fetch stage");
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Cancelled)
        ));
    }
}
