/*!
 * Error types for the csvbridge application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when calling a translation capability
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// The capability returned a different number of texts than it was given
    #[error("Translation count mismatch: expected {expected}, got {got}")]
    CountMismatch {
        /// Number of texts sent
        expected: usize,
        /// Number of texts returned
        got: usize,
    },

    /// The capability is not usable at all (disabled, misconfigured)
    #[error("Translator unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    /// Whether another attempt against the same capability can succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_)
            | Self::ParseError(_)
            | Self::ConnectionError(_)
            | Self::RateLimitExceeded(_)
            | Self::CountMismatch { .. } => true,
            Self::ApiError { status_code, .. } => {
                *status_code == 429 || *status_code == 408 || *status_code >= 500
            }
            Self::Unavailable(_) => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else if let Some(status) = error.status() {
            Self::ApiError {
                status_code: status.as_u16(),
                message: error.to_string(),
            }
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors raised while reading or writing delimited rows
#[derive(Error, Debug)]
pub enum CodecError {
    /// The CSV reader or writer failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The serialised buffer was not valid UTF-8
    #[error("Invalid UTF-8 in serialised rows: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The CSV writer could not be flushed into its buffer
    #[error("Failed to finish CSV output: {0}")]
    Flush(String),
}

/// Stage of the per-file pipeline at which a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Whole-file encoding detection
    Detect,
    /// Source to UTF-8 intermediate conversion
    Convert,
    /// Target-script check on the decoded text
    ScriptCheck,
    /// Resumable translation pass
    Translate,
    /// Conversion into the canonical output encoding
    ConvertBack,
    /// Atomic replacement of the original file
    Replace,
    /// Removal of intermediate files
    Cleanup,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Detect => "detect",
            Self::Convert => "convert",
            Self::ScriptCheck => "script-check",
            Self::Translate => "translate",
            Self::ConvertBack => "convert-back",
            Self::Replace => "replace",
            Self::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// Failure of one file's pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// File system failure
    #[error("{stage} failed for {path}: {source}")]
    Io {
        /// Stage that failed
        stage: PipelineStage,
        /// File being processed
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: std::io::Error,
    },

    /// Row parsing or serialisation failure
    #[error("{stage} failed for {path}: {source}")]
    Codec {
        /// Stage that failed
        stage: PipelineStage,
        /// File being processed
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: CodecError,
    },

    /// The final rename over the original failed; the original is still in place
    #[error("failed to replace {path}: {source}")]
    ReplaceFailed {
        /// File being processed
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Build an I/O failure for `path` at `stage`
    pub fn io(stage: PipelineStage, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            stage,
            path: path.into(),
            source,
        }
    }

    /// Build a codec failure for `path` at `stage`
    pub fn codec(stage: PipelineStage, path: impl Into<PathBuf>, source: CodecError) -> Self {
        Self::Codec {
            stage,
            path: path.into(),
            source,
        }
    }

    /// Stage the failure belongs to
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::Io { stage, .. } | Self::Codec { stage, .. } => *stage,
            Self::ReplaceFailed { .. } => PipelineStage::Replace,
        }
    }
}
