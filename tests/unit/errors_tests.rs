/*!
 * Tests for error types
 */

use std::io;
use std::path::PathBuf;

use csvbridge::errors::{PipelineError, PipelineStage, ProviderError};

#[test]
fn test_providerError_retryability() {
    assert!(ProviderError::ConnectionError("reset".into()).is_retryable());
    assert!(ProviderError::RateLimitExceeded("quota".into()).is_retryable());
    assert!(ProviderError::CountMismatch { expected: 3, got: 2 }.is_retryable());
    assert!(ProviderError::ApiError {
        status_code: 502,
        message: String::new()
    }
    .is_retryable());
    assert!(!ProviderError::ApiError {
        status_code: 403,
        message: String::new()
    }
    .is_retryable());
    assert!(!ProviderError::Unavailable("gone".into()).is_retryable());
}

#[test]
fn test_pipelineError_display_shouldNameStageAndPath() {
    let err = PipelineError::io(
        PipelineStage::Convert,
        PathBuf::from("data/a.csv"),
        io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
    );

    assert_eq!(err.stage(), PipelineStage::Convert);
    assert_eq!(err.to_string(), "convert failed for data/a.csv: denied");
}

#[test]
fn test_pipelineError_replaceFailed_shouldReportReplaceStage() {
    let err = PipelineError::ReplaceFailed {
        path: PathBuf::from("a.csv"),
        source: io::Error::other("disk full"),
    };
    assert_eq!(err.stage(), PipelineStage::Replace);
    assert_eq!(PipelineStage::ConvertBack.to_string(), "convert-back");
}
