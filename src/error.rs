//! Error types for video generation.

use std::time::Duration;

/// Maximum length of a remote error body kept in an error message.
#[cfg(feature = "veo")]
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Broad category of a [`StillMotionError`].
///
/// Hosts branch on this instead of inspecting message text, e.g. mapping
/// [`ErrorKind::Credential`] to a re-authentication prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No credential available, or the service rejected it.
    Credential,
    /// The initial job submission failed.
    Submission,
    /// Re-fetching the job status failed.
    StatusCheck,
    /// The service finished the job but reported a failure.
    Generation,
    /// The job finished without a usable asset reference.
    MissingAsset,
    /// Fetching the generated binary failed.
    Download,
    /// The caller cancelled the operation.
    Cancelled,
    /// The configured deadline elapsed.
    Timeout,
    /// The caller supplied unusable input.
    InvalidInput,
    /// Local I/O or serialization failure.
    Io,
}

/// Errors that can occur while generating a video.
#[derive(Debug, thiserror::Error)]
pub enum StillMotionError {
    /// No API key is available from the credential provider.
    #[error("no credential available: {0}")]
    MissingCredential(String),

    /// The service rejected the API key (or could not find the entity it refers to).
    #[error("credential rejected: {0}")]
    InvalidCredential(String),

    /// Submitting the generation job failed.
    #[error("submission failed{}: {message}", status_suffix(.status))]
    Submission {
        /// HTTP status, if a response was received.
        status: Option<u16>,
        /// Sanitized error detail.
        message: String,
    },

    /// Polling the job status failed.
    #[error("status check failed{}: {message}", status_suffix(.status))]
    StatusCheck {
        /// HTTP status, if a response was received.
        status: Option<u16>,
        /// Sanitized error detail.
        message: String,
    },

    /// The job completed with an error reported by the service.
    #[error("video generation failed: {0}")]
    GenerationFailed(String),

    /// The generated video was removed by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// The job completed but no asset reference was returned.
    #[error("video generation completed but no video reference was returned")]
    MissingAsset,

    /// Fetching the generated video failed.
    #[error("download failed{}: {message}", status_suffix(.status))]
    Download {
        /// HTTP status, if a response was received.
        status: Option<u16>,
        /// Sanitized error detail.
        message: String,
    },

    /// The operation was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,

    /// The operation did not finish within the configured deadline.
    #[error("operation timed out after {0:?}")]
    DeadlineExceeded(Duration),

    /// Invalid request parameters.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl StillMotionError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential(_) | Self::InvalidCredential(_) => ErrorKind::Credential,
            Self::Submission { .. } => ErrorKind::Submission,
            Self::StatusCheck { .. } => ErrorKind::StatusCheck,
            Self::GenerationFailed(_) | Self::ContentBlocked(_) => ErrorKind::Generation,
            Self::MissingAsset => ErrorKind::MissingAsset,
            Self::Download { .. } => ErrorKind::Download,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::DeadlineExceeded(_) => ErrorKind::Timeout,
            Self::InvalidInput(_) | Self::Decode(_) => ErrorKind::InvalidInput,
            Self::Io(_) | Self::Json(_) => ErrorKind::Io,
        }
    }

    /// Returns true if the caller should ask the user for a (new) credential.
    pub fn is_credential_error(&self) -> bool {
        self.kind() == ErrorKind::Credential
    }
}

/// Result type alias for video generation operations.
pub type Result<T> = std::result::Result<T, StillMotionError>;

/// Collapses whitespace and caps the length of a remote error body.
#[cfg(feature = "veo")]
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return "no error details returned".to_string();
    }
    if collapsed.chars().count() <= MAX_ERROR_MESSAGE_LEN {
        return collapsed;
    }
    let truncated: String = collapsed.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
    format!("{truncated}...")
}

/// Renders a transport error without its URL, which may carry the API key.
#[cfg(feature = "veo")]
pub(crate) fn describe_transport_error(err: reqwest::Error) -> String {
    let err = err.without_url();
    if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}
