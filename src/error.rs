//! Error types for aidiary

use std::path::PathBuf;
use thiserror::Error;

/// Outcome of a failed remote transformation.
///
/// Exactly one of these is produced per failed attempt; the client never retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformFailure {
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Remote service returned {status_code}: {body}")]
    RemoteError { status_code: u16, body: String },

    #[error("Unexpected response: {message}")]
    Protocol { message: String },
}

impl TransformFailure {
    /// Short label shown to the user in a transient notice
    pub fn category(&self) -> &'static str {
        match self {
            TransformFailure::Network { .. } => "network error",
            TransformFailure::RemoteError { .. } => "remote service error",
            TransformFailure::Protocol { .. } => "unexpected response",
        }
    }
}

/// Main error type for aidiary
#[derive(Debug, Error)]
pub enum DiaryError {
    #[error("Not an aidiary directory: {0}")]
    NotDiaryDirectory(PathBuf),

    #[error("Entry text is empty")]
    EmptyInput,

    #[error("Entry {0} is already being transformed")]
    Busy(usize),

    #[error("Entry {0} is not awaiting input")]
    NotAwaitingInput(usize),

    #[error("Entry index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Failed to transform text: {0}")]
    Transform(#[from] TransformFailure),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl DiaryError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            DiaryError::NotDiaryDirectory(_) => 2,
            DiaryError::EmptyInput => 3,
            DiaryError::Busy(_) | DiaryError::NotAwaitingInput(_) => 4,
            DiaryError::Transform(_) => 5,
            _ => 1,
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn display_with_suggestions(&self) -> String {
        match self {
            DiaryError::NotDiaryDirectory(path) => {
                format!(
                    "Not an aidiary directory: {}\n\n\
                    Suggestions:\n\
                    • Run 'aidiary init' in this directory to create a new diary\n\
                    • Navigate to an existing aidiary directory\n\
                    • Set AIDIARY_ROOT environment variable to your diary path",
                    path.display()
                )
            }
            DiaryError::NotAwaitingInput(_) => {
                format!(
                    "{}\n\n\
                    Today's entry has already been written.\n\
                    Use 'aidiary list' to read it.",
                    self
                )
            }
            DiaryError::Transform(failure) => match failure {
                TransformFailure::RemoteError { status_code, .. }
                    if *status_code == 401 || *status_code == 403 =>
                {
                    format!(
                        "{}\n\n\
                        Suggestions:\n\
                        • Set AIDIARY_API_KEY environment variable to a valid key\n\
                        • Configure the key: aidiary config api_key <KEY>",
                        self
                    )
                }
                TransformFailure::Network { .. } => {
                    format!(
                        "{}\n\n\
                        Suggestions:\n\
                        • Check your network connection\n\
                        • Check the endpoint: aidiary config endpoint",
                        self
                    )
                }
                _ => self.to_string(),
            },
            DiaryError::Config(msg) if msg.contains("Unknown config key") => {
                format!(
                    "{}\n\n\
                    Example: aidiary config max_tokens 16",
                    msg
                )
            }
            DiaryError::Config(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

/// Result type using DiaryError
pub type Result<T> = std::result::Result<T, DiaryError>;
