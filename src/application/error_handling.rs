// src/application/error_handling.rs
//
// Error Handling for Commands
//
// ARCHITECTURE:
// - Maps internal errors → user-facing responses
// - Provides a consistent error shape for `--json` output
// - Every category has a stable process exit code
// - Logs errors for debugging

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Standard error response for the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error_type: ErrorType,
    pub message: String,
    pub details: Option<String>,
}

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// No map or token with that name
    NotFound,

    /// Name already taken
    Conflict,

    /// Invalid input or invariant violation
    Validation,

    /// Downloaded video could not be decoded
    CorruptMedia,

    /// Catalog file could not be written
    Persistence,

    /// libav failure
    Decoder,

    /// Bad or unreadable config
    Config,

    /// File system error
    FileSystem,

    /// Other/unknown error
    Internal,
}

impl ErrorType {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorType::NotFound => 2,
            ErrorType::Conflict => 3,
            ErrorType::Validation => 4,
            ErrorType::CorruptMedia => 5,
            ErrorType::Persistence => 6,
            ErrorType::Decoder => 7,
            ErrorType::Config => 8,
            ErrorType::FileSystem => 9,
            ErrorType::Internal => 1,
        }
    }
}

impl ErrorResponse {
    /// Create error response from AppError
    pub fn from_app_error(error: &AppError) -> Self {
        match error {
            AppError::NotFound(name) => Self::new(
                ErrorType::NotFound,
                format!("{} not found", name),
                None,
            ),

            AppError::AlreadyExists(name) => Self::new(
                ErrorType::Conflict,
                format!("{} already exists", name),
                None,
            ),

            AppError::CorruptMedia { path, reason } => Self::new(
                ErrorType::CorruptMedia,
                format!("{} could not be decoded and was deleted", path.display()),
                Some(reason.clone()),
            ),

            AppError::Domain(domain_error) => Self::new(
                ErrorType::Validation,
                "Validation failed".to_string(),
                Some(domain_error.to_string()),
            ),

            AppError::Persistence(reason) => {
                log::error!("Persistence error: {}", reason);
                Self::new(
                    ErrorType::Persistence,
                    "Catalog could not be saved; nothing was changed".to_string(),
                    Some(reason.clone()),
                )
            }

            AppError::Decoder(reason) => Self::new(
                ErrorType::Decoder,
                "Video decoding failed".to_string(),
                Some(reason.clone()),
            ),

            AppError::Config(reason) => Self::new(
                ErrorType::Config,
                "Invalid configuration".to_string(),
                Some(reason.clone()),
            ),

            AppError::Io(io_error) => {
                log::error!("IO error: {:?}", io_error);
                Self::new(
                    ErrorType::FileSystem,
                    "File system operation failed".to_string(),
                    Some(io_error.to_string()),
                )
            }

            AppError::Image(image_error) => Self::new(
                ErrorType::FileSystem,
                "Image could not be read or written".to_string(),
                Some(image_error.to_string()),
            ),

            AppError::Serialization(serde_error) => {
                log::error!("Serialization error: {:?}", serde_error);
                Self::new(
                    ErrorType::Internal,
                    "Data serialization failed".to_string(),
                    Some(serde_error.to_string()),
                )
            }

            AppError::Other(message) => {
                log::error!("Other error: {}", message);
                Self::new(ErrorType::Internal, message.clone(), None)
            }
        }
    }

    /// Create validation error
    pub fn validation(message: String) -> Self {
        Self::new(ErrorType::Validation, message, None)
    }

    pub fn exit_code(&self) -> i32 {
        self.error_type.exit_code()
    }

    fn new(error_type: ErrorType, message: String, details: Option<String>) -> Self {
        Self {
            success: false,
            error_type,
            message,
            details,
        }
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{} ({})", self.message, details),
            None => write!(f, "{}", self.message),
        }
    }
}
