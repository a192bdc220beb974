use thiserror::Error;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("No screenshot stored for user: {user_id}")]
    ScreenshotNotFound { user_id: String },

    #[error("Invalid screenshot: {reason}")]
    InvalidAssetFormat { reason: String },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl DomainError {
    pub fn user_not_found(user_id: impl Into<String>) -> Self {
        Self::UserNotFound {
            user_id: user_id.into(),
        }
    }

    pub fn screenshot_not_found(user_id: impl Into<String>) -> Self {
        Self::ScreenshotNotFound {
            user_id: user_id.into(),
        }
    }

    pub fn invalid_asset_format(reason: impl Into<String>) -> Self {
        Self::InvalidAssetFormat {
            reason: reason.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for DomainError {
    fn from(e: anyhow::Error) -> Self {
        // {:#} keeps the context chain in one line
        Self::storage(format!("{e:#}"))
    }
}
