use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum RosterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Document rendering failed: {0}")]
    Render(String),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Backend request failed: {0}")]
    Backend(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Classification of errors for logging and user display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Caused by user input (e.g. an unusable field selection).
    UserError,
    /// The hosted backend failed or was unreachable.
    BackendError,
    /// Document generation or file output failed.
    SystemError,
    /// Invalid or missing configuration.
    ConfigError,
}

impl RosterError {
    /// Returns the broad error category for routing and display purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::ConfigError,
            Self::Export(_) => ErrorCategory::UserError,
            Self::Render(_) => ErrorCategory::SystemError,
            Self::FileSystem(_) => ErrorCategory::SystemError,
            Self::Backend(_) => ErrorCategory::BackendError,
            Self::Internal(_) => ErrorCategory::SystemError,
        }
    }

    /// Returns a user-friendly message (hides internal details).
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(msg) => format!("Configuration issue: {msg}"),
            Self::Export(msg) => format!("Export failed: {msg}"),
            Self::Render(msg) => format!("Could not generate the document: {msg}"),
            Self::FileSystem(msg) => format!("File error: {msg}"),
            Self::Backend(_) => "Could not load voter data. Please try again.".into(),
            Self::Internal(_) => "An unexpected error occurred.".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Error classification for anyhow::Error (message-pattern based)
// ---------------------------------------------------------------------------

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Non-critical, log only.
    Low,
    /// Show to user, recoverable.
    Medium,
    /// Operation failed.
    High,
    /// App may be unstable.
    Critical,
}

/// Fine-grained error category derived from message patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassifiedCategory {
    Network,
    Authentication,
    Backend,
    Rendering,
    FileSystem,
    Configuration,
    Internal,
}

/// Classified error with context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedError {
    pub severity: ErrorSeverity,
    pub category: ClassifiedCategory,
    pub message: String,
    pub user_message: String,
    pub recoverable: bool,
}

/// Classify an `anyhow::Error` into severity, category, and a user-friendly
/// message by inspecting the full context chain for known patterns.
///
/// A [`RosterError`] anywhere in the chain takes precedence over patterns.
pub fn classify_error(error: &anyhow::Error) -> ClassifiedError {
    let typed = error
        .downcast_ref::<RosterError>()
        .or_else(|| error.chain().find_map(|e| e.downcast_ref::<RosterError>()));
    if let Some(typed) = typed {
        let category = match typed {
            RosterError::Config(_) => ClassifiedCategory::Configuration,
            RosterError::Render(_) | RosterError::Export(_) => ClassifiedCategory::Rendering,
            RosterError::FileSystem(_) => ClassifiedCategory::FileSystem,
            RosterError::Backend(_) => ClassifiedCategory::Backend,
            RosterError::Internal(_) => ClassifiedCategory::Internal,
        };
        return ClassifiedError {
            severity: ErrorSeverity::High,
            category,
            message: format!("{error:#}"),
            user_message: typed.user_message(),
            recoverable: true,
        };
    }

    let msg = format!("{error:#}").to_lowercase();

    let (category, severity, user_msg) = if msg.contains("unauthorized")
        || msg.contains("401")
        || msg.contains("jwt expired")
    {
        (
            ClassifiedCategory::Authentication,
            ErrorSeverity::High,
            "Your session has expired. Please sign in again.",
        )
    } else if msg.contains("timeout") || msg.contains("connection") || msg.contains("dns") {
        (
            ClassifiedCategory::Network,
            ErrorSeverity::Medium,
            "Network error. Check your connection.",
        )
    } else if msg.contains("backend") || msg.contains("fetch") || msg.contains("query") {
        (
            ClassifiedCategory::Backend,
            ErrorSeverity::High,
            "Could not load voter data. Please try again.",
        )
    } else if msg.contains("pdf") || msg.contains("render") || msg.contains("layout") {
        (
            ClassifiedCategory::Rendering,
            ErrorSeverity::High,
            "Could not generate the document.",
        )
    } else if (msg.contains("not found") && msg.contains("file"))
        || msg.contains("no such file")
        || msg.contains("permission denied")
    {
        (
            ClassifiedCategory::FileSystem,
            ErrorSeverity::Medium,
            "Could not save the file. Check the export folder.",
        )
    } else if msg.contains("config") {
        (
            ClassifiedCategory::Configuration,
            ErrorSeverity::Medium,
            "Configuration error. Check settings.",
        )
    } else {
        (
            ClassifiedCategory::Internal,
            ErrorSeverity::Medium,
            "An unexpected error occurred.",
        )
    };

    ClassifiedError {
        severity,
        category,
        message: format!("{error:#}"),
        user_message: user_msg.to_string(),
        recoverable: severity != ErrorSeverity::Critical,
    }
}
