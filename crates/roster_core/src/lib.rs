pub mod config;
pub mod error_handler;
pub mod logging;
pub mod notifications;

pub use config::{ConfigManager, RosterConfig};
pub use error_handler::{
    ClassifiedCategory, ClassifiedError, ErrorCategory, ErrorSeverity, RosterError,
    classify_error,
};
pub use notifications::{AppNotification, NotificationStore, NotificationType};
