use thiserror::Error;

/// Error returned by an [`crate::contract::ObjectStore`] implementation.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Error returned by a [`crate::contract::DocumentHost`] implementation.
pub type HostError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("publisher has not been started")]
    NotStarted,

    #[error("settings store failed: {0}")]
    Settings(String),

    #[error("invalid value {value:?} for setting {field}")]
    InvalidSettingValue { field: &'static str, value: String },

    #[error("unknown setting {0:?}")]
    UnknownSetting(String),

    #[error("document host failed: {0}")]
    Host(String),

    #[error("failed to connect object store: {0}")]
    Connect(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
