use lobby_core::PathError;

/// Failure of a single store operation.
///
/// The hosted store reports network loss, rule rejections and malformed
/// payloads through one channel; callers log and surface them, never retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("permission denied at {path}")]
    PermissionDenied { path: String },
    #[error("invalid store path: {0}")]
    InvalidPath(#[from] PathError),
    #[error("payload rejected: {0}")]
    Serialization(String),
    #[error("store connection closed")]
    Closed,
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
