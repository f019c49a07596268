use thiserror::Error;

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },
    #[error("{operation} failed: {reason}")]
    HostOperationFailed { operation: String, reason: String },
    #[error("corrupt hierarchy: {0}")]
    CorruptHierarchy(String),
    #[error("chunk size must be positive and finite, got {0}")]
    InvalidChunkSize(f32),
    #[error("position {0} lies outside the chunk grid")]
    OffGrid(glam::Vec3),
    #[error("stale {0} id")]
    StaleId(&'static str),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("scene document error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn host_failed(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::HostOperationFailed {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Absence conditions are reported as warnings rather than failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
