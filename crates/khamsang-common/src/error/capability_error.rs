/// Errors reported by a browser capability (click, type, navigate, ...).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CapabilityError {
    // ============================================================
    // Transient
    // ============================================================
    #[error("Connection lost")]
    ConnectionLost,

    #[error("Not ready")]
    NotReady,

    #[error("Element at ({x}, {y}) is stale")]
    ElementStale { x: f32, y: f32 },

    #[error("Page context unavailable: {0}")]
    ContextUnavailable(String),

    #[error("Element at ({x}, {y}) is not interactable: {reason}")]
    ElementNotInteractable { x: f32, y: f32, reason: String },

    #[error("Timeout: {operation}")]
    Timeout { operation: String },

    // ============================================================
    // Fatal
    // ============================================================
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Element at ({x}, {y}) is gone")]
    ElementGone { x: f32, y: f32 },

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Script execution error: {0}")]
    ScriptError(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Other: {0}")]
    Other(String),
}

impl From<std::io::Error> for CapabilityError {
    fn from(err: std::io::Error) -> Self {
        CapabilityError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CapabilityError {
    fn from(err: serde_json::Error) -> Self {
        CapabilityError::Serialization(err.to_string())
    }
}

impl CapabilityError {
    /// Whether retrying the same call can reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CapabilityError::ConnectionLost
                | CapabilityError::NotReady
                | CapabilityError::ElementStale { .. }
                | CapabilityError::ContextUnavailable(_)
                | CapabilityError::ElementNotInteractable { .. }
                | CapabilityError::Timeout { .. }
        )
    }

    /// Stable code string for this error.
    pub fn code(&self) -> &'static str {
        match self {
            CapabilityError::ConnectionLost => "CONNECTION_LOST",
            CapabilityError::NotReady => "NOT_READY",
            CapabilityError::ElementStale { .. } => "ELEMENT_STALE",
            CapabilityError::ContextUnavailable(_) => "CONTEXT_UNAVAILABLE",
            CapabilityError::ElementNotInteractable { .. } => "ELEMENT_NOT_INTERACTABLE",
            CapabilityError::Timeout { .. } => "TIMEOUT",
            CapabilityError::InvalidArgument(_) => "INVALID_ARGUMENT",
            CapabilityError::ElementGone { .. } => "ELEMENT_GONE",
            CapabilityError::Navigation(_) => "NAVIGATION_ERROR",
            CapabilityError::ScriptError(_) => "SCRIPT_ERROR",
            CapabilityError::NotSupported(_) => "NOT_SUPPORTED",
            CapabilityError::Io(_) => "IO_ERROR",
            CapabilityError::Serialization(_) => "SERIALIZATION_ERROR",
            CapabilityError::Other(_) => "INTERNAL_ERROR",
        }
    }

    pub fn recovery_hint(&self) -> &'static str {
        crate::error_mapping::hint_for_code(self.code()).unwrap_or("Check instruction wording")
    }
}
