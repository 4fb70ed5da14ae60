use thiserror::Error;

/// Unified error type for the tahfiz core.
/// Variants map to the recovery contract callers rely on: validation errors
/// are rejected before any write, conflicts leave no partial state, transient
/// errors are retryable.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// Malformed input: bad verse range, out-of-scale grade, unknown enum value.
    #[error("[validation] {0}")]
    Validation(String),

    /// A referenced record does not exist.
    #[error("[not_found] {entity} {id}")]
    NotFound { entity: &'static str, id: String },

    /// A concurrent writer won the race, or a uniqueness rule was violated.
    #[error("[conflict] {0}")]
    Conflict(String),

    /// External collaborator failure (persistence, dispatch). Retryable.
    #[error("[transient] {0}")]
    Transient(String),
}

impl CoreError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        CoreError::Validation(message.into())
    }

    pub fn not_found<I: ToString>(entity: &'static str, id: I) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn conflict<S: Into<String>>(message: S) -> Self {
        CoreError::Conflict(message.into())
    }

    pub fn transient<S: Into<String>>(message: S) -> Self {
        CoreError::Transient(message.into())
    }

    /// True when the caller can fix the input and resubmit.
    pub fn is_validation(&self) -> bool {
        matches!(self, CoreError::Validation(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, CoreError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Transient(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Transient(format!("I/O error: {}", err))
    }
}
