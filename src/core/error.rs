use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Procedure '{procedure}' failed: {message}")]
    Procedure { procedure: String, message: String },

    #[error("Procedure '{0}' not found")]
    ProcedureNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

impl DbError {
    pub fn procedure(procedure: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Procedure {
            procedure: procedure.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

/// Outcome of a failed per-field coercion.
///
/// Hydration collects these instead of propagating them; a single bad column
/// never aborts a row.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot convert {from} to {to}{}", detail_suffix(.detail))]
pub struct CoerceError {
    pub from: &'static str,
    pub to: &'static str,
    pub detail: Option<String>,
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

impl CoerceError {
    pub fn new(from: &'static str, to: &'static str) -> Self {
        Self {
            from,
            to,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl From<CoerceError> for DbError {
    fn from(err: CoerceError) -> Self {
        Self::TypeMismatch(err.to_string())
    }
}
