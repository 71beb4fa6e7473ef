use crate::patient::PatientId;
use hms_types::{PatientStatus, UnknownVariant};

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{field} cannot be empty")]
    EmptyField { field: &'static str },
    #[error("invalid input: {0}")]
    UnknownVariant(#[from] UnknownVariant),
    #[error("cannot change status from {from} to {to}: {reason}")]
    InvalidTransition {
        from: PatientStatus,
        to: PatientStatus,
        reason: &'static str,
    },

    #[error("patient record {0} not found")]
    NotFound(PatientId),

    #[error(
        "failed to open patient store (path: {path}): {source}",
        path = path.display()
    )]
    StoreOpen {
        path: std::path::PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to initialise patient schema: {0}")]
    SchemaInit(rusqlite::Error),
    #[error("failed to insert patient record: {0}")]
    Insert(rusqlite::Error),
    #[error("failed to query patient records: {0}")]
    Query(rusqlite::Error),
    #[error("failed to update patient record: {0}")]
    Update(rusqlite::Error),
    #[error("failed to delete patient record: {0}")]
    Delete(rusqlite::Error),
    #[error("patient store transaction failed: {0}")]
    Transaction(rusqlite::Error),
    #[error("failed to close patient store: {0}")]
    Close(rusqlite::Error),
    #[error("stored patient record {id} is corrupt: {reason}")]
    CorruptRecord { id: i64, reason: String },
}

pub type PatientResult<T> = std::result::Result<T, PatientError>;

/// Coarse classification of a [`PatientError`] for callers deciding how to report it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad operator input. Nothing was changed; the operation can be retried with new input.
    Validation,
    /// The referenced record does not exist. Nothing was changed.
    NotFound,
    /// The persistent store failed. Not retried; the caller decides whether to shut down.
    Storage,
}

impl PatientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PatientError::InvalidInput(_)
            | PatientError::EmptyField { .. }
            | PatientError::UnknownVariant(_)
            | PatientError::InvalidTransition { .. } => ErrorKind::Validation,
            PatientError::NotFound(_) => ErrorKind::NotFound,
            PatientError::StoreOpen { .. }
            | PatientError::SchemaInit(_)
            | PatientError::Insert(_)
            | PatientError::Query(_)
            | PatientError::Update(_)
            | PatientError::Delete(_)
            | PatientError::Transaction(_)
            | PatientError::Close(_)
            | PatientError::CorruptRecord { .. } => ErrorKind::Storage,
        }
    }
}
