use std::fmt;

/// Which swap table a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Swap,
    ReverseSwap,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Swap => f.write_str("swap"),
            RecordKind::ReverseSwap => f.write_str("reverse swap"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The address is empty or is not the encoding accepted for the swap direction.
    #[error("invalid address: {0:?}")]
    InvalidAddress(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    #[error("{kind} already exists: {id}")]
    DuplicateId { kind: RecordKind, id: String },

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Backend failure, passed through with the context of the failing operation.
    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub(crate) fn not_found(kind: RecordKind, id: &str) -> Self {
        Error::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
