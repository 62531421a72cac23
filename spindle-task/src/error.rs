/// Error returned when reading a [`CompletionCell`] fails.
///
/// [`CompletionCell`]: crate::CompletionCell
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error(transparent)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        Self {
            kind: ErrorKind::TypeMismatch { expected, found },
        }
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns true if the cell was read as the wrong type.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self.kind, ErrorKind::TypeMismatch { .. })
    }
}

/// The different kinds of [`Error`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The cell holds a value of a different type than the one requested.
    #[error("completion cell holds `{found}`, not `{expected}`")]
    TypeMismatch {
        /// The type requested by the reader.
        expected: &'static str,
        /// The type stored in the cell.
        found: &'static str,
    },
}
