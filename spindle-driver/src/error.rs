/// Error returned when a task cannot be handed to a [`Driver`].
///
/// [`Driver`]: crate::Driver
#[derive(thiserror::Error, Debug, Clone, Copy)]
#[error(transparent)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    pub(super) fn shutdown() -> Self {
        Self {
            kind: ErrorKind::Shutdown,
        }
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns true if the driver was dropped before the task could be submitted.
    pub fn is_shutdown(&self) -> bool {
        matches!(self.kind, ErrorKind::Shutdown)
    }
}

/// The different kinds of [`Error`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The driver has been dropped.
    #[error("the driver has shut down")]
    Shutdown,
}
