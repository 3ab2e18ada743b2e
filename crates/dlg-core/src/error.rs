use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The story tree or another constructor input is unusable.
    InvalidInput,
    /// The operation does not fit the current session state.
    InvalidState,
    /// A condition or action statement could not be evaluated.
    Expression,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct DialogueError {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
}

impl DialogueError {
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn invalid_input(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, code, message)
    }

    pub fn invalid_state(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState, code, message)
    }

    pub fn expression(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Expression, code, message)
    }
}
