use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("log index {index} out of range ({len} entries)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("life remaining is undefined for expected lifecycle {0:?}")]
    DivisionUndefined(Option<f64>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    IndexOutOfRange,
    DivisionUndefined,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidInput(_) => ErrorKind::InvalidInput,
            LedgerError::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            LedgerError::DivisionUndefined(_) => ErrorKind::DivisionUndefined,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        LedgerError::InvalidInput(msg.into())
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::IndexOutOfRange => "INDEX_OUT_OF_RANGE",
            ErrorKind::DivisionUndefined => "DIVISION_UNDEFINED",
        };
        f.write_str(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_render_as_stable_codes() {
        let err = LedgerError::IndexOutOfRange { index: 4, len: 2 };
        assert_eq!(err.kind().to_string(), "INDEX_OUT_OF_RANGE");
        assert_eq!(
            LedgerError::invalid("miles must be positive").kind().to_string(),
            "INVALID_INPUT"
        );
        assert_eq!(
            LedgerError::DivisionUndefined(None).kind().to_string(),
            "DIVISION_UNDEFINED"
        );
    }
}
