use std::fmt::{self, Display, Formatter};

/// The category of an error
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing input
    Input,
    /// Tails storage could not be read or written
    IOError,
    /// An object was used in the wrong state
    InvalidState,
    /// An internal invariant was broken
    Unexpected,
    /// The credential is revoked
    CredentialRevoked,
    /// The revocation index is outside of the registry
    InvalidUserRevocId,
    /// A proof was rejected
    ProofRejected,
    /// The revocation registry has no capacity left
    RevocationRegistryFull,
}

impl ErrorKind {
    /// The stable numeric code for this kind
    pub fn code(&self) -> usize {
        match self {
            Self::Input => 1,
            Self::IOError => 2,
            Self::InvalidState => 3,
            Self::Unexpected => 4,
            Self::CredentialRevoked => 5,
            Self::InvalidUserRevocId => 6,
            Self::ProofRejected => 7,
            Self::RevocationRegistryFull => 8,
        }
    }

    /// A short description of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "Input error",
            Self::IOError => "IO error",
            Self::InvalidState => "Invalid state",
            Self::Unexpected => "Unexpected error",
            Self::CredentialRevoked => "Credential revoked",
            Self::InvalidUserRevocId => "Invalid revocation accumulator index",
            Self::ProofRejected => "Proof rejected",
            Self::RevocationRegistryFull => "Revocation registry full",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors created by this library
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
}

impl Error {
    /// Create an error with a message
    pub fn from_msg<M: Into<String>>(kind: ErrorKind, message: M) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    /// The error category
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The numeric error code
    pub fn code(&self) -> usize {
        self.kind.code()
    }

    /// The error message, if any
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{}: {}", self.kind, msg),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::from_msg(ErrorKind::IOError, err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::from_msg(ErrorKind::Input, err.to_string())
    }
}

/// Build an [`Error`] from a kind and a formatted message.
/// The kind defaults to `Input` when omitted.
#[macro_export]
macro_rules! err_msg {
    ($kind:ident, $($arg:tt)+) => {
        $crate::error::Error::from_msg($crate::error::ErrorKind::$kind, format!($($arg)+))
    };
    ($($arg:tt)+) => {
        $crate::error::Error::from_msg($crate::error::ErrorKind::Input, format!($($arg)+))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorKind::Input.code(), 1);
        assert_eq!(ErrorKind::RevocationRegistryFull.code(), 8);
        let err = err_msg!(InvalidState, "bad {}", "delta");
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(err.to_string(), "Invalid state: bad delta");
        let err = err_msg!("missing {}", 1);
        assert_eq!(err.kind(), ErrorKind::Input);
    }
}
