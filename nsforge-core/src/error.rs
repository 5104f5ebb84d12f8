//! Error types for nsforge

use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

/// Nsforge error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Flags or options failed validation before any side effect
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// A uid/gid mapping value has an unrecognized shape
    #[error("malformed {key} mapping: {message}")]
    IdMap {
        /// The option key the mapping was given under
        key: &'static str,
        /// Error message
        message: String,
    },

    /// A system call failed
    #[error("{op} failed: {source}")]
    Syscall {
        /// The failing operation
        op: &'static str,
        /// Errno reported by the kernel
        source: Errno,
    },

    /// Filesystem operation failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The path the operation was against
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// An error raised inside a helper process, relayed over its pipe
    #[error("delegated {kind} error: {message}")]
    Delegated {
        /// Kind tag of the original error
        kind: String,
        /// Message of the original error
        message: String,
    },
}

impl Error {
    /// Builds an [`Error::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Builds an [`Error::Syscall`].
    #[must_use]
    pub const fn syscall(op: &'static str, source: Errno) -> Self {
        Self::Syscall { op, source }
    }

    /// Stable tag identifying the variant, used when an error crosses a
    /// process boundary and must be reconstructed on the other side.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "invalid-argument",
            Self::IdMap { .. } => "id-map",
            Self::Syscall { .. } => "syscall",
            Self::Io { .. } => "io",
            Self::Delegated { .. } => "delegated",
        }
    }
}

/// Result type alias for nsforge operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_invalid_argument() {
        let err = Error::invalid_argument("bad flag");
        assert_eq!(err.to_string(), "invalid argument: bad flag");
    }

    #[test]
    fn test_display_syscall() {
        let err = Error::syscall("unshare", Errno::EPERM);
        let rendered = err.to_string();
        assert!(rendered.starts_with("unshare failed:"));
    }

    #[test]
    fn test_kind_tags_are_distinct() {
        let errors = [
            Error::invalid_argument("x"),
            Error::IdMap {
                key: "map_uid",
                message: "x".into(),
            },
            Error::syscall("setns", Errno::EINVAL),
            Error::Io {
                path: PathBuf::from("/proc/self/ns/uts"),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            },
            Error::Delegated {
                kind: "io".into(),
                message: "x".into(),
            },
        ];

        let mut kinds: Vec<_> = errors.iter().map(Error::kind).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }
}
