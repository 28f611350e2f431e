//! Error types for the tiered cache
//!
//! A Store's failure modes are binary: a distinguished `NotFound` the Manager
//! dispatches on, and everything else, which is opaque and short-circuits the
//! caller.

use thiserror::Error;

/// Unified error type for the cache
#[derive(Error, Debug)]
pub enum Error {
    /// The key is absent from this store. Not a failure from the Manager's
    /// point of view — it drives the read-through descent.
    #[error("key not found")]
    NotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for the cache
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for the sentinel NotFound condition, false for every opaque error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinguished() {
        assert!(Error::NotFound.is_not_found());
        assert!(!Error::Internal("boom".into()).is_not_found());
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io_err.into();
        assert!(!err.is_not_found());
    }
}
