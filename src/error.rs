//! Error types for ASN resolution

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while preparing the dataset or resolving a query
#[derive(Debug, Error)]
pub enum AsnError {
    /// Download, HTTP or remote transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// A filesystem operation failed
    ///
    /// Covers permission problems, a full disk and missing paths. The path
    /// that was being touched is kept so the message points at it.
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        /// Path involved in the failed operation
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The downloaded archive is corrupt or does not have the expected layout
    #[error("Archive error: {0}")]
    Archive(String),

    /// No record or prefix matches the query
    #[error("Not found: {0}")]
    NotFound(String),

    /// A record could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// A domain name resolved to no addresses
    #[error("Cannot resolve domain: {0}")]
    UnresolvableDomain(String),

    /// The ASN identifier is not of the form `[AS]<number>`
    #[error("Invalid ASN identifier: {0}")]
    InvalidAsn(String),

    /// The remote lookup service refused the request because of its quota
    #[error("API limit reached")]
    RateLimited,

    /// The remote lookup service answered with an error message
    #[error("API error: {0}")]
    RemoteService(String),
}

impl AsnError {
    /// Build a [`AsnError::Filesystem`] for `path`
    pub fn fs(path: impl Into<PathBuf>, source: io::Error) -> Self {
        AsnError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means "nothing matched" rather than a failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, AsnError::NotFound(_))
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AsnError>;
