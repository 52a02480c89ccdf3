//! asn-scanner - IP/domain to ASN and ASN to prefix resolution
//!
//! Lookups run against a local copy of the ipverse `asn-ip` dataset, which
//! is downloaded and unpacked into the user's cache directory on first use,
//! or against the HackerTarget API as a remote fallback.

pub mod config;
pub mod dataset;
pub mod error;
pub mod index;
pub mod output;
pub mod remote;
pub mod resolve;

// Re-export core types for library users
pub use config::{DatasetConfig, DatasetConfigBuilder};
pub use dataset::{AsnRecord, DatasetStore};
pub use error::{AsnError, Result};
pub use index::RecordIndex;
pub use output::OutputFormat;
pub use resolve::{ResolutionService, ResolvedInfo};
