//! Local ASN dataset: record model, acquisition and keyed retrieval

pub mod archive;
pub mod fetch;
pub mod record;
pub mod store;

pub use fetch::{ArchiveFetcher, HttpArchiveFetcher};
pub use record::{normalize_asn, parse_asn, AsnRecord};
pub use store::{DatasetStore, Records};
