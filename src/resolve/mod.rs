//! Query resolution: IP/domain to ASN and ASN to prefixes

pub mod dns;
pub mod service;
pub mod types;

pub use dns::{HickoryHostResolver, HostResolver};
pub use service::ResolutionService;
pub use types::ResolvedInfo;
