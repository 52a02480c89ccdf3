//! ASN resolution service
//!
//! This module ties the local dataset, DNS and the remote API together
//! behind the two public operations.

use super::dns::{resolve_query, HickoryHostResolver, HostResolver};
use super::types::ResolvedInfo;
use crate::dataset::{normalize_asn, parse_asn, DatasetStore};
use crate::error::Result;
use crate::index::RecordIndex;
use crate::remote::{HackerTargetClient, RemoteLookup};
use log::debug;
use std::sync::Arc;

/// IP→ASN and ASN→prefixes lookups
///
/// # Examples
///
/// ```no_run
/// use asn_scanner::config::DatasetConfig;
/// use asn_scanner::dataset::DatasetStore;
/// use asn_scanner::resolve::ResolutionService;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let service = ResolutionService::new(DatasetStore::new(DatasetConfig::default()));
///
///     let info = service.resolve_ip_to_asn("one.one.one.one", false).await?;
///     println!("{} {}", info.asn, info.description);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct ResolutionService {
    store: DatasetStore,
    resolver: Arc<dyn HostResolver>,
    remote: Arc<dyn RemoteLookup>,
}

impl ResolutionService {
    /// Create a service with hickory DNS and the HackerTarget API
    pub fn new(store: DatasetStore) -> Self {
        Self::with_services(
            store,
            Arc::new(HickoryHostResolver::new()),
            Arc::new(HackerTargetClient::new()),
        )
    }

    /// Create a service with custom DNS and remote collaborators
    ///
    /// # Arguments
    ///
    /// * `store` - Local dataset
    /// * `resolver` - Resolver for domain queries
    /// * `remote` - Remote lookup used when `use_remote` is set
    pub fn with_services(
        store: DatasetStore,
        resolver: Arc<dyn HostResolver>,
        remote: Arc<dyn RemoteLookup>,
    ) -> Self {
        Self {
            store,
            resolver,
            remote,
        }
    }

    /// The local dataset
    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    /// Resolve an IP address or domain to its owning ASN
    ///
    /// Domains are resolved first and the first address is used; IP
    /// literals never hit DNS. With `use_remote` the remote service answers
    /// and the local dataset is not touched.
    pub async fn resolve_ip_to_asn(&self, query: &str, use_remote: bool) -> Result<ResolvedInfo> {
        let addr = resolve_query(self.resolver.as_ref(), query).await?;
        debug!("{query} -> {addr}");

        if use_remote {
            return self.remote.ip_to_asn(query, addr).await;
        }

        self.store.ensure_populated().await?;
        let record = RecordIndex::new(&self.store).find_owner(addr)?;
        Ok(ResolvedInfo::for_address(query, addr, &record))
    }

    /// List the prefixes announced by an ASN
    ///
    /// `13335`, `AS13335` and `as13335` are equivalent.
    pub async fn resolve_asn_to_prefixes(
        &self,
        asn: &str,
        use_remote: bool,
    ) -> Result<ResolvedInfo> {
        let canonical = normalize_asn(asn)?;

        if use_remote {
            return self.remote.asn_to_prefixes(asn, &canonical).await;
        }

        self.store.ensure_populated().await?;
        let record = self.store.load_record(&canonical)?;
        Ok(ResolvedInfo::for_prefixes(asn, &record))
    }

    /// List prefixes for an ASN, or for the ASN owning an IP or domain
    ///
    /// Input that is not an ASN identifier is first resolved to its owning
    /// ASN; the returned answer then also carries the resolved address.
    pub async fn lookup_prefixes(&self, query: &str, use_remote: bool) -> Result<ResolvedInfo> {
        if parse_asn(query).is_ok() {
            return self.resolve_asn_to_prefixes(query, use_remote).await;
        }

        let owner = self.resolve_ip_to_asn(query, use_remote).await?;
        let mut info = self.resolve_asn_to_prefixes(&owner.asn, use_remote).await?;
        info.query = query.to_string();
        info.resolved_ip = owner.resolved_ip;
        Ok(info)
    }
}
