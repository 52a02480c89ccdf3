//! Forward DNS resolution of domain queries

use crate::error::{AsnError, Result};
use async_trait::async_trait;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use log::debug;
use std::net::IpAddr;

/// Resolves a host name to addresses
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// All addresses for `host`, in the order the resolver returned them
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>>;
}

/// [`HostResolver`] backed by hickory
#[derive(Clone)]
pub struct HickoryHostResolver {
    resolver: TokioResolver,
}

impl HickoryHostResolver {
    /// Create a resolver using Cloudflare's public DNS
    pub fn new() -> Self {
        Self::with_resolver(
            TokioResolver::builder_with_config(
                ResolverConfig::cloudflare(),
                TokioConnectionProvider::default(),
            )
            .build(),
        )
    }

    /// Wrap an existing hickory resolver
    pub fn with_resolver(resolver: TokioResolver) -> Self {
        Self { resolver }
    }
}

impl Default for HickoryHostResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostResolver for HickoryHostResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>> {
        debug!("resolving {host}");
        let lookup = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|e| AsnError::UnresolvableDomain(format!("{host}: {e}")))?;
        Ok(lookup.iter().collect())
    }
}

/// Turn a query into an address
///
/// IP literals are returned as-is without touching `resolver`; anything
/// else is resolved and the first address is used.
pub async fn resolve_query(resolver: &dyn HostResolver, query: &str) -> Result<IpAddr> {
    let query = query.trim();
    if let Ok(ip) = query.parse::<IpAddr>() {
        return Ok(ip);
    }

    resolver
        .resolve(query)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AsnError::UnresolvableDomain(query.to_string()))
}
