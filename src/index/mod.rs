//! IP to ASN matching over the cached records
//!
//! The scan is linear: every record is visited in the order the store
//! yields them (ascending AS number) and its prefixes are tested IPv4 first,
//! then IPv6. The first containing prefix wins; no attempt is made to find
//! a more specific announcement from another ASN.

use crate::dataset::{AsnRecord, DatasetStore};
use crate::error::{AsnError, Result};
use ipnet::IpNet;
use std::net::IpAddr;

/// Read-only view over a [`DatasetStore`] that finds the owner of an address
#[derive(Debug, Clone, Copy)]
pub struct RecordIndex<'a> {
    store: &'a DatasetStore,
}

impl<'a> RecordIndex<'a> {
    /// Create an index over `store`
    pub fn new(store: &'a DatasetStore) -> Self {
        Self { store }
    }

    /// Find the record owning `addr`
    ///
    /// Malformed prefix strings and unreadable records are skipped. Returns
    /// [`AsnError::NotFound`] when no prefix contains the address.
    pub fn find_owner(&self, addr: IpAddr) -> Result<AsnRecord> {
        self.store
            .list_all()?
            .find(|record| record_contains(record, addr))
            .ok_or_else(|| AsnError::NotFound(format!("IP {addr} not found in local DB")))
    }
}

/// Whether any prefix of `record` contains `addr`
///
/// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) are matched as IPv4.
pub fn record_contains(record: &AsnRecord, addr: IpAddr) -> bool {
    let addr = addr.to_canonical();
    record
        .prefixes()
        .filter_map(|prefix| prefix.trim().parse::<IpNet>().ok())
        .any(|net| net.contains(&addr))
}
