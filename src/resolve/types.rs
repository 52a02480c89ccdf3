//! Result of a resolution query

use crate::dataset::AsnRecord;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Answer to one IP→ASN or ASN→prefixes query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedInfo {
    /// Query string as given by the user
    pub query: String,
    /// Owning ASN in `AS<number>` form
    pub asn: String,
    /// Organization name of the ASN
    pub description: String,
    /// Announced prefixes, IPv4 before IPv6; empty for IP queries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefixes: Vec<String>,
    /// Address the query resolved to, for IP and domain queries
    #[serde(rename = "ip", default, skip_serializing_if = "Option::is_none")]
    pub resolved_ip: Option<String>,
}

impl ResolvedInfo {
    /// Build the answer to an IP→ASN query from the owning record
    pub fn for_address(query: &str, addr: IpAddr, record: &AsnRecord) -> Self {
        Self {
            query: query.to_string(),
            asn: record.asn_label(),
            description: record.description.clone(),
            prefixes: Vec::new(),
            resolved_ip: Some(addr.to_string()),
        }
    }

    /// Build the answer to an ASN→prefixes query from the record
    pub fn for_prefixes(query: &str, record: &AsnRecord) -> Self {
        Self {
            query: query.to_string(),
            asn: record.asn_label(),
            description: record.description.clone(),
            prefixes: record.prefixes().map(str::to_string).collect(),
            resolved_ip: None,
        }
    }
}
