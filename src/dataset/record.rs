//! Per-ASN record model and on-disk format

use crate::error::{AsnError, Result};
use serde::{Deserialize, Serialize};

/// One Autonomous System as stored in the dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RecordFile", into = "RecordFile")]
pub struct AsnRecord {
    /// AS number
    pub number: u32,
    /// Short registry handle, may be empty
    pub handle: String,
    /// Organization name
    pub description: String,
    /// IPv4 prefixes in source order
    pub ipv4_prefixes: Vec<String>,
    /// IPv6 prefixes in source order
    pub ipv6_prefixes: Vec<String>,
}

impl AsnRecord {
    /// Canonical `AS<number>` form
    pub fn asn_label(&self) -> String {
        format!("AS{}", self.number)
    }

    /// All prefixes, IPv4 first then IPv6, each in source order
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.ipv4_prefixes
            .iter()
            .chain(self.ipv6_prefixes.iter())
            .map(String::as_str)
    }

    /// Parse a record from the JSON document of an `aggregated.json` file
    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|e| AsnError::Parse(e.to_string()))
    }
}

/// JSON layout of an `aggregated.json` file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RecordFile {
    asn: u32,
    #[serde(default)]
    handle: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    subnets: Subnets,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Subnets {
    #[serde(default)]
    ipv4: Vec<String>,
    #[serde(default)]
    ipv6: Vec<String>,
}

impl From<RecordFile> for AsnRecord {
    fn from(file: RecordFile) -> Self {
        Self {
            number: file.asn,
            handle: file.handle,
            description: file.description,
            ipv4_prefixes: file.subnets.ipv4,
            ipv6_prefixes: file.subnets.ipv6,
        }
    }
}

impl From<AsnRecord> for RecordFile {
    fn from(record: AsnRecord) -> Self {
        Self {
            asn: record.number,
            handle: record.handle,
            description: record.description,
            subnets: Subnets {
                ipv4: record.ipv4_prefixes,
                ipv6: record.ipv6_prefixes,
            },
        }
    }
}

/// Normalize an ASN identifier to its number
///
/// Accepts `13335`, `AS13335`, `as13335` and surrounding whitespace.
pub fn parse_asn(identifier: &str) -> Result<u32> {
    let trimmed = identifier.trim();
    let digits = match trimmed.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("as") => &trimmed[2..],
        _ => trimmed,
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AsnError::InvalidAsn(identifier.to_string()));
    }
    digits
        .parse::<u32>()
        .map_err(|_| AsnError::InvalidAsn(identifier.to_string()))
}

/// Normalize an ASN identifier to the canonical `AS<number>` form
pub fn normalize_asn(identifier: &str) -> Result<String> {
    parse_asn(identifier).map(|n| format!("AS{n}"))
}
