//! Remote lookup fallback via the HackerTarget ASN API

use crate::error::{AsnError, Result};
use crate::resolve::ResolvedInfo;
use async_trait::async_trait;
use log::debug;
use std::net::IpAddr;
use std::time::Duration;

/// Default HackerTarget ASN lookup endpoint
pub const DEFAULT_API_URL: &str = "https://api.hackertarget.com/aslookup/";
/// Default timeout for remote lookups
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Remote source of ASN answers
#[async_trait]
pub trait RemoteLookup: Send + Sync {
    /// Find the ASN owning `ip`; `query` is what the user typed
    async fn ip_to_asn(&self, query: &str, ip: IpAddr) -> Result<ResolvedInfo>;

    /// List the prefixes of `asn` (canonical `AS<number>` form)
    async fn asn_to_prefixes(&self, query: &str, asn: &str) -> Result<ResolvedInfo>;
}

/// [`RemoteLookup`] against api.hackertarget.com
#[derive(Debug, Clone)]
pub struct HackerTargetClient {
    client: reqwest::Client,
    base_url: String,
}

impl HackerTargetClient {
    /// Create a client for the public API
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_URL, DEFAULT_TIMEOUT)
    }

    /// Create a client for a specific endpoint
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn fetch(&self, q: &str) -> Result<String> {
        debug!("querying {} for {q}", self.base_url);
        let body = self
            .client
            .get(&self.base_url)
            .query(&[("q", q)])
            .send()
            .await
            .map_err(|e| AsnError::Network(e.to_string()))?
            .text()
            .await
            .map_err(|e| AsnError::Network(e.to_string()))?;
        check_body(&body)?;
        Ok(body)
    }
}

impl Default for HackerTargetClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteLookup for HackerTargetClient {
    async fn ip_to_asn(&self, query: &str, ip: IpAddr) -> Result<ResolvedInfo> {
        let body = self.fetch(&ip.to_string()).await?;
        parse_ip_response(query, ip, &body)
    }

    async fn asn_to_prefixes(&self, query: &str, asn: &str) -> Result<ResolvedInfo> {
        let body = self.fetch(asn).await?;
        parse_asn_response(query, asn, &body)
    }
}

/// Map the API's in-band failure messages to errors
pub fn check_body(body: &str) -> Result<()> {
    if body.contains("API count exceeded") {
        return Err(AsnError::RateLimited);
    }
    if body.contains("error") || body.contains("Unable") {
        return Err(AsnError::RemoteService(body.trim().to_string()));
    }
    Ok(())
}

fn csv_fields(line: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());
    let record = reader
        .records()
        .next()
        .ok_or_else(|| AsnError::Parse("unexpected response: empty body".to_string()))?
        .map_err(|e| AsnError::Parse(format!("unexpected response: {e}")))?;
    Ok(record.iter().map(str::to_string).collect())
}

/// Parse `"ip","asn","prefix","description"`
pub fn parse_ip_response(query: &str, ip: IpAddr, body: &str) -> Result<ResolvedInfo> {
    let line = body.trim().lines().next().unwrap_or_default();
    let fields = csv_fields(line)?;
    if fields.len() < 4 {
        return Err(AsnError::Parse(format!("unexpected response: {line}")));
    }
    Ok(ResolvedInfo {
        query: query.to_string(),
        asn: format!("AS{}", fields[1]),
        description: fields[3].clone(),
        prefixes: Vec::new(),
        resolved_ip: Some(ip.to_string()),
    })
}

/// Parse `"asn","description"` followed by one prefix per line
pub fn parse_asn_response(query: &str, asn: &str, body: &str) -> Result<ResolvedInfo> {
    let mut lines = body.trim().lines();
    let header = lines.next().unwrap_or_default();
    let fields = csv_fields(header)?;
    if fields.len() < 2 {
        return Err(AsnError::Parse(format!("unexpected response: {header}")));
    }
    Ok(ResolvedInfo {
        query: query.to_string(),
        asn: asn.to_string(),
        description: fields[1].clone(),
        prefixes: lines
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
        resolved_ip: None,
    })
}
