//! End-to-end tests of dataset bootstrap and resolution through the public API

#![allow(clippy::unwrap_used)]

use asn_scanner::dataset::ArchiveFetcher;
use asn_scanner::remote::RemoteLookup;
use asn_scanner::resolve::HostResolver;
use asn_scanner::{AsnError, DatasetConfig, DatasetStore, ResolutionService, ResolvedInfo};
use async_trait::async_trait;
use std::io::{Cursor, Write};
use std::net::IpAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Serves an in-memory archive laid out like the upstream dataset
struct ArchiveServer {
    archive: Vec<u8>,
    requests: AtomicUsize,
}

#[async_trait]
impl ArchiveFetcher for ArchiveServer {
    async fn fetch(&self, _url: &str, dest: &Path) -> asn_scanner::Result<u64> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        std::fs::write(dest, &self.archive).map_err(|e| AsnError::fs(dest, e))?;
        Ok(self.archive.len() as u64)
    }
}

struct NoDns;

#[async_trait]
impl HostResolver for NoDns {
    async fn resolve(&self, _host: &str) -> asn_scanner::Result<Vec<IpAddr>> {
        Ok(Vec::new())
    }
}

struct NoRemote;

#[async_trait]
impl RemoteLookup for NoRemote {
    async fn ip_to_asn(&self, _query: &str, _ip: IpAddr) -> asn_scanner::Result<ResolvedInfo> {
        Err(AsnError::RemoteService("unused".to_string()))
    }

    async fn asn_to_prefixes(&self, _query: &str, _asn: &str) -> asn_scanner::Result<ResolvedInfo> {
        Err(AsnError::RemoteService("unused".to_string()))
    }
}

fn upstream_archive() -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let records = [
        (
            15169,
            r#"{"asn":15169,"handle":"GOOGLE","description":"GOOGLE","subnets":{"ipv4":["8.8.8.0/24"],"ipv6":["2001:4860::/32"]}}"#,
        ),
        (64500, "{ corrupt"),
        (
            64501,
            r#"{"asn":64501,"handle":"","description":"NOISE","subnets":{"ipv4":["bogus","1.2.3.0/99"],"ipv6":[]}}"#,
        ),
        (
            64502,
            r#"{"asn":64502,"handle":"","description":"STUB","subnets":{"ipv4":[],"ipv6":[]}}"#,
        ),
    ];

    zip.add_directory("asn-ip-master/", options).unwrap();
    zip.add_directory("asn-ip-master/as/", options).unwrap();
    for (asn, body) in records {
        zip.start_file(format!("asn-ip-master/as/{asn}/aggregated.json"), options)
            .unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn setup(root: &Path) -> (ResolutionService, Arc<ArchiveServer>) {
    let config = DatasetConfig::builder()
        .cache_dir(root.join("home/.cache/asn_scanner_db"))
        .work_dir(root.join("work"))
        .build()
        .unwrap();
    let server = Arc::new(ArchiveServer {
        archive: upstream_archive(),
        requests: AtomicUsize::new(0),
    });
    let store = DatasetStore::with_fetcher(config, server.clone()).with_progress(false);
    let service = ResolutionService::with_services(store, Arc::new(NoDns), Arc::new(NoRemote));
    (service, server)
}

#[tokio::test]
async fn test_bootstrap_then_lookup() {
    let root = tempfile::tempdir().unwrap();
    let (service, server) = setup(root.path());

    let info = service.resolve_ip_to_asn("8.8.8.8", false).await.unwrap();
    assert_eq!(info.asn, "AS15169");
    assert_eq!(info.description, "GOOGLE");

    let info = service.resolve_asn_to_prefixes("AS15169", false).await.unwrap();
    assert_eq!(info.prefixes, vec!["8.8.8.0/24", "2001:4860::/32"]);

    // One download for both queries
    assert_eq!(server.requests.load(Ordering::SeqCst), 1);

    // Scaffolding removed from the work directory
    let leftovers: Vec<_> = std::fs::read_dir(root.path().join("work"))
        .unwrap()
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_corrupt_entries_do_not_break_scan() {
    let root = tempfile::tempdir().unwrap();
    let (service, _server) = setup(root.path());

    let info = service.resolve_ip_to_asn("2001:4860::8888", false).await.unwrap();
    assert_eq!(info.asn, "AS15169");

    let result = service.resolve_asn_to_prefixes("64500", false).await;
    assert!(matches!(result, Err(AsnError::Parse(_))));

    let stub = service.resolve_asn_to_prefixes("64502", false).await.unwrap();
    assert!(stub.prefixes.is_empty());
}

#[tokio::test]
async fn test_unresolvable_domain() {
    let root = tempfile::tempdir().unwrap();
    let (service, server) = setup(root.path());

    let result = service.resolve_ip_to_asn("does-not-exist.invalid", false).await;
    assert!(matches!(result, Err(AsnError::UnresolvableDomain(_))));
    // Resolution fails before the dataset is needed
    assert_eq!(server.requests.load(Ordering::SeqCst), 0);
}
