//! Local cache of per-ASN records
//!
//! The cache is a directory with one subdirectory per AS number, each
//! holding that ASN's record file. It is populated on demand from the
//! dataset archive and replaced as a whole on refresh, never patched.

use super::archive;
use super::fetch::{ArchiveFetcher, HttpArchiveFetcher};
use super::record::{parse_asn, AsnRecord};
use crate::config::DatasetConfig;
use crate::error::{AsnError, Result};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Owner of the on-disk record directory
///
/// # Examples
///
/// ```no_run
/// use asn_scanner::config::DatasetConfig;
/// use asn_scanner::dataset::DatasetStore;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = DatasetStore::new(DatasetConfig::default());
///     store.ensure_populated().await?;
///
///     let record = store.load_record("AS13335")?;
///     println!("{}: {}", record.asn_label(), record.description);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct DatasetStore {
    config: DatasetConfig,
    fetcher: Arc<dyn ArchiveFetcher>,
    show_progress: bool,
}

impl std::fmt::Debug for DatasetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetStore")
            .field("config", &self.config)
            .field("show_progress", &self.show_progress)
            .finish_non_exhaustive()
    }
}

impl DatasetStore {
    /// Create a store that downloads over HTTPS when the cache is missing
    pub fn new(config: DatasetConfig) -> Self {
        Self::with_fetcher(config, Arc::new(HttpArchiveFetcher::new()))
    }

    /// Create a store with a specific archive fetcher
    pub fn with_fetcher(config: DatasetConfig, fetcher: Arc<dyn ArchiveFetcher>) -> Self {
        Self {
            config,
            fetcher,
            show_progress: true,
        }
    }

    /// Enable or disable the extraction progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Configuration this store was built with
    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Whether the cache directory exists
    pub fn is_populated(&self) -> bool {
        self.config.cache_dir.exists()
    }

    /// Make sure the cache directory is present, acquiring it if not
    ///
    /// Presence of the directory alone counts as populated: no freshness
    /// check is made, so the archive is downloaded at most once. When
    /// acquisition fails, the directory created for it is removed again so
    /// that the next call retries instead of seeing an empty cache.
    pub async fn ensure_populated(&self) -> Result<()> {
        let cache_dir = &self.config.cache_dir;
        if cache_dir.exists() {
            debug!("ASN database present at {}", cache_dir.display());
            return Ok(());
        }

        fs::create_dir_all(cache_dir).map_err(|e| AsnError::fs(cache_dir, e))?;
        info!("ASN database not found. Downloading for faster local lookups...");

        match self.acquire().await {
            Ok(()) => {
                info!("ASN database ready");
                Ok(())
            }
            Err(e) => {
                if let Err(rm) = fs::remove_dir_all(cache_dir) {
                    warn!("failed to remove {}: {rm}", cache_dir.display());
                }
                Err(e)
            }
        }
    }

    /// Acquire a fresh copy of the dataset and swap it in for the cache
    ///
    /// The existing cache is only replaced once a complete new records
    /// directory has been unpacked; on failure it is left untouched.
    pub async fn refresh(&self) -> Result<()> {
        let cache_dir = &self.config.cache_dir;
        if !cache_dir.exists() {
            return self.ensure_populated().await;
        }

        info!("updating ASN database at {}", cache_dir.display());
        self.acquire().await?;
        info!("ASN database updated");
        Ok(())
    }

    /// Download, unpack and relocate the dataset into the cache directory
    async fn acquire(&self) -> Result<()> {
        let work_dir = &self.config.work_dir;
        fs::create_dir_all(work_dir).map_err(|e| AsnError::fs(work_dir, e))?;

        let archive_path = self.config.archive_path();
        let mut created = BTreeSet::new();

        if let Err(e) = self
            .fetcher
            .fetch(&self.config.archive_url, &archive_path)
            .await
        {
            archive::cleanup(&archive_path, work_dir, &created);
            return Err(e);
        }

        if let Err(e) = archive::unpack(&archive_path, work_dir, self.show_progress, &mut created)
        {
            archive::cleanup(&archive_path, work_dir, &created);
            return Err(e);
        }

        let records = archive::locate_records(
            work_dir,
            &created,
            &self.config.extract_prefix,
            &self.config.records_subdir,
        );
        let moved = match &records {
            Some(src) => archive::relocate(src, &self.config.cache_dir).map(|()| true),
            None => Ok(false),
        };

        archive::cleanup(&archive_path, work_dir, &created);

        if !moved? {
            return Err(AsnError::Archive(format!(
                "no '{}*/{}' directory found in the downloaded archive",
                self.config.extract_prefix, self.config.records_subdir
            )));
        }
        Ok(())
    }

    /// Load the record for an ASN identifier
    ///
    /// The identifier is case-insensitive and the `AS` prefix is optional.
    pub fn load_record(&self, asn: &str) -> Result<AsnRecord> {
        let number = parse_asn(asn)?;
        self.load_number(number)
            .map_err(|e| match e {
                AsnError::NotFound(_) => AsnError::NotFound(format!("ASN file not found for {asn}")),
                other => other,
            })
    }

    fn load_number(&self, number: u32) -> Result<AsnRecord> {
        let path = self.config.record_path(number);
        let data = fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => AsnError::NotFound(format!("AS{number}")),
            _ => AsnError::fs(&path, e),
        })?;
        AsnRecord::from_json(&data)
            .map_err(|e| AsnError::Parse(format!("{}: {e}", path.display())))
    }

    /// Iterate over every record in the cache
    ///
    /// Records are yielded lazily in ascending AS number order. Entries that
    /// are not numeric directories, or whose record cannot be read or
    /// parsed, are skipped. Each call starts a fresh scan.
    pub fn list_all(&self) -> Result<Records<'_>> {
        let numbers = self.asn_numbers()?;
        Ok(Records {
            store: self,
            numbers: numbers.into_iter(),
        })
    }

    /// Number of per-ASN directories in the cache
    pub fn record_count(&self) -> Result<usize> {
        Ok(self.asn_numbers()?.len())
    }

    fn asn_numbers(&self) -> Result<Vec<u32>> {
        let cache_dir = &self.config.cache_dir;
        let entries = fs::read_dir(cache_dir).map_err(|e| AsnError::fs(cache_dir, e))?;

        let mut numbers: Vec<u32> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok())
            .collect();
        numbers.sort_unstable();
        Ok(numbers)
    }

    /// Path of the cache directory
    pub fn cache_dir(&self) -> &Path {
        &self.config.cache_dir
    }
}

/// Lazy iterator over cached records, see [`DatasetStore::list_all`]
pub struct Records<'a> {
    store: &'a DatasetStore,
    numbers: std::vec::IntoIter<u32>,
}

impl Iterator for Records<'_> {
    type Item = AsnRecord;

    fn next(&mut self) -> Option<Self::Item> {
        for number in self.numbers.by_ref() {
            match self.store.load_number(number) {
                Ok(record) => return Some(record),
                Err(e) => debug!("skipping AS{number}: {e}"),
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.numbers.len()))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Helpers for building scratch datasets in tests

    use super::*;
    use async_trait::async_trait;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    /// Write `aggregated.json` for one ASN into `cache_dir`
    pub fn write_record(cache_dir: &Path, number: u32, description: &str, v4: &[&str], v6: &[&str]) {
        let dir = cache_dir.join(number.to_string());
        fs::create_dir_all(&dir).unwrap();
        let record = AsnRecord {
            number,
            handle: String::new(),
            description: description.to_string(),
            ipv4_prefixes: v4.iter().map(|s| s.to_string()).collect(),
            ipv6_prefixes: v6.iter().map(|s| s.to_string()).collect(),
        };
        fs::write(
            dir.join("aggregated.json"),
            serde_json::to_vec(&record).unwrap(),
        )
        .unwrap();
    }

    /// Fetcher that serves a prebuilt zip from memory and counts calls
    pub struct FakeFetcher {
        pub archive: Vec<u8>,
        pub calls: AtomicUsize,
        pub fail: bool,
    }

    impl FakeFetcher {
        pub fn new(archive: Vec<u8>) -> Self {
            Self {
                archive,
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        pub fn failing() -> Self {
            Self {
                archive: Vec::new(),
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ArchiveFetcher for FakeFetcher {
        async fn fetch(&self, _url: &str, dest: &Path) -> Result<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AsnError::Network("connection reset".to_string()));
            }
            fs::write(dest, &self.archive).map_err(|e| AsnError::fs(dest, e))?;
            Ok(self.archive.len() as u64)
        }
    }

    /// Build a zip shaped like the upstream archive: `<top>/as/<n>/aggregated.json`
    ///
    /// Each record gets a single IPv4 prefix.
    pub fn dataset_zip(top: &str, records: &[(u32, &str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(io::Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        zip.add_directory(format!("{top}/"), options).unwrap();
        zip.start_file(format!("{top}/README.md"), options).unwrap();
        zip.write_all(b"asn-ip").unwrap();
        for (number, description, prefix) in records {
            let record = AsnRecord {
                number: *number,
                handle: String::new(),
                description: description.to_string(),
                ipv4_prefixes: vec![prefix.to_string()],
                ipv6_prefixes: Vec::new(),
            };
            zip.start_file(format!("{top}/as/{number}/aggregated.json"), options)
                .unwrap();
            zip.write_all(&serde_json::to_vec(&record).unwrap()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    /// Config rooted in a scratch directory
    pub fn scratch_config(root: &Path) -> DatasetConfig {
        DatasetConfig::builder()
            .cache_dir(root.join("cache").join("asn_scanner_db"))
            .work_dir(root.join("work"))
            .build()
            .unwrap()
    }

    pub fn cache_path(root: &Path) -> PathBuf {
        root.join("cache").join("asn_scanner_db")
    }
}
