//! Configuration for the local ASN dataset
//!
//! Defaults point at the ipverse `asn-ip` archive on GitHub and a cache
//! directory under the user's cache home. Every value can be overridden
//! through [`DatasetConfigBuilder`], and the cache directory additionally
//! through the `ASN_SCANNER_CACHE_DIR` environment variable.

use std::path::{Path, PathBuf};

/// Default location of the dataset archive
pub const DEFAULT_ARCHIVE_URL: &str =
    "https://github.com/ipverse/asn-ip/archive/refs/heads/master.zip";
/// File name used for the temporary archive inside the work directory
pub const DEFAULT_ARCHIVE_FILE_NAME: &str = "asn-master.zip";
/// Name prefix of the folder the archive unpacks into (`asn-ip-master`, ...)
pub const DEFAULT_EXTRACT_PREFIX: &str = "asn-ip";
/// Records directory nested inside the extracted folder
pub const DEFAULT_RECORDS_SUBDIR: &str = "as";
/// Per-ASN record file name
pub const DEFAULT_RECORD_FILE_NAME: &str = "aggregated.json";
/// Name of the cache directory under the cache home
pub const CACHE_DIR_NAME: &str = "asn_scanner_db";
/// Environment variable overriding the cache directory
pub const CACHE_DIR_ENV: &str = "ASN_SCANNER_CACHE_DIR";

/// Configuration for [`crate::dataset::DatasetStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetConfig {
    /// Directory holding one subdirectory per ASN
    pub cache_dir: PathBuf,
    /// Directory the archive is downloaded to and unpacked in
    pub work_dir: PathBuf,
    /// URL of the zip archive with the full dataset
    pub archive_url: String,
    /// File name of the downloaded archive inside `work_dir`
    pub archive_file_name: String,
    /// Name prefix identifying the extracted top-level folder
    pub extract_prefix: String,
    /// Records directory inside the extracted folder
    pub records_subdir: String,
    /// Record file name inside each per-ASN directory
    pub record_file_name: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            work_dir: PathBuf::from("."),
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            archive_file_name: DEFAULT_ARCHIVE_FILE_NAME.to_string(),
            extract_prefix: DEFAULT_EXTRACT_PREFIX.to_string(),
            records_subdir: DEFAULT_RECORDS_SUBDIR.to_string(),
            record_file_name: DEFAULT_RECORD_FILE_NAME.to_string(),
        }
    }
}

impl DatasetConfig {
    /// Create a new DatasetConfig builder
    pub fn builder() -> DatasetConfigBuilder {
        DatasetConfigBuilder::new()
    }

    /// Path of the temporary archive
    pub fn archive_path(&self) -> PathBuf {
        self.work_dir.join(&self.archive_file_name)
    }

    /// Path of the record file for an ASN number
    pub fn record_path(&self, number: u32) -> PathBuf {
        self.cache_dir
            .join(number.to_string())
            .join(&self.record_file_name)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err("cache_dir must not be empty".to_string());
        }
        if self.archive_url.is_empty() {
            return Err("archive_url must not be empty".to_string());
        }
        if self.archive_file_name.is_empty() {
            return Err("archive_file_name must not be empty".to_string());
        }
        if self.extract_prefix.is_empty() {
            return Err("extract_prefix must not be empty".to_string());
        }
        if self.records_subdir.is_empty() {
            return Err("records_subdir must not be empty".to_string());
        }
        if self.record_file_name.is_empty() {
            return Err("record_file_name must not be empty".to_string());
        }
        Ok(())
    }
}

/// Resolve the default cache directory
///
/// `ASN_SCANNER_CACHE_DIR` wins when set; otherwise the platform cache home
/// (`~/.cache` on Linux) is used, falling back to `./.cache`.
pub fn default_cache_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CACHE_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join(CACHE_DIR_NAME)
}

/// Builder for DatasetConfig
pub struct DatasetConfigBuilder {
    config: DatasetConfig,
}

impl DatasetConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: DatasetConfig::default(),
        }
    }

    /// Set the cache directory
    pub fn cache_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.cache_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the download/unpack work directory
    pub fn work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.work_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the archive URL
    pub fn archive_url(mut self, url: impl Into<String>) -> Self {
        self.config.archive_url = url.into();
        self
    }

    /// Set the temporary archive file name
    pub fn archive_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.archive_file_name = name.into();
        self
    }

    /// Set the extracted folder name prefix
    pub fn extract_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.extract_prefix = prefix.into();
        self
    }

    /// Set the records subdirectory name
    pub fn records_subdir(mut self, name: impl Into<String>) -> Self {
        self.config.records_subdir = name.into();
        self
    }

    /// Set the per-ASN record file name
    pub fn record_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.record_file_name = name.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<DatasetConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for DatasetConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
