//! Configuration for the local dataset store

pub mod dataset;

pub use dataset::{default_cache_dir, DatasetConfig, DatasetConfigBuilder};
