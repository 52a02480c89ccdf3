//! asn-scanner - resolve IPs and domains to ASNs, and ASNs to prefixes.
//!
//! This is the command-line interface for the asn_scanner library.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use asn_scanner::dataset::HttpArchiveFetcher;
use asn_scanner::{output, DatasetConfig, DatasetStore, OutputFormat, ResolutionService};
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::sync::Arc;

const BANNER: &str = r#"
       d8888
      d88888
     d88P888
    d88P 888 .d8888b  88888b.   .d88b.   .d88b.
   d88P  888 88K      888 "88b d88P"88b d88""88b
  d88P   888 "Y8888b. 888  888 888  888 888  888
 d8888888888      X88 888  888 Y88b 888 Y88..88P
d88P     888  88888P' 888  888  "Y88888  "Y88P"
                                    888
                               Y8b d88P
                                "Y88P"
"#;

/// Get the version string for asn-scanner
fn get_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(env!("CARGO_PKG_VERSION"), "-UNRELEASED")
    } else {
        env!("CARGO_PKG_VERSION")
    }
}

/// Command-line arguments for the ASN scanner.
#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Resolve IPs and domains to ASNs, and list the prefixes an ASN announces",
    long_about = None
)]
struct Args {
    /// Resolve an IP address or domain to its ASN
    #[clap(long, value_name = "IP|DOMAIN", conflicts_with = "asn2ips")]
    ip2asn: Option<String>,

    /// List the prefixes of an ASN, or of the ASN owning a domain or IP
    #[clap(long, value_name = "ASN|DOMAIN")]
    asn2ips: Option<String>,

    /// Output format
    #[clap(long, value_enum, ignore_case = true, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Write the result to this file
    #[clap(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Use the HackerTarget API instead of the local database
    #[clap(long)]
    use_api: bool,

    /// Directory of the local ASN database
    #[clap(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Download a fresh copy of the local ASN database
    #[clap(long)]
    update: bool,

    /// Suppress the banner, progress bars and informational messages
    #[clap(short, long)]
    quiet: bool,

    /// Enable verbose output (use -vv for trace logging)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    // Quick check for version before starting the runtime
    let args: Vec<String> = std::env::args().collect();
    if args.len() == 2 && (args[1] == "--version" || args[1] == "-V") {
        println!("asn-scanner {}", get_version());
        return;
    }

    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    // Single-threaded runtime: one query per invocation
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime");

    if let Err(e) = runtime.block_on(async_main(args)) {
        eprintln!("Error {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(format!("asn_scanner={level}")),
    )
    .format_timestamp(None)
    .format_target(false)
    .init();
}

fn print_banner() {
    eprintln!("{}", BANNER);
    eprintln!("[+] Scan result follows below\n");
}

async fn async_main(args: Args) -> Result<()> {
    if args.ip2asn.is_none() && args.asn2ips.is_none() && !args.update {
        print_banner();
        eprintln!("{}", Args::command().render_help());
        return Ok(());
    }

    if !args.quiet {
        print_banner();
    }

    let mut builder = DatasetConfig::builder();
    if let Some(dir) = &args.cache_dir {
        builder = builder.cache_dir(dir);
    }
    let config = builder.build().map_err(anyhow::Error::msg)?;

    let show_progress = !args.quiet;
    let store = DatasetStore::with_fetcher(
        config,
        Arc::new(HttpArchiveFetcher::with_progress(show_progress)),
    )
    .with_progress(show_progress);

    if args.update {
        store.refresh().await.context("updating ASN data")?;
        log::info!(
            "{} ASN records in {}",
            store.record_count().unwrap_or_default(),
            store.cache_dir().display()
        );
    }

    // The API path never needs the local dataset
    if !args.use_api {
        store
            .ensure_populated()
            .await
            .context("setting up ASN data")?;
    }

    let service = ResolutionService::new(store);

    let (info, show_prefixes) = if let Some(query) = &args.ip2asn {
        let info = service
            .resolve_ip_to_asn(query, args.use_api)
            .await
            .with_context(|| format!("resolving {}", query))?;
        (info, false)
    } else if let Some(query) = &args.asn2ips {
        let info = service
            .lookup_prefixes(query, args.use_api)
            .await
            .with_context(|| format!("listing prefixes for {}", query))?;
        (info, true)
    } else {
        return Ok(());
    };

    output::render(&info, args.format, show_prefixes, args.output.as_deref())
        .context("writing output")?;
    Ok(())
}
