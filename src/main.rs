use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use prow_ingest::bulk::BulkIngestBatcher;
use prow_ingest::config::{ScanConfig, StoreConfig, DEFAULT_ENDPOINT};
use prow_ingest::download;
use prow_ingest::locator::ArtifactLocator;
use prow_ingest::records;
use prow_ingest::resolver::{insecure_client, last_path_segment};

#[derive(Parser)]
#[command(name = "prow_ingest", about = "Upload prow job event artifacts to OpenSearch")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Locate a job's event artifacts, download them and bulk-upload the records
    Upload {
        /// Prow job URL
        job_url: String,
        /// OpenSearch username
        #[arg(long, default_value = "openshift")]
        user: String,
        /// OpenSearch password (falls back to the OPENSEARCH_PASS env var)
        #[arg(long)]
        pass: Option<String>,
        /// OpenSearch base URL
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,
        /// Storage-browser base URL
        #[arg(long)]
        browser: Option<String>,
    },
    /// Resolve and print a job's artifact URLs without uploading
    Locate {
        /// Prow job URL
        job_url: String,
        /// Storage-browser base URL
        #[arg(long)]
        browser: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Upload {
            job_url,
            user,
            pass,
            endpoint,
            browser,
        } => {
            let Some(password) = pass.or_else(|| std::env::var("OPENSEARCH_PASS").ok()) else {
                bail!("no password given (use --pass or set OPENSEARCH_PASS)");
            };
            let store = StoreConfig {
                endpoint,
                username: user,
                password,
            };
            upload(&job_url, scan_config(browser), &store).await
        }
        Commands::Locate { job_url, browser } => {
            let locator = ArtifactLocator::new(&scan_config(browser))?;
            let files = locator.locate(&job_url).await?;
            if files.is_empty() {
                warn!("no matching artifact files found");
            }
            for url in files {
                println!("{url}");
            }
            Ok(())
        }
    }
}

fn scan_config(browser: Option<String>) -> ScanConfig {
    let mut scan = ScanConfig::default();
    if let Some(base) = browser {
        scan.browser_base = base;
    }
    scan
}

async fn upload(job_url: &str, scan: ScanConfig, store: &StoreConfig) -> Result<()> {
    let job_id = last_path_segment(job_url).to_string();
    info!(job = %job_url, index = %job_id, "uploading prow job");

    let locator = ArtifactLocator::new(&scan)?;
    let files = locator.locate(job_url).await?;
    if files.is_empty() {
        warn!("no matching artifact files found");
        return Ok(());
    }

    let dir = tempfile::tempdir()?;
    info!(dir = %dir.path().display(), "created temporary directory");
    let client = insecure_client()?;

    let mut total_records = 0;
    let mut total_rejected = 0;
    for file_url in &files {
        let raw_url = download::rewrite_to_storage(&scan, file_url);
        let path = download::download_file(&client, dir.path(), &raw_url).await?;
        let events = records::parse_and_normalize(&path, &job_id)?;

        let mut batcher = BulkIngestBatcher::new(store, &job_id)?;
        for event in events {
            batcher.add(event).await?;
        }
        let totals = batcher.finish().await?;
        info!(
            file = %path.display(),
            records = totals.records_submitted,
            batches = totals.batches_sent,
            rejected = totals.doc_failures,
            "finished upload"
        );
        total_records += totals.records_submitted;
        total_rejected += totals.doc_failures;
    }

    println!(
        "Uploaded {} records from {} files to index {} ({} rejected by the store)",
        total_records,
        files.len(),
        job_id,
        total_rejected
    );
    Ok(())
}
