use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::IngestError;
use crate::records::NormalizedEvent;
use crate::resolver::insecure_client;

/// Documents per bulk request.
const BATCH_SIZE: usize = 1000;

/// Running totals reported after `finish()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct IngestTotals {
    pub records_submitted: usize,
    pub batches_sent: usize,
    /// Documents the store rejected inside otherwise-successful responses.
    pub doc_failures: usize,
}

/// Accumulates normalized events and submits them to the store's `/_bulk`
/// endpoint in batches of up to [`BATCH_SIZE`]. Submission is strictly
/// sequential: the next batch is never built before the previous one
/// returns, so source-file order is preserved in the index.
///
/// A transport-level failure (network, auth, non-2xx) aborts the run; a
/// per-document rejection inside a successful response is logged and counted
/// but does not stop later batches.
pub struct BulkIngestBatcher {
    client: Client,
    bulk_url: String,
    username: String,
    password: String,
    index: String,
    buf: Vec<NormalizedEvent>,
    totals: IngestTotals,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<BulkItem>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    index: BulkItemStatus,
}

#[derive(Debug, Deserialize)]
struct BulkItemStatus {
    status: u16,
    error: Option<serde_json::Value>,
}

impl BulkIngestBatcher {
    pub fn new(store: &StoreConfig, index: impl Into<String>) -> reqwest::Result<Self> {
        Ok(Self {
            client: insecure_client()?,
            bulk_url: format!("{}/_bulk", store.endpoint),
            username: store.username.clone(),
            password: store.password.clone(),
            index: index.into(),
            buf: Vec::with_capacity(BATCH_SIZE),
            totals: IngestTotals::default(),
        })
    }

    /// Append one event; a full buffer is flushed before this returns.
    pub async fn add(&mut self, event: NormalizedEvent) -> Result<(), IngestError> {
        self.buf.push(event);
        if self.buf.len() >= BATCH_SIZE {
            self.flush().await?;
        }
        Ok(())
    }

    /// Flush any remaining partial batch and return the totals.
    pub async fn finish(mut self) -> Result<IngestTotals, IngestError> {
        if !self.buf.is_empty() {
            self.flush().await?;
        }
        Ok(self.totals)
    }

    async fn flush(&mut self) -> Result<(), IngestError> {
        let submit_failed = |reason: String| IngestError::BulkSubmitFailed {
            url: self.bulk_url.clone(),
            reason,
        };

        // NDJSON framing: an action line naming the index, then the
        // document, each newline-terminated.
        let action = serde_json::json!({"index": {"_index": self.index}}).to_string();
        let mut body = String::new();
        for doc in &self.buf {
            let line = serde_json::to_string(doc)
                .map_err(|e| submit_failed(format!("failed to serialize document: {e}")))?;
            body.push_str(&action);
            body.push('\n');
            body.push_str(&line);
            body.push('\n');
        }

        info!(count = self.buf.len(), "bulk uploading documents");
        let resp = self
            .client
            .post(&self.bulk_url)
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| submit_failed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(submit_failed(format!("status {status}")));
        }

        self.totals.records_submitted += self.buf.len();
        self.totals.batches_sent += 1;
        self.buf.clear();

        match resp.json::<BulkResponse>().await {
            Ok(parsed) if parsed.errors => {
                for item in parsed.items.iter().filter(|i| i.index.status >= 300) {
                    warn!(
                        status = item.index.status,
                        error = %item.index.error.as_ref().map(|e| e.to_string()).unwrap_or_default(),
                        "document rejected by store"
                    );
                    self.totals.doc_failures += 1;
                }
            }
            Ok(_) => debug!(status = %status, "bulk request made"),
            Err(e) => debug!(error = %e, "could not parse bulk response body"),
        }

        Ok(())
    }
}
