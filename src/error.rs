use thiserror::Error;

/// Everything that can go wrong between the job URL and the bulk endpoint.
/// Each variant carries the URL/pattern/count context needed to diagnose a
/// failed run from the log alone.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to fetch {url}: {source}")]
    FetchFailed { url: String, source: reqwest::Error },

    #[error("no links found on: {url}")]
    EmptyPage { url: String },

    #[error("expected 1 link matching `{pattern}` on {url}, found {found}")]
    AmbiguousOrMissingLink {
        url: String,
        pattern: String,
        found: usize,
    },

    #[error("failed to parse link `{link}` on {url}: {source}")]
    InvalidLink {
        link: String,
        url: String,
        source: url::ParseError,
    },

    #[error("failed to parse artifact {file}: {source}")]
    ArtifactParseFailed {
        file: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("bulk submit to {url} failed: {reason}")]
    BulkSubmitFailed { url: String, reason: String },
}
