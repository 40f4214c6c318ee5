use std::time::Duration;

use regex::Regex;
use reqwest::{Client, Url};
use tracing::debug;

use crate::error::IngestError;
use crate::links::extract_links;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Which part of a candidate link a stage pattern is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchScope {
    /// The last non-empty path segment, one trailing slash stripped.
    LastSegment,
    /// The whole link as written (used for host-signature matching).
    FullUrl,
}

/// Shared HTTP client for listing pages, artifact downloads and bulk posts.
/// TLS certificate verification is disabled: the storage browser sits behind
/// an internal CA the uploader host does not trust (security note: explicit
/// insecure mode).
pub fn insecure_client() -> reqwest::Result<Client> {
    Client::builder()
        .timeout(FETCH_TIMEOUT)
        .danger_accept_invalid_certs(true)
        .build()
}

/// Last non-empty path segment of a link, with a single trailing slash
/// stripped first, so `a/b/` and `a/b` both yield `b`.
pub fn last_path_segment(link: &str) -> &str {
    let trimmed = link.strip_suffix('/').unwrap_or(link);
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Fetches a listing page and picks out the links matching a pattern.
/// Single-shot: a timeout or non-2xx response is surfaced to the caller,
/// never retried here.
pub struct LinkResolver {
    client: Client,
    browser_base: String,
}

impl LinkResolver {
    pub fn new(browser_base: impl Into<String>) -> reqwest::Result<Self> {
        Ok(Self {
            client: insecure_client()?,
            browser_base: browser_base.into(),
        })
    }

    /// Resolve the single link on `page_url` matching `pattern`. Anything
    /// other than exactly one match is an error carrying the count found.
    pub async fn resolve_one(
        &self,
        page_url: &str,
        pattern: &Regex,
        scope: MatchScope,
    ) -> Result<Url, IngestError> {
        let mut matches = self
            .resolve_many(page_url, std::slice::from_ref(pattern), scope)
            .await?;
        if matches.len() != 1 {
            return Err(IngestError::AmbiguousOrMissingLink {
                url: page_url.to_string(),
                pattern: pattern.to_string(),
                found: matches.len(),
            });
        }
        Ok(matches.remove(0))
    }

    /// Resolve every link on `page_url` matching any of `patterns`, in
    /// document order. A page with no links at all is an error; links that
    /// merely fail every pattern are not, callers get an empty set back.
    pub async fn resolve_many(
        &self,
        page_url: &str,
        patterns: &[Regex],
        scope: MatchScope,
    ) -> Result<Vec<Url>, IngestError> {
        let links = self.fetch_links(page_url).await?;
        if links.is_empty() {
            return Err(IngestError::EmptyPage {
                url: page_url.to_string(),
            });
        }

        let mut matched = Vec::new();
        for link in links {
            debug!(link = %link, "checking link");
            let candidate = match scope {
                MatchScope::FullUrl => link.as_str(),
                MatchScope::LastSegment => last_path_segment(&link),
            };
            if patterns.iter().any(|re| re.is_match(candidate)) {
                debug!(link = %link, "found link match");
                matched.push(self.rebase(&link, page_url)?);
            }
        }
        Ok(matched)
    }

    /// Path-absolute links are rebased onto the storage-browser host;
    /// everything else is expected to already be absolute.
    fn rebase(&self, link: &str, page_url: &str) -> Result<Url, IngestError> {
        let absolute = if link.starts_with('/') {
            format!("{}{}", self.browser_base, link)
        } else {
            link.to_string()
        };
        Url::parse(&absolute).map_err(|source| IngestError::InvalidLink {
            link: link.to_string(),
            url: page_url.to_string(),
            source,
        })
    }

    async fn fetch_links(&self, page_url: &str) -> Result<Vec<String>, IngestError> {
        let fetch_failed = |source| IngestError::FetchFailed {
            url: page_url.to_string(),
            source,
        };
        let body = self
            .client
            .get(page_url)
            .send()
            .await
            .map_err(fetch_failed)?
            .error_for_status()
            .map_err(fetch_failed)?
            .text()
            .await
            .map_err(fetch_failed)?;
        Ok(extract_links(&body))
    }
}
