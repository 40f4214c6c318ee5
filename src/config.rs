/// Default storage-browser front end over the CI artifact bucket.
pub const DEFAULT_BROWSER_BASE: &str = "https://gcsweb-ci.apps.ci.l2s4.p1.openshiftapps.com";
/// Direct storage host used for raw file downloads.
pub const DEFAULT_STORAGE_BASE: &str = "https://storage.googleapis.com";
/// Default OpenSearch cluster the bulk endpoint lives on.
pub const DEFAULT_ENDPOINT: &str =
    "https://search-trt-opensearch-test-m4gt2sys3kyzqeqauf4fr27x7u.us-east-1.es.amazonaws.com";

/// Hostnames and path tokens the locator walks by. Production values are the
/// defaults; tests point `browser_base` at a fixture server.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Base URL path-absolute links are rebased onto.
    pub browser_base: String,
    /// Raw storage host substituted for `<browser_base>/gcs` before downloads.
    pub storage_base: String,
    /// Substring identifying the storage-browser link on the job page.
    pub browser_token: String,
    /// Folder name of the artifacts root under the job bucket.
    pub artifacts_dir: String,
    /// Substring identifying the test-run folder (case-sensitive).
    pub test_run_token: String,
    /// Optional extra-gather folder nested inside the test-run folder.
    pub gather_extra_dir: String,
    /// Filename patterns of the event artifacts to collect.
    pub event_file_patterns: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            browser_base: DEFAULT_BROWSER_BASE.to_string(),
            storage_base: DEFAULT_STORAGE_BASE.to_string(),
            browser_token: "gcsweb".to_string(),
            artifacts_dir: "artifacts".to_string(),
            test_run_token: "e2e".to_string(),
            gather_extra_dir: "gather-extra".to_string(),
            event_file_patterns: vec![r"^e2e-events_.*\.json$".to_string()],
        }
    }
}

/// Indexing-store endpoint and basic-auth credentials.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
}
