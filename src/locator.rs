use anyhow::Result;
use regex::Regex;
use reqwest::Url;
use tracing::{debug, info};

use crate::config::ScanConfig;
use crate::error::IngestError;
use crate::resolver::{LinkResolver, MatchScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cardinality {
    /// The stage must resolve to exactly one link or the locate fails.
    ExactlyOne,
    /// The stage collects every matching link (the final artifact set).
    AnyNumber,
}

/// One hop of the walk, applied uniformly by the engine in `locate`.
struct Stage {
    name: &'static str,
    patterns: Vec<Regex>,
    cardinality: Cardinality,
    /// Optional stages are skipped without error when nothing matches.
    optional: bool,
    /// Dependent stages are only attempted when the preceding optional
    /// stage descended; they never fire from the folder above it.
    dependent: bool,
    scope: MatchScope,
}

/// Walks the storage-browser directory tree from a job page down to the
/// event artifact files. The walk is a fixed ordered stage list rather than
/// ad hoc branching; each run starts from scratch with no cached state.
pub struct ArtifactLocator {
    resolver: LinkResolver,
    stages: Vec<Stage>,
}

impl ArtifactLocator {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let exact = |dir: &str| format!("^{}$", regex::escape(dir));
        let stages = vec![
            // The job page links out to many systems; the storage browser is
            // recognized by its host signature anywhere in the link.
            Stage {
                name: "storage-browser",
                patterns: vec![Regex::new(&regex::escape(&config.browser_token))?],
                cardinality: Cardinality::ExactlyOne,
                optional: false,
                dependent: false,
                scope: MatchScope::FullUrl,
            },
            Stage {
                name: "artifacts-root",
                patterns: vec![Regex::new(&exact(&config.artifacts_dir))?],
                cardinality: Cardinality::ExactlyOne,
                optional: false,
                dependent: false,
                scope: MatchScope::LastSegment,
            },
            Stage {
                name: "test-run",
                patterns: vec![Regex::new(&regex::escape(&config.test_run_token))?],
                cardinality: Cardinality::ExactlyOne,
                optional: false,
                dependent: false,
                scope: MatchScope::LastSegment,
            },
            // Newer job layouts nest the event files one level deeper under
            // gather-extra/artifacts; older ones keep them in the test-run
            // folder. The nested artifacts hop is only meaningful inside a
            // gather-extra folder, never from the test-run folder itself.
            Stage {
                name: "gather-extra",
                patterns: vec![Regex::new(&exact(&config.gather_extra_dir))?],
                cardinality: Cardinality::ExactlyOne,
                optional: true,
                dependent: false,
                scope: MatchScope::LastSegment,
            },
            Stage {
                name: "gather-extra-artifacts",
                patterns: vec![Regex::new(&exact(&config.artifacts_dir))?],
                cardinality: Cardinality::ExactlyOne,
                optional: true,
                dependent: true,
                scope: MatchScope::LastSegment,
            },
            Stage {
                name: "event-files",
                patterns: config
                    .event_file_patterns
                    .iter()
                    .map(|p| Regex::new(p))
                    .collect::<Result<Vec<_>, _>>()?,
                cardinality: Cardinality::AnyNumber,
                optional: false,
                dependent: false,
                scope: MatchScope::LastSegment,
            },
        ];

        Ok(Self {
            resolver: LinkResolver::new(config.browser_base.clone())?,
            stages,
        })
    }

    /// Resolve the artifact file URLs for a job page. A required stage that
    /// finds zero or more than one candidate aborts the whole locate, as
    /// does an optional stage with more than one; there are no partial
    /// results.
    pub async fn locate(&self, job_url: &str) -> Result<Vec<Url>, IngestError> {
        let mut current = job_url.to_string();
        let mut descended_optional = false;

        for stage in &self.stages {
            if stage.cardinality == Cardinality::AnyNumber {
                let files = self
                    .resolver
                    .resolve_many(&current, &stage.patterns, stage.scope)
                    .await?;
                info!(stage = stage.name, count = files.len(), "resolved artifact set");
                return Ok(files);
            }

            if stage.optional {
                if stage.dependent && !descended_optional {
                    debug!(stage = stage.name, "parent folder was not entered, skipping");
                    continue;
                }
                let mut matches = self
                    .resolver
                    .resolve_many(&current, &stage.patterns, stage.scope)
                    .await?;
                match matches.len() {
                    0 => {
                        descended_optional = false;
                        debug!(stage = stage.name, "optional folder not present, skipping");
                    }
                    1 => {
                        let url = matches.remove(0);
                        info!(stage = stage.name, url = %url, "descending into optional folder");
                        current = url.into();
                        descended_optional = true;
                    }
                    found => {
                        return Err(IngestError::AmbiguousOrMissingLink {
                            url: current,
                            pattern: stage.patterns[0].to_string(),
                            found,
                        })
                    }
                }
                continue;
            }

            let url = self
                .resolver
                .resolve_one(&current, &stage.patterns[0], stage.scope)
                .await?;
            info!(stage = stage.name, url = %url, "resolved");
            current = url.into();
        }

        Ok(Vec::new())
    }
}
