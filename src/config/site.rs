//! Site configuration (_config.yml)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::detect::{DetectConfig, Metric, DEFAULT_THRESHOLD};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid exclude pattern `{pattern}`: {source}")]
    Exclude {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("threshold must be within [0, 1], got {0}")]
    Threshold(f64),
}

/// Main site configuration
///
/// Unknown keys are ignored so the tool can share a blog's existing
/// `_config.yml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Directory holding the posts, relative to the base directory
    pub source_dir: String,
    /// File extensions treated as posts
    pub extensions: Vec<String>,
    /// Glob patterns, relative to `source_dir`, of files to skip
    pub exclude: Vec<String>,

    // Detection
    pub threshold: f64,
    pub metric: Metric,
    pub parallel: bool,

    /// Default output file for `scan`
    pub report: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            source_dir: "_posts".to_string(),
            extensions: vec!["md".to_string(), "markdown".to_string()],
            exclude: Vec::new(),

            threshold: DEFAULT_THRESHOLD,
            metric: Metric::default(),
            parallel: true,

            report: None,
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        // An empty file deserializes as null
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: SiteConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::Threshold(self.threshold));
        }
        self.exclude_patterns()?;
        Ok(())
    }

    /// Compiled `exclude` patterns
    pub fn exclude_patterns(&self) -> Result<Vec<glob::Pattern>, ConfigError> {
        self.exclude
            .iter()
            .map(|pattern| {
                glob::Pattern::new(pattern).map_err(|source| ConfigError::Exclude {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect()
    }

    /// Detector settings
    pub fn detect(&self) -> DetectConfig {
        DetectConfig {
            threshold: self.threshold,
            metric: self.metric,
            parallel: self.parallel,
        }
    }

    /// Whether `path` has one of the configured extensions
    pub fn is_post_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}
