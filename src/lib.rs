//! postrev: find duplicate and near-duplicate blog post revisions
//!
//! Posts are ingested from a source directory into an append-only store,
//! grouped into equivalence classes of revisions of the same article, and
//! each class is resolved to its canonical latest revision.

pub mod commands;
pub mod config;
pub mod content;
pub mod detect;
pub mod report;
pub mod resolve;
pub mod store;

use anyhow::Result;
use std::path::Path;

use detect::Detector;
use report::Report;
use store::loader::{ContentLoader, LoadOutcome};

/// Config file looked up in the base directory
pub const CONFIG_FILE: &str = "_config.yml";

/// A blog checkout to scan
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Directory holding the posts
    pub source_dir: std::path::PathBuf,
}

impl Site {
    /// Create a new site from a directory, reading `_config.yml` if present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let config_path = base_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let source_dir = base_dir.join(&config.source_dir);
        Self {
            config,
            base_dir,
            source_dir,
        }
    }

    /// Ingest every post under the source directory
    pub fn load(&self) -> Result<LoadOutcome> {
        ContentLoader::new(self)?.load()
    }

    /// Load, group and resolve the site's posts
    pub fn scan(&self) -> Result<Report> {
        let outcome = self.load()?;
        let detector = Detector::new(self.config.detect());

        let classes = detector.partition(&outcome.store);
        let resolutions = resolve::resolve_all(&classes);
        tracing::info!(
            "{} documents in {} classes",
            outcome.store.len(),
            classes.len()
        );

        Ok(Report::new(detector.config(), &resolutions, outcome.statuses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SPARK: &str = "---\ntitle: Apache Spark serialize\ncategories: [spark]\n---\n\
{% include toc %}\n\nSpark ships closures to executors, so everything they capture has to be \
serializable. Java serialization works out of the box but it is slow and verbose. Kryo is \
faster; register your classes up front with registerKryoClasses.\n";

    const SPARK_FIXED: &str = "---\ntitle: Apache Spark serialize\ncategories: [spark]\n---\n\
{% include toc %}\n\nSpark ships closures to executors, so everything they capture has to be \
serializable.  Java serialization works out of the box but it is slow and verbose.\n\nKryo is \
faster; register your classes up front with registerKryoClasses.\n";

    const HARDWARE: &str = "---\ntitle: New build\ncategories: [hardware]\n---\n\
Ryzen 5, a B450 board, two sticks of DDR4 and a quiet tower cooler. Cable management took \
longer than the rest of the build.\n";

    #[test]
    fn test_scan_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let posts = dir.path().join("_posts");
        fs::create_dir_all(&posts).unwrap();
        fs::write(posts.join("2017-03-21-apache-spark-serialize.md"), SPARK).unwrap();
        fs::write(posts.join("2017-03-22-new-build.md"), HARDWARE).unwrap();
        fs::write(posts.join("2017-03-23-broken.md"), "---\ntitle: oops\n").unwrap();
        fs::write(posts.join("2017-03-24-spark-serialize.md"), SPARK_FIXED).unwrap();

        let site = Site::new(dir.path()).unwrap();
        let report = site.scan().unwrap();

        assert_eq!(report.documents, 3);
        assert_eq!(report.classes.len(), 2);
        assert_eq!(
            report.classes[0].canonical.path,
            "2017-03-24-spark-serialize.md"
        );
        assert_eq!(
            report.classes[0].superseded,
            vec!["2017-03-21-apache-spark-serialize.md"]
        );
        assert_eq!(report.classes[1].canonical.path, "2017-03-22-new-build.md");
        assert_eq!(report.files.len(), 4);
    }

    #[test]
    fn test_site_reads_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "source_dir: posts\nthreshold: 0.5\n").unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.source_dir, dir.path().join("posts"));
        assert_eq!(site.config.threshold, 0.5);
    }
}
