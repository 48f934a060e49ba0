//! Scan posts and emit the JSON report

use anyhow::{Context, Result};
use notify::{Event, RecursiveMode, Watcher};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

use crate::config::SiteConfig;
use crate::detect::Metric;
use crate::report::Report;
use crate::{Site, CONFIG_FILE};

/// Scan the site and write the report to `output`, or stdout
pub fn run(site: &Site, output: Option<&Path>) -> Result<Report> {
    let start = std::time::Instant::now();

    let report = site.scan()?;
    let json = report.to_json()?;

    match report_path(site, output) {
        Some(path) => write_report(&path, &json)?,
        None => println!("{}", json),
    }

    tracing::info!(
        "Found {} duplicate classes in {:.2}s",
        report.duplicates().count(),
        start.elapsed().as_secs_f64()
    );

    Ok(report)
}

fn write_report(path: &Path, json: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format!("{}\n", json))
        .with_context(|| format!("Failed to write report to {:?}", path))?;
    tracing::info!("Wrote report to {:?}", path);
    Ok(())
}

/// Command-line settings layered over `_config.yml`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Overrides {
    pub threshold: Option<f64>,
    pub metric: Option<Metric>,
    pub sequential: bool,
}

impl Overrides {
    pub fn apply(&self, config: &mut SiteConfig) {
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(metric) = self.metric {
            config.metric = metric;
        }
        if self.sequential {
            config.parallel = false;
        }
    }
}

/// Re-read `_config.yml` and apply the overrides again
fn reload(site: &Site, overrides: &Overrides) -> Result<Site> {
    let mut fresh = Site::new(&site.base_dir)?;
    overrides.apply(&mut fresh.config);
    fresh.config.validate()?;
    Ok(fresh)
}

/// Where `run` writes the report, if not stdout
fn report_path(site: &Site, output: Option<&Path>) -> Option<PathBuf> {
    output
        .map(Path::to_path_buf)
        .or_else(|| site.config.report.as_ref().map(|r| site.base_dir.join(r)))
}

fn same_file(a: &Path, b: &Path) -> bool {
    a == b || matches!((a.canonicalize(), b.canonicalize()), (Ok(a), Ok(b)) if a == b)
}

/// Events touching only the report file are our own writes
fn is_relevant(event: &Event, report: Option<&Path>) -> bool {
    match report {
        Some(report) => {
            event.paths.is_empty() || event.paths.iter().any(|p| !same_file(p, report))
        }
        None => true,
    }
}

/// Watch the posts and `_config.yml`, rescanning on changes
pub fn watch(site: &Site, overrides: Overrides, output: Option<&Path>) -> Result<()> {
    let (tx, rx) = channel();

    let mut watcher = notify::recommended_watcher(move |res| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    let mut site = site.clone();
    watcher.watch(site.source_dir.as_ref(), RecursiveMode::Recursive)?;

    let config_path = site.base_dir.join(CONFIG_FILE);
    if config_path.exists() {
        watcher.watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    // Debounce events
    let mut last_scan = std::time::Instant::now();

    loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                let report = report_path(&site, output);
                if !is_relevant(&event, report.as_deref()) {
                    continue;
                }
                if last_scan.elapsed() <= Duration::from_millis(500) {
                    continue;
                }

                match reload(&site, &overrides) {
                    Ok(fresh) => {
                        if fresh.source_dir != site.source_dir {
                            let _ = watcher.unwatch(&site.source_dir);
                            watcher.watch(&fresh.source_dir, RecursiveMode::Recursive)?;
                            tracing::info!("Now watching {:?}", fresh.source_dir);
                        }
                        site = fresh;
                    }
                    Err(e) => tracing::error!("Keeping previous config: {}", e),
                }

                tracing::info!("File changed, rescanning...");
                if let Err(e) = run(&site, output) {
                    tracing::error!("Scan failed: {}", e);
                }
                last_scan = std::time::Instant::now();
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{EventKind, ModifyKind};

    #[test]
    fn test_run_writes_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let posts = dir.path().join("_posts");
        fs::create_dir_all(&posts).unwrap();
        fs::write(posts.join("a.md"), "---\ntitle: A\n---\nhello world\n").unwrap();

        let site = Site::new(dir.path()).unwrap();
        let out = dir.path().join("out/report.json");
        let report = run(&site, Some(&out)).unwrap();
        assert_eq!(report.documents, 1);

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["classes"][0]["canonical"]["path"], "a.md");
    }

    #[test]
    fn test_report_writes_are_not_changes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "report: _posts/report.json\n").unwrap();
        let posts = dir.path().join("_posts");
        fs::create_dir_all(&posts).unwrap();
        fs::write(posts.join("a.md"), "---\ntitle: A\n---\nhello world\n").unwrap();

        let site = Site::new(dir.path()).unwrap();
        run(&site, None).unwrap();
        let report = report_path(&site, None).unwrap();
        assert_eq!(report, posts.join("report.json"));
        assert!(report.exists());

        let modify = || Event::new(EventKind::Modify(ModifyKind::Any));
        assert!(!is_relevant(&modify().add_path(report.clone()), Some(&report)));
        assert!(is_relevant(&modify().add_path(posts.join("a.md")), Some(&report)));
        assert!(is_relevant(
            &modify().add_path(report.clone()).add_path(posts.join("a.md")),
            Some(&report)
        ));
        assert!(is_relevant(&modify().add_path(report.clone()), None));
    }

    #[test]
    fn test_reload_keeps_overrides() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "threshold: 0.5\n").unwrap();
        let site = Site::new(dir.path()).unwrap();

        let overrides = Overrides {
            metric: Some(Metric::Edit),
            sequential: true,
            ..Default::default()
        };
        fs::write(dir.path().join(CONFIG_FILE), "threshold: 0.7\nsource_dir: posts\n").unwrap();

        let fresh = reload(&site, &overrides).unwrap();
        assert_eq!(fresh.config.threshold, 0.7);
        assert_eq!(fresh.config.metric, Metric::Edit);
        assert!(!fresh.config.parallel);
        assert_eq!(fresh.source_dir, dir.path().join("posts"));

        fs::write(dir.path().join(CONFIG_FILE), "threshold: 2\n").unwrap();
        assert!(reload(&site, &overrides).is_err());
    }
}
