use crate::merger::checksum::SpiderUpdate;
use crate::merger::site_merger::{MergeStats, SplicePosition};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub source: String,
    pub base: PathBuf,
    pub output: PathBuf,
    pub stats: MergeStats,
    pub spider: SpiderUpdate,
    pub generated_at: DateTime<Utc>,
    pub dry_run: bool,
}

impl MergeReport {
    pub fn new(
        source: String,
        base: PathBuf,
        output: PathBuf,
        stats: MergeStats,
        spider: SpiderUpdate,
    ) -> Self {
        Self {
            source,
            base,
            output,
            stats,
            spider,
            generated_at: Utc::now(),
            dry_run: false,
        }
    }

    pub fn as_dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Object entries of the source list; each went through rewriting and
    /// stripping before the key and name filters ran.
    pub fn sites_updated(&self) -> usize {
        self.stats.source_entries - self.stats.non_objects_dropped
    }

    pub fn marker_found(&self) -> bool {
        matches!(self.stats.splice, SplicePosition::AfterMarker { .. })
    }

    pub fn spider_updated(&self) -> bool {
        matches!(self.spider, SpiderUpdate::Updated { .. })
    }

    pub fn has_warnings(&self) -> bool {
        !self.marker_found() || !self.spider_updated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(splice: SplicePosition) -> MergeStats {
        MergeStats {
            source_entries: 5,
            non_objects_dropped: 1,
            fields_rewritten: 0,
            fields_stripped: 2,
            removed_by_key: 1,
            deduped_by_name: 1,
            inserted: 2,
            marker_key: "cbh".to_string(),
            splice,
            total_sites: 4,
        }
    }

    #[test]
    fn test_report_flags() {
        let report = MergeReport::new(
            "api.json".to_string(),
            PathBuf::from("dianshi.json"),
            PathBuf::from("dianshi_with_app_sites.json"),
            stats(SplicePosition::AfterMarker { index: 0 }),
            SpiderUpdate::Updated {
                jar_path: PathBuf::from("jar/spider.jar"),
                digest: "abc".to_string(),
                descriptor: "./jar/spider.jar;md5;abc".to_string(),
            },
        );

        assert_eq!(report.sites_updated(), 4);
        assert!(report.marker_found());
        assert!(report.spider_updated());
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_report_warnings_and_json() {
        let report = MergeReport::new(
            "api.json".to_string(),
            PathBuf::from("dianshi.json"),
            PathBuf::from("out.json"),
            stats(SplicePosition::Appended),
            SpiderUpdate::JarMissing {
                candidates: vec![PathBuf::from("jar/spider.jar")],
            },
        )
        .as_dry_run();

        assert!(report.has_warnings());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["stats"]["splice"]["position"], "appended");
        assert_eq!(json["spider"]["status"], "jar_missing");
        assert_eq!(json["dry_run"], true);
    }
}
