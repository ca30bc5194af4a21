pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod extractor;
pub mod materializer;
pub mod merger;
pub mod serializer;
pub mod ui;

// Public API re-exports
pub use cli::{CopyCli, MergeCli, OutputFormat};
pub use config::{CliOverrides, Config, CopyConfig, MergeConfig, SpiderConfig};
pub use document::{derive_output_path, SiteDocument};
pub use error::{Result, SiteKitError, UserFriendlyError};

// Core functionality re-exports
pub use extractor::{extract_local_paths, paths_between, PathExtractor};
pub use materializer::{CopyEvent, CopyProgress, CopyReport, FileOperations, KeyWindow};
pub use merger::{
    update_spider, MergeReport, MergeStats, SiteMerger, SplicePosition, SpiderUpdate,
};
pub use serializer::to_compact_string;
pub use ui::{OutputFormatter, OutputMode, ProgressAwareOutput, ProgressManager};

use std::path::{Path, PathBuf};

/// Main library interface shared by both binaries
pub struct SiteKit {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
}

impl SiteKit {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        // The bar would interleave with machine-readable output.
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);

        Self {
            config,
            output_formatter,
            progress_manager,
        }
    }

    pub fn from_copy_cli(cli_args: &CopyCli) -> Result<Self> {
        let config = cli_args.load_config()?;
        Ok(Self::new(
            config,
            cli_args.common.output_format.into(),
            cli_args.common.verbose,
            cli_args.common.quiet,
        ))
    }

    pub fn from_merge_cli(cli_args: &MergeCli) -> Result<Self> {
        let config = cli_args.load_config()?;
        Ok(Self::new(
            config,
            cli_args.common.output_format.into(),
            cli_args.common.verbose,
            cli_args.common.quiet,
        ))
    }

    /// Copy every local file referenced between the configured start and end
    /// keys of `document_path` from the source root into the destination root.
    pub fn copy_referenced_files<P: AsRef<Path>>(
        &self,
        document_path: P,
        dry_run: bool,
    ) -> Result<CopyReport> {
        let copy_config = &self.config.copy;
        let document_path = document_path.as_ref();

        self.output_formatter
            .start_operation(&format!("Scanning {}", document_path.display()));
        let document = SiteDocument::load(document_path)?;

        let extractor = PathExtractor::new(&copy_config.start_key, &copy_config.end_key);
        let paths = extractor.extract(document.sites());
        tracing::debug!(count = paths.len(), "local paths collected");

        let report = CopyReport::new(
            document_path.to_path_buf(),
            KeyWindow {
                start_key: copy_config.start_key.clone(),
                end_key: copy_config.end_key.clone(),
            },
            copy_config.source_root.clone(),
            copy_config.dest_root.clone(),
            paths,
        );

        if report.is_empty() {
            self.output_formatter.warning(&format!(
                "No local paths found between '{}' and '{}'",
                copy_config.start_key, copy_config.end_key
            ));
            return Ok(if dry_run { report.as_dry_run() } else { report });
        }

        self.output_formatter
            .info(&format!("Found {} local paths", report.paths.len()));

        let file_ops = FileOperations::new().with_preserve_mtime(copy_config.preserve_mtime);

        if dry_run {
            let progress =
                file_ops.plan(&report.paths, &copy_config.source_root, &copy_config.dest_root);
            for file in &progress.copied {
                self.output_formatter
                    .info(&format!("Would copy: {}", file.destination.display()));
            }
            self.print_problems(&progress);
            let report = report.with_progress(progress).as_dry_run();
            self.output_formatter.print_copy_summary(&report);
            return Ok(report);
        }

        let progress = self.materialize(&file_ops, &report.paths)?;
        let report = report.with_progress(progress);
        self.output_formatter.print_copy_summary(&report);

        Ok(report)
    }

    fn materialize(&self, file_ops: &FileOperations, paths: &[String]) -> Result<CopyProgress> {
        let copy_config = &self.config.copy;
        self.output_formatter.start_operation("Copying referenced files");

        let copy_progress = self.progress_manager.create_copy_progress(paths.len() as u64);
        let output = ProgressAwareOutput::new(&self.output_formatter, Some(&self.progress_manager));

        let event_callback = |progress: &CopyProgress, event: &CopyEvent| {
            ui::progress::update_copy_progress(&copy_progress, progress, event);
            match event {
                CopyEvent::Copied(file) => {
                    output.success(&format!("Copied: {}", file.destination.display()))
                }
                CopyEvent::Missing { source } => {
                    output.warning(&format!("Source file not found: {}", source.display()))
                }
                CopyEvent::Failed { path, reason } => {
                    output.error(&format!("Failed to copy {}: {}", path, reason))
                }
            }
        };

        let progress = file_ops.materialize(
            paths,
            &copy_config.source_root,
            &copy_config.dest_root,
            Some(&event_callback),
        )?;

        ui::progress::finish_progress_with_summary(
            &copy_progress,
            &format!("Copied {} files", progress.files_copied()),
            progress.elapsed(),
        );

        Ok(progress)
    }

    fn print_problems(&self, progress: &CopyProgress) {
        for source in &progress.missing {
            self.output_formatter
                .warning(&format!("Source file not found: {}", source.display()));
        }
        for error in &progress.errors {
            self.output_formatter.error(error);
        }
    }

    /// Merge the sites of `source` into `base`, refresh the spider checksum and
    /// save the result next to the base (or to `output_override`).
    pub fn merge_sites<P: AsRef<Path>>(
        &self,
        source: &str,
        base: P,
        output_override: Option<&Path>,
        dry_run: bool,
    ) -> Result<MergeReport> {
        let merge_config = &self.config.merge;
        let base = base.as_ref();

        self.output_formatter
            .start_operation(&format!("Merging {} into {}", source, base.display()));

        let source_document = SiteDocument::fetch(source)?;
        let mut base_document = SiteDocument::load(base)?;

        let site_merger = SiteMerger::new(merge_config);
        let stats = site_merger.merge_documents(&source_document, &mut base_document)?;

        self.output_formatter.info(&format!(
            "Updated {} sites",
            stats.source_entries - stats.non_objects_dropped
        ));
        if stats.splice == SplicePosition::Appended {
            self.output_formatter.warning(&format!(
                "Marker key '{}' not found, sites appended at the end",
                site_merger.marker_key()
            ));
        }

        let spider = update_spider(&mut base_document, &self.config.spider)?;
        match &spider {
            SpiderUpdate::Updated { descriptor, .. } => {
                self.output_formatter.spider_updated(descriptor)
            }
            SpiderUpdate::JarMissing { candidates } => {
                let tried: Vec<String> = candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                self.output_formatter.warning(&format!(
                    "Spider jar not found ({}), spider left unchanged",
                    tried.join(", ")
                ));
            }
        }

        let output_path = self.output_path(base, output_override);
        let report = MergeReport::new(
            source.to_string(),
            base.to_path_buf(),
            output_path.clone(),
            stats,
            spider,
        );

        if dry_run {
            let report = report.as_dry_run();
            self.output_formatter.print_merge_report(&report);
            return Ok(report);
        }

        base_document.save(&output_path)?;
        tracing::info!(output = %output_path.display(), "merged document saved");
        self.output_formatter.print_merge_report(&report);

        Ok(report)
    }

    fn output_path(&self, base: &Path, output_override: Option<&Path>) -> PathBuf {
        match output_override {
            Some(path) => path.to_path_buf(),
            None => derive_output_path(base, &self.config.merge.output_suffix),
        }
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        Config::default().save_to_file(output_path)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn progress_manager(&self) -> &ProgressManager {
        &self.progress_manager
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &SiteKitError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn quiet_kit(config: Config) -> SiteKit {
        SiteKit::new(config, OutputMode::Plain, 0, true)
    }

    fn write_json(path: &Path, value: &serde_json::Value) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_string(value).unwrap()).unwrap();
    }

    #[test]
    fn test_sitekit_creation() {
        let kit = SiteKit::new(Config::default(), OutputMode::Json, 1, false);
        assert_eq!(kit.config().merge.marker_key, "cbh");
        assert_eq!(kit.output_formatter().mode(), OutputMode::Json);
        assert!(!kit.progress_manager().is_enabled());
    }

    #[test]
    fn test_copy_referenced_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        write_json(
            &root.join("api.json"),
            &json!({"sites": [
                {"key": "cbh"},
                {"key": "a", "api": "./py/a.py", "ext": "./XBPQ/a.json?x=1"},
                {"key": "b", "ext": "../gone.json"},
                {"key": "奇优", "ext": "./after.json"}
            ]}),
        );
        fs::create_dir_all(root.join("xiaosa/py")).unwrap();
        fs::create_dir_all(root.join("xiaosa/XBPQ")).unwrap();
        fs::write(root.join("xiaosa/py/a.py"), "print(1)").unwrap();
        fs::write(root.join("xiaosa/XBPQ/a.json"), "{}").unwrap();
        fs::write(root.join("xiaosa/after.json"), "{}").unwrap();

        let mut config = Config::default();
        config.copy.source_root = root.join("xiaosa");
        config.copy.dest_root = root.join("out");

        let report = quiet_kit(config)
            .copy_referenced_files(root.join("api.json"), false)
            .unwrap();

        assert_eq!(report.paths, vec!["./py/a.py", "./XBPQ/a.json", "../gone.json"]);
        assert_eq!(report.summary_line(), "Done: copied 2, missing 1");
        assert!(root.join("out/py/a.py").exists());
        assert!(root.join("out/XBPQ/a.json").exists());
        assert!(!root.join("out/after.json").exists());
    }

    #[test]
    fn test_copy_dry_run_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        write_json(
            &root.join("api.json"),
            &json!({"sites": [{"key": "cbh"}, {"key": "a", "ext": "./a.txt"}, {"key": "奇优"}]}),
        );
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/a.txt"), "a").unwrap();

        let mut config = Config::default();
        config.copy.source_root = root.join("src");
        config.copy.dest_root = root.join("dest");

        let report = quiet_kit(config)
            .copy_referenced_files(root.join("api.json"), true)
            .unwrap();

        assert!(report.dry_run);
        assert_eq!(report.copied.len(), 1);
        assert!(!root.join("dest").exists());
    }

    #[test]
    fn test_copy_without_markers_finds_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let document = temp_dir.path().join("api.json");
        write_json(&document, &json!({"sites": [{"key": "a", "ext": "./a.txt"}]}));

        let report = quiet_kit(Config::default())
            .copy_referenced_files(&document, false)
            .unwrap();
        assert!(report.is_empty());
        assert!(!report.has_problems());
    }

    #[test]
    fn test_copy_missing_document() {
        let temp_dir = TempDir::new().unwrap();
        let result = quiet_kit(Config::default())
            .copy_referenced_files(temp_dir.path().join("nope.json"), false);
        assert!(matches!(result, Err(SiteKitError::DocumentNotFound { .. })));
    }

    fn merge_fixture(root: &Path) -> Config {
        write_json(
            &root.join("api.json"),
            &json!({"sites": [
                {"key": "豆瓣", "name": "Douban"},
                {"key": "x", "name": "X", "api": "./js/drpy2.min.js", "jar": "j"},
                {"key": "y", "name": "Existing"},
                "not-an-object"
            ]}),
        );
        write_json(
            &root.join("dianshi.json"),
            &json!({"spider": "old", "sites": [
                {"key": "cbh", "name": "C"},
                {"key": "z", "name": "Existing"}
            ], "lives": []}),
        );
        fs::create_dir_all(root.join("jar")).unwrap();
        fs::write(root.join("jar/spider.jar"), "hello").unwrap();

        let mut config = Config::default();
        config.spider.primary_jar = root.join("jar/spider.jar");
        config.spider.fallback_jar = root.join("missing/spider.jar");
        config
    }

    #[test]
    fn test_merge_sites_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let config = merge_fixture(root);

        let source = root.join("api.json").display().to_string();
        let report = quiet_kit(config)
            .merge_sites(&source, root.join("dianshi.json"), None, false)
            .unwrap();

        assert_eq!(report.output, root.join("dianshi_with_app_sites.json"));
        assert_eq!(report.sites_updated(), 3);
        assert!(report.marker_found());
        assert!(report.spider_updated());

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report.output).unwrap()).unwrap();
        assert_eq!(
            saved["sites"],
            json!([
                {"key": "cbh", "name": "C"},
                {"key": "x", "name": "X", "api": "./lib/drpy2.min.js"},
                {"key": "z", "name": "Existing"}
            ])
        );
        assert_eq!(
            saved["spider"],
            "./jar/spider.jar;md5;5d41402abc4b2a76b9719d911017c592"
        );
        assert_eq!(saved["lives"], json!([]));
    }

    #[test]
    fn test_merge_dry_run_and_override() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let config = merge_fixture(root);
        let kit = quiet_kit(config);
        let source = root.join("api.json").display().to_string();

        let report = kit
            .merge_sites(&source, root.join("dianshi.json"), None, true)
            .unwrap();
        assert!(report.dry_run);
        assert!(!root.join("dianshi_with_app_sites.json").exists());

        let custom = root.join("nested/merged.json");
        kit.merge_sites(&source, root.join("dianshi.json"), Some(custom.as_path()), false)
            .unwrap();
        assert!(custom.exists());
    }

    #[test]
    fn test_merge_rejects_remote_source() {
        let temp_dir = TempDir::new().unwrap();
        let config = merge_fixture(temp_dir.path());

        let result = quiet_kit(config).merge_sites(
            "https://example.com/api.json",
            temp_dir.path().join("dianshi.json"),
            None,
            false,
        );
        assert!(matches!(result, Err(SiteKitError::RemoteSourceUnsupported { .. })));
    }

    #[test]
    fn test_sample_config_generation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("sample.toml");

        SiteKit::generate_sample_config(&config_path).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[copy]"));
        assert!(content.contains("[merge]"));
        assert!(content.contains("[spider]"));
    }
}
