use crate::materializer::file_copier::{CopiedFile, CopyProgress};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct CopyReport {
    pub document: PathBuf,
    pub window: KeyWindow,
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
    pub paths: Vec<String>,
    pub copied: Vec<CopiedFile>,
    pub missing: Vec<PathBuf>,
    pub errors: Vec<String>,
    pub bytes_copied: u64,
    pub duration: Duration,
    pub generated_at: DateTime<Utc>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KeyWindow {
    pub start_key: String,
    pub end_key: String,
}

impl CopyReport {
    pub fn new(
        document: PathBuf,
        window: KeyWindow,
        source_root: PathBuf,
        dest_root: PathBuf,
        paths: Vec<String>,
    ) -> Self {
        Self {
            document,
            window,
            source_root,
            dest_root,
            paths,
            copied: Vec::new(),
            missing: Vec::new(),
            errors: Vec::new(),
            bytes_copied: 0,
            duration: Duration::ZERO,
            generated_at: Utc::now(),
            dry_run: false,
        }
    }

    pub fn with_progress(mut self, progress: CopyProgress) -> Self {
        self.duration = progress.elapsed();
        self.bytes_copied = progress.bytes_copied;
        self.copied = progress.copied;
        self.missing = progress.missing;
        self.errors = progress.errors;
        self
    }

    pub fn as_dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn has_problems(&self) -> bool {
        !self.missing.is_empty() || !self.errors.is_empty()
    }

    pub fn summary_line(&self) -> String {
        let lead = if self.dry_run { "Dry run: would copy" } else { "Done: copied" };
        let mut line = format!(
            "{} {}, missing {}",
            lead,
            self.copied.len(),
            self.missing.len()
        );
        if !self.errors.is_empty() {
            line.push_str(&format!(", failed {}", self.errors.len()));
        }
        line
    }
}
