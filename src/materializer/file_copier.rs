use crate::error::{Result, SiteKitError};
use serde::Serialize;
use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CopiedFile {
    pub relative_path: PathBuf,
    pub destination: PathBuf,
    pub bytes: u64,
}

/// What happened to a single referenced path.
#[derive(Debug, Clone, PartialEq)]
pub enum CopyEvent {
    Copied(CopiedFile),
    Missing { source: PathBuf },
    Failed { path: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct CopyProgress {
    pub total_paths: usize,
    pub paths_processed: usize,
    pub bytes_copied: u64,
    pub copied: Vec<CopiedFile>,
    pub missing: Vec<PathBuf>,
    pub errors: Vec<String>,
    pub start_time: Instant,
}

impl CopyProgress {
    pub fn new(total_paths: usize) -> Self {
        Self {
            total_paths,
            paths_processed: 0,
            bytes_copied: 0,
            copied: Vec::new(),
            missing: Vec::new(),
            errors: Vec::new(),
            start_time: Instant::now(),
        }
    }

    pub fn record(&mut self, event: &CopyEvent) {
        self.paths_processed += 1;
        match event {
            CopyEvent::Copied(file) => {
                self.bytes_copied += file.bytes;
                self.copied.push(file.clone());
            }
            CopyEvent::Missing { source } => self.missing.push(source.clone()),
            CopyEvent::Failed { path, reason } => {
                self.errors.push(format!("Failed to copy {}: {}", path, reason))
            }
        }
    }

    pub fn files_copied(&self) -> usize {
        self.copied.len()
    }

    pub fn files_missing(&self) -> usize {
        self.missing.len()
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Copies referenced files from a source tree into a destination tree.
pub struct FileOperations {
    preserve_mtime: bool,
    buffer_size: usize,
}

impl FileOperations {
    pub fn new() -> Self {
        Self {
            preserve_mtime: true,
            buffer_size: 64 * 1024, // 64KB buffer
        }
    }

    pub fn with_preserve_mtime(mut self, preserve: bool) -> Self {
        self.preserve_mtime = preserve;
        self
    }

    /// Copy every path from `source_root` to `dest_root`. Per-file problems
    /// are recorded in the returned progress and never stop the batch.
    pub fn materialize(
        &self,
        paths: &[String],
        source_root: &Path,
        dest_root: &Path,
        event_callback: Option<&dyn Fn(&CopyProgress, &CopyEvent)>,
    ) -> Result<CopyProgress> {
        let mut progress = CopyProgress::new(paths.len());

        if !dest_root.exists() {
            fs::create_dir_all(dest_root)?;
        }

        for path in paths {
            let event = self.copy_one(path, source_root, dest_root);
            progress.record(&event);

            if let Some(callback) = event_callback {
                callback(&progress, &event);
            }
        }

        tracing::info!(
            copied = progress.files_copied(),
            missing = progress.files_missing(),
            failed = progress.errors.len(),
            "materialize finished"
        );

        Ok(progress)
    }

    /// Classify every path the way `materialize` would without writing
    /// anything. Sizes come from the source files.
    pub fn plan(&self, paths: &[String], source_root: &Path, dest_root: &Path) -> CopyProgress {
        let mut progress = CopyProgress::new(paths.len());

        for path in paths {
            let event = match relative_target(path) {
                Ok(relative) => {
                    let source = source_root.join(&relative);
                    match fs::metadata(&source) {
                        Ok(metadata) if metadata.is_file() => {
                            let destination = dest_root.join(&relative);
                            if is_same_file(&source, &destination) {
                                CopyEvent::Failed {
                                    path: path.to_string(),
                                    reason: "source and destination are the same file".to_string(),
                                }
                            } else {
                                CopyEvent::Copied(CopiedFile {
                                    destination,
                                    relative_path: relative,
                                    bytes: metadata.len(),
                                })
                            }
                        }
                        _ => CopyEvent::Missing { source },
                    }
                }
                Err(e) => CopyEvent::Failed {
                    path: path.to_string(),
                    reason: e.to_string(),
                },
            };
            progress.record(&event);
        }

        progress
    }

    fn copy_one(&self, path: &str, source_root: &Path, dest_root: &Path) -> CopyEvent {
        let relative = match relative_target(path) {
            Ok(relative) => relative,
            Err(e) => {
                return CopyEvent::Failed {
                    path: path.to_string(),
                    reason: e.to_string(),
                }
            }
        };

        let source = source_root.join(&relative);
        let destination = dest_root.join(&relative);

        if !source.is_file() {
            tracing::debug!(source = %source.display(), "referenced file is missing");
            return CopyEvent::Missing { source };
        }

        match self.copy_preserving_structure(&source, &destination) {
            Ok(bytes) => CopyEvent::Copied(CopiedFile {
                relative_path: relative,
                destination,
                bytes,
            }),
            Err(e) => CopyEvent::Failed {
                path: path.to_string(),
                reason: e.to_string(),
            },
        }
    }

    /// Copy `source` to `dest_path`, creating parent directories. Copying a
    /// file onto itself is refused before the destination is opened.
    pub fn copy_preserving_structure(&self, source: &Path, dest_path: &Path) -> Result<u64> {
        if is_same_file(source, dest_path) {
            return Err(SiteKitError::InvalidPath {
                path: format!(
                    "{} and {} are the same file",
                    source.display(),
                    dest_path.display()
                ),
            });
        }

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let bytes = self.copy_file_with_buffer(source, dest_path)?;
        self.copy_metadata(source, dest_path);
        Ok(bytes)
    }

    fn copy_file_with_buffer(&self, source: &Path, dest: &Path) -> Result<u64> {
        let source_file = fs::File::open(source)?;
        let dest_file = fs::File::create(dest)?;

        let mut reader = BufReader::with_capacity(self.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.buffer_size, dest_file);

        let mut total_bytes = 0u64;
        let mut buffer = vec![0u8; 8192]; // 8KB chunks

        loop {
            let bytes_read = reader.read(&mut buffer)?;

            if bytes_read == 0 {
                break;
            }

            writer.write_all(&buffer[..bytes_read])?;
            total_bytes += bytes_read as u64;
        }

        writer.flush()?;

        Ok(total_bytes)
    }

    // Permission bits and mtime follow the source; failures here leave a
    // correct copy behind and are only logged.
    fn copy_metadata(&self, source: &Path, dest: &Path) {
        let Ok(source_metadata) = fs::metadata(source) else {
            return;
        };

        if let Err(e) = fs::set_permissions(dest, source_metadata.permissions()) {
            tracing::debug!(dest = %dest.display(), error = %e, "could not copy permissions");
        }

        if self.preserve_mtime {
            if let Ok(modified_time) = source_metadata.modified() {
                let mtime = filetime::FileTime::from_system_time(modified_time);
                if let Err(e) = filetime::set_file_mtime(dest, mtime) {
                    tracing::debug!(dest = %dest.display(), error = %e, "could not copy mtime");
                }
            }
        }
    }
}

impl Default for FileOperations {
    fn default() -> Self {
        Self::new()
    }
}

// Both paths must exist for canonicalize to succeed; a destination that does
// not exist yet can never alias the source.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Remove exactly one leading `./` or `../`.
pub fn strip_relative_prefix(path: &str) -> &str {
    path.strip_prefix("./")
        .or_else(|| path.strip_prefix("../"))
        .unwrap_or(path)
}

/// The path below both roots that `path` refers to. Anything that would
/// climb out of the roots after the prefix is stripped is refused.
pub fn relative_target(path: &str) -> Result<PathBuf> {
    let stripped = Path::new(strip_relative_prefix(path));

    let mut relative = PathBuf::new();
    for component in stripped.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => {
                return Err(SiteKitError::InvalidPath {
                    path: format!("Path escapes the copy roots: {}", path),
                })
            }
        }
    }

    if relative.as_os_str().is_empty() {
        return Err(SiteKitError::InvalidPath {
            path: format!("Path does not name a file: {}", path),
        });
    }

    Ok(relative)
}
