use crate::error::{Result, SiteKitError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub copy: CopyConfig,
    pub merge: MergeConfig,
    pub spider: SpiderConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CopyConfig {
    pub start_key: String,
    pub end_key: String,
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
    pub preserve_mtime: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MergeConfig {
    pub marker_key: String,
    pub remove_keys: Vec<String>,
    pub rewrite_fields: Vec<String>,
    pub strip_fields: Vec<String>,
    pub output_suffix: String,
    pub path_rewrites: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpiderConfig {
    pub primary_jar: PathBuf,
    pub fallback_jar: PathBuf,
    pub descriptor_path: String,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            start_key: "cbh".to_string(),
            end_key: "奇优".to_string(),
            source_root: PathBuf::from("xiaosa"),
            dest_root: PathBuf::from("."),
            preserve_mtime: true,
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        let mut path_rewrites = BTreeMap::new();
        path_rewrites.insert(
            "./js/drpy2.min.js".to_string(),
            "./lib/drpy2.min.js".to_string(),
        );

        Self {
            marker_key: "cbh".to_string(),
            remove_keys: [
                "版本信息",
                "腾讯视频",
                "优酷视频",
                "芒果视频",
                "爱奇艺",
                "三六零",
                "豆瓣",
                "push_agent",
                "配置中心",
                "本地",
                "预告",
            ]
            .iter()
            .map(|k| k.to_string())
            .collect(),
            rewrite_fields: vec!["api".to_string(), "ext".to_string()],
            strip_fields: vec!["jar".to_string()],
            output_suffix: "_with_app_sites".to_string(),
            path_rewrites,
        }
    }
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            primary_jar: PathBuf::from("jar/spider.jar"),
            fallback_jar: PathBuf::from("../xiaosa/spider.jar"),
            descriptor_path: "./jar/spider.jar".to_string(),
        }
    }
}

impl SpiderConfig {
    pub fn candidates(&self) -> [&Path; 2] {
        [self.primary_jar.as_path(), self.fallback_jar.as_path()]
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SiteKitError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SiteKitError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| SiteKitError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["sitekit.toml", ".sitekit.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        tracing::debug!(path = default_path, "loading default config file");
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref start) = cli_args.start_key {
            self.copy.start_key = start.clone();
        }

        if let Some(ref end) = cli_args.end_key {
            self.copy.end_key = end.clone();
        }

        if let Some(ref root) = cli_args.source_root {
            self.copy.source_root = root.clone();
        }

        if let Some(ref root) = cli_args.dest_root {
            self.copy.dest_root = root.clone();
        }

        if let Some(ref marker) = cli_args.marker_key {
            self.merge.marker_key = marker.clone();
        }

        // Extra exclusions add to the configured set rather than replacing it
        if let Some(ref keys) = cli_args.remove_keys {
            for key in keys {
                if !self.merge.remove_keys.contains(key) {
                    self.merge.remove_keys.push(key.clone());
                }
            }
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| SiteKitError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| SiteKitError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.copy.start_key.is_empty() || self.copy.end_key.is_empty() {
            return Err(SiteKitError::Config {
                message: "Copy start and end keys must be non-empty".to_string(),
            });
        }

        if self.copy.start_key == self.copy.end_key {
            return Err(SiteKitError::Config {
                message: format!(
                    "Copy start and end keys must differ (both are '{}')",
                    self.copy.start_key
                ),
            });
        }

        if self.merge.marker_key.is_empty() {
            return Err(SiteKitError::Config {
                message: "Merge marker key must be non-empty".to_string(),
            });
        }

        if self.merge.output_suffix.is_empty() {
            return Err(SiteKitError::Config {
                message: "Output suffix must be non-empty, or the base document would be overwritten"
                    .to_string(),
            });
        }

        if self.spider.descriptor_path.is_empty() {
            return Err(SiteKitError::Config {
                message: "Spider descriptor path must be non-empty".to_string(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub start_key: Option<String>,
    pub end_key: Option<String>,
    pub source_root: Option<PathBuf>,
    pub dest_root: Option<PathBuf>,
    pub marker_key: Option<String>,
    pub remove_keys: Option<Vec<String>>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_key(mut self, key: Option<String>) -> Self {
        self.start_key = key;
        self
    }

    pub fn with_end_key(mut self, key: Option<String>) -> Self {
        self.end_key = key;
        self
    }

    pub fn with_source_root(mut self, root: Option<PathBuf>) -> Self {
        self.source_root = root;
        self
    }

    pub fn with_dest_root(mut self, root: Option<PathBuf>) -> Self {
        self.dest_root = root;
        self
    }

    pub fn with_marker_key(mut self, key: Option<String>) -> Self {
        self.marker_key = key;
        self
    }

    pub fn with_remove_keys(mut self, keys: Option<Vec<String>>) -> Self {
        self.remove_keys = keys;
        self
    }
}
