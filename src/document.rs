//! Loading, inspecting and saving site documents.
//!
//! A site document is a JSON object whose `sites` field holds an ordered list
//! of loosely-typed site entries. Everything else in the document is carried
//! through untouched, in its original key order.

use crate::error::{Result, SiteKitError};
use crate::serializer;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

pub const SITES_FIELD: &str = "sites";
pub const SPIDER_FIELD: &str = "spider";

#[derive(Debug, Clone, PartialEq)]
pub struct SiteDocument {
    path: PathBuf,
    root: Map<String, Value>,
}

impl SiteDocument {
    /// Load a local JSON document. A missing file is reported as
    /// [`SiteKitError::DocumentNotFound`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(SiteKitError::DocumentNotFound {
                path: path.display().to_string(),
            });
        }

        let content = fs::read_to_string(path)?;
        Self::from_str_with_path(&content, path)
    }

    /// Load a source document given either a path or something that looks like
    /// a URL. Only local files are supported; URLs are rejected explicitly so
    /// the caller can tell the user why.
    pub fn fetch(path_or_url: &str) -> Result<Self> {
        let path = Path::new(path_or_url);
        if path.is_file() {
            return Self::load(path);
        }

        if let Ok(url) = Url::parse(path_or_url) {
            if matches!(url.scheme(), "http" | "https" | "ftp") {
                return Err(SiteKitError::RemoteSourceUnsupported {
                    url: path_or_url.to_string(),
                });
            }
        }

        Err(SiteKitError::DocumentNotFound {
            path: path_or_url.to_string(),
        })
    }

    pub fn from_str_with_path<P: AsRef<Path>>(content: &str, path: P) -> Result<Self> {
        let path = path.as_ref();
        let value: Value = serde_json::from_str(content).map_err(|source| SiteKitError::Json {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_value(value, path)
    }

    pub fn from_value<P: AsRef<Path>>(value: Value, path: P) -> Result<Self> {
        let path = path.as_ref();
        match value {
            Value::Object(root) => Ok(Self {
                path: path.to_path_buf(),
                root,
            }),
            other => Err(SiteKitError::InvalidDocument {
                path: path.display().to_string(),
                message: format!(
                    "expected a JSON object at the top level, found {}",
                    type_name(&other)
                ),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    /// The `sites` list, or an empty slice when the field is absent or is not
    /// an array.
    pub fn sites(&self) -> &[Value] {
        match self.root.get(SITES_FIELD) {
            Some(Value::Array(sites)) => sites,
            _ => &[],
        }
    }

    /// Like [`SiteDocument::sites`] but refuses a `sites` field of the wrong
    /// type instead of treating it as empty.
    pub fn sites_strict(&self) -> Result<&[Value]> {
        match self.root.get(SITES_FIELD) {
            None => Ok(&[]),
            Some(Value::Array(sites)) => Ok(sites),
            Some(other) => Err(SiteKitError::InvalidDocument {
                path: self.path.display().to_string(),
                message: format!("\"sites\" must be an array, found {}", type_name(other)),
            }),
        }
    }

    pub fn set_sites(&mut self, sites: Vec<Value>) {
        self.root.insert(SITES_FIELD.to_string(), Value::Array(sites));
    }

    pub fn spider(&self) -> Option<&str> {
        self.root.get(SPIDER_FIELD).and_then(Value::as_str)
    }

    pub fn set_spider<S: Into<String>>(&mut self, descriptor: S) {
        self.root
            .insert(SPIDER_FIELD.to_string(), Value::String(descriptor.into()));
    }

    pub fn to_compact_string(&self) -> String {
        serializer::to_compact_string(&Value::Object(self.root.clone()))
    }

    /// Write the document with the compact layout. The write is a single
    /// `fs::write`; an interrupted run may leave a truncated file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_compact_string())?;
        Ok(())
    }
}

/// Index of the first object entry whose `key` equals `key`.
pub fn find_index_by_key(sites: &[Value], key: &str) -> Option<usize> {
    sites.iter().position(|site| site_key(site) == Some(key))
}

/// The string `key` of a site entry, if it is an object with one.
pub fn site_key(site: &Value) -> Option<&str> {
    site.as_object()
        .and_then(|obj| obj.get("key"))
        .and_then(Value::as_str)
}

/// `<dir>/<stem><suffix>.json` next to `base`.
pub fn derive_output_path<P: AsRef<Path>>(base: P, suffix: &str) -> PathBuf {
    let base = base.as_ref();
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let file_name = format!("{}{}.json", stem, suffix);

    match base.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
