use crate::config::SpiderConfig;
use crate::document::SiteDocument;
use crate::error::Result;
use md5::{Digest, Md5};
use serde::Serialize;
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

const CHUNK_SIZE: usize = 8192;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpiderUpdate {
    Updated {
        jar_path: PathBuf,
        digest: String,
        descriptor: String,
    },
    JarMissing {
        candidates: Vec<PathBuf>,
    },
}

/// The first candidate jar that exists on disk.
pub fn locate_jar(config: &SpiderConfig) -> Option<&Path> {
    config.candidates().into_iter().find(|path| path.is_file())
}

/// Lower-case hex MD5 of a file, read in fixed-size chunks.
pub fn compute_md5<P: AsRef<Path>>(path: P) -> Result<String> {
    let file = fs::File::open(path.as_ref())?;
    let mut reader = BufReader::new(file);
    let mut hasher = Md5::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

pub fn format_descriptor(descriptor_path: &str, digest: &str) -> String {
    format!("{};md5;{}", descriptor_path, digest)
}

/// Point the document's `spider` field at the current jar. When no candidate
/// jar exists the document is left alone.
pub fn update_spider(document: &mut SiteDocument, config: &SpiderConfig) -> Result<SpiderUpdate> {
    let Some(jar_path) = locate_jar(config) else {
        tracing::debug!(
            primary = %config.primary_jar.display(),
            fallback = %config.fallback_jar.display(),
            "spider jar not found, descriptor left unchanged"
        );
        return Ok(SpiderUpdate::JarMissing {
            candidates: config.candidates().iter().map(|p| p.to_path_buf()).collect(),
        });
    };

    let digest = compute_md5(jar_path)?;
    let descriptor = format_descriptor(&config.descriptor_path, &digest);
    tracing::debug!(jar = %jar_path.display(), %descriptor, "spider descriptor computed");

    document.set_spider(descriptor.clone());

    Ok(SpiderUpdate::Updated {
        jar_path: jar_path.to_path_buf(),
        digest,
        descriptor,
    })
}
