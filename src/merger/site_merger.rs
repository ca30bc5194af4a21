use crate::config::MergeConfig;
use crate::document::{site_key, SiteDocument};
use crate::error::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// A site entry that is known to be a JSON object.
pub type Site = Map<String, Value>;

const NAME_FIELD: &str = "name";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "position", rename_all = "snake_case")]
pub enum SplicePosition {
    AfterMarker { index: usize },
    Appended,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeStats {
    pub source_entries: usize,
    pub non_objects_dropped: usize,
    pub fields_rewritten: usize,
    pub fields_stripped: usize,
    pub removed_by_key: usize,
    pub deduped_by_name: usize,
    pub inserted: usize,
    pub marker_key: String,
    pub splice: SplicePosition,
    pub total_sites: usize,
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub sites: Vec<Value>,
    pub stats: MergeStats,
}

/// Merges a source site list into a base list following a [`MergeConfig`].
#[derive(Debug, Clone)]
pub struct SiteMerger {
    marker_key: String,
    remove_keys: HashSet<String>,
    rewrite_fields: Vec<String>,
    strip_fields: Vec<String>,
    path_rewrites: BTreeMap<String, String>,
}

impl SiteMerger {
    pub fn new(config: &MergeConfig) -> Self {
        Self {
            marker_key: config.marker_key.clone(),
            remove_keys: config.remove_keys.iter().cloned().collect(),
            rewrite_fields: config.rewrite_fields.clone(),
            strip_fields: config.strip_fields.clone(),
            path_rewrites: config.path_rewrites.clone(),
        }
    }

    pub fn marker_key(&self) -> &str {
        &self.marker_key
    }

    /// Run the whole pipeline. The inputs are left untouched.
    pub fn merge(&self, source_sites: &[Value], base_sites: &[Value]) -> MergeOutcome {
        let sites = keep_objects(source_sites);
        let non_objects_dropped = source_sites.len() - sites.len();

        let (sites, fields_rewritten) =
            rewrite_legacy_paths(sites, &self.rewrite_fields, &self.path_rewrites);
        let (sites, fields_stripped) = strip_fields(sites, &self.strip_fields);

        let before_removal = sites.len();
        let sites = remove_by_key(sites, &self.remove_keys);
        let removed_by_key = before_removal - sites.len();

        let before_dedupe = sites.len();
        let sites = dedupe_by_name(base_sites, sites);
        let deduped_by_name = before_dedupe - sites.len();

        let inserted = sites.len();
        let insert: Vec<Value> = sites.into_iter().map(Value::Object).collect();
        let (merged, splice) = splice_after_key(base_sites, insert, &self.marker_key);

        if splice == SplicePosition::Appended {
            tracing::debug!(
                marker = %self.marker_key,
                "marker key not found, appending sites at the end"
            );
        }

        let stats = MergeStats {
            source_entries: source_sites.len(),
            non_objects_dropped,
            fields_rewritten,
            fields_stripped,
            removed_by_key,
            deduped_by_name,
            inserted,
            marker_key: self.marker_key.clone(),
            splice,
            total_sites: merged.len(),
        };
        tracing::debug!(?stats, "merge finished");

        MergeOutcome {
            sites: merged,
            stats,
        }
    }

    /// Merge `source`'s sites into `base` in place.
    pub fn merge_documents(
        &self,
        source: &SiteDocument,
        base: &mut SiteDocument,
    ) -> Result<MergeStats> {
        let base_sites = base.sites_strict()?;
        let outcome = self.merge(source.sites(), base_sites);
        base.set_sites(outcome.sites);
        Ok(outcome.stats)
    }
}

/// Object-shaped entries only; anything else is dropped.
pub fn keep_objects(sites: &[Value]) -> Vec<Site> {
    sites
        .iter()
        .filter_map(|site| site.as_object().cloned())
        .collect()
}

/// Replace whole-value matches of the rewrite table in the given fields.
/// Returns the sites and the number of values replaced.
pub fn rewrite_legacy_paths(
    sites: Vec<Site>,
    fields: &[String],
    rewrites: &BTreeMap<String, String>,
) -> (Vec<Site>, usize) {
    let mut rewritten = 0;
    let sites = sites
        .into_iter()
        .map(|mut site| {
            for field in fields {
                let replacement = site
                    .get(field)
                    .and_then(Value::as_str)
                    .and_then(|current| rewrites.get(current));
                if let Some(replacement) = replacement {
                    let replacement = Value::String(replacement.clone());
                    site.insert(field.clone(), replacement);
                    rewritten += 1;
                }
            }
            site
        })
        .collect();
    (sites, rewritten)
}

/// Drop the named fields from every site. Returns the sites and the number of
/// fields removed.
pub fn strip_fields(sites: Vec<Site>, fields: &[String]) -> (Vec<Site>, usize) {
    let mut stripped = 0;
    let sites = sites
        .into_iter()
        .map(|mut site| {
            for field in fields {
                // shift_remove keeps the remaining keys in their original order
                if site.shift_remove(field).is_some() {
                    stripped += 1;
                }
            }
            site
        })
        .collect();
    (sites, stripped)
}

pub fn remove_by_key(sites: Vec<Site>, remove_keys: &HashSet<String>) -> Vec<Site> {
    sites
        .into_iter()
        .filter(|site| {
            let key = site.get("key").and_then(Value::as_str);
            !key.is_some_and(|k| remove_keys.contains(k))
        })
        .collect()
}

/// Drop sites whose `name` already appears in `base_sites`; the base entry
/// wins.
///
/// A missing name and a `null` name count as the same name. If any base entry
/// lacks a name, every nameless source entry is dropped too.
pub fn dedupe_by_name(base_sites: &[Value], sites: Vec<Site>) -> Vec<Site> {
    let base_names: Vec<Option<&Value>> = base_sites
        .iter()
        .filter_map(Value::as_object)
        .map(site_name)
        .collect();

    sites
        .into_iter()
        .filter(|site| {
            let name = site_name(site);
            !base_names.iter().any(|base_name| *base_name == name)
        })
        .collect()
}

fn site_name(site: &Site) -> Option<&Value> {
    site.get(NAME_FIELD).filter(|name| !name.is_null())
}

/// Insert `insert` as one block right after the first base entry keyed
/// `marker`, or at the end when there is no such entry.
pub fn splice_after_key(
    base_sites: &[Value],
    insert: Vec<Value>,
    marker: &str,
) -> (Vec<Value>, SplicePosition) {
    let mut merged = Vec::with_capacity(base_sites.len() + insert.len());

    match base_sites.iter().position(|site| site_key(site) == Some(marker)) {
        Some(index) => {
            merged.extend_from_slice(&base_sites[..=index]);
            merged.extend(insert);
            merged.extend_from_slice(&base_sites[index + 1..]);
            (merged, SplicePosition::AfterMarker { index })
        }
        None => {
            merged.extend_from_slice(base_sites);
            merged.extend(insert);
            (merged, SplicePosition::Appended)
        }
    }
}
