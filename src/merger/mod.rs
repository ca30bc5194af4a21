pub mod checksum;
pub mod merge_report;
pub mod site_merger;

pub use checksum::{compute_md5, format_descriptor, locate_jar, update_spider, SpiderUpdate};
pub use merge_report::MergeReport;
pub use site_merger::{
    dedupe_by_name, keep_objects, remove_by_key, rewrite_legacy_paths, splice_after_key,
    strip_fields, MergeOutcome, MergeStats, Site, SiteMerger, SplicePosition,
};
