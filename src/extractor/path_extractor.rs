use crate::document::find_index_by_key;
use serde_json::Value;
use std::collections::HashSet;

const API_FIELD: &str = "api";
const EXT_FIELD: &str = "ext";

/// Scans the window of a site list between two marker keys for local
/// relative path references.
#[derive(Debug, Clone)]
pub struct PathExtractor {
    start_key: String,
    end_key: String,
}

impl PathExtractor {
    pub fn new<S: Into<String>, E: Into<String>>(start_key: S, end_key: E) -> Self {
        Self {
            start_key: start_key.into(),
            end_key: end_key.into(),
        }
    }

    pub fn start_key(&self) -> &str {
        &self.start_key
    }

    pub fn end_key(&self) -> &str {
        &self.end_key
    }

    pub fn extract(&self, sites: &[Value]) -> Vec<String> {
        paths_between(sites, &self.start_key, &self.end_key)
    }
}

/// Local paths referenced by the entries strictly between the first entry
/// keyed `start_key` and the first entry keyed `end_key`.
///
/// `api` contributes only `.py` paths, `ext` contributes every local path.
/// The result is deduplicated in first-seen order. A missing marker, or a
/// start marker that does not come before the end marker, yields nothing.
pub fn paths_between(sites: &[Value], start_key: &str, end_key: &str) -> Vec<String> {
    let (start, end) = match (
        find_index_by_key(sites, start_key),
        find_index_by_key(sites, end_key),
    ) {
        (Some(start), Some(end)) if start < end => (start, end),
        (start, end) => {
            tracing::debug!(?start, ?end, start_key, end_key, "no usable marker window");
            return Vec::new();
        }
    };

    let mut all_paths = Vec::new();
    for site in &sites[start + 1..end] {
        let Some(obj) = site.as_object() else {
            continue;
        };

        if let Some(api) = obj.get(API_FIELD).and_then(Value::as_str) {
            all_paths.extend(
                extract_local_paths(api)
                    .into_iter()
                    .filter(|p| p.ends_with(".py")),
            );
        }

        if let Some(ext) = obj.get(EXT_FIELD).and_then(Value::as_str) {
            all_paths.extend(extract_local_paths(ext));
        }
    }

    dedupe_preserving_order(all_paths)
}

/// Heuristic scan of a free-form field value for `./` and `../` paths.
///
/// The value is split on `?`, then `&` and `$` are treated as whitespace and
/// each segment is split into tokens. A token is kept when it starts with
/// `./` or `../`, or when it is a `name=value` pair whose value does. Paths
/// embedded in query strings are recovered this way; URLs never start with a
/// dot and are ignored.
pub fn extract_local_paths(value: &str) -> Vec<String> {
    let mut paths = Vec::new();

    for part in value.split('?') {
        let normalized = part.replace(['&', '$'], " ");
        for token in normalized.split_whitespace() {
            if let Some(candidate) = local_candidate(token) {
                paths.push(trim_trailing_params(candidate).to_string());
            }
        }
    }

    paths
}

/// The token itself when it is a local path, or the value half of a
/// `name=value` query pair whose value is one.
fn local_candidate(token: &str) -> Option<&str> {
    if is_local_path(token) {
        return Some(token);
    }
    token
        .split_once('=')
        .map(|(_, value)| value)
        .filter(|value| is_local_path(value))
}

pub fn is_local_path(token: &str) -> bool {
    token.starts_with("./") || token.starts_with("../")
}

fn trim_trailing_params(token: &str) -> &str {
    let token = token.split('&').next().unwrap_or(token);
    token.split('$').next().unwrap_or(token)
}

fn dedupe_preserving_order(paths: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_relative_paths() {
        assert_eq!(extract_local_paths("./XBPQ/a.json"), vec!["./XBPQ/a.json"]);
        assert_eq!(extract_local_paths("../lib/b.js"), vec!["../lib/b.js"]);
        assert!(extract_local_paths("lib/b.js").is_empty());
        assert!(extract_local_paths("").is_empty());
    }

    #[test]
    fn test_query_embedded_path_recovered() {
        assert_eq!(
            extract_local_paths("./a/b.py?x=./c/d.py"),
            vec!["./a/b.py", "./c/d.py"]
        );
        assert_eq!(
            extract_local_paths("./a/b.py?./c/d.py"),
            vec!["./a/b.py", "./c/d.py"]
        );
        assert_eq!(
            extract_local_paths("./a/b.py?type=1&./c/d.py$./e/f.txt"),
            vec!["./a/b.py", "./c/d.py", "./e/f.txt"]
        );
    }

    #[test]
    fn test_urls_yield_nothing() {
        assert!(extract_local_paths("http://example.com/api.py").is_empty());
        assert!(extract_local_paths("https://x.y/z?id=https://cdn/a.py").is_empty());
        assert_eq!(extract_local_paths("https://x.y/z?./q.py"), vec!["./q.py"]);
        assert!(extract_local_paths("csp_XBPQ").is_empty());
    }

    #[test]
    fn test_query_pair_values() {
        assert_eq!(
            extract_local_paths("csp_XBPQ?ext=../XBPQ/x.json&site=1"),
            vec!["../XBPQ/x.json"]
        );
        assert!(extract_local_paths("?a=b&c=d").is_empty());
    }

    #[test]
    fn test_whitespace_separated_tokens() {
        assert_eq!(
            extract_local_paths("  ./one.txt\t./two.txt  nothing ../three.txt"),
            vec!["./one.txt", "./two.txt", "../three.txt"]
        );
    }

    fn sample_sites() -> Vec<Value> {
        vec![
            json!({"key": "before", "ext": "./skip/me.json"}),
            json!({"key": "cbh"}),
            json!({"key": "a", "api": "./py/a.py", "ext": "./XBPQ/a.json"}),
            json!({"key": "b", "api": "./js/drpy2.min.js", "ext": "./XBPQ/b.json?./XBPQ/a.json"}),
            json!("not a site"),
            json!({"key": "c", "api": 42, "ext": ["./not/a/string.json"]}),
            json!({"key": "奇优"}),
            json!({"key": "after", "ext": "./skip/me/too.json"}),
        ]
    }

    #[test]
    fn test_paths_between_markers() {
        let paths = paths_between(&sample_sites(), "cbh", "奇优");
        assert_eq!(
            paths,
            vec!["./py/a.py", "./XBPQ/a.json", "./XBPQ/b.json"],
            "api non-.py paths are skipped and duplicates keep first position"
        );
    }

    #[test]
    fn test_paths_only_from_open_interval() {
        let sites = vec![
            json!({"key": "s", "ext": "./on/start.json"}),
            json!({"key": "mid", "ext": "./inside.json"}),
            json!({"key": "e", "ext": "./on/end.json"}),
        ];
        assert_eq!(paths_between(&sites, "s", "e"), vec!["./inside.json"]);
    }

    #[test]
    fn test_missing_or_reversed_markers() {
        let sites = sample_sites();
        assert!(paths_between(&sites, "nope", "奇优").is_empty());
        assert!(paths_between(&sites, "cbh", "nope").is_empty());
        assert!(paths_between(&sites, "奇优", "cbh").is_empty());
        assert!(paths_between(&sites, "cbh", "cbh").is_empty());
        assert!(paths_between(&[], "cbh", "奇优").is_empty());
    }

    #[test]
    fn test_first_marker_occurrence_wins() {
        let sites = vec![
            json!({"key": "s"}),
            json!({"key": "x", "ext": "./first.json"}),
            json!({"key": "e"}),
            json!({"key": "s"}),
            json!({"key": "y", "ext": "./second.json"}),
            json!({"key": "e"}),
        ];
        assert_eq!(paths_between(&sites, "s", "e"), vec!["./first.json"]);
    }

    #[test]
    fn test_extractor_wrapper() {
        let extractor = PathExtractor::new("cbh", "奇优");
        assert_eq!(extractor.start_key(), "cbh");
        assert_eq!(extractor.extract(&sample_sites()).len(), 3);
    }
}
