use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Reverse index from content digest to every path carrying that content.
/// Keyed and ordered by digest, with sorted path lists, so iteration order
/// is stable across runs.
pub type DigestIndex = BTreeMap<String, Vec<PathBuf>>;

/// Invert a `path -> digest` map into `digest -> [paths]`.
pub fn invert(digests: &HashMap<PathBuf, String>) -> DigestIndex {
    let mut index: DigestIndex = BTreeMap::new();

    for (path, digest) in digests {
        index.entry(digest.clone()).or_default().push(path.clone());
    }

    for paths in index.values_mut() {
        paths.sort_unstable();
    }

    index
}

/// Remove every group with a single member. Content that appears once is
/// not duplicated.
pub fn drop_singletons(mut index: DigestIndex) -> DigestIndex {
    index.retain(|_, paths| paths.len() > 1);
    index
}
