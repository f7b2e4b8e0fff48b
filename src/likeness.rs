use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::diag::{Diagnostic, DiagnosticKind};
use crate::index::DigestIndex;

/// Similarity between two directories that share some duplicated content
/// without being exact clones. `percent` is strictly between 0 and 100.
#[derive(Debug, Clone, PartialEq)]
pub struct LikenessPair {
    pub dir_a: PathBuf,
    pub dir_b: PathBuf,
    pub percent: f64,
}

/// Compute pairwise likeness between every directory holding at least one
/// duplicated file.
///
/// For each unordered pair the immediate children of both sides are mapped
/// to digests and compared as multisets: likeness is
/// `100 * Σ min(count_a, count_b) / Σ max(count_a, count_b)`. Multisets
/// matter because the same content can appear several times inside one
/// directory. Pairs with nothing in common are dropped, and so are exact
/// matches, which are already reported as directory clones.
///
/// Children without a digest in either map (skipped symlinks, unreadable
/// files, entries created after the walk) are ignored. A directory that
/// cannot be listed skips its pairs with a diagnostic.
pub fn directory_likeness(
    file_index: &DigestIndex,
    file_digests: &HashMap<PathBuf, String>,
    dir_digests: &HashMap<PathBuf, String>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<LikenessPair> {
    let mut candidates = BTreeSet::new();
    for paths in file_index.values() {
        for path in paths {
            if let Some(parent) = path.parent() {
                candidates.insert(parent.to_path_buf());
            }
        }
    }
    debug!("Comparing {} candidate directories", candidates.len());

    let mut multisets: HashMap<&Path, HashMap<&str, usize>> = HashMap::new();
    for dir in &candidates {
        match child_digest_multiset(dir, file_digests, dir_digests) {
            Ok(multiset) => {
                multisets.insert(dir.as_path(), multiset);
            }
            Err(err) => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnlistableDirectory,
                    dir,
                    format!("Failed to list directory: {err}"),
                ));
            }
        }
    }

    let listable: Vec<&PathBuf> = candidates
        .iter()
        .filter(|dir| multisets.contains_key(dir.as_path()))
        .collect();

    let mut pairs = Vec::new();
    for (i, dir_a) in listable.iter().enumerate() {
        for dir_b in &listable[i + 1..] {
            let multiset_a = &multisets[dir_a.as_path()];
            let multiset_b = &multisets[dir_b.as_path()];

            let mut intersection = 0usize;
            let mut union = 0usize;
            let digests: BTreeSet<&str> = multiset_a.keys().chain(multiset_b.keys()).copied().collect();
            for digest in digests {
                let count_a = multiset_a.get(digest).copied().unwrap_or(0);
                let count_b = multiset_b.get(digest).copied().unwrap_or(0);
                intersection += count_a.min(count_b);
                union += count_a.max(count_b);
            }

            // Wholly disjoint and exactly identical pairs are both
            // uninformative; identical pairs already show up as clones.
            if intersection == 0 || intersection == union {
                continue;
            }

            pairs.push(LikenessPair {
                dir_a: (*dir_a).clone(),
                dir_b: (*dir_b).clone(),
                percent: 100.0 * intersection as f64 / union as f64,
            });
        }
    }

    pairs.sort_by(|a, b| {
        b.percent
            .partial_cmp(&a.percent)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| (&a.dir_a, &a.dir_b).cmp(&(&b.dir_a, &b.dir_b)))
    });
    pairs
}

/// Multiset of content digests over a directory's immediate children,
/// looked up in the combined file and directory digest maps.
fn child_digest_multiset<'a>(
    dir: &Path,
    file_digests: &'a HashMap<PathBuf, String>,
    dir_digests: &'a HashMap<PathBuf, String>,
) -> std::io::Result<HashMap<&'a str, usize>> {
    let mut multiset: HashMap<&'a str, usize> = HashMap::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let child = entry.path();
        let digest = file_digests
            .get(&child)
            .or_else(|| dir_digests.get(&child));
        if let Some(digest) = digest {
            *multiset.entry(digest.as_str()).or_insert(0) += 1;
        }
    }

    Ok(multiset)
}
