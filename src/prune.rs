use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use log::debug;

use crate::diag::{Diagnostic, DiagnosticKind};
use crate::index::DigestIndex;

/// Remove duplicate groups whose existence is fully explained by a clone
/// pair of parent directories.
///
/// If directories `B/E` and `C/E` are already reported as clones, every
/// file inside `B/E` trivially has a counterpart inside `C/E`, so listing
/// those file groups separately is noise. A group is dropped only when all
/// of its members resolve to parents sharing a single digest AND those
/// parents are at least two distinct paths. The second condition keeps the
/// group when every copy lives under one directory, which is the original
/// duplication signal, not a redundancy.
///
/// A partial match never suppresses a group: one member with a differing
/// parent (a stray extra copy elsewhere) means the group still carries
/// information of its own.
///
/// The same rule prunes the directory index against itself: a subtree clone
/// group is dropped when its members' parents are already a clone group.
///
/// Members whose parent is missing from `dir_digests` (root paths) are
/// reported as diagnostics and excluded from the redundancy test.
pub fn remove_redundant_groups(
    index: &mut DigestIndex,
    dir_digests: &HashMap<PathBuf, String>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut redundant_digests = Vec::new();

    for (digest, paths) in index.iter() {
        let mut parent_digests = BTreeSet::new();
        let mut parent_paths = BTreeSet::new();

        for path in paths {
            match path.parent().and_then(|p| dir_digests.get_key_value(p)) {
                Some((parent, parent_digest)) => {
                    parent_digests.insert(parent_digest.clone());
                    parent_paths.insert(parent.clone());
                }
                None => {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::UnresolvedParent,
                        path,
                        "Cannot determine parent for path",
                    ));
                }
            }
        }

        if parent_digests.len() == 1 && parent_paths.len() > 1 {
            debug!("Pruning redundant group {digest} ({} members)", paths.len());
            redundant_digests.push(digest.clone());
        }
    }

    for digest in redundant_digests {
        index.remove(&digest);
    }
}
