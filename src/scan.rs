use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result, bail};
use log::info;

use crate::cache::HashCache;
use crate::diag::Diagnostic;
use crate::digest::HashAlgorithm;
use crate::index::{DigestIndex, drop_singletons, invert};
use crate::likeness::{LikenessPair, directory_likeness};
use crate::prune::remove_redundant_groups;
use crate::scanner::walk;

/// Behavior switches for one scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    pub follow_links: bool,
    pub algorithm: HashAlgorithm,
}

/// Everything a scan produces: pruned duplicate indices, likeness pairs,
/// file sizes for reporting, and the diagnostics collected along the way.
#[derive(Debug)]
pub struct ScanResult {
    pub file_clones: DigestIndex,
    pub dir_clones: DigestIndex,
    pub likeness: Vec<LikenessPair>,
    pub file_sizes: HashMap<PathBuf, u64>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Scan one or more root directories for duplicated files and directory
/// trees.
///
/// Roots are canonicalized first so overlapping or differently-spelled
/// roots cannot produce spurious collisions. A root that does not exist or
/// is not a directory is a fatal error; everything else that goes wrong
/// mid-scan is collected in `ScanResult::diagnostics`.
pub fn scan(
    root_paths: &[PathBuf],
    options: &ScanOptions,
    cache: Option<&HashCache>,
    cancel: &AtomicBool,
) -> Result<ScanResult> {
    let mut roots = BTreeSet::new();
    for path in root_paths {
        let root = path
            .canonicalize()
            .with_context(|| format!("Failed to resolve path: '{}'", path.display()))?;
        if !root.is_dir() {
            bail!("Not a directory: '{}'", root.display());
        }
        roots.insert(root);
    }
    if roots.is_empty() {
        bail!("No root directory given");
    }

    let mut file_digests = HashMap::new();
    let mut dir_digests = HashMap::new();
    let mut file_sizes = HashMap::new();
    let mut diagnostics = Vec::new();

    for root in &roots {
        let output = walk(
            root,
            options.follow_links,
            options.algorithm,
            cache,
            cancel,
            &mut diagnostics,
        )?;
        file_digests.extend(output.file_digests);
        dir_digests.extend(output.dir_digests);
        file_sizes.extend(output.file_sizes);
    }

    let mut file_clones = drop_singletons(invert(&file_digests));
    let mut dir_clones = drop_singletons(invert(&dir_digests));
    info!(
        "Found {} duplicated file contents and {} duplicated directories",
        file_clones.len(),
        dir_clones.len()
    );

    remove_redundant_groups(&mut file_clones, &dir_digests, &mut diagnostics);
    remove_redundant_groups(&mut dir_clones, &dir_digests, &mut diagnostics);

    let likeness = directory_likeness(&file_clones, &file_digests, &dir_digests, &mut diagnostics);

    Ok(ScanResult {
        file_clones,
        dir_clones,
        likeness,
        file_sizes,
        diagnostics,
    })
}
