use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::UNIX_EPOCH;

use anyhow::{Result, bail};
use indicatif::{HumanBytes, HumanCount, ProgressBar, ProgressStyle};
use log::{debug, info};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::cache::HashCache;
use crate::diag::{Diagnostic, DiagnosticKind};
use crate::digest::HashAlgorithm;

/// Digest maps produced by walking one root path.
#[derive(Debug, Default)]
pub struct WalkOutput {
    /// Absolute file path -> content digest.
    pub file_digests: HashMap<PathBuf, String>,
    /// Absolute directory path -> digest over sorted child digests.
    pub dir_digests: HashMap<PathBuf, String>,
    /// Absolute file path -> size in bytes, for reporting.
    pub file_sizes: HashMap<PathBuf, u64>,
}

struct PendingFile {
    path: PathBuf,
    size: u64,
    mtime: u64,
}

/// Walk the tree under `root` and digest every file and directory.
///
/// Enumeration is iterative (walkdir), file hashing runs on the rayon pool,
/// and directory digests are computed in descending-depth order so every
/// child digest exists before its parent needs it. Per-item failures are
/// recorded as diagnostics and skipped; only cancellation aborts the walk.
pub fn walk(
    root: &Path,
    follow_links: bool,
    algorithm: HashAlgorithm,
    cache: Option<&HashCache>,
    cancel: &AtomicBool,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<WalkOutput> {
    info!("Scanning '{}'", root.display());

    let mut files: Vec<PendingFile> = Vec::new();
    let mut dirs: Vec<(PathBuf, usize)> = Vec::new();
    // parent -> immediate children, with a directory flag per child.
    let mut children: HashMap<PathBuf, Vec<(PathBuf, bool)>> = HashMap::new();

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Listing files and directories...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    for entry in WalkDir::new(root).follow_links(follow_links) {
        if cancel.load(Ordering::Relaxed) {
            spinner.finish_and_clear();
            bail!("Scan interrupted");
        }
        spinner.tick();

        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(root).to_path_buf();
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::WalkError,
                    &path,
                    format!("Failed to read directory entry: {err}"),
                ));
                continue;
            }
        };

        if entry.path_is_symlink() && !follow_links {
            debug!("Skipping symlink '{}'", entry.path().display());
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::SkippedSymlink,
                entry.path(),
                "Skipped symbolic link",
            ));
            continue;
        }

        let path = entry.path().to_path_buf();
        let file_type = entry.file_type();

        if file_type.is_dir() {
            if entry.depth() > 0
                && let Some(parent) = path.parent()
            {
                children
                    .entry(parent.to_path_buf())
                    .or_default()
                    .push((path.clone(), true));
            }
            dirs.push((path, entry.depth()));
        } else if file_type.is_file() {
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::UnreadableFile,
                        &path,
                        format!("Failed to read metadata: {err}"),
                    ));
                    continue;
                }
            };
            let mtime = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs())
                .unwrap_or(0);
            if let Some(parent) = path.parent() {
                children
                    .entry(parent.to_path_buf())
                    .or_default()
                    .push((path.clone(), false));
            }
            files.push(PendingFile {
                path,
                size: metadata.len(),
                mtime,
            });
        }
        // Sockets, pipes and other special files are not content and are
        // left out of both maps.
    }
    spinner.finish_and_clear();

    let total_size: u64 = files.iter().map(|f| f.size).sum();
    info!(
        "Found {} files in {} directories ({})",
        HumanCount(files.len() as u64),
        HumanCount(dirs.len() as u64),
        HumanBytes(total_size)
    );

    let mut output = hash_files(&files, algorithm, cache, cancel, diagnostics)?;

    // Children before parents: deepest directories first.
    dirs.sort_by(|a, b| b.1.cmp(&a.1));

    for (dir_path, _depth) in &dirs {
        if cancel.load(Ordering::Relaxed) {
            bail!("Scan interrupted");
        }

        let mut child_digests = Vec::new();
        if let Some(kids) = children.get(dir_path) {
            for (child, is_dir) in kids {
                if *is_dir {
                    match output.dir_digests.get(child) {
                        Some(digest) => child_digests.push(digest.clone()),
                        None => {
                            // The depth ordering guarantees this digest
                            // exists; its absence is a defect, not a user
                            // error.
                            diagnostics.push(Diagnostic::new(
                                DiagnosticKind::MissingChildDigest,
                                child,
                                "Child directory digest missing during bottom-up walk",
                            ));
                        }
                    }
                } else if let Some(digest) = output.file_digests.get(child) {
                    child_digests.push(digest.clone());
                }
                // A file child with no digest failed to hash and was
                // already reported.
            }
        }

        let digest = algorithm.directory_digest(child_digests);
        output.dir_digests.insert(dir_path.clone(), digest);
    }

    Ok(output)
}

/// Hash every pending file on the rayon pool, consulting the cache first.
fn hash_files(
    files: &[PendingFile],
    algorithm: HashAlgorithm,
    cache: Option<&HashCache>,
    cancel: &AtomicBool,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<WalkOutput> {
    let total_size: u64 = files.iter().map(|f| f.size).sum();
    let progress_bar = ProgressBar::new(total_size);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg} ETA: {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let bytes_hashed = AtomicU64::new(0);
    let results: Vec<(usize, Result<String>)> = files
        .par_iter()
        .enumerate()
        .map(|(i, file)| {
            if cancel.load(Ordering::Relaxed) {
                return (i, Err(anyhow::anyhow!("interrupted")));
            }
            let digest = hash_with_cache(file, algorithm, cache);
            let done = bytes_hashed.fetch_add(file.size, Ordering::Relaxed) + file.size;
            progress_bar.set_position(done);
            (i, digest)
        })
        .collect();
    progress_bar.finish_and_clear();

    if cancel.load(Ordering::Relaxed) {
        bail!("Scan interrupted");
    }

    let mut output = WalkOutput::default();
    for (i, result) in results {
        let file = &files[i];
        match result {
            Ok(digest) => {
                output.file_sizes.insert(file.path.clone(), file.size);
                output.file_digests.insert(file.path.clone(), digest);
            }
            Err(err) => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnreadableFile,
                    &file.path,
                    format!("Failed to hash file: {err:#}"),
                ));
            }
        }
    }
    Ok(output)
}

fn hash_with_cache(
    file: &PendingFile,
    algorithm: HashAlgorithm,
    cache: Option<&HashCache>,
) -> Result<String> {
    if let Some(cache) = cache
        && let Some(digest) = cache.lookup(&file.path, file.mtime, file.size)
    {
        debug!("Cache hit for '{}'", file.path.display());
        return Ok(digest);
    }

    let digest = algorithm.digest_file(&file.path)?;
    if let Some(cache) = cache {
        cache.store(&file.path, file.mtime, file.size, digest.clone());
    }
    Ok(digest)
}
