use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use tempfile::TempDir;

use clonescout::cache::HashCache;
use clonescout::scan::{ScanOptions, ScanResult, scan};

fn run_scan(root: &Path, cache: Option<&HashCache>) -> ScanResult {
    let cancel = AtomicBool::new(false);
    scan(
        &[root.to_path_buf()],
        &ScanOptions::default(),
        cache,
        &cancel,
    )
    .unwrap()
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn group_for<'a>(result: &'a ScanResult, member: &Path) -> Option<&'a Vec<PathBuf>> {
    result
        .file_clones
        .values()
        .find(|paths| paths.contains(&member.to_path_buf()))
}

/// The canonical pruning layout: `B/E` and `C/E` are exact clones holding
/// files 1, 2 and 3; `A/D` holds only files 1 and 2. `B` and `C` carry an
/// extra unique file each so they are not clones themselves.
fn pruning_fixture() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().canonicalize().unwrap();

    write(&root, "A/D/1", "content one");
    write(&root, "A/D/2", "content two");

    write(&root, "B/only-in-b", "unique b");
    write(&root, "B/E/1", "content one");
    write(&root, "B/E/2", "content two");
    write(&root, "B/E/3", "content three");

    write(&root, "C/only-in-c", "unique c");
    write(&root, "C/E/1", "content one");
    write(&root, "C/E/2", "content two");
    write(&root, "C/E/3", "content three");

    tmp
}

#[test]
fn clone_directories_are_reported_once() {
    let tmp = pruning_fixture();
    let root = tmp.path().canonicalize().unwrap();

    let result = run_scan(&root, None);

    let groups: Vec<_> = result.dir_clones.values().collect();
    assert_eq!(groups.len(), 1);
    assert_eq!(
        *groups[0],
        vec![root.join("B/E"), root.join("C/E")]
    );
}

#[test]
fn file_groups_subsumed_by_a_directory_clone_are_pruned() {
    let tmp = pruning_fixture();
    let root = tmp.path().canonicalize().unwrap();

    let result = run_scan(&root, None);

    // File 3 exists only inside the cloned E directories: pruned.
    assert!(group_for(&result, &root.join("B/E/3")).is_none());

    // Files 1 and 2 also live under A/D, whose digest differs, so their
    // groups keep all three copies.
    for name in ["1", "2"] {
        let group = group_for(&result, &root.join("A/D").join(name)).unwrap();
        assert_eq!(
            *group,
            vec![
                root.join("A/D").join(name),
                root.join("B/E").join(name),
                root.join("C/E").join(name),
            ]
        );
    }
}

#[test]
fn likeness_reports_partially_overlapping_directories() {
    let tmp = pruning_fixture();
    let root = tmp.path().canonicalize().unwrap();

    let result = run_scan(&root, None);

    // A/D shares files 1 and 2 with each E directory (2 of 3 contents);
    // B/E and C/E are identical and therefore excluded.
    assert_eq!(result.likeness.len(), 2);
    for pair in &result.likeness {
        assert!((pair.percent - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(pair.dir_a, root.join("A/D"));
    }
    let others: Vec<_> = result.likeness.iter().map(|p| p.dir_b.clone()).collect();
    assert!(others.contains(&root.join("B/E")));
    assert!(others.contains(&root.join("C/E")));
}

#[test]
fn half_shared_directories_score_fifty_percent() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().canonicalize().unwrap();

    write(&root, "x/a", "shared");
    write(&root, "y/a", "shared");
    write(&root, "y/c", "only y");

    let result = run_scan(&root, None);

    assert_eq!(result.likeness.len(), 1);
    assert!((result.likeness[0].percent - 50.0).abs() < f64::EPSILON);
}

#[test]
fn identical_files_group_regardless_of_name_or_location() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().canonicalize().unwrap();

    write(&root, "docs/report.txt", "same bytes");
    write(&root, "backup/misc/copy.bin", "same bytes");
    write(&root, "docs/other.txt", "different bytes");

    let result = run_scan(&root, None);

    assert_eq!(result.file_clones.len(), 1);
    let group = result.file_clones.values().next().unwrap();
    assert_eq!(group.len(), 2);
    assert!(group.contains(&root.join("docs/report.txt")));
    assert!(group.contains(&root.join("backup/misc/copy.bin")));
}

#[test]
fn scan_spans_multiple_roots() {
    let tmp_a = TempDir::new().unwrap();
    let tmp_b = TempDir::new().unwrap();
    write(tmp_a.path(), "one.txt", "cross-root payload");
    write(tmp_a.path(), "extra-a.txt", "only in a");
    write(tmp_b.path(), "two.txt", "cross-root payload");
    write(tmp_b.path(), "extra-b.txt", "only in b");

    let cancel = AtomicBool::new(false);
    let result = scan(
        &[tmp_a.path().to_path_buf(), tmp_b.path().to_path_buf()],
        &ScanOptions::default(),
        None,
        &cancel,
    )
    .unwrap();

    assert_eq!(result.file_clones.len(), 1);
    let group = result.file_clones.values().next().unwrap();
    assert_eq!(group.len(), 2);
}

#[test]
fn identical_roots_surface_as_a_directory_clone() {
    let tmp_a = TempDir::new().unwrap();
    let tmp_b = TempDir::new().unwrap();
    write(tmp_a.path(), "one.txt", "cross-root payload");
    write(tmp_b.path(), "one.txt", "cross-root payload");

    let cancel = AtomicBool::new(false);
    let result = scan(
        &[tmp_a.path().to_path_buf(), tmp_b.path().to_path_buf()],
        &ScanOptions::default(),
        None,
        &cancel,
    )
    .unwrap();

    // The roots themselves are clones; the file group inside them is
    // redundant and pruned. The roots' own parents were never walked, which
    // is reported as a diagnostic rather than an error.
    assert_eq!(result.dir_clones.len(), 1);
    let group = result.dir_clones.values().next().unwrap();
    assert_eq!(group.len(), 2);
    assert!(result.file_clones.is_empty());
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.kind == clonescout::DiagnosticKind::UnresolvedParent)
    );
}

#[test]
fn second_scan_with_cache_is_identical_and_hits_only() {
    let tmp = pruning_fixture();
    let root = tmp.path().canonicalize().unwrap();
    let cache = HashCache::empty(root.join("cache.json.zst"));

    let first = run_scan(&root, Some(&cache));
    let misses_after_first = cache.misses();
    assert!(misses_after_first > 0);
    assert_eq!(cache.hits(), 0);

    let second = run_scan(&root, Some(&cache));

    // Every file was answered from the cache the second time around.
    assert_eq!(cache.hits(), misses_after_first);
    assert_eq!(cache.misses(), misses_after_first);

    assert_eq!(first.file_clones, second.file_clones);
    assert_eq!(first.dir_clones, second.dir_clones);
    assert_eq!(first.likeness.len(), second.likeness.len());
    for (a, b) in first.likeness.iter().zip(&second.likeness) {
        assert_eq!(a, b);
    }
}

#[test]
fn cache_persists_across_process_style_reload() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().canonicalize().unwrap();
    write(&root, "data/a", "persisted payload");
    write(&root, "data/b", "persisted payload");

    let cache_file = root.join("cache.json.zst");
    {
        let cache = HashCache::empty(cache_file.clone());
        run_scan(&root.join("data"), Some(&cache));
        cache.save().unwrap();
    }

    let cache = HashCache::load(cache_file);
    let result = run_scan(&root.join("data"), Some(&cache));

    assert_eq!(cache.misses(), 0);
    assert_eq!(result.file_clones.len(), 1);
}

#[test]
fn diagnostics_never_abort_a_scan() {
    let tmp = pruning_fixture();
    let root = tmp.path().canonicalize().unwrap();

    #[cfg(unix)]
    std::os::unix::fs::symlink(root.join("A/D/1"), root.join("A/D/link")).unwrap();

    let result = run_scan(&root, None);

    #[cfg(unix)]
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.kind == clonescout::DiagnosticKind::SkippedSymlink)
    );
    assert!(!result.file_clones.is_empty());
}
