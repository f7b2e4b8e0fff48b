use colored::Colorize;
use indicatif::{HumanBytes, HumanCount};
use log::warn;

use crate::scan::ScanResult;

/// Print cloned directories, directory likeness and cloned files, in that
/// order. `likeness_threshold` hides likeness pairs at or below the given
/// percentage.
pub fn print_results(result: &ScanResult, likeness_threshold: f64) {
    print_directory_clones(result);
    print_likeness(result, likeness_threshold);
    print_file_clones(result);
}

fn print_directory_clones(result: &ScanResult) {
    if result.dir_clones.is_empty() {
        println!("{}\n", "No cloned directories found!".green());
        return;
    }

    let count = result.dir_clones.len();
    let noun = if count == 1 { "directory" } else { "directories" };
    println!("{}\n", format!("*** {count} cloned {noun} ***").bold());

    for paths in result.dir_clones.values() {
        for path in paths {
            println!("{}", path.display());
        }
        println!();
    }
}

fn print_likeness(result: &ScanResult, threshold: f64) {
    let pairs: Vec<_> = result
        .likeness
        .iter()
        .filter(|pair| pair.percent > threshold)
        .collect();
    if pairs.is_empty() {
        return;
    }

    println!("{}\n", "*** Directory likeness ***".bold());
    for pair in pairs {
        println!("{}", format!("{:.1}%", pair.percent).yellow());
        println!("{}", pair.dir_a.display());
        println!("{}", pair.dir_b.display());
        println!();
    }
}

fn print_file_clones(result: &ScanResult) {
    if result.file_clones.is_empty() {
        println!("{}", "No cloned files found!".green());
        return;
    }

    let extra_copies: usize = result
        .file_clones
        .values()
        .map(|group| group.len() - 1)
        .sum();
    let wasted_space: u64 = result
        .file_clones
        .values()
        .map(|group| group_file_size(result, group) * (group.len() - 1) as u64)
        .sum();

    let count = result.file_clones.len();
    let noun = if count == 1 { "file" } else { "files" };
    println!("{}\n", format!("*** {count} cloned {noun} ***").bold());

    // Largest potential savings first.
    let mut groups: Vec<_> = result.file_clones.values().collect();
    groups.sort_by_key(|group| {
        std::cmp::Reverse(group_file_size(result, group) * (group.len() - 1) as u64)
    });

    for group in groups {
        println!(
            "Clone group ({}, {} files):",
            HumanBytes(group_file_size(result, group)),
            group.len()
        );
        for path in group {
            println!("  {}", path.display());
        }
        println!();
    }

    println!(
        "{} extra cop{} wasting {} of space",
        HumanCount(extra_copies as u64),
        if extra_copies == 1 { "y" } else { "ies" },
        HumanBytes(wasted_space)
    );
}

fn group_file_size(result: &ScanResult, group: &[std::path::PathBuf]) -> u64 {
    group
        .iter()
        .find_map(|path| result.file_sizes.get(path))
        .copied()
        .unwrap_or(0)
}

/// Log every diagnostic collected during the scan.
pub fn print_diagnostics(result: &ScanResult) {
    for diagnostic in &result.diagnostics {
        warn!("{diagnostic}");
    }
    if !result.diagnostics.is_empty() {
        warn!(
            "{} non-fatal issues were skipped during the scan",
            result.diagnostics.len()
        );
    }
}
