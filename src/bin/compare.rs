/// Compare two takeout-layout output trees, e.g. a fresh run against a previous one.
/// Usage: compare <reference_dir> <test_dir>
///
/// Files are matched by relative path (`YYYY/MM/name`) and compared by
/// SHA-256. Exits 1 when anything is missing, extra or different.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use layout_core::{Fingerprinter, Sha256Fingerprinter};
use rayon::prelude::*;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: compare <reference_dir> <test_dir>");
        std::process::exit(1);
    }

    let ref_dir = Path::new(&args[1]);
    let test_dir = Path::new(&args[2]);

    eprintln!("Reference: {}", ref_dir.display());
    eprintln!("Test:      {}", test_dir.display());

    eprintln!("Hashing all files (parallel)...");
    let ref_files = manifest(ref_dir)?;
    let test_files = manifest(test_dir)?;

    let mut missing = Vec::new();
    let mut content_mismatch = Vec::new();
    let mut matched = 0;
    for (rel, ref_hash) in &ref_files {
        match test_files.get(rel) {
            None => missing.push(rel.as_str()),
            Some(test_hash) if test_hash != ref_hash => content_mismatch.push(rel.as_str()),
            Some(_) => matched += 1,
        }
    }
    let extra: Vec<&str> = test_files
        .keys()
        .filter(|rel| !ref_files.contains_key(*rel))
        .map(String::as_str)
        .collect();

    println!("=== Comparison Results ===");
    println!("Reference files: {}", ref_files.len());
    println!("Test files:      {}", test_files.len());
    println!();
    println!("Matched:          {}", matched);
    println!("Missing in test:  {}", missing.len());
    println!("Content mismatch: {}", content_mismatch.len());
    println!("Extra in test:    {}", extra.len());

    print_section("Missing files", &missing);
    print_section("Content mismatches", &content_mismatch);
    print_section("Extra in test", &extra);

    if missing.is_empty() && content_mismatch.is_empty() && extra.is_empty() {
        println!("\nTrees are identical.");
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn print_section(title: &str, paths: &[&str]) {
    if paths.is_empty() {
        return;
    }
    println!("\n--- {} (first 20) ---", title);
    for p in paths.iter().take(20) {
        println!("  {}", p);
    }
    if paths.len() > 20 {
        println!("  ... and {} more", paths.len() - 20);
    }
}

/// relative path -> content hash
fn manifest(dir: &Path) -> anyhow::Result<BTreeMap<String, String>> {
    let mut files = Vec::new();
    collect_files_recursive(dir, dir, &mut files)?;

    files
        .par_iter()
        .map(|(rel, abs)| {
            let hash = Sha256Fingerprinter
                .fingerprint(abs)
                .with_context(|| format!("hashing {}", abs.display()))?;
            Ok((rel.clone(), hash))
        })
        .collect()
}

fn collect_files_recursive(
    base: &Path,
    dir: &Path,
    result: &mut Vec<(String, PathBuf)>,
) -> anyhow::Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files_recursive(base, &path, result)?;
        } else {
            let rel = path
                .strip_prefix(base)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            result.push((rel, path));
        }
    }
    Ok(())
}
