//! @dose
//! purpose: Walk the root, read every candidate file as text and parse it. Files are read
//!     and parsed in parallel; results come back in path order so reports, issues and
//!     fixtures are reproducible.
//!
//! when-editing:
//!     - !The parallel phase only produces per-file values; merging happens after collect()
//!     - Skipped files (too large, too long, binary, not UTF-8) are logged, not reported
//!
//! invariants:
//!     - `ScanResult.files` is sorted by path and contains no duplicates, symlinks included
//!     - An unreadable file becomes an UnreadableFile issue and the scan carries on
//!     - Only a missing root aborts the scan
//!
//! gotchas:
//!     - Binary detection is a NUL byte anywhere in the file, like git's heuristic

use crate::error::{OptionsetError, Result};
use crate::exclusion::{build_walker, ExclusionConfig};
use crate::parser::{parse_file, Grammar, ParsedFile, SourceFile};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Per-file size limits
#[derive(Debug, Clone, Copy)]
pub struct ScanLimits {
    pub max_lines: usize,
    pub max_bytes: u64,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            max_lines: 9999,
            max_bytes: 10_000,
        }
    }
}

#[derive(Debug)]
pub enum ReadOutcome {
    Text(SourceFile),
    Skipped(String),
    Failed(OptionsetError),
}

#[derive(Debug, Default)]
pub struct ScanResult {
    pub files: Vec<ParsedFile>,
    pub issues: Vec<OptionsetError>,
    pub skipped: usize,
}

/// Regular files under `root` that pass the exclusion rules, sorted.
pub fn collect_files(root: &Path, exclusion: &ExclusionConfig) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = build_walker(root, exclusion)
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("walk error: {}", e);
                None
            }
        })
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files.dedup();

    // Links to a file already collected would be rewritten twice
    let mut seen = BTreeSet::new();
    files.retain(|path| {
        let real = fs::canonicalize(path).unwrap_or_else(|_| path.clone());
        let first = seen.insert(real);
        if !first {
            debug!("skipping {}: same file as an earlier path", path.display());
        }
        first
    });
    files
}

pub fn read_source(path: &Path, relative: &Path, limits: &ScanLimits) -> ReadOutcome {
    let unreadable = |e: std::io::Error| {
        ReadOutcome::Failed(OptionsetError::UnreadableFile {
            file: relative.to_path_buf(),
            reason: e.to_string(),
        })
    };

    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => return unreadable(e),
    };
    if metadata.len() > limits.max_bytes {
        return ReadOutcome::Skipped(format!(
            "larger than {} kB",
            limits.max_bytes / 1000
        ));
    }

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => return unreadable(e),
    };
    if bytes.contains(&0) {
        return ReadOutcome::Skipped("binary content".to_string());
    }
    let content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(_) => return ReadOutcome::Skipped("not valid UTF-8".to_string()),
    };
    if content.lines().count() > limits.max_lines {
        return ReadOutcome::Skipped(format!("more than {} lines", limits.max_lines));
    }

    ReadOutcome::Text(SourceFile::from_text(path, relative, &content))
}

enum FileResult {
    Parsed(ParsedFile),
    Skipped,
    Failed(OptionsetError),
}

/// Scan the tree under `root`, parsing every candidate file.
pub fn scan_tree(
    root: &Path,
    grammar: &Grammar,
    exclusion: &ExclusionConfig,
    limits: &ScanLimits,
) -> Result<ScanResult> {
    if !root.is_dir() {
        return Err(OptionsetError::RootNotFound {
            path: root.to_path_buf(),
        });
    }

    let paths = collect_files(root, exclusion);
    debug!("scanning {} candidate files under {}", paths.len(), root.display());

    let results: Vec<FileResult> = paths
        .par_iter()
        .map(|path| {
            let relative = path.strip_prefix(root).unwrap_or(path);
            match read_source(path, relative, limits) {
                ReadOutcome::Text(source) => FileResult::Parsed(parse_file(source, grammar)),
                ReadOutcome::Skipped(reason) => {
                    debug!("skipping {}: {}", relative.display(), reason);
                    FileResult::Skipped
                }
                ReadOutcome::Failed(err) => {
                    warn!("{}", err);
                    FileResult::Failed(err)
                }
            }
        })
        .collect();

    let mut scan = ScanResult::default();
    for result in results {
        match result {
            FileResult::Parsed(parsed) => {
                scan.issues.extend(parsed.issues.iter().cloned());
                scan.files.push(parsed);
            }
            FileResult::Skipped => scan.skipped += 1,
            FileResult::Failed(err) => scan.issues.push(err),
        }
    }

    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scan(root: &Path) -> ScanResult {
        scan_tree(
            root,
            &Grammar::default(),
            &ExclusionConfig::default(),
            &ScanLimits::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        let err = scan_tree(
            &missing,
            &Grammar::default(),
            &ExclusionConfig::default(),
            &ScanLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(err, OptionsetError::RootNotFound { .. }));
    }

    #[test]
    fn test_scan_is_sorted_and_relative() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("system")).unwrap();
        fs::write(root.join("system/fvSolution"), "a // ~x one\n").unwrap();
        fs::write(root.join("system/controlDict"), "b // ~y one\n").unwrap();
        fs::write(root.join("Allrun"), "c # ~z one\n").unwrap();

        let result = scan(root);
        let names: Vec<_> = result.files.iter().map(|f| f.relative.clone()).collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("Allrun"),
                PathBuf::from("system/controlDict"),
                PathBuf::from("system/fvSolution")
            ]
        );
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_skips_binary_and_limits() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("binary"), b"a // ~x one\n\0\x01").unwrap();
        fs::write(root.join("latin1"), b"caf\xe9 // ~x one\n").unwrap();
        fs::write(root.join("text"), "a // ~x one\n").unwrap();
        fs::write(root.join("large"), format!("a // ~x one\n{}", "b\n".repeat(5000))).unwrap();

        let result = scan(root);
        assert_eq!(result.files.len(), 1);
        // binary, latin1 and a file over the 10 kB default
        assert_eq!(result.skipped, 3);

        let limits = ScanLimits {
            max_lines: 1,
            max_bytes: 1024,
        };
        assert!(matches!(
            read_source(&root.join("text"), Path::new("text"), &limits),
            ReadOutcome::Text(_)
        ));
        fs::write(root.join("long"), "1\n2\n3\n").unwrap();
        assert!(matches!(
            read_source(&root.join("long"), Path::new("long"), &limits),
            ReadOutcome::Skipped(_)
        ));
    }

    #[test]
    fn test_malformed_macros_are_collected() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a"), "rho 1; // ~rho ='rho (.*);\n").unwrap();
        fs::write(root.join("b"), "x // ~x one\n").unwrap();

        let result = scan(root);
        assert_eq!(result.files.len(), 2);
        assert_eq!(result.issues.len(), 1);
        assert!(matches!(
            &result.issues[0],
            OptionsetError::MalformedMacro { file, line: 1, .. } if file == Path::new("a")
        ));
    }

    #[test]
    fn test_unreadable_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let gone = temp_dir.path().join("removed");
        match read_source(&gone, Path::new("removed"), &ScanLimits::default()) {
            ReadOutcome::Failed(OptionsetError::UnreadableFile { file, .. }) => {
                assert_eq!(file, PathBuf::from("removed"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_carries_on_past_unreadable_file() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let locked = root.join("a");
        fs::write(&locked, "x // ~x one\n").unwrap();
        fs::write(root.join("b"), "y // ~y one\n").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read(&locked).is_ok() {
            // Privileged users read through file modes
            return;
        }

        let result = scan(root);
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].relative, PathBuf::from("b"));
        assert!(matches!(
            &result.issues[..],
            [OptionsetError::UnreadableFile { file, .. }] if file == Path::new("a")
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_to_collected_file_is_scanned_once() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("props"), "nu 1; // ~nu air\n").unwrap();
        std::os::unix::fs::symlink("props", root.join("alias")).unwrap();

        let files = collect_files(root, &ExclusionConfig::default());
        assert_eq!(files.len(), 1);
    }
}
