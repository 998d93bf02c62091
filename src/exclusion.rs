//! @dose
//! purpose: Decide which paths under the scanned root are candidate dictionary files.
//!     Combines gitignore handling, hidden-path skipping, name globs for ignored
//!     directories/files (time directories, logs, images, meshes) and user exclude
//!     patterns from optionset.toml or --exclude.
//!
//! when-editing:
//!     - !Override patterns use ! prefix to negate (exclude), so we add ! to user patterns
//!     - Name globs match a single path component, exclude patterns match relative paths
//!
//! invariants:
//!     - The root itself is never filtered, even when its own name looks hidden
//!     - Gitignore is respected by default unless --no-gitignore is passed
//!
//! gotchas:
//!     - The ignore crate's override patterns are inclusive by default, so we negate them
//!     - Numeric directories (`0`, `0.5`, `100`) are solver output in OpenFOAM cases

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use std::path::Path;
use tracing::warn;

/// Directory names skipped during the walk.
pub const DEFAULT_IGNORE_DIRS: &[&str] = &[
    ".[a-zA-Z0-9]*",
    "__pycache__",
    "[0-9]",
    "[0-9][0-9]*",
    "[0-9].[0-9]*",
    "log",
    "logs",
    "processor[0-9]*",
    "archive",
    "trash",
    "node_modules",
    "target",
];

/// File names skipped during the walk.
pub const DEFAULT_IGNORE_FILES: &[&str] = &[
    ".*",
    "log.*",
    "*.log",
    "*.py",
    "*.pyc",
    "*.gz",
    "*.png",
    "*.jpg",
    "*.obj",
    "*.stl",
    "*.stp",
    "*.step",
    crate::config::CONFIG_FILE,
];

/// Configuration for file exclusion during directory walking
#[derive(Debug, Clone)]
pub struct ExclusionConfig {
    /// Glob patterns relative to the root (optionset.toml `exclude` plus --exclude)
    pub patterns: Vec<String>,
    pub ignore_dirs: Vec<String>,
    pub ignore_files: Vec<String>,
    /// Whether to respect .gitignore files (default: true)
    pub respect_gitignore: bool,
    pub skip_hidden: bool,
    pub follow_links: bool,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            ignore_dirs: DEFAULT_IGNORE_DIRS.iter().map(|s| s.to_string()).collect(),
            ignore_files: DEFAULT_IGNORE_FILES.iter().map(|s| s.to_string()).collect(),
            respect_gitignore: true,
            skip_hidden: true,
            follow_links: false,
        }
    }
}

/// Build a GlobSet from name patterns, warning about (and dropping) invalid ones
pub fn build_name_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => warn!("invalid ignore pattern '{}': {}", pattern, e),
        }
    }
    builder.build().unwrap_or_else(|e| {
        warn!("failed to build ignore patterns: {}", e);
        GlobSet::empty()
    })
}

/// Build a WalkBuilder with the given exclusion configuration
pub fn build_walker(root: &Path, config: &ExclusionConfig) -> WalkBuilder {
    let mut builder = WalkBuilder::new(root);

    builder.git_ignore(config.respect_gitignore);
    builder.git_global(config.respect_gitignore);
    builder.git_exclude(config.respect_gitignore);
    builder.ignore(config.respect_gitignore);
    builder.hidden(config.skip_hidden);
    builder.follow_links(config.follow_links);

    let mut overrides = OverrideBuilder::new(root);
    for pattern in &config.patterns {
        let exclude_pattern = format!("!{}", pattern);
        if let Err(e) = overrides.add(&exclude_pattern) {
            warn!("invalid exclude pattern '{}': {}", pattern, e);
        }
    }
    match overrides.build() {
        Ok(built) => {
            builder.overrides(built);
        }
        Err(e) => warn!("failed to build exclude patterns: {}", e),
    }

    let dirs = build_name_globset(&config.ignore_dirs);
    let files = build_name_globset(&config.ignore_files);
    builder.filter_entry(move |entry| {
        if entry.depth() == 0 {
            return true;
        }
        let name = entry.file_name();
        let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
        if is_dir {
            !dirs.is_match(name)
        } else {
            !files.is_match(name)
        }
    });

    builder
}
