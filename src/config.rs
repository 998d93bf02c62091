//! @dose
//! purpose: Configuration file parsing for optionset.toml at the scanned root. Handles
//!     exclusion patterns, ignored directory/file names, file size limits and the macro
//!     grammar (comment tokens, option symbols, block marker).
//!
//! when-editing:
//!     - !Config is loaded once per invocation and passed through the call chain
//!     - Every field is defaulted, so a partial file only overrides what it names
//!
//! invariants:
//!     - Config::load returns default config if optionset.toml doesn't exist
//!     - A broken config file degrades to defaults with a warning, never an error
//!
//! gotchas:
//!     - Grammar values are only validated in `Config::grammar`, an invalid grammar is fatal
//!     - Patterns are matched against paths relative to the scanned root

use crate::error::Result;
use crate::exclusion::{ExclusionConfig, DEFAULT_IGNORE_DIRS, DEFAULT_IGNORE_FILES};
use crate::parser::grammar::{DEFAULT_BLOCK_MARKER, DEFAULT_COMMENT_TOKENS, DEFAULT_SYMBOLS};
use crate::parser::Grammar;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub const CONFIG_FILE: &str = "optionset.toml";

/// Main configuration structure matching optionset.toml
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Exclusion patterns (gitignore-style, relative to the root)
    pub exclude: Vec<String>,

    /// Directory names never descended into
    pub ignore_dirs: Vec<String>,

    /// File names never scanned
    pub ignore_files: Vec<String>,

    /// Files with more lines are skipped
    pub max_lines: usize,

    /// Files larger than this many kilobytes (1 kB = 1000 bytes) are skipped
    pub max_file_kb: u64,

    pub respect_gitignore: bool,
    pub skip_hidden: bool,
    pub follow_links: bool,

    pub grammar: GrammarConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            ignore_dirs: DEFAULT_IGNORE_DIRS.iter().map(|s| s.to_string()).collect(),
            ignore_files: DEFAULT_IGNORE_FILES.iter().map(|s| s.to_string()).collect(),
            max_lines: 9999,
            max_file_kb: 10,
            respect_gitignore: true,
            skip_hidden: true,
            follow_links: false,
            grammar: GrammarConfig::default(),
        }
    }
}

/// Macro grammar overrides
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    pub comment_tokens: Vec<String>,
    pub symbols: String,
    pub block_marker: char,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            comment_tokens: DEFAULT_COMMENT_TOKENS.iter().map(|s| s.to_string()).collect(),
            symbols: DEFAULT_SYMBOLS.to_string(),
            block_marker: DEFAULT_BLOCK_MARKER,
        }
    }
}

impl Config {
    /// Load configuration from optionset.toml in the given root directory
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&config_path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    debug!("loaded {}", config_path.display());
                    config
                }
                Err(e) => {
                    warn!("failed to parse {}: {}", CONFIG_FILE, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("failed to read {}: {}", CONFIG_FILE, e);
                Self::default()
            }
        }
    }

    pub fn grammar(&self) -> Result<Grammar> {
        Grammar::new(
            self.grammar.comment_tokens.as_slice(),
            &self.grammar.symbols,
            self.grammar.block_marker,
        )
    }

    /// Exclusion settings with CLI patterns appended to the configured ones
    pub fn exclusion(&self, cli_patterns: &[String], no_gitignore: bool) -> ExclusionConfig {
        let mut patterns = self.exclude.clone();
        patterns.extend(cli_patterns.iter().cloned());
        ExclusionConfig {
            patterns,
            ignore_dirs: self.ignore_dirs.clone(),
            ignore_files: self.ignore_files.clone(),
            respect_gitignore: self.respect_gitignore && !no_gitignore,
            skip_hidden: self.skip_hidden,
            follow_links: self.follow_links,
        }
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_kb.saturating_mul(1000)
    }
}
